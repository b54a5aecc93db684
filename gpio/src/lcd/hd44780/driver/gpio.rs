use crate::lcd::hd44780::driver::{BusWidth, HD44780Bus};
use crate::lcd::hd44780::instruction::Mode;
use crate::{GpioBusOutput, GpioError, GpioOutput, GpioResult};
use std::cell::Cell;
use std::thread::sleep;
use std::time::Duration;

/// How long E is held high during a strobe. The datasheet minimum is 230 ns.
const STROBE_WIDTH: Duration = Duration::from_micros(1);

/// The data lines of a [GpioHD44780Bus].
#[derive(Debug)]
pub enum GpioDataBus<'a> {
    /// D4–D7, in that order.
    Bus4Bit(&'a dyn GpioBusOutput<4>),
    /// D0–D7, in that order.
    Bus8Bit(&'a dyn GpioBusOutput<8>),
}

/// An HD44780 bus on individual GPIO lines: E and RS as single pins, the data lines as a 4-pin or
/// 8-pin bus.
#[derive(Debug)]
pub struct GpioHD44780Bus<'a> {
    pin_e: &'a dyn GpioOutput,
    pin_rs: &'a dyn GpioOutput,
    data_bus: GpioDataBus<'a>,
}

impl<'a> GpioHD44780Bus<'a> {
    /// # Parameters
    ///
    /// - `pin_e`: Enable output pin.
    /// - `pin_rs`: Register select output pin.
    /// - `data_bus`: D4–D7, in that order.
    pub fn new_4bit(
        pin_e: &'a dyn GpioOutput,
        pin_rs: &'a dyn GpioOutput,
        data_bus: &'a dyn GpioBusOutput<4>,
    ) -> Self {
        GpioHD44780Bus {
            pin_e,
            pin_rs,
            data_bus: GpioDataBus::Bus4Bit(data_bus),
        }
    }

    /// Same as [GpioHD44780Bus::new_4bit], with `data_bus` being D0–D7.
    pub fn new_8bit(
        pin_e: &'a dyn GpioOutput,
        pin_rs: &'a dyn GpioOutput,
        data_bus: &'a dyn GpioBusOutput<8>,
    ) -> Self {
        GpioHD44780Bus {
            pin_e,
            pin_rs,
            data_bus: GpioDataBus::Bus8Bit(data_bus),
        }
    }
}

impl HD44780Bus for GpioHD44780Bus<'_> {
    fn set_data_lines(&self, value: u8) -> GpioResult<()> {
        match self.data_bus {
            GpioDataBus::Bus4Bit(bus) => bus.write_nibble(value),
            GpioDataBus::Bus8Bit(bus) => bus.write_byte(value),
        }
    }

    fn set_mode_line(&self, mode: Mode) -> GpioResult<()> {
        self.pin_rs.write(mode.rs_level())
    }

    fn pulse_strobe(&self) -> GpioResult<()> {
        self.pin_e.write(true)?;
        sleep(STROBE_WIDTH);
        self.pin_e.write(false)
    }

    fn width(&self) -> BusWidth {
        match self.data_bus {
            GpioDataBus::Bus4Bit(_) => BusWidth::FourBit,
            GpioDataBus::Bus8Bit(_) => BusWidth::EightBit,
        }
    }
}

/// A 4-bit HD44780 bus sharing a single 8-bit port, wired like the PIC18 prototype board:
///
/// | port bit | LCD pin |
/// |----------|---------|
/// | 0–3      | D4–D7   |
/// | 4        | RS      |
/// | 5        | E       |
///
/// Every call writes the whole port, so the port's last value is kept here.
#[derive(Debug)]
pub struct PortHD44780Bus<'a> {
    port: &'a dyn GpioBusOutput<8>,
    value: Cell<u8>,
}

impl<'a> PortHD44780Bus<'a> {
    pub const DATA_MASK: u8 = 0b00001111;
    pub const RS_BIT: u8 = 0b00010000;
    pub const E_BIT: u8 = 0b00100000;

    pub fn new(port: &'a dyn GpioBusOutput<8>) -> Self {
        PortHD44780Bus {
            port,
            value: Cell::new(0),
        }
    }

    /// Gets the port value that puts `nibble` on the data lines with RS set for `mode`.
    pub fn port_value(nibble: u8, mode: Mode) -> u8 {
        let rs = if mode.rs_level() { Self::RS_BIT } else { 0 };
        (nibble & Self::DATA_MASK) | rs
    }

    /// Gets the last value written to the port, E excluded.
    pub fn value(&self) -> u8 {
        self.value.get()
    }

    fn write(&self, value: u8) -> GpioResult<()> {
        self.value.set(value);
        self.port.write_byte(value)
    }
}

impl HD44780Bus for PortHD44780Bus<'_> {
    fn set_data_lines(&self, nibble: u8) -> GpioResult<()> {
        if nibble > Self::DATA_MASK {
            return Err(GpioError::InvalidArgument);
        }
        self.write((self.value() & !Self::DATA_MASK) | nibble)
    }

    fn set_mode_line(&self, mode: Mode) -> GpioResult<()> {
        let nibble = self.value() & Self::DATA_MASK;
        self.write(Self::port_value(nibble, mode))
    }

    fn pulse_strobe(&self) -> GpioResult<()> {
        let value = self.value();
        self.port.write_byte(value | Self::E_BIT)?;
        sleep(STROBE_WIDTH);
        self.port.write_byte(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcd::hd44780::driver::{HD44780Driver, HD44780Lcd, RecordingBus};
    use crate::lcd::hd44780::instruction::Instruction;
    use std::cell::RefCell;

    /// Records every level written to a pin or a bus, as a byte, LSb first.
    #[derive(Debug, Default)]
    struct LevelLog(RefCell<Vec<u8>>);

    impl LevelLog {
        fn values(&self) -> Vec<u8> {
            self.0.borrow().clone()
        }

        fn push(&self, levels: &[bool]) {
            let byte = levels
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, &level)| byte | ((level as u8) << i));
            self.0.borrow_mut().push(byte);
        }
    }

    impl GpioOutput for LevelLog {
        fn write(&self, value: bool) -> GpioResult<()> {
            self.push(&[value]);
            Ok(())
        }
    }

    impl<const N: usize> GpioBusOutput<N> for LevelLog {
        fn write(&self, values: &[bool; N]) -> GpioResult<()> {
            self.push(values);
            Ok(())
        }
    }

    #[test]
    fn port_value_ors_rs_into_bit_four() {
        assert_eq!(PortHD44780Bus::port_value(0b0101, Mode::Instruction), 0b00000101);
        assert_eq!(PortHD44780Bus::port_value(0b0101, Mode::Data), 0b00010101);
    }

    #[test]
    fn port_bus_sends_a_character_like_the_prototype_board() {
        let port = LevelLog::default();
        let delay = RecordingBus::new();
        let bus = PortHD44780Bus::new(&port);
        let mut lcd = HD44780Lcd::new(&bus, &delay);

        lcd.write_data(b'5').unwrap();

        // '5' is 0x35: RS, then 0x3 strobed, then 0x5 strobed, E only high during the strobes.
        assert_eq!(
            port.values(),
            vec![0x10, 0x13, 0x33, 0x13, 0x15, 0x35, 0x15]
        );
        assert_eq!(bus.value(), 0x15);
    }

    #[test]
    fn port_bus_rejects_wide_nibbles() {
        let port = LevelLog::default();
        let bus = PortHD44780Bus::new(&port);
        assert_eq!(bus.set_data_lines(0x10), Err(GpioError::InvalidArgument));
        assert!(port.values().is_empty());
    }

    #[test]
    fn pin_bus_drives_each_line() {
        let pin_e = LevelLog::default();
        let pin_rs = LevelLog::default();
        let data = LevelLog::default();
        let bus = GpioHD44780Bus::new_4bit(&pin_e, &pin_rs, &data);

        bus.set_mode_line(Mode::Data).unwrap();
        bus.set_data_lines(0b1001).unwrap();
        bus.pulse_strobe().unwrap();
        bus.set_mode_line(Mode::Instruction).unwrap();

        assert_eq!(pin_rs.values(), vec![1, 0]);
        assert_eq!(data.values(), vec![0b1001]);
        assert_eq!(pin_e.values(), vec![1, 0]);
    }

    #[test]
    fn eight_bit_pin_bus_writes_whole_bytes() {
        let pin_e = LevelLog::default();
        let pin_rs = LevelLog::default();
        let data = LevelLog::default();
        let bus = GpioHD44780Bus::new_8bit(&pin_e, &pin_rs, &data);
        let delay = RecordingBus::new();
        let mut lcd = HD44780Lcd::new(&bus, &delay);

        lcd.write_data(b'3').unwrap();
        lcd.write_instruction(Instruction::LINE_TWO).unwrap();

        assert_eq!(bus.width(), BusWidth::EightBit);
        assert_eq!(data.values(), vec![0x33, 0xC0]);
        assert_eq!(pin_rs.values(), vec![1, 0]);
        assert_eq!(pin_e.values(), vec![1, 0, 1, 0]);
    }
}
