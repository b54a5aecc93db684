use crate::delay::Delay;
use crate::lcd::hd44780::driver::{
    split_nibbles, BusWidth, DisplayGeometry, HD44780Bus, HD44780Driver, Timing,
};
use crate::lcd::hd44780::instruction::{Instruction, Mode};
use crate::GpioResult;
use log::{debug, trace};

/// HD44780 driver for a write-only bus.
///
/// On a 4-bit bus each byte is sent as two nibbles, high nibble first; on an 8-bit bus it is a
/// single transfer. Before a byte the RS line is set for its mode, and every transfer is strobed
/// and followed by [Timing::settle_ms], except the last transfer of
/// [Instruction::CLEAR_DISPLAY], which gets [Timing::clear_settle_ms].
#[derive(Debug)]
pub struct HD44780Lcd<'a> {
    bus: &'a dyn HD44780Bus,
    delay: &'a dyn Delay,
    timing: Timing,
    geometry: DisplayGeometry,
    blink: bool,
    mode: Mode,
}

impl<'a> HD44780Lcd<'a> {
    /// Creates a driver for a 16x2 display with the default timing. Nothing is sent until
    /// [HD44780Driver::initialize] is called.
    ///
    /// The bus pins must already be configured as outputs.
    pub fn new(bus: &'a dyn HD44780Bus, delay: &'a dyn Delay) -> Self {
        HD44780Lcd {
            bus,
            delay,
            timing: Timing::default(),
            geometry: DisplayGeometry::default(),
            blink: false,
            mode: Mode::Instruction,
        }
    }

    /// # Errors
    /// - `GpioError::InvalidArgument` if the timing doesn't give clearing the longest wait.
    pub fn with_timing(mut self, timing: Timing) -> GpioResult<Self> {
        timing.validate()?;
        self.timing = timing;
        Ok(self)
    }

    /// # Errors
    /// - `GpioError::InvalidArgument` if the geometry doesn't fit in DDRAM.
    pub fn with_geometry(mut self, geometry: DisplayGeometry) -> GpioResult<Self> {
        geometry.validate()?;
        self.geometry = geometry;
        Ok(self)
    }

    /// Shows a blinking cursor after initialization.
    pub fn with_blink(mut self, blink: bool) -> Self {
        self.blink = blink;
        self
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    fn send(&mut self, data: u8, mode: Mode, settle_ms: u32) -> GpioResult<()> {
        trace!("Sending data: {:08b}, mode: {:?}", data, mode);

        self.bus.set_mode_line(mode)?;
        self.mode = mode;

        match self.bus.width() {
            BusWidth::EightBit => {
                self.bus.set_data_lines(data)?;
                self.bus.pulse_strobe()?;
            }
            BusWidth::FourBit => {
                let [high_nibble, low_nibble] = split_nibbles(data);

                trace!("Writing HN: {:04b}", high_nibble);
                self.bus.set_data_lines(high_nibble)?;
                self.bus.pulse_strobe()?;
                self.delay.wait_milliseconds(self.timing.settle_ms);

                trace!("Writing LN: {:04b}", low_nibble);
                self.bus.set_data_lines(low_nibble)?;
                self.bus.pulse_strobe()?;
            }
        }
        self.delay.wait_milliseconds(settle_ms);

        Ok(())
    }
}

impl HD44780Driver for HD44780Lcd<'_> {
    /// Initializes the display.
    ///
    /// On a 4-bit bus, after the power-on wait, it sends `0011 0011 0011 0010`: whether the
    /// controller woke up in 8-bit mode, 4-bit mode or halfway through a byte, the repeated `0011`
    /// nibbles leave it in 8-bit mode, and the final `0010` switches it to 4-bit mode, followed by
    /// the 4-bit two-line function set. On an 8-bit bus it sends the sync byte twice and the 8-bit
    /// two-line function set instead.
    ///
    /// Then it sets cursor increment, the display control (cursor hidden, or blinking if enabled),
    /// and clears the display and homes the cursor.
    ///
    /// The RS line is left in data mode, ready for text.
    fn initialize(&mut self) -> GpioResult<()> {
        let width = self.bus.width();
        debug!("Initializing HD44780 display ({:?}, {:?})", self.geometry, width);
        self.delay.wait_milliseconds(self.timing.power_on_ms);

        let display_control = if self.blink {
            Instruction::CURSOR_BLINK
        } else {
            Instruction::CURSOR_NO_BLINK
        };

        let mut sequence = match width {
            BusWidth::FourBit => vec![
                Instruction::SYNC_8BIT,
                Instruction::SYNC_8BIT,
                Instruction::FOUR_BIT_MODE,
                Instruction::TWO_LINES,
            ],
            BusWidth::EightBit => vec![
                Instruction::SYNC_8BIT,
                Instruction::SYNC_8BIT,
                Instruction::TWO_LINES_8BIT,
            ],
        };
        sequence.extend([
            Instruction::ENTRY_INCREMENT,
            display_control,
            Instruction::CLEAR_DISPLAY,
            Instruction::RETURN_HOME,
        ]);

        for instruction in sequence {
            self.write_instruction(instruction)?;
        }

        self.bus.set_mode_line(Mode::Data)?;
        self.mode = Mode::Data;
        Ok(())
    }

    fn write_instruction(&mut self, instruction: Instruction) -> GpioResult<()> {
        let settle_ms = if instruction == Instruction::CLEAR_DISPLAY {
            self.timing.clear_settle_ms
        } else {
            self.timing.settle_ms
        };
        self.send(instruction.bits(), Mode::Instruction, settle_ms)
    }

    fn write_data(&mut self, data: u8) -> GpioResult<()> {
        self.send(data, Mode::Data, self.timing.settle_ms)
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }
}
