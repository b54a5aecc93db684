use crate::delay::Delay;
use crate::lcd::hd44780::driver::{BusWidth, HD44780Bus};
use crate::lcd::hd44780::instruction::Mode;
use crate::{GpioError, GpioResult};
use log::trace;
use std::cell::RefCell;

/// A single call made on a [RecordingBus].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BusEvent {
    ModeLine(Mode),
    DataLines(u8),
    Strobe,
    /// A wait, when the recorder is also used as the [Delay].
    Wait(u32),
}

/// A value latched by a strobe, with the mode the RS line was in at that moment. On a 4-bit bus the
/// value is a nibble.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Transfer {
    pub mode: Mode,
    pub value: u8,
}

/// An [HD44780Bus] that doesn't drive any hardware, but remembers every call in order.
///
/// It also implements [Delay] without actually waiting, so passing the same recorder as both the bus
/// and the delay gives one log with the waits between the transfers. Used as the test double and as
/// the dry-run backend.
#[derive(Debug, Default)]
pub struct RecordingBus {
    width: BusWidth,
    events: RefCell<Vec<BusEvent>>,
}

impl RecordingBus {
    /// Creates a recorder posing as a 4-bit bus.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_width(width: BusWidth) -> Self {
        RecordingBus {
            width,
            events: RefCell::default(),
        }
    }

    /// Gets every recorded call, oldest first.
    pub fn events(&self) -> Vec<BusEvent> {
        self.events.borrow().clone()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Replays the recorded line levels and returns what the controller latched on each strobe.
    pub fn transfers(&self) -> Vec<Transfer> {
        let mut mode = Mode::default();
        let mut value = 0;
        let mut transfers = Vec::new();
        for event in self.events.borrow().iter() {
            match *event {
                BusEvent::ModeLine(new_mode) => mode = new_mode,
                BusEvent::DataLines(new_value) => value = new_value,
                BusEvent::Strobe => transfers.push(Transfer { mode, value }),
                BusEvent::Wait(_) => {}
            }
        }
        transfers
    }

    /// Gets the bytes the controller received. On a 4-bit bus the transfers are paired up, high
    /// nibble first, and a trailing unpaired nibble is left out.
    pub fn bytes(&self) -> Vec<(Mode, u8)> {
        let transfers = self.transfers();
        match self.width {
            BusWidth::EightBit => transfers
                .iter()
                .map(|transfer| (transfer.mode, transfer.value))
                .collect(),
            BusWidth::FourBit => transfers
                .chunks_exact(2)
                .map(|pair| (pair[0].mode, pair[0].value << 4 | pair[1].value))
                .collect(),
        }
    }

    /// Gets the recorded waits, in milliseconds.
    pub fn waits(&self) -> Vec<u32> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                BusEvent::Wait(ms) => Some(*ms),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: BusEvent) {
        trace!("Bus event: {:?}", event);
        self.events.borrow_mut().push(event);
    }
}

impl HD44780Bus for RecordingBus {
    fn set_data_lines(&self, value: u8) -> GpioResult<()> {
        if value > self.width.max_value() {
            return Err(GpioError::InvalidArgument);
        }
        self.record(BusEvent::DataLines(value));
        Ok(())
    }

    fn set_mode_line(&self, mode: Mode) -> GpioResult<()> {
        self.record(BusEvent::ModeLine(mode));
        Ok(())
    }

    fn pulse_strobe(&self) -> GpioResult<()> {
        self.record(BusEvent::Strobe);
        Ok(())
    }

    fn width(&self) -> BusWidth {
        self.width
    }
}

impl Delay for RecordingBus {
    fn wait_milliseconds(&self, ms: u32) {
        self.record(BusEvent::Wait(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfers_carry_the_levels_at_strobe_time() {
        let bus = RecordingBus::new();
        bus.set_mode_line(Mode::Data).unwrap();
        bus.set_data_lines(0x4).unwrap();
        bus.pulse_strobe().unwrap();
        bus.wait_milliseconds(2);
        bus.set_data_lines(0x8).unwrap();
        bus.pulse_strobe().unwrap();

        assert_eq!(
            bus.transfers(),
            vec![
                Transfer { mode: Mode::Data, value: 0x4 },
                Transfer { mode: Mode::Data, value: 0x8 },
            ]
        );
        assert_eq!(bus.bytes(), vec![(Mode::Data, b'H')]);
        assert_eq!(bus.waits(), vec![2]);
    }

    #[test]
    fn wide_nibbles_are_not_recorded() {
        let bus = RecordingBus::new();
        assert_eq!(bus.set_data_lines(0x1F), Err(GpioError::InvalidArgument));
        assert!(bus.events().is_empty());
    }

    #[test]
    fn eight_bit_recorder_takes_whole_bytes() {
        let bus = RecordingBus::with_width(BusWidth::EightBit);
        bus.set_mode_line(Mode::Data).unwrap();
        bus.set_data_lines(b'H').unwrap();
        bus.pulse_strobe().unwrap();
        bus.set_data_lines(b'i').unwrap();
        bus.pulse_strobe().unwrap();

        assert_eq!(bus.width(), BusWidth::EightBit);
        assert_eq!(bus.bytes(), vec![(Mode::Data, b'H'), (Mode::Data, b'i')]);
    }

    #[test]
    fn clear_forgets_everything() {
        let bus = RecordingBus::new();
        bus.pulse_strobe().unwrap();
        bus.clear();
        assert!(bus.transfers().is_empty());
    }
}
