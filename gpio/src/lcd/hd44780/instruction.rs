//! HD44780 instruction codes and the RS line mode.
use crate::{GpioError, GpioResult};
use std::fmt::{Debug, Formatter};

/// Whether a byte is addressed to the instruction register or to data RAM. This is the level of the
/// RS line while the byte is on the bus.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Mode {
    /// RS low.
    #[default]
    Instruction,
    /// RS high. Used for characters as well as for CGRAM rows.
    Data,
}

impl Mode {
    /// Gets the level of the RS line for this mode.
    pub fn rs_level(self) -> bool {
        matches!(self, Mode::Data)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}

/// An 8-bit HD44780 instruction code.
///
/// The named constants are the fixed codes used by the sample programs. Codes carrying an address
/// or flags are built with the checked constructors below.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Instruction(u8);

impl Instruction {
    /// Function set with 8-bit data length, sent as `0011 0011`. Sending it twice during
    /// initialization puts four `0011` nibbles on the bus, which forces the controller into 8-bit
    /// mode whatever state it powered up in.
    pub const SYNC_8BIT: Instruction = Instruction(0b00110011);
    /// `0011` followed by `0010`: the last 8-bit sync nibble, then the switch to 4-bit mode.
    pub const FOUR_BIT_MODE: Instruction = Instruction(0b00110010);
    /// Function set: 4-bit data length, two lines.
    pub const TWO_LINES: Instruction = Instruction(0b00101100);
    /// Function set: 8-bit data length, two lines.
    pub const TWO_LINES_8BIT: Instruction = Instruction(0b00111100);
    /// Entry mode: move the cursor right after each character, no display shift.
    pub const ENTRY_INCREMENT: Instruction = Instruction(0b00000110);
    /// Display control: display on, cursor hidden.
    pub const CURSOR_NO_BLINK: Instruction = Instruction(0b00001100);
    /// Display control: display on, cursor shown and blinking.
    pub const CURSOR_BLINK: Instruction = Instruction(0b00001111);
    /// Clears the whole DDRAM. Slower than any other instruction, see
    /// [Timing::clear_settle_ms](super::driver::Timing::clear_settle_ms).
    pub const CLEAR_DISPLAY: Instruction = Instruction(0b00000001);
    /// Moves the cursor to the first position of line 1.
    pub const RETURN_HOME: Instruction = Instruction(0b00000010);
    /// DDRAM address `0x40`, the start of line 2 on 16x2 and 20x2 displays.
    pub const LINE_TWO: Instruction = Instruction(0b11000000);
    pub const SHIFT_CURSOR_LEFT: Instruction = Instruction(0b00010000);
    pub const SHIFT_CURSOR_RIGHT: Instruction = Instruction(0b00010100);
    /// CGRAM address `0`, the first row of glyph slot 0.
    pub const CGRAM_START: Instruction = Instruction(0b01000000);
    /// DDRAM address `0`. Sent after writing glyphs, as the controller keeps writing data to CGRAM
    /// until a DDRAM address is set again.
    pub const RETURN_TO_DDRAM: Instruction = Instruction(0b10000000);

    /// Wraps a raw instruction code.
    pub const fn from_bits(bits: u8) -> Self {
        Instruction(bits)
    }

    /// Gets the raw instruction code.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Sets the CGRAM address (custom character memory).
    ///
    /// Command: `01AAAAAA`.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the address doesn't fit in 6 bits.
    pub fn set_cgram_address(address: u8) -> GpioResult<Self> {
        if address > 0b00111111 {
            return Err(GpioError::InvalidArgument);
        }
        Ok(Instruction(0b01000000 | address))
    }

    /// Sets the DDRAM address (display memory).
    ///
    /// Command: `1AAAAAAA`.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the address doesn't fit in 7 bits.
    pub fn set_ddram_address(address: u8) -> GpioResult<Self> {
        if address > 0b01111111 {
            return Err(GpioError::InvalidArgument);
        }
        Ok(Instruction(0b10000000 | address))
    }

    /// Turns the display on or off, and controls the cursor and its blinking.
    ///
    /// Command: `00001DCB`.
    pub fn display_control(display_on: bool, cursor_on: bool, blink_on: bool) -> Self {
        let mut command = 0b00001000;
        if display_on {
            command |= 0b00000100;
        }
        if cursor_on {
            command |= 0b00000010;
        }
        if blink_on {
            command |= 0b00000001;
        }
        Instruction(command)
    }

    /// Sets the direction the cursor moves after each character and whether the display shifts.
    ///
    /// Command: `000001IS`.
    pub fn entry_mode(cursor_direction: CursorDirection, shift: bool) -> Self {
        let mut command = 0b00000100;
        if cursor_direction == CursorDirection::Right {
            command |= 0b00000010;
        }
        if shift {
            command |= 0b00000001;
        }
        Instruction(command)
    }

    /// Moves the cursor by one position without writing anything.
    ///
    /// Command: `0001DR00` with `D` (display shift) cleared.
    pub fn cursor_shift(direction: CursorDirection) -> Self {
        match direction {
            CursorDirection::Left => Self::SHIFT_CURSOR_LEFT,
            CursorDirection::Right => Self::SHIFT_CURSOR_RIGHT,
        }
    }
}

impl Debug for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Instruction({:08b})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_codes_match_the_flag_builders() {
        assert_eq!(Instruction::display_control(true, false, false), Instruction::CURSOR_NO_BLINK);
        assert_eq!(Instruction::display_control(true, true, true), Instruction::CURSOR_BLINK);
        assert_eq!(
            Instruction::entry_mode(CursorDirection::Right, false),
            Instruction::ENTRY_INCREMENT
        );
        assert_eq!(Instruction::set_ddram_address(0x40), Ok(Instruction::LINE_TWO));
        assert_eq!(Instruction::set_ddram_address(0), Ok(Instruction::RETURN_TO_DDRAM));
        assert_eq!(Instruction::set_cgram_address(0), Ok(Instruction::CGRAM_START));
    }

    #[test]
    fn addresses_out_of_range_are_rejected() {
        assert_eq!(Instruction::set_cgram_address(0x40), Err(GpioError::InvalidArgument));
        assert_eq!(Instruction::set_ddram_address(0x80), Err(GpioError::InvalidArgument));
    }

    #[test]
    fn cursor_shift_picks_the_direction() {
        assert_eq!(Instruction::cursor_shift(CursorDirection::Left).bits(), 0b00010000);
        assert_eq!(Instruction::cursor_shift(CursorDirection::Right).bits(), 0b00010100);
    }

    #[test]
    fn only_data_mode_raises_rs() {
        assert!(!Mode::Instruction.rs_level());
        assert!(Mode::Data.rs_level());
    }
}
