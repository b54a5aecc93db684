//! HD44780 LCD driver module.
//!
//! [HD44780Driver] defines the operations on the display, most of them provided on top of the three
//! low-level ones: [HD44780Driver::initialize], [HD44780Driver::write_instruction] and
//! [HD44780Driver::write_data]. [HD44780Lcd] implements those over any [HD44780Bus], which is the
//! only place where pins are touched.

mod gpio;
mod lcd;
mod recording;

use crate::lcd::hd44780::glyph::{GLYPH_ROWS, GLYPH_SLOTS, Glyph, GlyphSet};
use crate::lcd::hd44780::instruction::{CursorDirection, Instruction, Mode};
use crate::{GpioError, GpioResult};
use log::{debug, warn};
use std::fmt::Debug;
pub use gpio::*;
pub use lcd::*;
pub use recording::*;

/// How many data lines connect the driver to the controller.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum BusWidth {
    /// D4–D7 only. Every byte takes two transfers, high nibble first.
    #[default]
    FourBit,
    /// D0–D7. Every byte is a single transfer.
    EightBit,
}

impl BusWidth {
    /// Gets the largest value the data lines can carry in one transfer.
    pub fn max_value(self) -> u8 {
        match self {
            BusWidth::FourBit => 0b00001111,
            BusWidth::EightBit => 0b11111111,
        }
    }
}

/// The wires between the driver and an HD44780 bus: the data lines, RS and E. R/W is assumed to
/// be tied to GND, as nothing is ever read back.
///
/// Every call takes effect immediately; implementations don't buffer.
pub trait HD44780Bus: Debug {
    /// Puts a value on the data lines, LSb on the lowest connected line (D4 on a 4-bit bus, D0 on
    /// an 8-bit one).
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the value doesn't fit in [HD44780Bus::width].
    fn set_data_lines(&self, value: u8) -> GpioResult<()>;

    /// Sets the RS line for the given mode.
    fn set_mode_line(&self, mode: Mode) -> GpioResult<()>;

    /// Pulses the E line (low, high, low), latching the data lines into the controller.
    fn pulse_strobe(&self) -> GpioResult<()>;

    fn width(&self) -> BusWidth {
        BusWidth::FourBit
    }
}

/// Splits a byte into the two nibbles sent over a 4-bit bus, high nibble first.
pub fn split_nibbles(byte: u8) -> [u8; 2] {
    [(byte >> 4) & 0x0F, byte & 0x0F]
}

/// Fixed waits used in place of busy-flag polling, in milliseconds.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Timing {
    /// Wait before the first transfer after power-on. The datasheet asks for more than 15 ms
    /// at 4.5 V and more than 40 ms at 2.7 V.
    pub power_on_ms: u32,
    /// Wait after every nibble.
    pub settle_ms: u32,
    /// Wait after the second nibble of [Instruction::CLEAR_DISPLAY], which takes the controller
    /// much longer than anything else. Has to be strictly greater than `settle_ms`.
    pub clear_settle_ms: u32,
}

impl Timing {
    /// The shortest power-on wait the datasheet allows, at 4.5 V.
    pub const MIN_POWER_ON_MS: u32 = 15;

    /// # Errors
    /// - `GpioError::InvalidArgument` if the power-on wait is below [Timing::MIN_POWER_ON_MS],
    ///   if there is no settle wait, or if clearing doesn't get a longer wait than other
    ///   instructions.
    pub fn validate(&self) -> GpioResult<()> {
        if self.power_on_ms < Self::MIN_POWER_ON_MS
            || self.settle_ms == 0
            || self.clear_settle_ms <= self.settle_ms
        {
            return Err(GpioError::InvalidArgument);
        }
        Ok(())
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            power_on_ms: 40,
            settle_ms: 2,
            clear_settle_ms: 5,
        }
    }
}

/// The layout of a two-line display.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DisplayGeometry {
    /// Visible characters per line.
    pub columns: u8,
    /// DDRAM address of the first character of line 2.
    pub line_two_address: u8,
}

impl DisplayGeometry {
    pub const LCD_16X2: DisplayGeometry = DisplayGeometry {
        columns: 16,
        line_two_address: 0x40,
    };
    pub const LCD_20X2: DisplayGeometry = DisplayGeometry {
        columns: 20,
        line_two_address: 0x40,
    };

    /// # Errors
    /// - `GpioError::InvalidArgument` if there are no columns, or line 2 would start outside DDRAM.
    pub fn validate(&self) -> GpioResult<()> {
        if self.columns == 0 || self.line_two_address > 0b01111111 {
            return Err(GpioError::InvalidArgument);
        }
        Ok(())
    }
}

impl Default for DisplayGeometry {
    fn default() -> Self {
        DisplayGeometry::LCD_16X2
    }
}

pub trait HD44780Driver: Debug {
    /// Runs the power-on handshake. This is to be implemented by the specific driver
    /// implementation, see [HD44780Lcd::initialize] for the sequence.
    fn initialize(&mut self) -> GpioResult<()>;

    /// Sends an instruction, with RS low.
    fn write_instruction(&mut self, instruction: Instruction) -> GpioResult<()>;

    /// Sends a data byte, with RS high. Used for characters, for glyph slot numbers and for CGRAM
    /// rows.
    fn write_data(&mut self, data: u8) -> GpioResult<()>;

    /// Gets the mode of the last byte sent (or the mode the RS line was parked in).
    fn mode(&self) -> Mode;

    fn geometry(&self) -> DisplayGeometry;

    /// Sends each byte as data, in order.
    fn write_bytes(&mut self, bytes: &[u8]) -> GpioResult<()> {
        for &byte in bytes {
            self.write_data(byte)?;
        }
        Ok(())
    }

    /// Writes the text at the cursor, stopping at the first NUL character.
    ///
    /// There is no wrapping; call [HD44780Driver::move_to_line_2] when the line is full.
    /// Non-ASCII characters are shown as `?`.
    fn write_string(&mut self, text: &str) -> GpioResult<()> {
        for c in text.chars().take_while(|&c| c != '\0') {
            if c.is_ascii() {
                self.write_data(c as u8)?;
            } else {
                warn!("Non-ASCII character: {}", c);
                self.write_data(b'?')?;
            }
        }
        Ok(())
    }

    /// Clears the display and sets the cursor to the home position.
    fn clear_and_home(&mut self) -> GpioResult<()> {
        self.write_instruction(Instruction::CLEAR_DISPLAY)?;
        self.write_instruction(Instruction::RETURN_HOME)
    }

    /// Sets the cursor to the home position, keeping the text.
    fn return_home(&mut self) -> GpioResult<()> {
        self.write_instruction(Instruction::RETURN_HOME)
    }

    /// Sets the cursor to the first position of line 2.
    fn move_to_line_2(&mut self) -> GpioResult<()> {
        let instruction = Instruction::set_ddram_address(self.geometry().line_two_address)?;
        self.write_instruction(instruction)
    }

    /// Sets the cursor to the zero-based `row` and `col`.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the position is outside the display.
    fn set_cursor(&mut self, row: u8, col: u8) -> GpioResult<()> {
        let geometry = self.geometry();
        if row > 1 || col >= geometry.columns {
            return Err(GpioError::InvalidArgument);
        }
        let line_start = if row == 0 { 0 } else { geometry.line_two_address };
        let address = line_start.checked_add(col).ok_or(GpioError::InvalidArgument)?;
        self.write_instruction(Instruction::set_ddram_address(address)?)
    }

    /// Moves the cursor one position without writing.
    fn shift_cursor(&mut self, direction: CursorDirection) -> GpioResult<()> {
        self.write_instruction(Instruction::cursor_shift(direction))
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> GpioResult<()> {
        self.write_instruction(Instruction::display_control(display_on, cursor_on, blink_on))
    }

    /// Uploads the glyphs into consecutive CGRAM slots starting at slot 0.
    ///
    /// Only the first slot address is sent; the controller increments the CGRAM address after every
    /// row, so the next glyph lands in the next slot. Afterwards the DDRAM address is set back to 0,
    /// which also moves the cursor home. An empty set sends nothing.
    fn load_glyph_set(&mut self, set: &GlyphSet) -> GpioResult<()> {
        if set.is_empty() {
            return Ok(());
        }

        debug!("Loading {} glyphs into CGRAM", set.len());
        self.write_instruction(Instruction::CGRAM_START)?;
        for glyph in set.glyphs() {
            self.write_bytes(glyph.rows())?;
        }
        self.write_instruction(Instruction::RETURN_TO_DDRAM)
    }

    /// Validates the raw rows and uploads them like [HD44780Driver::load_glyph_set]. Nothing is
    /// sent if any glyph is invalid.
    fn load_glyph_rows(&mut self, glyphs: &[&[u8]]) -> GpioResult<()> {
        let set = GlyphSet::from_rows(glyphs)?;
        self.load_glyph_set(&set)
    }

    /// Uploads a single glyph into the given slot (0–7), then returns to DDRAM addressing.
    fn define_glyph(&mut self, slot: u8, glyph: &Glyph) -> GpioResult<()> {
        if slot as usize >= GLYPH_SLOTS {
            return Err(GpioError::InvalidArgument);
        }
        self.write_instruction(Instruction::set_cgram_address(slot * GLYPH_ROWS as u8)?)?;
        self.write_bytes(glyph.rows())?;
        self.write_instruction(Instruction::RETURN_TO_DDRAM)
    }
}

/// Lets formatted values be printed with `write!`, e.g. a measurement with two decimals.
impl std::fmt::Write for dyn HD44780Driver + '_ {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.write_string(s).map_err(|err| {
            warn!("Failed to write to the display: {}", err);
            std::fmt::Error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nibbles_go_high_first() {
        assert_eq!(split_nibbles(0b10100101), [0b1010, 0b0101]);
        assert_eq!(split_nibbles(0x00), [0, 0]);
        assert_eq!(split_nibbles(0xFF), [0x0F, 0x0F]);
    }

    #[test]
    fn default_timing_gives_clear_the_longest_wait() {
        assert_eq!(Timing::default().validate(), Ok(()));
        let timing = Timing {
            clear_settle_ms: 2,
            ..Timing::default()
        };
        assert_eq!(timing.validate(), Err(GpioError::InvalidArgument));
    }

    #[test]
    fn timing_needs_the_datasheet_power_on_wait() {
        let timing = Timing {
            power_on_ms: Timing::MIN_POWER_ON_MS - 1,
            ..Timing::default()
        };
        assert_eq!(timing.validate(), Err(GpioError::InvalidArgument));

        let timing = Timing {
            power_on_ms: Timing::MIN_POWER_ON_MS,
            ..Timing::default()
        };
        assert_eq!(timing.validate(), Ok(()));
    }

    #[test]
    fn timing_needs_a_settle_wait() {
        let timing = Timing {
            power_on_ms: 40,
            settle_ms: 0,
            clear_settle_ms: 1,
        };
        assert_eq!(timing.validate(), Err(GpioError::InvalidArgument));
    }

    #[test]
    fn bus_width_limits_the_data_lines() {
        assert_eq!(BusWidth::default(), BusWidth::FourBit);
        assert_eq!(BusWidth::FourBit.max_value(), 0x0F);
        assert_eq!(BusWidth::EightBit.max_value(), 0xFF);
    }

    #[test]
    fn geometry_keeps_line_two_inside_ddram() {
        assert_eq!(DisplayGeometry::LCD_20X2.validate(), Ok(()));
        let geometry = DisplayGeometry {
            columns: 16,
            line_two_address: 0x80,
        };
        assert_eq!(geometry.validate(), Err(GpioError::InvalidArgument));
    }
}
