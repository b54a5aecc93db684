pub mod delay;
pub mod gpiod;
pub mod lcd;

use crate::lcd::hd44780::glyph::GlyphError;
use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("invalid glyph: {0}")]
    InvalidGlyph(#[from] GlyphError),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

pub trait GpioDriver: Debug {
    /// Gets the amount of GPIO pins available.
    fn count(&self) -> GpioResult<usize>;

    /// Gets the GPIO pin at the given index.
    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>>;

    /// Gets the GPIO pin bus at the specific indices.
    fn get_pin_bus<const N: usize>(
        &self,
        indices: [usize; N],
    ) -> GpioResult<Box<dyn GpioBus<N> + '_>>;
}

pub trait GpioPin: Debug {
    /// Sets the GPIO pin function to output, allowing writing its state.
    ///
    /// The LCD is write-only in this project (R/W tied to GND), so there is no input counterpart.
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioOutput + '_>>;
}

pub trait GpioOutput: Debug {
    /// Writes the state of the GPIO pin.
    fn write(&self, value: bool) -> GpioResult<()>;
}

pub trait GpioBus<const N: usize>: Debug {
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>>;
}

pub trait GpioBusOutput<const N: usize>: Debug {
    fn write(&self, values: &[bool; N]) -> GpioResult<()>;
}

impl dyn GpioBusOutput<8> + '_ {
    /// Writes the values to the GPIO pins in the bus.
    /// The values are written as a byte, LSb first.
    pub fn write_byte(&self, value: u8) -> GpioResult<()> {
        self.write(&byte_to_levels(value))
    }
}

impl dyn GpioBusOutput<4> + '_ {
    /// Writes the values to the GPIO pins in the bus.
    /// The values are written as a nibble, LSb first.
    pub fn write_nibble(&self, value: u8) -> GpioResult<()> {
        self.write(&nibble_to_levels(value)?)
    }
}

/// Splits a byte into pin levels, LSb first.
pub fn byte_to_levels(value: u8) -> [bool; 8] {
    let mut values = [false; 8];
    for (i, level) in values.iter_mut().enumerate() {
        *level = (value & (1 << i)) != 0;
    }
    values
}

/// Splits a nibble into pin levels, LSb first.
///
/// # Errors
/// - `GpioError::InvalidArgument` if the value doesn't fit in 4 bits.
pub fn nibble_to_levels(value: u8) -> GpioResult<[bool; 4]> {
    if value > 0b1111 {
        return Err(GpioError::InvalidArgument);
    }

    let mut values = [false; 4];
    for (i, level) in values.iter_mut().enumerate() {
        *level = (value & (1 << i)) != 0;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nibble_levels_are_lsb_first() {
        assert_eq!(nibble_to_levels(0b0001), Ok([true, false, false, false]));
        assert_eq!(nibble_to_levels(0b1010), Ok([false, true, false, true]));
    }

    #[test]
    fn nibble_levels_reject_wide_values() {
        assert_eq!(nibble_to_levels(0x10), Err(GpioError::InvalidArgument));
    }

    #[test]
    fn byte_levels_are_lsb_first() {
        assert_eq!(
            byte_to_levels(0b0011_0101),
            [true, false, true, false, true, true, false, false]
        );
    }
}
