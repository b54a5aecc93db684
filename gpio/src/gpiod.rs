//! GpiodDriver implementation for driving output lines through the Linux GPIO character device,
//! using the gpiod library.
use crate::{GpioBus, GpioBusOutput, GpioDriver, GpioError, GpioOutput, GpioPin, GpioResult};
use bitvec::vec::BitVec;
use log::{debug, trace};
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::atomic::AtomicU8;

/// GpiodDriver is a GPIO driver that uses the gpiod library to manage GPIO lines of one chip.
///
/// Claimed lines are tracked so the same line can't be handed out twice, e.g. as the E pin and as
/// part of the data bus at the same time.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    used_pins: BitVec<AtomicU8>,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        let n = chip.num_lines() as usize;
        let bits = BitVec::repeat(false, n);
        Self {
            chip,
            used_pins: bits,
        }
    }

    /// Opens the chip at the given path, e.g. `/dev/gpiochip0`.
    pub fn open(path: impl AsRef<Path>) -> GpioResult<Self> {
        let chip = gpiod::Chip::new(path.as_ref())?;
        debug!("Opened GPIO chip {} with {} lines", chip.name(), chip.num_lines());
        Ok(Self::new(chip))
    }

    fn claim(&self, indices: &[usize]) -> GpioResult<()> {
        let n = self.count()?;

        if indices.iter().any(|&index| index >= n) {
            return Err(GpioError::InvalidArgument);
        }

        if indices.iter().any(|&index| self.used_pins[index]) {
            return Err(GpioError::AlreadyInUse);
        }

        for &index in indices {
            self.used_pins.set_aliased(index, true);
        }
        Ok(())
    }

    fn claim_lines<const N: usize>(&self, indices: [usize; N]) -> GpioResult<ClaimedLines<'_, N>> {
        self.claim(&indices)?;
        Ok(ClaimedLines {
            driver: self,
            indices,
        })
    }

    fn release(&self, indices: &[usize]) {
        for &index in indices {
            self.used_pins.set_aliased(index, false);
        }
    }

    /// Requests the lines from the kernel as outputs.
    fn request_output(&self, indices: &[usize]) -> GpioResult<gpiod::Lines<gpiod::Output>> {
        trace!("Requesting lines {:?} as outputs", indices);
        let offsets: Vec<u32> = indices.iter().map(|&index| index as u32).collect();
        let lines = self.chip.request_lines(
            gpiod::Options::output(offsets).consumer(env!("CARGO_PKG_NAME")),
        )?;
        Ok(lines)
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl GpioDriver for GpiodDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.chip.num_lines() as usize)
    }

    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>> {
        Ok(Box::new(self.claim_lines([index])?))
    }

    fn get_pin_bus<const N: usize>(
        &self,
        indices: [usize; N],
    ) -> GpioResult<Box<dyn GpioBus<N> + '_>> {
        Ok(Box::new(self.claim_lines(indices)?))
    }
}

/// Lines of the chip reserved for one user. A single pin is a claim of one line.
///
/// The lines are only requested from the kernel once they're turned into an output, and given back
/// to the driver when this is dropped.
struct ClaimedLines<'a, const N: usize> {
    driver: &'a GpiodDriver,
    indices: [usize; N],
}

impl<const N: usize> Debug for ClaimedLines<'_, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}{:?}", self.driver, self.indices)
    }
}

impl<const N: usize> ClaimedLines<'_, N> {
    fn output(&self) -> GpioResult<OutputLines<'_, N>> {
        let lines = self.driver.request_output(&self.indices)?;
        Ok(OutputLines { claim: self, lines })
    }
}

impl GpioPin for ClaimedLines<'_, 1> {
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioOutput + '_>> {
        Ok(Box::new(self.output()?))
    }
}

impl<const N: usize> GpioBus<N> for ClaimedLines<'_, N> {
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>> {
        Ok(Box::new(self.output()?))
    }
}

impl<const N: usize> Drop for ClaimedLines<'_, N> {
    fn drop(&mut self) {
        self.driver.release(&self.indices);
    }
}

struct OutputLines<'a, const N: usize> {
    claim: &'a ClaimedLines<'a, N>,
    lines: gpiod::Lines<gpiod::Output>,
}

impl<const N: usize> Debug for OutputLines<'_, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[output]", self.claim)
    }
}

impl GpioOutput for OutputLines<'_, 1> {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.lines.set_values([value])?;
        Ok(())
    }
}

impl<const N: usize> GpioBusOutput<N> for OutputLines<'_, N> {
    fn write(&self, values: &[bool; N]) -> GpioResult<()> {
        self.lines.set_values(*values)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_a_missing_chip_is_an_io_error() {
        let result = GpiodDriver::open("/dev/piclcd-no-such-gpiochip");
        assert!(matches!(result, Err(GpioError::Io(_))));
    }
}
