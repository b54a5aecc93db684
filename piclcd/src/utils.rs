use std::env::var;
use std::str::FromStr;
use eyre::eyre;
use piclcd_gpio::lcd::hd44780::driver::BusWidth;

/// Parses a list of pin numbers separated by commas, spaces or semicolons, e.g. `26,16,20,21`.
pub fn parse_pin_bus<const N: usize>(pin_str: &str) -> eyre::Result<[usize; N]> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<_>, _>>()?
        .try_into()
        .map_err(|pins: Vec<usize>| eyre!("Expected {} data pins, got {}", N, pins.len()))
}

/// Reads an environment variable, falling back to `default` when it's not set.
pub fn var_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|_| default.to_string())
}

/// Reads and parses an environment variable, if it's set.
pub fn parse_var<T>(key: &str) -> eyre::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Ok(value) => Ok(Some(value.parse()?)),
        Err(_) => Ok(None),
    }
}

/// Maps a number of data lines to the bus width.
pub fn bus_width(lines: u8) -> eyre::Result<BusWidth> {
    match lines {
        4 => Ok(BusWidth::FourBit),
        8 => Ok(BusWidth::EightBit),
        _ => Err(eyre!("A bus has 4 or 8 data lines, not {}", lines)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_bus_accepts_mixed_separators() {
        assert_eq!(parse_pin_bus::<4>("26, 16;20 21").unwrap(), [26, 16, 20, 21]);
    }

    #[test]
    fn pin_bus_needs_the_exact_count() {
        assert!(parse_pin_bus::<4>("26,16,20").is_err());
        assert!(parse_pin_bus::<8>("0,1,2,3,4,5,6,7,8").is_err());
    }

    #[test]
    fn pin_bus_rejects_garbage() {
        assert!(parse_pin_bus::<4>("26,16,x,21").is_err());
    }

    #[test]
    fn bus_width_is_four_or_eight_lines() {
        assert_eq!(bus_width(4).unwrap(), BusWidth::FourBit);
        assert_eq!(bus_width(8).unwrap(), BusWidth::EightBit);
        assert!(bus_width(6).is_err());
    }
}
