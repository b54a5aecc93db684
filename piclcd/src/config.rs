use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;
use log::warn;
use piclcd_gpio::lcd::hd44780::driver::{DisplayGeometry, Timing};
use serde::{Deserialize, Serialize};

/// Display sizes the samples know about.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum Geometry {
    #[default]
    #[serde(rename = "16x2")]
    Lcd16x2,
    #[serde(rename = "20x2")]
    Lcd20x2,
}

impl From<Geometry> for DisplayGeometry {
    fn from(geometry: Geometry) -> Self {
        match geometry {
            Geometry::Lcd16x2 => DisplayGeometry::LCD_16X2,
            Geometry::Lcd20x2 => DisplayGeometry::LCD_20X2,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub geometry: Geometry,
    /// Show a blinking cursor.
    pub blink: bool,
    /// First line of the counter sample.
    pub greeting: String,
    /// Custom characters for the glyph sample, 8 rows of 5 pixels each.
    pub glyphs: Vec<Vec<u8>>,
    /// Pause between two runs of a sample's loop.
    pub update_interval_ms: u64,
    pub power_on_ms: u32,
    pub settle_ms: u32,
    pub clear_settle_ms: u32,
}

impl Config {
    pub fn try_load() -> Option<Self> {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("config.json"));
        let config_path = Path::new(config_str);
        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            let reader = std::io::BufReader::new(file);
            serde_json::from_reader(reader)
                .inspect_err(|err| warn!("Ignoring {}: {}", config_path.display(), err))
                .ok()
        } else {
            None
        }
    }

    pub fn timing(&self) -> Timing {
        Timing {
            power_on_ms: self.power_on_ms,
            settle_ms: self.settle_ms,
            clear_settle_ms: self.clear_settle_ms,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let timing = Timing::default();
        Config {
            geometry: Geometry::default(),
            blink: false,
            greeting: "Hello World".to_string(),
            glyphs: vec![
                vec![0b00100, 0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110, 0b00100],
                vec![0b10101, 0b10101, 0b10101, 0b10101, 0b10101, 0b10101, 0b10001, 0b10001],
                vec![0b00001, 0b00001, 0b00001, 0b00011, 0b00011, 0b00011, 0b00011, 0b00011],
                vec![0b10001, 0b10001, 0b00100, 0b00100, 0b11011, 0b11011, 0b11111, 0b01110],
            ],
            update_interval_ms: 250,
            power_on_ms: timing.power_on_ms,
            settle_ms: timing.settle_ms,
            clear_settle_ms: timing.clear_settle_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{ "geometry": "20x2", "blink": true }"#).unwrap();
        assert_eq!(config.geometry, Geometry::Lcd20x2);
        assert!(config.blink);
        assert_eq!(config.glyphs, Config::default().glyphs);
        assert_eq!(config.timing(), Timing::default());
    }

    #[test]
    fn geometry_maps_to_the_display_layout() {
        assert_eq!(DisplayGeometry::from(Geometry::Lcd16x2).columns, 16);
        assert_eq!(DisplayGeometry::from(Geometry::Lcd20x2).columns, 20);
    }

    #[test]
    fn unknown_geometry_is_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{ "geometry": "40x4" }"#).is_err());
    }

    #[test]
    fn default_glyphs_fit_the_cgram() {
        let config = Config::default();
        assert!(config.glyphs.len() <= 8);
        assert!(config.glyphs.iter().all(|rows| rows.len() == 8));
        assert!(config.glyphs.iter().flatten().all(|&row| row <= 0b11111));
    }
}
