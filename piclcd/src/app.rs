//! The sample programs shown on the display.

use std::str::FromStr;
use log::{debug, info};
use thiserror::Error;
use piclcd_gpio::GpioResult;
use piclcd_gpio::lcd::hd44780::driver::HD44780Driver;
use piclcd_gpio::lcd::hd44780::glyph::GlyphSet;

/// Which sample program to run.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Sample {
    /// Greets the world on line 1 and prints a few digits on line 2, once.
    #[default]
    Hello,
    /// Loads custom glyphs into CGRAM and shows them next to ordinary text.
    Glyphs,
    /// Counts loop runs and prints the count.
    Counter,
    /// Announces itself and prints a digit on line 2, once. Meant for an 8-bit bus.
    EightBit,
}

impl Sample {
    /// Whether the sample wants the blinking cursor regardless of the config.
    pub fn blinks(self) -> bool {
        self == Sample::EightBit
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown sample {0:?}, expected one of: hello, glyphs, counter, eight-bit")]
pub struct UnknownSampleError(String);

impl FromStr for Sample {
    type Err = UnknownSampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hello" => Ok(Sample::Hello),
            "glyphs" => Ok(Sample::Glyphs),
            "counter" => Ok(Sample::Counter),
            "eight-bit" => Ok(Sample::EightBit),
            _ => Err(UnknownSampleError(s.to_string())),
        }
    }
}

/// The state of a running sample.
pub struct App<'a> {
    sample: Sample,
    /// The LCD driver the sample writes to.
    lcd: &'a mut dyn HD44780Driver,
    greeting: String,
    /// Glyphs for [Sample::Glyphs], already validated.
    glyphs: GlyphSet,
    /// How many times [App::update] ran.
    runs: u32,
}

impl<'a> App<'a> {
    /// Creates the app. Fails before touching the display if the glyph rows are invalid.
    pub fn new(
        sample: Sample,
        lcd: &'a mut dyn HD44780Driver,
        greeting: String,
        glyph_rows: &[Vec<u8>],
    ) -> GpioResult<App<'a>> {
        let glyphs = GlyphSet::from_rows(glyph_rows)?;
        Ok(App {
            sample,
            lcd,
            greeting,
            glyphs,
            runs: 0,
        })
    }

    /// Initializes the display and does the one-time setup of the sample.
    pub fn setup(&mut self) -> GpioResult<()> {
        info!("Setting up the {:?} sample", self.sample);
        self.lcd.initialize()?;
        match self.sample {
            Sample::Glyphs => {
                self.lcd.clear_and_home()?;
                self.lcd.load_glyph_set(&self.glyphs)?;
            }
            Sample::EightBit => self.lcd.clear_and_home()?,
            Sample::Hello | Sample::Counter => {}
        }
        Ok(())
    }

    /// Runs the sample's loop once.
    ///
    /// Returns `false` once the sample has nothing more to show.
    pub fn update(&mut self) -> GpioResult<bool> {
        self.runs += 1;
        debug!("{:?} run #{}", self.sample, self.runs);

        match self.sample {
            Sample::Hello => {
                self.lcd.write_string("Hello World")?;
                self.lcd.move_to_line_2()?;
                self.lcd.write_bytes(b"579")?;
                Ok(false)
            }
            Sample::Glyphs => {
                self.lcd.write_string("Special Chars")?;
                self.lcd.write_bytes(b"123")?;
                self.lcd.move_to_line_2()?;
                let slots: Vec<u8> = (0..self.glyphs.len() as u8).collect();
                self.lcd.write_bytes(&slots)?;
                self.lcd.write_string(" H.W.")?;
                self.lcd.return_home()?;
                Ok(true)
            }
            Sample::Counter => {
                self.lcd.clear_and_home()?;
                self.lcd.write_string(&self.greeting)?;
                self.lcd.move_to_line_2()?;
                let line = format!("Runs: {:>6}", self.runs);
                self.lcd.write_string(&line)?;
                Ok(true)
            }
            Sample::EightBit => {
                self.lcd.write_string("Working 8Bit LCD")?;
                self.lcd.move_to_line_2()?;
                self.lcd.write_data(b'3')?;
                Ok(false)
            }
        }
    }
}
