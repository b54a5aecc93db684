mod app;
mod config;
mod utils;

use std::env::var;
use std::thread;
use std::time::Duration;
use dotenv::dotenv;
use eyre::eyre;
use log::{debug, info, warn};
use piclcd_gpio::GpioDriver;
use piclcd_gpio::delay::{Delay, SleepDelay};
use piclcd_gpio::gpiod::GpiodDriver;
use piclcd_gpio::lcd::hd44780::driver::{
    BusWidth, GpioHD44780Bus, HD44780Bus, HD44780Lcd, PortHD44780Bus, RecordingBus,
};
use crate::app::{App, Sample};
use crate::config::Config;
use crate::utils::{bus_width, parse_pin_bus, parse_var, var_or};

fn main() -> eyre::Result<()> {
    // A missing .env file is fine, the variables may come from the environment
    dotenv().ok();
    pretty_env_logger::init();

    info!("PicLCD starting...");

    let config = if let Some(config) = Config::try_load() {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        Config::default()
    };

    let sample: Sample = parse_var("PICLCD_SAMPLE")?.unwrap_or_default();
    let iterations: Option<u32> = parse_var("PICLCD_ITERATIONS")?;
    let width = bus_width(parse_var("PICLCD_BUS_WIDTH")?.unwrap_or(4))?;
    let backend = var_or("PICLCD_BACKEND", "dry-run");

    info!("Running the {:?} sample on the {} backend ({:?})", sample, backend, width);

    match backend.as_str() {
        "dry-run" => {
            let recorder = RecordingBus::with_width(width);
            run(&config, sample, iterations, &recorder, &recorder, Some(&recorder))
        }
        "gpiod" => run_gpiod(&config, sample, iterations, width),
        other => Err(eyre!("Unknown backend {:?}, expected gpiod or dry-run", other)),
    }
}

fn run_gpiod(
    config: &Config,
    sample: Sample,
    iterations: Option<u32>,
    width: BusWidth,
) -> eyre::Result<()> {
    let chip = var_or("PICLCD_GPIO_CHIP", "/dev/gpiochip0");

    debug!("Initializing GPIO driver...");
    let gpio = GpiodDriver::open(&chip)?;
    debug!("{:?} initialized.", gpio);

    let delay = SleepDelay;
    match var_or("PICLCD_WIRING", "pins").as_str() {
        "pins" => {
            let lcd_e_pin_no: usize = var("PICLCD_LCD_PIN_E")?.parse()?;
            let lcd_rs_pin_no: usize = var("PICLCD_LCD_PIN_RS")?.parse()?;
            let lcd_data_pins = var("PICLCD_LCD_PINS_DATA")?;
            info!("LCD @ E: {}, RS: {}, Data: {}", lcd_e_pin_no, lcd_rs_pin_no, lcd_data_pins);

            let mut lcd_e_pin = gpio.get_pin(lcd_e_pin_no)?;
            let lcd_e_out = lcd_e_pin.as_output()?;
            let mut lcd_rs_pin = gpio.get_pin(lcd_rs_pin_no)?;
            let lcd_rs_out = lcd_rs_pin.as_output()?;

            match width {
                BusWidth::FourBit => {
                    let lcd_data_pin_nos: [usize; 4] = parse_pin_bus(&lcd_data_pins)?;
                    let mut lcd_data_bus = gpio.get_pin_bus(lcd_data_pin_nos)?;
                    let lcd_data_out = lcd_data_bus.as_output()?;

                    let bus = GpioHD44780Bus::new_4bit(&*lcd_e_out, &*lcd_rs_out, &*lcd_data_out);
                    run(config, sample, iterations, &bus, &delay, None)
                }
                BusWidth::EightBit => {
                    let lcd_data_pin_nos: [usize; 8] = parse_pin_bus(&lcd_data_pins)?;
                    let mut lcd_data_bus = gpio.get_pin_bus(lcd_data_pin_nos)?;
                    let lcd_data_out = lcd_data_bus.as_output()?;

                    let bus = GpioHD44780Bus::new_8bit(&*lcd_e_out, &*lcd_rs_out, &*lcd_data_out);
                    run(config, sample, iterations, &bus, &delay, None)
                }
            }
        }
        "port" if width == BusWidth::EightBit => {
            Err(eyre!("The port wiring only carries a 4-bit bus"))
        }
        "port" => {
            let lcd_port_pin_nos: [usize; 8] = parse_pin_bus(&var("PICLCD_LCD_PINS_PORT")?)?;
            info!("LCD @ Port: {:?}", lcd_port_pin_nos);

            let mut lcd_port = gpio.get_pin_bus(lcd_port_pin_nos)?;
            let lcd_port_out = lcd_port.as_output()?;

            let bus = PortHD44780Bus::new(&*lcd_port_out);
            run(config, sample, iterations, &bus, &delay, None)
        }
        other => Err(eyre!("Unknown wiring {:?}, expected pins or port", other)),
    }
}

/// Sets up the display and runs the sample's loop until it's done or `iterations` runs are over.
///
/// With a `recorder`, every run's traffic is decoded and logged instead of going anywhere.
fn run(
    config: &Config,
    sample: Sample,
    iterations: Option<u32>,
    bus: &dyn HD44780Bus,
    delay: &dyn Delay,
    recorder: Option<&RecordingBus>,
) -> eyre::Result<()> {
    debug!("Initializing LCD driver...");
    let mut lcd = HD44780Lcd::new(bus, delay)
        .with_timing(config.timing())?
        .with_geometry(config.geometry.into())?
        .with_blink(config.blink || sample.blinks());
    debug!("{:?} initialized.", lcd);

    let mut app = App::new(sample, &mut lcd, config.greeting.clone(), &config.glyphs)?;
    app.setup()?;
    if let Some(recorder) = recorder {
        log_traffic("setup", recorder);
    }

    info!("Starting main loop...");

    let mut runs = 0;
    loop {
        let more = app.update()?;
        runs += 1;
        if let Some(recorder) = recorder {
            log_traffic(&format!("run #{}", runs), recorder);
        }

        if !more {
            info!("Sample finished after {} runs.", runs);
            break;
        }
        if iterations.is_some_and(|iterations| runs >= iterations) {
            info!("Stopping after {} runs.", runs);
            break;
        }

        thread::sleep(Duration::from_millis(config.update_interval_ms));
    }

    Ok(())
}

/// Logs the bytes the recorder saw since the last call, then forgets them.
fn log_traffic(label: &str, recorder: &RecordingBus) {
    for (mode, byte) in recorder.bytes() {
        debug!("{}: {:?} {:#04x} {:?}", label, mode, byte, byte as char);
    }
    let waited: u32 = recorder.waits().iter().sum();
    info!("{}: {} bytes sent, {} ms of waits", label, recorder.bytes().len(), waited);
    if recorder.width() == BusWidth::FourBit && recorder.transfers().len() % 2 != 0 {
        warn!("{}: odd number of nibbles, the display is out of sync", label);
    }
    recorder.clear();
}
