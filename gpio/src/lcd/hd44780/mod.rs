//! HD44780 LCD module.
//!
//! The controller is driven write-only, normally over a 4-bit bus where every byte goes out as two
//! nibbles, high nibble first. An 8-bit bus sends each byte at once. Instead of polling the busy
//! flag the driver waits a fixed time after each transfer. See [driver::HD44780Driver] for the operations, [driver::HD44780Lcd] for the
//! implementation and [driver::HD44780Bus] for the wiring it talks to.
pub mod driver;
pub mod glyph;
pub mod instruction;
