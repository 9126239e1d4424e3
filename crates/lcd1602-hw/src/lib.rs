//! LCD1602 Hardware Library
//!
//! Drives 16x2 character displays built on an HD44780-compatible controller
//! wired through a PCF8574 I2C port expander (the common "LCD1602 I2C"
//! backpack modules sold for the Raspberry Pi).

pub mod bus;
pub mod error;
pub mod lcd;

pub use bus::{Bus, I2cBus, RecordingBus};
pub use error::{Error, Result};
pub use lcd::{Lcd1602, TransferPolicy};

/// Number of character rows on the display.
pub const LCD_ROWS: u8 = 2;

/// Number of character columns on the display.
pub const LCD_COLUMNS: u8 = 16;

/// Default I2C bus device on a Raspberry Pi.
pub const DEFAULT_BUS: &str = "/dev/i2c-1";

/// Default PCF8574 address of the backpack module.
pub const DEFAULT_ADDRESS: u8 = 0x27;
