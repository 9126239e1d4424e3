//! Character display module.
//!
//! Drives the 16x2 HD44780 display in 4-bit mode over the I2C expander.

mod device;
mod protocol;

pub use device::{Lcd1602, TransferPolicy};
pub use protocol::{cursor_command, split_nibbles, visible_bytes, Command, Mode};
