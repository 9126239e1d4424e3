//! HD44780 protocol definitions and encoding.
//!
//! Expander pin mapping (PCF8574 backpack):
//! - P7..P4: controller data lines D7..D4
//! - P3: backlight
//! - P2: enable (E)
//! - P1: read/write (always write)
//! - P0: register select (RS)

use std::time::Duration;

/// Backlight bit, kept set on every bus byte.
pub const BACKLIGHT: u8 = 0x08;

/// Enable bit; the controller latches the nibble on its falling edge.
pub const ENABLE: u8 = 0x04;

/// Enable high time. Well above the datasheet minimum of 450 ns.
pub const ENABLE_PULSE: Duration = Duration::from_micros(500);

/// Settle time after enable falls.
pub const SETTLE: Duration = Duration::from_micros(100);

/// Execution time of clear display and return home (datasheet: 1.52 ms).
pub const SLOW_COMMAND: Duration = Duration::from_millis(2);

/// Wait after power-on before the first transfer (datasheet: >40 ms).
pub const POWER_ON: Duration = Duration::from_millis(50);

/// Nibbles that force the controller into 4-bit mode from any state.
///
/// Equivalent to the byte pair 0x33, 0x32 split high nibble first.
pub const WAKE_NIBBLES: [u8; 4] = [0x3, 0x3, 0x3, 0x2];

/// DDRAM base address of each row.
pub const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

/// Register targeted by a transfer (the RS line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// Instruction register.
    Command = 0x00,
    /// Data register (characters).
    Data = 0x01,
}

/// Controller instructions used by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Clear display, cursor to address 0.
    ClearDisplay = 0x01,
    /// Cursor to address 0, undo display shift.
    ReturnHome = 0x02,
    /// Entry mode: increment cursor, no display shift.
    EntryMode = 0x06,
    /// Display control: display on, cursor off, blink off.
    DisplayOn = 0x0C,
    /// Function set: 4-bit interface, 2 lines, 5x8 font.
    FunctionSet = 0x28,
    /// Set DDRAM address; OR'd with the target address.
    SetDdramAddress = 0x80,
}

impl Command {
    /// Returns true for instructions that need `SLOW_COMMAND` to execute.
    pub fn is_slow(&self) -> bool {
        matches!(self, Command::ClearDisplay | Command::ReturnHome)
    }
}

/// Splits a byte into its two nibbles, high first, each in bits 7-4.
pub fn split_nibbles(byte: u8) -> [u8; 2] {
    [byte & 0xF0, (byte << 4) & 0xF0]
}

/// Builds the bus byte for a nibble already placed in bits 7-4.
pub fn bus_byte(nibble: u8, mode: Mode) -> u8 {
    (nibble & 0xF0) | BACKLIGHT | mode as u8
}

/// The two bus writes of an enable pulse: enable set, then cleared.
pub fn enable_pulse(byte: u8) -> [u8; 2] {
    [byte | ENABLE, byte & !ENABLE]
}

/// Set-DDRAM-address command for a cursor position, or `None` outside the
/// 16x2 grid.
pub fn cursor_command(column: u8, row: u8) -> Option<u8> {
    if column >= crate::LCD_COLUMNS {
        return None;
    }
    let base = ROW_OFFSETS.get(row as usize)?;
    Some(Command::SetDdramAddress as u8 | column.checked_add(*base)?)
}

/// Bytes of `line` that fit on one row: up to the first NUL, at most 16
/// bytes. Multi-byte UTF-8 sequences are not kept whole.
pub fn visible_bytes(line: &str) -> &[u8] {
    let bytes = line.as_bytes();
    let end = bytes
        .iter()
        .take(crate::LCD_COLUMNS as usize)
        .position(|&b| b == 0)
        .unwrap_or_else(|| bytes.len().min(crate::LCD_COLUMNS as usize));
    &bytes[..end]
}
