//! LCD1602 display driver.

use crate::bus::{Bus, I2cBus};
use crate::{Error, Result, LCD_ROWS};
use serde::{Deserialize, Serialize};
use std::io;
use std::str::FromStr;
use std::thread::sleep;
use tracing::{debug, info, warn};

use super::protocol::{
    bus_byte, cursor_command, enable_pulse, split_nibbles, visible_bytes, Command, Mode,
    ENABLE_PULSE, POWER_ON, SETTLE, SLOW_COMMAND, WAKE_NIBBLES,
};

/// What to do when individual bus writes fail.
///
/// Either way the remaining output of the operation is still sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferPolicy {
    /// Return `Error::Transfer` once the operation has finished.
    #[default]
    Report,
    /// Log the failure and carry on.
    Ignore,
}

impl FromStr for TransferPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "report" => Ok(TransferPolicy::Report),
            "ignore" => Ok(TransferPolicy::Ignore),
            _ => Err(Error::InvalidPolicy(s.to_string())),
        }
    }
}

impl std::fmt::Display for TransferPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferPolicy::Report => write!(f, "report"),
            TransferPolicy::Ignore => write!(f, "ignore"),
        }
    }
}

/// 16x2 character display behind an I2C expander.
///
/// Open from construction until [`Lcd1602::close`]. Dropping an open display
/// closes it.
pub struct Lcd1602<B: Bus = I2cBus> {
    bus: Option<B>,
    address: u8,
    policy: TransferPolicy,
}

impl Lcd1602 {
    /// Opens the I2C device at `path`, selects `address` and initializes the
    /// display. Failed transfers are reported.
    pub fn init(path: &str, address: u8) -> Result<Self> {
        Self::init_with_policy(path, address, TransferPolicy::default())
    }

    /// Like [`Lcd1602::init`] with an explicit transfer policy.
    pub fn init_with_policy(path: &str, address: u8, policy: TransferPolicy) -> Result<Self> {
        let bus = I2cBus::open(path, address)?;
        Self::with_bus(bus, address, policy)
    }
}

impl<B: Bus> Lcd1602<B> {
    /// Runs the initialization sequence over an already opened bus.
    pub fn with_bus(bus: B, address: u8, policy: TransferPolicy) -> Result<Self> {
        if address > 0x7F {
            return Err(Error::InvalidAddress(address));
        }

        let mut lcd = Self {
            bus: Some(bus),
            address,
            policy,
        };

        sleep(POWER_ON);

        let mut batch = lcd.batch()?;
        for nibble in WAKE_NIBBLES {
            batch.nibble(nibble << 4, Mode::Command);
        }
        batch.command(Command::FunctionSet);
        batch.command(Command::DisplayOn);
        batch.command(Command::EntryMode);
        batch.command(Command::ClearDisplay);
        batch.finish(policy)?;

        info!("LCD1602 initialized (address 0x{:02X})", address);
        Ok(lcd)
    }

    /// Clears the display and returns the cursor to the origin.
    pub fn clear(&mut self) -> Result<()> {
        let policy = self.policy;
        let mut batch = self.batch()?;
        batch.command(Command::ClearDisplay);
        batch.finish(policy)?;
        debug!("LCD cleared");
        Ok(())
    }

    /// Returns the cursor to the origin without touching the contents.
    pub fn home(&mut self) -> Result<()> {
        let policy = self.policy;
        let mut batch = self.batch()?;
        batch.command(Command::ReturnHome);
        batch.finish(policy)?;
        debug!("LCD cursor home");
        Ok(())
    }

    /// Writes one line per row, starting at column 0.
    ///
    /// Each line is sent byte by byte and stops at its first NUL or after 16
    /// bytes. Characters already on screen past the end of a line are left
    /// alone.
    pub fn write(&mut self, line1: &str, line2: &str) -> Result<()> {
        let policy = self.policy;
        let mut batch = self.batch()?;
        for (row, line) in (0..LCD_ROWS).zip([line1, line2]) {
            let cursor =
                cursor_command(0, row).ok_or(Error::InvalidPosition { column: 0, row })?;
            batch.byte(cursor, Mode::Command);
            for &ch in visible_bytes(line) {
                batch.byte(ch, Mode::Data);
            }
        }
        batch.finish(policy)?;
        debug!("LCD write: {:?} / {:?}", line1, line2);
        Ok(())
    }

    /// Moves the cursor to `column` on `row`.
    pub fn set_cursor(&mut self, column: u8, row: u8) -> Result<()> {
        let cursor = cursor_command(column, row).ok_or(Error::InvalidPosition { column, row })?;
        let policy = self.policy;
        let mut batch = self.batch()?;
        batch.byte(cursor, Mode::Command);
        batch.finish(policy)
    }

    /// Releases the bus. Safe to call any number of times.
    pub fn close(&mut self) {
        if self.bus.take().is_some() {
            info!("LCD1602 closed (address 0x{:02X})", self.address);
        }
    }

    /// Returns true until the display is closed.
    pub fn is_open(&self) -> bool {
        self.bus.is_some()
    }

    /// Returns the configured device address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Returns the transfer policy.
    pub fn policy(&self) -> TransferPolicy {
        self.policy
    }

    /// Returns the underlying bus while open.
    pub fn bus(&self) -> Option<&B> {
        self.bus.as_ref()
    }

    /// Returns the underlying bus mutably while open.
    pub fn bus_mut(&mut self) -> Option<&mut B> {
        self.bus.as_mut()
    }

    fn batch(&mut self) -> Result<Batch<'_, B>> {
        let bus = self.bus.as_mut().ok_or(Error::NotInitialized)?;
        Ok(Batch {
            bus,
            attempted: 0,
            failed: 0,
            first_error: None,
        })
    }
}

impl<B: Bus> Drop for Lcd1602<B> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Bus writes making up one driver operation.
///
/// Failures are counted rather than propagated so the rest of the
/// operation still reaches the display.
struct Batch<'a, B: Bus> {
    bus: &'a mut B,
    attempted: usize,
    failed: usize,
    first_error: Option<io::Error>,
}

impl<B: Bus> Batch<'_, B> {
    fn put(&mut self, byte: u8) {
        self.attempted += 1;
        if let Err(e) = self.bus.write_byte(byte) {
            warn!("I2C write of 0x{:02X} failed: {}", byte, e);
            self.failed += 1;
            self.first_error.get_or_insert(e);
        }
    }

    /// Latches one nibble (already in bits 7-4) with an enable pulse.
    fn nibble(&mut self, nibble: u8, mode: Mode) {
        let [high, low] = enable_pulse(bus_byte(nibble, mode));
        self.put(high);
        sleep(ENABLE_PULSE);
        self.put(low);
        sleep(SETTLE);
    }

    fn byte(&mut self, value: u8, mode: Mode) {
        for nibble in split_nibbles(value) {
            self.nibble(nibble, mode);
        }
    }

    fn command(&mut self, command: Command) {
        self.byte(command as u8, Mode::Command);
        if command.is_slow() {
            sleep(SLOW_COMMAND);
        }
    }

    fn finish(self, policy: TransferPolicy) -> Result<()> {
        match (self.first_error, policy) {
            (Some(source), TransferPolicy::Report) => Err(Error::Transfer {
                failed: self.failed,
                attempted: self.attempted,
                source,
            }),
            _ => Ok(()),
        }
    }
}
