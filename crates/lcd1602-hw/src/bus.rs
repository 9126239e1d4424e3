//! Byte-oriented buses the display driver writes through.
//!
//! The PCF8574 expander latches every byte written to it onto its eight
//! output pins, so the whole controller protocol reduces to a stream of
//! single-byte writes.

use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use tracing::{debug, info};

/// `I2C_SLAVE` ioctl request from `linux/i2c-dev.h`.
const I2C_SLAVE: libc::c_ulong = 0x0703;

/// A sink for single bus bytes.
pub trait Bus {
    /// Writes one byte to the device.
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;
}

/// Linux I2C character device bound to one slave address.
#[derive(Debug)]
pub struct I2cBus {
    file: File,
    path: String,
    address: u8,
}

impl I2cBus {
    /// Opens `path` read-write and selects `address` as the slave.
    pub fn open(path: &str, address: u8) -> Result<Self> {
        if address > 0x7F {
            return Err(Error::InvalidAddress(address));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| Error::Io {
                path: path.to_string(),
                source,
            })?;

        // SAFETY: the descriptor is owned by `file` and stays open for the call.
        let rc = unsafe { libc::ioctl(file.as_raw_fd(), I2C_SLAVE as _, address as libc::c_ulong) };
        if rc < 0 {
            return Err(Error::SelectAddress {
                address,
                source: io::Error::last_os_error(),
            });
        }

        info!("I2C bus opened: {} (address 0x{:02X})", path, address);

        Ok(Self {
            file,
            path: path.to_string(),
            address,
        })
    }

    /// Returns the device path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the selected slave address.
    pub fn address(&self) -> u8 {
        self.address
    }
}

impl Bus for I2cBus {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        match self.file.write(&[byte])? {
            1 => Ok(()),
            n => Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short I2C write ({} of 1 bytes)", n),
            )),
        }
    }
}

impl Drop for I2cBus {
    fn drop(&mut self) {
        debug!("Closing I2C bus {}", self.path);
    }
}

/// In-memory bus that records every byte written to it.
///
/// Writes whose zero-based attempt index is listed in the failure set return
/// an error and are not recorded.
#[derive(Debug, Default, Clone)]
pub struct RecordingBus {
    bytes: Vec<u8>,
    attempts: usize,
    fail_at: Vec<usize>,
}

impl RecordingBus {
    /// Creates an empty recording bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bus whose writes at the given attempt indices fail.
    pub fn failing_at(indices: &[usize]) -> Self {
        Self {
            fail_at: indices.to_vec(),
            ..Self::default()
        }
    }

    /// Bytes successfully written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of write attempts, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Drains the recorded bytes.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }
}

impl Bus for RecordingBus {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        let index = self.attempts;
        self.attempts += 1;
        if self.fail_at.contains(&index) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected failure at write {}", index),
            ));
        }
        self.bytes.push(byte);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_bus_records_in_order() {
        let mut bus = RecordingBus::new();
        bus.write_byte(0x0C).unwrap();
        bus.write_byte(0x08).unwrap();
        assert_eq!(bus.bytes(), &[0x0C, 0x08]);
        assert_eq!(bus.attempts(), 2);
        assert_eq!(bus.take(), vec![0x0C, 0x08]);
        assert!(bus.bytes().is_empty());
    }

    #[test]
    fn test_recording_bus_injected_failure() {
        let mut bus = RecordingBus::failing_at(&[1]);
        assert!(bus.write_byte(0x01).is_ok());
        assert!(bus.write_byte(0x02).is_err());
        assert!(bus.write_byte(0x03).is_ok());
        assert_eq!(bus.bytes(), &[0x01, 0x03]);
        assert_eq!(bus.attempts(), 3);
    }

    #[test]
    fn test_open_rejects_wide_address() {
        assert!(matches!(
            I2cBus::open("/dev/null", 0x80),
            Err(Error::InvalidAddress(0x80))
        ));
    }

    #[test]
    fn test_open_missing_device() {
        let err = I2cBus::open("/nonexistent/i2c-99", 0x27).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_select_address_on_non_i2c_device() {
        // /dev/null accepts the open but rejects the I2C_SLAVE ioctl.
        let err = I2cBus::open("/dev/null", 0x27).unwrap_err();
        assert!(matches!(err, Error::SelectAddress { address: 0x27, .. }));
    }

    // Hardware tests are skipped by default
    #[test]
    #[ignore]
    fn test_open_real_bus() {
        assert!(I2cBus::open(crate::DEFAULT_BUS, crate::DEFAULT_ADDRESS).is_ok());
    }
}
