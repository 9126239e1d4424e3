//! Error types for the LCD1602 hardware library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when interacting with the display.
#[derive(Error, Debug)]
pub enum Error {
    /// The bus device could not be opened.
    #[error("Unable to open I2C device {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The slave address could not be selected on the bus.
    #[error("Unable to select I2C address 0x{address:02X}: {source}")]
    SelectAddress {
        address: u8,
        #[source]
        source: std::io::Error,
    },

    /// Address does not fit in 7 bits.
    #[error("Invalid I2C address (must be 0x00-0x7F): 0x{0:02X}")]
    InvalidAddress(u8),

    /// Cursor position outside the 16x2 grid.
    #[error("Invalid cursor position: column {column}, row {row}")]
    InvalidPosition { column: u8, row: u8 },

    /// Operation attempted on a closed display.
    #[error("LCD not initialized")]
    NotInitialized,

    /// One or more bus writes failed during an operation.
    #[error("{failed} of {attempted} bus writes failed: {source}")]
    Transfer {
        failed: usize,
        attempted: usize,
        #[source]
        source: std::io::Error,
    },

    /// Invalid transfer policy name.
    #[error("Invalid transfer policy: {0}")]
    InvalidPolicy(String),
}
