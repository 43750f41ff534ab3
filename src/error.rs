//! Error types for the capture session

use thiserror::Error;

/// Failures the session controller recovers from locally
///
/// None of these ever leave the controller: each one ends the current
/// operation, is reported on the display, and puts the state machine back
/// into its nearest stable state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No storage device is known under the requested name
    #[error("Storage device not found: {0}")]
    DeviceNotFound(String),

    /// The file system refused to mount
    #[error("Mount rejected for {device}: {reason}")]
    MountRejected { device: String, reason: String },

    /// The file system refused to unmount
    #[error("Unmount rejected for {device}: {reason}")]
    UnmountRejected { device: String, reason: String },

    /// The capture file could not be opened for writing
    #[error("Failed to open {path} for writing: {reason}")]
    OpenFailed { path: String, reason: String },

    /// Appending bytes to the open capture file failed
    #[error("Write failed: {0}")]
    WriteFailed(String),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Error type for sensor bring-up
#[derive(Error, Debug)]
pub enum SensorError {
    /// No I2C channels found
    #[error("No I2C channels found")]
    NoChannelsFound,

    /// Invalid channel index
    #[error("Invalid channel index: {0}")]
    InvalidChannel(u32),

    /// Bridge driver reported a failure
    #[error("FTDI error: {status} ({description})")]
    Ftdi { status: u32, description: String },

    /// Invalid WHO_AM_I response
    #[error("Invalid WHO_AM_I response: expected 0x68, got 0x{0:02X}")]
    InvalidDeviceId(u8),
}

/// Error type for reading a capture file back
#[derive(Error, Debug)]
pub enum CaptureFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is empty
    #[error("Capture file has no header row")]
    MissingHeader,

    /// First row is not the expected column list
    #[error("Unexpected header: {0}")]
    BadHeader(String),

    /// A data row does not parse
    #[error("Line {line}: {reason}")]
    BadRow { line: usize, reason: String },
}
