//! Button-driven MPU6050 capture logger
//!
//! A two-button logger that mounts a storage medium, records accelerometer
//! and gyroscope samples to `mpu6050_data.csv` at 5 Hz, and reports every
//! step on a small display, an RGB indicator and a buzzer.
//!
//! Button A starts and stops a capture, button B mounts and unmounts the
//! medium. Hardware sits behind three traits ([`SensorSource`],
//! [`StorageMedium`], [`FeedbackSink`]) and all waiting goes through a
//! [`Clock`], so the whole session runs against fakes in simulated time.
//!
//! # Quick Start
//!
//! ```no_run
//! use mpu6050_sd_logger::{
//!     Button, ConsoleFeedback, ControllerConfig, DirectoryMedium, SessionController,
//!     SimulatedSensor, SystemClock, Clock,
//! };
//!
//! let clock = SystemClock::new();
//! let medium = DirectoryMedium::new().with_device("sd0", "sdcard");
//! let mut controller = SessionController::new(
//!     SimulatedSensor::new(),
//!     medium,
//!     ConsoleFeedback::new(),
//!     clock,
//!     ControllerConfig::default(),
//! );
//!
//! // Presses normally come from another thread
//! controller.input().press(Button::B, clock.now_ms());
//! controller.step();
//! ```
//!
//! With the `ftdi` feature the real sensor is available as `Mpu6050`,
//! talking I2C through an FT232H bridge and libMPSSE.

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod feedback;
#[cfg(feature = "ftdi")]
mod ffi;
pub mod input;
pub mod lifecycle;
#[cfg(feature = "ftdi")]
pub mod mpu6050;
pub mod record;
pub mod recorder;
pub mod sensor;
pub mod storage;

#[cfg(test)]
mod testing;

// Re-export public API
pub use clock::{Clock, SimClock, SystemClock};
pub use config::ControllerConfig;
pub use controller::{SessionController, SessionState};
pub use error::{CaptureFileError, Result, SensorError, SessionError};
pub use feedback::{ConsoleFeedback, Feedback, FeedbackSink, Indicator};
pub use input::{Button, Command, InputSource};
pub use lifecycle::StorageLifecycle;
#[cfg(feature = "ftdi")]
pub use mpu6050::Mpu6050;
pub use record::{read_capture, CaptureSummary, SampleRecord, HEADER};
pub use recorder::{CaptureOutcome, CaptureRecorder};
pub use sensor::{RawSample, SensorSource, SimulatedSensor};
pub use storage::{DeviceId, DirectoryMedium, StorageMedium};
