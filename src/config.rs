//! Timing and format constants for the capture logger
//!
//! Every delay the controller waits out is named here so the state machine
//! can be driven by a simulated clock in tests.

use std::time::Duration;

/// Minimum gap between two accepted button presses
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// Sleep between two samples while capturing (nominal 5 Hz)
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(200);

/// Sleep at the end of each control loop pass
pub const LOOP_INTERVAL: Duration = Duration::from_millis(100);

/// How long success and failure messages stay on screen
pub const STATUS_HOLD: Duration = Duration::from_secs(2);

/// Number of red/blue toggles after a mount or unmount failure
pub const FAILURE_FLASH_PULSES: u32 = 10;

/// Length of one red/blue toggle
pub const FAILURE_FLASH_PERIOD: Duration = Duration::from_millis(500);

/// Length of a single beep
pub const CUE_TONE: Duration = Duration::from_millis(200);

/// Quiet time after the completion double beep
pub const COMPLETION_SETTLE: Duration = Duration::from_millis(1400);

/// Raw accelerometer counts per g for the ±2g range
pub const ACCEL_COUNTS_PER_G: f32 = 16384.0;

/// Capture file written at the root of the medium
pub const DATA_FILE_NAME: &str = "mpu6050_data.csv";

/// Tunables for one controller instance
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Device to mount; `None` picks the first known device
    pub device_name: Option<String>,
    /// Capture file name, relative to the medium root
    pub data_file: String,
    pub debounce_window: Duration,
    pub sample_interval: Duration,
    pub loop_interval: Duration,
    pub status_hold: Duration,
    pub failure_flash_pulses: u32,
    pub failure_flash_period: Duration,
    pub cue_tone: Duration,
    pub completion_settle: Duration,
    pub accel_counts_per_g: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_name: None,
            data_file: DATA_FILE_NAME.to_string(),
            debounce_window: DEBOUNCE_WINDOW,
            sample_interval: SAMPLE_INTERVAL,
            loop_interval: LOOP_INTERVAL,
            status_hold: STATUS_HOLD,
            failure_flash_pulses: FAILURE_FLASH_PULSES,
            failure_flash_period: FAILURE_FLASH_PERIOD,
            cue_tone: CUE_TONE,
            completion_settle: COMPLETION_SETTLE,
            accel_counts_per_g: ACCEL_COUNTS_PER_G,
        }
    }
}
