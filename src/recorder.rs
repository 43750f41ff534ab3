//! The capture loop
//!
//! One [`CaptureRecorder`] runs one capture session from the start beep to
//! either the completion beep or the first failed write. Every file
//! operation is checked on its own and any failure closes the file and ends
//! the session; nothing is retried.

use crate::clock::Clock;
use crate::config::ControllerConfig;
use crate::error::SessionError;
use crate::feedback::{Feedback, FeedbackSink, Indicator};
use crate::input::{Command, InputSource};
use crate::record::{SampleRecord, HEADER};
use crate::sensor::SensorSource;
use crate::storage::{DeviceId, StorageMedium};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, trace, warn};

/// How a capture session ended
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Stopped by the user; `samples` rows were written
    Completed { samples: u32 },
    /// Ended by a storage failure after `samples` rows
    Aborted { samples: u32, error: SessionError },
}

impl CaptureOutcome {
    pub fn samples(&self) -> u32 {
        match self {
            CaptureOutcome::Completed { samples } => *samples,
            CaptureOutcome::Aborted { samples, .. } => *samples,
        }
    }
}

/// State of the session in progress
struct CaptureSession<H> {
    /// Index the next row will get
    next_index: u32,
    started_ms: u64,
    file: H,
}

/// Screen shown while recording
pub(crate) fn capture_screen(elapsed: &str) -> [&str; 4] {
    ["Recording...", elapsed, "Press A:", "Stop capture"]
}

/// Borrowed view of the controller's peripherals for one session
pub struct CaptureRecorder<'a, S, M, F, C> {
    pub sensor: &'a mut S,
    pub medium: &'a mut M,
    /// Mounted device the capture file goes to
    pub device: DeviceId,
    pub feedback: &'a mut Feedback<F, C>,
    pub input: &'a InputSource,
    pub clock: &'a C,
    pub config: &'a ControllerConfig,
    pub shutdown: &'a AtomicBool,
}

impl<'a, S, M, F, C> CaptureRecorder<'a, S, M, F, C>
where
    S: SensorSource,
    M: StorageMedium,
    F: FeedbackSink,
    C: Clock,
{
    /// Run one session to its end
    pub fn run(mut self) -> CaptureOutcome {
        self.feedback.start_cue();

        let started_ms = self.clock.now_ms();
        info!(
            "Capture started at {} into {}",
            chrono::Local::now().to_rfc3339(),
            self.config.data_file
        );

        let mut file = match self.medium.open_for_write(self.device, &self.config.data_file) {
            Ok(file) => file,
            Err(error) => {
                self.report_write_failure();
                return CaptureOutcome::Aborted { samples: 0, error };
            }
        };

        if let Err(error) = self.medium.append(&mut file, HEADER.as_bytes()) {
            self.report_write_failure();
            self.medium.close(file);
            return CaptureOutcome::Aborted { samples: 0, error };
        }

        let mut session = CaptureSession {
            next_index: 1,
            started_ms,
            file,
        };

        while self.capture_still_on() {
            let raw = self.sensor.read();
            let record =
                SampleRecord::from_raw(session.next_index, &raw, self.config.accel_counts_per_g);

            let elapsed_secs = self.clock.now_ms().saturating_sub(session.started_ms) / 1000;
            self.feedback.set(Indicator::Blue, elapsed_secs % 2 == 0);

            let elapsed = format!("{} s", elapsed_secs);
            self.feedback.show(&capture_screen(&elapsed));

            if let Err(error) = self.medium.append(&mut session.file, record.to_row().as_bytes()) {
                self.feedback.lights_off();
                self.report_write_failure();
                self.medium.close(session.file);
                return CaptureOutcome::Aborted {
                    samples: session.next_index - 1,
                    error,
                };
            }
            trace!("Wrote sample {}", record);

            session.next_index += 1;
            self.clock.sleep(self.config.sample_interval);
        }

        let samples = session.next_index - 1;
        self.medium.close(session.file);

        self.feedback.show(&["Capture", "finished"]);
        self.feedback.completion_cue();

        info!(
            "Capture finished: {} samples in {} s",
            samples,
            self.clock.now_ms().saturating_sub(started_ms) / 1000
        );
        CaptureOutcome::Completed { samples }
    }

    /// Polled once per tick, before each read
    fn capture_still_on(&self) -> bool {
        if self.input.take(Command::ToggleCapture) {
            return false;
        }
        if self.shutdown.load(Ordering::SeqCst) {
            info!("Shutdown requested, ending capture");
            return false;
        }
        true
    }

    fn report_write_failure(&mut self) {
        warn!("Capture file write failed");
        self.feedback.show(&["Write", "failed"]);
        self.feedback.set(Indicator::Red, true);
        self.feedback.hold();
    }
}
