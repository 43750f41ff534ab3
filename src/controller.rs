//! Session state machine
//!
//! [`SessionController`] owns every peripheral and runs the cooperative
//! control loop. Each pass handles at most one command, mount toggle first,
//! then redraws the resting screen for the state it ended in.

use crate::clock::Clock;
use crate::config::ControllerConfig;
use crate::feedback::{Feedback, FeedbackSink, Indicator};
use crate::input::{Command, InputSource};
use crate::lifecycle::StorageLifecycle;
use crate::recorder::{CaptureOutcome, CaptureRecorder};
use crate::sensor::SensorSource;
use crate::storage::StorageMedium;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Top-level state of the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unmounted,
    Mounting,
    MountedIdle,
    Unmounting,
    Capturing,
}

impl SessionState {
    /// States in which the medium is mounted
    pub fn is_mounted(self) -> bool {
        matches!(
            self,
            SessionState::MountedIdle | SessionState::Unmounting | SessionState::Capturing
        )
    }
}

pub struct SessionController<S, M, F, C> {
    sensor: S,
    medium: M,
    feedback: Feedback<F, C>,
    clock: C,
    input: Arc<InputSource>,
    lifecycle: StorageLifecycle,
    config: ControllerConfig,
    state: SessionState,
    shutdown: Arc<AtomicBool>,
    last_capture: Option<CaptureOutcome>,
}

impl<S, M, F, C> SessionController<S, M, F, C>
where
    S: SensorSource,
    M: StorageMedium,
    F: FeedbackSink,
    C: Clock + Clone,
{
    pub fn new(sensor: S, medium: M, sink: F, clock: C, config: ControllerConfig) -> Self {
        let input = Arc::new(InputSource::new(config.debounce_window));
        let lifecycle = StorageLifecycle::new(config.device_name.clone());
        let feedback = Feedback::new(sink, clock.clone(), &config);

        Self {
            sensor,
            medium,
            feedback,
            clock,
            input,
            lifecycle,
            config,
            state: SessionState::Unmounted,
            shutdown: Arc::new(AtomicBool::new(false)),
            last_capture: None,
        }
    }

    /// Edge handler to hand to the button thread
    pub fn input(&self) -> Arc<InputSource> {
        self.input.clone()
    }

    /// Set to `true` to make [`run`](Self::run) return after the current pass
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.lifecycle.is_mounted()
    }

    pub fn capture_on(&self) -> bool {
        self.state == SessionState::Capturing
    }

    pub fn has_unmounted_once(&self) -> bool {
        self.lifecycle.has_unmounted_once()
    }

    /// How the most recent capture session ended
    pub fn last_capture(&self) -> Option<&CaptureOutcome> {
        self.last_capture.as_ref()
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    pub fn medium_mut(&mut self) -> &mut M {
        &mut self.medium
    }

    pub fn feedback(&self) -> &Feedback<F, C> {
        &self.feedback
    }

    /// Run passes until shutdown is requested
    pub fn run(&mut self) {
        info!("Session controller started");
        while !self.shutdown.load(Ordering::SeqCst) {
            self.step();
        }

        if self.lifecycle.is_mounted() {
            warn!("Stopping with the medium still mounted");
        }
        self.feedback.lights_off();
        info!("Session controller stopped in {:?}", self.state);
    }

    /// One pass of the control loop
    pub fn step(&mut self) {
        if self.input.take(Command::RequestMountToggle) {
            self.toggle_mount();
        } else if self.input.take(Command::ToggleCapture) {
            if self.state == SessionState::MountedIdle {
                self.capture();
            } else {
                warn!("Capture request discarded in {:?}", self.state);
            }
        }

        self.render_resting_screen();
        self.clock.sleep(self.config.loop_interval);
    }

    fn toggle_mount(&mut self) {
        match self.state {
            SessionState::Unmounted => {
                self.feedback.set_lights(&[Indicator::Red, Indicator::Green]);
                self.feedback.show(&["Mounting SD"]);
                self.transition(SessionState::Mounting);

                let next = match self.lifecycle.mount(&mut self.medium, &mut self.feedback) {
                    Ok(()) => SessionState::MountedIdle,
                    Err(_) => SessionState::Unmounted,
                };
                self.transition(next);
            }
            SessionState::MountedIdle => {
                self.feedback.set_lights(&[Indicator::Red, Indicator::Green]);
                self.feedback.show(&["Unmounting SD"]);
                self.transition(SessionState::Unmounting);

                let next = match self.lifecycle.unmount(&mut self.medium, &mut self.feedback) {
                    Ok(()) => SessionState::Unmounted,
                    Err(_) => SessionState::MountedIdle,
                };
                self.transition(next);
            }
            other => debug!("Mount toggle ignored in {:?}", other),
        }
    }

    fn capture(&mut self) {
        let Some(device) = self.lifecycle.mounted_device() else {
            warn!("Capture request with no mounted device");
            return;
        };

        // Capture cues start from dark
        self.feedback.lights_off();
        self.transition(SessionState::Capturing);

        let outcome = CaptureRecorder {
            sensor: &mut self.sensor,
            medium: &mut self.medium,
            device,
            feedback: &mut self.feedback,
            input: &self.input,
            clock: &self.clock,
            config: &self.config,
            shutdown: &self.shutdown,
        }
        .run();

        if let CaptureOutcome::Aborted { samples, error } = &outcome {
            warn!("Capture aborted after {} samples: {}", samples, error);
            // A stop pressed during the failure must not start a new session
            self.input.take(Command::ToggleCapture);
        }

        self.last_capture = Some(outcome);
        self.transition(SessionState::MountedIdle);
    }

    fn render_resting_screen(&mut self) {
        match self.state {
            SessionState::MountedIdle => {
                self.feedback.set_lights(&[Indicator::Green]);
                self.feedback
                    .show(&["Press A:", "Capture data", "Press B:", "Unmount SD"]);
            }
            _ => {
                self.feedback.lights_off();
                if self.lifecycle.has_unmounted_once() {
                    self.feedback
                        .show(&["Press B:", "Mount SD", "Card can be", "removed"]);
                } else {
                    self.feedback.show(&["Press B:", "Mount SD"]);
                }
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        if next != self.state {
            info!("{:?} -> {:?}", self.state, next);
        }
        self.state = next;

        debug_assert_eq!(
            self.lifecycle.is_mounted(),
            next.is_mounted(),
            "mount flag out of step with {:?}",
            next
        );
        self.input
            .publish(self.lifecycle.is_mounted(), next == SessionState::Capturing);
    }
}
