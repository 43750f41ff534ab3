//! Fakes for the leaf interfaces, shared by the unit tests

use crate::clock::{Clock, SimClock};
use crate::error::{Result, SessionError};
use crate::feedback::{FeedbackSink, Indicator};
use crate::input::{Button, InputSource};
use crate::sensor::{RawSample, SensorSource};
use crate::storage::{DeviceId, StorageMedium};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Everything a [`RecordingFeedback`] was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Render(Vec<String>),
    Indicator(Indicator, bool),
    Tone(Duration),
}

/// Feedback sink that remembers every call
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    events: Vec<SinkEvent>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn tones(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Tone(_)))
            .count()
    }

    /// Whether any rendered screen had a line equal to `text`
    pub fn rendered(&self, text: &str) -> bool {
        self.events.iter().any(|e| match e {
            SinkEvent::Render(lines) => lines.iter().any(|l| l == text),
            _ => false,
        })
    }

    pub fn last_screen(&self) -> Option<&[String]> {
        self.events.iter().rev().find_map(|e| match e {
            SinkEvent::Render(lines) => Some(lines.as_slice()),
            _ => None,
        })
    }
}

impl FeedbackSink for RecordingFeedback {
    fn render_lines(&mut self, lines: &[&str]) {
        self.events
            .push(SinkEvent::Render(lines.iter().map(|l| l.to_string()).collect()));
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool) {
        self.events.push(SinkEvent::Indicator(indicator, on));
    }

    fn tone(&mut self, duration: Duration) {
        self.events.push(SinkEvent::Tone(duration));
    }
}

#[derive(Debug)]
struct FakeDevice {
    name: String,
    mounted: bool,
    needs_init: bool,
}

/// Handle returned by [`MemoryMedium::open_for_write`]
#[derive(Debug)]
pub struct MemoryFile {
    path: String,
    appends: usize,
}

/// In-memory medium with switchable failures
#[derive(Debug, Default)]
pub struct MemoryMedium {
    devices: Vec<FakeDevice>,
    files: HashMap<String, Vec<u8>>,
    reject_mount: bool,
    reject_unmount: bool,
    fail_open: bool,
    fail_append_number: Option<usize>,
    unmount_calls: usize,
    open_files: usize,
}

impl MemoryMedium {
    pub fn with_devices(names: &[&str]) -> Self {
        Self {
            devices: names
                .iter()
                .map(|name| FakeDevice {
                    name: name.to_string(),
                    mounted: false,
                    needs_init: true,
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn reject_mount(&mut self, reject: bool) {
        self.reject_mount = reject;
    }

    pub fn reject_unmount(&mut self, reject: bool) {
        self.reject_unmount = reject;
    }

    pub fn fail_open(&mut self, fail: bool) {
        self.fail_open = fail;
    }

    /// Fail the `n`th append (1-based, header included) on each opened file
    pub fn fail_append_number(&mut self, n: usize) {
        self.fail_append_number = Some(n);
    }

    pub fn is_mounted(&self, name: &str) -> bool {
        self.devices.iter().any(|d| d.name == name && d.mounted)
    }

    pub fn needs_init(&self, name: &str) -> bool {
        self.devices.iter().any(|d| d.name == name && d.needs_init)
    }

    pub fn unmount_calls(&self) -> usize {
        self.unmount_calls
    }

    /// Files opened and not yet closed
    pub fn open_files(&self) -> usize {
        self.open_files
    }

    pub fn contents(&self, path: &str) -> Option<String> {
        self.files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn set_contents(&mut self, path: &str, text: &str) {
        self.files.insert(path.to_string(), text.as_bytes().to_vec());
    }
}

impl StorageMedium for MemoryMedium {
    type File = MemoryFile;

    fn first_device(&self) -> Option<String> {
        self.devices.first().map(|d| d.name.clone())
    }

    fn resolve(&self, name: &str) -> Option<DeviceId> {
        self.devices.iter().position(|d| d.name == name).map(DeviceId)
    }

    fn mount(&mut self, device: DeviceId) -> Result<()> {
        let device = &mut self.devices[device.0];
        if self.reject_mount {
            return Err(SessionError::MountRejected {
                device: device.name.clone(),
                reason: "FR_NOT_READY".to_string(),
            });
        }
        device.mounted = true;
        device.needs_init = false;
        Ok(())
    }

    fn unmount(&mut self, device: DeviceId) -> Result<()> {
        self.unmount_calls += 1;
        let device = &mut self.devices[device.0];
        if self.reject_unmount || !device.mounted {
            return Err(SessionError::UnmountRejected {
                device: device.name.clone(),
                reason: "FR_INVALID_DRIVE".to_string(),
            });
        }
        device.mounted = false;
        Ok(())
    }

    fn invalidate(&mut self, device: DeviceId) {
        self.devices[device.0].needs_init = true;
    }

    fn open_for_write(&mut self, device: DeviceId, path: &str) -> Result<MemoryFile> {
        if self.fail_open || !self.devices[device.0].mounted {
            return Err(SessionError::OpenFailed {
                path: path.to_string(),
                reason: "FR_DISK_ERR".to_string(),
            });
        }
        self.files.insert(path.to_string(), Vec::new());
        self.open_files += 1;
        Ok(MemoryFile {
            path: path.to_string(),
            appends: 0,
        })
    }

    fn append(&mut self, file: &mut MemoryFile, bytes: &[u8]) -> Result<()> {
        file.appends += 1;
        if self.fail_append_number == Some(file.appends) {
            return Err(SessionError::WriteFailed("FR_DISK_ERR".to_string()));
        }
        self.files
            .entry(file.path.clone())
            .or_default()
            .extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self, _file: MemoryFile) {
        self.open_files -= 1;
    }
}

/// Sensor returning a fixed sample, optionally pressing a button mid-capture
pub struct ScriptedSensor {
    sample: RawSample,
    reads: usize,
    press: Option<(usize, Button, Arc<InputSource>, Arc<SimClock>)>,
}

impl ScriptedSensor {
    pub fn new(sample: RawSample) -> Self {
        Self {
            sample,
            reads: 0,
            press: None,
        }
    }

    /// Press `button` right after the `after_reads`th read
    pub fn press_after(
        &mut self,
        after_reads: usize,
        button: Button,
        input: Arc<InputSource>,
        clock: Arc<SimClock>,
    ) {
        self.press = Some((self.reads + after_reads, button, input, clock));
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl SensorSource for ScriptedSensor {
    fn read(&mut self) -> RawSample {
        self.reads += 1;
        if let Some((at, button, input, clock)) = &self.press {
            if self.reads == *at {
                input.press(*button, clock.now_ms());
            }
        }
        self.sample
    }
}
