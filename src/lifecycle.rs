//! Mount and unmount of the storage medium
//!
//! Both operations block the control loop until their feedback has played
//! out: two seconds of confirmation on success, five seconds of red/blue
//! flashing on failure. Neither retries.

use crate::clock::Clock;
use crate::error::{Result, SessionError};
use crate::feedback::{Feedback, FeedbackSink};
use crate::storage::{DeviceId, StorageMedium};
use tracing::{info, warn};

/// Mount state of the configured device
#[derive(Debug, Default)]
pub struct StorageLifecycle {
    device_name: Option<String>,
    mounted: Option<DeviceId>,
    has_unmounted_once: bool,
}

impl StorageLifecycle {
    /// Manage `device_name`, or the medium's first device if `None`
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            mounted: None,
            has_unmounted_once: false,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Device files are opened on while mounted
    pub fn mounted_device(&self) -> Option<DeviceId> {
        self.mounted
    }

    /// Set once the first unmount succeeds, never cleared
    pub fn has_unmounted_once(&self) -> bool {
        self.has_unmounted_once
    }

    fn resolve<M: StorageMedium>(&self, medium: &M) -> Result<(DeviceId, String)> {
        let name = self
            .device_name
            .clone()
            .or_else(|| medium.first_device())
            .ok_or_else(|| SessionError::DeviceNotFound("<no devices>".to_string()))?;

        match medium.resolve(&name) {
            Some(id) => Ok((id, name)),
            None => Err(SessionError::DeviceNotFound(name)),
        }
    }

    /// Mount the device; failures leave the mount flag untouched
    pub fn mount<M, F, C>(&mut self, medium: &mut M, feedback: &mut Feedback<F, C>) -> Result<()>
    where
        M: StorageMedium,
        F: FeedbackSink,
        C: Clock,
    {
        let result = self
            .resolve(medium)
            .and_then(|(id, name)| medium.mount(id).map(|_| (id, name)));

        match result {
            Ok((id, name)) => {
                self.mounted = Some(id);
                info!("Mounted {}", name);
                feedback.show(&["SUCCESS:", "SD mounted"]);
                feedback.hold();
                Ok(())
            }
            Err(e) => {
                warn!("Mount failed: {}", e);
                feedback.show(&["Failed to", "mount SD"]);
                feedback.flash_failure();
                Err(e)
            }
        }
    }

    /// Unmount the device and flag it for re-initialisation
    ///
    /// Unmounting while nothing is mounted is rejected like any other
    /// unmount failure.
    pub fn unmount<M, F, C>(&mut self, medium: &mut M, feedback: &mut Feedback<F, C>) -> Result<()>
    where
        M: StorageMedium,
        F: FeedbackSink,
        C: Clock,
    {
        let result = self.resolve(medium).and_then(|(id, name)| {
            if self.mounted.is_none() {
                return Err(SessionError::UnmountRejected {
                    device: name,
                    reason: "not mounted".to_string(),
                });
            }
            medium.unmount(id)?;
            medium.invalidate(id);
            Ok(name)
        });

        match result {
            Ok(name) => {
                self.mounted = None;
                self.has_unmounted_once = true;
                info!("Unmounted {}", name);
                feedback.show(&["SUCCESS:", "SD unmounted"]);
                feedback.hold();
                Ok(())
            }
            Err(e) => {
                warn!("Unmount failed: {}", e);
                feedback.show(&["Failed to", "unmount SD"]);
                feedback.flash_failure();
                Err(e)
            }
        }
    }
}
