//! Storage medium contract and a directory-backed medium
//!
//! A medium knows a fixed list of named devices. A device has to be mounted
//! before files can be opened on it; after an unmount it is flagged as
//! needing re-initialisation so nothing assumes the card is still the same.

use crate::error::{Result, SessionError};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Index of a resolved device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId(pub usize);

/// File-system primitives the session needs from removable storage
pub trait StorageMedium {
    /// Handle of a file open for writing
    type File;

    /// Name of the first known device, used when none is configured
    fn first_device(&self) -> Option<String>;

    /// Look a device up by name
    fn resolve(&self, name: &str) -> Option<DeviceId>;

    fn mount(&mut self, device: DeviceId) -> Result<()>;

    fn unmount(&mut self, device: DeviceId) -> Result<()>;

    /// Flag the device as needing re-initialisation before its next use
    fn invalidate(&mut self, device: DeviceId);

    /// Create `path` on mounted `device`, truncating previous content
    fn open_for_write(&mut self, device: DeviceId, path: &str) -> Result<Self::File>;

    fn append(&mut self, file: &mut Self::File, bytes: &[u8]) -> Result<()>;

    fn close(&mut self, file: Self::File);
}

#[derive(Debug)]
struct Volume {
    name: String,
    root: PathBuf,
    mounted: bool,
    needs_init: bool,
}

/// Open file on a [`DirectoryMedium`]
#[derive(Debug)]
pub struct DirectoryFile {
    volume: usize,
    path: PathBuf,
    file: File,
}

/// Medium whose devices are directories on the host
///
/// Mounting succeeds only if the directory exists, so removing or renaming
/// the directory behaves like pulling the card.
#[derive(Debug, Default)]
pub struct DirectoryMedium {
    volumes: Vec<Volume>,
}

impl DirectoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device `name` backed by directory `root`
    pub fn with_device<P: AsRef<Path>>(mut self, name: &str, root: P) -> Self {
        self.volumes.push(Volume {
            name: name.to_string(),
            root: root.as_ref().to_path_buf(),
            mounted: false,
            needs_init: true,
        });
        self
    }

    /// Whether the named device is currently mounted
    pub fn is_mounted(&self, name: &str) -> bool {
        self.volumes.iter().any(|v| v.name == name && v.mounted)
    }

    /// Whether the named device must be re-initialised before use
    pub fn needs_init(&self, name: &str) -> bool {
        self.volumes.iter().any(|v| v.name == name && v.needs_init)
    }

    fn volume(&mut self, device: DeviceId) -> &mut Volume {
        &mut self.volumes[device.0]
    }
}

impl StorageMedium for DirectoryMedium {
    type File = DirectoryFile;

    fn first_device(&self) -> Option<String> {
        self.volumes.first().map(|v| v.name.clone())
    }

    fn resolve(&self, name: &str) -> Option<DeviceId> {
        self.volumes.iter().position(|v| v.name == name).map(DeviceId)
    }

    fn mount(&mut self, device: DeviceId) -> Result<()> {
        let volume = self.volume(device);
        if !volume.root.is_dir() {
            return Err(SessionError::MountRejected {
                device: volume.name.clone(),
                reason: format!("no file system at {}", volume.root.display()),
            });
        }

        volume.mounted = true;
        volume.needs_init = false;
        debug!("Mounted {} at {}", volume.name, volume.root.display());
        Ok(())
    }

    fn unmount(&mut self, device: DeviceId) -> Result<()> {
        let volume = self.volume(device);
        if !volume.mounted {
            return Err(SessionError::UnmountRejected {
                device: volume.name.clone(),
                reason: "not mounted".to_string(),
            });
        }

        volume.mounted = false;
        debug!("Unmounted {}", volume.name);
        Ok(())
    }

    fn invalidate(&mut self, device: DeviceId) {
        self.volume(device).needs_init = true;
    }

    fn open_for_write(&mut self, device: DeviceId, path: &str) -> Result<DirectoryFile> {
        let volume = self.volume(device);
        if !volume.mounted {
            return Err(SessionError::OpenFailed {
                path: path.to_string(),
                reason: format!("{} is not mounted", volume.name),
            });
        }

        let full_path = volume.root.join(path);
        let file = File::create(&full_path).map_err(|e| SessionError::OpenFailed {
            path: full_path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(DirectoryFile {
            volume: device.0,
            path: full_path,
            file,
        })
    }

    fn append(&mut self, file: &mut DirectoryFile, bytes: &[u8]) -> Result<()> {
        if !self.volumes[file.volume].mounted {
            return Err(SessionError::WriteFailed(format!(
                "{} is no longer mounted",
                self.volumes[file.volume].name
            )));
        }

        file.file
            .write_all(bytes)
            .map_err(|e| SessionError::WriteFailed(format!("{}: {}", file.path.display(), e)))
    }

    fn close(&mut self, file: DirectoryFile) {
        if let Err(e) = file.file.sync_all() {
            warn!("Failed to sync {}: {}", file.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medium_in(dir: &Path) -> DirectoryMedium {
        DirectoryMedium::new()
            .with_device("sd0", dir)
            .with_device("sd1", dir.join("missing"))
    }

    #[test]
    fn test_resolve_and_first_device() {
        let dir = tempfile::tempdir().unwrap();
        let medium = medium_in(dir.path());

        assert_eq!(medium.first_device().as_deref(), Some("sd0"));
        assert_eq!(medium.resolve("sd1"), Some(DeviceId(1)));
        assert_eq!(medium.resolve("usb"), None);
        assert_eq!(DirectoryMedium::new().first_device(), None);
    }

    #[test]
    fn test_mount_missing_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut medium = medium_in(dir.path());

        let err = medium.mount(DeviceId(1)).unwrap_err();
        assert!(matches!(err, SessionError::MountRejected { ref device, .. } if device == "sd1"));
        assert!(!medium.is_mounted("sd1"));
    }

    #[test]
    fn test_unmount_requires_mount() {
        let dir = tempfile::tempdir().unwrap();
        let mut medium = medium_in(dir.path());

        assert!(matches!(
            medium.unmount(DeviceId(0)),
            Err(SessionError::UnmountRejected { .. })
        ));

        medium.mount(DeviceId(0)).unwrap();
        assert!(medium.is_mounted("sd0"));
        assert!(!medium.needs_init("sd0"));
        medium.unmount(DeviceId(0)).unwrap();
        medium.invalidate(DeviceId(0));
        assert!(!medium.is_mounted("sd0"));
        assert!(medium.needs_init("sd0"));
    }

    #[test]
    fn test_open_requires_mounted_volume() {
        let dir = tempfile::tempdir().unwrap();
        let mut medium = medium_in(dir.path());

        assert!(matches!(
            medium.open_for_write(DeviceId(0), "data.csv"),
            Err(SessionError::OpenFailed { .. })
        ));
    }

    #[test]
    fn test_open_targets_the_given_device() {
        let dir = tempfile::tempdir().unwrap();
        let second = dir.path().join("second");
        std::fs::create_dir(&second).unwrap();
        let mut medium = DirectoryMedium::new()
            .with_device("sd0", dir.path())
            .with_device("sd1", &second);
        medium.mount(DeviceId(0)).unwrap();
        medium.mount(DeviceId(1)).unwrap();

        let mut file = medium.open_for_write(DeviceId(1), "data.csv").unwrap();
        medium.append(&mut file, b"row\n").unwrap();
        medium.close(file);

        assert!(second.join("data.csv").is_file());
        assert!(!dir.path().join("data.csv").exists());

        medium.unmount(DeviceId(0)).unwrap();
        assert!(matches!(
            medium.open_for_write(DeviceId(0), "data.csv"),
            Err(SessionError::OpenFailed { .. })
        ));
    }

    #[test]
    fn test_write_truncates_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut medium = medium_in(dir.path());
        medium.mount(DeviceId(0)).unwrap();

        let mut file = medium.open_for_write(DeviceId(0), "data.csv").unwrap();
        medium.append(&mut file, b"first session\n").unwrap();
        medium.close(file);

        let mut file = medium.open_for_write(DeviceId(0), "data.csv").unwrap();
        medium.append(&mut file, b"second\n").unwrap();
        medium.close(file);

        let content = std::fs::read_to_string(dir.path().join("data.csv")).unwrap();
        assert_eq!(content, "second\n");
    }

    #[test]
    fn test_append_after_unmount_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut medium = medium_in(dir.path());
        medium.mount(DeviceId(0)).unwrap();

        let mut file = medium.open_for_write(DeviceId(0), "data.csv").unwrap();
        medium.unmount(DeviceId(0)).unwrap();

        assert!(matches!(
            medium.append(&mut file, b"row\n"),
            Err(SessionError::WriteFailed(_))
        ));
    }
}
