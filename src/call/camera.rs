//! Video capture device handle.
//!
//! The call agent acquires the camera when video is toggled on and must
//! release it on toggle-off, on call end and on teardown.

use crate::error::{PrepcallError, Result};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub trait Camera: Send {
    /// Open the device. Calling it while already open is a no-op.
    fn acquire(&mut self) -> Result<()>;

    /// Close the device. Calling it while closed is a no-op.
    fn release(&mut self);

    fn is_active(&self) -> bool;
}

/// Placeholder for hosts without a camera; acquisition always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCamera;

impl Camera for NoCamera {
    fn acquire(&mut self) -> Result<()> {
        Err(PrepcallError::Other("no camera device configured".to_string()))
    }

    fn release(&mut self) {}

    fn is_active(&self) -> bool {
        false
    }
}

/// Camera backed by a device node (e.g. `/dev/video0`). Holding the open
/// file keeps the device busy.
#[derive(Debug)]
pub struct DeviceCamera {
    path: PathBuf,
    handle: Option<File>,
}

impl DeviceCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            handle: None,
        }
    }
}

impl Camera for DeviceCamera {
    fn acquire(&mut self) -> Result<()> {
        if self.handle.is_none() {
            let file = File::open(&self.path)?;
            log::debug!("camera {} opened", self.path.display());
            self.handle = Some(file);
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.handle.take().is_some() {
            log::debug!("camera {} released", self.path.display());
        }
    }

    fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for DeviceCamera {
    fn drop(&mut self) {
        self.release();
    }
}

/// Mock camera for testing. Clones share state, so a test can keep one
/// clone while the agent owns another.
#[derive(Debug, Clone, Default)]
pub struct MockCamera {
    deny: bool,
    active: Arc<AtomicBool>,
    acquisitions: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to refuse access, like a denied permission prompt.
    pub fn denied() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Number of releases that actually closed an open device.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl Camera for MockCamera {
    fn acquire(&mut self) -> Result<()> {
        if self.deny {
            return Err(PrepcallError::Other("permission denied".to_string()));
        }
        if !self.active.swap(true, Ordering::SeqCst) {
            self.acquisitions.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}
