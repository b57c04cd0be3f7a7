//! Camera acquisition and the file-backed camera sources.
//!
//! `DirectoryCamera` treats a directory that a capture device keeps writing
//! snapshots into as a live feed: the current frame is the newest PNG.
//! `StillImageCamera` serves a single PNG and backs the batch `scan` command.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use tagscan_core::{
    CameraConstraints, CameraDevice, CameraError, CameraStream, FacingMode, Frame,
};

use crate::image::decode_png;
use crate::mime_detect::is_frame_file;

/// Open the camera, preferring the rear-facing one and falling back to an
/// unconstrained request.
pub async fn acquire(device: &dyn CameraDevice) -> Result<Box<dyn CameraStream>, CameraError> {
    match device.request_access(&CameraConstraints::rear()).await {
        Ok(stream) => {
            info!(camera = %device.describe(), "Rear camera opened");
            Ok(stream)
        }
        Err(err) => {
            warn!(camera = %device.describe(), error = %err, "Rear camera unavailable; trying any camera");
            let stream = device.request_access(&CameraConstraints::any()).await?;
            info!(camera = %device.describe(), "Camera opened without facing constraint");
            Ok(stream)
        }
    }
}

fn check_facing(declared: Option<FacingMode>, constraints: &CameraConstraints) -> Result<(), CameraError> {
    match constraints.facing {
        Some(wanted) if declared != Some(wanted) => Err(CameraError::ConstraintUnsatisfied),
        _ => Ok(()),
    }
}

async fn read_frame_file(path: &Path) -> Result<Frame, CameraError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CameraError::FrameUnavailable(format!("{}: {}", path.display(), e)))?;
    decode_png(&bytes)
}

// ---------------------------------------------------------------------------
// Directory camera
// ---------------------------------------------------------------------------

pub struct DirectoryCamera {
    dir: PathBuf,
    facing: Option<FacingMode>,
}

impl DirectoryCamera {
    pub fn new(dir: impl Into<PathBuf>, facing: Option<FacingMode>) -> Self {
        Self { dir: dir.into(), facing }
    }
}

#[async_trait]
impl CameraDevice for DirectoryCamera {
    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }

    async fn request_access(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        if !self.dir.is_dir() {
            return Err(CameraError::Unavailable(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }
        check_facing(self.facing, constraints)?;
        Ok(Box::new(DirectoryStream {
            dir: self.dir.clone(),
            released: false,
        }))
    }
}

struct DirectoryStream {
    dir: PathBuf,
    released: bool,
}

impl DirectoryStream {
    async fn newest_frame_file(&self) -> Result<Option<PathBuf>, CameraError> {
        let unavailable = |e: std::io::Error| CameraError::FrameUnavailable(e.to_string());
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(unavailable)?;

        let mut newest: Option<(SystemTime, PathBuf)> = None;
        while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
            let path = entry.path();
            if !is_frame_file(&path) {
                continue;
            }
            let Ok(modified) = entry.metadata().await.and_then(|m| m.modified()) else {
                continue;
            };
            // Ties break on name so the choice is stable.
            let is_newer = match &newest {
                None => true,
                Some((t, p)) => modified > *t || (modified == *t && path > *p),
            };
            if is_newer {
                newest = Some((modified, path));
            }
        }
        Ok(newest.map(|(_, path)| path))
    }
}

#[async_trait]
impl CameraStream for DirectoryStream {
    async fn current_frame(&mut self) -> Result<Frame, CameraError> {
        if self.released {
            return Err(CameraError::FrameUnavailable("stream released".into()));
        }
        match self.newest_frame_file().await? {
            Some(path) => {
                debug!(path = %path.display(), "Reading newest snapshot");
                read_frame_file(&path).await
            }
            None => Ok(Frame::empty()),
        }
    }

    fn release(&mut self) {
        self.released = true;
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

// ---------------------------------------------------------------------------
// Still image camera
// ---------------------------------------------------------------------------

pub struct StillImageCamera {
    path: PathBuf,
    facing: Option<FacingMode>,
}

impl StillImageCamera {
    /// Stills are assumed to come from a rear camera.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            facing: Some(FacingMode::Environment),
        }
    }
}

#[async_trait]
impl CameraDevice for StillImageCamera {
    fn describe(&self) -> String {
        format!("image {}", self.path.display())
    }

    async fn request_access(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        if !self.path.is_file() {
            return Err(CameraError::Unavailable(format!("{} not found", self.path.display())));
        }
        check_facing(self.facing, constraints)?;
        Ok(Box::new(StillStream {
            path: self.path.clone(),
            released: false,
        }))
    }
}

struct StillStream {
    path: PathBuf,
    released: bool,
}

#[async_trait]
impl CameraStream for StillStream {
    async fn current_frame(&mut self) -> Result<Frame, CameraError> {
        if self.released {
            return Err(CameraError::FrameUnavailable("stream released".into()));
        }
        read_frame_file(&self.path).await
    }

    fn release(&mut self) {
        self.released = true;
    }

    fn is_released(&self) -> bool {
        self.released
    }
}
