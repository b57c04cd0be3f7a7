//! Capture controller: camera lifecycle plus the single-shot
//! "freeze frame → encode → recognize → parse" cycle.
//!
//! The cycle is split in two so a front-end can run the network call in the
//! background: [`CaptureController::begin_capture`] grabs and encodes the
//! frame, [`CaptureController::complete`] interprets the recognition outcome.
//! Only one capture may be in flight; a second request is rejected with
//! [`CaptureError::Busy`], never queued.

use tracing::{debug, info, warn};

use tagscan_core::{
    CameraDevice, CameraError, CameraStream, CaptureError, InlineImage, RecognitionError,
};
use tagscan_understanding::RecognitionClient;

use crate::camera::acquire;
use crate::image::frame_to_inline_image;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Initializing,
    Ready,
    Capturing,
    CameraError(CameraError),
}

impl CaptureState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initializing => "starting camera",
            Self::Ready => "ready",
            Self::Capturing => "scanning",
            Self::CameraError(_) => "camera error",
        }
    }
}

/// An encoded frame waiting for recognition.
#[derive(Debug, Clone)]
pub struct PendingCapture {
    pub image: InlineImage,
    pub instruction: String,
}

/// Split recognized text into tag identifiers: comma-separated, trimmed,
/// empties dropped, order kept (upper tag first).
pub fn parse_tag_ids(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

pub struct CaptureController {
    state: CaptureState,
    stream: Option<Box<dyn CameraStream>>,
    instruction: String,
    error: Option<String>,
    last_scan: Option<String>,
}

impl CaptureController {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            state: CaptureState::Idle,
            stream: None,
            instruction: instruction.into(),
            error: None,
            last_scan: None,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Message of the last failure, shown inline until the next attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Identifiers of the last successful capture, joined for display.
    pub fn last_scan(&self) -> Option<&str> {
        self.last_scan.as_deref()
    }

    pub fn is_capturing(&self) -> bool {
        self.state == CaptureState::Capturing
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Whether the camera has to be (re)opened before capturing.
    pub fn needs_camera(&self) -> bool {
        matches!(self.state, CaptureState::Idle | CaptureState::CameraError(_))
    }

    /// Open the camera. Also the retry path out of `CameraError`.
    pub async fn start(&mut self, camera: &dyn CameraDevice) -> Result<(), CameraError> {
        self.release_stream();
        self.state = CaptureState::Initializing;
        self.error = None;

        match acquire(camera).await {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state = CaptureState::Ready;
                Ok(())
            }
            Err(err) => {
                warn!(camera = %camera.describe(), error = %err, "Camera could not be opened");
                self.error = Some(err.to_string());
                self.state = CaptureState::CameraError(err.clone());
                Err(err)
            }
        }
    }

    /// Freeze and encode the current frame. On success the controller is
    /// `Capturing` until [`complete`](Self::complete) is called.
    pub async fn begin_capture(&mut self) -> Result<PendingCapture, CaptureError> {
        match self.state {
            CaptureState::Capturing => {
                debug!("Capture requested while another is in flight; ignoring");
                return Err(CaptureError::Busy);
            }
            CaptureState::Ready => {}
            _ => return Err(self.record_failure(CaptureError::CameraUnavailable)),
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(self.record_failure(CaptureError::CameraUnavailable));
        };

        self.error = None;
        self.last_scan = None;
        self.state = CaptureState::Capturing;

        let grabbed = stream.current_frame().await;
        let frame = match grabbed {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "Camera failed to produce a frame");
                // Drop the broken feed so `start` can reopen it.
                self.release_stream();
                self.error = Some(err.to_string());
                self.state = CaptureState::CameraError(err.clone());
                return Err(err.into());
            }
        };

        if frame.is_empty() {
            self.state = CaptureState::Ready;
            return Err(self.record_failure(CaptureError::CameraNotReady));
        }

        match frame_to_inline_image(&frame) {
            Ok(image) => Ok(PendingCapture {
                image,
                instruction: self.instruction.clone(),
            }),
            Err(err) => {
                self.state = CaptureState::Ready;
                Err(self.record_failure(err))
            }
        }
    }

    /// Interpret the recognition outcome of the pending capture. On success
    /// `on_scan` receives the identifiers; on failure nothing is accumulated.
    pub fn complete(
        &mut self,
        outcome: Result<String, RecognitionError>,
        on_scan: impl FnOnce(Vec<String>),
    ) -> Result<Vec<String>, CaptureError> {
        if self.state != CaptureState::Capturing {
            debug!(state = self.state.label(), "Discarding recognition result with no pending capture");
            return Err(CaptureError::CameraUnavailable);
        }
        self.state = CaptureState::Ready;

        let text = match outcome {
            Ok(text) => text,
            Err(err) => return Err(self.record_failure(err.into())),
        };

        let ids = parse_tag_ids(&text);
        if ids.is_empty() {
            return Err(self.record_failure(CaptureError::NoTagsRecognized));
        }

        let joined = ids.join(", ");
        info!(tags = %joined, "Tags recognized");
        self.last_scan = Some(joined);
        on_scan(ids.clone());
        Ok(ids)
    }

    /// One full capture cycle, awaiting the recognition call inline.
    pub async fn capture(
        &mut self,
        client: &mut RecognitionClient,
        on_scan: impl FnOnce(Vec<String>),
    ) -> Result<Vec<String>, CaptureError> {
        let pending = self.begin_capture().await?;
        let outcome = match client.prepare() {
            Ok(prepared) => prepared.run(pending.image, pending.instruction).await,
            Err(err) => Err(err),
        };
        self.complete(outcome, on_scan)
    }

    /// Release the camera. Safe to call in any state, any number of times.
    pub fn release(&mut self) {
        self.release_stream();
        self.state = CaptureState::Idle;
    }

    fn release_stream(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };
        if stream.is_released() {
            debug!("Camera feed already ended");
        } else {
            stream.release();
            info!("Camera released");
        }
    }

    fn record_failure(&mut self, err: CaptureError) -> CaptureError {
        warn!(error = %err, "Capture failed");
        self.error = Some(err.to_string());
        err
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.release_stream();
    }
}
