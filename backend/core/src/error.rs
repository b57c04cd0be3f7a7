use thiserror::Error;

/// Failures while acquiring or reading from the camera.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),

    #[error("camera access denied: {0}")]
    AccessDenied(String),

    #[error("no camera satisfies the requested constraints")]
    ConstraintUnsatisfied,

    #[error("camera failed to produce a frame: {0}")]
    FrameUnavailable(String),
}

/// Failures of the external recognition call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecognitionError {
    #[error("missing credential")]
    MissingCredential,

    #[error("{0}")]
    Service(String),

    #[error("unknown failure")]
    UnknownFailure,

    #[error("empty result")]
    EmptyResult,
}

/// Failures of one capture-and-recognize cycle. All of these are transient:
/// the operator can simply capture again.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera not ready")]
    CameraNotReady,

    #[error("encode failed")]
    EncodeFailed,

    #[error("no tags recognized")]
    NoTagsRecognized,

    #[error("capture already in progress")]
    Busy,

    #[error("camera is not open")]
    CameraUnavailable,

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error("recognition failed: {0}")]
    Recognition(#[from] RecognitionError),
}

/// Rejected workflow transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("date, truck number and credential are all required")]
    IncompleteSubmission,

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("'{event}' is not allowed while in {state}")]
    InvalidTransition { state: &'static str, event: &'static str },
}
