pub mod error;
pub mod export;
pub mod traits;
pub mod types;
pub mod workflow;

pub use error::{CameraError, CaptureError, RecognitionError, WorkflowError};
pub use export::{render_csv, CsvExport, RecordExporter, CSV_HEADER, CSV_MIME_TYPE};
pub use traits::{CameraDevice, CameraStream, CredentialStore, VisionBackend, CREDENTIAL_KEY};
pub use types::{
    CameraConstraints, FacingMode, Frame, InlineImage, ScannedRecord, TruckInfo, DATE_FORMAT,
};
pub use workflow::{Transition, Workflow, WorkflowEvent, WorkflowState};
