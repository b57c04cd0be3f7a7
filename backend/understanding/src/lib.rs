pub mod prompt;
pub mod recognition;
pub mod vision;

pub use prompt::{instruction_or_default, TAG_INSTRUCTION};
pub use recognition::{normalize_error, BackendFactory, PreparedRecognition, RecognitionClient};
pub use vision::{GeminiSettings, GeminiVision, DEFAULT_ENDPOINT, DEFAULT_MODEL};
