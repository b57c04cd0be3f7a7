use anyhow::Result;
use async_trait::async_trait;

use crate::error::CameraError;
use crate::types::{CameraConstraints, Frame, InlineImage};

/// Key under which the recognition credential is stored.
pub const CREDENTIAL_KEY: &str = "gemini_api_key";

/// Durable key-value storage for the recognition credential.
pub trait CredentialStore: Send + Sync {
    /// Returns `None` when the key was never set.
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// A camera that can be opened with constraints.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Human-readable description for logs and the doctor command.
    fn describe(&self) -> String;

    async fn request_access(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// An open camera feed. Must be released when the scanning view is left.
#[async_trait]
pub trait CameraStream: Send {
    /// Freeze the current frame.
    async fn current_frame(&mut self) -> Result<Frame, CameraError>;

    /// Stop the feed. Calling this more than once is a no-op.
    fn release(&mut self);

    /// True once the feed has ended, whether released here or by the device.
    fn is_released(&self) -> bool;
}

/// An image-understanding backend: image plus instruction in, free text out.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Backend name (e.g., "gemini").
    fn name(&self) -> &str;

    async fn generate(&self, image: &InlineImage, instruction: &str) -> Result<String>;
}
