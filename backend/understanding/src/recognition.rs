/// Recognition client: credential-keyed, lazily built vision backend.
///
/// The backend is rebuilt whenever the stored credential differs from the one
/// the cached instance was built with, so rotating the key takes effect on
/// the next call without a restart.
use std::sync::Arc;

use tracing::{debug, info, warn};

use tagscan_core::{CredentialStore, InlineImage, RecognitionError, VisionBackend, CREDENTIAL_KEY};

use crate::vision::{GeminiSettings, GeminiVision};

/// Builds a backend for a given credential.
pub type BackendFactory = Arc<dyn Fn(&str) -> Arc<dyn VisionBackend> + Send + Sync>;

struct CachedBackend {
    credential: String,
    backend: Arc<dyn VisionBackend>,
}

pub struct RecognitionClient {
    store: Arc<dyn CredentialStore>,
    factory: BackendFactory,
    cached: Option<CachedBackend>,
}

impl RecognitionClient {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        factory: impl Fn(&str) -> Arc<dyn VisionBackend> + Send + Sync + 'static,
    ) -> Self {
        Self {
            store,
            factory: Arc::new(factory),
            cached: None,
        }
    }

    /// Client backed by Gemini with the given endpoint/model.
    pub fn gemini(store: Arc<dyn CredentialStore>, settings: GeminiSettings) -> Self {
        Self::new(store, move |key: &str| -> Arc<dyn VisionBackend> {
            Arc::new(GeminiVision::new(key, settings.clone()))
        })
    }

    /// Resolve the backend for the current credential without sending anything.
    pub fn prepare(&mut self) -> Result<PreparedRecognition, RecognitionError> {
        let credential = self
            .store
            .get(CREDENTIAL_KEY)
            .filter(|c| !c.trim().is_empty())
            .ok_or(RecognitionError::MissingCredential)?;

        let backend = match &self.cached {
            Some(cached) if cached.credential == credential => Arc::clone(&cached.backend),
            stale => {
                if stale.is_some() {
                    info!("[Recognition] Credential changed; rebuilding backend");
                } else {
                    debug!("[Recognition] Building backend");
                }
                let backend = (self.factory)(&credential);
                self.cached = Some(CachedBackend {
                    credential,
                    backend: Arc::clone(&backend),
                });
                backend
            }
        };

        Ok(PreparedRecognition { backend })
    }

    pub async fn recognize(
        &mut self,
        image: &InlineImage,
        instruction: &str,
    ) -> Result<String, RecognitionError> {
        self.prepare()?.run(image.clone(), instruction.to_string()).await
    }
}

/// A resolved backend, detached from the client so the call can be spawned.
pub struct PreparedRecognition {
    backend: Arc<dyn VisionBackend>,
}

impl PreparedRecognition {
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Send the image. Returns trimmed, non-empty text.
    pub async fn run(self, image: InlineImage, instruction: String) -> Result<String, RecognitionError> {
        match self.backend.generate(&image, &instruction).await {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    warn!(backend = self.backend.name(), "[Recognition] Empty result");
                    return Err(RecognitionError::EmptyResult);
                }
                Ok(text.to_string())
            }
            Err(err) => {
                let normalized = normalize_error(&err);
                warn!(backend = self.backend.name(), error = %normalized, "[Recognition] Call failed");
                Err(normalized)
            }
        }
    }
}

/// Keep the original message; failures without one become `UnknownFailure`.
pub fn normalize_error(err: &anyhow::Error) -> RecognitionError {
    let message = format!("{err:#}");
    if message.trim().is_empty() {
        RecognitionError::UnknownFailure
    } else {
        RecognitionError::Service(message)
    }
}
