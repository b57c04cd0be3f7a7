use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use tagscan_config::{load_and_prepare, FileCredentialStore, TagScanConfig, ValidationReport};
use tagscan_core::{CameraDevice, CredentialStore, RecordExporter};
use tagscan_media::DirectoryCamera;
use tagscan_understanding::{instruction_or_default, GeminiSettings, RecognitionClient};

/// Prepared configuration plus the collaborators every command builds from it.
pub struct AppContext {
    pub config_dir: PathBuf,
    pub config: TagScanConfig,
    /// Findings from loading; logged by `main` once the subscriber is up.
    pub report: ValidationReport,
}

impl AppContext {
    /// Load `<config_dir>/config.yaml` with env substitution and defaults applied.
    pub async fn load(config_dir: PathBuf) -> Result<Self> {
        let (config, report) = load_and_prepare(&config_dir).await.with_context(|| {
            format!("Failed to load config from {}", config_dir.display())
        })?;
        Ok(Self {
            config_dir,
            config,
            report,
        })
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.config
            .credentials_file()
            .unwrap_or_else(|| self.config_dir.join("credentials.json"))
    }

    pub fn file_store(&self) -> FileCredentialStore {
        FileCredentialStore::new(self.credentials_path())
    }

    pub fn credential_store(&self) -> Arc<dyn CredentialStore> {
        Arc::new(self.file_store())
    }

    pub fn log_dir(&self) -> PathBuf {
        self.config
            .log_dir()
            .unwrap_or_else(|| self.config_dir.join("logs"))
    }

    pub fn camera_source(&self) -> PathBuf {
        self.config
            .camera_source()
            .unwrap_or_else(|| self.config_dir.join("camera"))
    }

    pub fn camera(&self) -> Arc<dyn CameraDevice> {
        Arc::new(DirectoryCamera::new(
            self.camera_source(),
            self.config.camera_facing(),
        ))
    }

    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            endpoint: self.config.recognition_endpoint().to_string(),
            model: self.config.recognition_model().to_string(),
        }
    }

    pub fn recognition_client(&self, store: Arc<dyn CredentialStore>) -> RecognitionClient {
        RecognitionClient::gemini(store, self.gemini_settings())
    }

    pub fn instruction(&self) -> String {
        instruction_or_default(self.config.recognition_prompt())
    }

    /// `out` overrides the configured export directory.
    pub fn exporter(&self, out: Option<&Path>) -> RecordExporter {
        let dir = out
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.export_dir());
        RecordExporter::new(dir)
    }
}
