//! Config defaults: fills every unset field after loading.

use std::path::Path;

use tagscan_understanding::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

use crate::schema::{
    CameraConfig, CredentialsConfig, ExportConfig, LoggingConfig, RecognitionConfig,
    TagScanConfig,
};

pub const DEFAULT_PROVIDER: &str = "gemini";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: TagScanConfig, config_dir: &Path) -> TagScanConfig {
    let config = apply_recognition_defaults(config);
    let config = apply_camera_defaults(config, config_dir);
    let config = apply_export_defaults(config, config_dir);
    let config = apply_logging_defaults(config, config_dir);
    apply_credential_defaults(config, config_dir)
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn apply_recognition_defaults(mut config: TagScanConfig) -> TagScanConfig {
    let recognition = config.recognition.get_or_insert_with(RecognitionConfig::default);
    recognition
        .provider
        .get_or_insert_with(|| DEFAULT_PROVIDER.to_string());
    recognition
        .endpoint
        .get_or_insert_with(|| DEFAULT_ENDPOINT.to_string());
    recognition
        .model
        .get_or_insert_with(|| DEFAULT_MODEL.to_string());
    config
}

fn apply_camera_defaults(mut config: TagScanConfig, config_dir: &Path) -> TagScanConfig {
    let camera = config.camera.get_or_insert_with(CameraConfig::default);
    camera
        .source
        .get_or_insert_with(|| path_string(&config_dir.join("camera")));
    config
}

/// Exports land in the user's download directory when there is one.
fn apply_export_defaults(mut config: TagScanConfig, config_dir: &Path) -> TagScanConfig {
    let export = config.export.get_or_insert_with(ExportConfig::default);
    export.output_dir.get_or_insert_with(|| {
        let dir = dirs::download_dir()
            .filter(|d| d.is_dir())
            .unwrap_or_else(|| config_dir.join("exports"));
        path_string(&dir)
    });
    config
}

fn apply_logging_defaults(mut config: TagScanConfig, config_dir: &Path) -> TagScanConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging
        .level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging
        .dir
        .get_or_insert_with(|| path_string(&config_dir.join("logs")));
    config
}

fn apply_credential_defaults(mut config: TagScanConfig, config_dir: &Path) -> TagScanConfig {
    let credentials = config.credentials.get_or_insert_with(CredentialsConfig::default);
    credentials
        .file
        .get_or_insert_with(|| path_string(&config_dir.join("credentials.json")));
    config
}
