//! Config validation with user-friendly error messages.

use crate::schema::TagScanConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Emit every finding through `tracing`.
    pub fn log(&self) {
        for warning in &self.warnings {
            tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
        }
        for error in &self.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &TagScanConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_recognition(config, &mut report);
    validate_camera(config, &mut report);
    validate_export(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_recognition(config: &TagScanConfig, report: &mut ValidationReport) {
    let Some(recognition) = &config.recognition else { return };

    if let Some(provider) = &recognition.provider {
        if provider != "gemini" {
            report.error(
                "recognition.provider",
                format!("Unknown provider '{provider}'. Only 'gemini' is supported"),
            );
        }
    }
    if let Some(endpoint) = &recognition.endpoint {
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            report.error("recognition.endpoint", "Endpoint must be an http(s) URL");
        }
    }
    if let Some(model) = &recognition.model {
        if model.trim().is_empty() {
            report.error("recognition.model", "Model cannot be empty");
        }
    }
    if let Some(prompt) = &recognition.prompt {
        if prompt.trim().is_empty() {
            report.warn("recognition.prompt", "Prompt is blank; the built-in instruction is used");
        }
    }
}

fn validate_camera(config: &TagScanConfig, report: &mut ValidationReport) {
    if let Some(source) = config.camera_source() {
        if !source.is_dir() {
            report.warn(
                "camera.source",
                format!("{} does not exist yet; the scanner will report the camera as unavailable", source.display()),
            );
        }
    }
}

fn validate_export(config: &TagScanConfig, report: &mut ValidationReport) {
    let Some(export) = &config.export else { return };
    if let Some(dir) = &export.output_dir {
        if dir.trim().is_empty() {
            report.error("export.outputDir", "Export directory cannot be empty");
        }
    }
}

fn validate_logging(config: &TagScanConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };
    if let Some(level) = &logging.level {
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            report.warn(
                "logging.level",
                format!("Unknown log level '{level}'; RUST_LOG style filters are passed through as-is"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ExportConfig, LoggingConfig, RecognitionConfig};

    #[test]
    fn empty_config_is_valid() {
        let report = validate(&TagScanConfig::default());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }

    #[test]
    fn unknown_provider_is_error() {
        let mut cfg = TagScanConfig::default();
        cfg.recognition = Some(RecognitionConfig {
            provider: Some("openai".into()),
            endpoint: Some("ftp://example".into()),
            ..Default::default()
        });
        let report = validate(&cfg);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].path, "recognition.provider");
    }

    #[test]
    fn blank_export_dir_is_error() {
        let mut cfg = TagScanConfig::default();
        cfg.export = Some(ExportConfig {
            output_dir: Some("  ".into()),
        });
        assert!(!validate(&cfg).is_valid());
    }

    #[test]
    fn odd_log_level_only_warns() {
        let mut cfg = TagScanConfig::default();
        cfg.logging = Some(LoggingConfig {
            level: Some("chatty".into()),
            ..Default::default()
        });
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].path, "logging.level");
    }
}
