//! tagscan configuration schema, typed for serde YAML/JSON deserialization.
//!
//! Every field is optional in the file; [`crate::defaults`] fills the gaps
//! after loading, so the accessors below only fall back for configs that
//! were built in code.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use tagscan_core::FacingMode;
use tagscan_understanding::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

use crate::io::expand_home;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagScanConfig {
    /// Recognition service selection and instruction text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recognition: Option<RecognitionConfig>,

    /// Camera source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraConfig>,

    /// Where exported CSV files are written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportConfig>,

    /// Logging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    /// Credential storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialsConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    /// Only "gemini" is supported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Overrides the built-in tag instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraConfig {
    /// Directory the capture device writes PNG snapshots into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Which way the source camera faces, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<FacingMode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved accessors
// ---------------------------------------------------------------------------

impl TagScanConfig {
    pub fn recognition_endpoint(&self) -> &str {
        self.recognition
            .as_ref()
            .and_then(|r| r.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn recognition_model(&self) -> &str {
        self.recognition
            .as_ref()
            .and_then(|r| r.model.as_deref())
            .unwrap_or(DEFAULT_MODEL)
    }

    pub fn recognition_prompt(&self) -> Option<&str> {
        self.recognition.as_ref().and_then(|r| r.prompt.as_deref())
    }

    pub fn camera_source(&self) -> Option<PathBuf> {
        self.camera
            .as_ref()
            .and_then(|c| c.source.as_deref())
            .map(expand_home)
    }

    pub fn camera_facing(&self) -> Option<FacingMode> {
        self.camera.as_ref().and_then(|c| c.facing)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export
            .as_ref()
            .and_then(|e| e.output_dir.as_deref())
            .map(expand_home)
            .unwrap_or_else(|| PathBuf::from("exports"))
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("info")
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.logging
            .as_ref()
            .and_then(|l| l.dir.as_deref())
            .map(expand_home)
    }

    pub fn credentials_file(&self) -> Option<PathBuf> {
        self.credentials
            .as_ref()
            .and_then(|c| c.file.as_deref())
            .map(expand_home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
recognition:
  model: gemini-2.0-flash
  prompt: "lower first"
camera:
  source: /srv/camera
  facing: environment
export:
  outputDir: /srv/exports
"#;
        let cfg: TagScanConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.recognition_model(), "gemini-2.0-flash");
        assert_eq!(cfg.recognition_prompt(), Some("lower first"));
        assert_eq!(cfg.camera_source(), Some(PathBuf::from("/srv/camera")));
        assert_eq!(cfg.camera_facing(), Some(FacingMode::Environment));
        assert_eq!(cfg.export_dir(), PathBuf::from("/srv/exports"));
    }

    #[test]
    fn empty_config_falls_back() {
        let cfg = TagScanConfig::default();
        assert_eq!(cfg.recognition_endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(cfg.recognition_model(), DEFAULT_MODEL);
        assert_eq!(cfg.log_level(), "info");
        assert!(cfg.camera_source().is_none());
    }

    #[test]
    fn unset_sections_are_not_serialized() {
        let yaml = serde_yaml::to_string(&TagScanConfig::default()).unwrap();
        assert_eq!(yaml.trim(), "{}");
    }
}
