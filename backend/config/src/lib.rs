//! `tagscan-config`: runtime configuration and credential storage.
//!
//! Provides:
//! - Typed config schema
//! - YAML read/write with atomic backup rotation
//! - `${ENV_VAR}` substitution
//! - Config redaction for safe display
//! - Default value application and validation
//! - The file-backed credential store

pub mod credential;
pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use credential::{FileCredentialStore, MemoryCredentialStore};
pub use defaults::apply_all_defaults;
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, expand_home, load_config, write_config};
pub use redact::{mask_secret, redact};
pub use schema::TagScanConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load the config file in `config_dir`, substitute env vars, apply
/// defaults, and validate.
///
/// Only unreadable or unparseable files and missing env vars are errors
/// here. The validation report is returned for the caller to log once a
/// subscriber is installed, or to refuse an invalid config.
pub async fn load_and_prepare(config_dir: &Path) -> Result<(TagScanConfig, ValidationReport)> {
    let raw_config = load_config(&config_file_path(config_dir)).await?;

    let value: Value = serde_json::to_value(&raw_config)
        .context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: TagScanConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults(config, config_dir);

    let report = validate(&config);
    Ok((config, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prepares_defaults_for_fresh_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (cfg, _) = load_and_prepare(dir.path()).await.unwrap();
        assert_eq!(cfg.camera_source(), Some(dir.path().join("camera")));
        assert_eq!(
            cfg.credentials_file(),
            Some(dir.path().join("credentials.json"))
        );
    }

    #[tokio::test]
    async fn reads_file_values() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            config_file_path(dir.path()),
            "recognition:\n  model: gemini-2.0-flash\nlogging:\n  level: debug\n",
        )
        .await
        .unwrap();
        let (cfg, _) = load_and_prepare(dir.path()).await.unwrap();
        assert_eq!(cfg.recognition_model(), "gemini-2.0-flash");
        assert_eq!(cfg.log_level(), "debug");
    }

    #[tokio::test]
    async fn unset_env_reference_fails() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            config_file_path(dir.path()),
            "export:\n  outputDir: ${TAGSCAN_TEST_SURELY_UNSET_DIR}\n",
        )
        .await
        .unwrap();
        assert!(load_and_prepare(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn validation_report_is_returned_to_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            config_file_path(dir.path()),
            "recognition:\n  provider: openai\nlogging:\n  level: loud\n",
        )
        .await
        .unwrap();
        let (_, report) = load_and_prepare(dir.path()).await.unwrap();
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|e| e.path == "recognition.provider"));
        let warned: Vec<&str> = report.warnings.iter().map(|w| w.path.as_str()).collect();
        assert!(warned.contains(&"logging.level"));
        assert!(warned.contains(&"camera.source"));
    }
}
