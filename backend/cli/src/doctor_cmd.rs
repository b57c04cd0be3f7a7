//! CLI Doctor Command
//!
//! Checks everything a scanning session depends on and reports each result.

use anyhow::Result;

use tagscan_media::is_frame_file;

use crate::config::AppContext;
use crate::key_cmd;
use crate::terminal_output::{note_error, note_success, note_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Ok(String),
    Warn(String),
    Fail(String),
}

impl CheckStatus {
    fn print(&self) {
        match self {
            Self::Ok(msg) => note_success(msg),
            Self::Warn(msg) => note_warn(msg),
            Self::Fail(msg) => note_error(msg),
        }
    }
}

pub fn check_config(ctx: &AppContext) -> Vec<CheckStatus> {
    let report = &ctx.report;
    let mut checks: Vec<CheckStatus> = report
        .errors
        .iter()
        .map(|e| CheckStatus::Fail(e.to_string()))
        .collect();
    checks.extend(report.warnings.iter().map(|w| CheckStatus::Warn(w.to_string())));
    if checks.is_empty() {
        checks.push(CheckStatus::Ok("Config is valid".into()));
    }
    checks
}

pub fn check_credential(ctx: &AppContext) -> CheckStatus {
    match key_cmd::masked(&ctx.file_store()) {
        Some(key) => CheckStatus::Ok(format!("API key stored ({key})")),
        None => CheckStatus::Fail("No API key stored; run `tagscan key set <KEY>`".into()),
    }
}

pub fn check_camera(ctx: &AppContext) -> CheckStatus {
    let source = ctx.camera_source();
    let Ok(entries) = std::fs::read_dir(&source) else {
        return CheckStatus::Fail(format!("Camera directory {} is missing", source.display()));
    };
    let frames = entries
        .filter_map(|e| e.ok())
        .filter(|e| is_frame_file(&e.path()))
        .count();
    if frames == 0 {
        CheckStatus::Warn(format!("Camera directory {} has no snapshots yet", source.display()))
    } else {
        CheckStatus::Ok(format!("Camera directory {} ({frames} snapshots)", source.display()))
    }
}

pub fn check_export_dir(ctx: &AppContext) -> CheckStatus {
    let dir = ctx.config.export_dir();
    if dir.is_dir() {
        let readonly = std::fs::metadata(&dir)
            .map(|m| m.permissions().readonly())
            .unwrap_or(true);
        if readonly {
            CheckStatus::Fail(format!("Export directory {} is not writable", dir.display()))
        } else {
            CheckStatus::Ok(format!("Export directory {}", dir.display()))
        }
    } else {
        CheckStatus::Warn(format!("Export directory {} will be created on first export", dir.display()))
    }
}

/// Executes the full doctor diagnosis. Returns whether every check passed.
pub fn run(ctx: &AppContext) -> Result<bool> {
    println!("\nRunning tagscan doctor...\n");

    let mut checks = check_config(ctx);
    checks.push(check_credential(ctx));
    checks.push(check_camera(ctx));
    checks.push(check_export_dir(ctx));

    for check in &checks {
        check.print();
    }

    let healthy = !checks.iter().any(|c| matches!(c, CheckStatus::Fail(_)));
    println!();
    if healthy {
        note_success("All checks passed");
    } else {
        note_error("Some checks failed; fix the errors above");
    }
    Ok(healthy)
}
