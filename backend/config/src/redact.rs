//! Config redaction: produce safe-to-share config snapshots by masking secrets.
//!
//! Masks values under sensitive keys and any string that looks like a
//! Gemini API key, wherever it appears.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static SENSITIVE_KEYS: &[&str] = &[
    "apiKey",
    "api_key",
    "gemini_api_key",
    "token",
    "accessToken",
    "access_token",
    "secret",
    "password",
];

static GEMINI_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"AIza[0-9A-Za-z_\-]{35}").expect("static regex"));

/// Redact a config JSON value, masking all sensitive strings.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

/// Show only the first four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() > 8 {
        format!("{}***", secret.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    }
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_string(s: &str, key: &str) -> Value {
    if s.is_empty() {
        return Value::String(String::new());
    }
    if is_sensitive_key(key) {
        return Value::String(mask_secret(s));
    }
    Value::String(GEMINI_KEY_PATTERN.replace_all(s, "AIza***").into_owned())
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}
