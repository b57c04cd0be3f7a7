//! CLI Key Command
//!
//! Manages the stored recognition API key.

use anyhow::{bail, Result};

use tagscan_config::{mask_secret, FileCredentialStore};
use tagscan_core::{CredentialStore, CREDENTIAL_KEY};

use crate::terminal_output::{note_info, note_success};

pub fn set(store: &FileCredentialStore, value: &str) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        bail!("API key cannot be empty");
    }
    store.set(CREDENTIAL_KEY, value)?;
    note_success(&format!("API key saved to {}", store.path().display()));
    Ok(())
}

/// The stored key, masked, or `None` when unset.
pub fn masked(store: &FileCredentialStore) -> Option<String> {
    store
        .get(CREDENTIAL_KEY)
        .filter(|k| !k.trim().is_empty())
        .map(|k| mask_secret(&k))
}

pub fn show(store: &FileCredentialStore) -> Result<()> {
    match masked(store) {
        Some(key) => println!("{key}"),
        None => note_info("No API key stored"),
    }
    Ok(())
}

pub fn clear(store: &FileCredentialStore) -> Result<()> {
    if store.remove(CREDENTIAL_KEY)? {
        note_success("API key removed");
    } else {
        note_info("No API key stored");
    }
    Ok(())
}
