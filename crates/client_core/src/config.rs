use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use shared::protocol::DEFAULT_COLLECTION_PATH;

pub const DEFAULT_SETTINGS_FILE: &str = "store.toml";

/// Connection parameters for the remote document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub base_url: String,
    pub collection_path: String,
    pub auth_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".into(),
            collection_path: DEFAULT_COLLECTION_PATH.into(),
            auth_token: None,
            request_timeout_secs: None,
        }
    }
}

impl StoreSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    collection_path: Option<String>,
    auth_token: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then `store.toml` (or `explicit_path`), then environment.
///
/// A missing default file is fine; a missing or malformed explicit file is an error.
pub fn load_settings(explicit_path: Option<&Path>) -> anyhow::Result<StoreSettings> {
    let mut settings = StoreSettings::default();

    let (path, required) = match explicit_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };

    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse store settings '{}'", path.display()))?;
            apply_file_settings(&mut settings, file_cfg);
        }
        Err(err) if required => {
            return Err(err)
                .with_context(|| format!("failed to read store settings '{}'", path.display()));
        }
        Err(_) => {}
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    settings.collection_path = normalize_collection_path(&settings.collection_path);
    Ok(settings)
}

fn apply_file_settings(settings: &mut StoreSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.base_url {
        settings.base_url = v;
    }
    if let Some(v) = file_cfg.collection_path {
        settings.collection_path = v;
    }
    if let Some(v) = file_cfg.auth_token {
        settings.auth_token = Some(v);
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
}

pub(crate) fn apply_env_overrides(
    settings: &mut StoreSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("STORE_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = non_empty("APP__STORE_BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = non_empty("STORE_COLLECTION_PATH") {
        settings.collection_path = v;
    }
    if let Some(v) = non_empty("APP__STORE_COLLECTION_PATH") {
        settings.collection_path = v;
    }

    if let Some(v) = non_empty("STORE_AUTH_TOKEN") {
        settings.auth_token = Some(v);
    }
    if let Some(v) = non_empty("APP__STORE_AUTH_TOKEN") {
        settings.auth_token = Some(v);
    }

    if let Some(v) = non_empty("APP__STORE_REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }
}

/// Single leading `/`, no trailing `/`; empty input means the default collection.
pub fn normalize_collection_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_COLLECTION_PATH.to_string();
    }
    format!("/{trimmed}")
}
