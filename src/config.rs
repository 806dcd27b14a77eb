use std::{env, path::PathBuf};

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ATTACHMENTS_DIR: &str = "storage/attachments";
const DEFAULT_SEED_ADMIN_EMAIL: &str = "admin@billed.local";
const DEFAULT_SEED_ADMIN_PASSWORD: &str = "change-me";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Billed API base URL. `None` selects the in-memory store.
    pub api_url: Option<String>,
    pub attachments_dir: PathBuf,
    pub seed_admin: SeedAdmin,
    pub max_upload_bytes: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match non_empty(lookup("PORT")) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got `{raw}`"))?,
            None => DEFAULT_PORT,
        };

        let max_upload_bytes = match non_empty(lookup("BILLED_MAX_UPLOAD_BYTES")) {
            Some(raw) => raw.parse().with_context(|| {
                format!("BILLED_MAX_UPLOAD_BYTES must be a byte count, got `{raw}`")
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            port,
            api_url: non_empty(lookup("BILLED_API_URL")),
            attachments_dir: non_empty(lookup("BILLED_ATTACHMENTS_DIR"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ATTACHMENTS_DIR)),
            seed_admin: SeedAdmin {
                email: non_empty(lookup("BILLED_SEED_ADMIN_EMAIL"))
                    .unwrap_or_else(|| DEFAULT_SEED_ADMIN_EMAIL.to_string()),
                password: non_empty(lookup("BILLED_SEED_ADMIN_PASSWORD"))
                    .unwrap_or_else(|| DEFAULT_SEED_ADMIN_PASSWORD.to_string()),
            },
            max_upload_bytes,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
