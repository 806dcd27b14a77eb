use std::{
    collections::HashMap,
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result, anyhow};
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use async_trait::async_trait;
use rand_core::OsRng;
use reqwest::Url;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::model::{Bill, BillStatus, Credentials, NewUser, StoredFile, UserType};

use super::{BillUpdate, BillUpload, CreateHeaders, LoginResponse, RemoteStore, StoreError};

pub const ATTACHMENTS_ROUTE: &str = "/attachments";

#[derive(Clone)]
struct StoredUser {
    user_type: UserType,
    name: String,
    password_hash: String,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, StoredUser>,
    tokens: HashMap<String, String>,
    bills: Vec<Bill>,
}

/// In-process stand-in for the Billed API.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    attachments_root: PathBuf,
}

impl MemoryStore {
    pub fn new(attachments_root: impl Into<PathBuf>) -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
            attachments_root: attachments_root.into(),
        }
    }

    /// Register an admin account unless the email is already known.
    pub async fn ensure_seed_admin(&self, email: &str, password: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if state.users.contains_key(email) {
            return Ok(());
        }

        let password_hash = hash_password(password)
            .map_err(|err| anyhow!("failed to hash seed admin password: {err}"))?;
        state.users.insert(
            email.to_string(),
            StoredUser {
                user_type: UserType::Admin,
                name: local_part(email),
                password_hash,
            },
        );
        info!(%email, "seeded admin account in the in-memory store");
        Ok(())
    }

    async fn resolve_token(&self, jwt: Option<&str>) -> Result<(String, UserType), StoreError> {
        let token = jwt.ok_or(StoreError::Unauthorized)?;
        let state = self.state.read().await;
        let email = state.tokens.get(token).ok_or(StoreError::Unauthorized)?;
        let user = state.users.get(email).ok_or(StoreError::Unauthorized)?;
        Ok((email.clone(), user.user_type))
    }

    async fn write_attachment(&self, key: &str, file_name: &str, bytes: &[u8]) -> Result<String> {
        let stored_name = stored_file_name(file_name);
        let dir = self.attachments_root.join(key);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create attachment directory {}", dir.display()))?;
        let path = dir.join(&stored_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write attachment {}", path.display()))?;
        attachment_url(key, &stored_name)
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, StoreError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get(&credentials.email)
            .ok_or(StoreError::Unauthorized)?;
        if !verify_password(&credentials.password, &user.password_hash) {
            return Err(StoreError::Unauthorized);
        }
        info!(email = %credentials.email, name = %user.name, "issuing access token");

        let token = Uuid::new_v4().to_string();
        state.tokens.retain(|_, email| email != &credentials.email);
        state
            .tokens
            .insert(token.clone(), credentials.email.clone());
        Ok(LoginResponse::with_jwt(token))
    }

    async fn create_user(&self, data: &NewUser) -> Result<(), StoreError> {
        if data.email.trim().is_empty() || data.password.is_empty() {
            return Err(StoreError::Rejected {
                status: 400,
                message: "email and password are required".to_string(),
            });
        }

        let password_hash = hash_password(&data.password).map_err(|err| StoreError::Rejected {
            status: 500,
            message: format!("failed to hash password: {err}"),
        })?;

        let mut state = self.state.write().await;
        if state.users.contains_key(&data.email) {
            return Err(StoreError::Rejected {
                status: 409,
                message: format!("user `{}` already exists", data.email),
            });
        }
        state.users.insert(
            data.email.clone(),
            StoredUser {
                user_type: data.user_type,
                name: data.name.clone(),
                password_hash,
            },
        );
        Ok(())
    }

    async fn list_bills(&self, jwt: Option<&str>) -> Result<Vec<Bill>, StoreError> {
        let (email, user_type) = self.resolve_token(jwt).await?;
        let state = self.state.read().await;
        Ok(state
            .bills
            .iter()
            .filter(|bill| user_type == UserType::Admin || bill.email == email)
            .cloned()
            .collect())
    }

    async fn create_bill(
        &self,
        jwt: Option<&str>,
        upload: BillUpload,
        _headers: CreateHeaders,
    ) -> Result<StoredFile, StoreError> {
        self.resolve_token(jwt).await?;

        let key = Uuid::new_v4().simple().to_string();
        let file_url = self
            .write_attachment(&key, &upload.file_name, &upload.bytes)
            .await
            .map_err(|err| StoreError::Rejected {
                status: 500,
                message: format!("{err:#}"),
            })?;

        let bill = Bill {
            id: Some(key.clone()),
            email: upload.email,
            file_url: Some(file_url.clone()),
            file_name: Some(upload.file_name),
            status: BillStatus::Pending,
            ..Bill::default()
        };
        self.state.write().await.bills.push(bill);

        Ok(StoredFile {
            file_url: Some(file_url),
            key: Some(key),
        })
    }

    async fn update_bill(
        &self,
        jwt: Option<&str>,
        update: &BillUpdate,
    ) -> Result<Bill, StoreError> {
        let selector = update
            .selector
            .as_deref()
            .ok_or(StoreError::MissingSelector)?;
        let (email, user_type) = self.resolve_token(jwt).await?;

        let mut state = self.state.write().await;
        let bill = state
            .bills
            .iter_mut()
            .find(|bill| bill.id.as_deref() == Some(selector))
            .ok_or_else(|| StoreError::NotFound(selector.to_string()))?;

        if user_type != UserType::Admin && bill.email != email {
            return Err(StoreError::Unauthorized);
        }

        *bill = Bill {
            id: Some(selector.to_string()),
            ..update.data.clone()
        };
        Ok(bill.clone())
    }
}

fn local_part(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

/// Server path of a stored attachment, each segment percent-encoded.
fn attachment_url(key: &str, file_name: &str) -> Result<String> {
    let mut url = Url::parse("http://localhost/").context("invalid attachment base url")?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("attachment base url cannot hold a path"))?
        .pop_if_empty()
        .extend([ATTACHMENTS_ROUTE.trim_start_matches('/'), key, file_name]);
    Ok(url.path().to_string())
}

fn stored_file_name(original: &str) -> String {
    let sanitized = sanitize_filename::sanitize(original);
    if sanitized.is_empty() {
        "attachment.bin".to_string()
    } else {
        sanitized
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed = PasswordHash::new(password_hash);
    match parsed {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}
