//! Remote data store collaborator.
//!
//! Containers only see the [`RemoteStore`] trait. `HttpStore` talks to the
//! Billed REST API; `MemoryStore` backs local development when no API URL is
//! configured.

#[cfg(test)]
pub mod fake;
pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Bill, Credentials, NewUser, StoredFile};

pub use http::HttpStore;
pub use memory::MemoryStore;

/// Failures surfaced by a store adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("remote store rejected the credentials")]
    Unauthorized,
    #[error("remote store has no record for `{0}`")]
    NotFound(String),
    #[error("remote store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("remote store transport failed: {0}")]
    Transport(String),
    #[error("remote store returned an unreadable payload: {0}")]
    Decode(String),
    #[error("bill update is missing its selector")]
    MissingSelector,
}

/// Body returned by the login endpoint. Back ends disagree on the token field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(
        rename = "accessToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub access_token: Option<String>,
}

impl LoginResponse {
    pub fn with_jwt(token: impl Into<String>) -> Self {
        Self {
            jwt: Some(token.into()),
            ..Self::default()
        }
    }

    /// First non-empty token among `jwt`, `token` and `accessToken`.
    pub fn token(&self) -> Option<&str> {
        [&self.jwt, &self.token, &self.access_token]
            .into_iter()
            .filter_map(|value| value.as_deref())
            .find(|value| !value.is_empty())
    }
}

/// Attachment plus owner email posted when an employee selects a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub email: String,
}

/// Transport hints attached to a create call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateHeaders {
    /// Let the transport pick the multipart content type itself.
    pub no_content_type: bool,
}

/// Full-record update keyed by the bill identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillUpdate {
    pub data: Bill,
    pub selector: Option<String>,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, StoreError>;

    async fn create_user(&self, data: &NewUser) -> Result<(), StoreError>;

    async fn list_bills(&self, jwt: Option<&str>) -> Result<Vec<Bill>, StoreError>;

    async fn create_bill(
        &self,
        jwt: Option<&str>,
        upload: BillUpload,
        headers: CreateHeaders,
    ) -> Result<StoredFile, StoreError>;

    async fn update_bill(&self, jwt: Option<&str>, update: &BillUpdate)
    -> Result<Bill, StoreError>;
}
