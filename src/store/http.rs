use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::model::{Bill, Credentials, NewUser, StoredFile};

use super::{BillUpdate, BillUpload, CreateHeaders, LoginResponse, RemoteStore, StoreError};

const ERROR_PREVIEW_CHARS: usize = 300;

/// REST client for the Billed API (`/auth/login`, `/users`, `/bills`).
#[derive(Clone)]
pub struct HttpStore {
    http: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(builder: RequestBuilder, jwt: Option<&str>) -> RequestBuilder {
        match jwt {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message: String = body.chars().take(ERROR_PREVIEW_CHARS).collect();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized,
            StatusCode::NOT_FOUND => StoreError::NotFound(message),
            other => StoreError::Rejected {
                status: other.as_u16(),
                message,
            },
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let text = response
            .text()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        serde_json::from_str(&text).map_err(|err| StoreError::Decode(err.to_string()))
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, StoreError> {
        let builder = self.http.post(self.url("/auth/login")).json(credentials);
        let response = Self::send(builder).await?;
        Self::decode(response).await
    }

    async fn create_user(&self, data: &NewUser) -> Result<(), StoreError> {
        let builder = self.http.post(self.url("/users")).json(data);
        Self::send(builder).await?;
        Ok(())
    }

    async fn list_bills(&self, jwt: Option<&str>) -> Result<Vec<Bill>, StoreError> {
        let builder = Self::authorize(self.http.get(self.url("/bills")), jwt);
        let response = Self::send(builder).await?;
        Self::decode(response).await
    }

    async fn create_bill(
        &self,
        jwt: Option<&str>,
        upload: BillUpload,
        headers: CreateHeaders,
    ) -> Result<StoredFile, StoreError> {
        let BillUpload {
            file_name,
            content_type,
            bytes,
            email,
        } = upload;

        let mut part = Part::bytes(bytes).file_name(file_name.clone());
        if !headers.no_content_type {
            let declared = content_type.unwrap_or_else(|| guess_mime(&file_name).to_string());
            part = part
                .mime_str(&declared)
                .map_err(|err| StoreError::Transport(err.to_string()))?;
        }
        let form = Form::new().part("file", part).text("email", email);

        debug!(file = %file_name, "uploading bill attachment");
        let builder = Self::authorize(self.http.post(self.url("/bills")), jwt).multipart(form);
        let response = Self::send(builder).await?;
        Self::decode(response).await
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
        let builder = Self::authorize(
            self.http.patch(self.url(&format!("/bills/{selector}"))),
            jwt,
        )
        .json(&update.data);
        let response = Self::send(builder).await?;
        Self::decode(response).await
    }
}

/// Content type for an attachment name, falling back to octet-stream.
pub fn guess_mime(file_name: &str) -> mime::Mime {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "pdf" => mime::APPLICATION_PDF,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}
