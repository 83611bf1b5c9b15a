//! HTTP transport for the Hexmart backend.
//!
//! Every endpoint resolves to `{base_url}/api/{api_path}/{endpoint}`. When a
//! live session cookie exists its token is sent verbatim in the
//! `Authorization` header.

use std::sync::Arc;

use reqwest::RequestBuilder;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::SessionStore;

/// Multipart field the backend reads uploaded images from.
pub const UPLOAD_FIELD: &str = "file-to-upload";

/// A file to send as a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    /// MIME type, e.g. `image/png`. Left to the backend when `None`.
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// Backend API client.
///
/// Cheap to clone; clones share the HTTP connection pool and session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_path: String,
    session: SessionStore,
}

impl ApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                api_path: config.api_path.clone(),
                session,
            }),
        })
    }

    /// Session cookie shared with this client.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Resolve an endpoint (e.g. `admin/product/42`) to a full URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidEndpoint` if the base URL cannot take path segments.
    pub fn endpoint_url(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidEndpoint(endpoint.to_string()))?
            .pop_if_empty()
            .push("api")
            .push(&self.inner.api_path)
            .extend(endpoint.split('/').filter(|segment| !segment.is_empty()));

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Execute a GET request.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-2xx status or undecodable body.
    #[instrument(skip(self, query), fields(endpoint = %endpoint))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint_url(endpoint, query)?;
        self.execute(self.inner.client.get(url)).await
    }

    /// Execute a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-2xx status or undecodable body.
    #[instrument(skip(self, body), fields(endpoint = %endpoint))]
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint_url(endpoint, &[])?;
        self.execute(self.inner.client.post(url).json(body)).await
    }

    /// Execute a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-2xx status or undecodable body.
    #[instrument(skip(self, body), fields(endpoint = %endpoint))]
    pub async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint_url(endpoint, &[])?;
        self.execute(self.inner.client.put(url).json(body)).await
    }

    /// Execute a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-2xx status or undecodable body.
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let url = self.endpoint_url(endpoint, &[])?;
        self.execute(self.inner.client.delete(url)).await
    }

    /// Upload a file as `multipart/form-data` under [`UPLOAD_FIELD`].
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, an invalid MIME type, non-2xx
    /// status or undecodable body.
    #[instrument(skip(self, file), fields(endpoint = %endpoint, file_name = %file.file_name, size = file.bytes.len()))]
    pub async fn upload<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        file: UploadFile,
    ) -> Result<T, ApiError> {
        let url = self.endpoint_url(endpoint, &[])?;
        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(mime) = &file.mime {
            part = part.mime_str(mime)?;
        }
        let form = Form::new().part(UPLOAD_FIELD, part);
        self.execute(self.inner.client.post(url).multipart(form)).await
    }

    /// Attach the session token, send, and decode.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let request = match self.inner.session.token() {
            Some(token) => request.header(AUTHORIZATION, token.expose_secret()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = ApiError::from_status(status.as_u16(), &body);
            tracing::warn!(status = status.as_u16(), error = %error, "Backend rejected request");
            return Err(error);
        }

        // Some endpoints answer 2xx with an empty body.
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("api_path", &self.inner.api_path)
            .finish_non_exhaustive()
    }
}
