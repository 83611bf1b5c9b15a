//! Admin endpoints of the backend.
//!
//! [`AdminApi`] is the seam the console controllers are written against;
//! [`AdminClient`] implements it over the shared [`ApiClient`]. Tests swap in
//! an in-memory implementation.

use std::future::Future;

use hexmart_api::response::{DataEnvelope, message_list};
use hexmart_api::{ActionResponse, ApiClient, ApiError, SessionStore, UploadFile};
use hexmart_core::{Credentials, ProductDraft, ProductId, ProductPage};
use serde::Deserialize;
use tracing::instrument;

/// Response to `POST admin/signin`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SigninResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "message_list")]
    pub message: Vec<String>,
    pub token: Option<String>,
    /// Token expiry in unix milliseconds.
    pub expired: Option<i64>,
}

/// Response to `POST admin/upload`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
}

/// Operations the admin console needs from the backend.
pub trait AdminApi: Send + Sync + 'static {
    /// Cookie store the transport reads its token from.
    fn session(&self) -> &SessionStore;

    fn signin(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<SigninResponse, ApiError>> + Send;

    /// Confirm the current token with the backend.
    fn check(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn list_products(&self, page: u32)
    -> impl Future<Output = Result<ProductPage, ApiError>> + Send;

    fn create_product(
        &self,
        draft: &ProductDraft,
    ) -> impl Future<Output = Result<ActionResponse, ApiError>> + Send;

    fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> impl Future<Output = Result<ActionResponse, ApiError>> + Send;

    fn delete_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<ActionResponse, ApiError>> + Send;

    fn upload_image(
        &self,
        file: UploadFile,
    ) -> impl Future<Output = Result<UploadResponse, ApiError>> + Send;
}

/// [`AdminApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct AdminClient {
    api: ApiClient,
}

impl AdminClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }
}

impl AdminApi for AdminClient {
    fn session(&self) -> &SessionStore {
        self.api.session()
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn signin(&self, credentials: &Credentials) -> Result<SigninResponse, ApiError> {
        self.api.post("admin/signin", credentials).await
    }

    #[instrument(skip(self))]
    async fn check(&self) -> Result<(), ApiError> {
        let response: ActionResponse = self.api.get("admin/check", &[]).await?;
        if response.success {
            Ok(())
        } else {
            Err(ApiError::Unauthorized {
                status: 200,
                messages: response.message,
            })
        }
    }

    #[instrument(skip(self))]
    async fn list_products(&self, page: u32) -> Result<ProductPage, ApiError> {
        self.api
            .get("admin/products", &[("page", page.to_string())])
            .await
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    async fn create_product(&self, draft: &ProductDraft) -> Result<ActionResponse, ApiError> {
        let response: ActionResponse = self
            .api
            .post("admin/product", &DataEnvelope { data: draft })
            .await?;
        response.accepted()
    }

    #[instrument(skip(self, draft), fields(product_id = %id))]
    async fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<ActionResponse, ApiError> {
        let response: ActionResponse = self
            .api
            .put(&format!("admin/product/{id}"), &DataEnvelope { data: draft })
            .await?;
        response.accepted()
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: &ProductId) -> Result<ActionResponse, ApiError> {
        let response: ActionResponse = self.api.delete(&format!("admin/product/{id}")).await?;
        response.accepted()
    }

    #[instrument(skip(self, file), fields(file_name = %file.file_name))]
    async fn upload_image(&self, file: UploadFile) -> Result<UploadResponse, ApiError> {
        self.api.upload("admin/upload", file).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signin_response() {
        let ok: SigninResponse = serde_json::from_value(json!({
            "success": true,
            "message": "登入成功",
            "uid": "u1",
            "token": "tok",
            "expired": 1_700_000_000_000_i64
        }))
        .unwrap();
        assert!(ok.success);
        assert_eq!(ok.token.as_deref(), Some("tok"));
        assert_eq!(ok.expired, Some(1_700_000_000_000));
        assert_eq!(ok.message, vec!["登入成功".to_string()]);
    }

    #[test]
    fn test_upload_response() {
        let response: UploadResponse =
            serde_json::from_value(json!({"success": true, "imageUrl": "https://img/1.png"}))
                .unwrap();
        assert_eq!(response.image_url.as_deref(), Some("https://img/1.png"));
    }

    #[test]
    fn test_data_envelope_wraps_draft() {
        let mut draft = ProductDraft::empty();
        draft.title = "Tea".to_string();
        let body = serde_json::to_value(DataEnvelope { data: &draft }).unwrap();
        assert_eq!(body["data"]["title"], json!("Tea"));
    }
}
