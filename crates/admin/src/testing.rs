//! In-memory [`AdminApi`] for controller tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use hexmart_api::{ActionResponse, ApiError, SessionStore, UploadFile};
use hexmart_core::{Credentials, Pagination, Product, ProductDraft, ProductId, ProductPage};
use secrecy::SecretString;
use serde_json::json;

use crate::api::{AdminApi, SigninResponse, UploadResponse};

/// A canned backend that records every call.
#[derive(Clone)]
pub struct FakeAdmin {
    state: Arc<Mutex<FakeState>>,
    session: SessionStore,
}

#[derive(Default)]
struct FakeState {
    password: String,
    check_failure: Option<u16>,
    pages: HashMap<u32, ProductPage>,
    page_delays: HashMap<u32, Duration>,
    list_failure: Option<u16>,
    mutation_failure: Option<(u16, String)>,
    upload_failure: Option<u16>,
    upload_url: Option<String>,
    calls: Vec<String>,
    submitted: Vec<ProductDraft>,
}

pub fn product(id: &str, title: &str) -> Product {
    serde_json::from_value(json!({
        "id": id,
        "title": title,
        "category": "tea",
        "unit": "box",
        "origin_price": 80,
        "price": 100,
        "is_enabled": 1,
        "imageUrl": ""
    }))
    .unwrap()
}

pub fn page_of(current_page: u32, total_pages: u32, titles: &[&str]) -> ProductPage {
    ProductPage {
        products: titles
            .iter()
            .enumerate()
            .map(|(i, title)| product(&format!("p{current_page}-{i}"), title))
            .collect(),
        pagination: Pagination {
            total_pages,
            current_page,
            has_pre: current_page > 1,
            has_next: current_page < total_pages,
            category: None,
        },
    }
}

impl FakeAdmin {
    pub fn new() -> Self {
        let state = FakeState {
            password: "hunter22".to_string(),
            upload_url: Some("https://img.example/uploaded.png".to_string()),
            ..FakeState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            session: SessionStore::in_memory("hexToken"),
        }
    }

    /// Seed the cookie as if a previous login had stored it.
    pub fn signed_in(self) -> Self {
        self.session
            .set(
                SecretString::from("seeded-token"),
                Utc::now() + chrono::Duration::hours(1),
            )
            .unwrap();
        self
    }

    pub fn with_page(self, page: ProductPage) -> Self {
        let number = page.pagination.current_page;
        self.state.lock().unwrap().pages.insert(number, page);
        self
    }

    pub fn delay_page(&self, page: u32, delay: Duration) {
        self.state.lock().unwrap().page_delays.insert(page, delay);
    }

    pub fn fail_list(&self, status: Option<u16>) {
        self.state.lock().unwrap().list_failure = status;
    }

    pub fn fail_check(&self, status: Option<u16>) {
        self.state.lock().unwrap().check_failure = status;
    }

    pub fn fail_mutations(&self, failure: Option<(u16, &str)>) {
        self.state.lock().unwrap().mutation_failure =
            failure.map(|(status, body)| (status, body.to_string()));
    }

    pub fn fail_upload(&self, status: Option<u16>) {
        self.state.lock().unwrap().upload_failure = status;
    }

    pub fn reject_upload_silently(&self) {
        self.state.lock().unwrap().upload_url = None;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn submitted(&self) -> Vec<ProductDraft> {
        self.state.lock().unwrap().submitted.clone()
    }

    fn mutation(&self, call: String, draft: Option<&ProductDraft>) -> Result<ActionResponse, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some((status, body)) = &state.mutation_failure {
            return Err(ApiError::from_status(*status, body));
        }
        if let Some(draft) = draft {
            state.submitted.push(draft.clone());
        }
        Ok(ActionResponse::default())
    }
}

impl AdminApi for FakeAdmin {
    fn session(&self) -> &SessionStore {
        &self.session
    }

    async fn signin(&self, credentials: &Credentials) -> Result<SigninResponse, ApiError> {
        use secrecy::ExposeSecret;

        let expected = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("signin {}", credentials.username));
            state.password.clone()
        };
        if credentials.password.expose_secret() == expected {
            Ok(SigninResponse {
                success: true,
                message: vec!["登入成功".to_string()],
                token: Some("fresh-token".to_string()),
                expired: Some((Utc::now() + chrono::Duration::days(1)).timestamp_millis()),
            })
        } else {
            Err(ApiError::from_status(
                400,
                r#"{"success":false,"message":"登入失敗"}"#,
            ))
        }
    }

    async fn check(&self) -> Result<(), ApiError> {
        let failure = {
            let mut state = self.state.lock().unwrap();
            state.calls.push("check".to_string());
            state.check_failure
        };
        match failure {
            Some(status) => Err(ApiError::from_status(status, r#"{"message":"請重新登入"}"#)),
            None => Ok(()),
        }
    }

    async fn list_products(&self, page: u32) -> Result<ProductPage, ApiError> {
        let (delay, failure, result) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("list {page}"));
            (
                state.page_delays.get(&page).copied(),
                state.list_failure,
                state.pages.get(&page).cloned(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = failure {
            return Err(ApiError::from_status(status, "{}"));
        }
        Ok(result.unwrap_or_else(|| page_of(page, page, &[])))
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<ActionResponse, ApiError> {
        self.mutation(format!("create {}", draft.title), Some(draft))
    }

    async fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<ActionResponse, ApiError> {
        self.mutation(format!("update {id}"), Some(draft))
    }

    async fn delete_product(&self, id: &ProductId) -> Result<ActionResponse, ApiError> {
        self.mutation(format!("delete {id}"), None)
    }

    async fn upload_image(&self, file: UploadFile) -> Result<UploadResponse, ApiError> {
        let (failure, url) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("upload {}", file.file_name));
            (state.upload_failure, state.upload_url.clone())
        };
        if let Some(status) = failure {
            return Err(ApiError::from_status(status, "{}"));
        }
        Ok(UploadResponse {
            success: url.is_some(),
            image_url: url,
        })
    }
}
