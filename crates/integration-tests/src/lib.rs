//! End-to-end tests for Hexmart.
//!
//! [`FakeBackend`] is an in-process axum server speaking the same endpoints
//! as the real backend. Tests point the real reqwest-based clients at it and
//! inspect what it received.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hexmart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `admin_console` - sign-in, product CRUD and image upload through `AdminConsole`
//! - `storefront_cart` - cart envelopes, quantity updates and totals
//! - `storefront_catalog` - public catalog paging, caching and add-to-cart

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use hexmart_admin::AdminClient;
use hexmart_api::{ApiClient, ClientConfig, SessionStore};
use hexmart_storefront::StorefrontClient;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Path segment after `/api/`.
pub const API_PATH: &str = "tea-shop";

/// Password the fake accepts at sign-in.
pub const ADMIN_PASSWORD: &str = "hunter22";

/// Token handed out by a successful sign-in.
pub const ADMIN_TOKEN: &str = "tok-7f3a";

/// Products per page on both list endpoints.
pub const PER_PAGE: usize = 2;

const API_PREFIX: &str = "/api/tea-shop";

/// One request as seen by the fake, relative to `/api/{path}/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

/// A JSON body the fake received.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
}

/// A multipart field the upload endpoint received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedField {
    pub name: String,
    pub file_name: Option<String>,
    pub size: usize,
}

#[derive(Default)]
struct BackendState {
    products: Vec<Value>,
    next_id: u32,
    cart: Value,
    sessions_revoked: bool,
    fail_cart_mutations: bool,
    empty_acks: bool,
    requests: Vec<RecordedRequest>,
    payloads: Vec<Payload>,
    uploads: Vec<UploadedField>,
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An in-process backend bound to `127.0.0.1:0`.
///
/// The server task is aborted when this is dropped.
pub struct FakeBackend {
    base_url: String,
    state: Shared,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Bind to a free port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            cart: json!({ "success": true, "data": { "carts": [] } }),
            next_id: 1,
            ..BackendState::default()
        }));

        let api = Router::new()
            .route("/admin/signin", post(signin))
            .route("/admin/check", get(check))
            .route("/admin/products", get(admin_products))
            .route("/admin/product", post(create_product))
            .route("/admin/product/{id}", put(update_product).delete(delete_product))
            .route("/admin/upload", post(upload))
            .route("/products", get(public_products))
            .route("/product/{id}", get(public_product))
            .route("/cart", get(cart).post(add_to_cart))
            .route("/cart/{id}", put(update_cart).delete(remove_cart));

        let app = Router::new()
            .nest(API_PREFIX, api)
            .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener
            .local_addr()
            .expect("Fake backend has no local address");

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake backend stopped");
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            server,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the bound address is not a valid base URL.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::for_base_url(&self.base_url, API_PATH).expect("Invalid fake backend URL")
    }

    /// An API client with its own in-memory session.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn api_client(&self, session: SessionStore) -> ApiClient {
        ApiClient::new(&self.config(), session).expect("Failed to build API client")
    }

    /// Admin client without a session.
    #[must_use]
    pub fn admin(&self) -> AdminClient {
        AdminClient::new(self.api_client(SessionStore::in_memory(self.config().cookie_name)))
    }

    /// Admin client whose session holds `token`, valid for a day.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory session rejects the cookie.
    #[must_use]
    pub fn admin_with_token(&self, token: &str) -> AdminClient {
        let session = SessionStore::in_memory(self.config().cookie_name);
        session
            .set(SecretString::from(token.to_string()), Utc::now() + Duration::days(1))
            .expect("Failed to store session cookie");
        AdminClient::new(self.api_client(session))
    }

    /// Storefront client (no session).
    #[must_use]
    pub fn storefront(&self) -> StorefrontClient {
        StorefrontClient::new(self.api_client(SessionStore::in_memory(self.config().cookie_name)))
    }

    // =========================================================================
    // Backend data
    // =========================================================================

    /// Add products with the given titles and categories. Ids are `p-1`, `p-2`, ...
    pub fn seed_products(&self, products: &[(&str, &str)]) {
        let mut state = lock(&self.state);
        for (title, category) in products {
            let id = format!("p-{}", state.next_id);
            state.next_id += 1;
            state.products.push(json!({
                "id": id,
                "title": title,
                "category": category,
                "unit": "盒",
                "origin_price": 500,
                "price": 400,
                "description": "",
                "content": "",
                "is_enabled": 1,
                "imageUrl": "",
            }));
        }
    }

    /// The stored products, in list order.
    #[must_use]
    pub fn products(&self) -> Vec<Value> {
        lock(&self.state).products.clone()
    }

    /// Replace the body `GET cart` returns.
    pub fn set_cart(&self, body: Value) {
        lock(&self.state).cart = body;
    }

    /// Reject every admin token from now on.
    pub fn revoke_sessions(&self) {
        lock(&self.state).sessions_revoked = true;
    }

    /// Answer cart mutations with a 500.
    pub fn fail_cart_mutations(&self) {
        lock(&self.state).fail_cart_mutations = true;
    }

    /// Acknowledge updates and deletes with `204 No Content`.
    pub fn ack_with_no_content(&self) {
        lock(&self.state).empty_acks = true;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// How many `method path` requests arrived.
    #[must_use]
    pub fn count(&self, method: &str, path: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    #[must_use]
    pub fn payloads(&self) -> Vec<Payload> {
        lock(&self.state).payloads.clone()
    }

    #[must_use]
    pub fn uploads(&self) -> Vec<UploadedField> {
        lock(&self.state).uploads.clone()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let uri = request.uri();
    let path = uri.path();
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        path: path
            .strip_prefix(API_PREFIX)
            .unwrap_or(path)
            .trim_start_matches('/')
            .to_string(),
        query: uri.query().map(str::to_string),
        authorization: header(request.headers()),
    };
    lock(&state).requests.push(recorded);
    next.run(request).await
}

fn header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn authorized(state: &Shared, headers: &HeaderMap) -> bool {
    !lock(state).sessions_revoked && header(headers).as_deref() == Some(ADMIN_TOKEN)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": "驗證錯誤, 請重新登入" })),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "找不到產品" })),
    )
        .into_response()
}

fn done(message: &str) -> Response {
    Json(json!({ "success": true, "message": message })).into_response()
}

/// `done`, or an empty 204 when the backend is set to answer that way.
fn ack(state: &Shared, message: &str) -> Response {
    if lock(state).empty_acks {
        StatusCode::NO_CONTENT.into_response()
    } else {
        done(message)
    }
}

fn save_payload(state: &Shared, method: &'static str, path: String, body: &Value) {
    lock(state).payloads.push(Payload {
        method,
        path,
        body: body.clone(),
    });
}

/// `{products, pagination}` for one page of `products`.
fn page_of(products: &[Value], requested: u32, category: Option<&str>) -> Value {
    let total_pages = products.len().div_ceil(PER_PAGE).max(1);
    let current = usize::try_from(requested).unwrap_or(1).clamp(1, total_pages);
    let page: Vec<Value> = products
        .iter()
        .skip((current - 1) * PER_PAGE)
        .take(PER_PAGE)
        .cloned()
        .collect();
    json!({
        "success": true,
        "products": page,
        "pagination": {
            "total_pages": total_pages,
            "current_page": current,
            "has_pre": current > 1,
            "has_next": current < total_pages,
            "category": category.unwrap_or(""),
        },
        "messages": [],
    })
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<u32>,
    category: Option<String>,
}

async fn signin(Json(body): Json<Value>) -> Response {
    if body.get("password").and_then(Value::as_str) == Some(ADMIN_PASSWORD) {
        let expires = Utc::now() + Duration::days(1);
        Json(json!({
            "success": true,
            "message": "登入成功",
            "uid": "admin-1",
            "token": ADMIN_TOKEN,
            "expired": expires.timestamp_millis(),
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": "登入失敗", "error": { "code": "auth/wrong-password" } })),
        )
            .into_response()
    }
}

async fn check(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if authorized(&state, &headers) {
        Json(json!({ "success": true, "uid": "admin-1" })).into_response()
    } else {
        unauthorized()
    }
}

async fn admin_products(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let products = lock(&state).products.clone();
    Json(page_of(&products, query.page.unwrap_or(1), None)).into_response()
}

async fn create_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    save_payload(&state, "POST", "admin/product".to_string(), &body);

    let mut data = body.get("data").cloned().unwrap_or(Value::Null);
    let has_title = data
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|title| !title.is_empty());
    if !has_title {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": ["title 屬性不得為空"] })),
        )
            .into_response();
    }

    let mut state = lock(&state);
    let id = format!("p-{}", state.next_id);
    state.next_id += 1;
    data["id"] = Value::String(id);
    state.products.push(data);
    drop(state);
    done("已建立產品")
}

async fn update_product(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&shared, &headers) {
        return unauthorized();
    }
    save_payload(&shared, "PUT", format!("admin/product/{id}"), &body);

    let mut data = body.get("data").cloned().unwrap_or(Value::Null);
    data["id"] = Value::String(id.clone());
    let mut state = lock(&shared);
    let Some(slot) = state.products.iter_mut().find(|p| p["id"] == id.as_str()) else {
        return not_found();
    };
    *slot = data;
    drop(state);
    ack(&shared, "已更新產品")
}

async fn delete_product(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&shared, &headers) {
        return unauthorized();
    }
    let mut state = lock(&shared);
    let before = state.products.len();
    state.products.retain(|p| p["id"] != id.as_str());
    let removed = state.products.len() != before;
    drop(state);
    if removed { ack(&shared, "已刪除產品") } else { not_found() }
}

async fn upload(State(state): State<Shared>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }

    let mut image_url = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let size = match field.bytes().await {
            Ok(bytes) => bytes.len(),
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        };
        if let Some(file_name) = &file_name {
            image_url = Some(format!("https://img.example/{file_name}"));
        }
        lock(&state).uploads.push(UploadedField {
            name,
            file_name,
            size,
        });
    }

    Json(json!({ "success": true, "imageUrl": image_url })).into_response()
}

async fn public_products(State(state): State<Shared>, Query(query): Query<PageQuery>) -> Response {
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let products: Vec<Value> = lock(&state)
        .products
        .iter()
        .filter(|p| category.is_none_or(|c| p["category"] == c))
        .cloned()
        .collect();
    Json(page_of(&products, query.page.unwrap_or(1), category)).into_response()
}

async fn public_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let product = lock(&state)
        .products
        .iter()
        .find(|p| p["id"] == id.as_str())
        .cloned();
    match product {
        Some(product) => Json(json!({ "success": true, "product": product })).into_response(),
        None => not_found(),
    }
}

async fn cart(State(state): State<Shared>) -> Response {
    Json(lock(&state).cart.clone()).into_response()
}

fn cart_failure(state: &Shared) -> Option<Response> {
    lock(state).fail_cart_mutations.then(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "伺服器錯誤" })),
        )
            .into_response()
    })
}

async fn add_to_cart(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    save_payload(&state, "POST", "cart".to_string(), &body);
    cart_failure(&state).unwrap_or_else(|| done("已加入購物車"))
}

async fn update_cart(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    save_payload(&state, "PUT", format!("cart/{id}"), &body);
    cart_failure(&state).unwrap_or_else(|| ack(&state, "已更新購物車"))
}

async fn remove_cart(State(state): State<Shared>, Path(_id): Path<String>) -> Response {
    cart_failure(&state).unwrap_or_else(|| ack(&state, "已刪除"))
}
