//! Public and cart endpoints of the backend.
//!
//! Catalog reads are cached in memory for five minutes; cart calls always go
//! to the backend.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hexmart_api::response::DataEnvelope;
use hexmart_api::{ActionResponse, ApiClient, ApiError};
use hexmart_core::{CartItemId, Product, ProductId, ProductPage};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

/// How long catalog responses stay cached.
pub const CATALOG_CACHE_TTL: Duration = Duration::from_secs(300);

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Page { page: u32, category: Option<String> },
    Product(ProductId),
}

/// Cached catalog values.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Page(Arc<ProductPage>),
    Product(Box<Product>),
}

/// Body for cart mutations: `{ "product_id": …, "qty": … }` inside `data`.
///
/// `product_id` is copied from the server's cart record and omitted when the
/// record has none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Value>,
    pub qty: u32,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    product: Product,
}

/// Operations the storefront needs from the backend.
pub trait StorefrontApi: Send + Sync + 'static {
    fn list_products(
        &self,
        page: u32,
        category: Option<&str>,
    ) -> impl Future<Output = Result<Arc<ProductPage>, ApiError>> + Send;

    fn product(&self, id: &ProductId) -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// Raw cart body. Its shape varies; see [`crate::cart::normalize`].
    fn cart(&self) -> impl Future<Output = Result<Value, ApiError>> + Send;

    fn add_to_cart(
        &self,
        line: &CartLine,
    ) -> impl Future<Output = Result<ActionResponse, ApiError>> + Send;

    fn update_cart_item(
        &self,
        id: &CartItemId,
        line: &CartLine,
    ) -> impl Future<Output = Result<ActionResponse, ApiError>> + Send;

    fn remove_cart_item(
        &self,
        id: &CartItemId,
    ) -> impl Future<Output = Result<ActionResponse, ApiError>> + Send;
}

/// [`StorefrontApi`] over HTTP with a catalog cache.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    api: ApiClient,
    cache: Cache<CacheKey, CacheValue>,
}

impl StorefrontClient {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CATALOG_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(StorefrontClientInner { api, cache }),
        }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Drop every cached catalog response.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }
}

impl std::fmt::Debug for StorefrontClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontClient")
            .field("api", &self.inner.api)
            .field("cached", &self.inner.cache.entry_count())
            .finish()
    }
}

impl StorefrontApi for StorefrontClient {
    #[instrument(skip(self))]
    async fn list_products(
        &self,
        page: u32,
        category: Option<&str>,
    ) -> Result<Arc<ProductPage>, ApiError> {
        let cache_key = CacheKey::Page {
            page,
            category: category.map(str::to_string),
        };

        if let Some(CacheValue::Page(cached)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product page");
            return Ok(cached);
        }

        let mut query = vec![("page", page.to_string())];
        if let Some(category) = category {
            query.push(("category", category.to_string()));
        }
        let loaded: ProductPage = self.inner.api.get("products", &query).await?;
        let loaded = Arc::new(loaded);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Page(Arc::clone(&loaded)))
            .await;

        Ok(loaded)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(cached)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*cached);
        }

        let response: ProductResponse = self.inner.api.get(&format!("product/{id}"), &[]).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(response.product.clone())))
            .await;

        Ok(response.product)
    }

    #[instrument(skip(self))]
    async fn cart(&self) -> Result<Value, ApiError> {
        self.inner.api.get("cart", &[]).await
    }

    #[instrument(skip(self, line))]
    async fn add_to_cart(&self, line: &CartLine) -> Result<ActionResponse, ApiError> {
        let response: ActionResponse = self
            .inner
            .api
            .post("cart", &DataEnvelope { data: line })
            .await?;
        response.accepted()
    }

    #[instrument(skip(self, line), fields(cart_item = %id, qty = line.qty))]
    async fn update_cart_item(
        &self,
        id: &CartItemId,
        line: &CartLine,
    ) -> Result<ActionResponse, ApiError> {
        let response: ActionResponse = self
            .inner
            .api
            .put(&format!("cart/{id}"), &DataEnvelope { data: line })
            .await?;
        response.accepted()
    }

    #[instrument(skip(self), fields(cart_item = %id))]
    async fn remove_cart_item(&self, id: &CartItemId) -> Result<ActionResponse, ApiError> {
        let response: ActionResponse = self.inner.api.delete(&format!("cart/{id}")).await?;
        response.accepted()
    }
}
