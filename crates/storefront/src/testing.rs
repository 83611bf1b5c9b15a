//! In-memory [`StorefrontApi`] for controller tests.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use hexmart_api::{ActionResponse, ApiError};
use hexmart_core::{CartItemId, Pagination, Product, ProductId, ProductPage};
use serde_json::{Value, json};

use crate::api::{CartLine, StorefrontApi};

const TOTAL_PAGES: u32 = 3;

/// A public catalog page of two products.
pub fn catalog_page(page: u32, category: Option<&str>) -> ProductPage {
    let products = (0..2)
        .map(|i| {
            serde_json::from_value::<Product>(json!({
                "id": format!("p{page}-{i}"),
                "title": format!("Product {page}-{i}"),
                "category": category.unwrap_or("tea"),
                "price": 100,
                "is_enabled": 1
            }))
            .unwrap()
        })
        .collect();
    ProductPage {
        products,
        pagination: Pagination {
            total_pages: TOTAL_PAGES,
            current_page: page,
            has_pre: page > 1,
            has_next: page < TOTAL_PAGES,
            category: category.map(str::to_string),
        },
    }
}

/// A canned storefront backend that records every call.
#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<Mutex<StoreState>>,
}

#[derive(Default)]
struct StoreState {
    cart: Value,
    cart_delay: Duration,
    cart_failure: Option<u16>,
    mutation_failure: Option<u16>,
    calls: Vec<String>,
    adds: Vec<CartLine>,
    updates: Vec<(CartItemId, CartLine)>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cart(self, body: Value) -> Self {
        self.set_cart(body);
        self
    }

    pub fn set_cart(&self, body: Value) {
        self.state.lock().unwrap().cart = body;
    }

    pub fn delay_cart(&self, delay: Duration) {
        self.state.lock().unwrap().cart_delay = delay;
    }

    pub fn fail_cart(&self, status: Option<u16>) {
        self.state.lock().unwrap().cart_failure = status;
    }

    pub fn fail_mutations(&self, status: Option<u16>) {
        self.state.lock().unwrap().mutation_failure = status;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn cart_adds(&self) -> Vec<CartLine> {
        self.state.lock().unwrap().adds.clone()
    }

    pub fn cart_updates(&self) -> Vec<(CartItemId, CartLine)> {
        self.state.lock().unwrap().updates.clone()
    }

    fn mutation(&self, call: String) -> Result<ActionResponse, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.mutation_failure {
            Some(status) => Err(ApiError::from_status(status, "{}")),
            None => Ok(ActionResponse::default()),
        }
    }
}

impl StorefrontApi for FakeStore {
    async fn list_products(
        &self,
        page: u32,
        category: Option<&str>,
    ) -> Result<Arc<ProductPage>, ApiError> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(format!("products {page} {}", category.unwrap_or("-")));
        Ok(Arc::new(catalog_page(page, category)))
    }

    async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.state.lock().unwrap().calls.push(format!("product {id}"));
        (1..=TOTAL_PAGES)
            .flat_map(|page| catalog_page(page, None).products)
            .find(|product| &product.id == id)
            .ok_or_else(|| ApiError::from_status(404, r#"{"message":"找不到產品"}"#))
    }

    async fn cart(&self) -> Result<Value, ApiError> {
        let (delay, failure, body) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push("cart get".to_string());
            (state.cart_delay, state.cart_failure, state.cart.clone())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(status) => Err(ApiError::from_status(status, "{}")),
            None => Ok(body),
        }
    }

    async fn add_to_cart(&self, line: &CartLine) -> Result<ActionResponse, ApiError> {
        let response = self.mutation("cart add".to_string())?;
        self.state.lock().unwrap().adds.push(line.clone());
        Ok(response)
    }

    async fn update_cart_item(
        &self,
        id: &CartItemId,
        line: &CartLine,
    ) -> Result<ActionResponse, ApiError> {
        let response = self.mutation(format!("cart put {id}"))?;
        self.state
            .lock()
            .unwrap()
            .updates
            .push((id.clone(), line.clone()));
        Ok(response)
    }

    async fn remove_cart_item(&self, id: &CartItemId) -> Result<ActionResponse, ApiError> {
        self.mutation(format!("cart delete {id}"))
    }
}
