//! Admin console against the fake backend over real HTTP.
//!
//! These tests go through `AdminConsole` exactly as a UI would: sign in or
//! resume a session, page through products, fill the form and submit.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use hexmart_admin::console::{CREATE_SUCCESS, DELETE_SUCCESS, EDIT_SUCCESS};
use hexmart_admin::{AdminApi, AdminClient, AdminConsole, AuthError, ListState, Screen};
use hexmart_api::UploadFile;
use hexmart_core::{Credentials, Email, ProductId};
use hexmart_integration_tests::{ADMIN_PASSWORD, ADMIN_TOKEN, FakeBackend};
use rust_decimal::Decimal;

fn console(client: AdminClient) -> AdminConsole<AdminClient> {
    AdminConsole::new(Arc::new(client))
}

async fn signed_in(backend: &FakeBackend) -> AdminConsole<AdminClient> {
    let console = console(backend.admin_with_token(ADMIN_TOKEN));
    console.check_admin().await;
    assert_eq!(console.view().screen, Screen::Products);
    console
}

// =============================================================================
// Session gate
// =============================================================================

#[tokio::test]
async fn test_login_stores_token_and_enters_console() {
    let backend = FakeBackend::start().await;
    backend.seed_products(&[("Oolong", "茶葉"), ("Green", "茶葉"), ("Mug", "器具")]);
    let console = console(backend.admin());

    let credentials = Credentials::new(Email::parse("admin@shop.tw").unwrap(), ADMIN_PASSWORD);
    console.login(&credentials).await.unwrap();

    let view = console.view();
    assert_eq!(view.screen, Screen::Products);
    assert_eq!(view.login_message.unwrap().text(), "登入成功");
    assert!(console.api().session().is_present());

    let list = backend
        .requests()
        .into_iter()
        .find(|r| r.path == "admin/products")
        .unwrap();
    assert_eq!(list.authorization.as_deref(), Some(ADMIN_TOKEN));
    assert_eq!(list.query.as_deref(), Some("page=1"));

    let snapshot = console.products();
    assert_eq!(snapshot.state, ListState::Loaded);
    assert_eq!(snapshot.page.products.len(), 2);
    assert_eq!(snapshot.page.pagination.total_pages, 2);
}

#[tokio::test]
async fn test_wrong_password_shows_backend_message() {
    let backend = FakeBackend::start().await;
    let console = console(backend.admin());

    let credentials = Credentials::new(Email::parse("admin@shop.tw").unwrap(), "nope");
    let result = console.login(&credentials).await;

    assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    let view = console.view();
    assert_eq!(view.screen, Screen::Login);
    let message = view.login_message.unwrap();
    assert!(message.is_error());
    assert_eq!(message.text(), "登入失敗");
    assert!(!console.api().session().is_present());
}

#[tokio::test]
async fn test_rejected_token_shows_login_view() {
    let backend = FakeBackend::start().await;
    let console = console(backend.admin_with_token("tok-expired"));

    console.check_admin().await;

    assert_eq!(console.view().screen, Screen::Login);
    assert_eq!(backend.count("GET", "admin/check"), 1);
    assert_eq!(backend.count("GET", "admin/products"), 0);
}

#[tokio::test]
async fn test_missing_cookie_skips_check() {
    let backend = FakeBackend::start().await;
    let console = console(backend.admin());

    console.check_admin().await;

    assert_eq!(console.view().screen, Screen::Login);
    assert!(backend.requests().is_empty());
}

// =============================================================================
// Product list
// =============================================================================

#[tokio::test]
async fn test_change_page_fetches_once() {
    let backend = FakeBackend::start().await;
    backend.seed_products(&[("A", "x"), ("B", "x"), ("C", "x")]);
    let console = signed_in(&backend).await;

    assert!(console.change_page(2).await);
    assert!(!console.change_page(2).await);
    assert!(!console.change_page(3).await);

    let snapshot = console.products();
    assert_eq!(snapshot.page.pagination.current_page, 2);
    assert_eq!(snapshot.page.products[0].title, "C");
    assert_eq!(backend.count("GET", "admin/products"), 2);
}

#[tokio::test]
async fn test_revoked_session_fails_list_but_keeps_page() {
    let backend = FakeBackend::start().await;
    backend.seed_products(&[("A", "x"), ("B", "x"), ("C", "x")]);
    let console = signed_in(&backend).await;

    backend.revoke_sessions();
    assert!(console.change_page(2).await);

    let snapshot = console.products();
    assert_eq!(snapshot.state, ListState::Failed);
    assert_eq!(snapshot.page.products[0].title, "A");
}

// =============================================================================
// Create / edit / delete
// =============================================================================

#[tokio::test]
async fn test_create_tea() {
    let backend = FakeBackend::start().await;
    let console = signed_in(&backend).await;
    let fetches_before = backend.count("GET", "admin/products");

    console.open_create();
    console.edit_field("title", "Tea").unwrap();
    console.edit_field("price", "100").unwrap();
    console.edit_field("origin_price", "80").unwrap();
    console.edit_field("is_enabled", "true").unwrap();
    assert!(console.submit().await);

    assert_eq!(console.toasts().current().unwrap().message, CREATE_SUCCESS);
    assert_eq!(backend.count("GET", "admin/products") - fetches_before, 1);

    let payload = backend.payloads().pop().unwrap();
    assert_eq!(payload.path, "admin/product");
    let data = &payload.body["data"];
    assert_eq!(data["title"], "Tea");
    assert_eq!(data["price"].as_f64(), Some(100.0));
    assert_eq!(data["origin_price"].as_f64(), Some(80.0));
    assert_eq!(data["is_enabled"], 1);
    assert_eq!(data["imagesUrl"], serde_json::json!([]));

    let snapshot = console.products();
    assert_eq!(snapshot.page.products.len(), 1);
    assert_eq!(snapshot.page.products[0].title, "Tea");

    assert!(console.product_modal().is_open());
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert!(!console.product_modal().is_open());
}

#[tokio::test]
async fn test_create_rejected_keeps_form_and_shows_messages() {
    let backend = FakeBackend::start().await;
    let console = signed_in(&backend).await;
    let fetches_before = backend.count("GET", "admin/products");

    console.open_create();
    console.edit_field("price", "100").unwrap();
    assert!(!console.submit().await);

    let toast = console.toasts().current().unwrap();
    assert!(toast.is_error());
    assert_eq!(toast.message, "title 屬性不得為空");
    assert!(console.product_modal().is_open());
    assert_eq!(console.editor_draft().unwrap().price, Some(Decimal::from(100)));
    assert_eq!(backend.count("GET", "admin/products"), fetches_before);
}

#[tokio::test]
async fn test_edit_sends_put_with_full_draft() {
    let backend = FakeBackend::start().await;
    backend.seed_products(&[("Oolong", "茶葉")]);
    let console = signed_in(&backend).await;

    let product = console.products().page.products[0].clone();
    console.open_edit(&product);
    console.edit_field("price", "350").unwrap();
    assert!(console.submit().await);

    assert_eq!(console.toasts().current().unwrap().message, EDIT_SUCCESS);
    let payload = backend.payloads().pop().unwrap();
    assert_eq!(payload.method, "PUT");
    assert_eq!(payload.path, "admin/product/p-1");
    assert_eq!(payload.body["data"]["title"], "Oolong");
    assert_eq!(payload.body["data"]["price"].as_f64(), Some(350.0));
    assert_eq!(backend.products()[0]["price"].as_f64(), Some(350.0));
    assert_eq!(product.price, Decimal::from(400));
}

#[tokio::test]
async fn test_delete_refetches_list() {
    let backend = FakeBackend::start().await;
    backend.seed_products(&[("Oolong", "茶葉"), ("Green", "茶葉")]);
    let console = signed_in(&backend).await;

    let product = console.products().page.products[0].clone();
    console.request_delete(&product);
    assert_eq!(
        console.delete_dialog().title().as_deref(),
        Some("是否要刪除「Oolong」")
    );
    assert!(console.confirm_delete().await);

    assert_eq!(console.toasts().current().unwrap().message, DELETE_SUCCESS);
    assert!(console.delete_dialog().target().is_none());
    assert_eq!(backend.count("DELETE", "admin/product/p-1"), 1);
    let titles: Vec<_> = console
        .products()
        .page
        .products
        .iter()
        .map(|p| p.title.clone())
        .collect();
    assert_eq!(titles, vec!["Green".to_string()]);
}

#[tokio::test]
async fn test_delete_of_missing_product_keeps_dialog() {
    let backend = FakeBackend::start().await;
    backend.seed_products(&[("Oolong", "茶葉")]);
    let console = signed_in(&backend).await;

    let mut product = console.products().page.products[0].clone();
    product.id = ProductId::new("p-404");
    console.request_delete(&product);

    assert!(!console.confirm_delete().await);
    assert!(console.delete_dialog().target().is_some());
}

#[tokio::test]
async fn test_no_content_acks_count_as_success() {
    let backend = FakeBackend::start().await;
    backend.seed_products(&[("Oolong", "茶葉"), ("Green", "茶葉")]);
    backend.ack_with_no_content();
    let console = signed_in(&backend).await;

    let product = console.products().page.products[0].clone();
    console.open_edit(&product);
    console.edit_field("price", "350").unwrap();
    assert!(console.submit().await);
    assert_eq!(console.toasts().current().unwrap().message, EDIT_SUCCESS);

    console.request_delete(&product);
    assert!(console.confirm_delete().await);
    assert_eq!(console.toasts().current().unwrap().message, DELETE_SUCCESS);
    assert!(console.delete_dialog().target().is_none());
    assert_eq!(console.products().page.products[0].title, "Green");
}

// =============================================================================
// Image upload
// =============================================================================

#[tokio::test]
async fn test_upload_uses_form_field_and_appends_image() {
    let backend = FakeBackend::start().await;
    let console = signed_in(&backend).await;
    console.open_create();

    let file = UploadFile {
        file_name: "leaf.png".to_string(),
        mime: Some("image/png".to_string()),
        bytes: vec![0x89, b'P', b'N', b'G'],
    };
    assert!(console.add_image(file).await);

    let uploads = backend.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].name, "file-to-upload");
    assert_eq!(uploads[0].file_name.as_deref(), Some("leaf.png"));
    assert_eq!(uploads[0].size, 4);
    assert_eq!(
        backend.requests().last().unwrap().authorization.as_deref(),
        Some(ADMIN_TOKEN)
    );

    let draft = console.editor_draft().unwrap();
    assert_eq!(draft.images_url, vec!["https://img.example/leaf.png".to_string()]);
}

#[tokio::test]
async fn test_logout_then_check_goes_to_login() {
    let backend = FakeBackend::start().await;
    let console = signed_in(&backend).await;

    console.logout().unwrap();
    assert_eq!(console.view().screen, Screen::Login);
    assert!(!console.api().session().is_present());

    console.check_admin().await;
    assert_eq!(console.view().screen, Screen::Login);
    assert_eq!(backend.count("GET", "admin/check"), 1);
}
