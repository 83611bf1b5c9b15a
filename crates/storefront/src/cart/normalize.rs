//! Cart response normalization.
//!
//! The cart endpoint has answered in several envelope shapes and field
//! spellings over time. Each is handled by an ordered list of extractors; the
//! first one that yields something wins. Field lookups use JavaScript
//! truthiness, so `null`, `""`, `0` and `false` fall through to the next
//! spelling.

use hexmart_core::{CartItemId, parse_amount};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;

/// One line of the cart, resolved from whatever shape the backend sent.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub id: CartItemId,
    pub title: String,
    pub price: Decimal,
    pub qty: u32,
    pub image_url: String,
    /// The record as received; mutations read `product_id` from here.
    pub raw: Value,
}

impl CartItem {
    /// `price × qty`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.qty)
    }

    /// `product_id` from the raw record, if present.
    #[must_use]
    pub fn product_id(&self) -> Option<Value> {
        self.raw
            .get("product_id")
            .filter(|value| !value.is_null())
            .cloned()
    }
}

type Envelope = fn(&Value) -> Option<&Vec<Value>>;

/// Envelope shapes, most specific first.
const ENVELOPES: &[(&str, Envelope)] = &[
    ("data.carts", data_carts),
    ("carts", top_level_carts),
    ("cart", top_level_cart),
];

const ID_PATHS: &[&[&str]] = &[&["id"], &["product_id"], &["id_cart"]];
const TITLE_PATHS: &[&[&str]] = &[&["product", "title"], &["title"], &["name"], &["product_name"]];
const PRICE_PATHS: &[&[&str]] = &[&["product", "price"], &["price"], &["unit_price"]];
const QTY_PATHS: &[&[&str]] = &[&["qty"], &["quantity"], &["count"]];
const IMAGE_PATHS: &[&[&str]] = &[&["product", "imageUrl"], &["imageUrl"], &["product", "image"]];

fn data_carts(body: &Value) -> Option<&Vec<Value>> {
    body.get("data")?.get("carts")?.as_array()
}

fn top_level_carts(body: &Value) -> Option<&Vec<Value>> {
    body.get("carts")?.as_array()
}

fn top_level_cart(body: &Value) -> Option<&Vec<Value>> {
    body.get("cart")?.as_array()
}

/// The cart records in `body`: the first non-empty envelope, or nothing.
#[must_use]
pub fn extract_records(body: &Value) -> &[Value] {
    for (shape, extract) in ENVELOPES {
        if let Some(records) = extract(body).filter(|records| !records.is_empty()) {
            tracing::debug!(shape, count = records.len(), "Cart envelope matched");
            return records;
        }
    }
    &[]
}

/// Normalize a whole cart response. Records without an id are skipped.
#[must_use]
pub fn normalize_cart(body: &Value) -> Vec<CartItem> {
    extract_records(body)
        .iter()
        .filter_map(|record| {
            let item = normalize_record(record);
            if item.is_none() {
                tracing::warn!(record = %record, "Skipping cart record without an id");
            }
            item
        })
        .collect()
}

/// Normalize one cart record. `None` when no id spelling is present.
#[must_use]
pub fn normalize_record(record: &Value) -> Option<CartItem> {
    let id = first_truthy(record, ID_PATHS, as_text)?;
    let title = first_truthy(record, TITLE_PATHS, as_text).unwrap_or_default();
    let price = first_truthy(record, PRICE_PATHS, parse_amount).unwrap_or_default();
    let qty = first_truthy(record, QTY_PATHS, as_quantity).unwrap_or(1);
    let image_url = first_truthy(record, IMAGE_PATHS, as_text).unwrap_or_default();

    Some(CartItem {
        id: CartItemId::new(id),
        title,
        price,
        qty,
        image_url,
        raw: record.clone(),
    })
}

/// JavaScript truthiness.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn lookup<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(record, |value, key| value.get(key))
}

/// First truthy value along `paths` that `convert` accepts.
fn first_truthy<T>(
    record: &Value,
    paths: &[&[&str]],
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    paths
        .iter()
        .filter_map(|path| lookup(record, path))
        .filter(|value| is_truthy(value))
        .find_map(convert)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_quantity(value: &Value) -> Option<u32> {
    parse_amount(value)?.trunc().to_u32().filter(|qty| *qty > 0)
}
