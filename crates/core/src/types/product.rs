//! Catalog product records and the editable draft.
//!
//! The backend speaks a loose JSON dialect: prices are numbers (occasionally
//! strings), `is_enabled` is `0`/`1`, and `imagesUrl` may be missing entirely.
//! [`Product`] absorbs that looseness on the way in; [`ProductDraft`] is the
//! shape the editor mutates and submits back as `{ "data": draft }`.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;
use super::pagination::Pagination;
use super::price::parse_amount;
use super::rating::Rating;

/// A product as returned by the admin or public list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub origin_price: Decimal,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_enabled: EnabledFlag,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    /// Secondary images. `None` when the backend omitted the field.
    #[serde(rename = "imagesUrl", default, skip_serializing_if = "Option::is_none")]
    pub images_url: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_rating", skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    /// Fields this client does not model, kept so an edit round-trips them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of products together with its pagination block.
///
/// Both halves arrive in the same response and are only ever replaced
/// together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Published/unpublished flag, `0`/`1` on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EnabledFlag {
    #[default]
    Disabled,
    Enabled,
}

impl EnabledFlag {
    /// Checkbox coercion: checked is `1`, unchecked is `0`.
    #[must_use]
    pub const fn from_checked(checked: bool) -> Self {
        if checked { Self::Enabled } else { Self::Disabled }
    }

    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Disabled => 0,
            Self::Enabled => 1,
        }
    }
}

impl Serialize for EnabledFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for EnabledFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let checked = match value {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Value::String(s) => !s.is_empty() && s != "0",
            Value::Null => false,
            other => {
                return Err(serde::de::Error::custom(format!(
                    "expected 0/1 for is_enabled, got {other}"
                )));
            }
        };
        Ok(Self::from_checked(checked))
    }
}

/// The in-progress copy of a product being created or edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub unit: String,
    /// `None` is the blank input, sent as `""`.
    #[serde(default, with = "blank_amount")]
    pub origin_price: Option<Decimal>,
    #[serde(default, with = "blank_amount")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_enabled: EnabledFlag,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    #[serde(rename = "imagesUrl", default)]
    pub images_url: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductDraft {
    /// The blank template used by "create product".
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A full copy of `product`, with a missing image list read as empty.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: Some(product.id.clone()),
            title: product.title.clone(),
            category: product.category.clone(),
            unit: product.unit.clone(),
            origin_price: Some(product.origin_price),
            price: Some(product.price),
            description: product.description.clone(),
            content: product.content.clone(),
            is_enabled: product.is_enabled,
            image_url: product.image_url.clone(),
            images_url: product.images_url.clone().unwrap_or_default(),
            rating: product.rating,
            extra: product.extra.clone(),
        }
    }
}

/// Form field names as they appear in the editor's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductField {
    Title,
    Category,
    Unit,
    OriginPrice,
    Price,
    Description,
    Content,
    IsEnabled,
    ImageUrl,
}

impl ProductField {
    /// Wire/input name of the field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Category => "category",
            Self::Unit => "unit",
            Self::OriginPrice => "origin_price",
            Self::Price => "price",
            Self::Description => "description",
            Self::Content => "content",
            Self::IsEnabled => "is_enabled",
            Self::ImageUrl => "imageUrl",
        }
    }

    /// Numeric inputs coerce `""` to blank and everything else to a number.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::OriginPrice | Self::Price)
    }

    /// Checkbox inputs coerce to `1`/`0`.
    #[must_use]
    pub const fn is_checkbox(self) -> bool {
        matches!(self, Self::IsEnabled)
    }
}

impl std::fmt::Display for ProductField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProductField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "category" => Ok(Self::Category),
            "unit" => Ok(Self::Unit),
            "origin_price" => Ok(Self::OriginPrice),
            "price" => Ok(Self::Price),
            "description" => Ok(Self::Description),
            "content" => Ok(Self::Content),
            "is_enabled" => Ok(Self::IsEnabled),
            "imageUrl" | "image_url" => Ok(Self::ImageUrl),
            _ => Err(format!("unknown product field: {s}")),
        }
    }
}

fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(parse_amount(&value).unwrap_or_default())
}

fn lenient_rating<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Rating>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_i64().and_then(|stars| Rating::new(stars).ok()))
}

/// `Option<Decimal>` where `None` is the empty string on the wire.
mod blank_amount {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    use crate::types::price::parse_amount;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(amount) => Serialize::serialize(amount, serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::Null => Ok(None),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            other => parse_amount(other)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {other}"))),
        }
    }
}
