//! Money amounts.
//!
//! Prices travel as plain JSON numbers in the store's single currency (NT$).
//! They are held as [`Decimal`] so cart arithmetic and the free-shipping
//! threshold compare exactly.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// Read an amount from a loosely-typed JSON value.
///
/// Accepts integers, floats and numeric strings; anything else is `None`.
#[must_use]
pub fn parse_amount(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Format an amount for display, e.g. `NT$1,234`.
///
/// Fractional digits are kept only when present.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let normalized = amount.normalize();
    let sign = if normalized.is_sign_negative() { "-" } else { "" };
    let text = normalized.abs().to_string();
    let (whole, fraction) = text.split_once('.').map_or((text.as_str(), None), |(w, f)| (w, Some(f)));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(f) => format!("{sign}NT${grouped}.{f}"),
        None => format!("{sign}NT${grouped}"),
    }
}
