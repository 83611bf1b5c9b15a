//! Subtotal, shipping and total for the cart page.

use rust_decimal::Decimal;

use super::normalize::CartItem;

/// Orders strictly above this ship free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(2000, 0, 0, false, 0);
/// Flat shipping fee below the threshold.
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(120, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    #[must_use]
    pub fn from_items(items: &[CartItem]) -> Self {
        Self::from_subtotal(items.iter().map(CartItem::line_total).sum())
    }

    /// Empty carts and carts above the threshold ship free.
    #[must_use]
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        let shipping = if subtotal > FREE_SHIPPING_THRESHOLD || subtotal.is_zero() {
            Decimal::ZERO
        } else {
            SHIPPING_FEE
        };
        Self {
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }
}
