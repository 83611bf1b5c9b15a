//! Shopping cart: response normalization, totals and the cart view.

pub mod normalize;
pub mod totals;
pub mod view;

pub use normalize::{CartItem, normalize_cart};
pub use totals::CartTotals;
pub use view::{CartSnapshot, CartState, CartView};
