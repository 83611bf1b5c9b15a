//! Star rating attached to a product.

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between 1 and 5 stars (got {got})")]
pub struct RatingError {
    /// The rejected value.
    pub got: i64,
}

/// A 1–5 star rating.
///
/// There is no zero: an unrated product has no `Rating` at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest selectable star.
    pub const MIN: u8 = 1;
    /// Highest selectable star.
    pub const MAX: u8 = 5;

    /// Build a rating from a star index.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError`] when `stars` is outside `1..=5`.
    pub fn new(stars: i64) -> Result<Self, RatingError> {
        u8::try_from(stars)
            .ok()
            .filter(|s| (Self::MIN..=Self::MAX).contains(s))
            .map(Self)
            .ok_or(RatingError { got: stars })
    }

    /// Number of filled stars.
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_one_through_five() {
        for stars in 1..=5 {
            assert_eq!(Rating::new(stars).unwrap().stars(), u8::try_from(stars).unwrap());
        }
    }

    #[test]
    fn test_rejects_zero_and_out_of_range() {
        assert_eq!(Rating::new(0), Err(RatingError { got: 0 }));
        assert!(Rating::new(6).is_err());
        assert!(Rating::new(-1).is_err());
        assert!(serde_json::from_str::<Rating>("0").is_err());
    }
}
