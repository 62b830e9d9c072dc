//! Cart line quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// A cart line quantity, always at least 1.
///
/// A quantity of zero is not a value of this type: callers that receive a
/// signed amount from a client go through [`Quantity::from_signed`], where
/// `None` means "remove the line". This keeps zero rows out of the local
/// snapshot and out of the remote store.
///
/// ```
/// use bazaar_core::Quantity;
///
/// assert_eq!(Quantity::from_signed(3).map(Quantity::get), Some(3));
/// assert!(Quantity::from_signed(0).is_none());
/// assert!(Quantity::from_signed(-3).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity from an unsigned value. Returns `None` for zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        match NonZeroU32::new(value) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Create a quantity from a client-supplied signed value.
    ///
    /// Values `<= 0` yield `None`. Values above `u32::MAX` saturate.
    #[must_use]
    pub fn from_signed(value: i64) -> Option<Self> {
        if value <= 0 {
            return None;
        }
        let value = u32::try_from(value).unwrap_or(u32::MAX);
        Self::new(value)
    }

    /// The raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Add two quantities, saturating at `u32::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0.get()))
    }

    /// One more than `self`.
    #[must_use]
    pub const fn increment(self) -> Self {
        self.saturating_add(Self::ONE)
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.get()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_not_a_quantity() {
        assert!(Quantity::new(0).is_none());
        assert!(Quantity::from_signed(0).is_none());
        assert!(Quantity::from_signed(-3).is_none());
    }

    #[test]
    fn test_saturating_add() {
        let max = Quantity::new(u32::MAX).unwrap();
        assert_eq!(max.increment(), max);

        let three = Quantity::new(3).unwrap();
        let two = Quantity::new(2).unwrap();
        assert_eq!(three.saturating_add(two).get(), 5);
    }

    #[test]
    fn test_from_signed_saturates() {
        let q = Quantity::from_signed(i64::MAX).unwrap();
        assert_eq!(q.get(), u32::MAX);
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("4").unwrap().get(), 4);
    }
}
