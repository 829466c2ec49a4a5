//! Money value object in minor currency units.

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Non-negative monetary amount in minor currency units (cents).
///
/// All prices and purchase amounts in the system are carried in minor units
/// to avoid floating point drift; the payment gateway consumes the same
/// representation directly (`unit_amount`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Money = Money(0);

    /// Creates a money value from minor units, rejecting negative amounts.
    pub fn from_minor(minor: i64) -> Result<Self, ValidationError> {
        if minor < 0 {
            return Err(ValidationError::invalid_format(
                "amount",
                format!("amount must be non-negative, got {}", minor),
            ));
        }
        Ok(Self(minor))
    }

    /// Returns the amount in minor units.
    pub fn as_minor(&self) -> i64 {
        self.0
    }

    /// Saturating addition, used when totalling per-day quotes.
    pub fn saturating_add(&self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_minor_accepts_zero_and_positive() {
        assert_eq!(Money::from_minor(0).unwrap(), Money::ZERO);
        assert_eq!(Money::from_minor(12000).unwrap().as_minor(), 12000);
    }

    #[test]
    fn from_minor_rejects_negative() {
        assert!(Money::from_minor(-1).is_err());
    }

    #[test]
    fn display_shows_major_and_minor() {
        assert_eq!(Money::from_minor(12000).unwrap().to_string(), "120.00");
        assert_eq!(Money::from_minor(505).unwrap().to_string(), "5.05");
    }

    #[test]
    fn saturating_add_totals() {
        let a = Money::from_minor(100).unwrap();
        let b = Money::from_minor(250).unwrap();
        assert_eq!(a.saturating_add(b).as_minor(), 350);
    }
}
