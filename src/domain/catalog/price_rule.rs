//! Price rules - the priced applicability windows attached to a package.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, PackageId, PriceRuleId, Timestamp, ValidationError};

/// Set of weekdays a category rule applies to.
///
/// Day numbering follows the stored representation: 0 = Sunday through
/// 6 = Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaySet(u8);

impl DaySet {
    /// Builds a day set from day numbers (0-6), rejecting out-of-range days.
    pub fn from_days(days: &[u8]) -> Result<Self, ValidationError> {
        let mut mask = 0u8;
        for &day in days {
            if day > 6 {
                return Err(ValidationError::out_of_range("day", 0, 6, day as i32));
            }
            mask |= 1 << day;
        }
        Ok(Self(mask))
    }

    /// Default weekday set: Monday through Thursday.
    pub fn default_weekday() -> Self {
        Self::from_days(&[1, 2, 3, 4]).expect("static days are in range")
    }

    /// Default weekend set: Friday, Saturday, Sunday.
    pub fn default_weekend() -> Self {
        Self::from_days(&[5, 6, 0]).expect("static days are in range")
    }

    /// Returns true if the set contains the given day number (0 = Sunday).
    pub fn contains(&self, day: u8) -> bool {
        day <= 6 && self.0 & (1 << day) != 0
    }

    /// Returns true if the set contains the weekday of the given date.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(chrono::Datelike::weekday(&date).num_days_from_sunday() as u8)
    }

    /// Returns the contained day numbers in ascending order.
    pub fn days(&self) -> Vec<u8> {
        (0..7).filter(|d| self.contains(*d)).collect()
    }

    /// Returns true if no day is contained.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// The applicability window of a price rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceRuleKind {
    /// Weekly weekday-category rule.
    Weekday { days: DaySet },

    /// Weekly weekend-category rule.
    Weekend { days: DaySet },

    /// Explicit date-range override, both endpoints inclusive.
    DateRange { start: NaiveDate, end: NaiveDate },
}

/// A priced applicability window attached to a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRule {
    /// Rule identifier.
    pub id: PriceRuleId,

    /// Owning package.
    pub package_id: PackageId,

    /// Price charged when this rule applies, in minor units.
    pub price: Money,

    /// Applicability window.
    pub kind: PriceRuleKind,

    /// When the rule was created; the tie-break for overlapping ranges.
    pub created_at: Timestamp,
}

impl PriceRule {
    /// Creates a weekday-category rule.
    pub fn weekday(package_id: PackageId, price: Money, days: DaySet) -> Self {
        Self {
            id: PriceRuleId::new(),
            package_id,
            price,
            kind: PriceRuleKind::Weekday { days },
            created_at: Timestamp::now(),
        }
    }

    /// Creates a weekend-category rule.
    pub fn weekend(package_id: PackageId, price: Money, days: DaySet) -> Self {
        Self {
            id: PriceRuleId::new(),
            package_id,
            price,
            kind: PriceRuleKind::Weekend { days },
            created_at: Timestamp::now(),
        }
    }

    /// Creates a date-range override rule.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `end` is before `start`.
    pub fn date_range(
        package_id: PackageId,
        price: Money,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::invalid_format(
                "end_date",
                format!("end date {} is before start date {}", end, start),
            ));
        }
        Ok(Self {
            id: PriceRuleId::new(),
            package_id,
            price,
            kind: PriceRuleKind::DateRange { start, end },
            created_at: Timestamp::now(),
        })
    }

    /// Returns true for a date-range rule whose window contains `date`.
    pub fn covers_date(&self, date: NaiveDate) -> bool {
        match self.kind {
            PriceRuleKind::DateRange { start, end } => start <= date && date <= end,
            _ => false,
        }
    }
}
