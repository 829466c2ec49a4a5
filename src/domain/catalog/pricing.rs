//! Pricing resolution - what a customer pays on a given calendar date.
//!
//! Resolution order: a date-range override wins over the weekly category
//! rules; among overlapping overrides the most recently created rule wins.
//! Category classification uses the day sets stored on the rules; the
//! legacy Fri/Sat/Sun mapping survives only as a fallback shim for rules
//! whose day sets do not claim the date.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{Money, PriceRuleId};

use super::package::Package;
use super::price_rule::{DaySet, PriceRule, PriceRuleKind};

/// Category under which a price was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceCategory {
    /// Weekly weekday rule applied.
    Weekday,
    /// Weekly weekend rule applied.
    Weekend,
    /// Date-range override applied.
    Special,
}

impl PriceCategory {
    /// Wire representation used in availability responses and metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceCategory::Weekday => "weekday",
            PriceCategory::Weekend => "weekend",
            PriceCategory::Special => "special",
        }
    }
}

/// A resolved price for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// The rule that produced this quote.
    pub rule_id: PriceRuleId,

    /// Price in minor units.
    pub price: Money,

    /// Category the date was resolved under.
    pub category: PriceCategory,
}

/// Per-day entry of a range resolution. `quote` is `None` when no rule
/// applies; callers must treat that as "unavailable", never as zero-price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayQuote {
    pub date: NaiveDate,
    pub quote: Option<PriceQuote>,
}

/// Ordered per-day quotes for an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeQuote {
    pub days: Vec<DayQuote>,
}

impl RangeQuote {
    /// Number of calendar days covered, endpoints inclusive.
    pub fn total_days(&self) -> usize {
        self.days.len()
    }

    /// Sum of prices over the priced days; unavailable days contribute
    /// nothing.
    pub fn total_price(&self) -> Money {
        self.days
            .iter()
            .filter_map(|d| d.quote.map(|q| q.price))
            .fold(Money::ZERO, |acc, p| acc.saturating_add(p))
    }
}

/// Errors from range resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("End date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// Day set of a category rule, if it is one.
fn category_days(rule: &PriceRule) -> Option<DaySet> {
    match rule.kind {
        PriceRuleKind::Weekday { days } | PriceRuleKind::Weekend { days } => Some(days),
        PriceRuleKind::DateRange { .. } => None,
    }
}

/// Legacy classification shim: Friday, Saturday, Sunday count as weekend.
fn legacy_is_weekend(day: u8) -> bool {
    matches!(day, 5 | 6 | 0)
}

impl Package {
    /// Resolves the applicable price rule for a calendar date.
    ///
    /// Priority order, first match wins:
    /// 1. A date-range rule whose inclusive window contains `date`. Among
    ///    overlapping windows the most recently created rule wins (rule id
    ///    as final tie-break, so resolution is fully deterministic).
    /// 2. The weekend rule, when its stored day set contains the date's
    ///    weekday; otherwise the weekday rule, when its day set does. The
    ///    weekend set is consulted first so the two sets behave like the
    ///    original branch order when both claim a day.
    /// 3. For dates claimed by neither stored set, the legacy Fri/Sat/Sun
    ///    mapping decides the category.
    ///
    /// Returns `None` when the package has no rule for the resolved
    /// category - the price is unavailable, not zero.
    pub fn resolve_price(&self, date: NaiveDate) -> Option<PriceQuote> {
        if let Some(rule) = self
            .price_rules
            .iter()
            .filter(|r| r.covers_date(date))
            .max_by_key(|r| (r.created_at, *r.id.as_uuid()))
        {
            return Some(PriceQuote {
                rule_id: rule.id,
                price: rule.price,
                category: PriceCategory::Special,
            });
        }

        let day = date.weekday().num_days_from_sunday() as u8;
        let weekend = self.weekend_rule();
        let weekday = self.weekday_rule();

        let weekend_claims = weekend
            .and_then(category_days)
            .map(|set| set.contains(day))
            .unwrap_or(false);
        let weekday_claims = weekday
            .and_then(category_days)
            .map(|set| set.contains(day))
            .unwrap_or(false);

        let chosen = if weekend_claims {
            weekend
        } else if weekday_claims {
            weekday
        } else if legacy_is_weekend(day) {
            weekend
        } else {
            weekday
        };

        chosen.map(|rule| PriceQuote {
            rule_id: rule.id,
            price: rule.price,
            category: match rule.kind {
                PriceRuleKind::Weekend { .. } => PriceCategory::Weekend,
                _ => PriceCategory::Weekday,
            },
        })
    }

    /// Resolves every calendar day in `[start, end]`, both endpoints
    /// inclusive, applying [`Package::resolve_price`] per day.
    ///
    /// Stateless and restartable; `start == end` yields exactly one entry.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::InvalidDateRange` if `end < start`.
    pub fn resolve_range(&self, start: NaiveDate, end: NaiveDate) -> Result<RangeQuote, PricingError> {
        if end < start {
            return Err(PricingError::InvalidDateRange { start, end });
        }

        let mut days = Vec::new();
        let mut current = start;
        while current <= end {
            days.push(DayQuote {
                date: current,
                quote: self.resolve_price(current),
            });
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }

        Ok(RangeQuote { days })
    }
}
