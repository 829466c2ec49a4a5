//! HTTP DTOs for catalog endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{DayQuote, RangeQuote};

/// Query parameters for the availability endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// One calendar day in the availability response.
///
/// `price` is absent (and `available` false) when no rule prices the day;
/// an unpriced day is unavailable, never free.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityDayResponse {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_type: Option<String>,
    pub available: bool,
}

impl From<&DayQuote> for AvailabilityDayResponse {
    fn from(day: &DayQuote) -> Self {
        Self {
            date: day.date,
            price: day.quote.map(|q| q.price.as_minor()),
            price_type: day.quote.map(|q| q.category.as_str().to_string()),
            available: day.quote.is_some(),
        }
    }
}

/// Availability response: per-day quotes plus range totals.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityResponse {
    pub dates: Vec<AvailabilityDayResponse>,
    pub total_days: usize,
    pub total_price: i64,
}

impl From<RangeQuote> for AvailabilityResponse {
    fn from(range: RangeQuote) -> Self {
        Self {
            total_days: range.total_days(),
            total_price: range.total_price().as_minor(),
            dates: range.days.iter().map(AvailabilityDayResponse::from).collect(),
        }
    }
}
