//! Catalog domain - packages and their pricing rules.

mod package;
mod price_rule;
mod pricing;

pub use package::Package;
pub use price_rule::{DaySet, PriceRule, PriceRuleKind};
pub use pricing::{DayQuote, PriceCategory, PriceQuote, PricingError, RangeQuote};
