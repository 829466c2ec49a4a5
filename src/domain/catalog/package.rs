//! Package aggregate - a sellable offering with pricing rules.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PackageId, Timestamp, ValidationError};

use super::price_rule::{PriceRule, PriceRuleKind};

/// A sellable package with its pricing rules.
///
/// An active package carries exactly one weekday and one weekend rule;
/// date-range rules may overlay them. Packages are soft-deleted, never
/// removed, because purchases reference them historically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Package identifier.
    pub id: PackageId,

    /// Display name.
    pub name: String,

    /// Customer-facing description.
    pub description: String,

    /// Whether the package is offered for sale.
    pub active: bool,

    /// Soft-delete marker.
    pub deleted_at: Option<Timestamp>,

    /// Pricing rules attached to this package.
    pub price_rules: Vec<PriceRule>,

    /// When the package was created.
    pub created_at: Timestamp,

    /// When the package was last modified.
    pub updated_at: Timestamp,
}

impl Package {
    /// Creates a new active package with no rules yet.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        let now = Timestamp::now();
        Ok(Self {
            id: PackageId::new(),
            name,
            description: description.into(),
            active: true,
            deleted_at: None,
            price_rules: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns true if the package can currently be purchased.
    pub fn is_purchasable(&self) -> bool {
        self.active && self.deleted_at.is_none()
    }

    /// The single weekday-category rule, if present.
    pub fn weekday_rule(&self) -> Option<&PriceRule> {
        self.price_rules
            .iter()
            .find(|r| matches!(r.kind, PriceRuleKind::Weekday { .. }))
    }

    /// The single weekend-category rule, if present.
    pub fn weekend_rule(&self) -> Option<&PriceRule> {
        self.price_rules
            .iter()
            .find(|r| matches!(r.kind, PriceRuleKind::Weekend { .. }))
    }

    /// Checks the active-package rule invariant: exactly one weekday and one
    /// weekend rule.
    pub fn has_complete_category_rules(&self) -> bool {
        let weekday_count = self
            .price_rules
            .iter()
            .filter(|r| matches!(r.kind, PriceRuleKind::Weekday { .. }))
            .count();
        let weekend_count = self
            .price_rules
            .iter()
            .filter(|r| matches!(r.kind, PriceRuleKind::Weekend { .. }))
            .count();
        weekday_count == 1 && weekend_count == 1
    }
}
