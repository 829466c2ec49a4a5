//! PostgreSQL implementation of PackageRepository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::catalog::{DaySet, Package, PriceRule, PriceRuleKind};
use crate::domain::foundation::{
    DomainError, ErrorCode, Money, PackageId, PriceRuleId, Timestamp,
};
use crate::ports::PackageRepository;

/// PostgreSQL implementation of the PackageRepository port.
///
/// Loads the package row and its price rules in two queries and assembles
/// the aggregate; the pricing resolver then works entirely in memory.
pub struct PostgresPackageRepository {
    pool: PgPool,
}

impl PostgresPackageRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a package.
#[derive(Debug, sqlx::FromRow)]
struct PackageRow {
    id: Uuid,
    name: String,
    description: String,
    active: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Database row representation of a price rule.
#[derive(Debug, sqlx::FromRow)]
struct PriceRuleRow {
    id: Uuid,
    package_id: Uuid,
    price_type: String,
    price_minor: i64,
    days: Option<serde_json::Value>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

fn parse_day_set(value: Option<&serde_json::Value>) -> Result<DaySet, DomainError> {
    let Some(value) = value else {
        return Err(DomainError::new(
            ErrorCode::DatabaseError,
            "Category price rule has no day set",
        ));
    };
    let days: Vec<u8> = serde_json::from_value(value.clone()).map_err(|e| {
        DomainError::new(ErrorCode::DatabaseError, format!("Invalid day set: {}", e))
    })?;
    DaySet::from_days(&days)
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Invalid day set: {}", e)))
}

impl TryFrom<PriceRuleRow> for PriceRule {
    type Error = DomainError;

    fn try_from(row: PriceRuleRow) -> Result<Self, Self::Error> {
        let kind = match row.price_type.as_str() {
            "weekday" => PriceRuleKind::Weekday {
                days: parse_day_set(row.days.as_ref())?,
            },
            "weekend" => PriceRuleKind::Weekend {
                days: parse_day_set(row.days.as_ref())?,
            },
            "date_range" => {
                let (Some(start), Some(end)) = (row.start_date, row.end_date) else {
                    return Err(DomainError::new(
                        ErrorCode::DatabaseError,
                        "Date range rule is missing its window",
                    ));
                };
                PriceRuleKind::DateRange { start, end }
            }
            other => {
                return Err(DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid price_type value: {}", other),
                ))
            }
        };

        let price = Money::from_minor(row.price_minor).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid price: {}", e))
        })?;

        Ok(PriceRule {
            id: PriceRuleId::from_uuid(row.id),
            package_id: PackageId::from_uuid(row.package_id),
            price,
            kind,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn assemble(row: PackageRow, rule_rows: Vec<PriceRuleRow>) -> Result<Package, DomainError> {
    let price_rules = rule_rows
        .into_iter()
        .map(PriceRule::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Package {
        id: PackageId::from_uuid(row.id),
        name: row.name,
        description: row.description,
        active: row.active,
        deleted_at: row.deleted_at.map(Timestamp::from_datetime),
        price_rules,
        created_at: Timestamp::from_datetime(row.created_at),
        updated_at: Timestamp::from_datetime(row.updated_at),
    })
}

#[async_trait]
impl PackageRepository for PostgresPackageRepository {
    async fn find_by_id(&self, id: &PackageId) -> Result<Option<Package>, DomainError> {
        let row: Option<PackageRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, active, deleted_at, created_at, updated_at
            FROM packages
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to load package: {}", e))
        })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let rule_rows: Vec<PriceRuleRow> = sqlx::query_as(
            r#"
            SELECT id, package_id, price_type, price_minor, days, start_date, end_date, created_at
            FROM package_price_rules
            WHERE package_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to load price rules: {}", e),
            )
        })?;

        assemble(row, rule_rows).map(Some)
    }
}
