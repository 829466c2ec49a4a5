//! PostgreSQL implementation of PurchaseRepository.
//!
//! The version column carries the optimistic-concurrency contract: every
//! update is conditional on the version the writer loaded, so concurrent
//! reconciliations never interleave a read-then-write silently.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, Money, PackageId, PurchaseId, Timestamp, UserId,
};
use crate::domain::purchase::{PaymentEvent, Purchase, PurchaseStatus};
use crate::ports::{PurchaseRepository, UpdateResult};

/// PostgreSQL implementation of the PurchaseRepository port.
pub struct PostgresPurchaseRepository {
    pool: PgPool,
}

impl PostgresPurchaseRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a purchase.
#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    user_id: Uuid,
    package_id: Uuid,
    amount_minor: i64,
    checkout_session_id: Option<String>,
    payment_intent_id: Option<String>,
    status: String,
    events: Json<Vec<PaymentEvent>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i32,
}

fn parse_status(s: &str) -> Result<PurchaseStatus, DomainError> {
    match s {
        "pending" => Ok(PurchaseStatus::Pending),
        "completed" => Ok(PurchaseStatus::Completed),
        "failed" => Ok(PurchaseStatus::Failed),
        "refunded" => Ok(PurchaseStatus::Refunded),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )),
    }
}

fn status_to_string(status: &PurchaseStatus) -> &'static str {
    match status {
        PurchaseStatus::Pending => "pending",
        PurchaseStatus::Completed => "completed",
        PurchaseStatus::Failed => "failed",
        PurchaseStatus::Refunded => "refunded",
    }
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let amount = Money::from_minor(row.amount_minor).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid amount: {}", e))
        })?;

        Ok(Purchase {
            id: PurchaseId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            package_id: PackageId::from_uuid(row.package_id),
            amount,
            checkout_session_id: row.checkout_session_id,
            payment_intent_id: row.payment_intent_id,
            status: parse_status(&row.status)?,
            events: row.events.0,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            version: row.version,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, package_id, amount_minor, checkout_session_id,
           payment_intent_id, status, events, created_at, updated_at, version
    FROM purchases
"#;

impl PostgresPurchaseRepository {
    async fn fetch_one_by(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<Purchase>, DomainError> {
        // Lookups differ only in the correlation column; the value stays
        // parameterized.
        let query = format!("{} WHERE {} = $1", SELECT_COLUMNS, column);
        let row: Option<PurchaseRow> = sqlx::query_as(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to load purchase: {}", e),
                )
            })?;

        row.map(Purchase::try_from).transpose()
    }
}

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepository {
    async fn create(&self, purchase: &Purchase) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, user_id, package_id, amount_minor, checkout_session_id,
                payment_intent_id, status, events, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(purchase.id.as_uuid())
        .bind(purchase.user_id.as_uuid())
        .bind(purchase.package_id.as_uuid())
        .bind(purchase.amount.as_minor())
        .bind(&purchase.checkout_session_id)
        .bind(&purchase.payment_intent_id)
        .bind(status_to_string(&purchase.status))
        .bind(Json(&purchase.events))
        .bind(purchase.created_at.as_datetime())
        .bind(purchase.updated_at.as_datetime())
        .bind(purchase.version)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to create purchase: {}", e),
            )
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, DomainError> {
        let row: Option<PurchaseRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to load purchase: {}", e),
                    )
                })?;

        row.map(Purchase::try_from).transpose()
    }

    async fn find_by_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<Purchase>, DomainError> {
        self.fetch_one_by("checkout_session_id", session_id).await
    }

    async fn find_by_payment_intent_id(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Purchase>, DomainError> {
        self.fetch_one_by("payment_intent_id", payment_intent_id)
            .await
    }

    async fn update(
        &self,
        purchase: &Purchase,
        expected_version: i32,
    ) -> Result<UpdateResult, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE purchases SET
                checkout_session_id = $3,
                payment_intent_id = $4,
                status = $5,
                events = $6,
                updated_at = $7,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(purchase.id.as_uuid())
        .bind(expected_version)
        .bind(&purchase.checkout_session_id)
        .bind(&purchase.payment_intent_id)
        .bind(status_to_string(&purchase.status))
        .bind(Json(&purchase.events))
        .bind(purchase.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update purchase: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Ok(UpdateResult::VersionConflict);
        }

        Ok(UpdateResult::Updated)
    }
}
