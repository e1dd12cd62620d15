//! # PostgreSQL Store
//!
//! Persists certificates in the `certificates` table (see
//! `migrations/0001_certificates.sql`). Queries are built at runtime with
//! `sqlx::query` / `query_as`, so the crate compiles without a live
//! database.
//!
//! Revocation is a single conditional `UPDATE ... WHERE revoked = FALSE`;
//! the database serializes concurrent attempts and at most one of them
//! affects a row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use uuid::Uuid;

use dcert_core::{
    CertificateId, CertificatePayload, IssuerId, SignedCertificate, Timestamp, TimestampProof,
};

use crate::error::StoreError;
use crate::record::CertificateRecord;
use crate::store::CertificateStore;

const SELECT_COLUMNS: &str = "SELECT id, issuer_id, recipient_name, course_name, issuer_name,
     issuer_details, issue_date, public_key, signature, logo_url, revoked,
     revoked_reason, revoked_at, timestamp_proof, created_at
     FROM certificates";

/// Connect to PostgreSQL and apply the embedded migrations.
///
/// # Errors
///
/// `StoreUnavailable` if the connection or a migration fails.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await?;

    tracing::info!(max_connections, "Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

/// [`CertificateStore`] backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgCertificateStore {
    pool: PgPool,
}

impl PgCertificateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CertificateStore for PgCertificateStore {
    async fn create(&self, record: CertificateRecord) -> Result<(), StoreError> {
        let cert = &record.certificate;
        let payload = &cert.payload;
        let result = sqlx::query(
            "INSERT INTO certificates (id, issuer_id, recipient_name, course_name, issuer_name,
             issuer_details, issue_date, public_key, signature, logo_url, revoked,
             revoked_reason, revoked_at, timestamp_proof, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(payload.id.as_str())
        .bind(record.issuer_id.0)
        .bind(&payload.recipient_name)
        .bind(&payload.course_name)
        .bind(&payload.issuer_name)
        .bind(&payload.issuer_organization)
        .bind(*payload.issue_date.as_datetime())
        .bind(&cert.public_key)
        .bind(&cert.signature)
        .bind(&payload.logo_url)
        .bind(cert.revoked)
        .bind(&cert.revoked_reason)
        .bind(cert.revoked_at.map(|t| *t.as_datetime()))
        .bind(cert.timestamp_proof.as_ref().map(Json))
        .bind(*record.created_at.as_datetime())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::debug!(certificate_id = %payload.id, issuer_id = %record.issuer_id, "certificate stored");
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Duplicate(payload.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_id(&self, id: &CertificateId) -> Result<Option<CertificateRecord>, StoreError> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(CertificateRow::into_record).transpose()
    }

    async fn list_by_issuer(
        &self,
        issuer_id: &IssuerId,
    ) -> Result<Vec<CertificateRecord>, StoreError> {
        let rows = sqlx::query_as::<_, CertificateRow>(&format!(
            "{SELECT_COLUMNS} WHERE issuer_id = $1 ORDER BY issue_date DESC, id DESC"
        ))
        .bind(issuer_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CertificateRow::into_record).collect()
    }

    async fn update_revocation(
        &self,
        id: &CertificateId,
        reason: &str,
        revoked_at: Timestamp,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE certificates SET revoked = TRUE, revoked_reason = $2, revoked_at = $3
             WHERE id = $1 AND revoked = FALSE",
        )
        .bind(id.as_str())
        .bind(reason)
        .bind(*revoked_at.as_datetime())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            tracing::info!(certificate_id = %id, "certificate revoked");
            return Ok(());
        }

        // Lost the compare-and-set, or the row does not exist.
        let existing = sqlx::query_as::<_, (Option<String>, Option<DateTime<Utc>>)>(
            "SELECT revoked_reason, revoked_at FROM certificates WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match existing {
            None => Err(StoreError::NotFound(id.clone())),
            Some((Some(reason), Some(at))) => Err(StoreError::AlreadyRevoked {
                certificate_id: id.clone(),
                reason,
                revoked_at: Timestamp::from_utc(at),
            }),
            Some(_) => Err(StoreError::Corrupt(format!(
                "certificate {id} rejected revocation but carries no revocation data"
            ))),
        }
    }

    async fn attach_timestamp_proof(
        &self,
        id: &CertificateId,
        proof: TimestampProof,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE certificates SET timestamp_proof = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(Json(&proof))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn delete(&self, id: &CertificateId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM certificates WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        tracing::info!(certificate_id = %id, "certificate deleted");
        Ok(())
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct CertificateRow {
    id: String,
    issuer_id: Uuid,
    recipient_name: String,
    course_name: String,
    issuer_name: String,
    issuer_details: String,
    issue_date: DateTime<Utc>,
    public_key: String,
    signature: String,
    logo_url: Option<String>,
    revoked: bool,
    revoked_reason: Option<String>,
    revoked_at: Option<DateTime<Utc>>,
    timestamp_proof: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl CertificateRow {
    fn into_record(self) -> Result<CertificateRecord, StoreError> {
        let id = CertificateId::parse(&self.id).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let timestamp_proof = self
            .timestamp_proof
            .map(serde_json::from_value::<TimestampProof>)
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("certificate {id}: bad timestamp proof: {e}")))?;

        let payload = CertificatePayload {
            id,
            recipient_name: self.recipient_name,
            course_name: self.course_name,
            issue_date: Timestamp::from_utc(self.issue_date),
            issuer_name: self.issuer_name,
            issuer_organization: self.issuer_details,
            logo_url: self.logo_url,
        };

        Ok(CertificateRecord {
            issuer_id: IssuerId(self.issuer_id),
            certificate: SignedCertificate {
                payload,
                signature: self.signature,
                public_key: self.public_key,
                revoked: self.revoked,
                revoked_at: self.revoked_at.map(Timestamp::from_utc),
                revoked_reason: self.revoked_reason,
                timestamp_proof,
            },
            created_at: Timestamp::from_utc(self.created_at),
        })
    }
}
