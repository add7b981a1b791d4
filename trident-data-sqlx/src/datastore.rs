use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use trident_data::{DataError, Datastore};
use trident_types::{Campaign, CampaignStatus, ResultRow};

use crate::error::SqlxErrorExt;

/// A [`Datastore`] backed by a Postgres connection pool.
pub struct PostgresDatastore {
    pool: PgPool,
}

impl PostgresDatastore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct CampaignRow {
    id: Uuid,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    schedule_interval_ns: i64,
    users: Vec<String>,
    passwords: Vec<String>,
    provider: String,
    provider_metadata_json: serde_json::Value,
    status: String,
    created_by: String,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = DataError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        let status = status_from_db(&row.status)?;
        let provider_metadata: HashMap<String, String> = serde_json::from_value(row.provider_metadata_json)
            .map_err(|e| DataError::Other(format!("invalid provider_metadata_json: {e}")))?;
        Ok(Campaign {
            id: row.id,
            created_by: row.created_by,
            not_before: row.not_before,
            not_after: row.not_after,
            schedule_interval: Duration::from_nanos(row.schedule_interval_ns.max(0) as u64),
            users: row.users,
            passwords: row.passwords,
            provider: row.provider,
            provider_metadata,
            status,
        })
    }
}

fn status_to_db(status: CampaignStatus) -> &'static str {
    match status {
        CampaignStatus::Active => "active",
        CampaignStatus::Paused => "paused",
        CampaignStatus::Cancelled => "cancelled",
        CampaignStatus::Completed => "completed",
    }
}

fn status_from_db(s: &str) -> Result<CampaignStatus, DataError> {
    match s {
        "active" => Ok(CampaignStatus::Active),
        "paused" => Ok(CampaignStatus::Paused),
        "cancelled" => Ok(CampaignStatus::Cancelled),
        "completed" => Ok(CampaignStatus::Completed),
        other => Err(DataError::Other(format!("unknown campaign status in database: {other}"))),
    }
}

#[derive(FromRow)]
struct ResultRowRecord {
    id: Uuid,
    created_at: DateTime<Utc>,
    campaign_id: Uuid,
    ip: String,
    timestamp: DateTime<Utc>,
    username: String,
    password: String,
    valid: bool,
    locked: bool,
    mfa: bool,
    rate_limited: bool,
    metadata_json: serde_json::Value,
}

impl From<ResultRowRecord> for ResultRow {
    fn from(r: ResultRowRecord) -> Self {
        ResultRow {
            id: r.id,
            created_at: r.created_at,
            campaign_id: r.campaign_id,
            ip: r.ip,
            timestamp: r.timestamp,
            username: r.username,
            password: r.password,
            valid: r.valid,
            locked: r.locked,
            mfa: r.mfa,
            rate_limited: r.rate_limited,
            metadata: r.metadata_json,
        }
    }
}

#[async_trait]
impl Datastore for PostgresDatastore {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), DataError> {
        sqlx::query(
            "INSERT INTO campaigns \
             (id, created_at, updated_at, not_before, not_after, schedule_interval_ns, \
              users, passwords, provider, provider_metadata_json, status) \
             VALUES ($1, now(), now(), $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(campaign.id)
        .bind(campaign.not_before)
        .bind(campaign.not_after)
        .bind(campaign.schedule_interval.as_nanos() as i64)
        .bind(&campaign.users)
        .bind(&campaign.passwords)
        .bind(&campaign.provider)
        .bind(serde_json::to_value(&campaign.provider_metadata).map_err(|e| DataError::Other(e.to_string()))?)
        .bind(status_to_db(campaign.status))
        .execute(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_data_error)?;
        Ok(())
    }

    async fn campaign(&self, id: Uuid) -> Result<Option<Campaign>, DataError> {
        let row: Option<CampaignRow> = sqlx::query_as(
            "SELECT id, not_before, not_after, schedule_interval_ns, users, passwords, \
             provider, provider_metadata_json, status, 'operator' AS created_by \
             FROM campaigns WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_data_error)?;

        row.map(Campaign::try_from).transpose()
    }

    async fn active_campaigns(&self) -> Result<Vec<Campaign>, DataError> {
        let rows: Vec<CampaignRow> = sqlx::query_as(
            "SELECT id, not_before, not_after, schedule_interval_ns, users, passwords, \
             provider, provider_metadata_json, status, 'operator' AS created_by \
             FROM campaigns WHERE deleted_at IS NULL AND status IN ('active', 'paused')",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_data_error)?;

        rows.into_iter().map(Campaign::try_from).collect()
    }

    async fn set_campaign_status(&self, id: Uuid, status: CampaignStatus) -> Result<(), DataError> {
        let result = sqlx::query("UPDATE campaigns SET status = $1, updated_at = now() WHERE id = $2 AND deleted_at IS NULL")
            .bind(status_to_db(status))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(format!("campaign {id}")));
        }
        Ok(())
    }

    async fn insert_result(&self, row: &ResultRow) -> Result<(), DataError> {
        sqlx::query(
            "INSERT INTO results \
             (id, created_at, campaign_id, ip, timestamp, username, password, \
              valid, locked, mfa, rate_limited, metadata_json) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(row.id)
        .bind(row.created_at)
        .bind(row.campaign_id)
        .bind(&row.ip)
        .bind(row.timestamp)
        .bind(&row.username)
        .bind(&row.password)
        .bind(row.valid)
        .bind(row.locked)
        .bind(row.mfa)
        .bind(row.rate_limited)
        .bind(&row.metadata)
        .execute(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_data_error)?;
        Ok(())
    }

    async fn insert_results_batch(&self, rows: &[ResultRow]) -> Result<Vec<ResultRow>, DataError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await.map_err(SqlxErrorExt::into_data_error)?;
        let mut failed = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            // A savepoint per row means one bad row rolls back to here
            // instead of poisoning the whole transaction.
            let savepoint = format!("sp_{idx}");
            sqlx::query(&format!("SAVEPOINT {savepoint}"))
                .execute(&mut *tx)
                .await
                .map_err(SqlxErrorExt::into_data_error)?;

            let insert = sqlx::query(
                "INSERT INTO results \
                 (id, created_at, campaign_id, ip, timestamp, username, password, \
                  valid, locked, mfa, rate_limited, metadata_json) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(row.id)
            .bind(row.created_at)
            .bind(row.campaign_id)
            .bind(&row.ip)
            .bind(row.timestamp)
            .bind(&row.username)
            .bind(&row.password)
            .bind(row.valid)
            .bind(row.locked)
            .bind(row.mfa)
            .bind(row.rate_limited)
            .bind(&row.metadata)
            .execute(&mut *tx)
            .await;

            match insert {
                Ok(_) => {
                    sqlx::query(&format!("RELEASE SAVEPOINT {savepoint}"))
                        .execute(&mut *tx)
                        .await
                        .map_err(SqlxErrorExt::into_data_error)?;
                }
                Err(e) => {
                    tracing::warn!(error = %e, row_id = %row.id, "batch row insert failed, re-queueing");
                    sqlx::query(&format!("ROLLBACK TO SAVEPOINT {savepoint}"))
                        .execute(&mut *tx)
                        .await
                        .map_err(SqlxErrorExt::into_data_error)?;
                    failed.push(row.clone());
                }
            }
        }

        tx.commit().await.map_err(SqlxErrorExt::into_data_error)?;
        Ok(failed)
    }
}
