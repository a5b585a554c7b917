//! NFC tag bindings
//!
//! Scans are a single atomic UPDATE; bind relies on the unique constraint
//! instead of checking availability first.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::boxes::{BoxRecord, BOX_SCHEMA};
use crate::db::error::nfc_conflict;
use crate::db::DbError;
use crate::models::NfcTag;
use crate::query::{Filter, Find, Order};

/// A box with a tag, as listed by bindings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NfcBinding {
    pub id: Uuid,
    pub name: String,
    pub nfc_id: Option<String>,
    pub last_scanned: Option<DateTime<Utc>>,
    pub scan_count: i32,
}

impl From<BoxRecord> for NfcBinding {
    fn from(record: BoxRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            nfc_id: record.nfc_id,
            last_scanned: record.last_scanned,
            scan_count: record.scan_count,
        }
    }
}

/// Result of checking whether a tag can be bound
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagAvailability {
    pub nfc_id: String,
    pub available: bool,
    /// Name of the box holding the tag
    pub bound_to: Option<String>,
}

/// NFC repository
pub struct NfcRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> NfcRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a scan and return the box.
    pub async fn scan(&self, tag: &NfcTag) -> Result<BoxRecord, DbError> {
        let record = sqlx::query_as::<_, BoxRecord>(
            r#"
            UPDATE boxes
            SET scan_count = scan_count + 1, last_scanned = NOW()
            WHERE nfc_id = $1
            RETURNING *
            "#,
        )
        .bind(tag.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("nfc tag", tag.as_str()))?;

        tracing::debug!(nfc_id = %tag.as_str(), box_id = %record.id, scans = record.scan_count, "tag scanned");
        Ok(record)
    }

    /// Bind a tag to a box. Rebinding the same tag to the same box is a no-op.
    pub async fn bind(&self, box_id: Uuid, tag: &NfcTag) -> Result<BoxRecord, DbError> {
        let record = sqlx::query_as::<_, BoxRecord>(
            r#"
            UPDATE boxes
            SET nfc_id = $2,
                updated_at = CASE WHEN nfc_id IS DISTINCT FROM $2 THEN NOW() ELSE updated_at END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(box_id)
        .bind(tag.as_str())
        .fetch_optional(self.pool)
        .await
        .map_err(nfc_conflict)?
        .ok_or_else(|| DbError::not_found("box", box_id))?;

        tracing::info!(box_id = %box_id, nfc_id = %tag.as_str(), "tag bound");
        Ok(record)
    }

    pub async fn unbind(&self, box_id: Uuid) -> Result<BoxRecord, DbError> {
        let record = sqlx::query_as::<_, BoxRecord>(
            "UPDATE boxes SET nfc_id = NULL, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(box_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("box", box_id))?;

        tracing::info!(box_id = %box_id, "tag unbound");
        Ok(record)
    }

    /// All boxes carrying a tag, by name.
    pub async fn bindings(&self) -> Result<Vec<NfcBinding>, DbError> {
        let filter = Filter::parse(&BOX_SCHEMA, &json!({"nfcId": {"$exists": true}}))?;
        let boxes = Find::<BoxRecord>::new(filter)
            .sort("name", Order::Asc)
            .exec(self.pool)
            .await?;
        Ok(boxes.into_iter().map(NfcBinding::from).collect())
    }

    pub async fn availability(&self, tag: NfcTag) -> Result<TagAvailability, DbError> {
        let bound: Option<String> =
            sqlx::query_scalar("SELECT name FROM boxes WHERE nfc_id = $1")
                .bind(tag.as_str())
                .fetch_optional(self.pool)
                .await?;

        Ok(TagAvailability {
            nfc_id: tag.into_string(),
            available: bound.is_none(),
            bound_to: bound,
        })
    }
}
