//! Box repository
//!
//! - list/search: filter documents rendered through [`Find`]
//! - update: row locked, merged in Rust, written back in one statement
//! - delete: guarded against boxes that still own items

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::error::{is_foreign_key_violation, nfc_conflict, ITEM_BOX_FK};
use crate::db::DbError;
use crate::models::{Name, NfcTag, Paginated, Pagination};
use crate::query::{ColumnType, Collection, Field, Filter, Find, Order, Schema};

pub static BOX_SCHEMA: Schema = Schema {
    table: "boxes",
    fields: &[
        Field::new("id", "id", ColumnType::Uuid).with_aliases(&["_id"]),
        Field::new("name", "name", ColumnType::Text),
        Field::new("location", "location", ColumnType::Text),
        Field::new("description", "description", ColumnType::Text),
        Field::new("nfcId", "nfc_id", ColumnType::Text).with_aliases(&["nfcTagId"]),
        Field::new("capacity", "capacity", ColumnType::Int),
        Field::new("currentItems", "current_items", ColumnType::Int),
        Field::new("imageUrl", "image_url", ColumnType::Text),
        Field::new("scanCount", "scan_count", ColumnType::Int),
        Field::new("lastScanned", "last_scanned", ColumnType::Timestamp),
        Field::new("createdAt", "created_at", ColumnType::Timestamp),
        Field::new("updatedAt", "updated_at", ColumnType::Timestamp),
    ],
};

/// Box record from database
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxRecord {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub nfc_id: Option<String>,
    pub capacity: i32,
    pub current_items: i32,
    pub image_url: Option<String>,
    pub scan_count: i32,
    pub last_scanned: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoxRecord {
    /// A capacity of 0 means unlimited.
    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.current_items >= self.capacity
    }

    /// Fill level as a rounded percentage.
    pub fn utilization(&self) -> i32 {
        if self.capacity <= 0 {
            return 0;
        }
        (self.current_items as f64 * 100.0 / self.capacity as f64).round() as i32
    }
}

#[async_trait]
impl Collection for BoxRecord {
    fn schema() -> &'static Schema {
        &BOX_SCHEMA
    }
}

/// Validated input for a new box
#[derive(Debug, Clone)]
pub struct NewBox {
    pub name: Name,
    pub location: Option<String>,
    pub description: Option<String>,
    pub nfc_id: Option<NfcTag>,
    pub capacity: i32,
    pub image_url: Option<String>,
}

/// Partial update. Outer `None` keeps the stored value, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct BoxChanges {
    pub name: Option<Name>,
    pub location: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub nfc_id: Option<Option<NfcTag>>,
    pub capacity: Option<i32>,
    pub image_url: Option<Option<String>>,
}

impl BoxChanges {
    fn apply(self, mut record: BoxRecord) -> BoxRecord {
        if let Some(name) = self.name {
            record.name = name.into_string();
        }
        if let Some(location) = self.location {
            record.location = location;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(nfc_id) = self.nfc_id {
            record.nfc_id = nfc_id.map(NfcTag::into_string);
        }
        if let Some(capacity) = self.capacity {
            record.capacity = capacity;
        }
        if let Some(image_url) = self.image_url {
            record.image_url = image_url;
        }
        record
    }
}

/// List filters
#[derive(Debug, Clone, Default)]
pub struct BoxQuery {
    pub search: Option<String>,
    pub location: Option<String>,
}

impl BoxQuery {
    fn filter(&self) -> Result<Filter, DbError> {
        let mut filter = Filter::all();
        if let Some(term) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            filter = filter.and(Filter::parse(
                &BOX_SCHEMA,
                &json!({"$or": [
                    {"name": {"$regex": term, "$options": "i"}},
                    {"description": {"$regex": term, "$options": "i"}},
                ]}),
            )?);
        }
        if let Some(location) = self.location.as_deref().filter(|s| !s.trim().is_empty()) {
            filter = filter.and(Filter::parse(
                &BOX_SCHEMA,
                &json!({"location": {"$regex": location, "$options": "i"}}),
            )?);
        }
        Ok(filter)
    }
}

/// Box repository
pub struct BoxRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> BoxRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List boxes, most recently updated first.
    pub async fn list(
        &self,
        query: &BoxQuery,
        page: Pagination,
    ) -> Result<Paginated<BoxRecord>, DbError> {
        let find = Find::<BoxRecord>::new(query.filter()?)
            .sort("updatedAt", Order::Desc)
            .page(page);
        let total = find.count(self.pool).await?;
        let items = find.exec(self.pool).await?;
        Ok(Paginated { items, total, page })
    }

    pub async fn get(&self, id: Uuid) -> Result<BoxRecord, DbError> {
        sqlx::query_as::<_, BoxRecord>("SELECT * FROM boxes WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("box", id))
    }

    /// Look a box up by its tag without touching scan statistics.
    pub async fn find_by_nfc(&self, tag: &NfcTag) -> Result<Option<BoxRecord>, DbError> {
        let record = sqlx::query_as::<_, BoxRecord>("SELECT * FROM boxes WHERE nfc_id = $1")
            .bind(tag.as_str())
            .fetch_optional(self.pool)
            .await?;
        Ok(record)
    }

    pub async fn get_by_nfc(&self, tag: &NfcTag) -> Result<BoxRecord, DbError> {
        self.find_by_nfc(tag)
            .await?
            .ok_or_else(|| DbError::not_found("nfc tag", tag.as_str()))
    }

    /// Insert a box. A taken tag surfaces as a conflict from the unique constraint.
    pub async fn create(&self, new: NewBox) -> Result<BoxRecord, DbError> {
        let record = sqlx::query_as::<_, BoxRecord>(
            r#"
            INSERT INTO boxes (name, location, description, nfc_id, capacity, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new.name.as_str())
        .bind(new.location)
        .bind(new.description)
        .bind(new.nfc_id.map(NfcTag::into_string))
        .bind(new.capacity)
        .bind(new.image_url)
        .fetch_one(self.pool)
        .await
        .map_err(nfc_conflict)?;

        tracing::info!(box_id = %record.id, name = %record.name, "box created");
        Ok(record)
    }

    pub async fn update(&self, id: Uuid, changes: BoxChanges) -> Result<BoxRecord, DbError> {
        let mut tx = self.pool.begin().await?;

        let current =
            sqlx::query_as::<_, BoxRecord>("SELECT * FROM boxes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("box", id))?;

        let merged = changes.apply(current);
        let record = sqlx::query_as::<_, BoxRecord>(
            r#"
            UPDATE boxes
            SET name = $2, location = $3, description = $4, nfc_id = $5,
                capacity = $6, image_url = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&merged.name)
        .bind(&merged.location)
        .bind(&merged.description)
        .bind(&merged.nfc_id)
        .bind(merged.capacity)
        .bind(&merged.image_url)
        .fetch_one(&mut *tx)
        .await
        .map_err(nfc_conflict)?;

        tx.commit().await?;
        Ok(record)
    }

    /// Delete an empty box.
    ///
    /// The row lock serializes with item writes targeting this box, and the
    /// RESTRICT foreign key backs the guard up.
    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM boxes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(DbError::not_found("box", id));
        }

        let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE box_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if owned > 0 {
            return Err(DbError::Conflict(format!(
                "cannot delete box: it still contains {owned} item(s); move or delete them first"
            )));
        }

        sqlx::query("DELETE FROM boxes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e, ITEM_BOX_FK) {
                    DbError::Conflict("cannot delete box: it still contains items".to_owned())
                } else {
                    DbError::Sqlx(e)
                }
            })?;

        tx.commit().await?;
        tracing::info!(box_id = %id, "box deleted");
        Ok(())
    }
}
