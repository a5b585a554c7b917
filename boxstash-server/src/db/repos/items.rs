//! Item repository
//!
//! Every write that changes which box an item lives in runs in one
//! transaction that locks the affected box rows (ordered by id), mutates the
//! item, then recomputes `current_items` from a live count.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::db::error::{is_foreign_key_violation, ITEM_BOX_FK};
use crate::db::DbError;
use crate::models::{
    Attachment, AttachmentKind, Category, Condition, Name, Paginated, Pagination, StockStatus,
    ValidationError,
};
use crate::query::{ColumnType, Collection, Field, Filter, Find, Order, Schema};

pub static ITEM_SCHEMA: Schema = Schema {
    table: "items",
    fields: &[
        Field::new("id", "id", ColumnType::Uuid).with_aliases(&["_id"]),
        Field::new("name", "name", ColumnType::Text),
        Field::new("description", "description", ColumnType::Text),
        Field::new("boxId", "box_id", ColumnType::Uuid).with_aliases(&["box"]),
        Field::new("category", "category", ColumnType::Text),
        Field::new("quantity", "quantity", ColumnType::Int),
        Field::new("unit", "unit", ColumnType::Text),
        Field::new("lowStockThreshold", "low_stock_threshold", ColumnType::Int),
        Field::new("status", "status", ColumnType::Text),
        Field::new("condition", "condition_status", ColumnType::Text),
        Field::new("purchaseDate", "purchase_date", ColumnType::Date),
        Field::new("purchasePrice", "purchase_price", ColumnType::Float),
        Field::new("warrantyUntil", "warranty_until", ColumnType::Date),
        Field::new("tags", "tags", ColumnType::TextArray),
        Field::new("notes", "notes", ColumnType::Text),
        Field::new("createdAt", "created_at", ColumnType::Timestamp),
        Field::new("updatedAt", "updated_at", ColumnType::Timestamp),
    ],
};

/// Owning box as embedded in item responses
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BoxSummary {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
}

/// Item record from database
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub box_id: Option<Uuid>,
    pub category: String,
    pub quantity: i32,
    pub unit: String,
    pub low_stock_threshold: i32,
    #[sqlx(try_from = "String")]
    pub status: StockStatus,
    #[sqlx(rename = "condition_status", try_from = "String")]
    pub condition: Condition,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub warranty_until: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub specifications: Json<Value>,
    pub notes: Option<String>,
    pub photos: Json<Vec<Attachment>>,
    pub documents: Json<Vec<Attachment>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Filled by `populate("box")`
    #[sqlx(skip)]
    #[serde(rename = "box")]
    pub box_summary: Option<BoxSummary>,
}

impl ItemRecord {
    /// `None` when no warranty date is recorded.
    pub fn warranty_expired(&self, today: NaiveDate) -> Option<bool> {
        self.warranty_until.map(|until| today > until)
    }

    pub fn main_photo(&self) -> Option<&Attachment> {
        self.photos.0.first()
    }

    pub fn attachments(&self, kind: AttachmentKind) -> &[Attachment] {
        match kind {
            AttachmentKind::Photos => &self.photos.0,
            AttachmentKind::Documents => &self.documents.0,
        }
    }

    fn attachments_mut(&mut self, kind: AttachmentKind) -> &mut Vec<Attachment> {
        match kind {
            AttachmentKind::Photos => &mut self.photos.0,
            AttachmentKind::Documents => &mut self.documents.0,
        }
    }
}

#[async_trait]
impl Collection for ItemRecord {
    fn schema() -> &'static Schema {
        &ITEM_SCHEMA
    }

    async fn populate(rows: &mut [Self], path: &str, pool: &PgPool) -> Result<(), DbError> {
        if path != "box" {
            return Err(ValidationError::UnknownField {
                field: path.to_owned(),
            }
            .into());
        }

        let mut ids: Vec<Uuid> = rows.iter().filter_map(|r| r.box_id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(());
        }

        let boxes: HashMap<Uuid, BoxSummary> = sqlx::query_as::<_, BoxSummary>(
            "SELECT id, name, location FROM boxes WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();

        for row in rows.iter_mut() {
            row.box_summary = row.box_id.and_then(|id| boxes.get(&id).cloned());
        }
        Ok(())
    }
}

/// Validated input for a new item
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: Name,
    pub description: Option<String>,
    pub box_id: Option<Uuid>,
    pub category: Category,
    pub quantity: i32,
    pub unit: String,
    pub low_stock_threshold: i32,
    pub condition: Condition,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub warranty_until: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub specifications: Value,
    pub notes: Option<String>,
}

/// Partial update. Outer `None` keeps the stored value, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub name: Option<Name>,
    pub description: Option<Option<String>>,
    pub box_id: Option<Option<Uuid>>,
    pub category: Option<Category>,
    pub quantity: Option<i32>,
    pub unit: Option<String>,
    pub low_stock_threshold: Option<i32>,
    pub condition: Option<Condition>,
    pub purchase_date: Option<Option<NaiveDate>>,
    pub purchase_price: Option<Option<f64>>,
    pub warranty_until: Option<Option<NaiveDate>>,
    pub tags: Option<Vec<String>>,
    pub specifications: Option<Value>,
    pub notes: Option<Option<String>>,
}

impl ItemChanges {
    fn apply(self, mut record: ItemRecord) -> ItemRecord {
        if let Some(name) = self.name {
            record.name = name.into_string();
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(box_id) = self.box_id {
            record.box_id = box_id;
        }
        if let Some(category) = self.category {
            record.category = category.as_str().to_owned();
        }
        if let Some(quantity) = self.quantity {
            record.quantity = quantity;
        }
        if let Some(unit) = self.unit {
            record.unit = unit;
        }
        if let Some(threshold) = self.low_stock_threshold {
            record.low_stock_threshold = threshold;
        }
        if let Some(condition) = self.condition {
            record.condition = condition;
        }
        if let Some(date) = self.purchase_date {
            record.purchase_date = date;
        }
        if let Some(price) = self.purchase_price {
            record.purchase_price = price;
        }
        if let Some(date) = self.warranty_until {
            record.warranty_until = date;
        }
        if let Some(tags) = self.tags {
            record.tags = tags;
        }
        if let Some(specs) = self.specifications {
            record.specifications = Json(specs);
        }
        if let Some(notes) = self.notes {
            record.notes = notes;
        }
        record
    }
}

/// List filters
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<StockStatus>,
    pub condition: Option<Condition>,
    pub box_id: Option<Uuid>,
}

impl ItemQuery {
    fn filter(&self) -> Result<Filter, DbError> {
        let mut doc = serde_json::Map::new();
        if let Some(term) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            doc.insert("$or".into(), search_clauses(term));
        }
        if let Some(category) = self.category.as_deref().filter(|s| !s.trim().is_empty()) {
            doc.insert("category".into(), json!(category.trim()));
        }
        if let Some(status) = self.status {
            doc.insert("status".into(), json!(status.as_str()));
        }
        if let Some(condition) = self.condition {
            doc.insert("condition".into(), json!(condition.as_str()));
        }
        if let Some(box_id) = self.box_id {
            doc.insert("boxId".into(), json!(box_id));
        }
        Ok(Filter::parse(&ITEM_SCHEMA, &Value::Object(doc))?)
    }
}

/// Name, description or any tag
fn search_clauses(term: &str) -> Value {
    json!([
        {"name": {"$regex": term, "$options": "i"}},
        {"description": {"$regex": term, "$options": "i"}},
        {"tags": {"$regex": term, "$options": "i"}},
    ])
}

/// Per-category totals
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category: String,
    pub count: i64,
    pub total_quantity: i64,
}

/// Lock box rows in id order; any id that does not exist is reported.
async fn lock_boxes(conn: &mut PgConnection, ids: &[Uuid]) -> Result<(), DbError> {
    let mut wanted = ids.to_vec();
    wanted.sort_unstable();
    wanted.dedup();

    let locked: Vec<Uuid> =
        sqlx::query_scalar("SELECT id FROM boxes WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(&wanted)
            .fetch_all(&mut *conn)
            .await?;

    match wanted.into_iter().find(|id| !locked.contains(id)) {
        Some(missing) => Err(DbError::not_found("box", missing)),
        None => Ok(()),
    }
}

/// Recompute `current_items` for the given boxes from a live count.
async fn recount_boxes(conn: &mut PgConnection, ids: &[Uuid]) -> Result<(), DbError> {
    if ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        r#"
        UPDATE boxes b
        SET current_items = (SELECT COUNT(*) FROM items i WHERE i.box_id = b.id),
            updated_at = NOW()
        WHERE b.id = ANY($1)
        "#,
    )
    .bind(ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn box_missing(box_id: Option<Uuid>) -> impl FnOnce(sqlx::Error) -> DbError {
    move |e| match box_id {
        Some(id) if is_foreign_key_violation(&e, ITEM_BOX_FK) => DbError::not_found("box", id),
        _ => DbError::Sqlx(e),
    }
}

/// Item repository
pub struct ItemRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List items, most recently updated first, with their box populated.
    pub async fn list(
        &self,
        query: &ItemQuery,
        page: Pagination,
    ) -> Result<Paginated<ItemRecord>, DbError> {
        let find = Find::<ItemRecord>::new(query.filter()?)
            .sort("updatedAt", Order::Desc)
            .page(page)
            .populate("box");
        let total = find.count(self.pool).await?;
        let items = find.exec(self.pool).await?;
        Ok(Paginated { items, total, page })
    }

    /// Items of one box, paginated.
    pub async fn in_box(
        &self,
        box_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<ItemRecord>, DbError> {
        let query = ItemQuery {
            box_id: Some(box_id),
            ..Default::default()
        };
        self.list(&query, page).await
    }

    /// Every item of one box ordered by name.
    pub async fn all_in_box(&self, box_id: Uuid) -> Result<Vec<ItemRecord>, DbError> {
        let filter = Filter::parse(&ITEM_SCHEMA, &json!({ "boxId": box_id }))?;
        Find::<ItemRecord>::new(filter)
            .sort("name", Order::Asc)
            .exec(self.pool)
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<ItemRecord, DbError> {
        let filter = Filter::parse(&ITEM_SCHEMA, &json!({ "id": id }))?;
        Find::<ItemRecord>::new(filter)
            .limit(1)
            .populate("box")
            .exec(self.pool)
            .await?
            .pop()
            .ok_or_else(|| DbError::not_found("item", id))
    }

    async fn with_box(&self, record: ItemRecord) -> Result<ItemRecord, DbError> {
        let mut rows = [record];
        ItemRecord::populate(&mut rows, "box", self.pool).await?;
        let [record] = rows;
        Ok(record)
    }

    pub async fn create(&self, new: NewItem) -> Result<ItemRecord, DbError> {
        let mut tx = self.pool.begin().await?;

        if let Some(box_id) = new.box_id {
            lock_boxes(&mut tx, &[box_id]).await?;
        }

        let record = sqlx::query_as::<_, ItemRecord>(
            r#"
            INSERT INTO items (
                name, description, box_id, category, quantity, unit,
                low_stock_threshold, condition_status, purchase_date,
                purchase_price, warranty_until, tags, specifications, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(new.name.as_str())
        .bind(&new.description)
        .bind(new.box_id)
        .bind(new.category.as_str())
        .bind(new.quantity)
        .bind(&new.unit)
        .bind(new.low_stock_threshold)
        .bind(new.condition.as_str())
        .bind(new.purchase_date)
        .bind(new.purchase_price)
        .bind(new.warranty_until)
        .bind(&new.tags)
        .bind(Json(&new.specifications))
        .bind(&new.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(box_missing(new.box_id))?;

        if let Some(box_id) = record.box_id {
            recount_boxes(&mut tx, &[box_id]).await?;
        }
        tx.commit().await?;

        tracing::info!(item_id = %record.id, box_id = ?record.box_id, "item created");
        self.with_box(record).await
    }

    pub async fn update(&self, id: Uuid, changes: ItemChanges) -> Result<ItemRecord, DbError> {
        let mut tx = self.pool.begin().await?;

        let current =
            sqlx::query_as::<_, ItemRecord>("SELECT * FROM items WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("item", id))?;

        let old_box = current.box_id;
        let merged = changes.apply(current);
        let moved = merged.box_id != old_box;
        let affected: Vec<Uuid> = if moved {
            old_box.into_iter().chain(merged.box_id).collect()
        } else {
            Vec::new()
        };
        lock_boxes(&mut tx, &affected).await?;

        let record = sqlx::query_as::<_, ItemRecord>(
            r#"
            UPDATE items
            SET name = $2, description = $3, box_id = $4, category = $5,
                quantity = $6, unit = $7, low_stock_threshold = $8,
                condition_status = $9, purchase_date = $10, purchase_price = $11,
                warranty_until = $12, tags = $13, specifications = $14,
                notes = $15, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&merged.name)
        .bind(&merged.description)
        .bind(merged.box_id)
        .bind(&merged.category)
        .bind(merged.quantity)
        .bind(&merged.unit)
        .bind(merged.low_stock_threshold)
        .bind(merged.condition.as_str())
        .bind(merged.purchase_date)
        .bind(merged.purchase_price)
        .bind(merged.warranty_until)
        .bind(&merged.tags)
        .bind(&merged.specifications)
        .bind(&merged.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(box_missing(merged.box_id))?;

        recount_boxes(&mut tx, &affected).await?;
        tx.commit().await?;

        if moved {
            tracing::info!(item_id = %id, from = ?old_box, to = ?record.box_id, "item moved");
        }
        self.with_box(record).await
    }

    /// Delete an item, returning the removed row so its files can be cleaned up.
    pub async fn delete(&self, id: Uuid) -> Result<ItemRecord, DbError> {
        let mut tx = self.pool.begin().await?;

        let record =
            sqlx::query_as::<_, ItemRecord>("SELECT * FROM items WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("item", id))?;

        let affected: Vec<Uuid> = record.box_id.into_iter().collect();
        lock_boxes(&mut tx, &affected).await?;

        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        recount_boxes(&mut tx, &affected).await?;
        tx.commit().await?;

        tracing::info!(item_id = %id, "item deleted");
        Ok(record)
    }

    /// Match name, description or tags, most recently updated first.
    pub async fn search(&self, term: &str, limit: i64) -> Result<Vec<ItemRecord>, DbError> {
        let filter = Filter::parse(&ITEM_SCHEMA, &json!({ "$or": search_clauses(term) }))?;
        Find::<ItemRecord>::new(filter)
            .sort("updatedAt", Order::Desc)
            .limit(limit)
            .populate("box")
            .exec(self.pool)
            .await
    }

    pub async fn category_stats(&self) -> Result<Vec<CategoryStat>, DbError> {
        let stats = sqlx::query_as::<_, CategoryStat>(
            r#"
            SELECT category,
                   COUNT(*) AS count,
                   COALESCE(SUM(quantity), 0)::BIGINT AS total_quantity
            FROM items
            GROUP BY category
            ORDER BY count DESC, category ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;
        Ok(stats)
    }

    /// Append attachment records in a single statement.
    pub async fn append_attachments(
        &self,
        id: Uuid,
        kind: AttachmentKind,
        attachments: &[Attachment],
    ) -> Result<ItemRecord, DbError> {
        let sql = format!(
            "UPDATE items SET {col} = {col} || $2, updated_at = NOW() WHERE id = $1 RETURNING *",
            col = kind.as_str()
        );
        sqlx::query_as::<_, ItemRecord>(&sql)
            .bind(id)
            .bind(Json(attachments))
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("item", id))
    }

    /// Remove the attachment at `index` with the item row locked.
    pub async fn remove_attachment(
        &self,
        id: Uuid,
        kind: AttachmentKind,
        index: usize,
    ) -> Result<Attachment, DbError> {
        let mut tx = self.pool.begin().await?;

        let mut record =
            sqlx::query_as::<_, ItemRecord>("SELECT * FROM items WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("item", id))?;

        let list = record.attachments_mut(kind);
        if index >= list.len() {
            return Err(ValidationError::InvalidFormat {
                field: "index",
                reason: "attachment index out of range",
            }
            .into());
        }
        let removed = list.remove(index);

        let sql = format!(
            "UPDATE items SET {} = $2, updated_at = NOW() WHERE id = $1",
            kind.as_str()
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(Json(&*list))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(removed)
    }
}
