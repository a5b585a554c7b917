//! Dashboard aggregation
//!
//! All counts run concurrently on the pool; recent activity merges the
//! latest boxes and items into one timeline.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use super::boxes::{BoxRecord, BOX_SCHEMA};
use super::items::{ItemRecord, ITEM_SCHEMA};
use crate::db::DbError;
use crate::query::{Collection, Filter, Find, Order};

/// Entries kept in the merged timeline
const ACTIVITY_LIMIT: usize = 10;

/// Rows taken from each source before merging
const ACTIVITY_SOURCE_LIMIT: i64 = 5;

/// Window for growth figures
const GROWTH_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Scan,
    Update,
    Add,
}

/// One dashboard timeline entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub message: String,
    pub time: DateTime<Utc>,
    pub icon: &'static str,
    pub color: &'static str,
    pub ref_id: Uuid,
}

impl Activity {
    fn from_box(record: &BoxRecord) -> Self {
        match record.last_scanned {
            Some(at) => Self {
                kind: ActivityKind::Scan,
                message: format!("Scanned box \"{}\"", record.name),
                time: at,
                icon: "fa-credit-card",
                color: "primary",
                ref_id: record.id,
            },
            None => Self {
                kind: ActivityKind::Update,
                message: format!("Updated box \"{}\"", record.name),
                time: record.updated_at,
                icon: "fa-edit",
                color: "info",
                ref_id: record.id,
            },
        }
    }

    fn from_item(record: &ItemRecord) -> Self {
        let target = record
            .box_summary
            .as_ref()
            .map(|b| b.name.as_str())
            .unwrap_or("unassigned");
        Self {
            kind: ActivityKind::Add,
            message: format!("Added item \"{}\" to \"{}\"", record.name, target),
            time: record.created_at,
            icon: "fa-plus",
            color: "success",
            ref_id: record.id,
        }
    }
}

/// Merge box and item activity, newest first.
pub fn recent_activity(boxes: &[BoxRecord], items: &[ItemRecord]) -> Vec<Activity> {
    let mut activities: Vec<Activity> = boxes
        .iter()
        .map(Activity::from_box)
        .chain(items.iter().map(Activity::from_item))
        .collect();
    activities.sort_by(|a, b| b.time.cmp(&a.time));
    activities.truncate(ACTIVITY_LIMIT);
    activities
}

/// Dashboard payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_boxes: i64,
    pub total_items: i64,
    pub nfc_boxes: i64,
    pub scanned_boxes: i64,
    pub low_stock_items: i64,
    pub box_growth: i64,
    pub item_growth: i64,
    pub recent_activity: Vec<Activity>,
}

/// Dashboard repository
pub struct DashboardRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    async fn count<T: Collection>(&self, doc: Value) -> Result<i64, DbError> {
        let filter = Filter::parse(T::schema(), &doc)?;
        Find::<T>::new(filter).count(self.pool).await
    }

    /// Created in the current window minus created in the window before it.
    async fn growth<T: Collection>(&self, now: DateTime<Utc>) -> Result<i64, DbError> {
        let window = Duration::days(GROWTH_WINDOW_DAYS);
        let current_start = (now - window).to_rfc3339();
        let previous_start = (now - window - window).to_rfc3339();

        let (current, previous) = tokio::try_join!(
            self.count::<T>(json!({"createdAt": {"$gte": current_start}})),
            self.count::<T>(json!({"createdAt": {"$gte": previous_start, "$lt": current_start}})),
        )?;
        Ok(current - previous)
    }

    async fn activity(&self) -> Result<Vec<Activity>, DbError> {
        let (boxes, items) = tokio::try_join!(
            Find::<BoxRecord>::all()
                .sort("updatedAt", Order::Desc)
                .limit(ACTIVITY_SOURCE_LIMIT)
                .exec(self.pool),
            Find::<ItemRecord>::all()
                .sort("createdAt", Order::Desc)
                .limit(ACTIVITY_SOURCE_LIMIT)
                .populate("box")
                .exec(self.pool),
        )?;
        Ok(recent_activity(&boxes, &items))
    }

    pub async fn stats(&self) -> Result<DashboardStats, DbError> {
        let now = Utc::now();
        let (
            total_boxes,
            total_items,
            nfc_boxes,
            scanned_boxes,
            low_stock_items,
            box_growth,
            item_growth,
            recent_activity,
        ) = tokio::try_join!(
            self.count::<BoxRecord>(json!({})),
            self.count::<ItemRecord>(json!({})),
            self.count::<BoxRecord>(json!({"nfcId": {"$exists": true}})),
            self.count::<BoxRecord>(json!({"lastScanned": {"$exists": true}})),
            self.count::<ItemRecord>(json!({"status": {"$in": ["low", "empty"]}})),
            self.growth::<BoxRecord>(now),
            self.growth::<ItemRecord>(now),
            self.activity(),
        )?;

        Ok(DashboardStats {
            total_boxes,
            total_items,
            nfc_boxes,
            scanned_boxes,
            low_stock_items,
            box_growth,
            item_growth,
            recent_activity,
        })
    }
}
