//! Item endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::repos::{CategoryStat, ItemChanges, ItemQuery, ItemRecord, ItemRepo, NewItem};
use crate::http::error::ApiError;
use crate::http::extractors::{nullable, parse_uuid, JsonBody, ValidUuid};
use crate::http::response::Envelope;
use crate::http::server::AppState;
use crate::models::validation::{non_negative, optional_text};
use crate::models::{
    Attachment, AttachmentKind, Category, Condition, Name, Pagination, PaginationParams,
    StockStatus, ValidationError,
};

const MAX_DESCRIPTION_LEN: usize = 2000;
const MAX_NOTES_LEN: usize = 5000;
const MAX_UNIT_LEN: usize = 32;
const MAX_TAG_LEN: usize = 50;
const DEFAULT_UNIT: &str = "pcs";
const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Item with derived fields
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    #[serde(flatten)]
    pub record: ItemRecord,
    pub warranty_expired: Option<bool>,
    pub main_photo: Option<Attachment>,
}

impl From<ItemRecord> for ItemResponse {
    fn from(record: ItemRecord) -> Self {
        Self {
            warranty_expired: record.warranty_expired(Utc::now().date_naive()),
            main_photo: record.main_photo().cloned(),
            record,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub condition: Option<String>,
    pub box_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TryFrom<ListParams> for ItemQuery {
    type Error = ValidationError;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Ok(Self {
            search: present(params.search),
            category: present(params.category),
            status: present(params.status)
                .map(|s| s.trim().parse::<StockStatus>())
                .transpose()?,
            condition: present(params.condition)
                .map(|s| s.trim().parse::<Condition>())
                .transpose()?,
            box_id: optional_uuid("boxId", params.box_id.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub limit: Option<u32>,
}

/// Create item request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "box")]
    pub box_id: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i32>,
    pub unit: Option<String>,
    pub low_stock_threshold: Option<i32>,
    pub condition: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub warranty_until: Option<NaiveDate>,
    pub tags: Option<Vec<String>>,
    pub specifications: Option<Value>,
    pub notes: Option<String>,
}

impl TryFrom<CreateItemRequest> for NewItem {
    type Error = ValidationError;

    fn try_from(req: CreateItemRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: Name::new("name", req.name.as_deref().unwrap_or_default())?,
            description: optional_text(
                "description",
                req.description.as_deref(),
                MAX_DESCRIPTION_LEN,
            )?,
            box_id: optional_uuid("boxId", req.box_id.as_deref())?,
            category: Category::new(req.category.as_deref())?,
            quantity: non_negative("quantity", req.quantity.unwrap_or(1))?,
            unit: optional_text("unit", req.unit.as_deref(), MAX_UNIT_LEN)?
                .unwrap_or_else(|| DEFAULT_UNIT.to_owned()),
            low_stock_threshold: non_negative(
                "lowStockThreshold",
                req.low_stock_threshold.unwrap_or(1),
            )?,
            condition: req
                .condition
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().parse::<Condition>())
                .transpose()?
                .unwrap_or_default(),
            purchase_date: req.purchase_date,
            purchase_price: req.purchase_price.map(price).transpose()?,
            warranty_until: req.warranty_until,
            tags: normalize_tags(req.tags.unwrap_or_default())?,
            specifications: specifications(req.specifications)?,
            notes: optional_text("notes", req.notes.as_deref(), MAX_NOTES_LEN)?,
        })
    }
}

/// Update item request: absent keeps, `null` clears
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", alias = "box")]
    pub box_id: Option<Option<String>>,
    pub category: Option<String>,
    pub quantity: Option<i32>,
    pub unit: Option<String>,
    pub low_stock_threshold: Option<i32>,
    pub condition: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub purchase_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub purchase_price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub warranty_until: Option<Option<NaiveDate>>,
    pub tags: Option<Vec<String>>,
    pub specifications: Option<Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl TryFrom<UpdateItemRequest> for ItemChanges {
    type Error = ValidationError;

    fn try_from(req: UpdateItemRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: req
                .name
                .map(|name| Name::new("name", name.as_deref().unwrap_or_default()))
                .transpose()?,
            description: req
                .description
                .map(|v| optional_text("description", v.as_deref(), MAX_DESCRIPTION_LEN))
                .transpose()?,
            box_id: req
                .box_id
                .map(|v| optional_uuid("boxId", v.as_deref()))
                .transpose()?,
            category: req
                .category
                .map(|c| Category::new(Some(c.as_str())))
                .transpose()?,
            quantity: req
                .quantity
                .map(|q| non_negative("quantity", q))
                .transpose()?,
            unit: req
                .unit
                .map(|u| {
                    optional_text("unit", Some(u.as_str()), MAX_UNIT_LEN)?
                        .ok_or(ValidationError::Empty { field: "unit" })
                })
                .transpose()?,
            low_stock_threshold: req
                .low_stock_threshold
                .map(|t| non_negative("lowStockThreshold", t))
                .transpose()?,
            condition: req
                .condition
                .map(|c| c.trim().parse::<Condition>())
                .transpose()?,
            purchase_date: req.purchase_date,
            purchase_price: req
                .purchase_price
                .map(|p| p.map(price).transpose())
                .transpose()?,
            warranty_until: req.warranty_until,
            tags: req.tags.map(normalize_tags).transpose()?,
            specifications: req
                .specifications
                .map(|s| specifications(Some(s)))
                .transpose()?,
            notes: req
                .notes
                .map(|v| optional_text("notes", v.as_deref(), MAX_NOTES_LEN))
                .transpose()?,
        })
    }
}

/// Blank means unassigned.
fn optional_uuid(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<uuid::Uuid>, ValidationError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| parse_uuid(field, s))
        .transpose()
}

fn price(value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "purchasePrice",
            reason: "must be a finite number",
        });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: "purchasePrice",
        });
    }
    Ok(value)
}

/// Trim, drop blanks and duplicates, keep first-seen order.
fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>, ValidationError> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || out.iter().any(|t| t == tag) {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(ValidationError::TooLong {
                field: "tags",
                max: MAX_TAG_LEN,
            });
        }
        out.push(tag.to_owned());
    }
    Ok(out)
}

fn specifications(value: Option<Value>) -> Result<Value, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(Value::Object(Default::default())),
        Some(obj @ Value::Object(_)) => Ok(obj),
        Some(_) => Err(ValidationError::InvalidFormat {
            field: "specifications",
            reason: "must be a JSON object",
        }),
    }
}

/// GET /items - list items with filters and pagination
async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Envelope<Vec<ItemResponse>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: params.page,
        limit: params.limit,
    });
    let query = ItemQuery::try_from(params)?;
    let result = ItemRepo::new(&state.pool).list(&query, page).await?;
    Ok(Envelope::page(result.map(ItemResponse::from)))
}

/// GET /items/{id}
async fn get_item(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Envelope<ItemResponse>, ApiError> {
    let record = ItemRepo::new(&state.pool).get(id).await?;
    Ok(Envelope::ok(ItemResponse::from(record)))
}

/// POST /items - create an item, optionally inside a box
async fn create_item(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateItemRequest>,
) -> Result<Envelope<ItemResponse>, ApiError> {
    let new = NewItem::try_from(req)?;
    let record = ItemRepo::new(&state.pool).create(new).await?;
    Ok(Envelope::created(ItemResponse::from(record)).message("Item created"))
}

/// PUT /items/{id} - partial update, `boxId: null` unassigns
async fn update_item(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<UpdateItemRequest>,
) -> Result<Envelope<ItemResponse>, ApiError> {
    let changes = ItemChanges::try_from(req)?;
    let record = ItemRepo::new(&state.pool).update(id, changes).await?;
    Ok(Envelope::ok(ItemResponse::from(record)).message("Item updated"))
}

/// DELETE /items/{id} - removes the row, then its files
async fn delete_item(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Envelope<()>, ApiError> {
    let record = ItemRepo::new(&state.pool).delete(id).await?;
    for kind in [AttachmentKind::Photos, AttachmentKind::Documents] {
        state.uploads.discard(kind, record.attachments(kind)).await;
    }
    Ok(Envelope::done("Item deleted"))
}

/// GET /items/search/{query}
async fn search_items(
    State(state): State<Arc<AppState>>,
    Path(term): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<Envelope<Vec<ItemResponse>>, ApiError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(ValidationError::Empty { field: "query" }.into());
    }
    let limit = Pagination::new(1, params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT)).limit();
    let items = ItemRepo::new(&state.pool).search(term, limit).await?;
    Ok(Envelope::list(
        items.into_iter().map(ItemResponse::from).collect(),
    ))
}

/// GET /items/stats/categories
async fn category_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Envelope<Vec<CategoryStat>>, ApiError> {
    let stats = ItemRepo::new(&state.pool).category_stats().await?;
    Ok(Envelope::ok(stats))
}

/// Item routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/search/{query}", get(search_items))
        .route("/items/stats/categories", get(category_stats))
        .route(
            "/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
}
