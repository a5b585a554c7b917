//! Box endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use super::items::ItemResponse;
use crate::db::repos::{BoxChanges, BoxQuery, BoxRecord, BoxRepo, ItemRepo, NewBox};
use crate::http::error::ApiError;
use crate::http::extractors::{nullable, JsonBody, ValidNfcTag, ValidUuid};
use crate::http::response::Envelope;
use crate::http::server::AppState;
use crate::models::validation::{non_negative, optional_text};
use crate::models::{Name, NfcTag, Pagination, PaginationParams, ValidationError};

const MAX_LOCATION_LEN: usize = 255;
const MAX_DESCRIPTION_LEN: usize = 2000;
const MAX_IMAGE_URL_LEN: usize = 500;

/// Box with derived fields, optionally with its items
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxResponse {
    #[serde(flatten)]
    pub record: BoxRecord,
    pub is_full: bool,
    pub utilization: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemResponse>>,
}

impl From<BoxRecord> for BoxResponse {
    fn from(record: BoxRecord) -> Self {
        Self {
            is_full: record.is_full(),
            utilization: record.utilization(),
            record,
            items: None,
        }
    }
}

impl BoxResponse {
    fn with_items(mut self, items: Vec<ItemResponse>) -> Self {
        self.items = Some(items);
        self
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub location: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Create box request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoxRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "nfcTagId")]
    pub nfc_id: Option<String>,
    pub capacity: Option<i32>,
    pub image_url: Option<String>,
}

impl TryFrom<CreateBoxRequest> for NewBox {
    type Error = ValidationError;

    fn try_from(req: CreateBoxRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: Name::new("name", req.name.as_deref().unwrap_or_default())?,
            location: optional_text("location", req.location.as_deref(), MAX_LOCATION_LEN)?,
            description: optional_text(
                "description",
                req.description.as_deref(),
                MAX_DESCRIPTION_LEN,
            )?,
            nfc_id: optional_tag(req.nfc_id.as_deref())?,
            capacity: non_negative("capacity", req.capacity.unwrap_or(0))?,
            image_url: optional_text("imageUrl", req.image_url.as_deref(), MAX_IMAGE_URL_LEN)?,
        })
    }
}

/// Update box request: absent keeps, `null` clears
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoxRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", alias = "nfcTagId")]
    pub nfc_id: Option<Option<String>>,
    pub capacity: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
}

impl TryFrom<UpdateBoxRequest> for BoxChanges {
    type Error = ValidationError;

    fn try_from(req: UpdateBoxRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: req
                .name
                .map(|name| Name::new("name", name.as_deref().unwrap_or_default()))
                .transpose()?,
            location: req
                .location
                .map(|v| optional_text("location", v.as_deref(), MAX_LOCATION_LEN))
                .transpose()?,
            description: req
                .description
                .map(|v| optional_text("description", v.as_deref(), MAX_DESCRIPTION_LEN))
                .transpose()?,
            nfc_id: req
                .nfc_id
                .map(|v| optional_tag(v.as_deref()))
                .transpose()?,
            capacity: req
                .capacity
                .map(|c| non_negative("capacity", c))
                .transpose()?,
            image_url: req
                .image_url
                .map(|v| optional_text("imageUrl", v.as_deref(), MAX_IMAGE_URL_LEN))
                .transpose()?,
        })
    }
}

/// Blank means no tag.
fn optional_tag(raw: Option<&str>) -> Result<Option<NfcTag>, ValidationError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(NfcTag::new)
        .transpose()
}

/// GET /boxes - list boxes with search and pagination
async fn list_boxes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Envelope<Vec<BoxResponse>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: params.page,
        limit: params.limit,
    });
    let query = BoxQuery {
        search: params.search,
        location: params.location,
    };
    let result = BoxRepo::new(&state.pool).list(&query, page).await?;
    Ok(Envelope::page(result.map(BoxResponse::from)))
}

async fn with_items(state: &AppState, record: BoxRecord) -> Result<BoxResponse, ApiError> {
    let items = ItemRepo::new(&state.pool).all_in_box(record.id).await?;
    Ok(BoxResponse::from(record).with_items(items.into_iter().map(ItemResponse::from).collect()))
}

/// GET /boxes/{id} - box with its items
async fn get_box(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Envelope<BoxResponse>, ApiError> {
    let record = BoxRepo::new(&state.pool).get(id).await?;
    Ok(Envelope::ok(with_items(&state, record).await?))
}

/// GET /boxes/nfc/{nfc_id} - lookup without recording a scan
async fn get_box_by_nfc(
    State(state): State<Arc<AppState>>,
    ValidNfcTag(tag): ValidNfcTag,
) -> Result<Envelope<BoxResponse>, ApiError> {
    let record = BoxRepo::new(&state.pool).get_by_nfc(&tag).await?;
    Ok(Envelope::ok(with_items(&state, record).await?))
}

/// GET /boxes/{id}/items - paginated items of one box
async fn list_box_items(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    Query(params): Query<PaginationParams>,
) -> Result<Envelope<Vec<ItemResponse>>, ApiError> {
    BoxRepo::new(&state.pool).get(id).await?;
    let result = ItemRepo::new(&state.pool)
        .in_box(id, Pagination::from(params))
        .await?;
    Ok(Envelope::page(result.map(ItemResponse::from)))
}

/// POST /boxes - create a box
async fn create_box(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateBoxRequest>,
) -> Result<Envelope<BoxResponse>, ApiError> {
    let new = NewBox::try_from(req)?;
    let record = BoxRepo::new(&state.pool).create(new).await?;
    Ok(Envelope::created(BoxResponse::from(record)).message("Box created"))
}

/// PUT /boxes/{id} - partial update
async fn update_box(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<UpdateBoxRequest>,
) -> Result<Envelope<BoxResponse>, ApiError> {
    let changes = BoxChanges::try_from(req)?;
    let record = BoxRepo::new(&state.pool).update(id, changes).await?;
    Ok(Envelope::ok(BoxResponse::from(record)).message("Box updated"))
}

/// DELETE /boxes/{id} - only empty boxes
async fn delete_box(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Envelope<()>, ApiError> {
    BoxRepo::new(&state.pool).delete(id).await?;
    Ok(Envelope::done("Box deleted"))
}

/// Box routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/boxes", get(list_boxes).post(create_box))
        .route("/boxes/nfc/{nfc_id}", get(get_box_by_nfc))
        .route(
            "/boxes/{id}",
            get(get_box).put(update_box).delete(delete_box),
        )
        .route("/boxes/{id}/items", get(list_box_items))
}
