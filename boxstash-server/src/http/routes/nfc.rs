//! NFC endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::boxes::BoxResponse;
use crate::db::repos::{NfcBinding, NfcRepo, TagAvailability};
use crate::http::error::ApiError;
use crate::http::extractors::{parse_uuid, JsonBody, ValidNfcTag};
use crate::http::response::Envelope;
use crate::http::server::AppState;
use crate::models::{NfcTag, ValidationError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindRequest {
    pub box_id: Option<String>,
    pub nfc_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnbindRequest {
    pub box_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub nfc_id: Option<String>,
}

fn required_box_id(raw: Option<&str>) -> Result<Uuid, ValidationError> {
    match raw.filter(|s| !s.trim().is_empty()) {
        Some(id) => parse_uuid("boxId", id),
        None => Err(ValidationError::Empty { field: "boxId" }),
    }
}

/// GET /nfc/scan/{nfc_id} - record a scan
async fn scan(
    State(state): State<Arc<AppState>>,
    ValidNfcTag(tag): ValidNfcTag,
) -> Result<Envelope<BoxResponse>, ApiError> {
    let record = NfcRepo::new(&state.pool).scan(&tag).await?;
    Ok(Envelope::ok(BoxResponse::from(record)).message("NFC scan recorded"))
}

/// POST /nfc/bind
async fn bind(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<BindRequest>,
) -> Result<Envelope<BoxResponse>, ApiError> {
    let box_id = required_box_id(req.box_id.as_deref())?;
    let tag = NfcTag::new(req.nfc_id.as_deref().unwrap_or_default())?;
    let record = NfcRepo::new(&state.pool).bind(box_id, &tag).await?;
    Ok(Envelope::ok(BoxResponse::from(record)).message("NFC tag bound"))
}

/// POST /nfc/unbind
async fn unbind(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<UnbindRequest>,
) -> Result<Envelope<BoxResponse>, ApiError> {
    let box_id = required_box_id(req.box_id.as_deref())?;
    let record = NfcRepo::new(&state.pool).unbind(box_id).await?;
    Ok(Envelope::ok(BoxResponse::from(record)).message("NFC tag unbound"))
}

/// GET /nfc/bindings
async fn bindings(
    State(state): State<Arc<AppState>>,
) -> Result<Envelope<Vec<NfcBinding>>, ApiError> {
    let bindings = NfcRepo::new(&state.pool).bindings().await?;
    Ok(Envelope::list(bindings))
}

/// POST /nfc/validate - format check plus availability
async fn validate(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<ValidateRequest>,
) -> Result<Envelope<TagAvailability>, ApiError> {
    let tag = NfcTag::new(req.nfc_id.as_deref().unwrap_or_default())?;
    let availability = NfcRepo::new(&state.pool).availability(tag).await?;
    Ok(Envelope::ok(availability))
}

/// NFC routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/nfc/scan/{nfc_id}", get(scan))
        .route("/nfc/bind", post(bind))
        .route("/nfc/unbind", post(unbind))
        .route("/nfc/bindings", get(bindings))
        .route("/nfc/validate", post(validate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_id_is_required() {
        assert_eq!(
            required_box_id(None).unwrap_err(),
            ValidationError::Empty { field: "boxId" }
        );
        assert_eq!(
            required_box_id(Some("  ")).unwrap_err(),
            ValidationError::Empty { field: "boxId" }
        );
        assert!(required_box_id(Some("abc")).is_err());
    }

    #[test]
    fn bind_request_accepts_camel_case() {
        let req: BindRequest =
            serde_json::from_str(r#"{"boxId": "6f1c2a9e-5d34-4a8b-9b61-0c2d3e4f5a6b", "nfcId": "04A1"}"#)
                .unwrap();
        assert!(required_box_id(req.box_id.as_deref()).is_ok());
        assert_eq!(req.nfc_id.as_deref(), Some("04A1"));
    }
}
