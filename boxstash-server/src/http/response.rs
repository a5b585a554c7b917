//! Response envelope shared by every JSON endpoint
//!
//! `{success, data?, message?, error?, pagination?, count?}`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::models::{Paginated, PaginationMeta};

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
            pagination: None,
            count: None,
            status: StatusCode::OK,
        }
    }

    /// 201 with the created resource
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(data)
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl<T: Serialize> Envelope<Vec<T>> {
    /// One page of results with its pagination block
    pub fn page(page: Paginated<T>) -> Self {
        let meta = page.meta();
        Self {
            pagination: Some(meta),
            ..Self::ok(page.items)
        }
    }

    /// A full list with its length as `count`
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        Self::ok(items).count(count)
    }
}

impl Envelope<()> {
    /// Success without a payload
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
            pagination: None,
            count: None,
            status: StatusCode::OK,
        }
    }

    /// Failure envelope
    pub fn failure(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            error: Some(error.to_owned()),
            pagination: None,
            count: None,
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pagination;
    use serde_json::json;

    #[test]
    fn ok_omits_empty_fields() {
        let value = serde_json::to_value(Envelope::ok(json!({"id": 1}))).unwrap();
        assert_eq!(value, json!({"success": true, "data": {"id": 1}}));
    }

    #[test]
    fn page_carries_pagination() {
        let page = Paginated {
            items: vec![1, 2],
            total: 42,
            page: Pagination::new(2, 20),
        };
        let value = serde_json::to_value(Envelope::page(page)).unwrap();
        assert_eq!(
            value["pagination"],
            json!({"page": 2, "limit": 20, "total": 42, "pages": 3})
        );
    }

    #[test]
    fn list_sets_count() {
        let value = serde_json::to_value(Envelope::list(vec!["a", "b", "c"])).unwrap();
        assert_eq!(value["count"], 3);
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            Envelope::created(1).into_response().status(),
            StatusCode::CREATED
        );
        let failure = Envelope::failure(StatusCode::NOT_FOUND, "not_found", "gone");
        assert!(!failure.success);
        assert_eq!(failure.into_response().status(), StatusCode::NOT_FOUND);
    }
}
