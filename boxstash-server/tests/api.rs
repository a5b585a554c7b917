//! End-to-end API tests against a real PostgreSQL.
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p boxstash-server -- --ignored
//!
//! Each test gets its own schema, dropped again at the end.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tempfile::TempDir;
use tower::ServiceExt;

use boxstash_server::db::migrations;
use boxstash_server::{build_router, AppState, ServerConfig};

struct TestApp {
    router: Router,
    pool: PgPool,
    admin: PgPool,
    schema: String,
    uploads: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let schema = format!("boxstash_test_{}", uuid::Uuid::new_v4().simple());

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .expect("admin connection");
        admin
            .execute(format!("CREATE SCHEMA {schema}").as_str())
            .await
            .expect("create schema");

        let search_path = schema.clone();
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    conn.execute(format!("SET search_path TO {search_path}").as_str())
                        .await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await
            .expect("test pool");
        migrations::run(&pool).await.expect("migrations");

        let uploads = TempDir::new().expect("upload dir");
        let config = ServerConfig {
            database_url: url,
            upload_dir: uploads.path().to_path_buf(),
            max_file_size: 1024,
            ..ServerConfig::default()
        };
        let state = AppState::new(pool.clone(), config);
        state.uploads.ensure_dirs().await.expect("upload dirs");
        let router = build_router(Arc::new(state));

        Self {
            router,
            pool,
            admin,
            schema,
            uploads,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        self.send(request).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(body)).await
    }

    async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(body)).await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, None).await
    }

    async fn create_box(&self, body: Value) -> String {
        let (status, body) = self.post("/api/boxes", body).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_owned()
    }

    async fn create_item(&self, body: Value) -> String {
        let (status, body) = self.post("/api/items", body).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_owned()
    }

    async fn current_items(&self, box_id: &str) -> i64 {
        let (_, body) = self.get(&format!("/api/boxes/{box_id}")).await;
        body["data"]["currentItems"].as_i64().unwrap()
    }

    async fn cleanup(self) {
        self.pool.close().await;
        self.admin
            .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await
            .expect("drop schema");
    }
}

fn multipart(field: &str, files: &[(&str, &str, &[u8])], texts: &[(&str, &str)]) -> Request<Body> {
    const BOUNDARY: &str = "boxstash-test-boundary";
    let mut body = Vec::new();
    for (name, mime, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in texts {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

fn upload_request(uri: &str, field: &str, files: &[(&str, &str, &[u8])]) -> Request<Body> {
    captioned_upload(uri, field, files, &[])
}

fn captioned_upload(
    uri: &str,
    field: &str,
    files: &[(&str, &str, &[u8])],
    texts: &[(&str, &str)],
) -> Request<Body> {
    let mut request = multipart(field, files, texts);
    *request.uri_mut() = uri.parse().unwrap();
    request
}

#[tokio::test]
#[ignore = "requires database"]
async fn box_crud_and_partial_update() {
    let app = TestApp::new().await;

    let (status, body) = app.post("/api/boxes", json!({"location": "Attic"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let id = app
        .create_box(json!({"name": "Camping gear", "location": "Garage", "description": "Tents", "capacity": 4}))
        .await;

    let (status, body) = app
        .put(&format!("/api/boxes/{id}"), json!({"description": null, "capacity": 8}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["location"], "Garage");
    assert!(body["data"]["description"].is_null());
    assert_eq!(body["data"]["capacity"], 8);
    assert_eq!(body["data"]["isFull"], false);

    let (status, _) = app
        .put(&format!("/api/boxes/{id}"), json!({"name": "  "}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/boxes?search=camp").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);

    let (status, body) = app.get("/api/boxes?location=attic").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (status, _) = app.delete(&format!("/api/boxes/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/boxes/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&format!("/api/boxes/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn nfc_tags_are_unique() {
    let app = TestApp::new().await;

    let first = app.create_box(json!({"name": "A", "nfcId": "04A1B2"})).await;
    let (status, body) = app
        .post("/api/boxes", json!({"name": "B", "nfcId": "04A1B2"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conflict");

    let second = app.create_box(json!({"name": "B"})).await;
    let (status, _) = app
        .put(&format!("/api/boxes/{second}"), json!({"nfcId": "04A1B2"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/nfc/bind", json!({"boxId": second, "nfcId": "04a1b2"}))
        .await;
    assert_eq!(status, StatusCode::OK, "tags differing in case are distinct");

    let (status, _) = app
        .post("/api/nfc/bind", json!({"boxId": first, "nfcId": "04A1B2"}))
        .await;
    assert_eq!(status, StatusCode::OK, "rebinding the same tag is a no-op");

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn item_moves_keep_counts_in_sync() {
    let app = TestApp::new().await;
    let kitchen = app.create_box(json!({"name": "Kitchen"})).await;
    let cellar = app.create_box(json!({"name": "Cellar"})).await;

    let item = app
        .create_item(json!({"name": "Jam jars", "boxId": kitchen, "quantity": 6}))
        .await;
    assert_eq!(app.current_items(&kitchen).await, 1);

    let (status, body) = app
        .put(&format!("/api/items/{item}"), json!({"boxId": cellar}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["box"]["name"], "Cellar");
    assert_eq!(app.current_items(&kitchen).await, 0);
    assert_eq!(app.current_items(&cellar).await, 1);

    let (status, body) = app
        .put(&format!("/api/items/{item}"), json!({"boxId": null}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["boxId"].is_null());
    assert_eq!(app.current_items(&cellar).await, 0);

    let (status, _) = app
        .put(
            &format!("/api/items/{item}"),
            json!({"boxId": uuid::Uuid::new_v4()}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/api/items",
            json!({"name": "Orphan", "boxId": uuid::Uuid::new_v4()}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn concurrent_item_creates_do_not_lose_counts() {
    let app = TestApp::new().await;
    let box_id = app.create_box(json!({"name": "Busy"})).await;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..12 {
        let router = app.router.clone();
        let body = json!({"name": format!("Item {i}"), "boxId": box_id});
        tasks.spawn(async move {
            let request = Request::post("/api/items")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            router.oneshot(request).await.unwrap().status()
        });
    }
    while let Some(status) = tasks.join_next().await {
        assert_eq!(status.unwrap(), StatusCode::CREATED);
    }

    assert_eq!(app.current_items(&box_id).await, 12);
    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn non_empty_box_cannot_be_deleted() {
    let app = TestApp::new().await;
    let box_id = app.create_box(json!({"name": "Toolbox"})).await;
    let a = app.create_item(json!({"name": "Hammer", "boxId": box_id})).await;
    app.create_item(json!({"name": "Saw", "boxId": box_id})).await;

    let (status, body) = app.delete(&format!("/api/boxes/{box_id}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains('2'), "{body}");

    let (status, body) = app.get(&format!("/api/boxes/{box_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Hammer", "Saw"]);

    let (status, body) = app.get(&format!("/api/boxes/{box_id}/items?limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["pagination"]["pages"], 2);

    let (status, _) = app
        .put(&format!("/api/items/{a}"), json!({"boxId": null}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/items").await;
    assert_eq!(body["pagination"]["total"], 2);

    let items: Vec<String> = app.get(&format!("/api/boxes/{box_id}/items")).await.1["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap().to_owned())
        .collect();
    for id in items {
        let (status, _) = app.delete(&format!("/api/items/{id}")).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = app.delete(&format!("/api/boxes/{box_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .get(&format!("/api/boxes/{}/items", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn nfc_scan_bind_unbind_validate() {
    let app = TestApp::new().await;
    let box_id = app.create_box(json!({"name": "Attic bin"})).await;

    let (status, body) = app.get("/api/nfc/scan/DEADBEEF").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("DEADBEEF"));

    let (status, _) = app.post("/api/nfc/bind", json!({"nfcId": "DEADBEEF"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/nfc/bind", json!({"boxId": box_id, "nfcId": "DEADBEEF"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/boxes/nfc/DEADBEEF").await;
    assert_eq!(body["data"]["scanCount"], 0, "lookup does not count as a scan");

    for expected in 1..=3 {
        let (status, body) = app.get("/api/nfc/scan/DEADBEEF").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["scanCount"], expected);
        assert!(body["data"]["lastScanned"].is_string());
    }

    let (_, body) = app.get("/api/nfc/bindings").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["nfcId"], "DEADBEEF");

    let (status, body) = app.post("/api/nfc/validate", json!({"nfcId": "DEADBEEF"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["available"], false);
    assert_eq!(body["data"]["boundTo"], "Attic bin");

    let (status, _) = app.post("/api/nfc/validate", json!({"nfcId": "xyz"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.post("/api/nfc/validate", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post("/api/nfc/unbind", json!({"boxId": box_id})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["nfcId"].is_null());
    let (status, _) = app
        .post("/api/nfc/unbind", json!({"boxId": uuid::Uuid::new_v4()}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.post("/api/nfc/validate", json!({"nfcId": "DEADBEEF"})).await;
    assert_eq!(body["data"]["available"], true);

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn status_search_and_category_stats() {
    let app = TestApp::new().await;
    let drill = app
        .create_item(json!({"name": "Drill", "category": "tools", "quantity": 1, "tags": ["power"]}))
        .await;
    app.create_item(json!({"name": "Screws", "category": "tools", "quantity": 0}))
        .await;
    app.create_item(json!({"name": "Flour", "category": "pantry", "quantity": 5, "description": "Baking"}))
        .await;

    let (_, body) = app.get(&format!("/api/items/{drill}")).await;
    assert_eq!(body["data"]["status"], "low");
    assert_eq!(body["data"]["condition"], "good");
    assert!(body["data"]["warrantyExpired"].is_null());

    let (_, body) = app
        .put(&format!("/api/items/{drill}"), json!({"quantity": 4}))
        .await;
    assert_eq!(body["data"]["status"], "sufficient");

    let (_, body) = app.get("/api/items?status=empty").await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Screws");

    let (_, body) = app.get("/api/items/search/POWER").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["name"], "Drill");

    let (_, body) = app.get("/api/items/search/bak").await;
    assert_eq!(body["data"][0]["name"], "Flour");

    let (_, body) = app.get("/api/items/search/100%25").await;
    assert_eq!(body["count"], 0, "LIKE metacharacters are literal");

    let (_, body) = app.get("/api/items/stats/categories").await;
    assert_eq!(body["data"][0]["category"], "tools");
    assert_eq!(body["data"][0]["count"], 2);
    assert_eq!(body["data"][0]["totalQuantity"], 4);
    assert_eq!(body["data"][1]["category"], "pantry");

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn dashboard_counts() {
    let app = TestApp::new().await;
    let tagged = app.create_box(json!({"name": "Tagged", "nfcId": "0A0B"})).await;
    app.create_box(json!({"name": "Plain"})).await;
    app.create_item(json!({"name": "Rope", "boxId": tagged, "quantity": 0}))
        .await;
    app.create_item(json!({"name": "Tape", "quantity": 9})).await;
    app.get("/api/nfc/scan/0A0B").await;

    let (status, body) = app.get("/api/dashboard/stats").await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["totalBoxes"], 2);
    assert_eq!(data["totalItems"], 2);
    assert_eq!(data["nfcBoxes"], 1);
    assert_eq!(data["scannedBoxes"], 1);
    assert_eq!(data["lowStockItems"], 1);
    assert_eq!(data["boxGrowth"], 2);
    assert_eq!(data["itemGrowth"], 2);

    let activity = data["recentActivity"].as_array().unwrap();
    assert_eq!(activity.len(), 4);
    assert!(activity.iter().any(|a| a["type"] == "scan"));
    assert!(activity
        .iter()
        .any(|a| a["message"] == "Added item \"Rope\" to \"Tagged\""));
    assert!(activity
        .iter()
        .any(|a| a["message"] == "Added item \"Tape\" to \"unassigned\""));

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn photo_upload_and_removal() {
    let app = TestApp::new().await;
    let item = app.create_item(json!({"name": "Lamp"})).await;
    let uri = format!("/api/files/photos/{item}");

    let photos = app.uploads.path().join("photos");
    let (status, body) = app
        .send(upload_request(&uri, "photos", &[("notes.txt", "text/plain", &b"not an image"[..])]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "upload_error");
    assert_eq!(std::fs::read_dir(&photos).unwrap().count(), 0);

    let (status, body) = app
        .send(captioned_upload(
            &uri,
            "photos",
            &[("a.png", "image/png", &b"png-a"[..]), ("b.jpg", "image/jpeg", &b"jpg-b"[..])],
            &[("caption", "  shelf by the door ")],
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["caption"], "shelf by the door");
    assert_eq!(body["data"][1]["caption"], "shelf by the door");
    let first = body["data"][0]["filename"].as_str().unwrap().to_owned();
    let second = body["data"][1]["filename"].as_str().unwrap().to_owned();
    assert!(photos.join(&first).exists());

    let (_, body) = app.get(&format!("/api/items/{item}")).await;
    assert_eq!(body["data"]["photos"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["photos"][1]["caption"], "shelf by the door");
    assert_eq!(body["data"]["mainPhoto"]["filename"], first.as_str());

    let (status, _) = app.delete(&format!("/api/files/photos/{item}/5")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.delete(&format!("/api/files/photos/{item}/0")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!photos.join(&first).exists());
    let (_, body) = app.get(&format!("/api/items/{item}")).await;
    assert_eq!(body["data"]["mainPhoto"]["filename"], second.as_str());

    let (status, _) = app.delete(&format!("/api/items/{item}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!photos.join(&second).exists(), "item delete removes files");

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn rejected_uploads_leave_no_files() {
    let app = TestApp::new().await;
    let item = app.create_item(json!({"name": "Manual holder"})).await;
    let uri = format!("/api/files/documents/{item}");
    let documents = app.uploads.path().join("documents");

    let (status, _) = app
        .send(upload_request(
            &uri,
            "documents",
            &[("ok.pdf", "application/pdf", &b"%PDF"[..]), ("bad.exe", "application/x-msdownload", &b"MZ"[..])],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(&documents).unwrap().count(), 0);

    let big = vec![b'x'; 2048];
    let (status, body) = app
        .send(upload_request(&uri, "documents", &[("big.txt", "text/plain", big.as_slice())]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "upload_error");
    assert_eq!(std::fs::read_dir(&documents).unwrap().count(), 0);

    // Past 5 x MAX_FILE_SIZE + 1 MiB for the whole body
    let huge = vec![b'x'; 2 * 1024 * 1024];
    let (status, body) = app
        .send(upload_request(&uri, "documents", &[("huge.txt", "text/plain", huge.as_slice())]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "upload_error");
    assert_eq!(std::fs::read_dir(&documents).unwrap().count(), 0);

    let long_caption = "x".repeat(501);
    let (status, body) = app
        .send(captioned_upload(
            &uri,
            "documents",
            &[("a.pdf", "application/pdf", &b"%PDF"[..])],
            &[("caption", long_caption.as_str())],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "upload_error");
    assert_eq!(std::fs::read_dir(&documents).unwrap().count(), 0);

    let six: Vec<(&str, &str, &[u8])> = (0..6).map(|_| ("n.txt", "text/plain", &b"n"[..])).collect();
    let (status, _) = app.send(upload_request(&uri, "documents", &six)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(&documents).unwrap().count(), 0);

    let (status, _) = app.send(upload_request(&uri, "documents", &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = format!("/api/files/documents/{}", uuid::Uuid::new_v4());
    let (status, _) = app
        .send(upload_request(&missing, "documents", &[("a.pdf", "application/pdf", &b"%PDF"[..])]))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(std::fs::read_dir(&documents).unwrap().count(), 0);

    let (status, body) = app
        .send(upload_request(&uri, "documents", &[("Manual.PDF", "application/pdf", &b"%PDF"[..])]))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["type"], "pdf");

    app.cleanup().await;
}
