use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use mini_drive::{create_router_with_config, RouterConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tower::util::ServiceExt;

const BOUNDARY: &str = "mini-drive-test-boundary";

/// Asset layout:
///
/// ```text
/// Root (0)
/// ├── file1.txt (1)
/// └── folder1 (2)
///     └── file2.txt (3)
/// ```
struct TestDrive {
    dir: tempfile::TempDir,
    app: axum::Router,
}

impl TestDrive {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("asset");
        fs::create_dir_all(asset.join("folder1")).unwrap();
        fs::write(asset.join("file1.txt"), "hello").unwrap();
        fs::write(asset.join("folder1/file2.txt"), "nested").unwrap();

        let app = create_router_with_config(RouterConfig {
            asset_dir: asset,
            temp_dir: dir.path().join("temp"),
            static_dir: None,
        })
        .unwrap();

        Self { dir, app }
    }

    fn asset(&self) -> PathBuf {
        self.dir.path().join("asset")
    }

    fn temp(&self) -> PathBuf {
        self.dir.path().join("temp")
    }

    async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> axum::response::Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn delete(&self, uri: &str) -> axum::response::Response {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn add_folder(&self, parent: u64, name: &str) -> axum::response::Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(format!("/folders/{}/folders", parent))
                .header("content-type", "application/json")
                .body(Body::from(serde_json::json!({ "name": name }).to_string()))
                .unwrap(),
        )
        .await
    }

    async fn upload(&self, folder: u64, body: String) -> axum::response::Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(format!("/folders/{}/files", folder))
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

fn multipart_file(field: &str, file_name: &str, content: &str) -> String {
    format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n--{b}--\r\n",
        b = BOUNDARY,
    )
}

// Helper to get response body as string
async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_to_json(body: Body) -> serde_json::Value {
    serde_json::from_str(&body_to_string(body).await).unwrap()
}

fn names(listing: &serde_json::Value) -> Vec<&str> {
    listing
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect()
}

fn dir_is_empty(path: &Path) -> bool {
    fs::read_dir(path).unwrap().next().is_none()
}

#[tokio::test]
async fn test_health_check() {
    let drive = TestDrive::new();

    let response = drive.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_string(response.into_body()).await, "OK");
}

#[tokio::test]
async fn test_root_descriptor() {
    let drive = TestDrive::new();

    let response = drive.get("/root").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_to_json(response.into_body()).await,
        serde_json::json!({
            "id": 0,
            "name": "Root",
            "type": "folder",
            "path": [{"id": 0, "name": "Root"}]
        })
    );
}

#[tokio::test]
async fn test_list_root_folder() {
    let drive = TestDrive::new();

    let response = drive.get("/folders/0").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_to_json(response.into_body()).await,
        serde_json::json!([
            {"id": 1, "name": "file1.txt", "type": "file", "is_lock": false},
            {
                "id": 2,
                "name": "folder1",
                "type": "folder",
                "path": [{"id": 0, "name": "Root"}, {"id": 2, "name": "folder1"}]
            }
        ])
    );
}

#[tokio::test]
async fn test_folder_info_has_breadcrumb() {
    let drive = TestDrive::new();

    let response = drive.get("/folders/2/info").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["name"], "folder1");
    assert_eq!(
        json["path"],
        serde_json::json!([{"id": 0, "name": "Root"}, {"id": 2, "name": "folder1"}])
    );
}

#[tokio::test]
async fn test_list_errors() {
    let drive = TestDrive::new();

    assert_eq!(drive.get("/folders/1").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(drive.get("/folders/99").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        drive.get("/folders/not-a-number").await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_add_folder_resolves_collisions() {
    let drive = TestDrive::new();

    let mut created = Vec::new();
    for _ in 0..3 {
        let response = drive.add_folder(0, "dup").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_to_json(response.into_body()).await;
        created.push(json["name"].as_str().unwrap().to_string());
    }

    assert_eq!(created, vec!["dup", "dup_1", "dup_2"]);
    for name in &created {
        assert!(drive.asset().join(name).is_dir());
    }

    let listing = body_to_json(drive.get("/folders/0").await.into_body()).await;
    assert_eq!(
        names(&listing),
        vec!["file1.txt", "folder1", "dup", "dup_1", "dup_2"]
    );
}

#[tokio::test]
async fn test_add_folder_sanitizes_name() {
    let drive = TestDrive::new();

    let response = drive.add_folder(2, "a/b c").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["name"], "a_b_c");
    assert_eq!(json["path"][1], serde_json::json!({"id": 2, "name": "folder1"}));
    assert!(drive.asset().join("folder1/a_b_c").is_dir());

    let id = json["id"].as_u64().unwrap();
    let listing = body_to_json(drive.get(&format!("/folders/{}", id)).await.into_body()).await;
    assert_eq!(listing, serde_json::json!([]));
}

#[tokio::test]
async fn test_add_folder_rejects_bad_input() {
    let drive = TestDrive::new();

    assert_eq!(drive.add_folder(0, "  ").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(drive.add_folder(1, "x").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(drive.add_folder(42, "x").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_folder_removes_subtree() {
    let drive = TestDrive::new();

    let response = drive.delete("/nodes/2").await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!drive.asset().join("folder1").exists());
    assert_eq!(drive.get("/folders/2").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(drive.get("/nodes/3/lock").await.status(), StatusCode::NOT_FOUND);

    let listing = body_to_json(drive.get("/folders/0").await.into_body()).await;
    assert_eq!(names(&listing), vec!["file1.txt"]);

    assert_eq!(drive.delete("/nodes/2").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_root_is_refused() {
    let drive = TestDrive::new();

    assert_eq!(drive.delete("/nodes/0").await.status(), StatusCode::BAD_REQUEST);
    assert!(drive.asset().is_dir());
}

#[tokio::test]
async fn test_download_file() {
    let drive = TestDrive::new();

    let response = drive.get("/files/1/download").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename*=UTF-8''file1.txt"
    );
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "5");
    assert_eq!(body_to_string(response.into_body()).await, "hello");

    let lock = body_to_json(drive.get("/nodes/1/lock").await.into_body()).await;
    assert_eq!(lock, serde_json::json!(false));
}

#[tokio::test]
async fn test_download_lock_blocks_delete_until_body_dropped() {
    let drive = TestDrive::new();

    let response = drive.get("/files/3/download").await;
    assert_eq!(response.status(), StatusCode::OK);

    let file_lock = body_to_json(drive.get("/nodes/3/lock").await.into_body()).await;
    assert_eq!(file_lock, serde_json::json!(true));
    let folder_lock = body_to_json(drive.get("/nodes/2/lock").await.into_body()).await;
    assert_eq!(folder_lock, serde_json::json!(true));

    assert_eq!(drive.delete("/nodes/2").await.status(), StatusCode::CONFLICT);
    assert_eq!(drive.delete("/nodes/3").await.status(), StatusCode::CONFLICT);
    assert!(drive.asset().join("folder1/file2.txt").exists());

    drop(response);

    let file_lock = body_to_json(drive.get("/nodes/3/lock").await.into_body()).await;
    assert_eq!(file_lock, serde_json::json!(false));
    assert_eq!(drive.delete("/nodes/2").await.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_download_folder_is_refused() {
    let drive = TestDrive::new();

    assert_eq!(
        drive.get("/files/2/download").await.status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        drive.get("/files/77/download").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_upload_file() {
    let drive = TestDrive::new();

    let response = drive
        .upload(2, multipart_file("file", "my notes.txt", "first"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_to_json(response.into_body()).await,
        serde_json::json!({"file_nm": "my_notes.txt"})
    );

    let response = drive
        .upload(2, multipart_file("file", "my notes.txt", "second"))
        .await;
    assert_eq!(
        body_to_json(response.into_body()).await,
        serde_json::json!({"file_nm": "my_notes_1.txt"})
    );

    assert_eq!(
        fs::read_to_string(drive.asset().join("folder1/my_notes.txt")).unwrap(),
        "first"
    );
    assert_eq!(
        fs::read_to_string(drive.asset().join("folder1/my_notes_1.txt")).unwrap(),
        "second"
    );
    assert!(dir_is_empty(&drive.temp()));

    let listing = body_to_json(drive.get("/folders/2").await.into_body()).await;
    assert_eq!(
        names(&listing),
        vec!["file2.txt", "my_notes.txt", "my_notes_1.txt"]
    );
}

#[tokio::test]
async fn test_upload_without_file_field_is_rejected() {
    let drive = TestDrive::new();

    let response = drive
        .upload(0, multipart_file("attachment", "a.txt", "data"))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(dir_is_empty(&drive.temp()));
}

#[tokio::test]
async fn test_upload_to_missing_folder() {
    let drive = TestDrive::new();

    let response = drive.upload(99, multipart_file("file", "a.txt", "data")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(dir_is_empty(&drive.temp()));
}

#[tokio::test]
async fn test_parent_lookup() {
    let drive = TestDrive::new();

    let response = drive.get("/nodes/3/parent").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_to_json(response.into_body()).await,
        serde_json::json!({"id": 2})
    );

    assert_eq!(
        drive.get("/nodes/0/parent").await.status(),
        StatusCode::BAD_REQUEST
    );
}
