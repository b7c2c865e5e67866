use std::fs;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use blobproc::server::{SpoolService, build_router, free_disk_percent};
use blobproc::services::urlmap::UrlMap;
use blobproc::spool::SpoolDir;

const HELLO_SHA1: &str = "1f09d30c707d53f3d16c530dd73d70a6ce7596a9";
const EMPTY_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

fn test_service(spool_root: &std::path::Path) -> Arc<SpoolService> {
    Arc::new(SpoolService {
        spool: SpoolDir::new(spool_root),
        listen_addr: "127.0.0.1:8000".to_string(),
        urlmap: None,
        min_free_disk_percent: 0,
        max_file_size: 0,
    })
}

fn test_router(spool_root: &std::path::Path) -> Router {
    build_router(test_service(spool_root))
}

async fn post_spool(app: Router, body: &'static [u8]) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/spool")
            .body(Body::from(body))
            .expect("request builder should not fail"),
    )
    .await
    .expect("upload handler should respond")
}

#[tokio::test]
async fn banner_returns_json_self_description() {
    let dir = TempDir::new().expect("temp spool");
    let response = test_router(dir.path())
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/")
                .body(Body::empty())
                .expect("request builder should not fail"),
        )
        .await
        .expect("banner handler should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .into_body()
        .collect()
        .await
        .expect("readable body")
        .to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&body).expect("banner must be JSON");
    assert_eq!(value["id"], "blobprocd");
    assert!(
        value["about"]
            .as_str()
            .expect("about field")
            .contains("/spool")
    );
}

#[tokio::test]
async fn upload_stores_file_under_sharded_sha1() {
    let dir = TempDir::new().expect("temp spool");
    let response = post_spool(test_router(dir.path()), b"hello, world!").await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .expect("location header")
            .to_str()
            .expect("valid header"),
        format!("/spool/{HELLO_SHA1}")
    );

    let stored = dir
        .path()
        .join("1f")
        .join("09")
        .join("d30c707d53f3d16c530dd73d70a6ce7596a9");
    let content = fs::read(&stored).expect("spooled file exists");
    assert_eq!(content.len(), 13);
    assert_eq!(content, b"hello, world!");
}

#[tokio::test]
async fn upload_of_known_vector_yields_expected_location() {
    let dir = TempDir::new().expect("temp spool");
    let response = post_spool(test_router(dir.path()), b"123").await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .expect("location header"),
        "/spool/40bd001563085fc35165329ea1ff5c5ecbdbbeef"
    );
}

#[tokio::test]
async fn duplicate_upload_is_idempotent() {
    let dir = TempDir::new().expect("temp spool");
    let service = test_service(dir.path());

    let first = post_spool(build_router(Arc::clone(&service)), b"hello, world!").await;
    assert_eq!(first.status(), StatusCode::ACCEPTED);
    let stored = dir
        .path()
        .join("1f")
        .join("09")
        .join("d30c707d53f3d16c530dd73d70a6ce7596a9");
    let mtime_before = fs::metadata(&stored).expect("stat").modified().expect("mtime");

    let second = post_spool(build_router(service), b"hello, world!").await;
    assert_eq!(second.status(), StatusCode::ACCEPTED);
    assert_eq!(
        second.headers().get(header::LOCATION).expect("location"),
        first.headers().get(header::LOCATION).expect("location"),
        "location must be stable across repeated uploads"
    );
    let mtime_after = fs::metadata(&stored).expect("stat").modified().expect("mtime");
    assert_eq!(mtime_before, mtime_after, "duplicate must not rewrite the file");
}

#[tokio::test]
async fn empty_upload_stores_empty_file() {
    let dir = TempDir::new().expect("temp spool");
    let response = post_spool(test_router(dir.path()), b"").await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        response.headers().get(header::LOCATION).expect("location"),
        &format!("/spool/{EMPTY_SHA1}")
    );
    let stored = dir
        .path()
        .join("da")
        .join("39")
        .join("a3ee5e6b4b0d3255bfef95601890afd80709");
    assert_eq!(fs::metadata(stored).expect("stat").len(), 0);
}

#[tokio::test]
async fn put_works_like_post() {
    let dir = TempDir::new().expect("temp spool");
    let response = test_router(dir.path())
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/spool")
                .body(Body::from(&b"hello, world!"[..]))
                .expect("request builder should not fail"),
        )
        .await
        .expect("upload handler should respond");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn declared_content_length_mismatch_is_an_error() {
    let dir = TempDir::new().expect("temp spool");
    let response = test_router(dir.path())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/spool")
                .header(header::CONTENT_LENGTH, "999")
                .body(Body::from(&b"hello, world!"[..]))
                .expect("request builder should not fail"),
        )
        .await
        .expect("upload handler should respond");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // No file may appear in the spool for a failed upload.
    assert!(!dir.path().join("1f").exists());
}

#[tokio::test]
async fn matching_content_length_is_accepted() {
    let dir = TempDir::new().expect("temp spool");
    let response = test_router(dir.path())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/spool")
                .header(header::CONTENT_LENGTH, "13")
                .body(Body::from(&b"hello, world!"[..]))
                .expect("request builder should not fail"),
        )
        .await
        .expect("upload handler should respond");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn oversized_declared_length_is_rejected_up_front() {
    let dir = TempDir::new().expect("temp spool");
    let service = Arc::new(SpoolService {
        spool: SpoolDir::new(dir.path()),
        listen_addr: "127.0.0.1:8000".to_string(),
        urlmap: None,
        min_free_disk_percent: 0,
        max_file_size: 8,
    });
    let response = build_router(service)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/spool")
                .header(header::CONTENT_LENGTH, "13")
                .body(Body::from(&b"hello, world!"[..]))
                .expect("request builder should not fail"),
        )
        .await
        .expect("upload handler should respond");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn oversized_body_without_declared_length_is_rejected_mid_stream() {
    let dir = TempDir::new().expect("temp spool");
    let service = Arc::new(SpoolService {
        spool: SpoolDir::new(dir.path()),
        listen_addr: "127.0.0.1:8000".to_string(),
        urlmap: None,
        min_free_disk_percent: 0,
        max_file_size: 8,
    });
    let response = post_spool(build_router(service), b"hello, world!").await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn disk_pressure_yields_429_with_retry_after() {
    let dir = TempDir::new().expect("temp spool");
    if free_disk_percent(dir.path()).is_none() {
        // No usable mount information on this machine; admission is
        // fail-open and the pressure path cannot be exercised.
        return;
    }
    // Free space can never reach 101 percent, so the threshold trips.
    let service = Arc::new(SpoolService {
        spool: SpoolDir::new(dir.path()),
        listen_addr: "127.0.0.1:8000".to_string(),
        urlmap: None,
        min_free_disk_percent: 101,
        max_file_size: 0,
    });
    let response = post_spool(build_router(service), b"hello, world!").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response
            .headers()
            .get(header::RETRY_AFTER)
            .expect("retry-after header"),
        "60"
    );
}

#[tokio::test]
async fn status_route_reports_presence() {
    let dir = TempDir::new().expect("temp spool");
    let service = test_service(dir.path());

    let missing = build_router(Arc::clone(&service))
        .oneshot(
            Request::builder()
                .uri(format!("/spool/{HELLO_SHA1}"))
                .body(Body::empty())
                .expect("request builder should not fail"),
        )
        .await
        .expect("status handler should respond");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let upload = post_spool(build_router(Arc::clone(&service)), b"hello, world!").await;
    assert_eq!(upload.status(), StatusCode::ACCEPTED);

    let present = build_router(service)
        .oneshot(
            Request::builder()
                .uri(format!("/spool/{HELLO_SHA1}"))
                .body(Body::empty())
                .expect("request builder should not fail"),
        )
        .await
        .expect("status handler should respond");
    assert_eq!(present.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_id_yields_400() {
    let dir = TempDir::new().expect("temp spool");
    for id in ["123", "zz09d30c707d53f3d16c530dd73d70a6ce7596a9"] {
        let response = test_router(dir.path())
            .oneshot(
                Request::builder()
                    .uri(format!("/spool/{id}"))
                    .body(Body::empty())
                    .expect("request builder should not fail"),
            )
            .await
            .expect("status handler should respond");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "id {id}");
    }
}

#[tokio::test]
async fn listing_streams_one_json_line_per_file() {
    let dir = TempDir::new().expect("temp spool");
    let service = test_service(dir.path());

    for body in [&b"hello, world!"[..], &b"123"[..]] {
        let response = build_router(Arc::clone(&service))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/spool")
                    .body(Body::from(body))
                    .expect("request builder should not fail"),
            )
            .await
            .expect("upload handler should respond");
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let response = build_router(service)
        .oneshot(
            Request::builder()
                .uri("/spool")
                .body(Body::empty())
                .expect("request builder should not fail"),
        )
        .await
        .expect("list handler should respond");
    assert_eq!(response.status(), StatusCode::OK);

    let body = response
        .into_body()
        .collect()
        .await
        .expect("readable body")
        .to_bytes();
    let lines: Vec<serde_json::Value> = std::str::from_utf8(&body)
        .expect("listing is utf-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is a JSON object"))
        .collect();
    assert_eq!(lines.len(), 2);

    let names: Vec<&str> = lines
        .iter()
        .map(|value| value["name"].as_str().expect("name field"))
        .collect();
    assert!(names.contains(&HELLO_SHA1));
    assert!(names.contains(&"40bd001563085fc35165329ea1ff5c5ecbdbbeef"));
    let hello = lines
        .iter()
        .find(|value| value["name"] == HELLO_SHA1)
        .expect("hello entry");
    assert_eq!(hello["size"], 13);
    assert_eq!(
        hello["url"],
        format!("http://127.0.0.1:8000/spool/{HELLO_SHA1}")
    );
}

#[tokio::test]
async fn capture_url_header_is_recorded_in_audit_table() {
    let dir = TempDir::new().expect("temp spool");
    let db_dir = TempDir::new().expect("temp db dir");
    let urlmap = UrlMap::open(&db_dir.path().join("urlmap.sqlite"))
        .await
        .expect("open audit table");
    let service = Arc::new(SpoolService {
        spool: SpoolDir::new(dir.path()),
        listen_addr: "127.0.0.1:8000".to_string(),
        urlmap: Some(urlmap),
        min_free_disk_percent: 0,
        max_file_size: 0,
    });

    let response = build_router(Arc::clone(&service))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/spool")
                .header("X-BLOBPROC-URL", "https://example.org/paper.pdf")
                .body(Body::from(&b"hello, world!"[..]))
                .expect("request builder should not fail"),
        )
        .await
        .expect("upload handler should respond");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // Legacy header is honored when the primary one is absent.
    let response = build_router(Arc::clone(&service))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/spool")
                .header("X-Heritrix-CURI", "https://example.org/other.pdf")
                .body(Body::from(&b"123"[..]))
                .expect("request builder should not fail"),
        )
        .await
        .expect("upload handler should respond");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let urlmap = service.urlmap.as_ref().expect("audit table configured");
    assert_eq!(
        urlmap.count_for_sha1(HELLO_SHA1).await.expect("count"),
        1
    );
    assert_eq!(
        urlmap
            .count_for_sha1("40bd001563085fc35165329ea1ff5c5ecbdbbeef")
            .await
            .expect("count"),
        1
    );
}
