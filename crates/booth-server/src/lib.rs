//! booth-server - HTTP and WebSocket API over a festival booth store.
//!
//! The router is generic over any [`Backend`]: a type implementing both
//! [`RecordStore`](booth_core::RecordStore) and
//! [`BlobStore`](booth_core::BlobStore). Uploads run the same flow as the
//! library ([`booth_core::submit_booth`]), likes use the store's atomic
//! increment, and `/api/festivals/changes` relays the store's change stream
//! to WebSocket clients.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::{AppState, Backend};

/// Build the full router for `store`.
pub fn router<S: Backend>(store: Arc<S>, config: &ServerConfig) -> Router {
    let mut router = routes::routes::<S>()
        .with_state(AppState::new(store))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = config.build_cors_layer() {
        router = router.layer(cors);
    }

    router
}

/// Serve until Ctrl-C.
pub async fn serve<S: Backend>(
    listener: TcpListener,
    store: Arc<S>,
    config: ServerConfig,
) -> std::io::Result<()> {
    serve_with_shutdown(listener, store, config, shutdown_signal()).await
}

/// Serve until `shutdown` resolves.
pub async fn serve_with_shutdown<S, F>(
    listener: TcpListener,
    store: Arc<S>,
    config: ServerConfig,
    shutdown: F,
) -> std::io::Result<()>
where
    S: Backend,
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "Listening");

    axum::serve(listener, router(store, &config))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use booth_core::error::ErrorBody;
    use booth_core::{BoothId, BoothRecord, MemoryStore};
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const BOUNDARY: &str = "festival-boundary";

    fn record(id: &str, likes: u64, minute: u32) -> BoothRecord {
        BoothRecord {
            id: BoothId::new(id).unwrap(),
            title: format!("Booth {}", id),
            author: "Kim".to_string(),
            description: "A booth served over HTTP".to_string(),
            image_url: format!("memory://blobs/festival-booths/{}.png", id),
            likes,
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 12, minute, 0).unwrap(),
        }
    }

    fn app_with(store: MemoryStore, config: ServerConfig) -> Router {
        router(Arc::new(store), &config)
    }

    fn app(store: MemoryStore) -> Router {
        app_with(store, ServerConfig::default())
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, content_type, bytes)) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn multipart_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/festivals")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = app(MemoryStore::new()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_list_respects_order() {
        let store = MemoryStore::new();
        store.seed([record("a", 1, 30), record("b", 5, 10)]);

        let request = Request::builder()
            .uri("/api/festivals")
            .body(Body::empty())
            .unwrap();
        let response = app(store.clone()).oneshot(request).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body[0]["id"], "a");
        assert_eq!(body[1]["id"], "b");

        let request = Request::builder()
            .uri("/api/festivals?orderBy=likes&direction=desc")
            .body(Body::empty())
            .unwrap();
        let response = app(store).oneshot(request).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body[0]["id"], "b");
        assert_eq!(body[0]["studentsName"], "Kim");
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_sort() {
        let request = Request::builder()
            .uri("/api/festivals?orderBy=title")
            .body(Body::empty())
            .unwrap();
        let response = app(MemoryStore::new()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_missing_is_404() {
        let request = Request::builder()
            .uri("/api/festivals/ghost")
            .body(Body::empty())
            .unwrap();
        let response = app(MemoryStore::new()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorBody = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(body.error.as_deref(), Some("NotFound"));
    }

    #[tokio::test]
    async fn test_put_like_and_conflict() {
        let store = MemoryStore::new();
        let booth = json!({
            "id": "abc",
            "title": "Lemonade Stand",
            "studentsName": "Kim",
            "description": "Serves fresh lemonade",
            "imageUrl": "memory://blobs/festival-booths/abc.png"
        });
        let put = || {
            Request::builder()
                .method("PUT")
                .uri("/api/festivals/abc")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(booth.to_string()))
                .unwrap()
        };

        let response = app(store.clone()).oneshot(put()).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["likes"], 0);

        let like = Request::builder()
            .method("POST")
            .uri("/api/festivals/abc/like")
            .body(Body::empty())
            .unwrap();
        let response = app(store.clone()).oneshot(like).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["likes"], 1);

        let response = app(store).oneshot(put()).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_like_at_max_is_400() {
        let store = MemoryStore::new();
        store.seed([record("a", u64::MAX, 0)]);

        let like = Request::builder()
            .method("POST")
            .uri("/api/festivals/a/like")
            .body(Body::empty())
            .unwrap();
        let response = app(store.clone()).oneshot(like).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(body.error.as_deref(), Some("InvalidInput"));

        let get = Request::builder()
            .uri("/api/festivals/a")
            .body(Body::empty())
            .unwrap();
        let response = app(store).oneshot(get).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["likes"], u64::MAX);
    }

    #[tokio::test]
    async fn test_put_id_mismatch() {
        let request = Request::builder()
            .method("PUT")
            .uri("/api/festivals/other")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({
                    "id": "abc",
                    "title": "Tea",
                    "studentsName": "Lee",
                    "description": "Green tea all afternoon",
                    "imageUrl": "memory://blobs/t.png"
                })
                .to_string(),
            ))
            .unwrap();
        let response = app(MemoryStore::new()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_patch_and_delete() {
        let store = MemoryStore::new();
        store.seed([record("a", 1, 0)]);

        let patch = |body: &str| {
            Request::builder()
                .method("PATCH")
                .uri("/api/festivals/a")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        };

        let response = app(store.clone()).oneshot(patch(r#"{"likes":7}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["likes"], 7);

        let response = app(store.clone()).oneshot(patch("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let delete = || {
            Request::builder()
                .method("DELETE")
                .uri("/api/festivals/a")
                .body(Body::empty())
                .unwrap()
        };
        let response = app(store.clone()).oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = app(store).oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_form() {
        let store = MemoryStore::new();
        let body = multipart_body(
            &[
                ("title", "Lemonade Stand"),
                ("studentsName", "Kim"),
                (
                    "description",
                    "Serves fresh lemonade to thirsty festival-goers all day long",
                ),
            ],
            Some(("stand.png", "image/png", &b"\x89PNG\r\n"[..])),
        );

        let response = app(store.clone())
            .oneshot(multipart_request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let record: BoothRecord = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(record.likes, 0);
        assert_eq!(record.author, "Kim");
        assert!(
            record
                .image_url
                .starts_with("memory://blobs/festival-booths/")
        );
        assert!(record.image_url.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_upload_reports_every_field() {
        let body = multipart_body(&[("title", "L"), ("author", "K")], None);
        let response = app(MemoryStore::new())
            .oneshot(multipart_request(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = serde_json::from_value(json_body(response).await).unwrap();
        let fields: Vec<_> = body.fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, ["title", "studentsName", "description", "image"]);
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let config = ServerConfig {
            max_upload_bytes: 64,
            ..ServerConfig::default()
        };
        let body = multipart_body(
            &[("title", "Lemonade Stand")],
            Some(("stand.png", "image/png", &[0u8; 512][..])),
        );
        let response = app_with(MemoryStore::new(), config)
            .oneshot(multipart_request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_storage_round_trip() {
        let store = MemoryStore::new();

        let put = Request::builder()
            .method("PUT")
            .uri("/storage/festival-booths/a.png")
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from("png"))
            .unwrap();
        let response = app(store.clone()).oneshot(put).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["path"], "festival-booths/a.png");

        let get = Request::builder()
            .uri("/storage/festival-booths/a.png")
            .body(Body::empty())
            .unwrap();
        let response = app(store).oneshot(get).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"png");
    }

    #[tokio::test]
    async fn test_svg_blob_is_attachment() {
        let store = MemoryStore::new();
        let put = Request::builder()
            .method("PUT")
            .uri("/storage/festival-booths/a.svg")
            .header(header::CONTENT_TYPE, "image/svg+xml")
            .body(Body::from("<svg xmlns=\"http://www.w3.org/2000/svg\"/>"))
            .unwrap();
        let response = app(store.clone()).oneshot(put).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let get = Request::builder()
            .uri("/storage/festival-booths/a.svg")
            .body(Body::empty())
            .unwrap();
        let response = app(store).oneshot(get).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_DISPOSITION], "attachment");
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }

    #[tokio::test]
    async fn test_offline_store_is_503() {
        let store = MemoryStore::new();
        store.set_offline(true);

        let request = Request::builder()
            .uri("/api/festivals")
            .body(Body::empty())
            .unwrap();
        let response = app(store).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
