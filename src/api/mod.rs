//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api/v1` and speak JSON:
//! - Public listings and detail pages for published content
//! - Public donation intake
//! - Admin CRUD, statistics and media uploads under `/admin`
//!
//! Uploaded files are served read-only under `/uploads`.

pub mod common;
pub mod content;
pub mod donations;
pub mod media;
pub mod middleware;
pub mod site;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::models::{Campaign, Category, Donation, Event, Grant, Post, Program, Project, Resource};
use crate::services::upload::PUBLIC_PREFIX;

pub use middleware::{ApiError, AppState, RequestContext};

/// Build the `/api/v1` route table
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/admin/statistics", get(site::statistics))
        .route("/admin/donations/statistics", get(donations::donation_statistics))
        .nest(
            "/admin/posts",
            content::admin_router::<Post>()
                .route("/{id}", delete(content::admin_delete::<Post>)),
        )
        .nest("/admin/events", content::admin_router::<Event>())
        .nest("/admin/programs", content::admin_router::<Program>())
        .nest("/admin/projects", content::admin_router::<Project>())
        .nest("/admin/campaigns", content::admin_router::<Campaign>())
        .nest("/admin/grants", content::admin_router::<Grant>())
        .nest("/admin/resources", content::admin_router::<Resource>())
        .nest("/admin/categories", content::admin_router::<Category>())
        .nest("/admin/donations", content::admin_router::<Donation>())
        .nest(
            "/admin/media",
            media::admin_router(state.config.upload.max_file_size),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ));

    Router::new()
        .route("/health", get(site::health))
        .route("/home", get(site::home))
        .nest("/posts", content::public_router::<Post>())
        .nest("/events", content::public_router::<Event>())
        .nest("/programs", content::public_router::<Program>())
        .nest("/projects", content::public_router::<Project>())
        .nest("/campaigns", content::public_router::<Campaign>())
        .nest("/grants", content::public_router::<Grant>())
        .nest("/resources", content::public_router::<Resource>())
        .nest("/categories", content::public_router::<Category>())
        .route("/donations", post(donations::create_donation))
        .merge(admin_routes)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
            cors
        }
    }
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.upload.path);
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .nest_service(PUBLIC_PREFIX, uploads)
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_context))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{create_test_pool, migrations};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    async fn server_with(mut config: Config, dir: &TempDir) -> TestServer {
        config.upload.path = dir.path().join("uploads");
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        TestServer::new(build_router(AppState::new(pool, config))).expect("Failed to start server")
    }

    async fn app(config: Config) -> Router {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        build_router(AppState::new(pool, config))
    }

    async fn server(dir: &TempDir) -> TestServer {
        server_with(Config::default(), dir).await
    }

    async fn create_post(server: &TestServer, title: &str, status: &str) -> Value {
        let response = server
            .post("/api/v1/admin/posts")
            .json(&json!({"title": title, "content": "Hello *world*", "status": status}))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        response.json::<Value>()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir).await;
        let response = server.get("/api/v1/health").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["database"], "ok");
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir).await;
        let response = server
            .get("/api/v1/health")
            .add_header(
                header::HeaderName::from_static("x-request-id"),
                HeaderValue::from_static("abc-123"),
            )
            .await;
        assert_eq!(response.header("x-request-id"), "abc-123");
    }

    #[tokio::test]
    async fn test_public_listing_pagination() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir).await;
        for n in 1..=23 {
            create_post(&server, &format!("Report {}", n), "published").await;
        }
        create_post(&server, "Unfinished", "draft").await;

        let page: Value = server.get("/api/v1/posts?page=3&per_page=10").await.json();
        assert_eq!(page["records"].as_array().unwrap().len(), 3);
        assert_eq!(page["current_page"], 3);
        assert_eq!(page["last_page"], 3);
        assert_eq!(page["total_count"], 23);

        let page: Value = server.get("/api/v1/posts?page=4&per_page=10").await.json();
        assert!(page["records"].as_array().unwrap().is_empty());
        assert_eq!(page["last_page"], 3);

        let page: Value = server.get("/api/v1/posts?page=abc&per_page=10").await.json();
        assert_eq!(page["current_page"], 1);
        assert_eq!(page["records"][0]["title"], "Report 23");

        let admin: Value = server.get("/api/v1/admin/posts?status=draft").await.json();
        assert_eq!(admin["total_count"], 1);
    }

    #[tokio::test]
    async fn test_unknown_filter_is_rejected() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir).await;
        let response = server.get("/api/v1/posts?password=x").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_public_detail_hides_drafts() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir).await;
        create_post(&server, "Secret plans", "draft").await;
        let live = create_post(&server, "Annual report", "published").await;
        assert_eq!(live["slug"], "annual-report");
        assert!(live["content_html"].as_str().unwrap().contains("<em>world</em>"));

        let response = server.get("/api/v1/posts/secret-plans").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"]["code"], "NOT_FOUND");

        let response = server.get("/api/v1/posts/annual-report").await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_update_and_delete() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir).await;
        let post = create_post(&server, "Draft", "draft").await;
        let id = post["id"].as_i64().unwrap();

        let response = server
            .put(&format!("/api/v1/admin/posts/{}", id))
            .json(&json!({"title": "Final", "status": "published"}))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let updated: Value = response.json();
        assert_eq!(updated["title"], "Final");
        assert_eq!(updated["content"], "");
        assert!(!updated["published_at"].is_null());

        let response = server.delete(&format!("/api/v1/admin/posts/{}", id)).await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let response = server.get(&format!("/api/v1/admin/posts/{}", id)).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_body_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir).await;

        let response = server
            .post("/api/v1/admin/events")
            .json(&json!({"title": "No date"}))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let response = server
            .post("/api/v1/admin/events")
            .json(&json!({"title": "Backwards", "start_date": "2024-05-02", "end_date": "2024-05-01"}))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_donation_intake_is_pending() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir).await;
        let campaign: Value = server
            .post("/api/v1/admin/campaigns")
            .json(&json!({"title": "Clean water", "goal_cents": 1000, "raised_cents": 250, "status": "active"}))
            .await
            .json();
        assert_eq!(campaign["progress_percent"], 25.0);

        let response = server
            .post("/api/v1/donations")
            .json(&json!({
                "donor_name": "Grace",
                "donor_email": "grace@example.org",
                "amount_cents": 5000,
                "payment_method": "paypal",
                "campaign_id": campaign["id"],
                "status": "completed"
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["status"], "pending");

        let stats: Value = server.get("/api/v1/admin/donations/statistics").await.json();
        assert_eq!(stats["total_count"], 1);
        assert_eq!(stats["completed_count"], 0);
    }

    #[tokio::test]
    async fn test_admin_key_guard() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.admin.api_key = Some("s3cret".to_string());
        let server = server_with(config, &dir).await;

        let response = server.get("/api/v1/admin/statistics").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        let response = server
            .get("/api/v1/admin/statistics")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer wrong"))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        let response = server
            .get("/api/v1/admin/statistics")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let stats: Value = response.json();
        assert_eq!(stats["entities"].as_array().unwrap().len(), 10);

        // Public routes stay open
        let response = server.get("/api/v1/posts").await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_media_upload_and_delete() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir).await;

        let form = MultipartForm::new()
            .add_text("title", "Borehole")
            .add_part(
                "file",
                Part::bytes(b"fake-png".to_vec())
                    .file_name("well.png")
                    .mime_type("image/png"),
            );
        let response = server.post("/api/v1/admin/media").multipart(form).await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let media: Value = response.json();
        assert_eq!(media["title"], "Borehole");
        assert_eq!(media["size_bytes"], 8);

        let public_path = media["file_path"].as_str().unwrap().to_string();
        let file_name = media["file_name"].as_str().unwrap().to_string();
        let on_disk = dir.path().join("uploads").join(&file_name);
        assert!(on_disk.exists());

        let served = server.get(&public_path).await;
        assert_eq!(served.status_code(), StatusCode::OK);
        assert_eq!(served.as_bytes().as_ref(), b"fake-png");

        let response = server
            .delete(&format!("/api/v1/admin/media/{}", media["id"]))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn test_media_upload_rejects_type() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir).await;

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(b"<html>".to_vec())
                .file_name("page.html")
                .mime_type("text/html"),
        );
        let response = server.post("/api/v1/admin/media").multipart(form).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_route_carries_request_id() {
        use tower::ServiceExt;

        let response = app(Config::default())
            .await
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/v1/nowhere")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_media_upload_over_limit_is_too_large() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.upload.max_file_size = 16;
        let server = server_with(config, &dir).await;

        // Within the request body limit: stopped while reading the file
        // Past the request body limit: cut off by the body limit
        for size in [1_000, 200_000] {
            let form = MultipartForm::new().add_part(
                "file",
                Part::bytes(vec![0u8; size])
                    .file_name("big.png")
                    .mime_type("image/png"),
            );
            let response = server.post("/api/v1/admin/media").multipart(form).await;
            assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

            let error = &response.json::<Value>()["error"];
            assert_eq!(error["code"], "VALIDATION_ERROR");
            assert!(
                error["message"].as_str().unwrap().starts_with("File is too large"),
                "unexpected message for {} bytes: {}",
                size,
                error["message"]
            );
            assert_eq!(error["details"]["max_file_size"], 16);
            assert!(error["details"]["size"].as_u64().unwrap() > 16);
        }

        let stored = std::fs::read_dir(dir.path().join("uploads"))
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn test_media_update_keeps_stored_file() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir).await;

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(b"fake-png".to_vec())
                .file_name("well.png")
                .mime_type("image/png"),
        );
        let media: Value = server.post("/api/v1/admin/media").multipart(form).await.json();
        let file_path = media["file_path"].as_str().unwrap().to_string();
        let on_disk = dir.path().join("uploads").join(media["file_name"].as_str().unwrap());

        let response = server
            .put(&format!("/api/v1/admin/media/{}", media["id"]))
            .json(&json!({
                "title": "New well",
                "alt_text": "Pump at dusk",
                "file_name": "other.png",
                "file_path": "/uploads/other.png",
                "size_bytes": 1
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let updated: Value = response.json();
        assert_eq!(updated["title"], "New well");
        assert_eq!(updated["alt_text"], "Pump at dusk");
        assert_eq!(updated["file_path"], file_path.as_str());
        assert_eq!(updated["file_name"], media["file_name"]);
        assert_eq!(updated["size_bytes"], 8);

        server
            .delete(&format!("/api/v1/admin/media/{}", media["id"]))
            .await;
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn test_long_explicit_slug_is_rejected() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir).await;

        let response = server
            .post("/api/v1/admin/posts")
            .json(&json!({"title": "Report", "slug": "a".repeat(200), "content": ""}))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_home_feed() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir).await;
        for n in 1..=4 {
            create_post(&server, &format!("News {}", n), "published").await;
        }
        server
            .post("/api/v1/admin/events")
            .json(&json!({"title": "Gala", "start_date": "2999-01-01", "status": "published"}))
            .await;
        server
            .post("/api/v1/admin/events")
            .json(&json!({"title": "Old fair", "start_date": "2001-01-01", "status": "published"}))
            .await;

        let home: Value = server.get("/api/v1/home").await.json();
        assert_eq!(home["posts"].as_array().unwrap().len(), 3);
        assert_eq!(home["posts"][0]["title"], "News 4");
        assert_eq!(home["events"].as_array().unwrap().len(), 1);
        assert_eq!(home["events"][0]["slug"], "gala");
        assert!(home["campaigns"].as_array().unwrap().is_empty());
    }
}
