//! Integration tests for the HTTP surface: routing, health and the error
//! mapping for unconfigured services.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use mediarr::api::{self, AppState};
use mediarr::config::Config;
use mediarr::db::Store;

async fn spawn_app() -> Router {
    let config = Config::default();
    let store = Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("in-memory store");

    api::router(AppState { config, store })
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn root_banner_responds() {
    let app = spawn_app().await;

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unconfigured_radarr_import_is_a_bad_request() {
    let app = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/radarr/import")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "configuration_error");
    assert!(json["message"].as_str().unwrap().contains("Radarr"));
}

#[tokio::test]
async fn unconfigured_jellyfin_routes_share_the_mapping() {
    let app = spawn_app().await;

    for path in [
        "/api/v1/jellyfin/import/users",
        "/api/v1/jellyfin/sync/movies",
        "/api/v1/jellyfin/import/movies",
        "/api/v1/jellyfin/import/series",
        "/api/v1/sonarr/import",
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
        let json = body_json(response).await;
        assert_eq!(json["code"], "configuration_error", "{path}");
    }
}

#[tokio::test]
async fn import_routes_reject_get() {
    let app = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/radarr/import")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
