pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::auth::webhook;
use crate::state::AppState;
use crate::{categories, comments, playlists, reactions, search, subscriptions, users, videos};

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Videos
        .route("/videos", get(videos::handlers::handle_list_videos))
        .route("/videos/:id", get(videos::handlers::handle_get_video))
        .route(
            "/videos/:id/suggestions",
            get(videos::handlers::handle_suggestions),
        )
        .route("/videos/:id/views", post(videos::handlers::handle_record_view))
        .route(
            "/feed/subscriptions",
            get(videos::handlers::handle_subscription_feed),
        )
        .route(
            "/studio/videos",
            get(videos::handlers::handle_studio_videos).post(videos::handlers::handle_create_video),
        )
        .route(
            "/studio/videos/:id",
            patch(videos::handlers::handle_update_video).delete(videos::handlers::handle_delete_video),
        )
        .route("/search", get(search::handlers::handle_search))
        // Reactions
        .route("/videos/:id/like", post(reactions::handlers::handle_like_video))
        .route(
            "/videos/:id/dislike",
            post(reactions::handlers::handle_dislike_video),
        )
        .route(
            "/comments/:id/like",
            post(reactions::handlers::handle_like_comment),
        )
        .route(
            "/comments/:id/dislike",
            post(reactions::handlers::handle_dislike_comment),
        )
        // Comments
        .route(
            "/videos/:id/comments",
            get(comments::handlers::handle_list_comments),
        )
        .route("/comments", post(comments::handlers::handle_create_comment))
        .route(
            "/comments/:id",
            patch(comments::handlers::handle_update_comment)
                .delete(comments::handlers::handle_delete_comment),
        )
        // Playlists
        .route(
            "/playlists",
            get(playlists::handlers::handle_list_playlists)
                .post(playlists::handlers::handle_create_playlist),
        )
        .route(
            "/playlists/for-video/:id",
            get(playlists::handlers::handle_playlists_for_video),
        )
        .route("/playlists/history", get(playlists::handlers::handle_history))
        .route("/playlists/liked", get(playlists::handlers::handle_liked))
        .route(
            "/playlists/:id",
            get(playlists::handlers::handle_get_playlist)
                .delete(playlists::handlers::handle_delete_playlist),
        )
        .route(
            "/playlists/:id/videos",
            get(playlists::handlers::handle_playlist_videos)
                .post(playlists::handlers::handle_add_playlist_video),
        )
        .route(
            "/playlists/:id/videos/:video_id",
            delete(playlists::handlers::handle_remove_playlist_video),
        )
        // Subscriptions, users, categories
        .route(
            "/subscriptions",
            get(subscriptions::handlers::handle_list_subscriptions)
                .post(subscriptions::handlers::handle_subscribe),
        )
        .route(
            "/subscriptions/:id",
            delete(subscriptions::handlers::handle_unsubscribe),
        )
        .route("/users/:id", get(users::handlers::handle_get_user))
        .route("/categories", get(categories::handlers::handle_list_categories))
        // Identity provider sync
        .route("/webhooks/identity", post(webhook::handle_identity_webhook));

    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api/v1", api)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::identity::sign_test_token;
    use crate::auth::webhook::{sign_body, SIGNATURE_HEADER};
    use crate::test_support::{offline_router, TEST_JWT_SECRET, TEST_WEBHOOK_SECRET};

    fn bearer() -> String {
        let exp = (chrono::Utc::now().timestamp() + 3600) as usize;
        format!("Bearer {}", sign_test_token(TEST_JWT_SECRET, "user_router", exp))
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(offline_router(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_limit_out_of_range_rejected() {
        for uri in ["/api/v1/videos?limit=0", "/api/v1/videos?limit=101"] {
            let (status, body) = send(offline_router(), get(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_half_cursor_rejected() {
        let uri = format!(
            "/api/v1/videos/{}/comments?cursor_id={}",
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let (status, _) = send(offline_router(), get(&uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_id_rejected() {
        let (status, body) = send(offline_router(), get("/api/v1/videos/not-a-uuid")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_auth_route_without_token() {
        let (status, body) = send(offline_router(), get("/api/v1/playlists")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_bad_token_rejected_on_anonymous_route() {
        let req = Request::builder()
            .uri(format!("/api/v1/videos/{}", Uuid::new_v4()))
            .header(header::AUTHORIZATION, "Bearer not.a.jwt")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(offline_router(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_body_validated_before_store() {
        let body = serde_json::json!({ "video_id": Uuid::new_v4(), "value": "   " });
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/comments")
            .header(header::AUTHORIZATION, bearer())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = send(offline_router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_playlist_name_too_long() {
        let body = serde_json::json!({ "name": "x".repeat(101) });
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/playlists")
            .header(header::AUTHORIZATION, bearer())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, _) = send(offline_router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_webhook_bad_signature() {
        let payload = br#"{"type":"user.deleted","data":{"id":"user_1"}}"#;
        let forged = sign_body("wrong-secret", payload);
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/webhooks/identity")
            .header(SIGNATURE_HEADER, forged)
            .body(Body::from(payload.to_vec()))
            .unwrap();
        let (status, _) = send(offline_router(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_webhook_malformed_event() {
        let payload = br#"{"type":"session.created","data":{}}"#;
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/webhooks/identity")
            .header(SIGNATURE_HEADER, sign_body(TEST_WEBHOOK_SECRET, payload))
            .body(Body::from(payload.to_vec()))
            .unwrap();
        let (status, _) = send(offline_router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_failure_is_opaque() {
        let (status, body) = send(offline_router(), get("/api/v1/categories")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");
    }
}
