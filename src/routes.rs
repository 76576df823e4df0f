use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{self, SecurityConfig};
use crate::handlers::{cats, system, users};
use crate::middleware::{principal_middleware, upload_context_middleware};
use crate::state::AppState;

/// Build the full router around `state`.
pub fn app(state: AppState) -> Router {
    let config = config::config();

    let mut router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(cat_routes())
        .merge(user_routes())
        // Request context: optional principal, optional upload
        .layer(middleware::from_fn(upload_context_middleware))
        .layer(middleware::from_fn(principal_middleware))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn cat_routes() -> Router<AppState> {
    use axum::routing::put;

    Router::new()
        .route("/cats", get(cats::list).post(cats::create))
        .route("/cats/user", get(cats::list_owned))
        .route("/cats/area", get(cats::list_area))
        .route(
            "/cats/:id",
            get(cats::record_get)
                .put(cats::record_put)
                .delete(cats::record_delete),
        )
        .route("/cats/admin/:id", put(cats::admin_put).delete(cats::admin_delete))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::users))
        .route("/users/:id", get(users::user))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        app(AppState::in_memory()).oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn public_reads_need_no_token() {
        assert_eq!(status_of("GET", "/cats").await, StatusCode::OK);
        assert_eq!(status_of("GET", "/cats/area?topRight=1,1&bottomLeft=0,0").await, StatusCode::OK);
        assert_eq!(status_of("GET", "/users").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn static_segments_win_over_ids() {
        // Routed to the owned list, not to a lookup of the id "user"
        assert_eq!(status_of("GET", "/cats/user").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("GET", "/cats/area").await, StatusCode::BAD_REQUEST);
        assert_eq!(status_of("GET", "/cats/whiskers").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_routes_reject_anonymous_callers() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(status_of("DELETE", &format!("/cats/admin/{}", id)).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unsupported_method_is_rejected() {
        assert_eq!(status_of("PATCH", "/cats").await, StatusCode::METHOD_NOT_ALLOWED);
    }
}
