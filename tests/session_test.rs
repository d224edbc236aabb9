//! Session snapshot behavior: one row per session, activity refreshed
//! on every request, failures invisible to the caller.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use sea_orm::EntityTrait;
use tower::ServiceExt;
use uuid::Uuid;

use salesboard_api::auth::session::session_enricher_middleware;
use salesboard_api::auth::{AuthUser, STANDARD_GROUP};
use salesboard_api::db::{establish_connection_with_config, run_migrations, DbConfig, DbPool};
use salesboard_api::entities::session_record;

async fn test_db() -> Arc<DbPool> {
    // A pooled in-memory SQLite database exists per connection; keep
    // the pool at one so migrations and queries share it.
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let db = establish_connection_with_config(&config).await.unwrap();
    run_migrations(&db).await.unwrap();
    Arc::new(db)
}

fn principal() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        username: "marie".to_string(),
        email: "marie@example.com".to_string(),
        groups: vec![STANDARD_GROUP.to_string()],
        is_superuser: false,
        token_id: "session-jti-1".to_string(),
    }
}

/// Stand-in for the authentication layer: stamps a fixed principal
/// onto every request.
async fn inject_principal(
    user: AuthUser,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(user);
    next.run(request).await
}

fn app(db: Arc<DbPool>, user: Option<AuthUser>) -> Router {
    let mut router = Router::new()
        .route("/", get(|| async { "ok" }))
        .layer(middleware::from_fn_with_state(
            db,
            session_enricher_middleware,
        ));
    if let Some(user) = user {
        router = router.layer(middleware::from_fn(move |request, next| {
            inject_principal(user.clone(), request, next)
        }));
    }
    router
}

#[tokio::test]
async fn snapshot_is_written_once_and_activity_refreshed() {
    let db = test_db().await;
    let user = principal();
    let app = app(db.clone(), Some(user.clone()));

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let rows = session_record::Entity::find().all(&*db).await.unwrap();
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row.session_id, "session-jti-1");
    assert_eq!(row.user_id, user.user_id);
    assert_eq!(row.username, "marie");
    assert!(!row.is_admin);
    assert!(row.last_activity >= row.login_time);

    let groups: Vec<String> = serde_json::from_str(&row.groups).unwrap();
    assert_eq!(groups, vec![STANDARD_GROUP.to_string()]);
}

#[tokio::test]
async fn anonymous_requests_leave_no_snapshot() {
    let db = test_db().await;
    let app = app(db.clone(), None);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rows = session_record::Entity::find().all(&*db).await.unwrap();
    assert!(rows.is_empty());
}
