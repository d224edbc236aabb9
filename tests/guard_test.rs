//! Routing-level access control: redirects for anonymous callers,
//! 403s for authenticated callers outside the required groups.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::{Extension, Router};
use chrono::Utc;
use tower::ServiceExt;
use uuid::Uuid;

use salesboard_api::auth::{
    GuardRouterExt, SessionAuthService, SessionConfig, ADMIN_GROUP, STANDARD_GROUP,
};
use salesboard_api::entities::user;

fn auth_service() -> Arc<SessionAuthService> {
    let config = SessionConfig::new(
        "integration-test-secret-integration-test-secret-integration-0123".to_string(),
        Duration::from_secs(3600),
    );
    Arc::new(SessionAuthService::new(
        config,
        Arc::new(sea_orm::DatabaseConnection::Disconnected),
    ))
}

fn app(auth: Arc<SessionAuthService>) -> Router {
    let pages = Router::new()
        .route("/", get(|| async { "home" }))
        .with_groups(&[ADMIN_GROUP, STANDARD_GROUP]);

    let admin_pages = Router::new()
        .route("/gestion/utilisateurs/", get(|| async { "users" }))
        .with_admin();

    Router::new()
        .merge(pages)
        .merge(admin_pages)
        .with_auth()
        .layer(Extension(auth))
}

fn token_for(auth: &SessionAuthService, groups: &[&str], is_superuser: bool) -> String {
    let user = user::Model {
        id: Uuid::new_v4(),
        username: "tester".to_string(),
        email: "tester@example.com".to_string(),
        password_hash: String::new(),
        is_superuser,
        is_active: true,
        created_at: Utc::now(),
    };
    auth.issue_token(&user, groups.iter().map(|g| g.to_string()).collect())
        .unwrap()
}

fn request(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("session={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn anonymous_caller_is_redirected_to_login() {
    let auth = auth_service();
    let app = app(auth);

    for path in ["/", "/gestion/utilisateurs/"] {
        let response = app.clone().oneshot(request(path, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "path {}", path);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login/"
        );
    }
}

#[tokio::test]
async fn invalid_token_counts_as_anonymous() {
    let auth = auth_service();
    let app = app(auth);

    let response = app
        .oneshot(request("/", Some("not-a-real-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn standard_user_reaches_dashboard_but_not_management() {
    let auth = auth_service();
    let token = token_for(&auth, &[STANDARD_GROUP], false);
    let app = app(auth);

    let response = app
        .clone()
        .oneshot(request("/", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request("/gestion/utilisateurs/", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn administrator_reaches_management_pages() {
    let auth = auth_service();
    let token = token_for(&auth, &[ADMIN_GROUP], false);
    let app = app(auth);

    for path in ["/", "/gestion/utilisateurs/"] {
        let response = app
            .clone()
            .oneshot(request(path, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "path {}", path);
    }
}

#[tokio::test]
async fn superuser_needs_no_group() {
    let auth = auth_service();
    let token = token_for(&auth, &[], true);
    let app = app(auth);

    for path in ["/", "/gestion/utilisateurs/"] {
        let response = app
            .clone()
            .oneshot(request(path, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "path {}", path);
    }
}
