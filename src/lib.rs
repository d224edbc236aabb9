//! Sales dashboard service: order import, group-gated dashboard pages,
//! and user administration over a SeaORM-backed store.

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod importer;
pub mod migrator;
pub mod repositories;
pub mod services;

use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::session::session_enricher_middleware;
use crate::auth::{GuardRouterExt, SessionAuthService, ADMIN_GROUP, STANDARD_GROUP};
use crate::db::DbPool;
use crate::services::admin::AdminService;
use crate::services::dashboard::DashboardService;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub dashboard: DashboardService,
    pub admin: AdminService,
    pub auth: Arc<SessionAuthService>,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, auth: Arc<SessionAuthService>) -> Self {
        Self {
            dashboard: DashboardService::new(db.clone()),
            admin: AdminService::new(db.clone()),
            db,
            auth,
        }
    }
}

/// Assembles the full application router.
///
/// Middleware runs outermost first: tracing, then the auth service
/// extension, then identification, then the session enricher, then the
/// per-route guards. Dashboard pages admit both built-in groups; the
/// management pages admit administrators only; the sign-in pages are
/// open.
pub fn create_router(state: AppState) -> Router {
    let dashboard_routes = Router::new()
        .route("/", get(handlers::dashboard::home))
        .route("/dashbord_2/", get(handlers::dashboard::overview))
        .route("/:segment/liste/", get(handlers::dashboard::segment_list))
        .with_groups(&[ADMIN_GROUP, STANDARD_GROUP]);

    let admin_routes = Router::new()
        .route("/gestion/utilisateurs/", get(handlers::admin::users_page))
        .route("/gestion/groupes/", get(handlers::admin::groups_page))
        .with_admin();

    let auth_routes = Router::new()
        .route(
            "/login/",
            get(handlers::auth::login_form).post(handlers::auth::login_submit),
        )
        .route("/logout/", post(handlers::auth::logout).get(handlers::auth::logout));

    Router::new()
        .merge(dashboard_routes)
        .merge(admin_routes)
        .merge(auth_routes)
        .layer(middleware::from_fn_with_state(
            state.db.clone(),
            session_enricher_middleware,
        ))
        .with_auth()
        .layer(Extension(state.auth.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
