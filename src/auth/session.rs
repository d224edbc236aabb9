//! Session enricher.
//!
//! For every request carrying an authenticated principal, records a
//! one-time identity snapshot keyed by the session token id and
//! refreshes a last-activity timestamp. The snapshot is an audit side
//! channel: nothing reads it back, and it intentionally goes stale if
//! group membership changes mid-session. Storage failures are logged
//! and never fail the request.

use axum::{extract::Request, middleware::Next, response::Response};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use tracing::warn;

use crate::entities::session_record;

use super::AuthUser;

/// Middleware recording session activity for authenticated principals.
pub async fn session_enricher_middleware(
    axum::extract::State(db): axum::extract::State<Arc<DatabaseConnection>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(user) = request.extensions().get::<AuthUser>() {
        if let Err(err) = record_activity(&db, user).await {
            warn!(%err, token_id = %user.token_id, "session snapshot write failed");
        }
    }

    next.run(request).await
}

async fn record_activity(
    db: &DatabaseConnection,
    user: &AuthUser,
) -> Result<(), sea_orm::DbErr> {
    let now = Utc::now();

    match session_record::Entity::find_by_id(user.token_id.clone())
        .one(db)
        .await?
    {
        Some(existing) => {
            let mut active: session_record::ActiveModel = existing.into();
            active.last_activity = Set(now);
            active.update(db).await?;
        }
        None => {
            let groups_json =
                serde_json::to_string(&user.groups).unwrap_or_else(|_| "[]".to_string());
            session_record::ActiveModel {
                session_id: Set(user.token_id.clone()),
                user_id: Set(user.user_id),
                username: Set(user.username.clone()),
                email: Set(user.email.clone()),
                groups: Set(groups_json),
                is_admin: Set(user.is_admin()),
                login_time: Set(now),
                last_activity: Set(now),
            }
            .insert(db)
            .await?;
        }
    }

    Ok(())
}
