//! Administration pages: user and group listings.

use axum::{extract::State, response::Html};

use crate::errors::ServiceError;
use crate::AppState;

use super::{html_escape, render_page};

/// GET /gestion/utilisateurs/ — all users with their groups.
pub async fn users_page(State(state): State<AppState>) -> Result<Html<String>, ServiceError> {
    let users = state.admin.list_users().await?;

    let mut rows = String::new();
    for entry in &users {
        let status = if entry.user.is_active {
            "active"
        } else {
            "disabled"
        };
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&entry.user.username),
            html_escape(&entry.user.email),
            html_escape(&entry.groups.join(", ")),
            status,
        ));
    }

    let body = format!(
        "<h1>Users</h1>\n\
         <table>\n<thead><tr><th>Username</th><th>Email</th><th>Groups</th><th>Status</th></tr></thead>\n\
         <tbody>\n{rows}</tbody>\n</table>\n",
    );

    Ok(Html(render_page("Users", &body)))
}

/// GET /gestion/groupes/ — all groups with permissions and sizes.
pub async fn groups_page(State(state): State<AppState>) -> Result<Html<String>, ServiceError> {
    let groups = state.admin.list_groups().await?;

    let mut rows = String::new();
    for group in &groups {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&group.name),
            group.member_count,
            html_escape(&group.permissions.join(", ")),
        ));
    }

    let body = format!(
        "<h1>Groups</h1>\n\
         <table>\n<thead><tr><th>Name</th><th>Members</th><th>Permissions</th></tr></thead>\n\
         <tbody>\n{rows}</tbody>\n</table>\n",
    );

    Ok(Html(render_page("Groups", &body)))
}
