//! Session-based authentication.
//!
//! Credentials are checked against the user table (argon2 hashes) and
//! a signed HS256 session token is handed back in an HttpOnly cookie.
//! The authentication middleware only *identifies* the caller — it
//! never rejects a request. Rejection (or redirect) is the guard
//! layer's job, so the authentication predicate always runs before
//! any group check. See [`guard`].

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub mod groups;
pub mod guard;
pub mod session;

pub use groups::{ADMIN_GROUP, STANDARD_GROUP};
pub use guard::{evaluate_admin, evaluate_groups, AccessDecision, GuardRouterExt};

use crate::entities::{group, user};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Where unauthenticated callers of guarded pages are sent
pub const LOGIN_PATH: &str = "/login/";

/// Claim structure for session tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,            // Subject (user ID)
    pub username: String,       // Login name
    pub email: String,          // User's email
    pub groups: Vec<String>,    // Group memberships at login time
    pub is_superuser: bool,     // Root flag, bypasses group checks
    pub jti: String,            // Unique identifier for this session
    pub iat: i64,               // Issued at time
    pub exp: i64,               // Expiration time
    pub iss: String,            // Issuer
}

/// Authenticated principal extracted from the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub groups: Vec<String>,
    pub is_superuser: bool,
    pub token_id: String,
}

impl AuthUser {
    /// Check membership in a named group
    pub fn in_group(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g == name)
    }

    /// Administrator means superuser-root or membership in the
    /// distinguished Administrators group.
    pub fn is_admin(&self) -> bool {
        self.is_superuser || self.in_group(ADMIN_GROUP)
    }
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("session token has expired")]
    TokenExpired,

    #[error("invalid session token")]
    InvalidToken,

    #[error("failed to create session token: {0}")]
    TokenCreation(String),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("internal error: {0}")]
    InternalError(String),
}

/// Session configuration
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub expiration: Duration,
}

impl SessionConfig {
    pub fn new(secret: String, expiration: Duration) -> Self {
        Self {
            secret,
            issuer: "salesboard-api".to_string(),
            expiration,
        }
    }
}

/// Issues and validates session tokens
#[derive(Clone)]
pub struct SessionAuthService {
    config: SessionConfig,
    db: Arc<DatabaseConnection>,
}

impl SessionAuthService {
    pub fn new(config: SessionConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Verifies credentials and opens a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let parsed_hash =
            PasswordHash::new(&user.password_hash).map_err(|_| AuthError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let groups = self.group_names(&user).await?;
        debug!(username = %user.username, ?groups, "login accepted");

        self.issue_token(&user, groups)
    }

    /// Generates a session token for a verified user.
    pub fn issue_token(&self, user: &user::Model, groups: Vec<String>) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.expiration)
                .map_err(|_| AuthError::TokenCreation("invalid session duration".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            groups,
            is_superuser: user.is_superuser,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validates a session token and reconstructs the principal.
    pub fn validate_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.issuer.clone()]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthUser {
            user_id,
            username: claims.username,
            email: claims.email,
            groups: claims.groups,
            is_superuser: claims.is_superuser,
            token_id: claims.jti,
        })
    }

    async fn group_names(&self, user: &user::Model) -> Result<Vec<String>, AuthError> {
        let groups = user
            .find_related(group::Entity)
            .all(&*self.db)
            .await?;
        Ok(groups.into_iter().map(|g| g.name).collect())
    }
}

/// Identification middleware: resolves the session cookie (or a Bearer
/// header) into an `AuthUser` request extension. Requests without a
/// valid session pass through unidentified; guards decide what happens
/// to them.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<SessionAuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    if let Some(token) = extract_session_token(&request) {
        match auth_service.validate_token(&token) {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(err) => {
                debug!(%err, "session token rejected");
            }
        }
    }

    next.run(request).await
}

/// Pulls the session token from the cookie header, falling back to a
/// Bearer Authorization header.
fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookies) = cookie_header.to_str() {
            for pair in cookies.split(';') {
                let mut parts = pair.trim().splitn(2, '=');
                if parts.next() == Some(SESSION_COOKIE) {
                    if let Some(value) = parts.next() {
                        if !value.is_empty() {
                            return Some(value.to_string());
                        }
                    }
                }
            }
        }
    }

    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_value) = auth_header.to_str() {
            if let Some(token) = auth_value.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    None
}

/// `Set-Cookie` value establishing the session
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, token
    )
}

/// `Set-Cookie` value tearing the session down
pub fn clear_session_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    fn sample_user() -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            username: "marie".to_string(),
            email: "marie@example.com".to_string(),
            password_hash: String::new(),
            is_superuser: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn service() -> SessionAuthService {
        let config = SessionConfig::new(
            "unit-test-secret-unit-test-secret-unit-test-secret-unit-test-secret".to_string(),
            Duration::from_secs(3600),
        );
        // The DB handle is unused by token issue/validate paths.
        SessionAuthService::new(config, Arc::new(DatabaseConnection::Disconnected))
    }

    #[test]
    fn token_round_trip_preserves_principal() {
        let svc = service();
        let user = sample_user();
        let token = svc
            .issue_token(&user, vec![STANDARD_GROUP.to_string()])
            .unwrap();
        let principal = svc.validate_token(&token).unwrap();

        assert_eq!(principal.user_id, user.id);
        assert_eq!(principal.username, "marie");
        assert!(principal.in_group(STANDARD_GROUP));
        assert!(!principal.is_admin());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let svc = service();
        assert!(matches!(
            svc.validate_token("not-a-token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn admin_group_membership_implies_admin() {
        let mut principal = AuthUser {
            user_id: Uuid::new_v4(),
            username: "a".to_string(),
            email: String::new(),
            groups: vec![ADMIN_GROUP.to_string()],
            is_superuser: false,
            token_id: "t".to_string(),
        };
        assert!(principal.is_admin());

        principal.groups.clear();
        assert!(!principal.is_admin());

        principal.is_superuser = true;
        assert!(principal.is_admin());
    }

    #[test]
    fn session_token_read_from_cookie() {
        let request = HttpRequest::builder()
            .header(header::COOKIE, "theme=dark; session=abc123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_session_token(&request), Some("abc123".to_string()));
    }

    #[test]
    fn bearer_header_is_a_fallback() {
        let request = HttpRequest::builder()
            .header(header::AUTHORIZATION, "Bearer xyz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_session_token(&request), Some("xyz".to_string()));
    }
}
