//! Guard composition for page handlers.
//!
//! Each guarded route evaluates two predicates in order: authentication
//! first, then the group/admin condition. The resulting decision maps
//! onto the response: unauthenticated callers are redirected to the
//! sign-in page, authenticated callers without the role get a 403,
//! everyone else reaches the handler.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::errors::ServiceError;

use super::{AuthUser, ADMIN_GROUP, LOGIN_PATH};

/// Outcome of evaluating the guards for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Delegate to the wrapped handler
    Allowed,
    /// Authenticated but lacking the required role
    Denied,
    /// Not authenticated; terminal redirect for this request
    RedirectToLogin,
}

/// Allows superusers and members of at least one of `allowed` groups.
/// The authentication predicate runs first: an unauthenticated caller
/// is redirected, never denied.
pub fn evaluate_groups(principal: Option<&AuthUser>, allowed: &[String]) -> AccessDecision {
    let Some(user) = principal else {
        return AccessDecision::RedirectToLogin;
    };

    if user.is_superuser {
        return AccessDecision::Allowed;
    }

    if allowed.iter().any(|name| user.in_group(name)) {
        AccessDecision::Allowed
    } else {
        AccessDecision::Denied
    }
}

/// Allows superusers and members of the Administrators group only.
pub fn evaluate_admin(principal: Option<&AuthUser>) -> AccessDecision {
    let Some(user) = principal else {
        return AccessDecision::RedirectToLogin;
    };

    if user.is_superuser || user.in_group(ADMIN_GROUP) {
        AccessDecision::Allowed
    } else {
        AccessDecision::Denied
    }
}

async fn apply(decision: AccessDecision, request: Request, next: Next) -> Response {
    match decision {
        AccessDecision::Allowed => next.run(request).await,
        AccessDecision::Denied => {
            ServiceError::Forbidden("insufficient permissions".to_string()).into_response()
        }
        AccessDecision::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
    }
}

/// Middleware gating a route on group membership
pub async fn group_guard_middleware(
    State(allowed): State<Vec<String>>,
    request: Request,
    next: Next,
) -> Response {
    let decision = evaluate_groups(request.extensions().get::<AuthUser>(), &allowed);
    apply(decision, request, next).await
}

/// Middleware gating a route on administrator status
pub async fn admin_guard_middleware(request: Request, next: Next) -> Response {
    let decision = evaluate_admin(request.extensions().get::<AuthUser>());
    apply(decision, request, next).await
}

/// Extension methods for Router to attach guards. Guards only read the
/// `AuthUser` extension; identification itself (`with_auth`) is applied
/// once at app assembly, outermost, so it has already run by the time
/// any guard or the session enricher sees the request.
pub trait GuardRouterExt {
    fn with_auth(self) -> Self;
    fn with_groups(self, groups: &[&str]) -> Self;
    fn with_admin(self) -> Self;
}

impl<S> GuardRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(super::auth_middleware))
    }

    fn with_groups(self, groups: &[&str]) -> Self {
        let allowed: Vec<String> = groups.iter().map(|g| g.to_string()).collect();
        self.layer(axum::middleware::from_fn_with_state(
            allowed,
            group_guard_middleware,
        ))
    }

    fn with_admin(self) -> Self {
        self.layer(axum::middleware::from_fn(admin_guard_middleware))
    }
}
