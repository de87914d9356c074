//! Route-level access rules and the decision function applied to them.

use axum::http::Method;

use super::token::Principal;
use crate::domain::UserId;
use crate::models::user::{ROLE_ADMIN, ROLE_USER};

/// Access requirement attached to a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRule {
    Public,
    /// Credentials travel as HTTP Basic and are checked by the login handler.
    BasicLogin,
    /// Admins, or a `user` whose token names this account.
    AdminOrSelf(UserId),
    Admin,
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Unauthenticated,
    Forbidden,
}

/// Maps a request onto its rule. First match wins.
///
/// `base_path` is the API prefix without a trailing slash. Actuator and
/// image paths are matched from the root.
#[must_use]
pub fn classify(method: &Method, path: &str, base_path: &str) -> RouteRule {
    if let Some(rel) = strip_prefix_segment(path, base_path) {
        if *method == Method::GET && under(rel, "/artifacts") {
            return RouteRule::Public;
        }
        if *method == Method::POST && rel == "/artifacts/search" {
            return RouteRule::Public;
        }
        if *method == Method::POST && rel == "/users/login" {
            return RouteRule::BasicLogin;
        }
        if *method == Method::GET {
            if let Some(id) = rel
                .strip_prefix("/users/")
                .filter(|rest| !rest.is_empty() && !rest.contains('/'))
                .and_then(|rest| rest.parse::<i32>().ok())
            {
                return RouteRule::AdminOrSelf(UserId::new(id));
            }
        }
        if under(rel, "/users") {
            return RouteRule::Admin;
        }
    }

    if path == "/actuator/health" || path == "/actuator/info" {
        return RouteRule::Public;
    }
    if under(path, "/actuator") {
        return RouteRule::Admin;
    }
    if *method == Method::GET && under(path, "/images") {
        return RouteRule::Public;
    }

    RouteRule::Authenticated
}

#[must_use]
pub fn authorize(principal: Option<&Principal>, rule: RouteRule) -> Decision {
    match rule {
        RouteRule::Public | RouteRule::BasicLogin => Decision::Allow,
        RouteRule::Authenticated => {
            if principal.is_some() {
                Decision::Allow
            } else {
                Decision::Unauthenticated
            }
        }
        RouteRule::Admin => match principal {
            None => Decision::Unauthenticated,
            Some(p) if p.has_role(ROLE_ADMIN) => Decision::Allow,
            Some(_) => Decision::Forbidden,
        },
        RouteRule::AdminOrSelf(id) => match principal {
            None => Decision::Unauthenticated,
            Some(p) if p.has_role(ROLE_ADMIN) => Decision::Allow,
            Some(p) if p.has_role(ROLE_USER) && p.user_id == id => Decision::Allow,
            Some(_) => Decision::Forbidden,
        },
    }
}

/// `path` equals `prefix` or continues it with a `/`.
fn under(path: &str, prefix: &str) -> bool {
    strip_prefix_segment(path, prefix).is_some()
}

/// Remainder of `path` after `prefix`, only when `prefix` ends on a segment
/// boundary. An empty prefix matches everything.
fn strip_prefix_segment<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
