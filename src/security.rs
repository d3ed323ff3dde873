//! Contains the middleware security functions. Each layer checks for a different level of security, as denoted by the function

use axum::{
    body::Body,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use crate::database::auth::session_user;
use crate::endpoints::error_response;
use crate::model::user_info::{Role, UserInfo};

/// Session token from the Authorization header, with or without a `Bearer ` prefix.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(&AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => value,
    };
    if token.is_empty() {
        None
    } else {
        Some(token.to_owned())
    }
}

/// Checks to see if the user is authenticated.
///
/// The authenticated `UserInfo` is stored in the request extensions for handlers and inner layers.
pub async fn handle_basic_auth(mut request: axum::http::Request<Body>, next: Next) -> Response<Body> {
    let Some(token) = session_token(request.headers()) else {
        return error_response(StatusCode::UNAUTHORIZED, "Not Authorized.");
    };

    match session_user(token).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(None) => error_response(StatusCode::UNAUTHORIZED, "Not Authorized."),
        Err(e) => {
            tracing::error!("{e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error.")
        }
    }
}

/// Check if the user is authorized as an admin.
///
/// Must sit inside `handle_basic_auth`, which resolves the session.
pub async fn handle_admin_auth(request: axum::http::Request<Body>, next: Next) -> Response<Body> {
    match request.extensions().get::<UserInfo>() {
        Some(user) if user.role == Role::Admin => next.run(request).await,
        Some(user) => {
            tracing::warn!("User {} attempted an administrator action", user.id);
            error_response(StatusCode::FORBIDDEN, "Not Authorized.")
        }
        None => error_response(StatusCode::UNAUTHORIZED, "Not Authorized."),
    }
}
