//! API Middleware
//!
//! Bearer-token authentication and request logging.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::JwtSigner;
use crate::domain::TokenError;
use crate::error::AppError;

// =========================================================================
// JWT Authentication Middleware
// =========================================================================

fn unauthorized(message: &'static str) -> Response {
    AppError::Unauthorized(message).into_response()
}

/// Verify the `Authorization: Bearer <token>` header and put the decoded
/// `TokenClaims` into request extensions
pub async fn jwt_auth_middleware(
    State(signer): State<Arc<JwtSigner>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let header = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        Some(value) if !value.trim().is_empty() => value,
        _ => return Err(unauthorized("missing auth header")),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(token) => token.trim(),
        None => return Err(unauthorized("invalid token")),
    };

    let claims = match signer.verify(token) {
        Ok(claims) => claims,
        Err(TokenError::Expired) => return Err(unauthorized("token expired")),
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            return Err(unauthorized("invalid token"));
        }
    };

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let masked_value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = mask_headers_for_logging(request.headers());
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = ?request_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        request_id = ?request_id,
        "Request completed"
    );

    response
}
