//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::TokenClaims;
use crate::domain::EmployeeInfo;
use crate::error::{AppError, AppResult};
use crate::repository::Store;

use super::middleware::jwt_auth_middleware;
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

impl AuthRequest {
    fn validate(&self) -> AppResult<()> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AppError::InvalidRequest(
                "username and password are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct SendCoinRequest {
    #[serde(rename = "toUser")]
    pub to_user: String,
    pub amount: i64,
}

impl SendCoinRequest {
    /// Both fields are required; a zero amount counts as missing. Negative
    /// amounts are left for the transfer handler to reject.
    fn validate(&self) -> AppResult<()> {
        if self.to_user.is_empty() {
            return Err(AppError::InvalidRequest("toUser is required".to_string()));
        }
        if self.amount == 0 {
            return Err(AppError::InvalidRequest("amount is required".to_string()));
        }
        Ok(())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        AppError::InvalidRequest("invalid request body".to_string())
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router. Everything except `/auth` requires a bearer token.
pub fn create_router<S: Store>(state: &AppState<S>) -> Router<AppState<S>> {
    let protected = Router::new()
        .route("/sendCoin", post(send_coin::<S>))
        .route("/buy/:item", get(buy::<S>))
        .route("/info", get(info::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.signer.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .route("/auth", post(auth::<S>))
        .merge(protected)
}

// =========================================================================
// POST /api/auth
// =========================================================================

/// Log in, creating the employee on first use
async fn auth<S: Store>(
    State(state): State<AppState<S>>,
    body: Result<Json<AuthRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(request) = body?;
    request.validate()?;

    let result = state
        .auth
        .authorize(&request.username, &request.password)
        .await?;

    Ok(Json(AuthResponse {
        token: result.token,
    }))
}

// =========================================================================
// POST /api/sendCoin
// =========================================================================

/// Send coins from the token holder to another employee
async fn send_coin<S: Store>(
    State(state): State<AppState<S>>,
    Extension(claims): Extension<TokenClaims>,
    body: Result<Json<SendCoinRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(request) = body?;
    request.validate()?;

    state
        .transfer
        .send_coins(&claims.username, &request.to_user, request.amount)
        .await?;

    Ok(StatusCode::OK)
}

// =========================================================================
// GET /api/buy/:item
// =========================================================================

/// Buy one unit of an item for the token holder
async fn buy<S: Store>(
    State(state): State<AppState<S>>,
    Extension(claims): Extension<TokenClaims>,
    Path(item): Path<String>,
) -> AppResult<StatusCode> {
    state.purchase.buy(&item, &claims.username).await?;
    Ok(StatusCode::OK)
}

// =========================================================================
// GET /api/info
// =========================================================================

async fn info<S: Store>(
    State(state): State<AppState<S>>,
    Extension(claims): Extension<TokenClaims>,
) -> AppResult<Json<EmployeeInfo>> {
    let info = state.info.get(&claims.username).await?;
    Ok(Json(info))
}
