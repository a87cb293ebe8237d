//! Bearer authentication middleware.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::AuthFailure;
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// Resolve the bearer token and attach the `Principal` to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_address(&request);
    let result = state
        .guard
        .authenticate(&client, bearer_token(request.headers()))
        .await;

    let principal = match result {
        Ok(p) => p,
        Err(AuthFailure::InvalidCredentials) => return Err(ApiError::Unauthorized),
        Err(AuthFailure::RateLimited { reset_at }) => {
            let remaining_ms = reset_at.saturating_sub(state.clock.now_ms());
            return Err(ApiError::RateLimited {
                retry_after_secs: remaining_ms.div_ceil(1000).max(1),
            });
        }
    };

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Peer IP, or "unknown" when the server was not started with connect info.
fn client_address(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
