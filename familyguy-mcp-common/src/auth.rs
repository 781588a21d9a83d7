//! Bearer-token gate for the HTTP transport.
//!
//! Every inbound request must carry `Authorization: Bearer <token>` where the
//! token equals the configured shared secret. The check runs before the MCP
//! service sees the request; rejected requests get HTTP 401 and never reach
//! a tool handler. There is no session, cache or rate limit: the header is
//! inspected on every request.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::error::{AuthError, UNAUTHORIZED_MESSAGE};

const BEARER_PREFIX: &str = "Bearer ";

/// Validates bearer tokens against a shared secret.
#[derive(Clone)]
pub struct BearerAuth {
    secret: Arc<str>,
}

impl BearerAuth {
    /// Create an authenticator for the given shared secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Arc::from(secret.into()),
        }
    }

    /// Check the `authorization` header of a request.
    ///
    /// A leading `"Bearer "` is stripped if present; the remainder must equal
    /// the secret exactly.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let value = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        self.check_token(extract_bearer(value))
    }

    /// Compare a raw token against the secret.
    pub fn check_token(&self, token: &str) -> Result<(), AuthError> {
        if token == &*self.secret {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").finish_non_exhaustive()
    }
}

/// Strip a leading `"Bearer "` from a header value.
pub fn extract_bearer(value: &str) -> &str {
    value.strip_prefix(BEARER_PREFIX).unwrap_or(value)
}

/// Axum middleware enforcing [`BearerAuth`] on every request.
pub async fn require_bearer(
    State(auth): State<BearerAuth>,
    request: Request,
    next: Next,
) -> Response {
    match auth.authenticate(request.headers()) {
        Ok(()) => {
            debug!(path = %request.uri().path(), "Bearer token accepted");
            next.run(request).await
        }
        Err(err) => {
            warn!(path = %request.uri().path(), reason = ?err, "Rejected request");
            unauthorized()
        }
    }
}

/// The 401 response sent for any rejected token.
pub fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE).into_response()
}

/// Wrap every route of `router` in the bearer gate.
pub fn protect(router: Router, auth: BearerAuth) -> Router {
    router.layer(middleware::from_fn_with_state(auth, require_bearer))
}
