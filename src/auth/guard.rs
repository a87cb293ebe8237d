//! Rate-limited authentication.

use serde_json::json;
use thiserror::Error;

use crate::audit::record::ENTITY_SESSION;
use crate::audit::{actions, AuditEntry, AuditSink, AuditWriter};
use crate::auth::SessionProvider;
use crate::observability::metrics;
use crate::security::{Principal, RateLimiter};

/// Why an authentication attempt was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    /// Too many attempts from this client in the current window.
    #[error("too many attempts, retry after {reset_at}")]
    RateLimited { reset_at: u64 },

    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Checks the login rate limit, then the credential.
pub struct AuthGuard<P, A> {
    sessions: P,
    limiter: RateLimiter,
    audit: AuditWriter<A>,
    limit_enabled: bool,
}

impl<P: SessionProvider, A: AuditSink> AuthGuard<P, A> {
    pub fn new(sessions: P, limiter: RateLimiter, audit: AuditWriter<A>) -> Self {
        Self {
            sessions,
            limiter,
            audit,
            limit_enabled: true,
        }
    }

    /// Turn rate limiting on or off.
    pub fn with_rate_limit(mut self, enabled: bool) -> Self {
        self.limit_enabled = enabled;
        self
    }

    pub fn sessions(&self) -> &P {
        &self.sessions
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Authenticate `token` presented from `client` (an address).
    ///
    /// A missing token counts as an attempt like any other.
    pub async fn authenticate(
        &self,
        client: &str,
        token: Option<&str>,
    ) -> Result<Principal, AuthFailure> {
        let key = format!("auth:{client}");

        if self.limit_enabled {
            let decision = self.limiter.check(&key);
            if !decision.allowed {
                tracing::warn!(client, reset_at = decision.reset_at, "Authentication rate limited");
                metrics::record_auth_failure("rate_limited");
                let _ = self
                    .audit
                    .record(
                        AuditEntry::new(actions::LOGIN_RATE_LIMITED, ENTITY_SESSION)
                            .ip(client)
                            .details(json!({ "reset_at": decision.reset_at })),
                    )
                    .await;
                return Err(AuthFailure::RateLimited {
                    reset_at: decision.reset_at,
                });
            }
        }

        let Some(principal) = token.and_then(|t| self.sessions.resolve(t)) else {
            tracing::warn!(client, token_present = token.is_some(), "Authentication failed");
            metrics::record_auth_failure("invalid_token");
            let _ = self
                .audit
                .record(AuditEntry::new(actions::LOGIN_FAILED, ENTITY_SESSION).ip(client))
                .await;
            return Err(AuthFailure::InvalidCredentials);
        };

        if self.limit_enabled {
            self.limiter.reset(&key);
        }
        tracing::debug!(client, principal_id = %principal.id, "Authenticated");
        Ok(principal)
    }
}
