//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Authentication front door:
//!     → rate_limit.rs (fixed window per client key)
//!     → auth::guard (resolve bearer token to a Principal)
//!
//! Every note operation:
//!     → access_control.rs (role set check, owner-or-admin check)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing principal is a denial, never "no data"
//! - Role sets are constants; nothing can widen them at runtime
//! - Rate-limit exhaustion is a result value the caller acts on

pub mod access_control;
pub mod rate_limit;

pub use access_control::{
    is_in_role_set, require_owner_or_admin, require_role, AccessError, Principal, Role, RoleSet,
};
pub use rate_limit::{
    MemoryRateLimitStore, RateLimitDecision, RateLimitPolicy, RateLimitStore, RateLimiter,
};
