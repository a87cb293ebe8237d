//! Authentication front door.
//!
//! # Data Flow
//! ```text
//! bearer token + client address
//!     → guard.rs (rate limit "auth:<client>", resolve, reset on success)
//!     → session.rs (token → Principal)
//!     → Principal handed to the note service
//! ```
//!
//! # Design Decisions
//! - Every attempt counts, not just failures; success clears the window
//! - Refusals and bad tokens are audited with the client address

pub mod guard;
pub mod session;

pub use guard::{AuthFailure, AuthGuard};
pub use session::{SessionProvider, TokenSessions};
