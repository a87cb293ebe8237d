//! Token-to-principal resolution.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::AccountConfig;
use crate::security::Principal;

/// Resolves a presented credential to the caller it belongs to.
pub trait SessionProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Option<Principal>;
}

/// Static token table built from the configured accounts.
///
/// The table is swapped as a whole on config reload; lookups never block.
pub struct TokenSessions {
    tokens: ArcSwap<HashMap<String, Principal>>,
}

impl TokenSessions {
    pub fn from_accounts(accounts: &[AccountConfig]) -> Self {
        Self {
            tokens: ArcSwap::from_pointee(table(accounts)),
        }
    }

    /// Install a new account table.
    pub fn replace(&self, accounts: &[AccountConfig]) {
        self.tokens.store(Arc::new(table(accounts)));
        tracing::info!(accounts = accounts.len(), "Account table reloaded");
    }

    pub fn len(&self) -> usize {
        self.tokens.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn table(accounts: &[AccountConfig]) -> HashMap<String, Principal> {
    accounts
        .iter()
        .map(|a| (a.token.clone(), Principal::new(a.id.clone(), a.role)))
        .collect()
}

impl SessionProvider for TokenSessions {
    fn resolve(&self, token: &str) -> Option<Principal> {
        self.tokens.load().get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::Role;

    fn account(id: &str, role: Role, token: &str) -> AccountConfig {
        AccountConfig {
            id: id.into(),
            role,
            token: token.into(),
        }
    }

    #[test]
    fn test_resolve_known_token() {
        let sessions = TokenSessions::from_accounts(&[account("t1", Role::Therapist, "tok-1")]);
        assert_eq!(
            sessions.resolve("tok-1"),
            Some(Principal::new("t1", Role::Therapist))
        );
        assert_eq!(sessions.resolve("tok-2"), None);
    }

    #[test]
    fn test_replace_swaps_table() {
        let sessions = TokenSessions::from_accounts(&[account("t1", Role::Therapist, "tok-1")]);
        sessions.replace(&[account("a1", Role::Admin, "tok-9")]);
        assert_eq!(sessions.len(), 1);
        assert!(sessions.resolve("tok-1").is_none());
        assert_eq!(sessions.resolve("tok-9").unwrap().role, Role::Admin);
    }
}
