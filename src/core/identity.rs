//! Identity resolution for scheduler callers.
//!
//! The scheduler never stores credentials; every mutating operation resolves
//! the acting user through an [`IdentityProvider`] first and only keeps the
//! resulting stable identity.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::SchedulerError;

/// Opaque caller credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Account name, matched case-insensitively.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// Account privilege level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular member.
    User,
    /// Can read aggregate snapshots and print resource tags.
    Admin,
}

/// Resolved, stable user identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable user identifier.
    pub id: String,
    /// Name shown to other users.
    pub display_name: String,
    /// Privilege level.
    pub role: Role,
}

/// Resolves an opaque credential to a user identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve `credential`, or fail with [`SchedulerError::Auth`].
    async fn resolve(&self, credential: &Credential) -> Result<UserIdentity, SchedulerError>;
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    display_name: String,
    role: Role,
}

/// In-memory account store with registration.
///
/// Usernames are normalized to lowercase and double as the stable user id.
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryIdentityProvider {
    /// Minimum accepted password length.
    pub const MIN_PASSWORD_LEN: usize = 4;

    /// Create an empty provider.
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Create a provider seeded with an admin account.
    pub fn with_admin(username: &str, password: &str, display_name: &str) -> Self {
        let provider = Self::new();
        provider.accounts.write().insert(
            username.trim().to_lowercase(),
            Account {
                password: password.to_owned(),
                display_name: display_name.to_owned(),
                role: Role::Admin,
            },
        );
        provider
    }

    /// Register a new user account and return its identity.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserIdentity, SchedulerError> {
        let id = username.trim().to_lowercase();
        let display_name = display_name.trim();
        if id.is_empty() || display_name.is_empty() {
            return Err(SchedulerError::Auth("all fields required".into()));
        }
        if password.len() < Self::MIN_PASSWORD_LEN {
            return Err(SchedulerError::Auth(format!(
                "password must be {}+ characters",
                Self::MIN_PASSWORD_LEN
            )));
        }
        let mut accounts = self.accounts.write();
        if accounts.contains_key(&id) {
            return Err(SchedulerError::Auth("username already taken".into()));
        }
        accounts.insert(
            id.clone(),
            Account {
                password: password.to_owned(),
                display_name: display_name.to_owned(),
                role: Role::User,
            },
        );
        Ok(UserIdentity {
            id,
            display_name: display_name.to_owned(),
            role: Role::User,
        })
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn resolve(&self, credential: &Credential) -> Result<UserIdentity, SchedulerError> {
        let id = credential.username.trim().to_lowercase();
        let accounts = self.accounts.read();
        let account = accounts
            .get(&id)
            .filter(|a| a.password == credential.password)
            .ok_or_else(|| SchedulerError::Auth("invalid username or password".into()))?;
        Ok(UserIdentity {
            id,
            display_name: account.display_name.clone(),
            role: account.role,
        })
    }
}
