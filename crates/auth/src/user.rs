//! User records (the persisted principal) and registration.

use serde::Serialize;
use thiserror::Error;

use westeros_core::{DomainError, UserId};

use crate::{CredentialError, CredentialVerifier, Principal, ScopeSet, SecretHash};

/// Scopes granted to users registered through the API.
pub const DEFAULT_USER_SCOPES: &str = "users:read houses:read";

/// Persisted user.
///
/// `scopes` keeps the space-delimited storage shape; use
/// [`User::granted_scopes`] for any comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub hashed_password: SecretHash,
    pub is_active: bool,
    pub scopes: String,
}

impl User {
    pub fn granted_scopes(&self) -> ScopeSet {
        ScopeSet::parse(&self.scopes)
    }

    /// Public projection (no hash, no scopes).
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            email: self.email.clone(),
            is_active: self.is_active,
        }
    }
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        let scopes = user.granted_scopes();
        Principal {
            id: user.id,
            identity: user.email,
            secret_hash: user.hashed_password,
            active: user.is_active,
            scopes,
        }
    }
}

/// What callers outside the auth boundary get to see of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub is_active: bool,
}

impl From<&Principal> for UserView {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.id,
            email: p.identity.clone(),
            is_active: p.active,
        }
    }
}

/// A user ready to be inserted (secret already hashed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: SecretHash,
    pub is_active: bool,
    pub scopes: ScopeSet,
}

/// Registration request (plaintext secret).
#[derive(Clone)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for RegisterUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisterUser")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl RegisterUser {
    pub fn validate(&self) -> Result<(), DomainError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }
        if self.password.is_empty() {
            return Err(DomainError::validation("password cannot be empty"));
        }
        Ok(())
    }

    /// Validate, hash the secret and produce an active user with `scopes`.
    pub fn into_new_user(
        self,
        verifier: &dyn CredentialVerifier,
        scopes: ScopeSet,
    ) -> Result<NewUser, RegistrationError> {
        self.validate()?;
        let hashed_password = SecretHash::new(verifier.hash(&self.password)?);

        Ok(NewUser {
            email: self.email.trim().to_string(),
            hashed_password,
            is_active: true,
            scopes,
        })
    }
}
