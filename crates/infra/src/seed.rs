//! Startup seeding of the bootstrap administrator.

use thiserror::Error;
use tracing::instrument;

use westeros_auth::{CredentialVerifier, RegisterUser, RegistrationError, ScopeSet, User};

use crate::config::AdminSeed;
use crate::store::{StoreError, UserStore};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("invalid admin account: {0}")]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create the administrator (active, every known scope) unless a user with
/// that email already exists. An existing account is left untouched.
///
/// Returns the created user, or `None` when nothing was done.
#[instrument(skip_all, fields(email = %seed.email))]
pub async fn ensure_admin(
    users: &dyn UserStore,
    verifier: &dyn CredentialVerifier,
    seed: &AdminSeed,
) -> Result<Option<User>, SeedError> {
    if users.get_by_email(&seed.email).await?.is_some() {
        tracing::debug!("admin already present");
        return Ok(None);
    }

    let new_user = RegisterUser {
        email: seed.email.clone(),
        password: seed.password.clone(),
    }
    .into_new_user(verifier, ScopeSet::all())?;

    match users.create(new_user).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "seeded admin user");
            Ok(Some(user))
        }
        // Lost a race with another instance seeding the same account.
        Err(StoreError::Conflict(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
