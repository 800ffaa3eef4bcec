//! Infrastructure wiring: stores, credential verifier, token codec and the
//! auth collaborators built on top of them.

use std::sync::Arc;

use anyhow::Context;

use westeros_auth::{AccessGuard, Argon2Verifier, Authenticator, CredentialVerifier, TokenCodec, TokenSettings};
use westeros_infra::store::{HouseStore, InMemoryStore, PostgresStore, UserStore};
use westeros_infra::{ensure_admin, AppConfig, StorageConfig, UserDirectory};

/// Everything a handler can reach. Installed as a router `Extension`.
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<dyn UserStore>,
    pub houses: Arc<dyn HouseStore>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub authenticator: Authenticator,
    pub guard: AccessGuard,
}

impl AppServices {
    pub fn new(
        users: Arc<dyn UserStore>,
        houses: Arc<dyn HouseStore>,
        verifier: Arc<dyn CredentialVerifier>,
        codec: TokenCodec,
    ) -> Self {
        let directory = Arc::new(UserDirectory::new(users.clone()));

        Self {
            authenticator: Authenticator::new(directory.clone(), verifier.clone()),
            guard: AccessGuard::new(Arc::new(codec), directory),
            users,
            houses,
            verifier,
        }
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let codec = TokenCodec::new(&config.token).context("invalid token settings")?;

    let services = match &config.storage {
        StorageConfig::Postgres { url } => {
            let store = PostgresStore::connect(url)
                .await
                .context("failed to connect to postgres")?;
            store
                .ensure_schema()
                .await
                .context("failed to prepare database schema")?;

            let store = Arc::new(store);
            AppServices::new(store.clone(), store, Arc::new(Argon2Verifier), codec)
        }
        StorageConfig::InMemory => {
            tracing::warn!("using in-memory storage; data is lost on restart");
            let store = Arc::new(InMemoryStore::new());
            AppServices::new(store.clone(), store, Arc::new(Argon2Verifier), codec)
        }
    };

    if let Some(seed) = &config.admin {
        ensure_admin(services.users.as_ref(), services.verifier.as_ref(), seed)
            .await
            .context("failed to seed admin user")?;
    }

    Ok(services)
}

/// In-memory wiring (dev/test).
pub fn build_in_memory_services(token: &TokenSettings) -> anyhow::Result<AppServices> {
    let codec = TokenCodec::new(token).context("invalid token settings")?;
    let store = Arc::new(InMemoryStore::new());
    Ok(AppServices::new(store.clone(), store, Arc::new(Argon2Verifier), codec))
}
