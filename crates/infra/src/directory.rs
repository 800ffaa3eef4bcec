//! Principal lookup backed by the user store.

use std::sync::Arc;

use async_trait::async_trait;

use westeros_auth::{DirectoryError, Principal, PrincipalDirectory};

use crate::store::UserStore;

/// Exposes [`UserStore`] rows to the auth layer as principals keyed by email.
#[derive(Clone)]
pub struct UserDirectory {
    users: Arc<dyn UserStore>,
}

impl UserDirectory {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl PrincipalDirectory for UserDirectory {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<Principal>, DirectoryError> {
        self.users
            .get_by_email(identity)
            .await
            .map(|user| user.map(Principal::from))
            .map_err(|e| DirectoryError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use westeros_auth::{NewUser, ScopeSet, SecretHash};

    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn resolves_users_by_email() {
        let store = Arc::new(InMemoryStore::new());
        let user = NewUser {
            email: "sam@oldtown.reach".to_string(),
            hashed_password: SecretHash::new("hash"),
            is_active: false,
            scopes: ScopeSet::parse("users:read"),
        };
        UserStore::create(store.as_ref(), user).await.unwrap();

        let directory = UserDirectory::new(store);
        let principal = directory.find_by_identity("sam@oldtown.reach").await.unwrap().unwrap();

        assert_eq!(principal.identity, "sam@oldtown.reach");
        assert!(!principal.active);
        assert_eq!(principal.scopes, ScopeSet::parse("users:read"));
        assert!(directory.find_by_identity("gilly@oldtown.reach").await.unwrap().is_none());
    }
}
