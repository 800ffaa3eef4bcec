use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use westeros_auth::{NewUser, User};
use westeros_core::{HouseId, UserId};
use westeros_houses::{Character, CharacterData, House, HouseData};

/// Storage error taxonomy.
///
/// - **Conflict**: a uniqueness constraint was hit (email, house name)
/// - **NotFound**: a referenced parent row does not exist
/// - **Backend**: anything else (connection, lock poisoning, decoding)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Offset pagination (`?skip=&limit=`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Users (authentication principals). Listing order is ascending id.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Exact-match lookup.
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError>;

    /// Returns the number of rows removed (0 or 1).
    async fn delete(&self, id: UserId) -> Result<u64, StoreError>;
}

/// Houses and their members. Listing order is ascending id; members are
/// ordered by id as well.
#[async_trait]
pub trait HouseStore: Send + Sync {
    /// Fails with `Conflict` when the name is taken.
    async fn create(&self, house: HouseData) -> Result<House, StoreError>;

    async fn get(&self, id: HouseId) -> Result<Option<House>, StoreError>;

    async fn get_by_name(&self, name: &str) -> Result<Option<House>, StoreError>;

    async fn list(&self, page: Page) -> Result<Vec<House>, StoreError>;

    /// Full replace of the writable fields. `Ok(None)` if the house is gone,
    /// `Conflict` if the new name belongs to another house.
    async fn update(&self, id: HouseId, house: HouseData) -> Result<Option<House>, StoreError>;

    /// Removes the house and its members. Returns the number of houses removed.
    async fn delete(&self, id: HouseId) -> Result<u64, StoreError>;

    /// Fails with `NotFound` when the house does not exist.
    async fn add_member(&self, house_id: HouseId, character: CharacterData) -> Result<Character, StoreError>;
}
