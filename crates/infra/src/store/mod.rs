//! Persistence boundary for users and houses.
//!
//! The traits make no storage assumptions; `in_memory` backs tests/dev and
//! `postgres` backs production.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use r#trait::{HouseStore, Page, StoreError, UserStore, DEFAULT_PAGE_LIMIT};
