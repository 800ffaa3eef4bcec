//! `westeros-core`: shared domain primitives (identifiers, errors).
//!
//! No IO and no framework types live here.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{CharacterId, HouseId, UserId};
