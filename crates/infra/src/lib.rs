//! Infrastructure layer: persistence, configuration and auth adapters.

pub mod config;
pub mod directory;
pub mod seed;
pub mod store;

pub use config::{AdminSeed, AppConfig, ConfigError, StorageConfig};
pub use directory::UserDirectory;
pub use seed::{ensure_admin, SeedError};
