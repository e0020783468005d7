//! FreshRSS unit core library: domain types, configuration, durable state and errors.
//!
//! Public API surface:
//! - [`types`]: flags, external conditions, packages, database connection types
//! - [`config`]: [`CharmConfig`] loading and change detection
//! - [`store`]: [`UnitState`], the persisted flag set and key-value store
//! - [`error`]: [`StateError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::{CharmConfig, ConfigChanges};
pub use error::{ConfigError, StateError};
pub use store::{FileBackend, MemoryBackend, StateBackend, StateFile, UnitState};
pub use types::{
    ClusterFact, Condition, ConnectionConfig, DatabaseRequest, DbScheme, Flag, Package,
    PackageManager,
};
