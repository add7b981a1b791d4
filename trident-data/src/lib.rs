//! Backend-agnostic Datastore abstraction for campaign metadata and
//! attempt results: the trait plus error type, with zero database driver
//! dependencies.
//!
//! Concrete backends live in separate crates — see `trident-data-sqlx`
//! for the Postgres implementation.

pub mod datastore;
pub mod error;

pub use datastore::Datastore;
pub use error::DataError;

/// Re-exports of the most commonly used data types.
pub mod prelude {
    pub use crate::{DataError, Datastore};
}
