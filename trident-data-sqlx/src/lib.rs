//! Postgres implementation of the `trident-data` `Datastore` trait, via
//! [sqlx](https://github.com/launchbadge/sqlx).
//!
//! # Error bridging
//!
//! Due to Rust's orphan rules, `From<sqlx::Error> for DataError` can't be
//! implemented here. Use the [`SqlxErrorExt`] trait instead:
//!
//! ```ignore
//! use trident_data_sqlx::SqlxErrorExt;
//!
//! let row = sqlx::query_as("SELECT ...")
//!     .fetch_one(&pool)
//!     .await
//!     .map_err(|e| e.into_data_error())?;
//! ```

pub mod datastore;
pub mod error;

pub use datastore::PostgresDatastore;
pub use error::{SqlxErrorExt, SqlxResult};

/// Re-exports of the most commonly used types from both `trident-data` and
/// this crate.
pub mod prelude {
    pub use crate::{PostgresDatastore, SqlxErrorExt};
    pub use trident_data::prelude::*;
}
