//! Database module: connection pool, table DDL, row models and the store.
//!
//! Layout:
//! - `schema.rs`: SQL DDL bootstrapping the campaign-finance tables
//! - `models.rs`: Rust structs mirroring rows handed to the store
//! - `store.rs`: transactional upsert/insert operations

pub mod models;
pub mod schema;
pub mod store;

use crate::config::CONFIG;
use crate::error::FinflowError;
use sqlx::postgres::PgPoolOptions;

pub use models::{CandidateRow, CommitteeRow, ContributionRow, ContributorRow};
pub use schema::{PG_INIT, TABLES};
pub use store::{FinanceStore, LoadStats};

pub type PgPool = sqlx::Pool<sqlx::Postgres>;

/// Connect as the configured admin principal.
pub async fn connect() -> Result<PgPool, FinflowError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(CONFIG.pg_connect_options())
        .await?;
    Ok(pool)
}
