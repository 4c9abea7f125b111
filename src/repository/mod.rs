pub mod cursor_repository;
pub mod database;
pub mod launch_repository;
pub mod models;
pub mod pending_metadata_repository;
pub mod purchase_repository;

pub use cursor_repository::CursorRepository;
pub use database::Database;
pub use launch_repository::LaunchRepository;
pub use models::{Launch, LaunchStatus, NewLaunch, PendingMetadata, Purchase};
pub use pending_metadata_repository::PendingMetadataRepository;
pub use purchase_repository::PurchaseRepository;

use rusqlite::Row;
use std::str::FromStr;

/// Reads a TEXT column holding an address, hash or decimal uint256.
pub(crate) fn parse_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
