use crate::query::formatters::{
    IndexerStatus, OutputFormat, format_launches, format_pending_metadata, format_purchases,
    format_status,
};
use crate::repository::{
    CursorRepository, LaunchRepository, LaunchStatus, PendingMetadataRepository,
    PurchaseRepository,
};
use alloy_primitives::Address;
use anyhow::Result;
use rusqlite::Connection;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn cmd_status(conn: &Connection, format: &OutputFormat) -> Result<()> {
    let (active_launches, finalized_launches) = LaunchRepository::new(conn).count_by_status()?;
    let status = IndexerStatus {
        last_processed_block: CursorRepository::new(conn).get()?,
        active_launches,
        finalized_launches,
        purchases: PurchaseRepository::new(conn).count()?,
    };

    println!("{}", format_status(&status, format));
    Ok(())
}

pub fn cmd_launches(
    conn: &Connection,
    status: Option<&str>,
    limit: usize,
    format: &OutputFormat,
) -> Result<()> {
    let status = status
        .map(|s| {
            LaunchStatus::from_str(s).map_err(|_| {
                anyhow::anyhow!("Invalid status: {} (expected active or finalized)", s)
            })
        })
        .transpose()?;

    let launches = LaunchRepository::new(conn).list(status, limit)?;
    println!("{}", format_launches(&launches, format));
    Ok(())
}

pub fn cmd_purchases(
    conn: &Connection,
    token: &str,
    limit: usize,
    offset: usize,
    format: &OutputFormat,
) -> Result<()> {
    let token = Address::from_str(token)
        .map_err(|_| anyhow::anyhow!("Invalid token address format: {}", token))?;

    let purchases = PurchaseRepository::new(conn).for_token(&token, limit, offset)?;
    println!("{}", format_purchases(&purchases, format));
    Ok(())
}

pub fn cmd_pending_metadata(conn: &Connection, limit: usize, format: &OutputFormat) -> Result<()> {
    let rows = PendingMetadataRepository::new(conn).list(limit)?;
    println!("{}", format_pending_metadata(&rows, format));
    Ok(())
}

pub fn cmd_submit_metadata(
    conn: &Connection,
    name: &str,
    symbol: &str,
    content_id: &str,
) -> Result<()> {
    let created_at = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let id = PendingMetadataRepository::new(conn).insert(name, symbol, content_id, created_at)?;
    println!("Stored pending metadata #{id} for {name} ({symbol})");
    Ok(())
}
