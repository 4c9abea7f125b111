use super::models::{Launch, LaunchStatus, NewLaunch};
use super::parse_column;
use alloy_primitives::Address;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

pub struct LaunchRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> LaunchRepository<'a> {
    const INSERT_LAUNCH: &'static str = "INSERT OR IGNORE INTO launches (
            token_address, curve_address, creator, intent_id, name, symbol,
            supply_cap, base_price, price_increment, creator_fee_bps, mode,
            status, block_number, tx_hash, created_at, metadata_uri
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'ACTIVE', ?12, ?13, ?14, ?15)";

    // Only an ACTIVE launch can change, so a second finalize touches no rows
    const FINALIZE_LAUNCH: &'static str =
        "UPDATE launches SET status = 'FINALIZED' WHERE id = ?1 AND status = 'ACTIVE'";

    const SELECT_LAUNCH: &'static str = "SELECT id, token_address, curve_address, creator,
            intent_id, name, symbol, supply_cap, base_price, price_increment,
            creator_fee_bps, mode, status, block_number, tx_hash, created_at, metadata_uri
        FROM launches";

    const SELECT_CURVES: &'static str = "SELECT curve_address FROM launches";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Inserts the launch and returns its row id, or `None` when a launch for
    /// the same token already exists.
    pub fn insert(&self, launch: &NewLaunch) -> Result<Option<i64>> {
        let inserted = self.conn.execute(
            Self::INSERT_LAUNCH,
            params![
                format!("{:?}", launch.token_address),
                format!("{:?}", launch.curve_address),
                format!("{:?}", launch.creator),
                format!("{:?}", launch.intent_id),
                launch.name,
                launch.symbol,
                launch.supply_cap.to_string(),
                launch.base_price.to_string(),
                launch.price_increment.to_string(),
                launch.creator_fee_bps,
                launch.mode,
                launch.block_number,
                format!("{:?}", launch.tx_hash),
                launch.created_at,
                launch.metadata_uri,
            ],
        )?;

        if inserted == 0 {
            return Ok(None);
        }
        Ok(Some(self.conn.last_insert_rowid()))
    }

    /// Returns true when this call moved the launch from ACTIVE to FINALIZED.
    pub fn finalize(&self, launch_id: i64) -> Result<bool> {
        let updated = self.conn.execute(Self::FINALIZE_LAUNCH, params![launch_id])?;
        Ok(updated > 0)
    }

    pub fn find_by_token(&self, token_address: &Address) -> Result<Option<Launch>> {
        let query = format!("{} WHERE token_address = ?1", Self::SELECT_LAUNCH);
        let launch = self
            .conn
            .query_row(
                &query,
                params![format!("{token_address:?}")],
                Self::row_to_launch,
            )
            .optional()?;
        Ok(launch)
    }

    pub fn find_by_curve(&self, curve_address: &Address) -> Result<Option<Launch>> {
        let query = format!(
            "{} WHERE curve_address = ?1 ORDER BY id LIMIT 1",
            Self::SELECT_LAUNCH
        );
        let launch = self
            .conn
            .query_row(
                &query,
                params![format!("{curve_address:?}")],
                Self::row_to_launch,
            )
            .optional()?;
        Ok(launch)
    }

    pub fn curve_addresses(&self) -> Result<Vec<Address>> {
        let mut stmt = self.conn.prepare(Self::SELECT_CURVES)?;
        let curves = stmt
            .query_map([], |row| parse_column::<Address>(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(curves)
    }

    pub fn list(&self, status: Option<LaunchStatus>, limit: usize) -> Result<Vec<Launch>> {
        let launches = match status {
            Some(status) => {
                let query = format!(
                    "{} WHERE status = ?1 ORDER BY id DESC LIMIT ?2",
                    Self::SELECT_LAUNCH
                );
                let mut stmt = self.conn.prepare(&query)?;
                stmt.query_map(params![status.as_str(), limit], Self::row_to_launch)?
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let query = format!("{} ORDER BY id DESC LIMIT ?1", Self::SELECT_LAUNCH);
                let mut stmt = self.conn.prepare(&query)?;
                stmt.query_map(params![limit], Self::row_to_launch)?
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(launches)
    }

    pub fn count_by_status(&self) -> Result<(usize, usize)> {
        let (active, finalized): (usize, usize) = self.conn.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN status = 'ACTIVE' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'FINALIZED' THEN 1 ELSE 0 END), 0)
             FROM launches",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((active, finalized))
    }

    fn row_to_launch(row: &Row) -> rusqlite::Result<Launch> {
        Ok(Launch {
            id: row.get(0)?,
            token_address: parse_column(row, 1)?,
            curve_address: parse_column(row, 2)?,
            creator: parse_column(row, 3)?,
            intent_id: parse_column(row, 4)?,
            name: row.get(5)?,
            symbol: row.get(6)?,
            supply_cap: parse_column(row, 7)?,
            base_price: parse_column(row, 8)?,
            price_increment: parse_column(row, 9)?,
            creator_fee_bps: row.get(10)?,
            mode: row.get(11)?,
            status: parse_column(row, 12)?,
            block_number: row.get(13)?,
            tx_hash: parse_column(row, 14)?,
            created_at: row.get(15)?,
            metadata_uri: row.get(16)?,
        })
    }
}
