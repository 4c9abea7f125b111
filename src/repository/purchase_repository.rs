use super::models::Purchase;
use super::parse_column;
use alloy_primitives::{Address, B256};
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

pub struct PurchaseRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> PurchaseRepository<'a> {
    const INSERT_PURCHASE: &'static str = "INSERT OR IGNORE INTO purchases (
            tx_hash, log_index, launch_id, token_address, curve_address, buyer,
            intent_id, btc_amount, token_amount, supply_before, supply_after,
            new_price, block_number, timestamp
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)";

    const EXISTS_PURCHASE: &'static str =
        "SELECT 1 FROM purchases WHERE tx_hash = ?1 AND log_index = ?2";

    const SELECT_PURCHASE: &'static str = "SELECT launch_id, token_address, curve_address,
            buyer, intent_id, btc_amount, token_amount, supply_before, supply_after,
            new_price, block_number, tx_hash, log_index, timestamp
        FROM purchases";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Returns false when the `(tx_hash, log_index)` pair was already stored.
    pub fn insert(&self, purchase: &Purchase) -> Result<bool> {
        let inserted = self.conn.execute(
            Self::INSERT_PURCHASE,
            params![
                format!("{:?}", purchase.tx_hash),
                purchase.log_index,
                purchase.launch_id,
                format!("{:?}", purchase.token_address),
                format!("{:?}", purchase.curve_address),
                format!("{:?}", purchase.buyer),
                format!("{:?}", purchase.intent_id),
                purchase.btc_amount.to_string(),
                purchase.token_amount.to_string(),
                purchase.supply_before.to_string(),
                purchase.supply_after.to_string(),
                purchase.new_price.to_string(),
                purchase.block_number,
                purchase.timestamp,
            ],
        )?;
        Ok(inserted > 0)
    }

    pub fn exists(&self, tx_hash: &B256, log_index: u64) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                Self::EXISTS_PURCHASE,
                params![format!("{tx_hash:?}"), log_index],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Purchases of one launch in chain order.
    pub fn for_token(
        &self,
        token_address: &Address,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Purchase>> {
        let query = format!(
            "{} WHERE token_address = ?1 ORDER BY block_number, log_index LIMIT ?2 OFFSET ?3",
            Self::SELECT_PURCHASE
        );
        let mut stmt = self.conn.prepare(&query)?;
        let purchases = stmt
            .query_map(
                params![format!("{token_address:?}"), limit, offset],
                Self::row_to_purchase,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(purchases)
    }

    pub fn count(&self) -> Result<usize> {
        let total: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM purchases", [], |row| row.get(0))?;
        Ok(total)
    }

    fn row_to_purchase(row: &Row) -> rusqlite::Result<Purchase> {
        Ok(Purchase {
            launch_id: row.get(0)?,
            token_address: parse_column(row, 1)?,
            curve_address: parse_column(row, 2)?,
            buyer: parse_column(row, 3)?,
            intent_id: parse_column(row, 4)?,
            btc_amount: parse_column(row, 5)?,
            token_amount: parse_column(row, 6)?,
            supply_before: parse_column(row, 7)?,
            supply_after: parse_column(row, 8)?,
            new_price: parse_column(row, 9)?,
            block_number: row.get(10)?,
            tx_hash: parse_column(row, 11)?,
            log_index: row.get(12)?,
            timestamp: row.get(13)?,
        })
    }
}
