use anyhow::Result;
use rusqlite::{OptionalExtension, params};

pub struct CursorRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> CursorRepository<'a> {
    const INSERT_CURSOR: &'static str =
        "INSERT OR IGNORE INTO indexer_cursor (id, last_processed_block) VALUES (1, ?1)";

    // MAX keeps the cursor non-decreasing even if an older height is written
    const ADVANCE_CURSOR: &'static str = "UPDATE indexer_cursor
         SET last_processed_block = MAX(last_processed_block, ?1)
         WHERE id = 1";

    const GET_CURSOR: &'static str = "SELECT last_processed_block FROM indexer_cursor WHERE id = 1";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self) -> Result<Option<u64>> {
        let block: Option<u64> = self
            .conn
            .query_row(Self::GET_CURSOR, [], |row| row.get(0))
            .optional()?;
        Ok(block)
    }

    /// Returns the persisted cursor, creating it at `initial` on first run.
    pub fn load_or_init(&self, initial: u64) -> Result<u64> {
        self.conn.execute(Self::INSERT_CURSOR, params![initial])?;
        self.get()?
            .ok_or_else(|| anyhow::anyhow!("Cursor row missing after initialisation"))
    }

    pub fn advance(&self, block_number: u64) -> Result<()> {
        let updated = self.conn.execute(Self::ADVANCE_CURSOR, params![block_number])?;
        if updated == 0 {
            anyhow::bail!("Cursor row missing, cannot advance to {}", block_number);
        }
        Ok(())
    }
}
