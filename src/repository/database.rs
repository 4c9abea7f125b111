use anyhow::{Context, Result};
use rusqlite::Connection;

pub struct Database {
    pub conn: Connection,
}

impl Database {
    pub fn new(db_path: &str) -> Result<Self> {
        let db_path = db_path.strip_prefix("sqlite:").unwrap_or(db_path);
        let conn = Connection::open(db_path).context("Failed to open database")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;

        let db = Database { conn };
        db.create_tables()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    fn create_tables(&self) -> Result<()> {
        // Single-row cursor of the last fully applied block
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS indexer_cursor (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                last_processed_block INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS launches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token_address TEXT NOT NULL UNIQUE,
                curve_address TEXT NOT NULL,
                creator TEXT NOT NULL,
                intent_id TEXT NOT NULL,
                name TEXT NOT NULL,
                symbol TEXT NOT NULL,
                supply_cap TEXT NOT NULL,
                base_price TEXT NOT NULL,
                price_increment TEXT NOT NULL,
                creator_fee_bps INTEGER NOT NULL,
                mode INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'ACTIVE',
                block_number INTEGER NOT NULL,
                tx_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                metadata_uri TEXT
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_launches_curve
             ON launches(curve_address)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS purchases (
                tx_hash TEXT NOT NULL,
                log_index INTEGER NOT NULL,
                launch_id INTEGER NOT NULL,
                token_address TEXT NOT NULL,
                curve_address TEXT NOT NULL,
                buyer TEXT NOT NULL,
                intent_id TEXT NOT NULL,
                btc_amount TEXT NOT NULL,
                token_amount TEXT NOT NULL,
                supply_before TEXT NOT NULL,
                supply_after TEXT NOT NULL,
                new_price TEXT NOT NULL,
                block_number INTEGER NOT NULL,
                timestamp INTEGER NOT NULL,
                PRIMARY KEY (tx_hash, log_index),
                FOREIGN KEY (launch_id) REFERENCES launches(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_purchases_launch
             ON purchases(launch_id, block_number, log_index)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS pending_metadata (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                symbol TEXT NOT NULL,
                content_id TEXT NOT NULL,
                applied INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_pending_metadata_lookup
             ON pending_metadata(name, symbol, applied)",
            [],
        )?;

        Ok(())
    }
}
