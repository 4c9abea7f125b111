use super::models::PendingMetadata;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

pub struct PendingMetadataRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> PendingMetadataRepository<'a> {
    const INSERT_PENDING: &'static str = "INSERT INTO pending_metadata
            (name, symbol, content_id, applied, created_at)
        VALUES (?1, ?2, ?3, 0, ?4)";

    const SELECT_LATEST_UNAPPLIED: &'static str =
        "SELECT id, name, symbol, content_id, applied, created_at
        FROM pending_metadata
        WHERE name = ?1 AND symbol = ?2 AND applied = 0
        ORDER BY created_at DESC, id DESC
        LIMIT 1";

    const MARK_APPLIED: &'static str = "UPDATE pending_metadata SET applied = 1 WHERE id = ?1";

    const SELECT_PENDING: &'static str =
        "SELECT id, name, symbol, content_id, applied, created_at
        FROM pending_metadata
        ORDER BY id DESC
        LIMIT ?1";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(
        &self,
        name: &str,
        symbol: &str,
        content_id: &str,
        created_at: u64,
    ) -> Result<i64> {
        self.conn.execute(
            Self::INSERT_PENDING,
            params![name, symbol, content_id, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_latest_unapplied(
        &self,
        name: &str,
        symbol: &str,
    ) -> Result<Option<PendingMetadata>> {
        let pending = self
            .conn
            .query_row(
                Self::SELECT_LATEST_UNAPPLIED,
                params![name, symbol],
                Self::row_to_pending,
            )
            .optional()?;
        Ok(pending)
    }

    pub fn mark_applied(&self, id: i64) -> Result<()> {
        self.conn.execute(Self::MARK_APPLIED, params![id])?;
        Ok(())
    }

    pub fn list(&self, limit: usize) -> Result<Vec<PendingMetadata>> {
        let mut stmt = self.conn.prepare(Self::SELECT_PENDING)?;
        let rows = stmt
            .query_map(params![limit], Self::row_to_pending)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_to_pending(row: &Row) -> rusqlite::Result<PendingMetadata> {
        Ok(PendingMetadata {
            id: row.get(0)?,
            name: row.get(1)?,
            symbol: row.get(2)?,
            content_id: row.get(3)?,
            applied: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Database;

    #[test]
    fn most_recent_unapplied_match_wins() {
        let db = Database::in_memory().unwrap();
        let repo = PendingMetadataRepository::new(&db.conn);

        repo.insert("Alpha", "ALP", "cid-old", 10).unwrap();
        let newest = repo.insert("Alpha", "ALP", "cid-new", 20).unwrap();
        repo.insert("Alpha", "OTHER", "cid-other", 30).unwrap();

        let found = repo.find_latest_unapplied("Alpha", "ALP").unwrap().unwrap();
        assert_eq!(found.id, newest);
        assert_eq!(found.content_id, "cid-new");

        repo.mark_applied(newest).unwrap();
        let next = repo.find_latest_unapplied("Alpha", "ALP").unwrap().unwrap();
        assert_eq!(next.content_id, "cid-old");
        assert!(!next.applied);
    }

    #[test]
    fn no_match_for_unknown_symbol() {
        let db = Database::in_memory().unwrap();
        let repo = PendingMetadataRepository::new(&db.conn);
        repo.insert("Alpha", "ALP", "cid", 10).unwrap();

        assert!(repo.find_latest_unapplied("Alpha", "BET").unwrap().is_none());
        assert_eq!(repo.list(10).unwrap().len(), 1);
    }
}
