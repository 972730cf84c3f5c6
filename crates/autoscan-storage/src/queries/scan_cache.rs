//! scan_cache queries: bulk load, batched upsert and prune, clear.

use autoscan_core::errors::StorageError;
use rusqlite::{params, Connection, TransactionBehavior};

use crate::connection::sqlite_error;

/// A cached detection result for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCacheRecord {
    pub path: String,
    pub fingerprint: String,
    pub file_size: i64,
    pub mtime_secs: i64,
    pub mtime_nanos: i64,
    pub result_json: String,
    pub cached_at: i64,
}

/// Load every record (snapshot taken once at scan start).
pub fn load_all(conn: &Connection) -> Result<Vec<ScanCacheRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT path, fingerprint, file_size, mtime_secs, mtime_nanos, result_json, cached_at
             FROM scan_cache",
        )
        .map_err(sqlite_error)?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ScanCacheRecord {
                path: row.get(0)?,
                fingerprint: row.get(1)?,
                file_size: row.get(2)?,
                mtime_secs: row.get(3)?,
                mtime_nanos: row.get(4)?,
                result_json: row.get(5)?,
                cached_at: row.get(6)?,
            })
        })
        .map_err(sqlite_error)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(sqlite_error)?);
    }
    Ok(result)
}

/// Upsert `records` and delete `removed` paths in one IMMEDIATE transaction.
///
/// Either every change lands or none does.
pub fn apply_batch(
    conn: &mut Connection,
    records: &[ScanCacheRecord],
    removed: &[String],
) -> Result<(), StorageError> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(sqlite_error)?;
    {
        let mut upsert = tx
            .prepare_cached(
                "INSERT OR REPLACE INTO scan_cache
                 (path, fingerprint, file_size, mtime_secs, mtime_nanos, result_json, cached_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(sqlite_error)?;
        for record in records {
            upsert
                .execute(params![
                    record.path,
                    record.fingerprint,
                    record.file_size,
                    record.mtime_secs,
                    record.mtime_nanos,
                    record.result_json,
                    record.cached_at,
                ])
                .map_err(sqlite_error)?;
        }

        let mut delete = tx
            .prepare_cached("DELETE FROM scan_cache WHERE path = ?1")
            .map_err(sqlite_error)?;
        for path in removed {
            delete.execute(params![path]).map_err(sqlite_error)?;
        }
    }
    tx.commit().map_err(sqlite_error)
}

/// Delete every record.
pub fn clear(conn: &Connection) -> Result<usize, StorageError> {
    conn.execute("DELETE FROM scan_cache", []).map_err(sqlite_error)
}

/// Count records.
pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM scan_cache", [], |row| row.get(0))
        .map_err(sqlite_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheDatabase;

    fn record(path: &str, fingerprint: u8) -> ScanCacheRecord {
        ScanCacheRecord {
            path: path.to_string(),
            fingerprint: format!("{fingerprint:064x}"),
            file_size: 10,
            mtime_secs: 1_700_000_000,
            mtime_nanos: 0,
            result_json: "{}".to_string(),
            cached_at: 1_700_000_001,
        }
    }

    #[test]
    fn batch_upserts_then_prunes() {
        let mut db = CacheDatabase::open_in_memory().unwrap();
        apply_batch(db.conn_mut(), &[record("/a.py", 1), record("/b.py", 2)], &[]).unwrap();
        assert_eq!(count(db.conn()).unwrap(), 2);

        apply_batch(db.conn_mut(), &[record("/a.py", 9)], &["/b.py".to_string()]).unwrap();
        let all = load_all(db.conn()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].fingerprint, format!("{:064x}", 9));
    }

    #[test]
    fn clear_empties_the_table() {
        let mut db = CacheDatabase::open_in_memory().unwrap();
        apply_batch(db.conn_mut(), &[record("/a.py", 1)], &[]).unwrap();
        assert_eq!(clear(db.conn()).unwrap(), 1);
        assert_eq!(count(db.conn()).unwrap(), 0);
    }
}
