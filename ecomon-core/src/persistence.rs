//! SQLite persistence for guardian accounts.
//!
//! One JSON record per user, holding the guardian's progress and the
//! companion with its nested emotions, memory log, evolution ledger and
//! corruption tracker:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS accounts (
//!     user_id    TEXT PRIMARY KEY,
//!     data       BLOB NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```
//!
//! - WAL mode for concurrent reads.
//! - JSON inside a BLOB keeps the schema stable when state types grow.
//! - Optional CRC-32 checksum detects save corruption.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::companion::Companion;
use crate::config::PersistenceConfig;
use crate::error::{EcomonError, Result};
use crate::guardian::Guardian;
use crate::types::UserId;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS accounts (
    user_id    TEXT PRIMARY KEY,
    data       BLOB NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT
);";

/// Everything stored for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// The user's progress.
    pub guardian: Guardian,
    /// The adopted companion, if any.
    pub companion: Option<Companion>,
    /// Keys of achievements already awarded.
    #[serde(default)]
    pub awards: BTreeSet<String>,
}

impl AccountRecord {
    /// A record with no companion and no awards.
    #[must_use]
    pub fn new(guardian: Guardian) -> Self {
        Self { guardian, companion: None, awards: BTreeSet::new() }
    }
}

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

/// CRC-32 (ISO 3309) of `data` as lowercase hex.
fn crc32_hex(data: &[u8]) -> String {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ POLY } else { crc >> 1 };
        }
    }
    format!("{:08x}", !crc)
}

// ---------------------------------------------------------------------------
// CompanionStore
// ---------------------------------------------------------------------------

/// Handle to an open SQLite database of [`AccountRecord`]s.
///
/// ```no_run
/// # use ecomon_core::persistence::{AccountRecord, CompanionStore};
/// # use ecomon_core::config::PersistenceConfig;
/// # use ecomon_core::{Guardian, UserId};
/// let store = CompanionStore::open("ecomon.db", &PersistenceConfig::default())?;
/// let user = UserId::new();
/// let record = AccountRecord::new(Guardian::new(user, "Ari"));
/// store.save(&user, &record)?;
/// let loaded = store.load(&user)?;
/// # Ok::<(), ecomon_core::EcomonError>(())
/// ```
pub struct CompanionStore {
    conn: Connection,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for CompanionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompanionStore")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CompanionStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EcomonError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "Companion store opened"
        );

        Ok(Self {
            conn,
            config: config.clone(),
            db_path,
        })
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`EcomonError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            config: config.clone(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Save (upsert) a user's record.
    ///
    /// # Errors
    ///
    /// [`EcomonError::Serialization`] if JSON encoding fails, or
    /// [`EcomonError::Database`] on SQLite failures.
    pub fn save(&self, user: &UserId, record: &AccountRecord) -> Result<()> {
        let start = Instant::now();
        let json = serde_json::to_vec(record).map_err(|e| EcomonError::Serialization(e.to_string()))?;
        let checksum = self.config.checksum_enabled.then(|| crc32_hex(&json));

        self.conn.execute(
            "INSERT INTO accounts (user_id, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![user.0.to_string(), json, Utc::now().to_rfc3339(), checksum],
        )?;

        debug!(
            user = %user,
            has_companion = record.companion.is_some(),
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved account"
        );
        Ok(())
    }

    /// Load a user's record, or `None` if nothing was saved.
    ///
    /// A checksum mismatch is logged and the data is still returned.
    ///
    /// # Errors
    ///
    /// [`EcomonError::Serialization`] if JSON decoding fails, or
    /// [`EcomonError::Database`] on SQLite failures.
    pub fn load(&self, user: &UserId) -> Result<Option<AccountRecord>> {
        let start = Instant::now();
        let mut stmt = self
            .conn
            .prepare_cached("SELECT data, checksum FROM accounts WHERE user_id = ?1")?;
        let row: Option<(Vec<u8>, Option<String>)> = stmt
            .query_row(params![user.0.to_string()], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((data, stored_checksum)) = row else {
            return Ok(None);
        };

        if self.config.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(&data);
                if expected != actual {
                    warn!(
                        user = %user,
                        expected = %expected,
                        actual = %actual,
                        "Checksum mismatch, possible save corruption"
                    );
                }
            }
        }

        let record: AccountRecord =
            serde_json::from_slice(&data).map_err(|e| EcomonError::Serialization(e.to_string()))?;
        debug!(
            user = %user,
            elapsed_us = start.elapsed().as_micros(),
            "Loaded account"
        );
        Ok(Some(record))
    }

    /// Delete a user's record. Returns `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`EcomonError::Database`] on SQLite failures.
    pub fn delete(&self, user: &UserId) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM accounts WHERE user_id = ?1", params![user.0.to_string()])?;
        Ok(deleted > 0)
    }

    /// All users with a saved record.
    ///
    /// # Errors
    ///
    /// Returns [`EcomonError::Database`] on SQLite failures.
    pub fn list_users(&self) -> Result<Vec<UserId>> {
        let mut stmt = self.conn.prepare_cached("SELECT user_id FROM accounts")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut users = Vec::new();
        for row in rows {
            let id = row?;
            match uuid::Uuid::parse_str(&id) {
                Ok(uuid) => users.push(UserId(uuid)),
                Err(_) => warn!(id = %id, "Skipping row with invalid UUID"),
            }
        }
        Ok(users)
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`EcomonError::Database`] on SQLite failures.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Copy the database to `dest_path` using SQLite's online-backup API.
    ///
    /// # Errors
    ///
    /// Returns [`EcomonError::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let backup = rusqlite::backup::Backup::new(&self.conn, &mut dest)?;
        backup.run_to_completion(256, std::time::Duration::from_millis(50), None)?;
        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Database backup completed"
        );
        Ok(())
    }

    /// Write `<db>.bak.1`, shifting older backups up and keeping at most
    /// `backup_count`. No-op for in-memory databases.
    ///
    /// # Errors
    ///
    /// Returns [`EcomonError::Database`] or [`EcomonError::Io`] on failure.
    pub fn create_rotating_backup(&self) -> Result<()> {
        let max = self.config.backup_count;
        if self.db_path.as_os_str() == ":memory:" || max == 0 {
            return Ok(());
        }
        for i in (1..max).rev() {
            let src = self.backup_path(i);
            if src.exists() {
                std::fs::rename(&src, self.backup_path(i + 1))?;
            }
        }
        self.backup(self.backup_path(1))
    }

    fn backup_path(&self, n: u32) -> PathBuf {
        let mut name = self.db_path.clone().into_os_string();
        name.push(format!(".bak.{n}"));
        PathBuf::from(name)
    }

    /// Path of the database file (`:memory:` for in-memory stores).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run `PRAGMA integrity_check`.
    ///
    /// # Errors
    ///
    /// Returns [`EcomonError::Database`] if the query fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::companion::CompanionEvent;
    use crate::config::EngineConfig;
    use crate::types::{Personality, Species};

    fn sample(user: UserId) -> AccountRecord {
        let config = EngineConfig::default();
        let mut companion =
            Companion::new(user, "Ripple", Species::Water, Personality::Scientist, &config).expect("companion");
        companion
            .apply_event(&CompanionEvent::Chat { message: "good morning".into() }, &config)
            .expect("chat");
        let mut record = AccountRecord::new(Guardian::new(user, "Ari"));
        record.companion = Some(companion);
        record.awards.insert("tree-planter".to_string());
        record
    }

    #[test]
    fn crc_matches_reference_value() {
        assert_eq!(crc32_hex(b"123456789"), "cbf43926");
    }

    #[test]
    fn round_trip_save_load() {
        let store = CompanionStore::open_in_memory(&PersistenceConfig::default()).expect("open");
        let user = UserId::new();
        let record = sample(user);
        store.save(&user, &record).expect("save");
        let loaded = store.load(&user).expect("load").expect("present");
        assert_eq!(loaded, record);
    }

    #[test]
    fn load_missing_returns_none() {
        let store = CompanionStore::open_in_memory(&PersistenceConfig::default()).expect("open");
        assert!(store.load(&UserId::new()).expect("load").is_none());
    }

    #[test]
    fn upsert_overwrites() {
        let store = CompanionStore::open_in_memory(&PersistenceConfig::default()).expect("open");
        let user = UserId::new();
        let mut record = sample(user);
        store.save(&user, &record).expect("save");
        record.guardian.eco_points = 500;
        store.save(&user, &record).expect("save again");
        let loaded = store.load(&user).expect("load").expect("present");
        assert_eq!(loaded.guardian.eco_points, 500);
        assert_eq!(store.count().expect("count"), 1);
    }

    #[test]
    fn delete_and_list() {
        let store = CompanionStore::open_in_memory(&PersistenceConfig::default()).expect("open");
        let (a, b) = (UserId::new(), UserId::new());
        store.save(&a, &sample(a)).expect("save a");
        store.save(&b, &sample(b)).expect("save b");

        let mut users = store.list_users().expect("list");
        users.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(users, expected);

        assert!(store.delete(&a).expect("delete"));
        assert!(!store.delete(&a).expect("delete again"));
        assert_eq!(store.count().expect("count"), 1);
    }

    #[test]
    fn integrity_check_passes() {
        let store = CompanionStore::open_in_memory(&PersistenceConfig::default()).expect("open");
        assert!(store.integrity_check().expect("check"));
    }
}
