use std::path::Path;

use rusqlite::{params_from_iter, Connection, OpenFlags, Transaction};
use tracing::debug;

use crate::profile::{ProfileField, ProfileId, ProfileRecord};
use crate::store::{ProfileStore, ProfileWriter, StoreError, StoreResult};

const DELETE_CHUNK: usize = 500;

/// SQLite-backed profile store. Opened once at startup and handed to the
/// reconciler; call [`SqliteStore::close`] on shutdown.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| StoreError::Backend(format!("create {:?}: {}", dir, e)))?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        debug!("Opened profile store at {:?}", path);
        Ok(SqliteStore { conn })
    }

    /// Open for reading only. A missing database is an empty in-memory
    /// snapshot; nothing is created on disk either way.
    pub fn open_snapshot(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            debug!("No profile store at {:?}, using an empty snapshot", path);
            let store = Self::open_in_memory()?;
            store.init_schema()?;
            return Ok(store);
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)?;
        conn.execute_batch("PRAGMA query_only = ON;")?;
        debug!("Opened profile store snapshot at {:?}", path);
        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(SqliteStore {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn close(self) -> StoreResult<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    #[cfg(test)]
    pub(crate) fn conn_for_tests(&self) -> &Connection {
        &self.conn
    }

    pub fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS profiles (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                profile_id        INTEGER NOT NULL UNIQUE CHECK(profile_id > 0),
                name              TEXT NOT NULL,
                job_title         TEXT,
                profile_url       TEXT,
                profile_image_url TEXT,
                created_at        TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at        TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS subscribers (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                email      TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }

    // ── Subscribers ──

    /// Returns false if the address was already subscribed.
    pub fn add_subscriber(&self, email: &str) -> StoreResult<bool> {
        let n = self.conn.execute(
            "INSERT OR IGNORE INTO subscribers (email) VALUES (?1)",
            [email],
        )?;
        Ok(n > 0)
    }

    pub fn remove_subscriber(&self, email: &str) -> StoreResult<bool> {
        let n = self
            .conn
            .execute("DELETE FROM subscribers WHERE email = ?1", [email])?;
        Ok(n > 0)
    }

    pub fn list_subscribers(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT email FROM subscribers ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    }
}

impl ProfileStore for SqliteStore {
    fn find_all(&self) -> StoreResult<Vec<ProfileRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT profile_id, name, job_title, profile_url, profile_image_url
             FROM profiles ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, name, job_title, profile_url, profile_image_url)| {
                let profile_id = ProfileId::try_from(id).map_err(|_| StoreError::BadProfileId(id))?;
                Ok(ProfileRecord {
                    profile_id,
                    name: Some(name),
                    job_title,
                    profile_url,
                    profile_image_url,
                    section_title: None,
                })
            })
            .collect()
    }

    fn run_in_transaction<T, F>(&mut self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn ProfileWriter) -> StoreResult<T>,
    {
        let tx = self.conn.transaction()?;
        let out = {
            let mut writer = SqliteWriter { tx: &tx };
            f(&mut writer)?
        };
        tx.commit()?;
        Ok(out)
    }
}

struct SqliteWriter<'a> {
    tx: &'a Transaction<'a>,
}

impl ProfileWriter for SqliteWriter<'_> {
    fn bulk_upsert(
        &mut self,
        records: &[&ProfileRecord],
        update_columns: &[ProfileField],
    ) -> StoreResult<()> {
        let mut stmt = self.tx.prepare(&upsert_sql(update_columns))?;
        for r in records {
            if r.name.is_none() {
                return Err(StoreError::MissingName(r.profile_id));
            }
            stmt.execute(rusqlite::params![
                r.profile_id,
                r.name,
                r.job_title,
                r.profile_url,
                r.profile_image_url,
            ])?;
        }
        debug!("Upserted {} profiles", records.len());
        Ok(())
    }

    fn delete_ids(&mut self, ids: &[ProfileId]) -> StoreResult<()> {
        for chunk in ids.chunks(DELETE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!("DELETE FROM profiles WHERE profile_id IN ({})", placeholders);
            self.tx.execute(&sql, params_from_iter(chunk.iter()))?;
        }
        debug!("Deleted {} profiles", ids.len());
        Ok(())
    }
}

fn upsert_sql(update_columns: &[ProfileField]) -> String {
    let insert = "INSERT INTO profiles (profile_id, name, job_title, profile_url, profile_image_url)
         VALUES (?1, ?2, ?3, ?4, ?5)";
    if update_columns.is_empty() {
        return format!("{} ON CONFLICT(profile_id) DO NOTHING", insert);
    }
    let sets: Vec<String> = update_columns
        .iter()
        .map(|f| format!("{col} = excluded.{col}", col = f.column()))
        .collect();
    format!(
        "{} ON CONFLICT(profile_id) DO UPDATE SET {}, updated_at = datetime('now')",
        insert,
        sets.join(", ")
    )
}
