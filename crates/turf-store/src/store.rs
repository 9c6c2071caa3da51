use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

use turf_core::{GeoPoint, Hotspot, HotspotDraft, HotspotId, PositionSample, UserId};

use crate::error::{Result, StoreError};
use crate::schema;

/// Narrow read/write surface over the SQLite backing file.
///
/// Engines hold a borrowed `Store` rather than a connection; tests
/// inject `open_in_memory()`.
pub struct Store {
    conn: Connection,
}

/// A player profile as stored, without the ledger total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProfileRecord {
    pub id: UserId,
    pub name: String,
    pub color: String,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM metadata WHERE key = ?1")?;
        Ok(stmt.query_row([key], |row| row.get(0)).optional()?)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Accounts & profiles ---

    /// Register a device as one transaction: profile row, account row,
    /// zeroed ledger entry, and the demo social graph (every existing
    /// profile becomes a friend of the newcomer).
    pub fn create_account(
        &self,
        device: &str,
        token: &str,
        name: &str,
        color: &str,
    ) -> Result<UserId> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO profiles (name, color) VALUES (?1, ?2)",
            params![name, color],
        )?;
        let user_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO accounts (device, token, user_id) VALUES (?1, ?2, ?3)",
            params![device, token, user_id],
        )?;
        tx.execute("INSERT INTO scores (user_id, points) VALUES (?1, 0)", [user_id])?;
        tx.execute(
            "INSERT INTO friendships (source, target)
             SELECT ?1, id FROM profiles WHERE id != ?1",
            [user_id],
        )?;
        tx.commit()?;
        Ok(UserId(user_id))
    }

    pub fn account_by_device(&self, device: &str) -> Result<Option<(UserId, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, token FROM accounts WHERE device = ?1")?;
        Ok(stmt
            .query_row([device], |row| Ok((UserId(row.get(0)?), row.get(1)?)))
            .optional()?)
    }

    /// Resolve a session credential to its profile identity.
    pub fn account_by_token(&self, token: &str) -> Result<Option<UserId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id FROM accounts WHERE token = ?1")?;
        Ok(stmt
            .query_row([token], |row| Ok(UserId(row.get(0)?)))
            .optional()?)
    }

    pub fn device_of(&self, user: UserId) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT device FROM accounts WHERE user_id = ?1")?;
        Ok(stmt.query_row([user.0], |row| row.get(0)).optional()?)
    }

    pub fn profile_by_id(&self, user: UserId) -> Result<Option<ProfileRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color FROM profiles WHERE id = ?1")?;
        Ok(stmt
            .query_row([user.0], |row| {
                Ok(ProfileRecord {
                    id: UserId(row.get(0)?),
                    name: row.get(1)?,
                    color: row.get(2)?,
                })
            })
            .optional()?)
    }

    pub fn set_profile_name(&self, user: UserId, name: &str) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE profiles SET name = ?1 WHERE id = ?2",
            params![name, user.0],
        )?;
        if rows == 0 {
            return Err(StoreError::InvalidData(format!(
                "profile not found: {}",
                user.0
            )));
        }
        Ok(())
    }

    pub fn set_profile_color(&self, user: UserId, color: &str) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE profiles SET color = ?1 WHERE id = ?2",
            params![color, user.0],
        )?;
        if rows == 0 {
            return Err(StoreError::InvalidData(format!(
                "profile not found: {}",
                user.0
            )));
        }
        Ok(())
    }

    pub fn friend_ids(&self, user: UserId) -> Result<Vec<UserId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT target FROM friendships WHERE source = ?1 ORDER BY target")?;
        let ids = stmt
            .query_map([user.0], |row| Ok(UserId(row.get(0)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    // --- Hotspots ---

    pub fn insert_hotspot(&self, draft: &HotspotDraft) -> Result<HotspotId> {
        self.conn.execute(
            "INSERT INTO hotspots (token, ssid, last_capture_at) VALUES (?1, ?2, ?3)",
            params![draft.token, draft.ssid, draft.last_capture_at as i64],
        )?;
        Ok(HotspotId(self.conn.last_insert_rowid()))
    }

    pub fn hotspot_by_ssid(&self, ssid: &str) -> Result<Option<Hotspot>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, token, ssid, last_capture_at, conqueror, revision
             FROM hotspots WHERE ssid = ?1",
        )?;
        Ok(stmt.query_row([ssid], hotspot_row).optional()?)
    }

    pub fn hotspot_by_token(&self, token: &str) -> Result<Option<Hotspot>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, token, ssid, last_capture_at, conqueror, revision
             FROM hotspots WHERE token = ?1",
        )?;
        Ok(stmt.query_row([token], hotspot_row).optional()?)
    }

    pub fn update_ssid(&self, id: HotspotId, ssid: &str) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE hotspots SET ssid = ?1, revision = revision + 1 WHERE id = ?2",
            params![ssid, id.0],
        )?;
        if rows == 0 {
            return Err(StoreError::InvalidData(format!("hotspot not found: {}", id.0)));
        }
        Ok(())
    }

    /// The capture state swap, guarded by the revision the caller read.
    ///
    /// Returns whether the swap landed. A `false` means another writer
    /// got there first and the caller's snapshot is stale; nothing was
    /// written.
    pub fn apply_capture(
        &self,
        id: HotspotId,
        expected_revision: i64,
        now: u64,
        conqueror: UserId,
    ) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE hotspots
             SET last_capture_at = ?1, conqueror = ?2, revision = revision + 1
             WHERE id = ?3 AND revision = ?4",
            params![now as i64, conqueror.0, id.0, expected_revision],
        )?;
        Ok(rows == 1)
    }

    // --- Positions ---

    pub fn append_position(&self, sample: &PositionSample) -> Result<()> {
        self.conn.execute(
            "INSERT INTO positions (source, latitude, longitude, observed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                sample.source.0,
                sample.point.lat,
                sample.point.lon,
                sample.observed_at as i64
            ],
        )?;
        Ok(())
    }

    /// Samples newer than `cutoff`, most recent first. Ties break on
    /// insertion order so the scan stays deterministic.
    pub fn positions_since(&self, cutoff: u64) -> Result<Vec<PositionSample>> {
        let mut stmt = self.conn.prepare(
            "SELECT source, latitude, longitude, observed_at
             FROM positions WHERE observed_at > ?1
             ORDER BY observed_at DESC, id DESC",
        )?;
        let samples = stmt
            .query_map([cutoff as i64], |row| {
                Ok(PositionSample {
                    source: UserId(row.get(0)?),
                    point: GeoPoint::new(row.get(1)?, row.get(2)?),
                    observed_at: row.get::<_, i64>(3)? as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(samples)
    }

    /// Drop samples at or past the window edge. Returns how many went.
    pub fn prune_positions(&self, cutoff: u64) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM positions WHERE observed_at <= ?1",
            [cutoff as i64],
        )?;
        Ok(rows)
    }

    // --- Counters for diagnostics ---

    pub fn count(&self, table: &str) -> Result<i64> {
        // table names come from our own callers, never user input
        let count = self
            .conn
            .query_row(&format!("SELECT count(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }
}

fn hotspot_row(row: &Row<'_>) -> rusqlite::Result<Hotspot> {
    Ok(Hotspot {
        id: HotspotId(row.get(0)?),
        token: row.get(1)?,
        ssid: row.get(2)?,
        last_capture_at: row.get::<_, i64>(3)? as u64,
        conqueror: row.get::<_, Option<i64>>(4)?.map(UserId),
        revision: row.get(5)?,
    })
}
