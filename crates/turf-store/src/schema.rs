use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    // AUTOINCREMENT on surrogate ids keeps row ids from ever being
    // reused, so an id observed by a client stays valid forever.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS profiles (
            id    INTEGER PRIMARY KEY AUTOINCREMENT,
            name  TEXT NOT NULL,
            color TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS accounts (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            device  TEXT NOT NULL UNIQUE,
            token   TEXT NOT NULL UNIQUE,
            user_id INTEGER NOT NULL REFERENCES profiles(id)
        );

        CREATE TABLE IF NOT EXISTS friendships (
            id     INTEGER PRIMARY KEY AUTOINCREMENT,
            source INTEGER NOT NULL REFERENCES profiles(id),
            target INTEGER NOT NULL REFERENCES profiles(id)
        );

        CREATE TABLE IF NOT EXISTS hotspots (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            token           TEXT NOT NULL UNIQUE,
            ssid            TEXT NOT NULL UNIQUE,
            last_capture_at INTEGER NOT NULL,
            conqueror       INTEGER REFERENCES profiles(id),
            revision        INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS positions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            source      INTEGER NOT NULL REFERENCES profiles(id),
            latitude    REAL NOT NULL,
            longitude   REAL NOT NULL,
            observed_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS scores (
            user_id INTEGER PRIMARY KEY REFERENCES profiles(id),
            points  INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_positions_observed ON positions(observed_at);
        CREATE INDEX IF NOT EXISTS idx_positions_source ON positions(source);
        CREATE INDEX IF NOT EXISTS idx_friendships_source ON friendships(source);
        ",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}
