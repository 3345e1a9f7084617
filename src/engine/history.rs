// Wardsim Engine — Conversation Turn Log
// Stores the session's ordered turn history in SQLite via rusqlite.
// Append-only within a session; cleared only by an explicit reset.
//
// A `seq` column orders turns rather than the wall clock — two turns land
// inside the same `datetime('now')` second routinely.

use crate::atoms::error::EngineResult;
use crate::atoms::types::{Role, Turn};
use log::info;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;

/// Thread-safe turn log wrapper.
pub struct TurnLog {
    conn: Mutex<Connection>,
}

impl TurnLog {
    /// Open (or create) the turn-log database and initialize tables.
    pub fn open(path: &Path) -> EngineResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        info!("[engine] Opening turn log at {:?}", path);
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
        run_migrations(&conn)?;
        Ok(TurnLog { conn: Mutex::new(conn) })
    }

    /// An in-memory log for tests and ephemeral demo sessions.
    pub fn open_in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(TurnLog { conn: Mutex::new(conn) })
    }

    /// Append one turn at the end of the history.
    pub fn append(&self, role: Role, text: &str) -> EngineResult<()> {
        let conn = self.conn.lock();
        let role_str = match role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        conn.execute(
            "INSERT INTO turns (id, seq, role, text)
             VALUES (?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM turns), ?2, ?3)",
            params![uuid::Uuid::new_v4().to_string(), role_str, text],
        )?;
        Ok(())
    }

    /// All turns in order.
    pub fn turns(&self) -> EngineResult<Vec<Turn>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT role, text FROM turns ORDER BY seq ASC")?;
        let turns = stmt
            .query_map([], |row| {
                let role: String = row.get(0)?;
                Ok(Turn {
                    role: if role == "user" { Role::User } else { Role::Assistant },
                    text: row.get(1)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(turns)
    }

    pub fn len(&self) -> EngineResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM turns", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> EngineResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop the whole history (the reset path re-seeds the greeting after).
    pub fn clear(&self) -> EngineResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM turns", [])?;
        Ok(())
    }
}

// Idempotent migrations: append new CREATE TABLE IF NOT EXISTS statements at
// the end, never modify existing SQL.
fn run_migrations(conn: &Connection) -> EngineResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS turns (
            id TEXT PRIMARY KEY,
            seq INTEGER NOT NULL,
            role TEXT NOT NULL,
            text TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_turns_seq ON turns(seq);
    ",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_preserve_order() {
        let log = TurnLog::open_in_memory().unwrap();
        log.append(Role::User, "hello").unwrap();
        log.append(Role::Assistant, "(silence)").unwrap();
        log.append(Role::User, "are you okay?").unwrap();

        let turns = log.turns().unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0], Turn { role: Role::User, text: "hello".into() });
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[2].text, "are you okay?");
    }

    #[test]
    fn clear_empties_the_log() {
        let log = TurnLog::open_in_memory().unwrap();
        log.append(Role::User, "hello").unwrap();
        assert!(!log.is_empty().unwrap());
        log.clear().unwrap();
        assert!(log.is_empty().unwrap());
        assert!(log.turns().unwrap().is_empty());
    }

    #[test]
    fn reopening_a_file_log_keeps_turns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        {
            let log = TurnLog::open(&path).unwrap();
            log.append(Role::Assistant, "greeting").unwrap();
        }
        let log = TurnLog::open(&path).unwrap();
        assert_eq!(log.len().unwrap(), 1);
        assert_eq!(log.turns().unwrap()[0].text, "greeting");
    }
}
