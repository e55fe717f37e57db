//! SQLite-backed rule store and state persistence.
//!
//! Both stores may share one database file. Rules live in `dynamic_rules`, one row
//! per rule; the state is a single JSON document in `kv_store` under [`STATE_KEY`].

use super::traits::{RuleStore, StateStore};
use crate::compiler::CompiledRule;
use crate::error::StoreError;
use crate::state::SyncState;
use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

pub const STATE_KEY: &str = "uorigin-state";

/// Opens a database file in WAL mode so readers never see a half-applied commit.
pub fn open_connection(path: impl AsRef<Path>) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(conn)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

pub struct SqliteRuleStore {
    conn: Mutex<Connection>,
}

impl SqliteRuleStore {
    pub fn new(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS dynamic_rules (
                id INTEGER PRIMARY KEY,
                rule TEXT NOT NULL,
                declarative TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::new(open_connection(path)?)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RuleStore for SqliteRuleStore {
    async fn current_rules(&self) -> Result<Vec<CompiledRule>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached("SELECT rule FROM dynamic_rules ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut rules = Vec::new();
        for row in rows {
            rules.push(serde_json::from_str(&row?)?);
        }
        Ok(rules)
    }

    async fn current_rule_ids(&self) -> Result<Vec<u32>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached("SELECT id FROM dynamic_rules ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, u32>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    async fn replace_rules(
        &self,
        remove_ids: &[u32],
        add_rules: &[CompiledRule],
    ) -> Result<(), StoreError> {
        let mut conn = self.conn();
        // Dropping the transaction on an early return rolls it back.
        let tx = conn.transaction()?;
        {
            let mut delete = tx.prepare_cached("DELETE FROM dynamic_rules WHERE id = ?1")?;
            for id in remove_ids {
                delete.execute(params![id])?;
            }

            let mut insert = tx.prepare_cached(
                "INSERT INTO dynamic_rules (id, rule, declarative) VALUES (?1, ?2, ?3)",
            )?;
            for rule in add_rules {
                let encoded = serde_json::to_string(rule)?;
                let declarative = rule.to_declarative().to_string();
                insert
                    .execute(params![rule.id, encoded, declarative])
                    .map_err(|e| {
                        if is_constraint_violation(&e) {
                            StoreError::DuplicateRuleId(rule.id)
                        } else {
                            StoreError::Sqlite(e)
                        }
                    })?;
            }
        }
        tx.commit()?;

        debug!(
            "Replaced dynamic rules: removed {}, added {}",
            remove_ids.len(),
            add_rules.len()
        );
        Ok(())
    }
}

pub struct SqliteStateStore {
    conn: Mutex<Connection>,
}

impl SqliteStateStore {
    pub fn new(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self::new(open_connection(path.as_ref())?)?;
        info!("SQLite state store initialized at {}", path.as_ref().display());
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn load(&self) -> Result<Option<SyncState>, StoreError> {
        let conn = self.conn();
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![STATE_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, state: &SyncState) -> Result<(), StoreError> {
        let json = serde_json::to_string(state)?;
        self.conn().execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![STATE_KEY, json],
        )?;
        Ok(())
    }
}
