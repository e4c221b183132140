// src/db/kv.rs
use crate::db::connection::Database;
use crate::errors::ServerError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

/// Durable string-keyed store holding JSON documents.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, ServerError>;
    fn write(&self, key: &str, value: &str) -> Result<(), ServerError>;
    fn remove(&self, key: &str) -> Result<(), ServerError>;

    /// Read-modify-write of `key` with no other writer in between. `f` gets
    /// the current value and returns the replacement; an error from `f`
    /// leaves the stored value as it was. `f` must not touch the store.
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String, ServerError>,
    ) -> Result<(), ServerError>;
}

fn select_value(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "select value from kv_store where key = ?",
        params![key],
        |r| r.get(0),
    )
    .optional()
}

fn upsert_value(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        insert into kv_store (key, value, updated_at)
        values (?1, ?2, ?3)
        on conflict(key) do update set
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
        params![key, value, Utc::now().timestamp()],
    )
}

impl KeyValueStore for Database {
    fn read(&self, key: &str) -> Result<Option<String>, ServerError> {
        self.with_conn(|conn| {
            select_value(conn, key).map_err(|e| ServerError::DbError(format!("kv read failed: {e}")))
        })
    }

    fn write(&self, key: &str, value: &str) -> Result<(), ServerError> {
        self.with_conn(|conn| {
            upsert_value(conn, key, value)
                .map_err(|e| ServerError::DbError(format!("kv write failed: {e}")))?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<(), ServerError> {
        self.with_conn(|conn| {
            conn.execute("delete from kv_store where key = ?", params![key])
                .map_err(|e| ServerError::DbError(format!("kv delete failed: {e}")))?;
            Ok(())
        })
    }

    // IMMEDIATE takes the write lock up front, so two workers updating the
    // same key queue on the busy timeout instead of both reading the old value.
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String, ServerError>,
    ) -> Result<(), ServerError> {
        self.with_conn(|conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| ServerError::DbError(format!("kv update begin failed: {e}")))?;
            let current = select_value(&tx, key)
                .map_err(|e| ServerError::DbError(format!("kv read failed: {e}")))?;
            let next = f(current)?;
            upsert_value(&tx, key, &next)
                .map_err(|e| ServerError::DbError(format!("kv write failed: {e}")))?;
            tx.commit()
                .map_err(|e| ServerError::DbError(format!("kv update commit failed: {e}")))
        })
    }
}
