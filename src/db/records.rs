// src/db/records.rs
//
// Property collections stored as JSON documents under well-known keys.

use crate::db::kv::KeyValueStore;
use crate::domain::category::CategoryTable;
use crate::domain::dashboard::DashboardData;
use crate::domain::normalize::normalize_value;
use crate::domain::property::PropertyRecord;
use crate::errors::ServerError;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Consolidated store maintained by the admin dashboard.
pub const DASHBOARD_KEY: &str = "dashboardData";
/// Flattened output of the last sync.
pub const ALL_PROPERTIES_KEY: &str = "allProperties";

/// Loads and normalizes the records under `key`.
///
/// Never fails: a missing key, a read error, or a document that is not a list
/// of records all come back as an empty list.
pub fn load<S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
    table: &CategoryTable,
    now: DateTime<Utc>,
) -> Vec<PropertyRecord> {
    let text = match store.read(key) {
        Ok(Some(text)) => text,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(key, error = %e, "storage read failed, treating as empty");
            return Vec::new();
        }
    };

    let items = match serde_json::from_str::<Value>(&text) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Object(mut obj)) => match obj.remove("properties") {
            Some(Value::Array(items)) => items,
            _ => {
                tracing::warn!(key, "stored object has no properties list");
                return Vec::new();
            }
        },
        Ok(_) => {
            tracing::warn!(key, "stored value is not a collection");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "stored value is not valid JSON");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .map(|v| normalize_value(v, table, now))
        .collect()
}

/// Serializes `records` in the current shape and overwrites `key`.
pub fn save<S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
    records: &[PropertyRecord],
) -> Result<(), ServerError> {
    let body = serde_json::to_string(records)
        .map_err(|e| ServerError::DbError(format!("serialize {key} failed: {e}")))?;
    store.write(key, &body)
}

/// Reads the consolidated store, or `None` when there is no readable
/// document. Read errors propagate.
pub fn find_dashboard<S: KeyValueStore + ?Sized>(
    store: &S,
    table: &CategoryTable,
    now: DateTime<Utc>,
) -> Result<Option<DashboardData>, ServerError> {
    Ok(store
        .read(DASHBOARD_KEY)?
        .and_then(|text| parse_dashboard(&text, table, now)))
}

/// Reads the consolidated store. Read errors propagate so a write path never
/// overwrites data it could not see; unparsable content reads as empty.
pub fn read_dashboard<S: KeyValueStore + ?Sized>(
    store: &S,
    table: &CategoryTable,
    now: DateTime<Utc>,
) -> Result<DashboardData, ServerError> {
    Ok(find_dashboard(store, table, now)?.unwrap_or_else(|| DashboardData::empty(now)))
}

fn parse_dashboard(text: &str, table: &CategoryTable, now: DateTime<Utc>) -> Option<DashboardData> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Some(DashboardData::from_value(value, table, now)),
        Err(e) => {
            tracing::warn!(error = %e, "dashboard document is not valid JSON");
            None
        }
    }
}

fn dashboard_body(data: &mut DashboardData, now: DateTime<Utc>) -> Result<String, ServerError> {
    data.last_updated = now;
    serde_json::to_string(data)
        .map_err(|e| ServerError::DbError(format!("serialize dashboard failed: {e}")))
}

/// Soft variant for read-only callers.
pub fn load_dashboard<S: KeyValueStore + ?Sized>(
    store: &S,
    table: &CategoryTable,
    now: DateTime<Utc>,
) -> DashboardData {
    read_dashboard(store, table, now).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "dashboard read failed, treating as empty");
        DashboardData::empty(now)
    })
}

/// Read, mutate, write back as one atomic step, so concurrent writers never
/// drop each other's changes. The closure's error aborts without writing.
pub fn update_dashboard<S, F, T>(
    store: &S,
    table: &CategoryTable,
    now: DateTime<Utc>,
    f: F,
) -> Result<T, ServerError>
where
    S: KeyValueStore + ?Sized,
    F: FnOnce(&mut DashboardData) -> Result<T, ServerError>,
{
    let mut f = Some(f);
    let mut out = None;

    store.update(DASHBOARD_KEY, &mut |current| {
        let mut data = current
            .and_then(|text| parse_dashboard(&text, table, now))
            .unwrap_or_else(|| DashboardData::empty(now));
        let f = f.take().ok_or(ServerError::InternalError)?;
        out = Some(f(&mut data)?);
        dashboard_body(&mut data, now)
    })?;

    out.ok_or(ServerError::InternalError)
}
