// sync.rs
use crate::db::connection::Database;
use crate::db::kv::KeyValueStore;
use crate::db::records::{self, ALL_PROPERTIES_KEY};
use crate::domain::category::{Category, CategoryTable};
use crate::domain::property::{PropertyRecord, PropertyStatus};
use crate::errors::ServerError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub total: usize,
    pub available: usize,
    pub sold: usize,
    pub by_category: BTreeMap<String, usize>,
    /// False when there was no dashboard document and the caches were left alone.
    pub written: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub dashboard_total: usize,
    pub cached: BTreeMap<String, usize>,
    pub cached_total: usize,
    pub in_sync: bool,
}

/// Every key the sync step derives from the dashboard.
pub fn derived_keys() -> Vec<String> {
    Category::ALL
        .iter()
        .map(|c| c.cache_key())
        .chain(std::iter::once(ALL_PROPERTIES_KEY.to_string()))
        .collect()
}

/// Rebuilds the per-category caches from the consolidated store.
///
/// Each record lands in exactly one bucket. Buckets keep sold records so the
/// page's own availability filter decides what is shown. A missing or
/// unreadable dashboard leaves the existing caches untouched; a dashboard with
/// no properties empties them.
pub fn sync_dashboard_to_pages<S: KeyValueStore + ?Sized>(
    store: &S,
    table: &CategoryTable,
    now: DateTime<Utc>,
) -> Result<SyncReport, ServerError> {
    let Some(data) = records::find_dashboard(store, table, now)? else {
        tracing::debug!("no dashboard document, page caches left untouched");
        return Ok(SyncReport {
            total: 0,
            available: 0,
            sold: 0,
            by_category: BTreeMap::new(),
            written: false,
        });
    };

    let mut report = SyncReport {
        total: data.properties.len(),
        available: data.properties.iter().filter(|p| p.is_available()).count(),
        sold: data
            .properties
            .iter()
            .filter(|p| p.status == PropertyStatus::Sold)
            .count(),
        by_category: BTreeMap::new(),
        written: false,
    };

    let mut buckets: BTreeMap<Category, Vec<PropertyRecord>> =
        Category::ALL.iter().map(|c| (*c, Vec::new())).collect();
    for record in &data.properties {
        buckets.entry(record.category).or_default().push(record.clone());
    }

    for (category, bucket) in &buckets {
        records::save(store, &category.cache_key(), bucket)?;
        report
            .by_category
            .insert(category.slug().to_string(), bucket.len());
    }
    records::save(store, ALL_PROPERTIES_KEY, &data.properties)?;
    report.written = true;

    tracing::info!(
        total = report.total,
        available = report.available,
        sold = report.sold,
        "synced dashboard to page caches"
    );
    Ok(report)
}

pub fn sync_stats<S: KeyValueStore + ?Sized>(
    store: &S,
    table: &CategoryTable,
    now: DateTime<Utc>,
) -> SyncStats {
    let dashboard_total = records::load_dashboard(store, table, now).properties.len();

    let cached: BTreeMap<String, usize> = Category::ALL
        .iter()
        .map(|c| {
            let count = records::load(store, &c.cache_key(), table, now).len();
            (c.slug().to_string(), count)
        })
        .collect();
    let cached_total = cached.values().sum();

    SyncStats {
        dashboard_total,
        cached,
        cached_total,
        in_sync: dashboard_total == cached_total,
    }
}

pub fn clear_page_caches<S: KeyValueStore + ?Sized>(store: &S) -> Result<(), ServerError> {
    for key in derived_keys() {
        store.remove(&key)?;
    }
    tracing::info!("page caches cleared");
    Ok(())
}

/// Re-syncs on a fixed interval for the life of the process.
pub fn spawn_periodic_sync(db: &Database, table: CategoryTable, interval: Duration) {
    let db = db.clone();

    std::thread::spawn(move || {
        tracing::info!(interval_secs = interval.as_secs(), "periodic sync thread started");
        loop {
            std::thread::sleep(interval);
            if let Err(e) = sync_dashboard_to_pages(&db, &table, Utc::now()) {
                tracing::warn!(error = %e, "periodic sync failed");
            }
        }
    });
}
