// src/resolver.rs

use crate::db::kv::KeyValueStore;
use crate::db::records;
use crate::domain::category::{Category, CategoryTable};
use crate::domain::normalize::normalize_value;
use crate::domain::property::{sort_by_recency, PropertyRecord, PropertyStatus};
use crate::remote::RemoteSource;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which step of the chain produced the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolvedFrom {
    CategoryCache,
    Consolidated,
    Remote,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub category: Category,
    pub source: ResolvedFrom,
    pub records: Vec<PropertyRecord>,
}

/// Produces the best available listings for a category.
///
/// Sources are tried in a fixed order and the first non-empty one wins:
///
/// 1. the derived per-category cache (available records only)
/// 2. the consolidated dashboard store (matching category, available only)
/// 3. the remote API (any failure counts as empty)
/// 4. a hardcoded sample for the category
///
/// Every step fails soft, so resolving never errors.
pub struct PropertyResolver<'a, S: ?Sized, R: ?Sized> {
    store: &'a S,
    remote: &'a R,
    table: &'a CategoryTable,
}

impl<'a, S, R> PropertyResolver<'a, S, R>
where
    S: KeyValueStore + ?Sized,
    R: RemoteSource + ?Sized,
{
    pub fn new(store: &'a S, remote: &'a R, table: &'a CategoryTable) -> Self {
        Self {
            store,
            remote,
            table,
        }
    }

    pub fn resolve(&self, category: Category, now: DateTime<Utc>) -> Resolution {
        let steps: [(ResolvedFrom, &dyn Fn() -> Vec<PropertyRecord>); 4] = [
            (ResolvedFrom::CategoryCache, &|| self.from_category_cache(category, now)),
            (ResolvedFrom::Consolidated, &|| self.from_consolidated(category, now)),
            (ResolvedFrom::Remote, &|| self.from_remote(category, now)),
            (ResolvedFrom::Fallback, &|| fallback_records(category, now)),
        ];

        for (source, step) in steps {
            let mut records = step();
            if !records.is_empty() {
                sort_by_recency(&mut records);
                tracing::debug!(%category, ?source, count = records.len(), "resolved listings");
                return Resolution {
                    category,
                    source,
                    records,
                };
            }
        }

        // fallback_records is never empty; kept total anyway.
        Resolution {
            category,
            source: ResolvedFrom::Fallback,
            records: Vec::new(),
        }
    }

    fn from_category_cache(&self, category: Category, now: DateTime<Utc>) -> Vec<PropertyRecord> {
        records::load(self.store, &category.cache_key(), self.table, now)
            .into_iter()
            .filter(PropertyRecord::is_available)
            .collect()
    }

    fn from_consolidated(&self, category: Category, now: DateTime<Utc>) -> Vec<PropertyRecord> {
        records::load_dashboard(self.store, self.table, now)
            .properties
            .into_iter()
            .filter(|p| p.category == category && p.is_available())
            .collect()
    }

    fn from_remote(&self, category: Category, now: DateTime<Utc>) -> Vec<PropertyRecord> {
        match self.remote.fetch_category(category) {
            Ok(items) => items
                .into_iter()
                .map(|v| normalize_value(v, self.table, now))
                .collect(),
            Err(e) => {
                tracing::warn!(%category, error = %e, "remote listings unavailable");
                Vec::new()
            }
        }
    }
}

/// Last-resort sample so a category page always has something to show.
pub fn fallback_records(category: Category, now: DateTime<Utc>) -> Vec<PropertyRecord> {
    let (id, title, price, location, beds, baths, parking, area, kind) = match category {
        Category::Launch => (
            "mock_launch_1",
            "Modern Apartment - Downtown",
            450_000.0,
            "Downtown",
            3,
            2,
            2,
            85.0,
            "apartment",
        ),
        Category::MostWanted => (
            "mock_most_wanted_1",
            "Family House - Garden District",
            680_000.0,
            "Garden District",
            4,
            3,
            2,
            180.0,
            "house",
        ),
        Category::Waterfront => (
            "mock_waterfront_1",
            "Lot with Ocean View",
            320_000.0,
            "Seafront",
            0,
            0,
            0,
            500.0,
            "land",
        ),
        Category::MoveInReady => (
            "mock_move_in_ready_1",
            "Move-in Ready Apartment",
            380_000.0,
            "Vila Nova",
            2,
            1,
            1,
            65.0,
            "apartment",
        ),
    };

    vec![PropertyRecord {
        id: id.to_string(),
        title: title.to_string(),
        price_amount: Some(price),
        location: location.to_string(),
        bedroom_count: beds,
        bathroom_count: baths,
        parking_count: parking,
        area_square_meters: Some(area),
        category,
        property_type: Some(kind.to_string()),
        images: Vec::new(),
        description: None,
        features: Vec::new(),
        status: PropertyStatus::Available,
        featured: false,
        created_at: now,
        sold_at: None,
    }]
}
