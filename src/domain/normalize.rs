// src/domain/normalize.rs

use crate::domain::category::CategoryTable;
use crate::domain::property::{
    PropertyRecord, PropertyStatus, NO_LOCATION_PLACEHOLDER, UNTITLED_PLACEHOLDER,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Candidate source field names for each attribute, tried in order.
struct FieldNames {
    id: &'static [&'static str],
    title: &'static [&'static str],
    price: &'static [&'static str],
    location: &'static [&'static str],
    bedrooms: &'static [&'static str],
    bathrooms: &'static [&'static str],
    parking: &'static [&'static str],
    area: &'static [&'static str],
    category: &'static [&'static str],
    property_type: &'static [&'static str],
    images: &'static [&'static str],
    description: &'static [&'static str],
    features: &'static [&'static str],
    status: &'static [&'static str],
    featured: &'static [&'static str],
    created_at: &'static [&'static str],
    sold_at: &'static [&'static str],
}

/// Dashboard / API shape (english names, plus our own serialized names).
static CURRENT_FIELDS: FieldNames = FieldNames {
    id: &["id", "property_id"],
    title: &["title", "name"],
    price: &["priceAmount", "price"],
    location: &["location", "address"],
    bedrooms: &["bedroomCount", "bedrooms"],
    bathrooms: &["bathroomCount", "bathrooms"],
    parking: &["parkingCount", "parking", "garage"],
    area: &["areaSquareMeters", "area"],
    category: &["category"],
    property_type: &["propertyType", "type"],
    images: &["images"],
    description: &["description"],
    features: &["features"],
    status: &["status"],
    featured: &["featured", "highlight"],
    created_at: &["createdAt", "created_at", "date_added"],
    sold_at: &["soldAt", "saleDate", "sold_at"],
};

/// Listing-page shape written by the older sync code.
static LEGACY_FIELDS: FieldNames = FieldNames {
    id: &["id"],
    title: &["titulo"],
    price: &["preco"],
    location: &["localizacao"],
    bedrooms: &["quartos"],
    bathrooms: &["banheiros"],
    parking: &["garagem", "vagas"],
    area: &["area"],
    category: &["categoria"],
    property_type: &["tipo"],
    images: &["imagens"],
    description: &["descricao"],
    features: &["caracteristicas"],
    status: &["status"],
    featured: &["destaque"],
    created_at: &["createdAt", "dataCriacao"],
    sold_at: &["saleDate", "dataVenda"],
};

/// Presence of any of these marks an object as the legacy shape.
const LEGACY_MARKERS: &[&str] = &[
    "titulo",
    "preco",
    "localizacao",
    "quartos",
    "banheiros",
    "imagens",
    "categoria",
    "descricao",
];

/// A raw record as found in storage or on the wire, tagged with its shape.
/// Classified once at ingestion; nothing downstream looks at field names again.
#[derive(Debug, Clone, PartialEq)]
pub enum RawProperty {
    Legacy(Map<String, Value>),
    Current(Map<String, Value>),
}

impl RawProperty {
    pub fn classify(value: Value) -> RawProperty {
        match value {
            Value::Object(map) if LEGACY_MARKERS.iter().any(|k| map.contains_key(*k)) => {
                RawProperty::Legacy(map)
            }
            Value::Object(map) => RawProperty::Current(map),
            _ => RawProperty::Current(Map::new()),
        }
    }

    fn parts(&self) -> (&Map<String, Value>, &'static FieldNames) {
        match self {
            RawProperty::Legacy(map) => (map, &LEGACY_FIELDS),
            RawProperty::Current(map) => (map, &CURRENT_FIELDS),
        }
    }

    /// First candidate that is present and not null or blank.
    fn first(&self, pick: fn(&'static FieldNames) -> &'static [&'static str]) -> Option<&Value> {
        let (map, names) = self.parts();
        pick(names)
            .iter()
            .filter_map(|name| map.get(*name))
            .find(|v| !is_blank(v))
    }

    /// The id the producer wrote, if any.
    pub fn explicit_id(&self) -> Option<String> {
        self.first(|f| f.id).and_then(as_text)
    }

    /// Required form fields that are absent. Empty means the record may be saved.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.first(|f| f.title).and_then(as_text).is_none() {
            missing.push("title");
        }
        if self.first(|f| f.location).and_then(as_text).is_none() {
            missing.push("location");
        }
        missing
    }
}

/// Maps a raw record onto `PropertyRecord`. Total: every attribute has a default.
///
/// `now` stands in for missing timestamps, so the output depends only on the inputs.
pub fn normalize(raw: &RawProperty, table: &CategoryTable, now: DateTime<Utc>) -> PropertyRecord {
    let id = raw.explicit_id().unwrap_or_else(|| derived_id(raw));

    let property_type = raw.first(|f| f.property_type).and_then(as_text);

    // An explicit category wins when it is recognisable; otherwise the type decides.
    let category = raw
        .first(|f| f.category)
        .and_then(as_text)
        .and_then(|c| table.lookup(&c))
        .unwrap_or_else(|| table.resolve(property_type.as_deref()));

    let status = raw
        .first(|f| f.status)
        .and_then(as_text)
        .and_then(|s| PropertyStatus::parse(&s))
        .unwrap_or(PropertyStatus::Available);

    let created_at = raw
        .first(|f| f.created_at)
        .and_then(as_timestamp)
        .unwrap_or(now);

    let mut sold_at = raw.first(|f| f.sold_at).and_then(as_timestamp);
    if status == PropertyStatus::Sold && sold_at.is_none() {
        sold_at = Some(now);
    }

    PropertyRecord {
        id,
        title: raw
            .first(|f| f.title)
            .and_then(as_text)
            .unwrap_or_else(|| UNTITLED_PLACEHOLDER.to_string()),
        price_amount: raw
            .first(|f| f.price)
            .and_then(as_number)
            .filter(|p| *p > 0.0),
        location: raw
            .first(|f| f.location)
            .and_then(as_text)
            .unwrap_or_else(|| NO_LOCATION_PLACEHOLDER.to_string()),
        bedroom_count: raw.first(|f| f.bedrooms).map(as_count).unwrap_or(0),
        bathroom_count: raw.first(|f| f.bathrooms).map(as_count).unwrap_or(0),
        parking_count: raw.first(|f| f.parking).map(as_count).unwrap_or(0),
        area_square_meters: raw
            .first(|f| f.area)
            .and_then(as_number)
            .filter(|a| *a > 0.0),
        category,
        property_type,
        images: raw
            .first(|f| f.images)
            .map(|v| as_string_list(v, false))
            .unwrap_or_default(),
        description: raw.first(|f| f.description).and_then(as_text),
        features: raw
            .first(|f| f.features)
            .map(|v| as_string_list(v, true))
            .unwrap_or_default(),
        status,
        featured: raw.first(|f| f.featured).map(as_flag).unwrap_or(false),
        created_at,
        sold_at,
    }
}

/// Convenience for callers holding an unclassified JSON value.
pub fn normalize_value(value: Value, table: &CategoryTable, now: DateTime<Utc>) -> PropertyRecord {
    normalize(&RawProperty::classify(value), table, now)
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn as_count(v: &Value) -> u32 {
    match as_number(v) {
        Some(n) if n > 0.0 => n.floor().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

fn as_flag(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

/// Lists come either as arrays or as a single string (comma-separated when `split` is set).
/// Order is kept and duplicates dropped.
fn as_string_list(v: &Value, split: bool) -> Vec<String> {
    let items: Vec<String> = match v {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        Value::String(s) if split => s.split(',').map(|p| p.trim().to_string()).collect(),
        Value::String(s) => vec![s.trim().to_string()],
        _ => Vec::new(),
    };

    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn as_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            // SQLite CURRENT_TIMESTAMP and naive ISO strings are taken as UTC.
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc())
        }
        // Epoch milliseconds, as written by `Date.now()`.
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Stable id for records stored without one.
fn derived_id(raw: &RawProperty) -> String {
    let (map, _) = raw.parts();
    let body = serde_json::to_string(map).unwrap_or_default();
    let digest = Sha256::digest(body.as_bytes());
    format!("prop_{}", hex::encode(&digest[..8]))
}
