// src/domain/dashboard.rs

use crate::domain::category::CategoryTable;
use crate::domain::normalize::{normalize, normalize_value, RawProperty};
use crate::domain::property::{PropertyRecord, PropertyStatus};
use crate::errors::ServerError;
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub property_id: String,
    pub value: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub commission: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client_name: String,
    pub sale_date: DateTime<Utc>,
    #[serde(rename = "type", default = "default_sale_kind")]
    pub kind: String,
}

fn default_sale_kind() -> String {
    "sale".to_string()
}

/// Older dashboards store `null` for blank form fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decodes a stored list one entry at a time so a single bad entry costs
/// only itself.
fn decode_entries<T: DeserializeOwned>(section: &'static str, value: Value) -> Vec<T> {
    let Value::Array(items) = value else {
        tracing::warn!(section, "stored section is not a list, starting empty");
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(section, error = %e, "skipping unreadable entry");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub property_id: String,
    pub value: f64,
    #[serde(default)]
    pub commission: Option<f64>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub contact: String,
    #[serde(default)]
    pub interest: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_lead_status")]
    pub status: String,
}

fn default_lead_status() -> String {
    "new".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeadRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub interest: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// The consolidated store: every property regardless of category, plus the
/// operator's sales, leads and counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub properties: Vec<PropertyRecord>,
    pub sales: Vec<Sale>,
    pub leads: Vec<Lead>,
    pub views: u64,
    pub revenue: f64,
    pub expenses: f64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyCounts {
    pub total: usize,
    pub available: usize,
    pub sold: usize,
    pub featured: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodCounts {
    pub total: usize,
    pub this_month: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub total: f64,
    pub this_month: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub views: u64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub properties: PropertyCounts,
    pub sales: PeriodCounts,
    pub revenue: RevenueSummary,
    pub leads: PeriodCounts,
    pub performance: Performance,
}

/// Short, time-ordered id for dashboard entities.
pub fn new_id(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x0100_0000);
    format!("{:x}{:06x}", now.timestamp_millis(), suffix)
}

fn same_month(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

impl DashboardData {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            properties: Vec::new(),
            sales: Vec::new(),
            leads: Vec::new(),
            views: 0,
            revenue: 0.0,
            expenses: 0.0,
            created_at: now,
            last_updated: now,
        }
    }

    /// Reads a stored document. Accepts the full dashboard object or a bare
    /// property array; unreadable sections fall back to empty.
    pub fn from_value(value: Value, table: &CategoryTable, now: DateTime<Utc>) -> Self {
        let mut data = Self::empty(now);

        let mut obj = match value {
            Value::Array(items) => {
                data.properties = items
                    .into_iter()
                    .map(|v| normalize_value(v, table, now))
                    .collect();
                return data;
            }
            Value::Object(obj) => obj,
            _ => return data,
        };

        if let Some(Value::Array(items)) = obj.remove("properties") {
            data.properties = items
                .into_iter()
                .map(|v| normalize_value(v, table, now))
                .collect();
        }
        if let Some(v) = obj.remove("sales") {
            data.sales = decode_entries("sales", v);
        }
        if let Some(v) = obj.remove("leads") {
            data.leads = decode_entries("leads", v);
        }
        data.views = obj.get("views").and_then(Value::as_u64).unwrap_or(0);
        data.revenue = obj.get("revenue").and_then(Value::as_f64).unwrap_or(0.0);
        data.expenses = obj.get("expenses").and_then(Value::as_f64).unwrap_or(0.0);
        if let Some(ts) = obj
            .get("createdAt")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
        {
            data.created_at = ts;
        }
        if let Some(ts) = obj
            .get("lastUpdated")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
        {
            data.last_updated = ts;
        }
        data
    }

    pub fn find(&self, id: &str) -> Option<&PropertyRecord> {
        self.properties.iter().find(|p| p.id == id)
    }

    /// Create or edit, keyed by id. Edits keep `createdAt` and route the
    /// status through `set_status` so an existing `soldAt` survives.
    pub fn upsert_property(
        &mut self,
        raw: RawProperty,
        table: &CategoryTable,
        now: DateTime<Utc>,
    ) -> Result<PropertyRecord, ServerError> {
        let missing = raw.missing_required_fields();
        if !missing.is_empty() {
            return Err(ServerError::BadRequest(format!(
                "missing field: {}",
                missing.join(", ")
            )));
        }

        let explicit_id = raw.explicit_id();
        let mut record = normalize(&raw, table, now);

        let existing = explicit_id
            .as_deref()
            .and_then(|id| self.properties.iter().position(|p| p.id == id));

        match existing {
            Some(idx) => {
                let previous = &self.properties[idx];
                let requested = record.status;
                let requested_sold_at = record.sold_at;

                record.created_at = previous.created_at;
                record.status = previous.status;
                record.sold_at = previous.sold_at;
                if requested == PropertyStatus::Sold && record.sold_at.is_none() {
                    record.sold_at = requested_sold_at;
                }
                record.set_status(requested, now);

                self.properties[idx] = record.clone();
            }
            None => {
                if explicit_id.is_none() {
                    record.id = new_id(now);
                }
                self.properties.push(record.clone());
            }
        }

        Ok(record)
    }

    /// Removes a property outright. Returns whether anything was removed.
    pub fn delete_property(&mut self, id: &str) -> bool {
        let before = self.properties.len();
        self.properties.retain(|p| p.id != id);
        self.properties.len() != before
    }

    pub fn record_sale(&mut self, req: SaleRequest, now: DateTime<Utc>) -> Result<Sale, ServerError> {
        if !req.value.is_finite() || req.value < 0.0 {
            return Err(ServerError::BadRequest("sale value must be positive".into()));
        }
        let property = self
            .properties
            .iter_mut()
            .find(|p| p.id == req.property_id)
            .ok_or(ServerError::NotFound)?;

        property.set_status(PropertyStatus::Sold, now);

        let sale = Sale {
            id: new_id(now),
            property_id: req.property_id,
            value: req.value,
            commission: req.commission.filter(|c| c.is_finite()).unwrap_or(0.0),
            client_name: req.client_name.unwrap_or_default(),
            sale_date: now,
            kind: req.kind.unwrap_or_else(default_sale_kind),
        };

        self.revenue += sale.commission;
        self.sales.push(sale.clone());
        Ok(sale)
    }

    pub fn add_lead(&mut self, req: LeadRequest, now: DateTime<Utc>) -> Result<Lead, ServerError> {
        let name = req.name.trim();
        let contact = req.contact.trim();
        if name.is_empty() {
            return Err(ServerError::BadRequest("missing field: name".into()));
        }
        if contact.is_empty() {
            return Err(ServerError::BadRequest("missing field: contact".into()));
        }

        let lead = Lead {
            id: new_id(now),
            name: name.to_string(),
            contact: contact.to_string(),
            interest: req.interest.filter(|s| !s.trim().is_empty()),
            source: req.source.filter(|s| !s.trim().is_empty()),
            created_at: now,
            status: default_lead_status(),
        };
        self.leads.push(lead.clone());
        Ok(lead)
    }

    pub fn increment_views(&mut self) {
        self.views += 1;
    }

    pub fn add_expense(&mut self, amount: f64) -> Result<(), ServerError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ServerError::BadRequest("expense must be positive".into()));
        }
        self.expenses += amount;
        Ok(())
    }

    pub fn statistics(&self, now: DateTime<Utc>) -> DashboardStats {
        let properties = PropertyCounts {
            total: self.properties.len(),
            available: self.properties.iter().filter(|p| p.is_available()).count(),
            sold: self
                .properties
                .iter()
                .filter(|p| p.status == PropertyStatus::Sold)
                .count(),
            featured: self.properties.iter().filter(|p| p.featured).count(),
        };

        let month_sales: Vec<&Sale> = self
            .sales
            .iter()
            .filter(|s| same_month(s.sale_date, now))
            .collect();

        let leads = PeriodCounts {
            total: self.leads.len(),
            this_month: self
                .leads
                .iter()
                .filter(|l| same_month(l.created_at, now))
                .count(),
        };

        let conversion_rate = if leads.total > 0 {
            let rate = self.sales.len() as f64 / leads.total as f64 * 100.0;
            (rate * 10.0).round() / 10.0
        } else {
            0.0
        };

        DashboardStats {
            properties,
            sales: PeriodCounts {
                total: self.sales.len(),
                this_month: month_sales.len(),
            },
            revenue: RevenueSummary {
                total: self.revenue,
                this_month: month_sales.iter().map(|s| s.commission).sum(),
                profit: self.revenue - self.expenses,
            },
            leads,
            performance: Performance {
                views: self.views,
                conversion_rate,
            },
        }
    }

    /// Demo seeding. Samples already present (by id) are left alone.
    /// Returns how many were added.
    pub fn seed_sample_properties(&mut self, table: &CategoryTable, now: DateTime<Utc>) -> usize {
        let mut added = 0;
        for sample in sample_properties() {
            let raw = RawProperty::classify(sample);
            if let Some(id) = raw.explicit_id() {
                if self.find(&id).is_some() {
                    continue;
                }
            }
            if self.upsert_property(raw, table, now).is_ok() {
                added += 1;
            }
        }
        added
    }
}

fn sample_properties() -> Vec<Value> {
    vec![
        json!({
            "id": "sample_launch_1",
            "title": "Paradise Bay Residences",
            "price": 750000,
            "location": "Jatiuca",
            "category": "launch",
            "type": "apartment",
            "area": 85,
            "bedrooms": 3,
            "bathrooms": 2,
            "parking": 1,
            "description": "New development with a partial sea view, three bedrooms and a gourmet balcony.",
            "features": ["Partial sea view", "Gourmet balcony", "Pool", "Gym"]
        }),
        json!({
            "id": "sample_most_wanted_1",
            "title": "Duplex House in Gated Community",
            "price": 680000,
            "location": "Mangabeiras",
            "category": "most-wanted",
            "type": "house",
            "area": 180,
            "bedrooms": 4,
            "bathrooms": 3,
            "parking": 2,
            "description": "Duplex house inside a gated community with a full leisure area.",
            "features": ["Gated community", "Backyard", "24h security"]
        }),
        json!({
            "id": "sample_waterfront_1",
            "title": "Oceanfront Apartment",
            "price": 1200000,
            "location": "Ponta Verde",
            "category": "waterfront",
            "type": "apartment",
            "area": 140,
            "bedrooms": 4,
            "bathrooms": 4,
            "parking": 2,
            "description": "Front-row apartment on the beach road with a wraparound balcony.",
            "features": ["Sea view", "Wraparound balcony", "Two parking spaces"]
        }),
        json!({
            "id": "sample_move_in_ready_1",
            "title": "Renovated Apartment near the Lighthouse",
            "price": 420000,
            "location": "Farol",
            "category": "move-in-ready",
            "type": "apartment",
            "area": 70,
            "bedrooms": 2,
            "bathrooms": 2,
            "parking": 1,
            "description": "Fully renovated with built-in furniture, ready to move in.",
            "features": ["Renovated", "Built-in furniture", "Air conditioning"]
        }),
    ]
}
