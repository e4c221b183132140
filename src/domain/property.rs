// src/domain/property.rs

use crate::domain::category::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNTITLED_PLACEHOLDER: &str = "Untitled property";
pub const NO_LOCATION_PLACEHOLDER: &str = "Location not provided";

/// Card descriptions are cut at this many characters.
pub const CARD_DESCRIPTION_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyStatus {
    Available,
    Sold,
    Reserved,
    UnderConstruction,
}

impl PropertyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyStatus::Available => "available",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Reserved => "reserved",
            PropertyStatus::UnderConstruction => "under-construction",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PropertyStatus::Available => "Available",
            PropertyStatus::Sold => "Sold",
            PropertyStatus::Reserved => "Reserved",
            PropertyStatus::UnderConstruction => "Under construction",
        }
    }

    /// Accepts current and legacy spellings. Anything else is `None`.
    pub fn parse(raw: &str) -> Option<PropertyStatus> {
        match raw.trim().to_lowercase().replace('_', "-").as_str() {
            "available" | "disponivel" | "disponível" => Some(PropertyStatus::Available),
            "sold" | "vendido" => Some(PropertyStatus::Sold),
            "reserved" | "reservado" => Some(PropertyStatus::Reserved),
            "under-construction" | "em-construcao" | "em-construção" | "construcao" => {
                Some(PropertyStatus::UnderConstruction)
            }
            _ => None,
        }
    }
}

/// A listing in its one normalized shape. Every producer's output goes
/// through `normalize` before it becomes one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub id: String,
    pub title: String,
    pub price_amount: Option<f64>,
    pub location: String,
    pub bedroom_count: u32,
    pub bathroom_count: u32,
    pub parking_count: u32,
    pub area_square_meters: Option<f64>,
    pub category: Category,
    pub property_type: Option<String>,
    pub images: Vec<String>,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub status: PropertyStatus,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub sold_at: Option<DateTime<Utc>>,
}

impl PropertyRecord {
    pub fn is_available(&self) -> bool {
        self.status == PropertyStatus::Available
    }

    /// Applies a status change. Moving into `Sold` stamps `sold_at` once;
    /// later transitions never touch an existing stamp.
    pub fn set_status(&mut self, status: PropertyStatus, now: DateTime<Utc>) {
        if status == PropertyStatus::Sold && self.sold_at.is_none() {
            self.sold_at = Some(now);
        }
        self.status = status;
    }

    pub fn short_description(&self) -> Option<String> {
        let desc = self.description.as_deref()?;
        if desc.chars().count() > CARD_DESCRIPTION_CHARS {
            let cut: String = desc.chars().take(CARD_DESCRIPTION_CHARS).collect();
            Some(format!("{cut}..."))
        } else {
            Some(desc.to_string())
        }
    }
}

/// Newest first. Stable, so equal timestamps keep their stored order.
pub fn sort_by_recency(records: &mut [PropertyRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
pub(crate) fn sample_record(id: &str, category: Category) -> PropertyRecord {
    use chrono::TimeZone;

    PropertyRecord {
        id: id.to_string(),
        title: format!("Property {id}"),
        price_amount: Some(450_000.0),
        location: "Centro".to_string(),
        bedroom_count: 2,
        bathroom_count: 1,
        parking_count: 1,
        area_square_meters: Some(70.0),
        category,
        property_type: None,
        images: Vec::new(),
        description: None,
        features: Vec::new(),
        status: PropertyStatus::Available,
        featured: false,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        sold_at: None,
    }
}
