// src/domain/filter.rs
//
// Visitor-facing narrowing of a listing set: type, price range, minimum room
// counts and neighbourhood.

use crate::domain::property::PropertyRecord;
use crate::errors::ServerError;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    /// Lowercased; a record matches any of them.
    pub property_types: Vec<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_bedrooms: Option<u32>,
    pub min_bathrooms: Option<u32>,
    pub min_parking: Option<u32>,
    /// Case-insensitive substring of the record's location.
    pub location: Option<String>,
}

fn number<T: FromStr>(params: &HashMap<String, String>, name: &str) -> Result<Option<T>, ServerError> {
    match params.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ServerError::BadRequest(format!("invalid {name}: {raw}"))),
        None => Ok(None),
    }
}

impl ListingFilter {
    /// Reads `type`, `minPrice`, `maxPrice`, `minBedrooms`, `minBathrooms`,
    /// `minParking` and `location` from a query string. Blank values are
    /// ignored; values that do not parse are a bad request.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ServerError> {
        let property_types = params
            .get("type")
            .map(|v| {
                v.split(',')
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let filter = Self {
            property_types,
            min_price: number(params, "minPrice")?,
            max_price: number(params, "maxPrice")?,
            min_bedrooms: number(params, "minBedrooms")?,
            min_bathrooms: number(params, "minBathrooms")?,
            min_parking: number(params, "minParking")?,
            location: params
                .get("location")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        };

        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(ServerError::BadRequest(format!(
                    "minPrice {min} is above maxPrice {max}"
                )));
            }
        }
        Ok(filter)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// A price bound excludes records with no price.
    pub fn matches(&self, record: &PropertyRecord) -> bool {
        if !self.property_types.is_empty() {
            let kind = record.property_type.as_deref().unwrap_or_default().to_lowercase();
            if !self.property_types.iter().any(|t| *t == kind) {
                return false;
            }
        }

        if self.min_price.is_some() || self.max_price.is_some() {
            let Some(price) = record.price_amount else {
                return false;
            };
            if self.min_price.is_some_and(|min| price < min) || self.max_price.is_some_and(|max| price > max) {
                return false;
            }
        }

        let at_least = |bound: Option<u32>, count: u32| bound.map_or(true, |min| count >= min);
        if !at_least(self.min_bedrooms, record.bedroom_count)
            || !at_least(self.min_bathrooms, record.bathroom_count)
            || !at_least(self.min_parking, record.parking_count)
        {
            return false;
        }

        match &self.location {
            Some(needle) => record.location.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }

    pub fn apply(&self, records: &mut Vec<PropertyRecord>) {
        if !self.is_empty() {
            records.retain(|r| self.matches(r));
        }
    }
}
