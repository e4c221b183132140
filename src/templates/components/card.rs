use crate::domain::property::PropertyRecord;
use maud::{html, Markup};

pub const PRICE_ON_REQUEST: &str = "Price on request";
pub const PLACEHOLDER_IMAGE: &str = "/static/img/property-placeholder.svg";
const MAX_CARD_FEATURES: usize = 3;

/// "$ 1,250,000" style; whole units only.
pub fn format_price(amount: f64) -> String {
    let units = amount.round() as u64;
    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("$ {grouped}")
}

pub fn property_card(p: &PropertyRecord) -> Markup {
    let image = p.images.first().map(String::as_str).unwrap_or(PLACEHOLDER_IMAGE);

    html! {
        article class="card property-card" data-id=(p.id) data-category=(p.category.slug()) {
            div class="property-image" {
                img src=(image) alt=(p.title) loading="lazy";
                @if p.featured {
                    span class="badge featured" { "Featured" }
                }
                span class=(format!("badge status-{}", p.status.as_str())) { (p.status.label()) }
            }
            div class="card-body" {
                h3 { (p.title) }
                p class="location" { (p.location) }
                ul class="counts" {
                    li { (p.bedroom_count) " bd" }
                    li { (p.bathroom_count) " ba" }
                    li { (p.parking_count) " pk" }
                    @if let Some(area) = p.area_square_meters {
                        li { (format!("{area:.0}")) " m²" }
                    }
                }
                @if let Some(desc) = p.short_description() {
                    p class="description" { (desc) }
                }
                @if !p.features.is_empty() {
                    ul class="features" {
                        @for tag in p.features.iter().take(MAX_CARD_FEATURES) {
                            li class="tag" { (tag) }
                        }
                    }
                }
                p class="price" {
                    @match p.price_amount {
                        Some(amount) => (format_price(amount)),
                        None => (PRICE_ON_REQUEST),
                    }
                }
            }
        }
    }
}

/// Cards in the order given. Callers sort.
pub fn property_grid(records: &[PropertyRecord]) -> Markup {
    html! {
        div class="property-grid" {
            @for p in records {
                (property_card(p))
            }
        }
    }
}
