use crate::domain::category::Category;
use crate::domain::filter::ListingFilter;
use crate::domain::property::PropertyRecord;
use crate::resolver::ResolvedFrom;
use crate::templates::{error_panel, property_grid, desktop_layout};
use maud::{html, Markup};

pub struct CategoryVm<'a> {
    pub category: Category,
    pub source: ResolvedFrom,
    pub records: &'a [PropertyRecord],
    /// Count before the visitor's filter was applied.
    pub resolved: usize,
    pub filter: &'a ListingFilter,
    pub is_operator: bool,
}

pub fn category_page(vm: &CategoryVm) -> Markup {
    desktop_layout(
        vm.category.display_name(),
        vm.is_operator,
        html! {
            main class="container" data-source=(source_name(vm.source)) {
                h1 { (vm.category.display_name()) }

                (filter_form(vm.category, vm.filter))

                @if vm.records.is_empty() && vm.resolved > 0 {
                    section class="card empty-state" {
                        p { "No properties match these filters." }
                        a href=(format!("/{}", vm.category.slug())) { "Clear filters" }
                    }
                } @else if vm.records.is_empty() {
                    section class="card empty-state" {
                        p { "No properties available in this category right now." }
                    }
                } @else {
                    p class="result-count" { (vm.records.len()) " listing(s)" }
                    (property_grid(vm.records))
                }
            }
        },
    )
}

fn filter_form(category: Category, filter: &ListingFilter) -> Markup {
    let text = |v: Option<String>| v.unwrap_or_default();
    html! {
        form class="filters" action=(format!("/{}", category.slug())) method="get"
            style="display: flex; flex-wrap: wrap; gap: 8px; margin-bottom: 1.5rem;" {
            input type="text" name="type" placeholder="Type" value=(filter.property_types.join(","));
            input type="number" name="minPrice" placeholder="Min price" min="0" step="any"
                value=(text(filter.min_price.map(|p| p.to_string())));
            input type="number" name="maxPrice" placeholder="Max price" min="0" step="any"
                value=(text(filter.max_price.map(|p| p.to_string())));
            input type="number" name="minBedrooms" placeholder="Bedrooms" min="0"
                value=(text(filter.min_bedrooms.map(|n| n.to_string())));
            input type="number" name="minBathrooms" placeholder="Bathrooms" min="0"
                value=(text(filter.min_bathrooms.map(|n| n.to_string())));
            input type="number" name="minParking" placeholder="Parking" min="0"
                value=(text(filter.min_parking.map(|n| n.to_string())));
            input type="text" name="location" placeholder="Neighborhood"
                value=(text(filter.location.clone()));
            button type="submit" { "Filter" }
        }
    }
}

/// Shown when the page itself could not be built.
pub fn category_error_page(category: Category) -> Markup {
    desktop_layout(
        category.display_name(),
        false,
        html! {
            main class="container" {
                h1 { (category.display_name()) }
                (error_panel("Something went wrong", "We could not load these properties. Please try again later."))
            }
        },
    )
}

fn source_name(source: ResolvedFrom) -> &'static str {
    match source {
        ResolvedFrom::CategoryCache => "category-cache",
        ResolvedFrom::Consolidated => "consolidated",
        ResolvedFrom::Remote => "remote",
        ResolvedFrom::Fallback => "fallback",
    }
}
