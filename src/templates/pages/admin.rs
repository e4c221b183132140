use crate::domain::category::Category;
use crate::domain::dashboard::{DashboardStats, Lead};
use crate::domain::property::PropertyRecord;
use crate::sync::SyncStats;
use crate::templates::components::format_price;
use crate::templates::desktop_layout;
use maud::{html, Markup};

pub struct AdminVm<'a> {
    pub operator: &'a str,
    pub stats: &'a DashboardStats,
    pub sync: &'a SyncStats,
    pub properties: &'a [PropertyRecord],
    pub leads: &'a [Lead],
    pub notice: Option<&'a str>,
}

const TH: &str = "padding: 12px 8px; border-bottom: 2px solid #e5e7eb; text-align: left;";
const TD: &str = "padding: 8px; border-bottom: 1px solid #f3f4f6;";

pub fn admin_page(vm: &AdminVm) -> Markup {
    desktop_layout(
        "Dashboard",
        true,
        html! {
            main class="container" {
                h1 { "Dashboard" }
                p { "Signed in as " strong { (vm.operator) } }

                @if let Some(notice) = vm.notice {
                    p class="notice" role="status" { (notice) }
                }

                (stats_card(vm.stats))
                (sync_card(vm.sync))
                (new_property_card())
                (properties_card(vm.properties))
                (leads_card(vm.leads))
            }
        },
    )
}

fn stats_card(stats: &DashboardStats) -> Markup {
    html! {
        section class="card stats" style="margin-bottom: 2rem;" {
            h3 { "Overview" }
            ul class="stat-list" {
                li { "Properties: " strong { (stats.properties.total) } " (" (stats.properties.available) " available, " (stats.properties.sold) " sold)" }
                li { "Sales: " strong { (stats.sales.total) } " (" (stats.sales.this_month) " this month)" }
                li { "Revenue: " strong { (format_price(stats.revenue.total)) } " / profit " (format_price(stats.revenue.profit.max(0.0))) }
                li { "Leads: " strong { (stats.leads.total) } " (" (stats.leads.this_month) " this month)" }
                li { "Views: " strong { (stats.performance.views) } }
                li {
                    form action="/admin/expenses" method="post" style="display: flex; gap: 4px; margin: 0;" {
                        input type="number" name="amount" placeholder="Expense" min="0" step="any" required style="width: 110px;";
                        button type="submit" { "Record expense" }
                    }
                }
                li { "Conversion: " strong { (format!("{:.1}%", stats.performance.conversion_rate)) } }
            }
        }
    }
}

fn sync_card(sync: &SyncStats) -> Markup {
    html! {
        section class="card" style="margin-bottom: 2rem;" {
            h3 { "Page caches" }
            p {
                (sync.dashboard_total) " in dashboard, " (sync.cached_total) " cached "
                @if sync.in_sync {
                    span style="color: green;" { "(in sync)" }
                } @else {
                    span style="color: #dc2626;" { "(out of sync)" }
                }
            }
            div style="display: flex; gap: 10px;" {
                form action="/admin/sync" method="post" {
                    button type="submit" { "Sync now" }
                }
                form action="/admin/seed" method="post" {
                    button type="submit" { "Add sample properties" }
                }
                form action="/admin/clear-caches" method="post" {
                    button type="submit" { "Clear caches" }
                }
            }
        }
    }
}

fn new_property_card() -> Markup {
    html! {
        section class="card" style="margin-bottom: 2rem;" {
            h3 { "Add property" }
            form action="/properties" method="post" style="display: grid; gap: 8px; max-width: 480px;" {
                input type="text" name="title" placeholder="Title" required;
                input type="text" name="location" placeholder="Location" required;
                input type="number" name="price" placeholder="Price" min="0" step="any";
                select name="category" {
                    @for category in Category::ALL {
                        option value=(category.slug()) { (category.display_name()) }
                    }
                }
                div style="display: flex; gap: 8px;" {
                    input type="number" name="bedrooms" placeholder="Bedrooms" min="0";
                    input type="number" name="bathrooms" placeholder="Bathrooms" min="0";
                    input type="number" name="parking" placeholder="Parking" min="0";
                    input type="number" name="area" placeholder="Area m²" min="0" step="any";
                }
                textarea name="description" placeholder="Description" {}
                input type="text" name="features" placeholder="Features, comma separated";
                label { input type="checkbox" name="featured" value="true"; " Featured" }
                button type="submit" { "Save" }
            }
        }
    }
}

fn properties_card(properties: &[PropertyRecord]) -> Markup {
    html! {
        section class="card" style="margin-bottom: 2rem;" {
            h3 { "Properties" }
            @if properties.is_empty() {
                p { "No properties yet." }
            } @else {
                div style="overflow-x: auto;" {
                    table style="width: 100%; border-collapse: collapse; margin-top: 1rem;" {
                        thead {
                            tr {
                                th style=(TH) { "Title" }
                                th style=(TH) { "Category" }
                                th style=(TH) { "Status" }
                                th style=(TH) { "Price" }
                                th style=(TH) { "Actions" }
                            }
                        }
                        tbody {
                            @for p in properties {
                                tr data-id=(p.id) {
                                    td style=(TD) { (p.title) br; span style="font-size: 0.8em; color: #666;" { (p.location) } }
                                    td style=(TD) { (p.category.display_name()) }
                                    td style=(TD) { (p.status.label()) }
                                    td style=(TD) {
                                        @match p.price_amount {
                                            Some(amount) => (format_price(amount)),
                                            None => "-",
                                        }
                                    }
                                    td style=(TD) {
                                        @if p.is_available() {
                                            form action="/sales" method="post" style="display: flex; gap: 4px; margin: 0 0 4px 0;" {
                                                input type="hidden" name="propertyId" value=(p.id);
                                                input type="number" name="value" placeholder="Sale value" min="0" step="any" required style="width: 110px;";
                                                input type="number" name="commission" placeholder="Commission" min="0" step="any" style="width: 110px;";
                                                button type="submit" { "Sell" }
                                            }
                                        }
                                        form action=(format!("/admin/properties/{}/delete", p.id)) method="post" style="margin: 0;" {
                                            button type="submit" style="color: #dc2626;" { "Delete" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn leads_card(leads: &[Lead]) -> Markup {
    html! {
        section class="card" {
            h3 { "Recent leads" }
            @if leads.is_empty() {
                p { "No leads yet." }
            } @else {
                ul {
                    @for lead in leads.iter().rev().take(10) {
                        li {
                            strong { (lead.name) } " - " (lead.contact)
                            @if let Some(interest) = &lead.interest {
                                " (" (interest) ")"
                            }
                            " " span style="font-size: 0.8em; color: #666;" { (lead.created_at.format("%Y-%m-%d").to_string()) }
                        }
                    }
                }
            }
        }
    }
}
