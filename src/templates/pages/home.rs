// templates/pages/home.rs

use crate::domain::category::Category;
use crate::templates::desktop_layout;
use maud::{html, Markup};

pub fn home_page(is_operator: bool) -> Markup {
    desktop_layout(
        "Home",
        is_operator,
        html! {
            main class="container" {
                h1 { "Find your next property" }
                p class="lead" { "Browse current listings by category." }

                div class="category-links" {
                    @for category in Category::ALL {
                        a class="card category-link" href=(format!("/{}", category.slug())) {
                            h2 { (category.display_name()) }
                        }
                    }
                }
            }
        },
    )
}
