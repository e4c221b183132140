use crate::domain::category::Category;
use maud::{html, Markup, DOCTYPE};

pub fn desktop_layout(title: &str, is_operator: bool, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " | Property Board" }
                link rel="stylesheet" href="/static/main.css";
            }
            body {
                header class="flex items-center justify-between px-6 py-3 shadow" {
                    a href="/" class="brand" { "Property Board" }
                    nav {
                        ul {
                            @for category in Category::ALL {
                                li { a href=(format!("/{}", category.slug())) { (category.display_name()) } }
                            }
                            @if is_operator {
                                li { a href="/admin" { "Dashboard" } }
                            }
                        }
                    }

                    @if is_operator {
                        form action="/logout" method="post" class="inline" {
                            button type="submit" class="link" { "Sign out" }
                        }
                    } @else {
                        a href="/login" class="text-base font-medium hover:text-blue-600" { "Login" }
                    }
                }
                (content)
            }
        }
    }
}
