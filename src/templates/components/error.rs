use maud::{html, Markup};

/// Generic failure box shown in place of content.
pub fn error_panel(title: &str, message: &str) -> Markup {
    html! {
        section class="card error-panel" role="alert" {
            h2 { (title) }
            p { (message) }
            p { a href="/" { "← Back to home" } }
        }
    }
}
