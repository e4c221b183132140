use crate::templates::desktop_layout;
use maud::{html, Markup};

pub fn login_page(error: Option<&str>, enabled: bool) -> Markup {
    desktop_layout(
        "Sign in",
        false,
        html! {
            main class="container narrow" {
                h1 { "Operator sign in" }

                @if !enabled {
                    p class="notice" { "Sign-in is disabled on this server." }
                } @else {
                    @if let Some(msg) = error {
                        p class="error" role="alert" { (msg) }
                    }
                    form action="/auth/login" method="post" class="login-form" {
                        label for="username" { "Username" }
                        input type="text" id="username" name="username" autocomplete="username" required;
                        label for="senha" { "Password" }
                        input type="password" id="senha" name="senha" autocomplete="current-password" required;
                        button type="submit" { "Sign in" }
                    }
                }
            }
        },
    )
}
