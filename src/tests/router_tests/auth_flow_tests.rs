use crate::errors::ServerError;
use crate::router::handle;
use crate::tests::utils::{
    body_json, body_string, form_request, get, header, json_request, test_app, test_app_with, PASSWORD,
};
use astra::Body;
use http::{Method, Request};
use serde_json::json;

#[test]
fn login_page_loads_successfully() {
    let t = test_app();

    let resp = handle(get("/login"), &t.app).expect("Failed to handle request");
    assert_eq!(resp.status(), 200);

    let body = body_string(resp);
    assert!(body.contains("Operator sign in"));
    assert!(body.contains("name=\"senha\""));
}

#[test]
fn login_page_says_when_login_is_disabled() {
    let t = test_app_with(None);
    let body = body_string(handle(get("/login"), &t.app).unwrap());
    assert!(body.contains("disabled"));
    assert!(!body.contains("<form action=\"/auth/login\""));
}

#[test]
fn form_login_sets_cookie_and_opens_dashboard() {
    let t = test_app();

    let req = form_request("/auth/login", &format!("username=broker&senha={PASSWORD}"), None);
    let resp = handle(req, &t.app).expect("login should succeed");
    assert_eq!(resp.status(), 303);
    assert_eq!(header(&resp, "Location"), Some("/admin"));

    let cookie = header(&resp, "Set-Cookie").unwrap().to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
    let token = cookie["session=".len()..].split(';').next().unwrap().to_string();

    let req = Request::builder()
        .method(Method::GET)
        .uri("/admin")
        .header("Cookie", format!("session={token}"))
        .body(Body::empty())
        .unwrap();
    let resp = handle(req, &t.app).unwrap();
    assert_eq!(resp.status(), 200);
    assert!(body_string(resp).contains("Signed in as"));
}

#[test]
fn bad_form_login_redirects_back_with_error() {
    let t = test_app();

    let req = form_request("/auth/login", "username=broker&senha=wrong", None);
    let resp = handle(req, &t.app).unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(header(&resp, "Location"), Some("/login?error=1"));

    let body = body_string(handle(get("/login?error=1"), &t.app).unwrap());
    assert!(body.contains("Invalid username or password."));
}

#[test]
fn json_login_returns_session() {
    let t = test_app();

    let req = json_request(
        Method::POST,
        "/auth/login",
        &json!({ "username": "broker", "senha": PASSWORD }),
        None,
    );
    let resp = handle(req, &t.app).unwrap();
    assert_eq!(resp.status(), 200);
    let body = body_json(resp);
    assert_eq!(body["success"], true);
    assert!(body["session"].as_str().unwrap().len() >= 40);

    let req = json_request(
        Method::POST,
        "/auth/login",
        &json!({ "username": "broker", "senha": "nope" }),
        None,
    );
    assert!(matches!(handle(req, &t.app), Err(ServerError::Unauthorized(_))));
}

#[test]
fn admin_without_session_redirects_to_login() {
    let t = test_app();
    let resp = handle(get("/admin"), &t.app).unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(header(&resp, "Location"), Some("/login"));
}

#[test]
fn logout_revokes_session() {
    let t = test_app();
    let token = crate::tests::utils::session_token(&t);

    let resp = handle(form_request("/logout", "", Some(&token)), &t.app).unwrap();
    assert_eq!(resp.status(), 303);
    assert!(header(&resp, "Set-Cookie").unwrap().contains("Max-Age=0"));

    let req = json_request(Method::POST, "/admin/sync", &json!({}), Some(&token));
    assert!(matches!(handle(req, &t.app), Err(ServerError::Unauthorized(_))));
}
