use crate::db::kv::KeyValueStore;
use crate::db::records::DASHBOARD_KEY;
use crate::errors::ServerError;
use crate::router::{handle, respond};
use crate::tests::utils::{body_json, body_string, get, header, json_request, session_token, test_app};
use http::Method;
use serde_json::json;

#[test]
fn empty_store_and_offline_remote_render_fallback() {
    let t = test_app();

    let resp = handle(get("/waterfront"), &t.app).unwrap();
    assert_eq!(resp.status(), 200);

    let body = body_string(resp);
    assert!(body.contains("data-source=\"fallback\""));
    assert!(body.contains("data-id=\"mock_waterfront_1\""));
    assert!(body.contains("Waterfront"));
}

#[test]
fn category_cache_wins_over_consolidated_store() {
    let t = test_app();
    t.app
        .db
        .write("launchProperties", r#"[{"id":"1","status":"available","title":"A"}]"#)
        .unwrap();
    t.app
        .db
        .write(DASHBOARD_KEY, r#"{"properties":[{"id":"2","title":"B","location":"X","category":"launch"}]}"#)
        .unwrap();

    let body = body_string(handle(get("/launch"), &t.app).unwrap());
    assert!(body.contains("data-source=\"category-cache\""));
    assert!(body.contains("data-id=\"1\""));
    assert!(!body.contains("data-id=\"2\""));
}

#[test]
fn consolidated_store_is_used_when_cache_is_empty() {
    let t = test_app();
    t.app
        .db
        .write(
            DASHBOARD_KEY,
            r#"{"properties":[
                {"id":"h1","title":"House","location":"Jardim","type":"casa","price":680000,
                 "features":["pool","garden","gym","sauna"]},
                {"id":"h2","title":"Sold house","location":"Jardim","type":"casa","status":"sold"}
            ]}"#,
        )
        .unwrap();

    let body = body_string(handle(get("/most-wanted"), &t.app).unwrap());
    assert!(body.contains("data-source=\"consolidated\""));
    assert!(body.contains("data-id=\"h1\""));
    assert!(!body.contains("data-id=\"h2\""));
    assert!(body.contains("$ 680,000"));
    assert!(!body.contains("sauna"));
}

#[test]
fn page_views_are_counted() {
    let t = test_app();
    handle(get("/launch"), &t.app).unwrap();
    handle(get("/move-in-ready"), &t.app).unwrap();

    let stats = body_json(handle(get("/stats"), &t.app).unwrap());
    assert_eq!(stats["performance"]["views"], 2);
}

#[test]
fn unknown_page_is_not_found() {
    let t = test_app();
    assert!(matches!(handle(get("/castles"), &t.app), Err(ServerError::NotFound)));

    let resp = respond(get("/castles"), &t.app);
    assert_eq!(resp.status(), 404);
    assert!(header(&resp, "Content-Type").unwrap().starts_with("text/html"));

    let resp = respond(get("/properties?category=castles"), &t.app);
    assert_eq!(resp.status(), 400);
    assert_eq!(header(&resp, "Content-Type"), Some("application/json"));
    assert_eq!(body_json(resp)["success"], false);
}

#[test]
fn home_links_every_category() {
    let t = test_app();
    let body = body_string(handle(get("/"), &t.app).unwrap());
    for slug in ["launch", "most-wanted", "waterfront", "move-in-ready"] {
        assert!(body.contains(&format!("href=\"/{slug}\"")));
    }
}

#[test]
fn deleting_the_last_listing_removes_it_from_the_page() {
    let t = test_app();
    let token = session_token(&t);

    let listing = json!({ "id": "gone", "title": "Short stay", "location": "Centro", "category": "launch" });
    let resp = handle(json_request(Method::POST, "/properties", &listing, Some(&token)), &t.app).unwrap();
    assert_eq!(resp.status(), 201);
    let body = body_string(handle(get("/launch"), &t.app).unwrap());
    assert!(body.contains("data-id=\"gone\""));

    let resp = handle(json_request(Method::DELETE, "/properties/gone", &json!({}), Some(&token)), &t.app).unwrap();
    assert_eq!(resp.status(), 200);

    let body = body_string(handle(get("/launch"), &t.app).unwrap());
    assert!(!body.contains("data-id=\"gone\""));
    assert!(body.contains("data-source=\"fallback\""));
    assert_eq!(t.app.db.read("launchProperties").unwrap().as_deref(), Some("[]"));
}

#[test]
fn category_page_filters_resolved_listings() {
    let t = test_app();
    t.app
        .db
        .write(
            "launchProperties",
            r#"[
                {"id":"small","title":"Studio","location":"Centro","bedrooms":1,"status":"available"},
                {"id":"family","title":"Family flat","location":"Jardim","bedrooms":3,"status":"available"}
            ]"#,
        )
        .unwrap();

    let body = body_string(handle(get("/launch?minBedrooms=2"), &t.app).unwrap());
    assert!(body.contains("data-id=\"family\""));
    assert!(!body.contains("data-id=\"small\""));
    assert!(body.contains("name=\"minBedrooms\""));

    let body = body_string(handle(get("/launch?location=praia"), &t.app).unwrap());
    assert!(body.contains("No properties match these filters."));
    assert!(body.contains("data-source=\"category-cache\""));

    let resp = respond(get("/launch?minPrice=abc"), &t.app);
    assert_eq!(resp.status(), 400);
    assert!(header(&resp, "Content-Type").unwrap().starts_with("text/html"));
}
