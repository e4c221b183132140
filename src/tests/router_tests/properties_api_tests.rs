use crate::db::kv::KeyValueStore;
use crate::db::records::DASHBOARD_KEY;
use crate::errors::ServerError;
use crate::router::handle;
use crate::tests::utils::{body_json, get, json_request, session_token, test_app};
use http::Method;
use serde_json::json;

const DASHBOARD: &str = r#"{"properties":[
    {"id":"old","title":"Old flat","location":"Centro","category":"launch","createdAt":"2023-01-01T00:00:00Z"},
    {"id":"new","title":"New flat","location":"Centro","category":"launch","createdAt":"2024-01-01T00:00:00Z"},
    {"id":"gone","title":"Sold house","location":"Jardim","category":"most-wanted","status":"sold","soldAt":"2024-02-01T00:00:00Z"},
    {"id":"lot","titulo":"Beach lot","localizacao":"Orla","tipo":"terreno"}
]}"#;

#[test]
fn list_filters_and_orders_newest_first() {
    let t = test_app();
    t.app.db.write(DASHBOARD_KEY, DASHBOARD).unwrap();

    let body = body_json(handle(get("/properties?category=launch"), &t.app).unwrap());
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["properties"][0]["id"], "new");
    assert_eq!(body["properties"][1]["id"], "old");

    let body = body_json(handle(get("/properties?status=sold"), &t.app).unwrap());
    assert_eq!(body["count"], 1);
    assert_eq!(body["properties"][0]["id"], "gone");

    // Legacy records come back in the current shape.
    let body = body_json(handle(get("/properties?category=waterfront"), &t.app).unwrap());
    assert_eq!(body["properties"][0]["title"], "Beach lot");
    assert_eq!(body["properties"][0]["location"], "Orla");

    let body = body_json(handle(get("/properties"), &t.app).unwrap());
    assert_eq!(body["count"], 4);
}

#[test]
fn list_rejects_unknown_filters() {
    let t = test_app();
    assert!(matches!(
        handle(get("/properties?category=castles"), &t.app),
        Err(ServerError::BadRequest(_))
    ));
    assert!(matches!(
        handle(get("/properties?status=demolished"), &t.app),
        Err(ServerError::BadRequest(_))
    ));
}

#[test]
fn create_reports_missing_fields() {
    let t = test_app();
    let token = session_token(&t);

    let req = json_request(Method::POST, "/properties", &json!({ "title": "No place" }), Some(&token));
    match handle(req, &t.app) {
        Err(ServerError::BadRequest(msg)) => assert_eq!(msg, "missing field: location"),
        other => panic!("expected BadRequest, got {:?}", other.map(|r| r.status())),
    }
}

#[test]
fn update_replaces_fields_and_keeps_created_at() {
    let t = test_app();
    t.app.db.write(DASHBOARD_KEY, DASHBOARD).unwrap();
    let token = session_token(&t);

    let req = json_request(
        Method::PUT,
        "/properties/old",
        &json!({ "title": "Renovated flat", "location": "Centro", "category": "move-in-ready" }),
        Some(&token),
    );
    let body = body_json(handle(req, &t.app).unwrap());
    assert_eq!(body["property"]["title"], "Renovated flat");
    assert_eq!(body["property"]["category"], "move-in-ready");
    assert_eq!(body["property"]["createdAt"], "2023-01-01T00:00:00Z");

    let req = json_request(
        Method::PUT,
        "/properties/missing",
        &json!({ "title": "X", "location": "Y" }),
        Some(&token),
    );
    assert!(matches!(handle(req, &t.app), Err(ServerError::NotFound)));
}

#[test]
fn delete_removes_and_unknown_is_not_found() {
    let t = test_app();
    t.app.db.write(DASHBOARD_KEY, DASHBOARD).unwrap();
    let token = session_token(&t);

    let req = json_request(Method::DELETE, "/properties/lot", &json!({}), Some(&token));
    assert_eq!(handle(req, &t.app).unwrap().status(), 200);

    let req = json_request(Method::DELETE, "/properties/lot", &json!({}), Some(&token));
    assert!(matches!(handle(req, &t.app), Err(ServerError::NotFound)));

    let body = body_json(handle(get("/properties"), &t.app).unwrap());
    assert_eq!(body["count"], 3);
}

#[test]
fn sale_marks_property_sold_and_books_commission() {
    let t = test_app();
    t.app.db.write(DASHBOARD_KEY, DASHBOARD).unwrap();
    let token = session_token(&t);

    let req = json_request(
        Method::POST,
        "/sales",
        &json!({ "propertyId": "new", "value": 500000, "commission": 25000, "clientName": "Ana" }),
        Some(&token),
    );
    let resp = handle(req, &t.app).unwrap();
    assert_eq!(resp.status(), 201);

    let body = body_json(handle(get("/properties?status=sold"), &t.app).unwrap());
    let sold = body["properties"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == "new")
        .expect("sold property listed");
    assert!(sold["soldAt"].is_string());

    let stats = body_json(handle(get("/stats"), &t.app).unwrap());
    assert_eq!(stats["revenue"]["total"], 25000.0);
    assert_eq!(stats["sales"]["total"], 1);

    let req = json_request(
        Method::POST,
        "/sales",
        &json!({ "propertyId": "nope", "value": 1 }),
        Some(&token),
    );
    assert!(matches!(handle(req, &t.app), Err(ServerError::NotFound)));
}

#[test]
fn leads_are_public_but_validated() {
    let t = test_app();

    let req = json_request(
        Method::POST,
        "/leads",
        &json!({ "name": "Ana", "contact": "ana@example.com", "interest": "waterfront" }),
        None,
    );
    assert_eq!(handle(req, &t.app).unwrap().status(), 201);

    let req = json_request(Method::POST, "/leads", &json!({ "name": "Ana" }), None);
    match handle(req, &t.app) {
        Err(ServerError::BadRequest(msg)) => assert_eq!(msg, "missing field: contact"),
        other => panic!("expected BadRequest, got {:?}", other.map(|r| r.status())),
    }

    let stats = body_json(handle(get("/stats"), &t.app).unwrap());
    assert_eq!(stats["leads"]["total"], 1);
}

#[test]
fn health_reports_ok() {
    let t = test_app();
    let body = body_json(handle(get("/health"), &t.app).unwrap());
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

const FILTERABLE: &str = r#"{"properties":[
    {"id":"flat","title":"Flat","location":"Jardim América","type":"apartamento","price":320000,"bedrooms":2,"bathrooms":1,"parking":1},
    {"id":"big","title":"Big flat","location":"Jardim Europa","type":"apartamento","price":780000,"bedrooms":4,"bathrooms":3,"parking":2},
    {"id":"loft","title":"Loft","location":"Centro","type":"cobertura","price":450000,"bedrooms":1,"bathrooms":1,"parking":0},
    {"id":"ask","title":"Ask us","location":"Jardim Sul","type":"apartamento","bedrooms":3}
]}"#;

#[test]
fn list_applies_visitor_filters() {
    let t = test_app();
    t.app.db.write(DASHBOARD_KEY, FILTERABLE).unwrap();

    let ids = |uri: &str| -> Vec<String> {
        let body = body_json(handle(get(uri), &t.app).unwrap());
        let mut ids: Vec<String> = body["properties"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap().to_string())
            .collect();
        ids.sort();
        ids
    };

    assert_eq!(ids("/properties?type=cobertura"), vec!["loft"]);
    assert_eq!(ids("/properties?minPrice=300000&maxPrice=500000"), vec!["flat", "loft"]);
    assert_eq!(ids("/properties?minBedrooms=3"), vec!["ask", "big"]);
    assert_eq!(ids("/properties?minBathrooms=2&minParking=2"), vec!["big"]);
    assert_eq!(ids("/properties?location=jardim&minBedrooms=2&maxPrice=400000"), vec!["flat"]);
    assert_eq!(ids("/properties?category=launch&type=").len(), 4);
}

#[test]
fn list_rejects_malformed_filters() {
    let t = test_app();
    for uri in [
        "/properties?minPrice=lots",
        "/properties?minBedrooms=two",
        "/properties?minPrice=500&maxPrice=100",
    ] {
        assert!(matches!(handle(get(uri), &t.app), Err(ServerError::BadRequest(_))), "{uri}");
    }
}
