use crate::publish::recording::RecordingRemote;
use crate::router::handle;
use crate::tests::utils::{body_json, get, json_request, publishing_app, session_token, Offline};
use http::Method;
use serde_json::json;

#[test]
fn operator_writes_are_mirrored_to_the_listings_api() {
    let t = publishing_app(RecordingRemote::default());
    let token = session_token(&t);

    let listing = json!({ "id": "x1", "title": "Dune house", "location": "Orla", "category": "waterfront" });
    let resp = handle(json_request(Method::POST, "/properties", &listing, Some(&token)), &t.app).unwrap();
    assert_eq!(resp.status(), 201);
    assert_eq!(t.app.remote.listings.lock().unwrap()["x1"]["title"], "Dune house");

    let sale = json!({ "propertyId": "x1", "value": 900000, "commission": 45000 });
    handle(json_request(Method::POST, "/sales", &sale, Some(&token)), &t.app).unwrap();
    assert_eq!(t.app.remote.listings.lock().unwrap()["x1"]["status"], "sold");

    handle(json_request(Method::DELETE, "/properties/x1", &json!({}), Some(&token)), &t.app).unwrap();
    assert!(t.app.remote.listings.lock().unwrap().is_empty());

    assert_eq!(
        t.app.remote.calls(),
        vec!["login mirror", "update x1", "create x1", "update x1", "delete x1"]
    );
}

#[test]
fn reads_and_failed_writes_are_not_mirrored() {
    let t = publishing_app(RecordingRemote::default());
    let token = session_token(&t);

    handle(get("/properties"), &t.app).unwrap();
    handle(get("/launch"), &t.app).unwrap();
    let incomplete = json!({ "title": "No place" });
    assert!(handle(json_request(Method::POST, "/properties", &incomplete, Some(&token)), &t.app).is_err());

    assert!(t.app.remote.calls().is_empty());
}

#[test]
fn unreachable_api_does_not_fail_the_local_write() {
    let t = publishing_app(Offline);
    let token = session_token(&t);

    let listing = json!({ "id": "x2", "title": "Loft", "location": "Centro", "category": "launch" });
    let resp = handle(json_request(Method::POST, "/properties", &listing, Some(&token)), &t.app).unwrap();
    assert_eq!(resp.status(), 201);

    let body = body_json(handle(get("/properties"), &t.app).unwrap());
    assert_eq!(body["count"], 1);
}
