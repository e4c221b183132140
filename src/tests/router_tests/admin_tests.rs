use crate::db::kv::KeyValueStore;
use crate::router::handle;
use crate::sync::derived_keys;
use crate::tests::utils::{body_json, body_string, form_request, get, header, session_token, test_app};
use astra::Body;
use http::{Method, Request};

fn admin_page(t: &crate::tests::utils::TestApp, token: &str, uri: &str) -> String {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("Cookie", format!("session={token}"))
        .body(Body::empty())
        .unwrap();
    body_string(handle(req, &t.app).unwrap())
}

#[test]
fn seed_adds_samples_and_fills_every_cache() {
    let t = test_app();
    let token = session_token(&t);

    let resp = handle(form_request("/admin/seed", "", Some(&token)), &t.app).unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(header(&resp, "Location"), Some("/admin?notice=seeded"));

    for key in derived_keys() {
        assert!(t.app.db.read(&key).unwrap().is_some(), "{key} not written");
    }

    // Seeding twice does not duplicate.
    handle(form_request("/admin/seed", "", Some(&token)), &t.app).unwrap();
    let body = body_json(handle(get("/properties"), &t.app).unwrap());
    assert_eq!(body["count"], 4);

    let page = admin_page(&t, &token, "/admin?notice=seeded");
    assert!(page.contains("Sample properties added."));
    assert!(page.contains("(in sync)"));
}

#[test]
fn form_flow_creates_sells_and_deletes() {
    let t = test_app();
    let token = session_token(&t);

    let form = "title=Garden+House&location=Jardim&price=520000&category=most-wanted\
                &bedrooms=3&features=pool%2C+garden&featured=true";
    let resp = handle(form_request("/properties", form, Some(&token)), &t.app).unwrap();
    assert_eq!(resp.status(), 303);

    let body = body_json(handle(get("/properties?category=most-wanted"), &t.app).unwrap());
    let property = &body["properties"][0];
    assert_eq!(property["title"], "Garden House");
    assert_eq!(property["bedroomCount"], 3);
    assert_eq!(property["featured"], true);
    assert_eq!(property["features"], serde_json::json!(["pool", "garden"]));
    let id = property["id"].as_str().unwrap().to_string();

    let sale = format!("propertyId={id}&value=520000&commission=");
    let resp = handle(form_request("/sales", &sale, Some(&token)), &t.app).unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(header(&resp, "Location"), Some("/admin?notice=sold"));

    let body = body_json(handle(get("/properties?status=sold"), &t.app).unwrap());
    assert_eq!(body["properties"][0]["id"], id.as_str());

    let resp = handle(
        form_request(&format!("/admin/properties/{id}/delete"), "", Some(&token)),
        &t.app,
    )
    .unwrap();
    assert_eq!(resp.status(), 303);

    let body = body_json(handle(get("/properties"), &t.app).unwrap());
    assert_eq!(body["count"], 0);
}

#[test]
fn manual_sync_reports_on_dashboard() {
    let t = test_app();
    let token = session_token(&t);

    let resp = handle(form_request("/admin/sync", "", Some(&token)), &t.app).unwrap();
    assert_eq!(header(&resp, "Location"), Some("/admin?notice=synced"));

    let page = admin_page(&t, &token, "/admin");
    assert!(page.contains("Signed in as"));
    assert!(page.contains("broker"));
    assert!(page.contains("No properties yet."));
}

#[test]
fn expenses_reduce_profit_and_caches_can_be_cleared() {
    let t = test_app();
    let token = session_token(&t);

    handle(form_request("/admin/seed", "", Some(&token)), &t.app).unwrap();
    let resp = handle(form_request("/admin/expenses", "amount=1500", Some(&token)), &t.app).unwrap();
    assert_eq!(header(&resp, "Location"), Some("/admin?notice=expense"));

    let stats = body_json(handle(get("/stats"), &t.app).unwrap());
    assert_eq!(stats["revenue"]["profit"], -1500.0);

    let resp = handle(form_request("/admin/clear-caches", "", Some(&token)), &t.app).unwrap();
    assert_eq!(header(&resp, "Location"), Some("/admin?notice=cleared"));
    for key in derived_keys() {
        assert_eq!(t.app.db.read(&key).unwrap(), None);
    }
}
