use crate::auth::operator::{self, clear_session_cookie, session_cookie, SESSION_COOKIE};
use crate::config::AppConfig;
use crate::db::records;
use crate::db::connection::Database;
use crate::domain::category::{Category, CategoryTable};
use crate::domain::dashboard::{LeadRequest, SaleRequest};
use crate::domain::filter::ListingFilter;
use crate::domain::normalize::RawProperty;
use crate::domain::property::{sort_by_recency, PropertyStatus};
use crate::errors::ServerError;
use crate::publish::{Change, Publisher};
use crate::remote::{ApiClient, RemotePublisher, RemoteSource};
use crate::resolver::PropertyResolver;
use crate::responses::json::json_response_with_cookie;
use crate::responses::{
    error_to_response, html_response, json_error_response, json_response, redirect_response,
    ResultResp,
};
use crate::sync;
use crate::templates::pages::{self, AdminVm, CategoryVm};
use astra::{Request, Response};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::io::Read;

const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Everything a request handler needs, built once in `main`.
pub struct App<R = ApiClient> {
    pub db: Database,
    pub config: AppConfig,
    pub table: CategoryTable,
    pub remote: R,
    pub publisher: Publisher,
}

impl<R: RemoteSource + RemotePublisher> App<R> {
    pub fn new(db: Database, config: AppConfig, remote: R) -> Self {
        let table = config.category_table();
        let publisher = Publisher::new(config.publish.clone());
        Self {
            db,
            config,
            table,
            remote,
            publisher,
        }
    }
}

/// Entry point for the server: routes and turns errors into HTML or JSON
/// depending on what the caller speaks.
pub fn respond<R: RemoteSource + RemotePublisher>(req: Request, app: &App<R>) -> Response {
    let json_errors = wants_json(&req);
    match handle(req, app) {
        Ok(resp) => resp,
        Err(err) if json_errors => json_error_response(err),
        Err(err) => error_to_response(err),
    }
}

pub fn handle<R: RemoteSource + RemotePublisher>(req: Request, app: &App<R>) -> ResultResp {
    let now = Utc::now();
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method.as_str(), segments.as_slice()) {
        ("GET", [""]) => {
            let is_operator = session_operator(&req, app, now).is_some();
            html_response(pages::home_page(is_operator))
        }
        ("GET", ["health"]) => json_response(
            200,
            &json!({
                "status": "ok",
                "message": "property board is running",
                "timestamp": now.to_rfc3339(),
            }),
        ),

        // Listings API
        ("GET", ["properties"]) => list_properties(&req, app, now),
        ("POST", ["properties"]) => {
            require_operator(&req, app, now)?;
            let payload = Payload::read(req)?;
            create_property(payload, app, now)
        }
        ("PUT", ["properties", id]) => {
            require_operator(&req, app, now)?;
            let id = id.to_string();
            let payload = Payload::read(req)?;
            update_property(&id, payload, app, now)
        }
        ("DELETE", ["properties", id]) => {
            require_operator(&req, app, now)?;
            delete_property(id, app, now)?;
            json_response(200, &json!({ "success": true }))
        }
        ("POST", ["sales"]) => {
            require_operator(&req, app, now)?;
            let payload = Payload::read(req)?;
            record_sale(payload, app, now)
        }
        ("POST", ["leads"]) => {
            let payload = Payload::read(req)?;
            add_lead(payload, app, now)
        }
        ("GET", ["stats"]) => {
            let data = records::load_dashboard(&app.db, &app.table, now);
            json_response(200, &data.statistics(now))
        }

        // Operator session
        ("GET", ["login"]) => {
            let failed = query_params(&req).contains_key("error");
            html_response(pages::login_page(
                failed.then_some("Invalid username or password."),
                app.config.operator.is_some(),
            ))
        }
        ("POST", ["auth", "login"]) => {
            let payload = Payload::read(req)?;
            login(payload, app, now)
        }
        ("POST", ["logout"]) => {
            operator::logout(&app.db, session_token(&req).as_deref(), now.timestamp())?;
            redirect_response("/", Some(&clear_session_cookie()))
        }

        // Dashboard
        ("GET", ["admin"]) => admin_dashboard(&req, app, now),
        ("POST", ["admin", "sync"]) => {
            require_operator(&req, app, now)?;
            sync::sync_dashboard_to_pages(&app.db, &app.table, now)?;
            redirect_response("/admin?notice=synced", None)
        }
        ("POST", ["admin", "seed"]) => {
            require_operator(&req, app, now)?;
            let added = records::update_dashboard(&app.db, &app.table, now, |data| {
                Ok(data.seed_sample_properties(&app.table, now))
            })?;
            tracing::info!(added, "seeded sample properties");
            sync_after_write(app, now);
            redirect_response("/admin?notice=seeded", None)
        }
        ("POST", ["admin", "clear-caches"]) => {
            require_operator(&req, app, now)?;
            sync::clear_page_caches(&app.db)?;
            redirect_response("/admin?notice=cleared", None)
        }
        ("POST", ["admin", "expenses"]) => {
            require_operator(&req, app, now)?;
            let mut body = Payload::read(req)?.into_object()?;
            coerce_numbers(&mut body, &["amount"]);
            let amount = body
                .get("amount")
                .and_then(Value::as_f64)
                .ok_or_else(|| ServerError::BadRequest("missing field: amount".into()))?;
            records::update_dashboard(&app.db, &app.table, now, |data| data.add_expense(amount))?;
            redirect_response("/admin?notice=expense", None)
        }
        ("POST", ["admin", "properties", id, "delete"]) => {
            require_operator(&req, app, now)?;
            delete_property(id, app, now)?;
            redirect_response("/admin?notice=deleted", None)
        }

        // Category pages
        ("GET", [slug]) => match Category::from_slug(slug) {
            Some(category) => category_page(&req, app, category, now),
            None => Err(ServerError::NotFound),
        },

        _ => Err(ServerError::NotFound),
    }
}

fn category_page<R: RemoteSource + RemotePublisher>(
    req: &Request,
    app: &App<R>,
    category: Category,
    now: DateTime<Utc>,
) -> ResultResp {
    // Best effort: a failed counter must not cost the visitor the page.
    if let Err(e) = records::update_dashboard(&app.db, &app.table, now, |data| {
        data.increment_views();
        Ok(())
    }) {
        tracing::warn!(error = %e, "view counter not updated");
    }

    let filter = ListingFilter::from_params(&query_params(req))?;
    let mut resolution = PropertyResolver::new(&app.db, &app.remote, &app.table).resolve(category, now);
    let resolved = resolution.records.len();
    filter.apply(&mut resolution.records);

    let vm = CategoryVm {
        category,
        source: resolution.source,
        records: &resolution.records,
        resolved,
        filter: &filter,
        is_operator: session_operator(req, app, now).is_some(),
    };

    html_response(pages::category_page(&vm)).or_else(|e| {
        tracing::error!(%category, error = %e, "category page failed to render");
        html_response(pages::category_error_page(category))
    })
}

fn list_properties<R: RemoteSource + RemotePublisher>(req: &Request, app: &App<R>, now: DateTime<Utc>) -> ResultResp {
    let params = query_params(req);

    let category = match params.get("category").filter(|c| !c.is_empty()) {
        Some(hint) => Some(
            app.table
                .lookup(hint)
                .ok_or_else(|| ServerError::BadRequest(format!("unknown category: {hint}")))?,
        ),
        None => None,
    };
    let status = match params.get("status").filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            PropertyStatus::parse(raw)
                .ok_or_else(|| ServerError::BadRequest(format!("unknown status: {raw}")))?,
        ),
        None => None,
    };

    let filter = ListingFilter::from_params(&params)?;

    let mut properties = records::load_dashboard(&app.db, &app.table, now).properties;
    properties.retain(|p| {
        category.map_or(true, |c| p.category == c) && status.map_or(true, |s| p.status == s)
    });
    filter.apply(&mut properties);
    sort_by_recency(&mut properties);

    json_response(
        200,
        &json!({
            "success": true,
            "count": properties.len(),
            "properties": properties,
        }),
    )
}

fn create_property<R: RemoteSource + RemotePublisher>(payload: Payload, app: &App<R>, now: DateTime<Utc>) -> ResultResp {
    let raw = RawProperty::classify(payload.value);
    let record = records::update_dashboard(&app.db, &app.table, now, |data| {
        data.upsert_property(raw, &app.table, now)
    })?;
    tracing::info!(id = %record.id, category = %record.category, "property saved");
    sync_after_write(app, now);
    mirror(app, Change::Upsert(&record));

    if payload.form {
        return redirect_response("/admin?notice=saved", None);
    }
    json_response(
        201,
        &json!({ "success": true, "property_id": record.id, "property": record }),
    )
}

/// Full replacement of an existing record. Unknown ids are 404 rather than
/// silently created.
fn update_property<R: RemoteSource + RemotePublisher>(
    id: &str,
    payload: Payload,
    app: &App<R>,
    now: DateTime<Utc>,
) -> ResultResp {
    let mut body = match payload.value {
        Value::Object(map) => map,
        _ => return Err(ServerError::BadRequest("expected a JSON object".into())),
    };
    body.insert("id".into(), Value::String(id.to_string()));
    let raw = RawProperty::classify(Value::Object(body));

    let record = records::update_dashboard(&app.db, &app.table, now, |data| {
        if data.find(id).is_none() {
            return Err(ServerError::NotFound);
        }
        data.upsert_property(raw, &app.table, now)
    })?;
    tracing::info!(id = %record.id, status = record.status.as_str(), "property updated");
    sync_after_write(app, now);
    mirror(app, Change::Upsert(&record));

    json_response(200, &json!({ "success": true, "property": record }))
}

fn delete_property<R: RemoteSource + RemotePublisher>(id: &str, app: &App<R>, now: DateTime<Utc>) -> Result<(), ServerError> {
    let removed = records::update_dashboard(&app.db, &app.table, now, |data| {
        Ok(data.delete_property(id))
    })?;
    if !removed {
        return Err(ServerError::NotFound);
    }
    tracing::info!(id, "property deleted");
    sync_after_write(app, now);
    mirror(app, Change::Delete(id));
    Ok(())
}

fn record_sale<R: RemoteSource + RemotePublisher>(payload: Payload, app: &App<R>, now: DateTime<Utc>) -> ResultResp {
    let form = payload.form;
    let mut body = payload.into_object()?;
    coerce_numbers(&mut body, &["value", "commission"]);
    if !body.contains_key("propertyId") {
        return Err(ServerError::BadRequest("missing field: propertyId".into()));
    }
    let req: SaleRequest = serde_json::from_value(Value::Object(body))
        .map_err(|e| ServerError::BadRequest(format!("invalid sale: {e}")))?;

    let (sale, sold) = records::update_dashboard(&app.db, &app.table, now, |data| {
        let sale = data.record_sale(req, now)?;
        let sold = data.find(&sale.property_id).cloned();
        Ok((sale, sold))
    })?;
    tracing::info!(property_id = %sale.property_id, value = sale.value, "sale recorded");
    sync_after_write(app, now);
    if let Some(record) = &sold {
        mirror(app, Change::Upsert(record));
    }

    if form {
        return redirect_response("/admin?notice=sold", None);
    }
    json_response(201, &json!({ "success": true, "sale": sale }))
}

fn add_lead<R: RemoteSource + RemotePublisher>(payload: Payload, app: &App<R>, now: DateTime<Utc>) -> ResultResp {
    let form = payload.form;
    let body = payload.into_object()?;
    let req: LeadRequest = serde_json::from_value(Value::Object(body))
        .map_err(|e| ServerError::BadRequest(format!("invalid lead: {e}")))?;

    let lead = records::update_dashboard(&app.db, &app.table, now, |data| data.add_lead(req, now))?;
    tracing::info!(id = %lead.id, "lead captured");

    if form {
        return redirect_response("/", None);
    }
    json_response(201, &json!({ "success": true, "lead": lead }))
}

fn login<R: RemoteSource + RemotePublisher>(payload: Payload, app: &App<R>, now: DateTime<Utc>) -> ResultResp {
    let form = payload.form;
    let body = payload.into_object()?;
    let field = |names: &[&str]| {
        names
            .iter()
            .find_map(|n| body.get(*n).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string()
    };
    let username = field(&["username"]);
    let password = field(&["senha", "password"]);

    let result = operator::login(&app.db, &app.config, &username, &password, now.timestamp());

    match (result, form) {
        (Ok(token), true) => {
            let cookie = session_cookie(&token, app.config.session_ttl_secs);
            redirect_response("/admin", Some(&cookie))
        }
        (Ok(token), false) => {
            let cookie = session_cookie(&token, app.config.session_ttl_secs);
            json_response_with_cookie(
                200,
                &json!({ "success": true, "session": token }),
                Some(&cookie),
            )
        }
        (Err(ServerError::Unauthorized(_)), true) => redirect_response("/login?error=1", None),
        (Err(e), _) => Err(e),
    }
}

fn admin_dashboard<R: RemoteSource + RemotePublisher>(req: &Request, app: &App<R>, now: DateTime<Utc>) -> ResultResp {
    let Some(operator) = session_operator(req, app, now) else {
        return redirect_response("/login", None);
    };

    let mut data = records::read_dashboard(&app.db, &app.table, now)?;
    sort_by_recency(&mut data.properties);
    let stats = data.statistics(now);
    let sync_stats = sync::sync_stats(&app.db, &app.table, now);

    let notice = query_params(req).get("notice").and_then(|n| match n.as_str() {
        "saved" => Some("Property saved."),
        "sold" => Some("Sale recorded."),
        "deleted" => Some("Property deleted."),
        "synced" => Some("Page caches rebuilt."),
        "seeded" => Some("Sample properties added."),
        "cleared" => Some("Page caches cleared."),
        "expense" => Some("Expense recorded."),
        _ => None,
    });

    html_response(pages::admin_page(&AdminVm {
        operator: &operator,
        stats: &stats,
        sync: &sync_stats,
        properties: &data.properties,
        leads: &data.leads,
        notice,
    }))
}

/// Keeps the page caches in step with the dashboard. The write has already
/// landed, so a failure here is only logged; the timer catches up.
fn sync_after_write<R: RemoteSource + RemotePublisher>(app: &App<R>, now: DateTime<Utc>) {
    if let Err(e) = sync::sync_dashboard_to_pages(&app.db, &app.table, now) {
        tracing::warn!(error = %e, "sync after write failed");
    }
}

/// Pushes a change to the listings API when publishing is configured. The
/// local write has already landed, so a failure is only logged.
fn mirror<R: RemoteSource + RemotePublisher>(app: &App<R>, change: Change) {
    if !app.publisher.is_enabled() {
        return;
    }
    if let Err(e) = app.publisher.publish(&app.remote, &change) {
        tracing::warn!(error = %e, "could not mirror change to listings API");
    }
}

fn require_operator<R: RemoteSource + RemotePublisher>(req: &Request, app: &App<R>, now: DateTime<Utc>) -> Result<String, ServerError> {
    operator::require_operator(&app.db, session_token(req).as_deref(), now.timestamp())
}

fn session_operator<R: RemoteSource + RemotePublisher>(req: &Request, app: &App<R>, now: DateTime<Utc>) -> Option<String> {
    operator::current_operator(&app.db, session_token(req).as_deref(), now.timestamp())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "session lookup failed");
            None
        })
}

/// Bearer token first, then the session cookie.
fn session_token(req: &Request) -> Option<String> {
    let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok());

    if let Some(token) = header("Authorization").and_then(|v| v.strip_prefix("Bearer ")) {
        return Some(token.trim().to_string());
    }

    header("Cookie")?.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

fn query_params(req: &Request) -> HashMap<String, String> {
    req.uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

fn wants_json(req: &Request) -> bool {
    let header_has_json = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"))
    };
    if header_has_json("Accept") || header_has_json("Content-Type") {
        return true;
    }

    let api_path = matches!(
        req.uri().path().trim_matches('/').split('/').next(),
        Some("health" | "properties" | "sales" | "leads" | "stats" | "auth")
    );
    api_path && !is_form(req)
}

/// A request body, either JSON or an HTML form flattened to string values.
struct Payload {
    form: bool,
    value: Value,
}

impl Payload {
    fn read(req: Request) -> Result<Payload, ServerError> {
        let form = is_form(&req);

        let mut text = String::new();
        req.into_body()
            .reader()
            .take(MAX_BODY_BYTES)
            .read_to_string(&mut text)
            .map_err(|e| ServerError::BadRequest(format!("unreadable body: {e}")))?;

        if form {
            let map: Map<String, Value> = url::form_urlencoded::parse(text.as_bytes())
                .into_owned()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            return Ok(Payload {
                form,
                value: Value::Object(map),
            });
        }

        if text.trim().is_empty() {
            return Ok(Payload {
                form,
                value: Value::Object(Map::new()),
            });
        }

        let value = serde_json::from_str(&text)
            .map_err(|e| ServerError::BadRequest(format!("invalid JSON: {e}")))?;
        Ok(Payload { form, value })
    }

    fn into_object(self) -> Result<Map<String, Value>, ServerError> {
        match self.value {
            Value::Object(map) => Ok(map),
            _ => Err(ServerError::BadRequest("expected a JSON object".into())),
        }
    }
}

/// Form fields arrive as strings; typed request structs want numbers.
/// Blank optional fields are dropped.
fn coerce_numbers(body: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        let text = match body.get(*key) {
            Some(Value::String(s)) => s.trim().to_string(),
            _ => continue,
        };
        if text.is_empty() {
            body.remove(*key);
        } else if let Some(num) = text.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            body.insert(key.to_string(), Value::Number(num));
        }
    }
}
