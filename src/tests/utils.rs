use crate::auth::operator;
use crate::auth::token::hash_token;
use crate::config::{AppConfig, OperatorCredentials, PublishCredentials};
use crate::db::connection::{init_db, Database};
use crate::domain::category::Category;
use crate::remote::{RemoteError, RemotePublisher, RemoteSource};
use crate::router::App;
use astra::{Body, Response};
use http::{Method, Request};
use serde_json::Value;
use std::io::Read;
use tempfile::TempDir;

pub const OPERATOR: &str = "broker";
pub const PASSWORD: &str = "hunter2";

/// Remote that is always down, so pages exercise the local chain only.
pub struct Offline;

impl RemoteSource for Offline {
    fn fetch_category(&self, _category: Category) -> Result<Vec<Value>, RemoteError> {
        Err(RemoteError::Network("offline".into()))
    }
}

impl RemotePublisher for Offline {
    fn login(&self, _username: &str, _password: &str) -> Result<String, RemoteError> {
        Err(RemoteError::Network("offline".into()))
    }

    fn create_property(&self, _session: &str, _property: &Value) -> Result<String, RemoteError> {
        Err(RemoteError::Network("offline".into()))
    }

    fn update_property(&self, _session: &str, _id: &str, _property: &Value) -> Result<(), RemoteError> {
        Err(RemoteError::Network("offline".into()))
    }

    fn delete_property(&self, _session: &str, _id: &str) -> Result<(), RemoteError> {
        Err(RemoteError::Network("offline".into()))
    }
}

/// App over a fresh database in its own temp dir. Keep it alive for the test.
pub struct TestApp<R = Offline> {
    pub app: App<R>,
    _dir: TempDir,
}

impl<R> TestApp<R> {
    /// Splits off the temp dir guard for callers that move the app elsewhere.
    pub fn into_parts(self) -> (App<R>, TempDir) {
        (self.app, self._dir)
    }
}

pub fn test_app() -> TestApp {
    test_app_with(Some(OperatorCredentials {
        username: OPERATOR.into(),
        password_sha256: hash_token(PASSWORD),
    }))
}

pub fn test_app_with(operator: Option<OperatorCredentials>) -> TestApp {
    build(operator, None, Offline)
}

/// App whose operator changes are mirrored to `remote`.
pub fn publishing_app<R: RemoteSource + RemotePublisher>(remote: R) -> TestApp<R> {
    let operator = OperatorCredentials {
        username: OPERATOR.into(),
        password_sha256: hash_token(PASSWORD),
    };
    let publish = PublishCredentials {
        username: "mirror".into(),
        password: "mirror-secret".into(),
    };
    build(Some(operator), Some(publish), remote)
}

fn build<R: RemoteSource + RemotePublisher>(
    operator: Option<OperatorCredentials>,
    publish: Option<PublishCredentials>,
    remote: R,
) -> TestApp<R> {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
    let db = Database::new(dir.path().join("test.sqlite3").to_string_lossy().to_string());
    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    let config = AppConfig {
        operator,
        publish,
        ..AppConfig::default()
    };
    TestApp {
        app: App::new(db, config, remote),
        _dir: dir,
    }
}

/// Opens an operator session directly, skipping the HTTP login.
pub fn session_token<R>(t: &TestApp<R>) -> String {
    operator::login(&t.app.db, &t.app.config, OPERATOR, PASSWORD, chrono::Utc::now().timestamp())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string().into_bytes())).unwrap()
}

pub fn form_request(uri: &str, form: &str, cookie_token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded");
    if let Some(token) = cookie_token {
        builder = builder.header("Cookie", format!("theme=dark; session={token}"));
    }
    builder.body(Body::from(form.as_bytes().to_vec())).unwrap()
}

pub fn body_string(resp: Response) -> String {
    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();
    body
}

pub fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_string(resp)).unwrap()
}

pub fn header<'a>(resp: &'a Response, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}
