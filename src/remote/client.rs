// client.rs
use crate::domain::category::Category;
use crate::remote::RemoteError;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

const USER_AGENT: &str = concat!("property_board/", env!("CARGO_PKG_VERSION"));

/// Where the fallback chain gets listings once local storage has nothing.
pub trait RemoteSource {
    fn fetch_category(&self, category: Category) -> Result<Vec<Value>, RemoteError>;
}

/// Write side of the listings API, used to mirror operator changes.
pub trait RemotePublisher {
    fn login(&self, username: &str, password: &str) -> Result<String, RemoteError>;
    fn create_property(&self, session: &str, property: &Value) -> Result<String, RemoteError>;
    fn update_property(&self, session: &str, id: &str, property: &Value) -> Result<(), RemoteError>;
    fn delete_property(&self, session: &str, id: &str) -> Result<(), RemoteError>;
}

/// Body shared by every API response. Fields are present depending on the endpoint.
#[derive(Debug, Default, Deserialize)]
struct ApiEnvelope {
    success: Option<bool>,
    #[serde(default)]
    properties: Vec<Value>,
    property_id: Option<String>,
    session: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Blocking client for the listings API. No retries; the client's default
/// timeout is the only bound on a hung request.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and decodes the JSON body; non-2xx becomes `Status`.
    fn send<T: serde::de::DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, RemoteError> {
        let resp = req.send().map_err(|e| RemoteError::Network(e.to_string()))?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<T>()
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    fn send_envelope(&self, req: RequestBuilder) -> Result<ApiEnvelope, RemoteError> {
        let envelope: ApiEnvelope = self.send(req)?;
        if envelope.success == Some(false) {
            return Err(RemoteError::Rejected(
                envelope.error.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        Ok(envelope)
    }

    pub fn health(&self) -> Result<HealthStatus, RemoteError> {
        self.send(self.client.get(self.url("/health")))
    }

    pub fn fetch_category(&self, category: Category) -> Result<Vec<Value>, RemoteError> {
        let req = self
            .client
            .get(self.url("/properties"))
            .query(&[("category", category.slug())]);
        Ok(self.send_envelope(req)?.properties)
    }

    /// Returns the id the server assigned.
    pub fn create_property(&self, session: &str, property: &Value) -> Result<String, RemoteError> {
        let req = self
            .client
            .post(self.url("/properties"))
            .bearer_auth(session)
            .json(property);
        self.send_envelope(req)?
            .property_id
            .ok_or_else(|| RemoteError::Decode("response carried no property_id".into()))
    }

    pub fn update_property(&self, session: &str, id: &str, property: &Value) -> Result<(), RemoteError> {
        let req = self
            .client
            .put(self.url(&format!("/properties/{id}")))
            .bearer_auth(session)
            .json(property);
        self.send_envelope(req).map(|_| ())
    }

    pub fn delete_property(&self, session: &str, id: &str) -> Result<(), RemoteError> {
        let req = self
            .client
            .delete(self.url(&format!("/properties/{id}")))
            .bearer_auth(session);
        self.send_envelope(req).map(|_| ())
    }

    /// Operator login. Returns the opaque session identifier.
    pub fn login(&self, username: &str, password: &str) -> Result<String, RemoteError> {
        let req = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "senha": password }));
        self.send_envelope(req)?
            .session
            .ok_or_else(|| RemoteError::Decode("response carried no session".into()))
    }
}

impl RemoteSource for ApiClient {
    fn fetch_category(&self, category: Category) -> Result<Vec<Value>, RemoteError> {
        ApiClient::fetch_category(self, category)
    }
}

impl RemotePublisher for ApiClient {
    fn login(&self, username: &str, password: &str) -> Result<String, RemoteError> {
        ApiClient::login(self, username, password)
    }

    fn create_property(&self, session: &str, property: &Value) -> Result<String, RemoteError> {
        ApiClient::create_property(self, session, property)
    }

    fn update_property(&self, session: &str, id: &str, property: &Value) -> Result<(), RemoteError> {
        ApiClient::update_property(self, session, id, property)
    }

    fn delete_property(&self, session: &str, id: &str) -> Result<(), RemoteError> {
        ApiClient::delete_property(self, session, id)
    }
}
