// Async HTTP client for the Firezone REST API.
//
// Base path: /v0/
// Auth: Authorization: Bearer <api key>

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::FirezoneApi;
use crate::error::{Error, Result};
use crate::models::{
    Data, Device, DeviceEnvelope, DeviceRequest, Rule, RuleEnvelope, RuleRequest, User,
    UserEnvelope, UserRequest,
};

const API_PREFIX: &str = "v0";

/// Transport settings for building the underlying `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("firezone-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Async client for the Firezone API
///
/// Cheap to share behind an `Arc`; every method takes `&self` and holds no
/// mutable state.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
}

impl Client {
    /// Build a client for `endpoint` authenticating with `api_key`
    pub fn new(endpoint: &str, api_key: &SecretString) -> Result<Self> {
        Self::with_config(endpoint, api_key, &ClientConfig::default())
    }

    /// Build a client with explicit transport settings
    pub fn with_config(
        endpoint: &str,
        api_key: &SecretString,
        config: &ClientConfig,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| Error::InvalidApiKey(format!("invalid header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Self::from_reqwest(endpoint, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers)
    pub fn from_reqwest(endpoint: &str, http: reqwest::Client) -> Result<Self> {
        let base_url = Self::normalize_base_url(endpoint)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Ensure the base URL ends with `/v0/`
    ///
    /// `https://fz.example.com` and `https://fz.example.com/v0` both become
    /// `https://fz.example.com/v0/`.
    fn normalize_base_url(raw: &str) -> Result<Url> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with(&format!("/{API_PREFIX}")) {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/{API_PREFIX}/"));
        }

        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join `collection` and an optional entity id onto the base URL
    fn url(&self, collection: &str, id: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.join(collection)?;
        if let Some(id) = id {
            // Push as a single segment so ids and emails are percent-encoded
            url.path_segments_mut()
                .map_err(|()| {
                    Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase)
                })?
                .push(id);
        }
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T> {
        debug!("POST {url}");
        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T> {
        debug!("PUT {url}");
        let resp = self.http.put(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn delete(&self, url: Url) -> Result<()> {
        debug!("DELETE {url}");
        let resp = self.http.delete(url).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str::<Data<T>>(&body)
                .map(|envelope| envelope.data)
                .map_err(|e| {
                    let preview: String = body.chars().take(200).collect();
                    Error::Deserialization {
                        message: format!("{e} (body preview: {preview:?})"),
                        body,
                    }
                })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<()> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Unauthorized;
        }

        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&raw)
            .ok()
            .and_then(|v| v.get("errors").map(describe_errors))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// Flatten the API's `errors` object into one line
///
/// `{"detail": "Not Found"}` becomes `Not Found`;
/// `{"email": ["has already been taken"]}` becomes
/// `email: has already been taken`.
fn describe_errors(errors: &serde_json::Value) -> String {
    use serde_json::Value as Json;

    fn flatten(value: &Json) -> String {
        match value {
            Json::String(s) => s.clone(),
            Json::Array(items) => items.iter().map(flatten).collect::<Vec<_>>().join(", "),
            other => other.to_string(),
        }
    }

    match errors {
        Json::Object(map) => {
            let mut parts: Vec<String> = map
                .iter()
                .map(|(field, detail)| {
                    if field == "detail" {
                        flatten(detail)
                    } else {
                        format!("{field}: {}", flatten(detail))
                    }
                })
                .collect();
            parts.sort();
            parts.join("; ")
        }
        other => flatten(other),
    }
}

#[async_trait]
impl FirezoneApi for Client {
    async fn create_user(&self, user: &UserRequest) -> Result<User> {
        self.post(self.url("users", None)?, &UserEnvelope { user }).await
    }

    async fn get_user(&self, id_or_email: &str) -> Result<User> {
        self.get(self.url("users", Some(id_or_email))?).await
    }

    async fn update_user(&self, id: &str, user: &UserRequest) -> Result<User> {
        self.put(self.url("users", Some(id))?, &UserEnvelope { user }).await
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        self.delete(self.url("users", Some(id))?).await
    }

    async fn create_device(&self, device: &DeviceRequest) -> Result<Device> {
        self.post(self.url("devices", None)?, &DeviceEnvelope { device })
            .await
    }

    async fn get_device(&self, id: &str) -> Result<Device> {
        self.get(self.url("devices", Some(id))?).await
    }

    async fn update_device(&self, id: &str, device: &DeviceRequest) -> Result<Device> {
        self.put(self.url("devices", Some(id))?, &DeviceEnvelope { device })
            .await
    }

    async fn delete_device(&self, id: &str) -> Result<()> {
        self.delete(self.url("devices", Some(id))?).await
    }

    async fn create_rule(&self, rule: &RuleRequest) -> Result<Rule> {
        self.post(self.url("rules", None)?, &RuleEnvelope { rule }).await
    }

    async fn get_rule(&self, id: &str) -> Result<Rule> {
        self.get(self.url("rules", Some(id))?).await
    }

    async fn update_rule(&self, id: &str, rule: &RuleRequest) -> Result<Rule> {
        self.put(self.url("rules", Some(id))?, &RuleEnvelope { rule }).await
    }

    async fn delete_rule(&self, id: &str) -> Result<()> {
        self.delete(self.url("rules", Some(id))?).await
    }
}
