//! Provider configuration
//!
//! `endpoint` and `api_key` come from the provider block or, when unset
//! there, from `FIREZONE_ENDPOINT` and `FIREZONE_API_KEY`.

use std::collections::HashMap;

use firezone_core::provider::{ProviderError, ProviderResult};
use firezone_core::resource::Value;
use secrecy::SecretString;

pub const ENDPOINT_ENV: &str = "FIREZONE_ENDPOINT";
pub const API_KEY_ENV: &str = "FIREZONE_API_KEY";

/// Provider block as written by the operator
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub attributes: HashMap<String, Value>,
}

/// Settings needed to build the client
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub api_key: SecretString,
}

impl ProviderConfig {
    pub fn new(attributes: HashMap<String, Value>) -> Self {
        Self { attributes }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.attributes
            .insert("endpoint".to_string(), Value::String(endpoint.into()));
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.attributes
            .insert("api_key".to_string(), Value::String(api_key.into()));
        self
    }

    /// Get a string attribute value
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Resolve against the process environment
    pub fn resolve(&self) -> ProviderResult<ResolvedConfig> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve against `lookup`; explicit values win over it
    ///
    /// Every missing setting is reported in a single error.
    pub fn resolve_with<F>(&self, lookup: F) -> ProviderResult<ResolvedConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, env: &str| {
            self.get_string(key)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .or_else(|| lookup(env).filter(|s| !s.is_empty()))
        };

        let endpoint = pick("endpoint", ENDPOINT_ENV);
        let api_key = pick("api_key", API_KEY_ENV);

        let mut missing = Vec::new();
        if endpoint.is_none() {
            missing.push(format!(
                "Missing firezone endpoint: set the 'endpoint' attribute or the {} environment variable",
                ENDPOINT_ENV
            ));
        }
        if api_key.is_none() {
            missing.push(format!(
                "Missing firezone api key: set the 'api_key' attribute or the {} environment variable",
                API_KEY_ENV
            ));
        }

        match (endpoint, api_key) {
            (Some(endpoint), Some(api_key)) => Ok(ResolvedConfig {
                endpoint,
                api_key: SecretString::from(api_key),
            }),
            _ => Err(ProviderError::configuration(missing.join("; "))),
        }
    }
}
