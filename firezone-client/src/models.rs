//! Request and response bodies for the Firezone API
//!
//! Responses wrap the entity in `{"data": {...}}`; create and update
//! requests wrap it in `{"<kind>": {...}}`. Timestamps are passed through as
//! the server formats them.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct Data<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserEnvelope<'a> {
    pub user: &'a UserRequest,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeviceEnvelope<'a> {
    pub device: &'a DeviceRequest,
}

#[derive(Debug, Serialize)]
pub(crate) struct RuleEnvelope<'a> {
    pub rule: &'a RuleRequest,
}

// ── Users ────────────────────────────────────────────────────────────

/// A user as returned by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub disabled_at: Option<String>,
    #[serde(default)]
    pub last_signed_in_at: Option<String>,
    #[serde(default)]
    pub last_signed_in_method: Option<String>,
    #[serde(default, rename = "inserted_at")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Fields a client may set on a user
///
/// `disabled_at` is always sent; `null` re-enables the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserRequest {
    pub email: String,
    pub role: String,
    pub disabled_at: Option<String>,
}

// ── Devices ──────────────────────────────────────────────────────────

/// A WireGuard device as returned by the server
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub public_key: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ipv4: Option<String>,
    #[serde(default)]
    pub ipv6: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub allowed_ips: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dns: Vec<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub mtu: Option<u16>,
    #[serde(default)]
    pub persistent_keepalive: Option<u16>,
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub preshared_key: Option<SecretString>,
    #[serde(default)]
    pub use_default_allowed_ips: bool,
    #[serde(default)]
    pub use_default_dns: bool,
    #[serde(default)]
    pub use_default_endpoint: bool,
    #[serde(default)]
    pub use_default_mtu: bool,
    #[serde(default)]
    pub use_default_persistent_keepalive: bool,
    #[serde(default, rename = "inserted_at")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Fields a client may set on a device
///
/// `description`, `ipv4` and `ipv6` are always sent so an update can clear
/// them; `null` addresses are assigned by the server. The other value fields
/// are omitted when `None` and their `use_default_*` flag decides them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceRequest {
    pub user_id: String,
    pub name: String,
    pub public_key: String,
    pub description: Option<String>,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_ips: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_keepalive: Option<u16>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_secret"
    )]
    pub preshared_key: Option<SecretString>,
    pub use_default_allowed_ips: bool,
    pub use_default_dns: bool,
    pub use_default_endpoint: bool,
    pub use_default_mtu: bool,
    pub use_default_persistent_keepalive: bool,
}

// ── Rules ────────────────────────────────────────────────────────────

/// A firewall rule as returned by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Rule {
    pub id: String,
    /// `None` for rules that apply to every user
    #[serde(default)]
    pub user_id: Option<String>,
    pub action: String,
    pub destination: String,
    #[serde(default)]
    pub port_range: Option<String>,
    #[serde(default)]
    pub port_type: Option<String>,
    #[serde(default, rename = "inserted_at")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Fields a client may set on a rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub action: String,
    pub destination: String,
    pub port_range: String,
    pub port_type: String,
}

// ── Serde helpers ────────────────────────────────────────────────────

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

fn serialize_secret<S>(secret: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
