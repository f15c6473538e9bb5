//! Managed resource adapters
//!
//! Each adapter converts a prepared attribute map into a typed model, calls
//! the Firezone client and builds state from the server's response only.

pub mod device;
pub mod rule;
pub mod user;

use std::collections::HashMap;

use firezone_client::Error as ClientError;
use firezone_core::provider::ProviderError;
use firezone_core::resource::{ResourceId, Value};

pub use device::DeviceResource;
pub use rule::RuleResource;
pub use user::UserResource;

/// Wrap a client failure as "Unable to <action> <kind>"
pub(crate) fn client_error(
    action: &str,
    kind: &str,
    id: &ResourceId,
    err: ClientError,
) -> ProviderError {
    ProviderError::client(format!("Unable to {} {}", action, kind))
        .with_not_found(err.is_not_found())
        .with_cause(err)
        .for_resource(id.clone())
}

/// Read a string the schema marks required
pub(crate) fn required_string(
    attributes: &HashMap<String, Value>,
    key: &str,
    id: &ResourceId,
) -> Result<String, ProviderError> {
    attributes
        .get(key)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| {
            ProviderError::validation(format!("Required attribute '{}' is missing", key))
                .for_resource(id.clone())
        })
}

/// Read an optional string; empty counts as unset
pub(crate) fn optional_string(attributes: &HashMap<String, Value>, key: &str) -> Option<String> {
    attributes
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// State value for an optional server string; absent becomes ""
pub(crate) fn string_value(value: Option<String>) -> Value {
    Value::String(value.unwrap_or_default())
}
