//! firezone_device resource
//!
//! Each `use_default_*` flag hands its value field to the server: while the
//! flag is true the value is left out of the request and read back from the
//! response instead.

use std::collections::HashMap;
use std::sync::Arc;

use firezone_client::{Device, DeviceRequest, FirezoneApi};
use firezone_core::provider::{
    BoxFuture, ProviderError, ProviderResult, ResourceAdapter, ResourceType,
};
use firezone_core::resource::{Resource, ResourceId, State, Value};
use firezone_core::schema::ResourceSchema;
use log::{Level, log_enabled, trace};
use secrecy::{ExposeSecret, SecretString};

use super::{client_error, optional_string, required_string, string_value};
use crate::schemas::device as device_schema;

/// Desired device fields
#[derive(Debug, Clone)]
pub struct DeviceModel {
    pub user_id: String,
    pub name: String,
    pub public_key: String,
    pub description: Option<String>,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    pub allowed_ips: Option<Vec<String>>,
    pub dns: Option<Vec<String>>,
    pub endpoint: Option<String>,
    pub mtu: Option<u16>,
    pub persistent_keepalive: Option<u16>,
    pub preshared_key: Option<SecretString>,
    pub use_default_allowed_ips: bool,
    pub use_default_dns: bool,
    pub use_default_endpoint: bool,
    pub use_default_mtu: bool,
    pub use_default_persistent_keepalive: bool,
}

impl DeviceModel {
    pub fn from_resource(resource: &Resource) -> ProviderResult<Self> {
        let attrs = &resource.attributes;
        let id = &resource.id;
        let flag = |key: &str| attrs.get(key).and_then(Value::as_bool).unwrap_or(true);
        let list = |key: &str| attrs.get(key).and_then(Value::as_string_list);

        Ok(Self {
            user_id: required_string(attrs, "user_id", id)?,
            name: required_string(attrs, "name", id)?,
            public_key: required_string(attrs, "public_key", id)?,
            description: optional_string(attrs, "description"),
            ipv4: optional_string(attrs, "ipv4"),
            ipv6: optional_string(attrs, "ipv6"),
            allowed_ips: list("allowed_ips"),
            dns: list("dns"),
            endpoint: optional_string(attrs, "endpoint"),
            mtu: u16_attribute(attrs, "mtu", id)?,
            persistent_keepalive: u16_attribute(attrs, "persistent_keepalive", id)?,
            preshared_key: optional_string(attrs, "preshared_key").map(SecretString::from),
            use_default_allowed_ips: flag("use_default_allowed_ips"),
            use_default_dns: flag("use_default_dns"),
            use_default_endpoint: flag("use_default_endpoint"),
            use_default_mtu: flag("use_default_mtu"),
            use_default_persistent_keepalive: flag("use_default_persistent_keepalive"),
        })
    }

    /// Request body; values whose default flag is on are omitted
    pub fn to_request(&self) -> DeviceRequest {
        fn unless<T: Clone>(use_default: bool, value: &Option<T>) -> Option<T> {
            if use_default { None } else { value.clone() }
        }

        DeviceRequest {
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            public_key: self.public_key.clone(),
            description: self.description.clone(),
            ipv4: self.ipv4.clone(),
            ipv6: self.ipv6.clone(),
            allowed_ips: unless(self.use_default_allowed_ips, &self.allowed_ips),
            dns: unless(self.use_default_dns, &self.dns),
            endpoint: unless(self.use_default_endpoint, &self.endpoint),
            mtu: unless(self.use_default_mtu, &self.mtu),
            persistent_keepalive: unless(
                self.use_default_persistent_keepalive,
                &self.persistent_keepalive,
            ),
            preshared_key: self.preshared_key.clone(),
            use_default_allowed_ips: self.use_default_allowed_ips,
            use_default_dns: self.use_default_dns,
            use_default_endpoint: self.use_default_endpoint,
            use_default_mtu: self.use_default_mtu,
            use_default_persistent_keepalive: self.use_default_persistent_keepalive,
        }
    }
}

/// Schema range checks run first, so this only guards the narrowing
fn u16_attribute(
    attrs: &HashMap<String, Value>,
    key: &str,
    id: &ResourceId,
) -> ProviderResult<Option<u16>> {
    attrs
        .get(key)
        .and_then(Value::as_int)
        .map(|n| {
            u16::try_from(n).map_err(|_| {
                ProviderError::validation(format!("Attribute '{}': {} is out of range", key, n))
                    .for_resource(id.clone())
            })
        })
        .transpose()
}

/// Every device field as returned by the server
///
/// Absent strings become `""`. `mtu` and `persistent_keepalive` have no empty
/// integer, so a `null` from the server leaves them out of the map; hosts
/// must replace state wholesale rather than merge it.
fn device_attributes(device: Device) -> HashMap<String, Value> {
    let mut attrs = HashMap::from([
        ("id".to_string(), Value::String(device.id)),
        ("user_id".to_string(), Value::String(device.user_id)),
        ("name".to_string(), Value::String(device.name)),
        ("public_key".to_string(), Value::String(device.public_key)),
        ("description".to_string(), string_value(device.description)),
        ("ipv4".to_string(), string_value(device.ipv4)),
        ("ipv6".to_string(), string_value(device.ipv6)),
        (
            "allowed_ips".to_string(),
            Value::string_list(device.allowed_ips),
        ),
        ("dns".to_string(), Value::string_list(device.dns)),
        ("endpoint".to_string(), string_value(device.endpoint)),
        (
            "preshared_key".to_string(),
            string_value(
                device
                    .preshared_key
                    .map(|key| key.expose_secret().to_string()),
            ),
        ),
        (
            "use_default_allowed_ips".to_string(),
            Value::Bool(device.use_default_allowed_ips),
        ),
        (
            "use_default_dns".to_string(),
            Value::Bool(device.use_default_dns),
        ),
        (
            "use_default_endpoint".to_string(),
            Value::Bool(device.use_default_endpoint),
        ),
        (
            "use_default_mtu".to_string(),
            Value::Bool(device.use_default_mtu),
        ),
        (
            "use_default_persistent_keepalive".to_string(),
            Value::Bool(device.use_default_persistent_keepalive),
        ),
        ("created_at".to_string(), string_value(device.created_at)),
        ("updated_at".to_string(), string_value(device.updated_at)),
    ]);
    if let Some(mtu) = device.mtu {
        attrs.insert("mtu".to_string(), Value::Int(i64::from(mtu)));
    }
    if let Some(keepalive) = device.persistent_keepalive {
        attrs.insert(
            "persistent_keepalive".to_string(),
            Value::Int(i64::from(keepalive)),
        );
    }
    attrs
}

fn device_state(id: ResourceId, device: Device) -> State {
    let identifier = device.id.clone();
    State::existing(id, device_attributes(device)).with_identifier(identifier)
}

/// Adapter for `firezone_device`
pub struct DeviceResource {
    client: Arc<dyn FirezoneApi>,
}

impl DeviceResource {
    pub fn new(client: Arc<dyn FirezoneApi>) -> Self {
        Self { client }
    }

    fn log_state(&self, action: &str, state: &State) {
        if !log_enabled!(Level::Trace) {
            return;
        }
        trace!(
            "{} a device resource {}: {:?}",
            action,
            state.id,
            self.schema().redact(&state.attributes)
        );
    }
}

impl ResourceType for DeviceResource {
    fn name(&self) -> &'static str {
        device_schema::RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        device_schema::schema()
    }
}

impl ResourceAdapter for DeviceResource {
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let prepared = self.prepare(resource);
        Box::pin(async move {
            let resource = prepared?;
            let model = DeviceModel::from_resource(&resource)?;
            let device = self
                .client
                .create_device(&model.to_request())
                .await
                .map_err(|e| client_error("create", "device", &resource.id, e))?;
            let state = device_state(resource.id, device);
            self.log_state("created", &state);
            Ok(state)
        })
    }

    fn read(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            let device = self
                .client
                .get_device(&identifier)
                .await
                .map_err(|e| client_error("read", "device", &id, e))?;
            let state = device_state(id, device);
            self.log_state("read", &state);
            Ok(state)
        })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let prepared = self.prepare(to);
        Box::pin(async move {
            let resource = prepared?;
            let model = DeviceModel::from_resource(&resource)?;
            let device = self
                .client
                .update_device(&identifier, &model.to_request())
                .await
                .map_err(|e| client_error("update", "device", &id, e))?;
            let state = device_state(id, device);
            self.log_state("updated", &state);
            Ok(state)
        })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            self.client
                .delete_device(&identifier)
                .await
                .map_err(|e| client_error("delete", "device", &id, e))?;
            trace!("deleted a device resource {} ({})", id, identifier);
            Ok(())
        })
    }
}
