//! Firezone Provider
//!
//! Manages Firezone users, WireGuard devices and egress firewall rules, and
//! looks up existing users. One client is built at configure time and shared
//! by every adapter.

pub mod config;
pub mod data_sources;
pub mod resources;
pub mod schemas;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use firezone_client::{Client, FirezoneApi};
use firezone_core::provider::{
    BoxFuture, DataSourceAdapter, Provider, ProviderError, ProviderResult, ResourceAdapter,
};
use firezone_core::resource::{Resource, ResourceId, State};
use firezone_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use log::debug;

pub use config::{ProviderConfig, ResolvedConfig};
use data_sources::UserDataSource;
use resources::{DeviceResource, RuleResource, UserResource};

/// Provider type name; resource types are prefixed with it
pub const PROVIDER_NAME: &str = "firezone";

/// Firezone Provider
pub struct FirezoneProvider {
    version: String,
    resources: Vec<Box<dyn ResourceAdapter>>,
    data_sources: Vec<Box<dyn DataSourceAdapter>>,
}

impl FirezoneProvider {
    /// Schema of the provider block itself
    pub fn schema() -> ResourceSchema {
        ResourceSchema::new(PROVIDER_NAME)
            .with_description("Interact with a Firezone server")
            .attribute(
                AttributeSchema::new("endpoint", AttributeType::String)
                    .with_description("Firezone API endpoint; defaults to FIREZONE_ENDPOINT"),
            )
            .attribute(
                AttributeSchema::new("api_key", AttributeType::String)
                    .sensitive()
                    .with_description("Firezone API key; defaults to FIREZONE_API_KEY"),
            )
    }

    /// Resolve configuration, build the client and register every adapter
    pub fn configure(version: impl Into<String>, config: &ProviderConfig) -> ProviderResult<Self> {
        if let Err(errors) = Self::schema().validate(&config.attributes) {
            let message = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ProviderError::configuration(message));
        }

        let resolved = config.resolve()?;
        let client = Client::new(&resolved.endpoint, &resolved.api_key).map_err(|e| {
            ProviderError::configuration("Unable to create firezone client").with_cause(e)
        })?;
        debug!("configured firezone client for {}", client.base_url());

        Ok(Self::with_client(version, Arc::new(client)))
    }

    /// Register every adapter against an existing client
    pub fn with_client(version: impl Into<String>, client: Arc<dyn FirezoneApi>) -> Self {
        Self {
            version: version.into(),
            resources: vec![
                Box::new(UserResource::new(client.clone())),
                Box::new(DeviceResource::new(client.clone())),
                Box::new(RuleResource::new(client.clone())),
            ],
            data_sources: vec![Box::new(UserDataSource::new(client))],
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Names of the managed resource types
    pub fn resource_types(&self) -> Vec<&'static str> {
        self.resources.iter().map(|r| r.name()).collect()
    }

    /// Names of the data sources
    pub fn data_source_types(&self) -> Vec<&'static str> {
        self.data_sources.iter().map(|d| d.name()).collect()
    }

    fn resource(&self, id: &ResourceId) -> ProviderResult<&dyn ResourceAdapter> {
        self.resources
            .iter()
            .find(|r| r.name() == id.resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| {
                ProviderError::configuration(format!(
                    "Unknown resource type: {}",
                    id.resource_type
                ))
                .for_resource(id.clone())
            })
    }

    fn data_source(&self, id: &ResourceId) -> ProviderResult<&dyn DataSourceAdapter> {
        self.data_sources
            .iter()
            .find(|d| d.name() == id.resource_type)
            .map(|d| d.as_ref())
            .ok_or_else(|| {
                ProviderError::configuration(format!(
                    "Unknown data source type: {}",
                    id.resource_type
                ))
                .for_resource(id.clone())
            })
    }
}

/// Reject data source configs in lifecycle calls and managed configs in lookups
fn check_mode(resource: &Resource, data_source: bool) -> ProviderResult<()> {
    match (resource.is_data_source(), data_source) {
        (true, false) => Err(ProviderError::configuration(format!(
            "{} is a data source and cannot be managed",
            resource.id
        ))
        .for_resource(resource.id.clone())),
        (false, true) => Err(ProviderError::configuration(format!(
            "{} is a managed resource, not a data source",
            resource.id
        ))
        .for_resource(resource.id.clone())),
        _ => Ok(()),
    }
}

fn failed<'a, T: Send + 'a>(err: ProviderError) -> BoxFuture<'a, ProviderResult<T>> {
    Box::pin(async move { Err(err) })
}

impl Provider for FirezoneProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn resource_schemas(&self) -> Vec<ResourceSchema> {
        self.resources.iter().map(|r| r.schema()).collect()
    }

    fn data_source_schemas(&self) -> Vec<ResourceSchema> {
        self.data_sources.iter().map(|d| d.schema()).collect()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let adapter = match self.resource(id) {
            Ok(adapter) => adapter,
            Err(e) => return failed(e),
        };
        match identifier {
            Some(identifier) => adapter.read(id, identifier),
            None => {
                let id = id.clone();
                Box::pin(async move { Ok(State::not_found(id)) })
            }
        }
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        if let Err(e) = check_mode(resource, false) {
            return failed(e);
        }
        match self.resource(&resource.id) {
            Ok(adapter) => adapter.create(resource),
            Err(e) => failed(e),
        }
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        if let Err(e) = check_mode(to, false) {
            return failed(e);
        }
        match self.resource(id) {
            Ok(adapter) => adapter.update(id, identifier, to),
            Err(e) => failed(e),
        }
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        match self.resource(id) {
            Ok(adapter) => adapter.delete(id, identifier),
            Err(e) => failed(e),
        }
    }

    fn import(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
        self.resource(id)?.import(id, identifier)
    }

    fn read_data_source(&self, config: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        if let Err(e) = check_mode(config, true) {
            return failed(e);
        }
        match self.data_source(&config.id) {
            Ok(adapter) => adapter.read(config),
            Err(e) => failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubApi;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn provider() -> (Arc<StubApi>, FirezoneProvider) {
        init_logger();
        let stub = Arc::new(StubApi::default());
        let provider = FirezoneProvider::with_client("test", stub.clone());
        (stub, provider)
    }

    #[test]
    fn registers_every_type() {
        let (_, provider) = provider();
        assert_eq!(provider.name(), "firezone");
        assert_eq!(provider.version(), "test");
        assert_eq!(
            provider.resource_types(),
            vec!["firezone_user", "firezone_device", "firezone_rule"]
        );
        assert_eq!(provider.data_source_types(), vec!["firezone_user"]);
        assert_eq!(provider.resource_schemas().len(), 3);
        assert_eq!(provider.data_source_schemas().len(), 1);
    }

    #[test]
    fn provider_schema_marks_api_key_sensitive() {
        let schema = FirezoneProvider::schema();
        assert!(schema.attributes["api_key"].sensitive);
        assert!(!schema.attributes["endpoint"].sensitive);
        assert!(!schema.attributes["endpoint"].is_required());
    }

    #[test]
    fn configure_with_explicit_values() {
        let config = ProviderConfig::default()
            .with_endpoint("https://fz.example.com")
            .with_api_key("key");
        let provider = FirezoneProvider::configure("0.1.0", &config).unwrap();
        assert_eq!(provider.resource_types().len(), 3);
    }

    #[test]
    fn configure_rejects_bad_endpoint() {
        let config = ProviderConfig::default()
            .with_endpoint("not a url")
            .with_api_key("key");
        let err = FirezoneProvider::configure("0.1.0", &config).err().unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Unable to create firezone client"));
    }

    #[test]
    fn configure_rejects_unknown_attributes() {
        let mut config = ProviderConfig::default()
            .with_endpoint("https://fz.example.com")
            .with_api_key("key");
        config
            .attributes
            .insert("region".to_string(), "eu".into());
        let err = FirezoneProvider::configure("0.1.0", &config).err().unwrap();
        assert!(err.is_configuration());
        assert!(err.message.contains("Unknown attribute 'region'"));
    }

    #[tokio::test]
    async fn unknown_type_is_a_configuration_error() {
        let (stub, provider) = provider();
        let resource = Resource::new("firezone_group", "ops");
        let err = provider.create(&resource).await.unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "[firezone_group.ops] Configuration Error: Unknown resource type: firezone_group"
        );

        let err = provider
            .import(&ResourceId::new("firezone_group", "ops"), "x")
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn read_without_identifier_is_not_found() {
        let (stub, provider) = provider();
        let state = provider
            .read(&ResourceId::new("firezone_rule", "r"), None)
            .await
            .unwrap();
        assert!(!state.exists);
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn user_lifecycle_through_the_provider() {
        let (stub, provider) = provider();
        let id = ResourceId::new("firezone_user", "test");

        let plan = Resource::new("firezone_user", "test")
            .with_attribute("email", "one@example.com")
            .with_attribute("role", "unprivileged");
        let created = provider.create(&plan).await.unwrap();
        assert_eq!(created.identifier.as_deref(), Some("example-id"));

        let imported = provider.import(&id, "example-id").unwrap();
        let read = provider
            .read(&id, imported.identifier.as_deref())
            .await
            .unwrap();
        assert_eq!(read.attributes, created.attributes);

        let plan = plan.with_attribute("email", "two@example.com");
        let updated = provider.update(&id, "example-id", &plan).await.unwrap();
        assert_eq!(updated.get_string("email"), Some("two@example.com"));
        assert_eq!(updated.get_string("role"), Some("unprivileged"));

        provider.delete(&id, "example-id").await.unwrap();
        let err = provider.read(&id, Some("example-id")).await.unwrap_err();
        assert!(err.is_not_found());

        assert_eq!(
            stub.calls(),
            vec![
                "create_user",
                "get_user",
                "update_user",
                "delete_user",
                "get_user"
            ]
        );
    }

    #[tokio::test]
    async fn data_source_dispatch() {
        let (_, provider) = provider();
        let plan = Resource::new("firezone_user", "test")
            .with_attribute("email", "one@example.com")
            .with_attribute("role", "admin");
        provider.create(&plan).await.unwrap();

        let lookup = Resource::new("firezone_user", "lookup")
            .with_read_only(true)
            .with_attribute("email", "one@example.com");
        let state = provider.read_data_source(&lookup).await.unwrap();
        assert_eq!(state.get_string("id"), Some("example-id"));
        assert_eq!(state.get_string("role"), Some("admin"));
    }

    #[tokio::test]
    async fn data_sources_and_resources_are_not_interchangeable() {
        let (stub, provider) = provider();
        let lookup = Resource::new("firezone_user", "lookup")
            .with_read_only(true)
            .with_attribute("email", "one@example.com")
            .with_attribute("role", "admin");

        let err = provider.create(&lookup).await.unwrap_err();
        assert!(err.is_configuration());
        assert!(err.message.contains("is a data source"));

        let err = provider
            .update(&lookup.id, "example-id", &lookup)
            .await
            .unwrap_err();
        assert!(err.is_configuration());

        let managed = lookup.with_read_only(false);
        let err = provider.read_data_source(&managed).await.unwrap_err();
        assert!(err.is_configuration());
        assert!(err.message.contains("not a data source"));

        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn adapters_share_one_client() {
        let (stub, provider) = provider();
        let rule = Resource::new("firezone_rule", "dns")
            .with_attribute("action", "accept")
            .with_attribute("destination", "1.1.1.1")
            .with_attribute("port_range", "53")
            .with_attribute("port_type", "udp");
        let device = Resource::new("firezone_device", "laptop")
            .with_attribute("user_id", "example-id")
            .with_attribute("name", "laptop")
            .with_attribute("public_key", "pubkey=");

        let (rule, device) = tokio::join!(provider.create(&rule), provider.create(&device));
        let (rule, device) = (rule.unwrap(), device.unwrap());
        assert_ne!(rule.identifier, device.identifier);
        assert_eq!(stub.calls().len(), 2);
    }
}
