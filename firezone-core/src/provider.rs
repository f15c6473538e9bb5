//! Provider - Traits abstracting resource operations
//!
//! A Provider owns a set of resource adapters and data source adapters, one
//! per entity kind, and dispatches lifecycle operations to them by type name.
//! Adapters translate between attribute maps and the remote service.

use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceId, State};
use crate::schema::{ResourceSchema, TypeError};

/// Category of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Provider setup is incomplete (missing endpoint or credential)
    Configuration,
    /// A field value is malformed; no remote call was made
    Validation,
    /// The remote call failed
    Client,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "Configuration Error"),
            ErrorKind::Validation => write!(f, "Validation Error"),
            ErrorKind::Client => write!(f, "Client Error"),
        }
    }
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
    pub resource_id: Option<ResourceId>,
    /// Remote service reported that the entity does not exist
    pub not_found: bool,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}] {}: {}", id, self.kind, self.message)?;
        } else {
            write!(f, "{}: {}", self.kind, self.message)?;
        }
        if let Some(ref cause) = self.cause {
            write!(f, ", got error: {}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            resource_id: None,
            not_found: false,
            cause: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn client(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Client, message)
    }

    /// Collapse schema errors into a single validation error
    pub fn from_type_errors(errors: &[TypeError]) -> Self {
        let message = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Self::validation(message)
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn with_not_found(mut self, not_found: bool) -> Self {
        self.not_found = not_found;
        self
    }

    pub fn is_configuration(&self) -> bool {
        self.kind == ErrorKind::Configuration
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    pub fn is_client(&self) -> bool {
        self.kind == ErrorKind::Client
    }

    pub fn is_not_found(&self) -> bool {
        self.is_client() && self.not_found
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Definition of resource types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "firezone_user")
    fn name(&self) -> &'static str;

    /// Attribute schema for this resource type
    fn schema(&self) -> ResourceSchema;

    /// Apply defaults and validate desired attributes against the schema
    fn prepare(&self, resource: &Resource) -> ProviderResult<Resource> {
        let schema = self.schema();
        let mut prepared = resource.clone();
        prepared.attributes = schema.with_defaults(&resource.attributes);
        schema.validate(&prepared.attributes).map_err(|errors| {
            ProviderError::from_type_errors(&errors).for_resource(resource.id.clone())
        })?;
        Ok(prepared)
    }
}

/// Lifecycle of a managed resource kind
///
/// Every successful operation returns state built entirely from the server's
/// response; adapters never fabricate values.
pub trait ResourceAdapter: ResourceType {
    /// Create a resource
    ///
    /// Returns State with identifier set to the server-assigned id
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Get the current state of a resource by its server-assigned id
    fn read(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource in place, sending the full desired attribute set
    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource
    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>>;

    /// Seed state from an externally supplied identifier
    ///
    /// Only the identifier is set; a subsequent read fills in the rest.
    fn import(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
        if identifier.is_empty() {
            return Err(
                ProviderError::validation("import identifier must not be empty")
                    .for_resource(id.clone()),
            );
        }
        Ok(State::imported(id.clone(), identifier))
    }
}

/// Read-only lookup of a remote entity
pub trait DataSourceAdapter: ResourceType {
    /// Read the entity selected by the data source configuration
    fn read(&self, config: &Resource) -> BoxFuture<'_, ProviderResult<State>>;
}

/// Main Provider trait
///
/// All operations are async and involve side effects.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "firezone")
    fn name(&self) -> &'static str;

    /// Schemas of the resource types this Provider can manage
    fn resource_schemas(&self) -> Vec<ResourceSchema>;

    /// Schemas of the data sources this Provider can read
    fn data_source_schemas(&self) -> Vec<ResourceSchema>;

    /// Get the current state of a resource
    ///
    /// Returns `State::not_found()` when no identifier is known yet.
    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource
    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource
    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>>;

    /// Import a resource by its bare identifier
    fn import(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State>;

    /// Read a data source
    fn read_data_source(&self, config: &Resource) -> BoxFuture<'_, ProviderResult<State>>;
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_schemas(&self) -> Vec<ResourceSchema> {
        (**self).resource_schemas()
    }

    fn data_source_schemas(&self) -> Vec<ResourceSchema> {
        (**self).data_source_schemas()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read(id, identifier)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(id, identifier, to)
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(id, identifier)
    }

    fn import(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
        (**self).import(id, identifier)
    }

    fn read_data_source(&self, config: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read_data_source(config)
    }
}
