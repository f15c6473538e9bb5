//! firezone_user resource

use std::collections::HashMap;
use std::sync::Arc;

use firezone_client::{FirezoneApi, User, UserRequest};
use firezone_core::provider::{BoxFuture, ProviderResult, ResourceAdapter, ResourceType};
use firezone_core::resource::{Resource, ResourceId, State, Value};
use firezone_core::schema::ResourceSchema;
use log::trace;

use super::{client_error, optional_string, required_string, string_value};
use crate::schemas::user as user_schema;

/// Desired user fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserModel {
    pub email: String,
    pub role: String,
    /// `None` while the user is active; sent as `null` to re-enable
    pub disabled_at: Option<String>,
}

impl UserModel {
    pub fn from_resource(resource: &Resource) -> ProviderResult<Self> {
        let attrs = &resource.attributes;
        Ok(Self {
            email: required_string(attrs, "email", &resource.id)?,
            role: required_string(attrs, "role", &resource.id)?,
            disabled_at: optional_string(attrs, "disabled_at"),
        })
    }

    pub fn to_request(&self) -> UserRequest {
        UserRequest {
            email: self.email.clone(),
            role: self.role.clone(),
            disabled_at: self.disabled_at.clone(),
        }
    }
}

/// Every user field as returned by the server
pub(crate) fn user_attributes(user: User) -> HashMap<String, Value> {
    HashMap::from([
        ("id".to_string(), Value::String(user.id)),
        ("email".to_string(), Value::String(user.email)),
        ("role".to_string(), Value::String(user.role)),
        ("disabled_at".to_string(), string_value(user.disabled_at)),
        (
            "last_signed_in_at".to_string(),
            string_value(user.last_signed_in_at),
        ),
        (
            "last_signed_in_method".to_string(),
            string_value(user.last_signed_in_method),
        ),
        ("created_at".to_string(), string_value(user.created_at)),
        ("updated_at".to_string(), string_value(user.updated_at)),
    ])
}

pub(crate) fn user_state(id: ResourceId, user: User) -> State {
    let identifier = user.id.clone();
    State::existing(id, user_attributes(user)).with_identifier(identifier)
}

/// Adapter for `firezone_user`
pub struct UserResource {
    client: Arc<dyn FirezoneApi>,
}

impl UserResource {
    pub fn new(client: Arc<dyn FirezoneApi>) -> Self {
        Self { client }
    }
}

impl ResourceType for UserResource {
    fn name(&self) -> &'static str {
        user_schema::RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        user_schema::schema()
    }
}

impl ResourceAdapter for UserResource {
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let prepared = self.prepare(resource);
        Box::pin(async move {
            let resource = prepared?;
            let model = UserModel::from_resource(&resource)?;
            let user = self
                .client
                .create_user(&model.to_request())
                .await
                .map_err(|e| client_error("create", "user", &resource.id, e))?;
            trace!("created a user resource {} ({})", resource.id, user.id);
            Ok(user_state(resource.id, user))
        })
    }

    fn read(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            let user = self
                .client
                .get_user(&identifier)
                .await
                .map_err(|e| client_error("read", "user", &id, e))?;
            trace!("read a user resource {} ({})", id, user.id);
            Ok(user_state(id, user))
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
            let model = UserModel::from_resource(&resource)?;
            let user = self
                .client
                .update_user(&identifier, &model.to_request())
                .await
                .map_err(|e| client_error("update", "user", &id, e))?;
            trace!("updated a user resource {} ({})", id, identifier);
            Ok(user_state(id, user))
        })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            self.client
                .delete_user(&identifier)
                .await
                .map_err(|e| client_error("delete", "user", &id, e))?;
            trace!("deleted a user resource {} ({})", id, identifier);
            Ok(())
        })
    }
}
