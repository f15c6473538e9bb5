//! firezone_user data source

use std::sync::Arc;

use firezone_client::FirezoneApi;
use firezone_core::provider::{
    BoxFuture, DataSourceAdapter, ProviderError, ProviderResult, ResourceType,
};
use firezone_core::resource::{Resource, State};
use firezone_core::schema::ResourceSchema;
use log::trace;

use crate::resources::{client_error, optional_string, user::user_state};
use crate::schemas::user as user_schema;

/// Looks a user up by `id`, falling back to `email`
pub struct UserDataSource {
    client: Arc<dyn FirezoneApi>,
}

impl UserDataSource {
    pub fn new(client: Arc<dyn FirezoneApi>) -> Self {
        Self { client }
    }
}

impl ResourceType for UserDataSource {
    fn name(&self) -> &'static str {
        user_schema::RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        user_schema::data_source_schema()
    }
}

impl DataSourceAdapter for UserDataSource {
    fn read(&self, config: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let prepared = self.prepare(config);
        Box::pin(async move {
            let config = prepared?;
            let key = optional_string(&config.attributes, "id")
                .or_else(|| optional_string(&config.attributes, "email"))
                .ok_or_else(|| {
                    ProviderError::validation("either 'id' or 'email' must be set")
                        .for_resource(config.id.clone())
                })?;

            let user = self
                .client
                .get_user(&key)
                .await
                .map_err(|e| client_error("read", "user", &config.id, e))?;
            trace!("read a user data source {} ({})", config.id, user.id);
            Ok(user_state(config.id, user))
        })
    }
}
