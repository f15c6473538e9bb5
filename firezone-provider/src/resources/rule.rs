//! firezone_rule resource

use std::collections::HashMap;
use std::sync::Arc;

use firezone_client::{FirezoneApi, Rule, RuleRequest};
use firezone_core::provider::{BoxFuture, ProviderResult, ResourceAdapter, ResourceType};
use firezone_core::resource::{Resource, ResourceId, State, Value};
use firezone_core::schema::ResourceSchema;
use log::trace;

use super::{client_error, optional_string, required_string, string_value};
use crate::schemas::rule as rule_schema;

/// Desired rule fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleModel {
    /// `None` applies the rule to every user
    pub user_id: Option<String>,
    pub action: String,
    pub destination: String,
    pub port_range: String,
    pub port_type: String,
}

impl RuleModel {
    pub fn from_resource(resource: &Resource) -> ProviderResult<Self> {
        let attrs = &resource.attributes;
        let id = &resource.id;
        Ok(Self {
            user_id: optional_string(attrs, "user_id"),
            action: required_string(attrs, "action", id)?,
            destination: required_string(attrs, "destination", id)?,
            port_range: required_string(attrs, "port_range", id)?,
            port_type: required_string(attrs, "port_type", id)?,
        })
    }

    pub fn to_request(&self) -> RuleRequest {
        RuleRequest {
            user_id: self.user_id.clone(),
            action: self.action.clone(),
            destination: self.destination.clone(),
            port_range: self.port_range.clone(),
            port_type: self.port_type.clone(),
        }
    }
}

fn rule_attributes(rule: Rule) -> HashMap<String, Value> {
    HashMap::from([
        ("id".to_string(), Value::String(rule.id)),
        ("user_id".to_string(), string_value(rule.user_id)),
        ("action".to_string(), Value::String(rule.action)),
        ("destination".to_string(), Value::String(rule.destination)),
        ("port_range".to_string(), string_value(rule.port_range)),
        ("port_type".to_string(), string_value(rule.port_type)),
        ("created_at".to_string(), string_value(rule.created_at)),
        ("updated_at".to_string(), string_value(rule.updated_at)),
    ])
}

fn rule_state(id: ResourceId, rule: Rule) -> State {
    let identifier = rule.id.clone();
    State::existing(id, rule_attributes(rule)).with_identifier(identifier)
}

/// Adapter for `firezone_rule`
pub struct RuleResource {
    client: Arc<dyn FirezoneApi>,
}

impl RuleResource {
    pub fn new(client: Arc<dyn FirezoneApi>) -> Self {
        Self { client }
    }
}

impl ResourceType for RuleResource {
    fn name(&self) -> &'static str {
        rule_schema::RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        rule_schema::schema()
    }
}

impl ResourceAdapter for RuleResource {
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let prepared = self.prepare(resource);
        Box::pin(async move {
            let resource = prepared?;
            let model = RuleModel::from_resource(&resource)?;
            let rule = self
                .client
                .create_rule(&model.to_request())
                .await
                .map_err(|e| client_error("create", "rule", &resource.id, e))?;
            trace!("created a rule resource {} ({})", resource.id, rule.id);
            Ok(rule_state(resource.id, rule))
        })
    }

    fn read(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            let rule = self
                .client
                .get_rule(&identifier)
                .await
                .map_err(|e| client_error("read", "rule", &id, e))?;
            trace!("read a rule resource {} ({})", id, rule.id);
            Ok(rule_state(id, rule))
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
            let model = RuleModel::from_resource(&resource)?;
            let rule = self
                .client
                .update_rule(&identifier, &model.to_request())
                .await
                .map_err(|e| client_error("update", "rule", &id, e))?;
            trace!("updated a rule resource {} ({})", id, identifier);
            Ok(rule_state(id, rule))
        })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            self.client
                .delete_rule(&identifier)
                .await
                .map_err(|e| client_error("delete", "rule", &id, e))?;
            trace!("deleted a rule resource {} ({})", id, identifier);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubApi;

    fn rule(action: &str, port_range: &str, port_type: &str) -> Resource {
        Resource::new("firezone_rule", "test")
            .with_attribute("action", action)
            .with_attribute("destination", "10.0.0.0/8")
            .with_attribute("port_range", port_range)
            .with_attribute("port_type", port_type)
    }

    #[tokio::test]
    async fn valid_rules_are_accepted() {
        let stub = Arc::new(StubApi::default());
        let adapter = RuleResource::new(stub.clone());

        for (action, port_range, port_type) in [
            ("accept", "443", "tcp"),
            ("drop", "0 - 65535", "udp"),
            ("drop", "1 - 1024", "tcp"),
        ] {
            let state = adapter
                .create(&rule(action, port_range, port_type))
                .await
                .unwrap();
            assert_eq!(state.get_string("action"), Some(action));
            assert_eq!(state.get_string("port_range"), Some(port_range));
            assert_eq!(state.get_string("port_type"), Some(port_type));
        }
        assert_eq!(stub.calls().len(), 3);
    }

    #[tokio::test]
    async fn invalid_rules_never_reach_the_client() {
        let stub = Arc::new(StubApi::default());
        let adapter = RuleResource::new(stub.clone());

        for (action, port_range, port_type) in [
            ("allow", "443", "tcp"),
            ("accept", "0-65535", "tcp"),
            ("accept", "443", "icmp"),
            ("accept", "", "tcp"),
        ] {
            let err = adapter
                .create(&rule(action, port_range, port_type))
                .await
                .unwrap_err();
            assert!(err.is_validation(), "{:?}", err);

            let id = ResourceId::new("firezone_rule", "test");
            let err = adapter
                .update(&id, "example-id", &rule(action, port_range, port_type))
                .await
                .unwrap_err();
            assert!(err.is_validation(), "{:?}", err);
        }
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn destination_must_be_an_address() {
        let stub = Arc::new(StubApi::default());
        let adapter = RuleResource::new(stub.clone());

        let resource = rule("drop", "443", "tcp").with_attribute("destination", "");
        let err = adapter.create(&resource).await.unwrap_err();
        assert!(err.is_validation());
        assert!(err.message.contains("'destination'"));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn account_wide_rule_reads_back_empty_user() {
        let stub = Arc::new(StubApi::default());
        let adapter = RuleResource::new(stub);

        let created = adapter.create(&rule("drop", "443", "tcp")).await.unwrap();
        assert_eq!(created.get_string("user_id"), Some(""));

        let read = adapter.read(&created.id, "example-id").await.unwrap();
        assert_eq!(created, read);
    }

    #[test]
    fn user_scoped_rule_sends_user_id() {
        let model =
            RuleModel::from_resource(&rule("accept", "53", "udp").with_attribute("user_id", "u1"))
                .unwrap();
        assert_eq!(model.to_request().user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn every_configurable_field_forces_replacement() {
        assert_eq!(
            rule_schema::schema().replace_triggers(),
            vec!["action", "destination", "port_range", "port_type", "user_id"]
        );
    }

    #[tokio::test]
    async fn delete_then_read_is_not_found() {
        let stub = Arc::new(StubApi::default());
        let adapter = RuleResource::new(stub);

        let created = adapter.create(&rule("drop", "443", "tcp")).await.unwrap();
        adapter.delete(&created.id, "example-id").await.unwrap();
        let err = adapter.read(&created.id, "example-id").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
