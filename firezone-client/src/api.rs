//! The remote entity surface adapters depend on

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Device, DeviceRequest, Rule, RuleRequest, User, UserRequest};

/// Typed create/get/update/delete calls for every entity kind
///
/// `Client` is the production implementation; tests substitute stubs.
#[async_trait]
pub trait FirezoneApi: Send + Sync {
    async fn create_user(&self, user: &UserRequest) -> Result<User>;

    /// Look a user up by id or by email address
    async fn get_user(&self, id_or_email: &str) -> Result<User>;

    async fn update_user(&self, id: &str, user: &UserRequest) -> Result<User>;

    async fn delete_user(&self, id: &str) -> Result<()>;

    async fn create_device(&self, device: &DeviceRequest) -> Result<Device>;

    async fn get_device(&self, id: &str) -> Result<Device>;

    async fn update_device(&self, id: &str, device: &DeviceRequest) -> Result<Device>;

    async fn delete_device(&self, id: &str) -> Result<()>;

    async fn create_rule(&self, rule: &RuleRequest) -> Result<Rule>;

    async fn get_rule(&self, id: &str) -> Result<Rule>;

    async fn update_rule(&self, id: &str, rule: &RuleRequest) -> Result<Rule>;

    async fn delete_rule(&self, id: &str) -> Result<()>;
}
