//! In-memory Firezone service for adapter tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use firezone_client::{
    Device, DeviceRequest, Error, FirezoneApi, Result, Rule, RuleRequest, User, UserRequest,
};
use secrecy::SecretString;

const TIMESTAMP: &str = "2023-01-01T00:00:00.000000Z";

/// Records every call and keeps entities in maps keyed by id
///
/// Updates behave like the server: fields the request leaves out keep their
/// stored value, explicit `null`s clear them.
///
/// Ids are handed out as `example-id`, `example-id-2`, ... in creation order.
#[derive(Default)]
pub(crate) struct StubApi {
    users: Mutex<HashMap<String, User>>,
    devices: Mutex<HashMap<String, Device>>,
    rules: Mutex<HashMap<String, Rule>>,
    calls: Mutex<Vec<String>>,
    created: Mutex<usize>,
    failures: Mutex<VecDeque<u16>>,
}

impl StubApi {
    /// Names of the client methods called so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Make the next call fail with `status`
    pub fn fail_with(&self, status: u16) {
        self.failures.lock().unwrap().push_back(status);
    }

    /// Seed a user as if it had been created out of band
    pub fn insert_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }

    fn record(&self, call: &str) -> Result<()> {
        self.calls.lock().unwrap().push(call.to_string());
        match self.failures.lock().unwrap().pop_front() {
            Some(status) => Err(Error::Api {
                status,
                message: "injected failure".to_string(),
            }),
            None => Ok(()),
        }
    }

    fn next_id(&self) -> String {
        let mut created = self.created.lock().unwrap();
        *created += 1;
        if *created == 1 {
            "example-id".to_string()
        } else {
            format!("example-id-{}", *created)
        }
    }
}

fn not_found() -> Error {
    Error::Api {
        status: 404,
        message: "Not Found".to_string(),
    }
}

fn user_from(id: String, request: &UserRequest) -> User {
    User {
        id,
        email: request.email.clone(),
        role: request.role.clone(),
        disabled_at: request.disabled_at.clone(),
        last_signed_in_at: None,
        last_signed_in_method: None,
        created_at: Some(TIMESTAMP.to_string()),
        updated_at: Some(TIMESTAMP.to_string()),
    }
}

/// Apply the server's defaults for every flag left on
fn device_from(id: String, request: &DeviceRequest) -> Device {
    let or_default = |flag: bool, value: Option<Vec<String>>, default: &[&str]| -> Vec<String> {
        if flag {
            default.iter().map(|s| s.to_string()).collect()
        } else {
            value.unwrap_or_default()
        }
    };
    Device {
        user_id: request.user_id.clone(),
        name: request.name.clone(),
        public_key: request.public_key.clone(),
        description: request.description.clone(),
        ipv4: Some(request.ipv4.clone().unwrap_or_else(|| "10.3.2.2".to_string())),
        ipv6: Some(request.ipv6.clone().unwrap_or_else(|| "fd00::3:2:2".to_string())),
        allowed_ips: or_default(
            request.use_default_allowed_ips,
            request.allowed_ips.clone(),
            &["0.0.0.0/0", "::/0"],
        ),
        dns: or_default(request.use_default_dns, request.dns.clone(), &["1.1.1.1"]),
        endpoint: if request.use_default_endpoint {
            Some("vpn.example.com".to_string())
        } else {
            request.endpoint.clone()
        },
        mtu: if request.use_default_mtu {
            Some(1280)
        } else {
            request.mtu
        },
        persistent_keepalive: if request.use_default_persistent_keepalive {
            Some(25)
        } else {
            request.persistent_keepalive
        },
        preshared_key: Some(
            request
                .preshared_key
                .clone()
                .unwrap_or_else(|| SecretString::from("generated-psk=".to_string())),
        ),
        use_default_allowed_ips: request.use_default_allowed_ips,
        use_default_dns: request.use_default_dns,
        use_default_endpoint: request.use_default_endpoint,
        use_default_mtu: request.use_default_mtu,
        use_default_persistent_keepalive: request.use_default_persistent_keepalive,
        created_at: Some(TIMESTAMP.to_string()),
        updated_at: Some(TIMESTAMP.to_string()),
        id,
    }
}

/// Fields the request leaves out keep their stored value
fn merge_device(existing: &Device, mut updated: Device, request: &DeviceRequest) -> Device {
    if request.ipv4.is_none() {
        updated.ipv4 = existing.ipv4.clone();
    }
    if request.ipv6.is_none() {
        updated.ipv6 = existing.ipv6.clone();
    }
    if request.allowed_ips.is_none() && !request.use_default_allowed_ips {
        updated.allowed_ips = existing.allowed_ips.clone();
    }
    if request.dns.is_none() && !request.use_default_dns {
        updated.dns = existing.dns.clone();
    }
    if request.endpoint.is_none() && !request.use_default_endpoint {
        updated.endpoint = existing.endpoint.clone();
    }
    if request.mtu.is_none() && !request.use_default_mtu {
        updated.mtu = existing.mtu;
    }
    if request.persistent_keepalive.is_none() && !request.use_default_persistent_keepalive {
        updated.persistent_keepalive = existing.persistent_keepalive;
    }
    if request.preshared_key.is_none() {
        updated.preshared_key = existing.preshared_key.clone();
    }
    updated.created_at = existing.created_at.clone();
    updated
}

fn rule_from(id: String, request: &RuleRequest) -> Rule {
    Rule {
        id,
        user_id: request.user_id.clone(),
        action: request.action.clone(),
        destination: request.destination.clone(),
        port_range: Some(request.port_range.clone()),
        port_type: Some(request.port_type.clone()),
        created_at: Some(TIMESTAMP.to_string()),
        updated_at: Some(TIMESTAMP.to_string()),
    }
}

#[async_trait]
impl FirezoneApi for StubApi {
    async fn create_user(&self, user: &UserRequest) -> Result<User> {
        self.record("create_user")?;
        let created = user_from(self.next_id(), user);
        self.insert_user(created.clone());
        Ok(created)
    }

    async fn get_user(&self, id_or_email: &str) -> Result<User> {
        self.record("get_user")?;
        let users = self.users.lock().unwrap();
        users
            .get(id_or_email)
            .or_else(|| users.values().find(|u| u.email == id_or_email))
            .cloned()
            .ok_or_else(not_found)
    }

    async fn update_user(&self, id: &str, user: &UserRequest) -> Result<User> {
        self.record("update_user")?;
        let mut users = self.users.lock().unwrap();
        let existing = users.get_mut(id).ok_or_else(not_found)?;
        let updated = User {
            last_signed_in_at: existing.last_signed_in_at.take(),
            last_signed_in_method: existing.last_signed_in_method.take(),
            created_at: existing.created_at.take(),
            ..user_from(id.to_string(), user)
        };
        *existing = updated;
        Ok(existing.clone())
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        self.record("delete_user")?;
        self.users.lock().unwrap().remove(id).map(|_| ()).ok_or_else(not_found)
    }

    async fn create_device(&self, device: &DeviceRequest) -> Result<Device> {
        self.record("create_device")?;
        let created = device_from(self.next_id(), device);
        self.devices
            .lock()
            .unwrap()
            .insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn get_device(&self, id: &str) -> Result<Device> {
        self.record("get_device")?;
        self.devices.lock().unwrap().get(id).cloned().ok_or_else(not_found)
    }

    async fn update_device(&self, id: &str, device: &DeviceRequest) -> Result<Device> {
        self.record("update_device")?;
        let mut devices = self.devices.lock().unwrap();
        let existing = devices.get_mut(id).ok_or_else(not_found)?;
        let updated = merge_device(existing, device_from(id.to_string(), device), device);
        *existing = updated;
        Ok(existing.clone())
    }

    async fn delete_device(&self, id: &str) -> Result<()> {
        self.record("delete_device")?;
        self.devices.lock().unwrap().remove(id).map(|_| ()).ok_or_else(not_found)
    }

    async fn create_rule(&self, rule: &RuleRequest) -> Result<Rule> {
        self.record("create_rule")?;
        let created = rule_from(self.next_id(), rule);
        self.rules
            .lock()
            .unwrap()
            .insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn get_rule(&self, id: &str) -> Result<Rule> {
        self.record("get_rule")?;
        self.rules.lock().unwrap().get(id).cloned().ok_or_else(not_found)
    }

    async fn update_rule(&self, id: &str, rule: &RuleRequest) -> Result<Rule> {
        self.record("update_rule")?;
        let mut rules = self.rules.lock().unwrap();
        let existing = rules.get_mut(id).ok_or_else(not_found)?;
        *existing = rule_from(id.to_string(), rule);
        Ok(existing.clone())
    }

    async fn delete_rule(&self, id: &str) -> Result<()> {
        self.record("delete_rule")?;
        self.rules.lock().unwrap().remove(id).map(|_| ()).ok_or_else(not_found)
    }
}
