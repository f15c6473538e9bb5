//! WireGuard device schema definitions

use firezone_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::types as fz_types;

pub const RESOURCE_TYPE: &str = "firezone_device";

/// Value attributes paired with the flag that hands them to the server
///
/// While the flag is true the value is not sent and is read back instead.
pub const USE_DEFAULT_PAIRS: &[(&str, &str)] = &[
    ("use_default_allowed_ips", "allowed_ips"),
    ("use_default_dns", "dns"),
    ("use_default_endpoint", "endpoint"),
    ("use_default_mtu", "mtu"),
    ("use_default_persistent_keepalive", "persistent_keepalive"),
];

/// Schema for the `firezone_device` resource
pub fn schema() -> ResourceSchema {
    let mut schema = ResourceSchema::new(RESOURCE_TYPE)
        .with_description("A WireGuard device belonging to a Firezone user")
        .attribute(
            AttributeSchema::new("id", AttributeType::String)
                .computed()
                .with_description("Device identifier"),
        )
        .attribute(
            AttributeSchema::new("user_id", AttributeType::String)
                .required()
                .with_description("Owning user"),
        )
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("public_key", AttributeType::String)
                .required()
                .requires_replace()
                .with_description("WireGuard public key"),
        )
        .attribute(AttributeSchema::new("description", AttributeType::String).optional_computed())
        .attribute(
            AttributeSchema::new("ipv4", AttributeType::String)
                .optional_computed()
                .with_description("Tunnel IPv4 address"),
        )
        .attribute(
            AttributeSchema::new("ipv6", AttributeType::String)
                .optional_computed()
                .with_description("Tunnel IPv6 address"),
        )
        .attribute(
            AttributeSchema::new("allowed_ips", AttributeType::List(Box::new(types::ip_or_cidr())))
                .optional_computed()
                .with_description("Networks routed through the tunnel"),
        )
        .attribute(
            AttributeSchema::new("dns", types::string_list())
                .optional_computed()
                .with_description("DNS servers pushed to the device"),
        )
        .attribute(
            AttributeSchema::new("endpoint", AttributeType::String)
                .optional_computed()
                .with_description("Server endpoint the device connects to"),
        )
        .attribute(
            AttributeSchema::new("mtu", fz_types::mtu())
                .optional_computed()
                .with_description("Interface MTU (576-1500)"),
        )
        .attribute(
            AttributeSchema::new("persistent_keepalive", fz_types::persistent_keepalive())
                .optional_computed()
                .with_description("Keepalive interval in seconds (0-120)"),
        )
        .attribute(
            AttributeSchema::new("preshared_key", AttributeType::String)
                .optional_computed()
                .sensitive()
                .with_description("WireGuard preshared key"),
        )
        .attribute(AttributeSchema::new("created_at", AttributeType::String).computed())
        .attribute(AttributeSchema::new("updated_at", AttributeType::String).computed());

    for (flag, _) in USE_DEFAULT_PAIRS {
        schema = schema.attribute(
            AttributeSchema::new(*flag, AttributeType::Bool)
                .optional_computed()
                .with_default(true),
        );
    }
    schema
}
