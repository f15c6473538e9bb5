//! Firewall rule schema definitions

use firezone_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::types as fz_types;

pub const RESOURCE_TYPE: &str = "firezone_rule";

/// Schema for the `firezone_rule` resource
///
/// Every configurable attribute forces replacement when changed.
pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("A Firezone egress firewall rule")
        .attribute(
            AttributeSchema::new("id", AttributeType::String)
                .computed()
                .with_description("Rule identifier"),
        )
        .attribute(
            AttributeSchema::new("user_id", AttributeType::String)
                .optional_computed()
                .with_default("")
                .requires_replace()
                .with_description("User the rule applies to; empty applies it to every user"),
        )
        .attribute(
            AttributeSchema::new("action", fz_types::action())
                .required()
                .requires_replace()
                .with_description("accept or drop"),
        )
        .attribute(
            AttributeSchema::new("destination", types::ip_or_cidr())
                .required()
                .requires_replace()
                .with_description("Destination address or CIDR block"),
        )
        .attribute(
            AttributeSchema::new("port_range", fz_types::port_range())
                .required()
                .requires_replace()
                .with_description("Single port (\"443\") or range (\"1 - 1024\")"),
        )
        .attribute(
            AttributeSchema::new("port_type", fz_types::port_type())
                .required()
                .requires_replace()
                .with_description("tcp or udp"),
        )
        .attribute(AttributeSchema::new("created_at", AttributeType::String).computed())
        .attribute(AttributeSchema::new("updated_at", AttributeType::String).computed())
}
