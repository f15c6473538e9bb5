//! User schema definitions

use firezone_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::types as fz_types;

pub const RESOURCE_TYPE: &str = "firezone_user";

/// Server-populated attributes shared by the resource and the data source
fn computed_attributes(schema: ResourceSchema) -> ResourceSchema {
    schema
        .attribute(
            AttributeSchema::new("last_signed_in_at", AttributeType::String)
                .computed()
                .with_description("Time of the user's most recent sign-in"),
        )
        .attribute(
            AttributeSchema::new("last_signed_in_method", AttributeType::String)
                .computed()
                .with_description("Method used for the most recent sign-in"),
        )
        .attribute(AttributeSchema::new("created_at", AttributeType::String).computed())
        .attribute(AttributeSchema::new("updated_at", AttributeType::String).computed())
}

/// Schema for the `firezone_user` resource
pub fn schema() -> ResourceSchema {
    let schema = ResourceSchema::new(RESOURCE_TYPE)
        .with_description("A Firezone user")
        .attribute(
            AttributeSchema::new("id", AttributeType::String)
                .computed()
                .with_description("User identifier"),
        )
        .attribute(
            AttributeSchema::new("email", fz_types::email())
                .required()
                .with_description("User email address"),
        )
        .attribute(
            AttributeSchema::new("role", fz_types::role())
                .required()
                .with_description("User role: admin or unprivileged"),
        )
        .attribute(
            AttributeSchema::new("disabled_at", AttributeType::String)
                .optional_computed()
                .with_default("")
                .with_description("Time the user was disabled; empty while the user is active"),
        );
    computed_attributes(schema)
}

/// Schema for the `firezone_user` data source
///
/// Either `id` or `email` selects the user; everything else is read back.
pub fn data_source_schema() -> ResourceSchema {
    let schema = ResourceSchema::new(RESOURCE_TYPE)
        .with_description("Look up an existing Firezone user")
        .attribute(
            AttributeSchema::new("id", AttributeType::String)
                .optional_computed()
                .with_description("User identifier; takes precedence over email"),
        )
        .attribute(
            AttributeSchema::new("email", AttributeType::String)
                .optional_computed()
                .with_description("User email address"),
        )
        .attribute(AttributeSchema::new("role", AttributeType::String).computed())
        .attribute(AttributeSchema::new("disabled_at", AttributeType::String).computed());
    computed_attributes(schema)
}
