//! Firezone-specific type definitions

use std::sync::LazyLock;

use firezone_core::resource::Value;
use firezone_core::schema::{AttributeType, validate_length};
use regex::Regex;

/// Upper bound on every validated string field
pub const MAX_STRING_LENGTH: usize = 256;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9a-z]*@[0-9a-z]*\.[a-z]*)$").expect("email pattern is valid")
});

static PORT_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([1-9]?[0-9]*|[1-9]?[0-9]* - [1-9]?[0-9]*)$")
        .expect("port range pattern is valid")
});

pub const ROLES: &[&str] = &["admin", "unprivileged"];
pub const ACTIONS: &[&str] = &["accept", "drop"];
pub const PORT_TYPES: &[&str] = &["tcp", "udp"];

/// User role
pub fn role() -> AttributeType {
    AttributeType::enumeration(ROLES)
}

/// Rule action
pub fn action() -> AttributeType {
    AttributeType::enumeration(ACTIONS)
}

/// Rule port protocol
pub fn port_type() -> AttributeType {
    AttributeType::enumeration(PORT_TYPES)
}

/// Email address in `local@domain.tld` shape
pub fn email() -> AttributeType {
    AttributeType::Custom {
        name: "Email".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                validate_email(s)
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

/// Single port ("443") or a range written with spaced dash ("1 - 1024")
pub fn port_range() -> AttributeType {
    AttributeType::Custom {
        name: "PortRange".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                validate_port_range(s)
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

/// WireGuard interface MTU
pub fn mtu() -> AttributeType {
    AttributeType::Custom {
        name: "Mtu".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| validate_int_range(value, 576, 1500, "MTU"),
    }
}

/// WireGuard persistent keepalive interval in seconds
pub fn persistent_keepalive() -> AttributeType {
    AttributeType::Custom {
        name: "PersistentKeepalive".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| validate_int_range(value, 0, 120, "Persistent keepalive"),
    }
}

pub fn validate_email(s: &str) -> Result<(), String> {
    validate_length(s, 1, MAX_STRING_LENGTH)?;
    if EMAIL.is_match(s) {
        Ok(())
    } else {
        Err(format!(
            "Invalid email '{}', expected a lowercase address like user@example.com",
            s
        ))
    }
}

pub fn validate_port_range(s: &str) -> Result<(), String> {
    validate_length(s, 1, MAX_STRING_LENGTH)?;
    if PORT_RANGE.is_match(s) {
        Ok(())
    } else {
        Err(format!(
            "Invalid port range '{}', expected a port like \"443\" or a range like \"1 - 1024\"",
            s
        ))
    }
}

fn validate_int_range(value: &Value, min: i64, max: i64, what: &str) -> Result<(), String> {
    match value {
        Value::Int(n) if (min..=max).contains(n) => Ok(()),
        Value::Int(n) => Err(format!(
            "{} must be between {} and {}, got {}",
            what, min, max, n
        )),
        _ => Err("Expected integer".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(s: &str) -> Value {
        Value::String(s.to_string())
    }

    #[test]
    fn valid_emails() {
        let t = email();
        for valid in ["one@example.com", "two@example.com", "a1@b2.io"] {
            assert!(t.validate(&string(valid)).is_ok(), "{} should be valid", valid);
        }
    }

    #[test]
    fn invalid_emails() {
        let t = email();
        for invalid in ["", "One@example.com", "one.two@example.com", "no-at-sign", "a@b"] {
            assert!(t.validate(&string(invalid)).is_err(), "{} should be invalid", invalid);
        }
        assert!(t.validate(&Value::Int(1)).is_err());
    }

    #[test]
    fn port_ranges() {
        let t = port_range();
        for valid in ["443", "0 - 65535", "1 - 1024", "80"] {
            assert!(t.validate(&string(valid)).is_ok(), "{} should be valid", valid);
        }
        for invalid in ["", "0-65535", "1 -1024", "tcp", "443,80"] {
            assert!(t.validate(&string(invalid)).is_err(), "{} should be invalid", invalid);
        }
    }

    #[test]
    fn enums_accept_only_known_values() {
        assert!(role().validate(&string("admin")).is_ok());
        assert!(role().validate(&string("unprivileged")).is_ok());
        assert!(role().validate(&string("root")).is_err());

        assert!(action().validate(&string("accept")).is_ok());
        assert!(action().validate(&string("allow")).is_err());

        assert!(port_type().validate(&string("udp")).is_ok());
        assert!(port_type().validate(&string("icmp")).is_err());
    }

    #[test]
    fn mtu_bounds() {
        let t = mtu();
        assert!(t.validate(&Value::Int(576)).is_ok());
        assert!(t.validate(&Value::Int(1500)).is_ok());
        assert!(t.validate(&Value::Int(575)).is_err());
        assert!(t.validate(&Value::Int(65536 + 1280)).is_err());
        assert!(t.validate(&string("1280")).is_err());
    }

    #[test]
    fn keepalive_bounds() {
        let t = persistent_keepalive();
        assert!(t.validate(&Value::Int(0)).is_ok());
        assert!(t.validate(&Value::Int(120)).is_ok());
        assert!(t.validate(&Value::Int(-1)).is_err());
        assert!(t.validate(&Value::Int(121)).is_err());
    }
}
