//! Firezone Core
//!
//! Host-facing vocabulary for the Firezone provider: desired and observed
//! resource state, attribute schemas with validators, and the adapter traits
//! that every resource kind implements.

pub mod provider;
pub mod resource;
pub mod schema;
