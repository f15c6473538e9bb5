//! Firezone Client
//!
//! Async client for the Firezone REST API. Covers the three entity kinds the
//! provider manages (users, devices and firewall rules) with typed
//! create/get/update/delete calls.
//!
//! ## Module Structure
//!
//! - `api` - `FirezoneApi` trait, the seam adapters depend on
//! - `client` - reqwest-backed implementation
//! - `error` - error type and not-found detection
//! - `models` - request and response bodies

pub mod api;
pub mod client;
pub mod error;
pub mod models;

pub use api::FirezoneApi;
pub use client::{Client, ClientConfig};
pub use error::{Error, Result};
pub use models::{Device, DeviceRequest, Rule, RuleRequest, User, UserRequest};
