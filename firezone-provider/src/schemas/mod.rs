//! Firezone resource schema definitions

pub mod device;
pub mod rule;
pub mod types;
pub mod user;
