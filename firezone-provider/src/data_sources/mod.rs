//! Read-only data source adapters

pub mod user;

pub use user::UserDataSource;
