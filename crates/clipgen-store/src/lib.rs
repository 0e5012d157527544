//! DynamoDB persistence for the clipgen backend.
//!
//! This crate provides:
//! - Repository traits for jobs, presets and users
//! - DynamoDB implementations using GSIs for per-user listing
//! - In-memory implementations for local runs and tests
//! - JSON <-> AttributeValue conversion for free-form fields

pub mod attr;
pub mod config;
pub mod error;
pub mod jobs;
pub mod memory;
pub mod metrics;
pub mod presets;
pub mod repos;
pub mod users;

pub use attr::{attr_to_json, json_to_attr, FromAttributeValue, Item, ToAttributeValue};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use jobs::DynamoJobRepository;
pub use memory::{InMemoryJobRepository, InMemoryPresetRepository, InMemoryUserRepository};
pub use presets::DynamoPresetRepository;
pub use repos::{JobRepository, PresetRepository, UserRepository};
pub use users::DynamoUserRepository;
