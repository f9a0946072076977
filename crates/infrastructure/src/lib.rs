//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod artifactory_http_client;
mod in_memory_key_value_store;
mod postgres_key_value_store;

pub use artifactory_http_client::{HttpArtifactoryClient, HttpArtifactoryClientFactory};
pub use in_memory_key_value_store::InMemoryKeyValueStore;
pub use postgres_key_value_store::PostgresKeyValueStore;
