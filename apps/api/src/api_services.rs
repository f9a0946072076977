mod database;
mod state_builder;

pub use database::{build_key_value_store, connect_and_migrate};
pub use state_builder::build_app_state;
