pub mod config;
pub mod health;
pub mod roles;
pub mod tokens;
