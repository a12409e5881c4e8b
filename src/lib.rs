pub mod attendance;
pub mod auth;
pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod models;
pub mod report;
pub mod store;
pub mod validate;

#[cfg(test)]
pub mod memory_store;
