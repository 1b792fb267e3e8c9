pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod services;
pub mod store;
