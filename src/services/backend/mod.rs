pub mod auth_fetch;
pub mod client;
pub mod errors;
#[cfg(test)]
pub mod mock_backend;
pub mod models;
pub mod service;
