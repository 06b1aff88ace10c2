//! Backend access: the shared HTTP client and one service per resource.

pub mod client;
pub mod error;
pub mod services;
pub mod types;

#[cfg(test)]
pub(crate) mod test_server;

pub use client::ApiClient;
pub use error::RequestError;
