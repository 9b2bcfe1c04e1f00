//! HTTP transport: authentication, envelope unwrapping and error mapping.

pub mod client;
pub mod envelope;
pub mod error;

pub use client::{HttpClient, RequestOptions};
pub use envelope::Page;
pub use error::TransportError;
