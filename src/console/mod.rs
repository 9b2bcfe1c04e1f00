pub mod cache;
pub mod cached_client;
pub mod client;
pub mod types;

pub use cached_client::CachedConsoleClient;
pub use client::ConsoleClient;
