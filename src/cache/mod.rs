//! Query/mutation cache for backend reads.
//!
//! This module provides a transport-agnostic cache that:
//! - Keys reads by structured, prefix-matchable query keys
//! - Serves fresh values without refetching and coalesces concurrent fetches
//! - Retries failed reads with exponential backoff
//! - Invalidates related reads when a write succeeds
//! - Evicts entries nobody has observed for a while

mod key;
mod layer;
mod policy;
mod storage;
mod traits;

pub use key::QueryKey;
pub use layer::{QueryClient, QueryObserver};
pub use policy::{CacheConfig, RetryPolicy};
pub use traits::{CacheResult, CacheSource, QueryError};
