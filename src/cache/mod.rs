pub mod client;
pub mod query_cache;

pub use client::{InfiniteData, QueryClient};
pub use query_cache::{QueryCache, QueryKey};
