//! Context Builder: composes a `Context` from the external Memory
//! Service.

pub mod backend;
pub mod builder;
pub mod http;
pub mod mock;

pub use backend::{FetchError, FetchResult, MemoryBackend};
pub use builder::{ContextBuilder, ContextBuilderConfig};
pub use http::HttpMemoryBackend;
