mod default;
pub mod embed;
pub mod embed_resolver;
pub mod error;
pub mod fetch;
pub mod hls_extractor;
pub mod hoster_extractor;
pub mod hosters;
pub mod page;
pub mod registry;

pub use default::{
    DEFAULT_REQUEST_TIMEOUT, ProxyConfig, create_client, default_client, default_registry,
};
pub use embed_resolver::EmbedResolver;
pub use error::ResolveError;
pub use fetch::{FetchResponse, Fetcher, HttpFetcher};
pub use hoster_extractor::{Extractor, ResolveContext};
pub use registry::ExtractorRegistry;
