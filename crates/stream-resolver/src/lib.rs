//! # Stream Resolver
//!
//! Turns the "embed" references a video site lists for a title into ranked,
//! playable stream URLs.
//!
//! ## Features
//!
//! - Embed chain walking with a bounded number of nested pages
//! - CryptoJS compatible AES payload decryption with named cipher profiles
//! - Lenient HLS master playlist parsing
//! - Concurrent, failure isolated resolution of alternate servers
//! - Stable preference ranking by server, language and quality
//!
//! ```no_run
//! use stream_resolver::{Candidate, Preference, StreamResolver};
//!
//! # async fn run() -> Result<(), stream_resolver::ResolveError> {
//! let resolver = StreamResolver::builder().build()?;
//! let candidates = vec![Candidate::new("Vidplay", "https://vidplay.example/e/abc")];
//! let pref = Preference::default().with_quality("1080");
//! for stream in resolver.resolve_best_streams(&candidates, &pref, None).await? {
//!     println!("{stream}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod cipher;
pub mod config;
pub mod extractor;
pub mod manifest;
pub mod media;
pub mod ranker;
pub mod resolver;

#[cfg(test)]
pub(crate) mod test_utils;

pub use aggregator::SourceAggregator;
pub use cipher::{CipherParams, CipherProfile, CipherSecret, DecryptError};
pub use config::{HosterConfig, ResolverConfig};
pub use extractor::{
    EmbedResolver, Extractor, ExtractorRegistry, FetchResponse, Fetcher, HttpFetcher,
    ResolveContext, ResolveError,
};
pub use manifest::VariantStream;
pub use media::{Candidate, MediaStream, Preference, SubtitleTrack};
pub use resolver::{StreamResolver, StreamResolverBuilder};
