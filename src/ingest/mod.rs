//! Turning inbound image sources into [`ImagePayload`](crate::upload::ImagePayload)s
//!
//! - [`decode_data_url`] - base64 data URLs from the editor paste path
//! - [`RemoteImageFetcher`] - images referenced by URL, downloaded for re-hosting

mod data_url;
mod fetcher;
pub mod mime;

pub use data_url::{DecodeError, decode_data_url};
pub use fetcher::{FetchError, RemoteImageFetcher};
