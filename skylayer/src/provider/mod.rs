//! HTTP access to survey servers.
//!
//! The [`AsyncHttpClient`] trait is the seam between the downloader and the
//! network; [`AsyncReqwestClient`] is the production implementation.

mod http;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT};
pub use types::FetchError;

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
