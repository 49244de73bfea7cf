//! HTTP client for the Blogicum API.
//!
//! Redirects are not followed; the server answers anonymous mutations with
//! a redirect to the login entry point and denied post edits with a
//! redirect to the post, both surfaced as [`BlogicumClientError`] values.

pub mod error;
pub mod http_client;
pub mod models;

pub use error::BlogicumClientError;
pub use http_client::HttpClient;
