//! Resilient streaming invocation client for the Claude Messages API.
//!
//! [`ClaudeClient`] turns a prompt into a wire request, opens a server-sent
//! event stream, classifies provider errors into retryable and fatal, and
//! applies bounded exponential backoff. [`MetricsClient`] wraps any
//! [`maxline_types::InvocationClient`] with usage accounting.

pub mod classify;
pub mod client;
pub mod http_util;
pub mod metrics;
pub mod request;
pub mod sse;
pub mod transport;

pub use classify::{ErrorClass, RetryState};
pub use client::ClaudeClient;
pub use http_util::ProviderHttp;
pub use metrics::{MetricsClient, MetricsSnapshot};
pub use request::{RequestBody, build_request_body};
pub use transport::{AuthMode, HttpInferenceTransport, InferenceTransport};
