//! Shared HTTP plumbing for the inference transport.
//!
//! Centralizes the send → status-check → stream conversion so the transport
//! stays focused on request shape.

use futures_util::StreamExt as _;
use maxline_types::{
    MaxlineError,
    traits::{ByteStream, Result},
};
use rquest::{Client, RequestBuilder};

/// HTTP helper wrapping the shared client.
#[derive(Clone)]
pub struct ProviderHttp {
    http: Client,
}

impl ProviderHttp {
    /// Creates a new helper wrapping the given HTTP client.
    #[must_use]
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Returns a reference to the inner HTTP client for building requests.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.http
    }

    /// Sends a request and checks for success status.
    ///
    /// On non-2xx responses, reads the body text and returns
    /// [`MaxlineError::Upstream`] for the caller to classify.
    ///
    /// # Errors
    ///
    /// Returns `MaxlineError::Upstream` on non-success HTTP status codes, or
    /// a transport error if the request fails to send.
    pub async fn send(&self, builder: RequestBuilder) -> Result<rquest::Response> {
        let resp = builder.send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(MaxlineError::Upstream {
                status: status.as_u16(),
                body: text,
            })
        }
    }

    /// Converts an `rquest::Response` into a [`ByteStream`].
    ///
    /// Dropping the stream drops the response body, releasing the
    /// connection on every exit path.
    #[must_use]
    pub fn byte_stream(resp: rquest::Response) -> ByteStream {
        Box::pin(resp.bytes_stream().map(|r| r.map_err(MaxlineError::from)))
    }
}
