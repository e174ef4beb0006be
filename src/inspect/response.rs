//! The response handle returned once a request completes

use bytes::{Bytes, BytesMut};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use indexmap::IndexMap;
use tracing::debug;

use crate::Result;

use super::observe;

/// A streaming response to an inspected request.
///
/// Status and headers were captured when the response arrived; body data is
/// mirrored into the observed record chunk by chunk, as the caller consumes
/// it.
pub struct ClientResponse {
    status: u16,
    headers: IndexMap<String, String>,
    body: Incoming,
    observer: Option<String>,
}

impl ClientResponse {
    pub(crate) fn new(
        status: u16,
        headers: IndexMap<String, String>,
        body: Incoming,
        observer: Option<String>,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            observer,
        }
    }

    /// Response status code
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers, in arrival order.
    ///
    /// The map holds one value per name; headers the server sent more than
    /// once arrive comma-joined into a single value.
    #[must_use]
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Value of a response header, by lowercased name
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Next body chunk, or `None` once the body is exhausted.
    ///
    /// Each data chunk is appended to the observed record's incoming body
    /// before being handed to the caller; trailer frames are passed over.
    ///
    /// # Errors
    ///
    /// Body-stream failures propagate unchanged
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        while let Some(frame) = self.body.frame().await {
            let frame = frame?;
            if let Ok(data) = frame.into_data() {
                observe(self.observer.as_deref(), |record| {
                    record.incoming.body.extend_from_slice(&data);
                });
                debug!("Captured {} response body bytes", data.len());
                return Ok(Some(data));
            }
        }

        Ok(None)
    }

    /// Drain the remaining body into one buffer
    ///
    /// # Errors
    ///
    /// Body-stream failures propagate unchanged
    pub async fn bytes(mut self) -> Result<Bytes> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = self.chunk().await? {
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }
}
