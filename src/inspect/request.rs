//! The request handle returned by an instrumented module

use bytes::BytesMut;
use http_body_util::Full;
use hyper::{Method, Request, Uri};
use indexmap::IndexMap;
use tracing::warn;

use crate::chunk::Chunk;
use crate::{Result, WiresightError};

use super::module::PooledClient;
use super::{observe, ClientResponse};

/// An in-flight client request.
///
/// Mirrors every header mutation and body chunk into the observed record
/// before delegating, then sends the request on [`ClientRequest::end`]. The
/// handle behaves identically when the module is not instrumented; only the
/// mirroring is skipped.
pub struct ClientRequest {
    client: PooledClient,
    method: Method,
    uri: Uri,
    path: String,
    headers: IndexMap<String, String>,
    body: BytesMut,
    observer: Option<String>,
}

impl ClientRequest {
    pub(crate) fn new(
        client: PooledClient,
        method: Method,
        uri: Uri,
        path: String,
        headers: IndexMap<String, String>,
        body: BytesMut,
        observer: Option<String>,
    ) -> Self {
        Self {
            client,
            method,
            uri,
            path,
            headers,
            body,
            observer,
        }
    }

    /// Request method
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Full target URI
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Path portion of the request
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Current value of a header, by lowercased name
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Whether this request is being mirrored into the shared log
    #[must_use]
    pub fn is_observed(&self) -> bool {
        self.observer.is_some()
    }

    /// Set a header on the pending request. The value is mirrored into the
    /// observed record's outgoing headers before being applied.
    pub fn set_header(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        let value = value.to_string();

        observe(self.observer.as_deref(), |record| {
            record
                .outgoing
                .headers
                .insert(name.clone(), value.clone());
        });

        self.headers.insert(name, value);
    }

    /// Append a body chunk. The chunk is coerced to bytes, mirrored into the
    /// observed record's outgoing body, then buffered for transmission.
    pub fn write(&mut self, chunk: impl Into<Chunk>) {
        let bytes = chunk.into().into_bytes();

        observe(self.observer.as_deref(), |record| {
            record.outgoing.body.extend_from_slice(&bytes);
        });

        self.body.extend_from_slice(&bytes);
    }

    /// Finalize the body and send the request.
    ///
    /// On response arrival the observed record's status code and headers are
    /// populated before the response handle is returned, so they are always
    /// recorded ahead of any body chunk.
    ///
    /// # Errors
    ///
    /// Transport and protocol failures propagate unchanged; the record keeps
    /// whatever was captured up to the failure.
    pub async fn end(self) -> Result<ClientResponse> {
        let ClientRequest {
            client,
            method,
            uri,
            path: _,
            headers,
            body,
            observer,
        } = self;

        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in &headers {
            builder = builder.header(name, value);
        }
        let request = builder
            .body(Full::new(body.freeze()))
            .map_err(|e| WiresightError::InvalidRequest(format!("Failed to build request: {e}")))?;

        let response = client.request(request).await.map_err(|e| {
            warn!("Request failed: {e}");
            WiresightError::from(e)
        })?;

        let status = response.status().as_u16();
        let mut response_headers: IndexMap<String, String> = IndexMap::new();
        for (name, value) in response.headers() {
            let value = value.to_str().unwrap_or("<invalid>");
            // Repeated header names fold into one comma-joined value
            match response_headers.entry(name.to_string()) {
                indexmap::map::Entry::Occupied(mut entry) => {
                    let joined = format!("{}, {value}", entry.get());
                    entry.insert(joined);
                }
                indexmap::map::Entry::Vacant(entry) => {
                    entry.insert(value.to_string());
                }
            }
        }

        observe(observer.as_deref(), |record| {
            record.incoming.status_code = status;
            record.incoming.headers = response_headers.clone();
        });

        Ok(ClientResponse::new(
            status,
            response_headers,
            response.into_body(),
            observer,
        ))
    }

    /// Append a final body chunk, then send the request as [`ClientRequest::end`]
    ///
    /// # Errors
    ///
    /// Same failure modes as [`ClientRequest::end`]
    pub async fn end_with(mut self, chunk: impl Into<Chunk>) -> Result<ClientResponse> {
        self.write(chunk);
        self.end().await
    }
}
