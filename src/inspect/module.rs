//! Client module objects and the request-issuing entry point

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::BytesMut;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Uri};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::log::RequestLog;
use crate::record::Record;
use crate::{Result, WiresightError};

use super::{next_request_id, ClientRequest};

/// The pooled client shared by all requests through one module. A single
/// connector type serves both schemes: the TLS connector also carries plain
/// HTTP connections.
pub(crate) type PooledClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

static HTTP_MODULE: Lazy<Module> = Lazy::new(|| Module::new(Scheme::Http));
static HTTPS_MODULE: Lazy<Module> = Lazy::new(|| Module::new(Scheme::Https));

/// URI scheme a client module issues requests with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Plain HTTP
    Http,
    /// HTTP over TLS
    Https,
}

impl Scheme {
    /// Scheme name as it appears in a URI
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// Default port for the scheme
    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for issuing a request through a [`Module`]
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Target host
    pub host: String,
    /// Target port; defaults to the module scheme's standard port
    pub port: Option<u16>,
    /// HTTP method
    pub method: String,
    /// Path portion of the request, including any query string
    pub path: String,
    /// Initial request headers
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// GET "/" against `host` on the scheme's default port
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            method: "GET".to_string(),
            path: "/".to_string(),
            headers: Vec::new(),
        }
    }
}

/// An HTTP(S) client module: a pooled client plus a one-shot instrumentation
/// flag.
///
/// The two process-shared instances returned by [`Module::http`] and
/// [`Module::https`] are the only modules [`crate::inspect`] accepts. A
/// module built with [`Module::new`] can issue requests, but its traffic is
/// never recorded.
pub struct Module {
    scheme: Scheme,
    client: PooledClient,
    instrumented: AtomicBool,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("scheme", &self.scheme)
            .field("instrumented", &self.instrumented)
            .finish_non_exhaustive()
    }
}

impl Module {
    /// Create a detached client module. Detached modules are not eligible
    /// for inspection; use [`Module::http`] or [`Module::https`] for that.
    #[must_use]
    pub fn new(scheme: Scheme) -> Self {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build(connector);

        Self {
            scheme,
            client,
            instrumented: AtomicBool::new(false),
        }
    }

    /// The shared plain-HTTP client module
    #[must_use]
    pub fn http() -> &'static Module {
        &HTTP_MODULE
    }

    /// The shared HTTPS client module
    #[must_use]
    pub fn https() -> &'static Module {
        &HTTPS_MODULE
    }

    /// Scheme this module issues requests with
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Mark the module as instrumented. Returns `true` on the first call,
    /// `false` once already set; the flag lives for the process lifetime.
    pub(crate) fn instrument(&self) -> bool {
        !self.instrumented.swap(true, Ordering::AcqRel)
    }

    /// Check the instrumentation flag
    pub(crate) fn is_instrumented(&self) -> bool {
        self.instrumented.load(Ordering::Acquire)
    }

    /// Issue a request through this module.
    ///
    /// The returned [`ClientRequest`] behaves identically whether or not the
    /// module is instrumented; when it is, a fresh record is inserted into
    /// the shared log and populated as the request proceeds.
    ///
    /// # Errors
    ///
    /// Returns error if the method or target URI cannot be constructed
    pub fn request(&self, options: RequestOptions) -> Result<ClientRequest> {
        let port = options.port.unwrap_or_else(|| self.scheme.default_port());
        let uri = build_uri(self.scheme.as_str(), &options.host, port, &options.path)?;

        let method = options.method.parse::<Method>().map_err(|e| {
            WiresightError::InvalidRequest(format!("Invalid HTTP method '{}': {e}", options.method))
        })?;

        // Header names are kept lowercased, matching what goes on the wire
        let mut headers: IndexMap<String, String> = IndexMap::new();
        for (name, value) in options.headers {
            headers.insert(name.to_ascii_lowercase(), value);
        }
        if !headers.contains_key("host") {
            headers.insert("host".to_string(), format!("{}:{port}", options.host));
        }

        let observer = if self.is_instrumented() {
            let id = next_request_id();
            let mut record = Record::new();
            record.outgoing.method = method.to_string();
            record.outgoing.path = options.path.clone();
            record.outgoing.headers = headers.clone();
            RequestLog::global().insert(id.clone(), record);

            debug!("Inspecting {} {}", method, uri);
            Some(id)
        } else {
            None
        };

        Ok(ClientRequest::new(
            self.client.clone(),
            method,
            uri,
            options.path,
            headers,
            BytesMut::new(),
            observer,
        ))
    }
}

/// Build a request URI from components
fn build_uri(scheme: &str, host: &str, port: u16, path: &str) -> Result<Uri> {
    let uri = format!("{scheme}://{host}:{port}{path}");

    uri.parse::<Uri>()
        .map_err(|e| WiresightError::InvalidRequest(format!("Invalid URI '{uri}': {e}")))
}
