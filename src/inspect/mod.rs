//! Interceptor and installer for HTTP(S) client inspection
//!
//! The two process-shared client [`Module`] singletons are the recognized
//! interception targets. [`inspect`] marks a module as instrumented; from
//! then on every request issued through it is mirrored into the shared
//! [`RequestLog`] as it flows, without changing what the caller observes.

mod module;
mod request;
mod response;

pub use module::{Module, RequestOptions, Scheme};
pub use request::ClientRequest;
pub use response::ClientResponse;

use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use tracing::debug;
use uuid::Uuid;

use crate::log::{RequestLog, DEFAULT_MAX_REQUESTS};
use crate::record::Record;
use crate::{Result, WiresightError};

/// Parameters for [`inspect`]
#[derive(Debug, Clone, Copy)]
pub struct InspectParams<'a> {
    /// The client module to instrument. Must be one of [`Module::http`] or
    /// [`Module::https`].
    pub module: &'a Module,
    /// Maximum number of requests to retain. The log is a process-wide
    /// singleton, so a new value here changes the capacity seen by every
    /// caller, on every call, whether or not the module was already
    /// instrumented.
    pub max_requests: Option<usize>,
}

impl<'a> InspectParams<'a> {
    /// Inspect `module` with the default retention capacity
    #[must_use]
    pub fn new(module: &'a Module) -> Self {
        Self {
            module,
            max_requests: None,
        }
    }
}

/// Set up inspection on a client module and return the shared log that
/// provides access to all inspected requests.
///
/// Instrumentation is idempotent: the first call per module installs the
/// observers, later calls only return the shared log (and apply the
/// `max_requests` side effect).
///
/// # Errors
///
/// Returns [`WiresightError::InvalidModule`] if `module` is not one of the
/// two shared client module singletons; nothing is changed in that case.
pub fn inspect(params: InspectParams<'_>) -> Result<&'static RequestLog> {
    let InspectParams {
        module,
        max_requests,
    } = params;

    if !std::ptr::eq(module, Module::http()) && !std::ptr::eq(module, Module::https()) {
        return Err(WiresightError::InvalidModule);
    }

    let log = RequestLog::global();

    if let Some(max_requests) = max_requests {
        if max_requests != DEFAULT_MAX_REQUESTS {
            log.set_limit(max_requests);
        }
    }

    if module.instrument() {
        debug!("Instrumented {} client module", module.scheme());
    }

    Ok(log)
}

static ID_BASE: Lazy<String> = Lazy::new(|| Uuid::new_v4().simple().to_string());
static ID_SEQ: AtomicU64 = AtomicU64::new(0);

/// Process-unique request id, lexicographically ordered by issuance
pub(crate) fn next_request_id() -> String {
    let seq = ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{seq:016x}", ID_BASE.as_str())
}

/// Apply `f` to the observed record, if this request is being inspected.
/// Updates to an already-evicted record are dropped.
pub(crate) fn observe<F>(observer: Option<&str>, f: F)
where
    F: FnOnce(&mut Record),
{
    if let Some(id) = observer {
        RequestLog::global().update(id, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests observing the shared log's capacity serialize here
    static CAPACITY_GUARD: parking_lot::Mutex<()> = parking_lot::Mutex::new(());

    #[test]
    fn test_only_accepts_shared_modules() {
        let _guard = CAPACITY_GUARD.lock();
        let len_before = RequestLog::global().len();
        let limit_before = RequestLog::global().limit();

        let rogue = Module::new(Scheme::Http);
        let result = inspect(InspectParams {
            module: &rogue,
            max_requests: Some(5),
        });
        assert!(matches!(result, Err(WiresightError::InvalidModule)));

        // A rejected call mutates nothing, not even the requested capacity
        assert_eq!(RequestLog::global().len(), len_before);
        assert_eq!(RequestLog::global().limit(), limit_before);

        assert!(inspect(InspectParams::new(Module::http())).is_ok());
        assert!(inspect(InspectParams::new(Module::https())).is_ok());
    }

    #[test]
    fn test_returns_shared_log() {
        let first = inspect(InspectParams::new(Module::http())).unwrap();
        let second = inspect(InspectParams::new(Module::http())).unwrap();

        assert!(std::ptr::eq(first, second));
        assert!(std::ptr::eq(first, RequestLog::global()));
    }

    #[test]
    fn test_max_requests_side_effect() {
        let _guard = CAPACITY_GUARD.lock();
        let log = inspect(InspectParams {
            module: Module::http(),
            max_requests: Some(3),
        })
        .unwrap();
        assert_eq!(log.limit(), 3);

        // Passing the default back explicitly does not reset a customized
        // limit; only a non-default value updates the shared capacity.
        let log = inspect(InspectParams {
            module: Module::http(),
            max_requests: Some(DEFAULT_MAX_REQUESTS),
        })
        .unwrap();
        assert_eq!(log.limit(), 3);

        log.set_limit(DEFAULT_MAX_REQUESTS);
    }

    #[test]
    fn test_request_ids_are_ordered() {
        let first = next_request_id();
        let second = next_request_id();

        assert_ne!(first, second);
        assert!(first < second);
    }

    #[test]
    fn test_observe_without_observer_is_noop() {
        observe(None, |record| record.incoming.status_code = 500);
    }
}
