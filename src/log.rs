//! Bounded, insertion-ordered request log
//!
//! A capacity-limited id-to-record map. Entry order is insertion order, so
//! request order can be recovered from iteration order, and the oldest entry
//! is the first one evicted once the log is full.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::debug;

use crate::record::Record;

/// Default maximum number of retained requests
pub const DEFAULT_MAX_REQUESTS: usize = 10;

static GLOBAL: Lazy<RequestLog> = Lazy::new(|| RequestLog::new(DEFAULT_MAX_REQUESTS));

struct LogInner {
    entries: IndexMap<String, Record>,
    limit: usize,
}

/// Bounded, insertion-ordered collection of inspected requests.
///
/// One process-wide instance is shared by every inspected module (see
/// [`RequestLog::global`]); capacity changes through any handle are visible
/// to all users of that instance.
pub struct RequestLog {
    inner: Mutex<LogInner>,
}

impl RequestLog {
    /// Create a log with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero (programming error).
    #[must_use]
    pub fn new(limit: usize) -> Self {
        assert!(limit > 0, "limit must be > 0");
        Self {
            inner: Mutex::new(LogInner {
                entries: IndexMap::new(),
                limit,
            }),
        }
    }

    /// The process-wide shared log, created lazily on first use
    #[must_use]
    pub fn global() -> &'static RequestLog {
        &GLOBAL
    }

    /// Insert or update an entry, evicting the oldest entries while the log
    /// is over capacity
    pub fn insert(&self, id: impl Into<String>, record: Record) {
        let mut inner = self.inner.lock();
        inner.entries.insert(id.into(), record);
        while inner.entries.len() > inner.limit {
            if let Some((evicted, _)) = inner.entries.shift_remove_index(0) {
                debug!("Evicted oldest inspected request: {}", evicted);
            }
        }
    }

    /// Remove and return the oldest entry, or `None` if the log is empty
    #[must_use]
    pub fn shift(&self) -> Option<(String, Record)> {
        self.inner.lock().entries.shift_remove_index(0)
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Number of retained entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Check whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current capacity
    #[must_use]
    pub fn limit(&self) -> usize {
        self.inner.lock().limit
    }

    /// Change the capacity, taking effect immediately: shrinking below the
    /// current size evicts the oldest entries until `len <= limit`.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero (programming error).
    pub fn set_limit(&self, limit: usize) {
        assert!(limit > 0, "limit must be > 0");
        let mut inner = self.inner.lock();
        inner.limit = limit;
        while inner.entries.len() > inner.limit {
            inner.entries.shift_remove_index(0);
        }
    }

    /// Run `f` against a live entry. Returns `false` when the entry has
    /// already been evicted, in which case the update is dropped.
    pub fn update<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Record),
    {
        let mut inner = self.inner.lock();
        match inner.entries.get_mut(id) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    /// Insertion-ordered snapshot of all entries
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Record)> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_path(path: &str) -> Record {
        let mut record = Record::new();
        record.outgoing.path = path.to_string();
        record
    }

    #[test]
    fn test_insert_and_shift_ordering() {
        let log = RequestLog::new(10);

        log.insert("a", record_with_path("/1"));
        log.insert("b", record_with_path("/2"));
        log.insert("c", record_with_path("/3"));

        let (id, record) = log.shift().unwrap();
        assert_eq!(id, "a");
        assert_eq!(record.outgoing.path, "/1");

        let (id, _) = log.shift().unwrap();
        assert_eq!(id, "b");
        let (id, _) = log.shift().unwrap();
        assert_eq!(id, "c");
        assert!(log.shift().is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let log = RequestLog::new(3);

        for i in 0..5 {
            log.insert(format!("id{i}"), record_with_path(&format!("/{i}")));
        }

        assert_eq!(log.len(), 3);
        let ids: Vec<String> = log.entries().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["id2", "id3", "id4"]);
    }

    #[test]
    fn test_shrink_limit_truncates_oldest() {
        let log = RequestLog::new(5);

        for i in 0..5 {
            log.insert(format!("id{i}"), record_with_path(&format!("/{i}")));
        }

        log.set_limit(2);
        assert_eq!(log.limit(), 2);
        assert_eq!(log.len(), 2);

        let (id, _) = log.shift().unwrap();
        assert_eq!(id, "id3");
        let (id, _) = log.shift().unwrap();
        assert_eq!(id, "id4");
    }

    #[test]
    fn test_grow_limit_keeps_entries() {
        let log = RequestLog::new(2);

        log.insert("a", Record::new());
        log.insert("b", Record::new());
        log.set_limit(4);

        assert_eq!(log.len(), 2);
        log.insert("c", Record::new());
        log.insert("d", Record::new());
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn test_clear() {
        let log = RequestLog::new(10);
        log.insert("a", Record::new());
        log.insert("b", Record::new());

        log.clear();

        assert!(log.is_empty());
        assert!(log.shift().is_none());
    }

    #[test]
    fn test_update_live_and_evicted() {
        let log = RequestLog::new(1);
        log.insert("a", Record::new());

        assert!(log.update("a", |r| r.incoming.status_code = 200));
        assert_eq!(log.entries()[0].1.incoming.status_code, 200);

        // "a" is evicted by the next insert; its updates are dropped
        log.insert("b", Record::new());
        assert!(!log.update("a", |r| r.incoming.status_code = 500));
        assert_eq!(log.len(), 1);
    }

    #[test]
    #[should_panic(expected = "limit must be > 0")]
    fn test_zero_limit_rejected() {
        let _ = RequestLog::new(0);
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(RequestLog::global(), RequestLog::global()));
    }
}
