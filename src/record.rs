//! Per-request captured data

use std::io::{self, Write};

use indexmap::IndexMap;

/// Data seen while sending a request
#[derive(Debug, Clone, Default)]
pub struct Outgoing {
    /// Request method, e.g. "GET"
    pub method: String,
    /// Path portion of the request, e.g. "/foo"
    pub path: String,
    /// Headers used in the request, in insertion order
    pub headers: IndexMap<String, String>,
    /// Bytes sent as the request body
    pub body: Vec<u8>,
}

/// Data seen while receiving a response
#[derive(Debug, Clone, Default)]
pub struct Incoming {
    /// Response status code
    pub status_code: u16,
    /// Headers received in the response, in arrival order
    pub headers: IndexMap<String, String>,
    /// Bytes received as the response body
    pub body: Vec<u8>,
}

/// Everything captured for a single inspected HTTP(S) request.
///
/// Bodies start empty and grow by append-only concatenation as chunks pass
/// through the instrumented request and response handles.
#[derive(Debug, Clone, Default)]
pub struct Record {
    /// Outgoing request data
    pub outgoing: Outgoing,
    /// Incoming response data
    pub incoming: Incoming,
}

impl Record {
    /// Create an empty record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a human-readable report of the captured data to `dest`.
    ///
    /// Bodies are assumed to be UTF-8 text and render lossily when they are
    /// not. Known quirk, kept for output compatibility: the status code is
    /// written directly against the first response header with no separator.
    ///
    /// # Errors
    ///
    /// Returns error if the sink rejects a write
    pub fn dump<W: Write>(&self, dest: &mut W) -> io::Result<()> {
        dest.write_all(b"Sent request:\n")?;
        writeln!(dest, "{} {}", self.outgoing.method, self.outgoing.path)?;
        for (key, value) in &self.outgoing.headers {
            writeln!(dest, "{key}: {value}")?;
        }
        write!(dest, "\n{}", String::from_utf8_lossy(&self.outgoing.body))?;

        dest.write_all(b"\n\nReceived response:\n")?;
        write!(dest, "{}", self.incoming.status_code)?;
        for (key, value) in &self.incoming.headers {
            writeln!(dest, "{key}: {value}")?;
        }
        write!(dest, "\n{}", String::from_utf8_lossy(&self.incoming.body))?;

        Ok(())
    }

    /// Dump the record to standard output
    ///
    /// # Errors
    ///
    /// Returns error if stdout rejects a write
    pub fn dump_stdout(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.dump(&mut handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dumps_human_readable_output() {
        let mut record = Record::new();

        record.outgoing.method = "GET".to_string();
        record.outgoing.path = "/foo".to_string();
        record
            .outgoing
            .headers
            .insert("foo".to_string(), "foo".to_string());
        record
            .outgoing
            .headers
            .insert("bar".to_string(), "bar".to_string());
        record.outgoing.body = b"sent".to_vec();

        record.incoming.status_code = 200;
        record
            .incoming
            .headers
            .insert("hello".to_string(), "world".to_string());
        record.incoming.body = b"received".to_vec();

        let mut out = Vec::new();
        record.dump(&mut out).unwrap();

        let expected =
            "Sent request:\nGET /foo\nfoo: foo\nbar: bar\n\nsent\n\nReceived response:\n200hello: world\n\nreceived";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_dump_empty_record() {
        let record = Record::new();

        let mut out = Vec::new();
        record.dump(&mut out).unwrap();

        let expected = "Sent request:\n \n\n\n\nReceived response:\n0\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_header_order_is_insertion_order() {
        let mut record = Record::new();
        for name in ["zulu", "alpha", "mike"] {
            record
                .outgoing
                .headers
                .insert(name.to_string(), "x".to_string());
        }

        let keys: Vec<&str> = record.outgoing.headers.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zulu", "alpha", "mike"]);
    }
}
