//! Body chunk coercion
//!
//! The transport hands this layer body data either as text or as raw bytes.
//! Everything is normalized to [`Bytes`] before it is appended to a record.

use bytes::Bytes;

/// A unit of body data, in either text or byte form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Bytes(Bytes),
}

impl Chunk {
    /// Coerce the chunk into a byte sequence.
    ///
    /// Text converts via its UTF-8 representation; a Rust `String` is
    /// UTF-8 by definition, so no decoding step (and no codec error) exists.
    /// Byte chunks pass through without copying.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        match self {
            Chunk::Text(text) => Bytes::from(text.into_bytes()),
            Chunk::Bytes(bytes) => bytes,
        }
    }

    /// Number of bytes the chunk will contribute to a body
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Chunk::Text(text) => text.len(),
            Chunk::Bytes(bytes) => bytes.len(),
        }
    }

    /// Check whether the chunk is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Chunk {
    fn from(value: &str) -> Self {
        Chunk::Text(value.to_string())
    }
}

impl From<String> for Chunk {
    fn from(value: String) -> Self {
        Chunk::Text(value)
    }
}

impl From<Bytes> for Chunk {
    fn from(value: Bytes) -> Self {
        Chunk::Bytes(value)
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(value: Vec<u8>) -> Self {
        Chunk::Bytes(Bytes::from(value))
    }
}

impl From<&[u8]> for Chunk {
    fn from(value: &[u8]) -> Self {
        Chunk::Bytes(Bytes::copy_from_slice(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_text() {
        let chunk = Chunk::from("foo");
        assert_eq!(chunk.into_bytes(), Bytes::from_static(b"foo"));

        let chunk = Chunk::from(String::from("bar"));
        assert_eq!(chunk.into_bytes(), Bytes::from_static(b"bar"));
    }

    #[test]
    fn test_passes_through_bytes() {
        let original = Bytes::from_static(&[0x66, 0x6f, 0x6f]);
        let chunk = Chunk::from(original.clone());
        assert_eq!(chunk.into_bytes(), original);

        let chunk = Chunk::from(vec![0x66, 0x6f, 0x6f]);
        assert_eq!(chunk.into_bytes(), Bytes::from_static(b"foo"));
    }

    #[test]
    fn test_len_and_empty() {
        assert_eq!(Chunk::from("foo").len(), 3);
        assert!(Chunk::from("").is_empty());
        assert!(Chunk::from(Bytes::new()).is_empty());
    }
}
