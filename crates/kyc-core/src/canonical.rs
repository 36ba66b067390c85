//! Unambiguous byte encoding for everything that gets signed or hashed.
//!
//! Each field is written as an 8-byte big-endian length followed by its
//! bytes. Fixed-width integers are still length-prefixed so that a field
//! boundary can never be confused with field content. Two different field
//! sequences therefore always encode to different byte strings.

/// Builder for canonical byte strings.
#[derive(Debug, Default, Clone)]
pub struct CanonicalEncoder {
    buf: Vec<u8>,
}

impl CanonicalEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append raw bytes as one length-prefixed field.
    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(&(value.len() as u64).to_be_bytes());
        self.buf.extend_from_slice(value);
        self
    }

    /// Append a UTF-8 string field.
    pub fn str(&mut self, value: &str) -> &mut Self {
        self.bytes(value.as_bytes())
    }

    /// Append an unsigned integer field.
    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.bytes(&value.to_be_bytes())
    }

    /// Append a signed integer field.
    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.bytes(&value.to_be_bytes())
    }

    /// Append a boolean field.
    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.bytes(&[u8::from(value)])
    }

    /// Append an optional string. Absent and empty encode differently.
    pub fn opt_str(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            Some(v) => self.bool(true).str(v),
            None => self.bool(false),
        }
    }

    /// Append a list of strings, prefixed by its element count.
    pub fn str_list<S: AsRef<str>>(&mut self, values: &[S]) -> &mut Self {
        self.u64(values.len() as u64);
        for v in values {
            self.str(v.as_ref());
        }
        self
    }

    /// Finish and return the encoded bytes.
    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}
