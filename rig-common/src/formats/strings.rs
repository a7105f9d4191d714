//! String table (`str0` chunk)
//!
//! Strings are stored back to back as raw UTF-8 with no terminator. Records
//! refer to them through a [`StringRef`] holding byte offsets into the table.

use anyhow::{Result, bail};

use super::serialization::read_u32;

/// Byte range `[begin, end)` into the string table (8 bytes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct StringRef {
    pub begin: u32,
    pub end: u32,
}

impl StringRef {
    pub const SIZE: usize = 8;

    pub const fn new(begin: u32, end: u32) -> Self {
        Self { begin, end }
    }

    /// Length of the referenced string in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write to raw bytes (8 bytes)
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.begin.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.end.to_le_bytes());
        bytes
    }

    /// Read from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            begin: read_u32(bytes, 0),
            end: read_u32(bytes, 4),
        })
    }
}

/// Append-only string table
///
/// No deduplication happens here; callers that want to share a string (bone
/// names) cache the returned [`StringRef`] themselves.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    data: Vec<u8>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a string and return its byte range
    pub fn write_string(&mut self, s: &str) -> Result<StringRef> {
        let begin = self.data.len();
        let end = begin + s.len();
        if end > u32::MAX as usize {
            bail!(
                "String table overflow: {} bytes exceeds the u32 offset range",
                end
            );
        }
        self.data.extend_from_slice(s.as_bytes());
        Ok(StringRef::new(begin as u32, end as u32))
    }

    /// Resolve a reference against this table
    pub fn get(&self, r: StringRef) -> Option<&str> {
        resolve_string(&self.data, r)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Resolve a reference against a raw `str0` payload
///
/// Returns `None` for out-of-range or reversed ranges and for ranges that do
/// not fall on UTF-8 boundaries.
pub fn resolve_string(data: &[u8], r: StringRef) -> Option<&str> {
    let (begin, end) = (r.begin as usize, r.end as usize);
    if begin > end || end > data.len() {
        return None;
    }
    std::str::from_utf8(&data[begin..end]).ok()
}
