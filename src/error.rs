//! Error type for contract violations on [`FixedKeyMap`](crate::FixedKeyMap).
//!
//! Absence on lookup or removal is not an error; those operations return
//! `Option`. The variants here cover the accessor and key-shape misuse that
//! the fixed record layout cannot represent.

/// Error type for map operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// The checked accessor was called with a key that has no live entry.
    KeyNotFound,
    /// The key does not fit the record's key buffer.
    KeyTooLong {
        /// Length of the rejected key in bytes.
        len: usize,
        /// Longest key the buffer can hold.
        max: usize,
    },
    /// Empty keys are indistinguishable from a free slot.
    EmptyKey,
    /// Keys are stored NUL-terminated, so they cannot contain a zero byte.
    InteriorNul {
        /// Byte offset of the first zero byte.
        pos: usize,
    },
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::KeyNotFound => write!(f, "key not found"),
            MapError::KeyTooLong { len, max } => {
                write!(f, "key of {} bytes exceeds the {} byte limit", len, max)
            }
            MapError::EmptyKey => write!(f, "empty keys cannot be stored"),
            MapError::InteriorNul { pos } => write!(f, "key contains a zero byte at offset {}", pos),
        }
    }
}

impl std::error::Error for MapError {}

/// Result type for map operations.
pub type Result<T> = std::result::Result<T, MapError>;
