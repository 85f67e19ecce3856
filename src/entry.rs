//! Fixed-size slot record.
//!
//! Each slot is exactly [`RECORD_SIZE`] bytes: an `i32` value followed by a
//! NUL-terminated key buffer taking up the rest of the record. A slot whose
//! first key byte is zero is free.

use crate::error::{MapError, Result};

/// Size of one slot in bytes.
pub const RECORD_SIZE: usize = 64;

/// Size of the key buffer, terminator included.
pub const KEY_CAPACITY: usize = RECORD_SIZE - std::mem::size_of::<i32>();

/// Longest key that fits, leaving room for the terminator.
pub const MAX_KEY_LEN: usize = KEY_CAPACITY - 1;

const _: () = assert!(std::mem::size_of::<Entry>() == RECORD_SIZE);

/// One slot of a [`FixedKeyMap`](crate::FixedKeyMap).
#[derive(Clone, Copy)]
#[repr(C)]
pub struct Entry {
    value: i32,
    key: [u8; KEY_CAPACITY],
}

impl Entry {
    /// A never-used slot.
    pub const FREE: Entry = Entry {
        value: 0,
        key: [0; KEY_CAPACITY],
    };

    /// Whether the slot is free (never used or tombstoned).
    #[inline]
    pub fn is_free(&self) -> bool {
        self.key[0] == 0
    }

    /// Stored key, without the terminator. Empty for a free slot.
    #[inline]
    pub fn key_bytes(&self) -> &[u8] {
        let end = self.key.iter().position(|&b| b == 0).unwrap_or(KEY_CAPACITY);
        &self.key[..end]
    }

    /// Stored value. Stale once the slot has been tombstoned.
    #[inline]
    pub fn value(&self) -> i32 {
        self.value
    }

    #[inline]
    pub(crate) fn value_ref(&self) -> &i32 {
        &self.value
    }

    #[inline]
    pub(crate) fn value_mut(&mut self) -> &mut i32 {
        &mut self.value
    }

    /// Whether this live slot holds `key`.
    #[inline]
    pub fn matches(&self, key: &[u8]) -> bool {
        !self.is_free() && self.key_bytes() == key
    }

    /// Overwrites the slot with `key` and `value`. The key must already have
    /// passed [`check_key`].
    #[inline]
    pub(crate) fn assign(&mut self, key: &[u8], value: i32) {
        debug_assert!(check_key(key).is_ok());
        self.value = value;
        self.key[..key.len()].copy_from_slice(key);
        self.key[key.len()] = 0;
    }

    /// Marks the slot free. The value is left in place.
    #[inline]
    pub(crate) fn tombstone(&mut self) {
        self.key[0] = 0;
    }
}

impl Default for Entry {
    fn default() -> Self {
        Entry::FREE
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_free() {
            f.write_str("Entry(free)")
        } else {
            f.debug_struct("Entry")
                .field("key", &String::from_utf8_lossy(self.key_bytes()))
                .field("value", &self.value)
                .finish()
        }
    }
}

/// Validates that `key` can be stored in a slot.
pub fn check_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(MapError::EmptyKey);
    }
    if key.len() > MAX_KEY_LEN {
        return Err(MapError::KeyTooLong {
            len: key.len(),
            max: MAX_KEY_LEN,
        });
    }
    if let Some(pos) = key.iter().position(|&b| b == 0) {
        return Err(MapError::InteriorNul { pos });
    }
    Ok(())
}
