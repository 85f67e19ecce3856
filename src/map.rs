//! Linear-scan map over fixed-size records.
//!
//! Storage is a boxed slice of [`Entry`] slots whose length is the map's
//! capacity. Every lookup, upsert and free-slot search walks the slots in
//! index order and stops at the first match, so operations are O(capacity)
//! and filling an empty map is O(capacity²). That cost is what the
//! benchmark measures; there is no hashing.
//!
//! Growth doubles the slot count (starting at [`BASELINE_CAPACITY`]) by
//! allocating a new slice and copying every slot across, live or free.
//! Removal tombstones a slot in place; nothing is ever compacted.

use std::ops::{Index, IndexMut};

use log::trace;

use crate::entry::{check_key, Entry};
use crate::error::{MapError, Result};

/// Capacity allocated by the first growth of an empty map.
pub const BASELINE_CAPACITY: usize = 8;

/// A map from short byte-string keys to `i32` values, searched linearly.
///
/// The map is move-only: it owns its slots and deliberately implements
/// neither `Clone` nor `Copy`.
///
/// # Example
///
/// ```rust
/// use fixmap::FixedKeyMap;
///
/// let mut m = FixedKeyMap::new();
/// m.add_item("1", 1)?;
/// m.add_item("2", 2)?;
/// let sum = m["1"] + m["2"];
/// m.add_item("3", sum)?;
///
/// assert_eq!(m.lookup_value("3"), Some(3));
/// assert_eq!(m.capacity(), 8);
/// # Ok::<(), fixmap::MapError>(())
/// ```
pub struct FixedKeyMap {
    slots: Box<[Entry]>,
}

impl FixedKeyMap {
    /// Create an empty map. Nothing is allocated until the first insert.
    pub fn new() -> Self {
        Self {
            slots: Box::default(),
        }
    }

    /// Number of slots, live or free.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live entries. Counted by a full scan.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|e| !e.is_free()).count()
    }

    /// Whether the map holds no live entry.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Entry::is_free)
    }

    /// Raw slot storage in index order, free slots included.
    pub fn slots(&self) -> &[Entry] {
        &self.slots
    }

    /// Insert `key` without checking whether it is already present.
    ///
    /// The entry goes into the lowest-index free slot. If `key` already has a
    /// live entry, both coexist and lookups keep returning the earlier one.
    pub fn add_item(&mut self, key: impl AsRef<[u8]>, value: i32) -> Result<()> {
        let key = key.as_ref();
        check_key(key)?;
        self.insert_new(key, value);
        Ok(())
    }

    /// Overwrite the value of `key` in place if it is live, otherwise insert it
    /// like [`add_item`](Self::add_item).
    ///
    /// Used exclusively, this keeps keys unique.
    pub fn add_or_assign(&mut self, key: impl AsRef<[u8]>, value: i32) -> Result<()> {
        let key = key.as_ref();
        check_key(key)?;
        if let Some(idx) = self.position(key) {
            *self.slots[idx].value_mut() = value;
            return Ok(());
        }
        self.insert_new(key, value);
        Ok(())
    }

    /// Tombstone the first live entry for `key`.
    ///
    /// Returns the value it held, or `None` if the key was absent. The slot
    /// becomes free for later inserts; capacity is unchanged.
    pub fn remove(&mut self, key: impl AsRef<[u8]>) -> Option<i32> {
        let idx = self.position(key.as_ref())?;
        let slot = &mut self.slots[idx];
        slot.tombstone();
        Some(slot.value())
    }

    /// Value of the first live entry for `key`.
    pub fn lookup_value(&self, key: impl AsRef<[u8]>) -> Option<i32> {
        self.position(key.as_ref()).map(|idx| self.slots[idx].value())
    }

    /// Mutable reference to the value of the first live entry for `key`.
    pub fn lookup_value_mut(&mut self, key: impl AsRef<[u8]>) -> Option<&mut i32> {
        let idx = self.position(key.as_ref())?;
        Some(self.slots[idx].value_mut())
    }

    /// Whether `key` has a live entry.
    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.position(key.as_ref()).is_some()
    }

    /// Value of `key`, failing with [`MapError::KeyNotFound`] when absent.
    pub fn value(&self, key: impl AsRef<[u8]>) -> Result<i32> {
        self.lookup_value(key).ok_or(MapError::KeyNotFound)
    }

    /// Mutable value of `key`, failing with [`MapError::KeyNotFound`] when
    /// absent.
    pub fn value_mut(&mut self, key: impl AsRef<[u8]>) -> Result<&mut i32> {
        self.lookup_value_mut(key).ok_or(MapError::KeyNotFound)
    }

    /// Live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], i32)> {
        self.slots
            .iter()
            .filter(|e| !e.is_free())
            .map(|e| (e.key_bytes(), e.value()))
    }

    /// Free all slots and return to the unallocated state.
    pub fn release(&mut self) {
        if !self.slots.is_empty() {
            trace!("releasing {} slots", self.slots.len());
            self.slots = Box::default();
        }
    }

    fn insert_new(&mut self, key: &[u8], value: i32) {
        if self.slots.is_empty() {
            self.grow();
        }
        // At most two passes: a growth always appends free slots.
        let idx = loop {
            match self.free_position() {
                Some(idx) => break idx,
                None => self.grow(),
            }
        };
        self.slots[idx].assign(key, value);
    }

    fn position(&self, key: &[u8]) -> Option<usize> {
        if self.slots.is_empty() || key.is_empty() {
            return None;
        }
        self.slots.iter().position(|e| e.matches(key))
    }

    fn free_position(&self) -> Option<usize> {
        self.slots.iter().position(Entry::is_free)
    }

    fn grow(&mut self) {
        let old_cap = self.slots.len();
        let new_cap = if old_cap == 0 {
            BASELINE_CAPACITY
        } else {
            old_cap * 2
        };
        let mut slots = vec![Entry::FREE; new_cap].into_boxed_slice();
        slots[..old_cap].copy_from_slice(&self.slots);
        self.slots = slots;
        trace!("grew from {} to {} slots", old_cap, new_cap);
    }
}

impl Default for FixedKeyMap {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FixedKeyMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (String::from_utf8_lossy(k), v)))
            .finish()
    }
}

/// Panics with `key not found` when the key is absent. Use
/// [`FixedKeyMap::value`] or [`FixedKeyMap::lookup_value`] to handle absence.
impl<K: AsRef<[u8]>> Index<K> for FixedKeyMap {
    type Output = i32;

    fn index(&self, key: K) -> &i32 {
        match self.position(key.as_ref()) {
            Some(idx) => self.slots[idx].value_ref(),
            None => panic!("{}", MapError::KeyNotFound),
        }
    }
}

/// Panics with `key not found` when the key is absent. The key is never
/// inserted implicitly.
impl<K: AsRef<[u8]>> IndexMut<K> for FixedKeyMap {
    fn index_mut(&mut self, key: K) -> &mut i32 {
        match self.position(key.as_ref()) {
            Some(idx) => self.slots[idx].value_mut(),
            None => panic!("{}", MapError::KeyNotFound),
        }
    }
}
