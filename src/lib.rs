//! # fixmap
//!
//! A linear-scan key-value map over fixed 64-byte records, and the
//! allocation micro-benchmark built around it.
//!
//! [`FixedKeyMap`] maps short byte-string keys to `i32` values. Slots are
//! searched front to back, removed entries are tombstoned in place, and the
//! slot array doubles from 8 whenever it runs out of free slots. It is meant
//! to be cheap to create and throw away, not to scale.
//!
//! ## Example
//!
//! ```rust
//! use fixmap::FixedKeyMap;
//!
//! let mut m = FixedKeyMap::new();
//! m.add_or_assign("user", 1).unwrap();
//! m.add_or_assign("user", 2).unwrap();
//! assert_eq!(m.lookup_value("user"), Some(2));
//!
//! m.remove("user");
//! assert_eq!(m.lookup_value("user"), None);
//! assert_eq!(m.capacity(), 8);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bench;
pub mod entry;
pub mod error;
pub mod logger;
pub mod map;

pub use bench::{BenchConfig, BenchReport, Placement, Timer};
pub use entry::{Entry, MAX_KEY_LEN};
pub use error::{MapError, Result};
pub use map::FixedKeyMap;

#[cfg(test)]
mod proptests;
