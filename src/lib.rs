//! A fixed-capacity bitmap that many threads can set bits in at once,
//! without a mutex.
//! `no_std`, only `core` and `alloc`.
//!
//! [`ConcurrentBitmap`] is the main struct in this library. It is meant as a
//! low-level building block: marking "seen" indices, tracking completion
//! flags and similar jobs where every caller needs to know whether *its own*
//! call was the one that flipped a bit from unset to set.
//!
//! # Examples
//! ```
//! use concurrent_bitmap::ConcurrentBitmap;
//!
//! let bitmap = ConcurrentBitmap::new(64);
//! assert!(bitmap.set(3));
//! assert!(!bitmap.set(3));
//! assert!(bitmap.is_set(3));
//! assert_eq!(bitmap.count_ones(), 1);
//! ```
//!
//! Sharing between threads only needs a shared reference:
//! ```
//! use concurrent_bitmap::ConcurrentBitmap;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::thread;
//!
//! let bitmap = ConcurrentBitmap::new(8);
//! let winners = AtomicUsize::new(0);
//! thread::scope(|s| {
//!     for _ in 0..4 {
//!         s.spawn(|| {
//!             if bitmap.set(5) {
//!                 winners.fetch_add(1, Ordering::Relaxed);
//!             }
//!         });
//!     }
//! });
//! assert_eq!(winners.into_inner(), 1);
//! ```
//!
//! # Features
//!
//! - `#![no_std]` compatible (requires `alloc`)
//! - Storage in 32-bit atomic segments, `segment_count(len)` of them
//! - Lock-free `set` through `&self` that reports the 0 -> 1 transition
//! - Exactly one winner per transition, however many threads race
//! - `unsafe_is_set` for fence-free reads once all setters are joined
//! - `reset` to clear and resize, guarded by `&mut self`
//! - Fallible `try_*` variants returning [`BitmapError`]

#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod bitmap;
mod error;

pub use bitmap::{ConcurrentBitmap, SEGMENT_BITS, segment_count};
pub use error::BitmapError;
