//! IMAP command tag generator.
//!
//! Tags are used to match commands with their responses.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::Tag;

/// Width of every generated tag, in hex digits.
pub const TAG_WIDTH: usize = 16;

/// Tag generator for IMAP commands.
///
/// Tags are a 64-bit counter rendered as sixteen uppercase hex digits. The
/// counter starts from the wall clock so tags from separate sessions are
/// unlikely to collide with each other.
#[derive(Debug)]
pub struct TagGenerator {
    counter: AtomicU64,
}

impl TagGenerator {
    /// Creates a generator whose first tag is `start`.
    #[must_use]
    pub const fn starting_at(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }

    /// Creates a generator seeded from the current time.
    #[must_use]
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX));
        Self::starting_at(seed)
    }

    /// Generates the next tag. Wraps around at `u64::MAX`.
    #[must_use]
    pub fn next(&self) -> Tag {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Tag::new(format!("{n:016X}"))
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new()
    }
}
