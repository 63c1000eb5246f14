//! String Table with Bounded Deduplication
//!
//! Two independent pools:
//! - Atomic: names, prefixes, namespace URIs, language tags, base URIs.
//!   These repeat heavily, so the dedupe window is large.
//! - Value: text, comment, PI and attribute content. Mostly unique, so the
//!   window is small and deduplication is best-effort.
//!
//! Both pools reserve index 0 for `""` and index 1 for "no value".
//! Lookups during build go through a last-hit check, then an LRU window;
//! the windows are dropped when the table is frozen.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::error::BuildError;

/// Index into one of the string pools
pub type StrId = u32;

/// The empty string
pub const EMPTY: StrId = 0;

/// "No value", distinct from the empty string
pub const NO_VALUE: StrId = 1;

/// Frozen, read-only string storage shared by all cursors of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTable {
    atomic: Vec<Box<str>>,
    values: Vec<Box<str>>,
}

impl StringTable {
    fn with_capacity(atomic: usize, values: usize) -> Self {
        let mut table = StringTable {
            atomic: Vec::with_capacity(atomic.max(2)),
            values: Vec::with_capacity(values.max(2)),
        };
        for pool in [&mut table.atomic, &mut table.values] {
            pool.push(Box::from(""));
            pool.push(Box::from(""));
        }
        table
    }

    /// Atomic-pool string; "no value" and unknown ids read as `""`
    #[inline]
    pub fn atomic(&self, id: StrId) -> &str {
        self.atomic.get(id as usize).map(|s| &**s).unwrap_or("")
    }

    /// Value-pool string; "no value" and unknown ids read as `""`
    #[inline]
    pub fn value(&self, id: StrId) -> &str {
        self.values.get(id as usize).map(|s| &**s).unwrap_or("")
    }

    /// Value-pool string, `None` for "no value"
    pub fn value_opt(&self, id: StrId) -> Option<&str> {
        if id == NO_VALUE {
            None
        } else {
            self.values.get(id as usize).map(|s| &**s)
        }
    }

    /// Number of atomic entries, reserved ones included
    pub fn atomic_len(&self) -> usize {
        self.atomic.len()
    }

    /// Number of value entries, reserved ones included
    pub fn value_len(&self) -> usize {
        self.values.len()
    }

    /// Bytes of string data held by both pools
    pub fn bytes_used(&self) -> usize {
        self.atomic.iter().chain(self.values.iter()).map(|s| s.len()).sum()
    }
}

/// Dedupe state for one pool
#[derive(Debug)]
struct DedupeWindow {
    last: StrId,
    recent: Option<LruCache<Box<str>, StrId>>,
}

impl DedupeWindow {
    fn new(size: usize) -> Self {
        DedupeWindow {
            last: EMPTY,
            recent: NonZeroUsize::new(size).map(LruCache::new),
        }
    }

    fn intern(
        &mut self,
        entries: &mut Vec<Box<str>>,
        s: &str,
        store: &'static str,
    ) -> Result<StrId, BuildError> {
        if s.is_empty() {
            return Ok(EMPTY);
        }

        // Same string as the previous lookup (sibling runs of one tag name)
        if self.last > NO_VALUE && entries.get(self.last as usize).map(|e| &**e) == Some(s) {
            return Ok(self.last);
        }

        if let Some(recent) = self.recent.as_mut() {
            if let Some(&id) = recent.get(s) {
                self.last = id;
                return Ok(id);
            }
        }

        let id = u32::try_from(entries.len())
            .ok()
            .filter(|&id| id < u32::MAX)
            .ok_or(BuildError::CapacityOverflow {
                store,
                max: u32::MAX - 1,
            })?;
        if entries.len() == entries.capacity() {
            entries.try_reserve(entries.len())?;
        }
        entries.push(Box::from(s));

        if let Some(recent) = self.recent.as_mut() {
            recent.put(Box::from(s), id);
        }
        self.last = id;
        Ok(id)
    }
}

/// Growable string table used while a document is being built
#[derive(Debug)]
pub struct StringPoolBuilder {
    table: StringTable,
    atomic_window: DedupeWindow,
    value_window: DedupeWindow,
}

impl StringPoolBuilder {
    /// Create a pool with the given dedupe window sizes (0 disables a window)
    pub fn new(atomic_window: usize, value_window: usize) -> Self {
        StringPoolBuilder {
            table: StringTable::with_capacity(64, 256),
            atomic_window: DedupeWindow::new(atomic_window),
            value_window: DedupeWindow::new(value_window),
        }
    }

    /// Intern a name-like string
    pub fn intern_atomic(&mut self, s: &str) -> Result<StrId, BuildError> {
        self.atomic_window
            .intern(&mut self.table.atomic, s, "atomic string")
    }

    /// Intern a content string
    pub fn intern_value(&mut self, s: &str) -> Result<StrId, BuildError> {
        self.value_window
            .intern(&mut self.table.values, s, "value string")
    }

    /// Read back an atomic string during build
    #[inline]
    pub fn atomic(&self, id: StrId) -> &str {
        self.table.atomic(id)
    }

    /// Read back a value string during build
    #[inline]
    pub fn value(&self, id: StrId) -> &str {
        self.table.value(id)
    }

    /// Drop the windows and trim both pools to size
    pub fn finish(self) -> StringTable {
        let mut table = self.table;
        table.atomic.shrink_to_fit();
        table.values.shrink_to_fit();
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_entries() {
        let mut pool = StringPoolBuilder::new(16, 4);
        assert_eq!(pool.intern_atomic("").unwrap(), EMPTY);
        assert_eq!(pool.intern_value("").unwrap(), EMPTY);

        let table = pool.finish();
        assert_eq!(table.atomic(EMPTY), "");
        assert_eq!(table.value_opt(EMPTY), Some(""));
        assert_eq!(table.value(NO_VALUE), "");
        assert_eq!(table.value_opt(NO_VALUE), None);
    }

    #[test]
    fn test_atomic_dedupe() {
        let mut pool = StringPoolBuilder::new(16, 4);
        let a = pool.intern_atomic("item").unwrap();
        let b = pool.intern_atomic("price").unwrap();
        let c = pool.intern_atomic("item").unwrap();
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert!(a > NO_VALUE);
        assert_eq!(pool.atomic(a), "item");
    }

    #[test]
    fn test_pools_are_independent() {
        let mut pool = StringPoolBuilder::new(16, 4);
        let name = pool.intern_atomic("x").unwrap();
        let value = pool.intern_value("y").unwrap();
        // Both are the first real entry of their pool
        assert_eq!(name, value);
        let table = pool.finish();
        assert_eq!(table.atomic(name), "x");
        assert_eq!(table.value(value), "y");
    }

    #[test]
    fn test_value_window_is_bounded() {
        let mut pool = StringPoolBuilder::new(16, 2);
        let first = pool.intern_value("a").unwrap();
        pool.intern_value("b").unwrap();
        pool.intern_value("c").unwrap();
        // "a" fell out of the two-entry window
        let again = pool.intern_value("a").unwrap();
        assert_ne!(first, again);
        assert_eq!(pool.value(again), "a");
    }

    #[test]
    fn test_disabled_window_still_hits_last() {
        let mut pool = StringPoolBuilder::new(0, 0);
        let a = pool.intern_value("same").unwrap();
        let b = pool.intern_value("same").unwrap();
        assert_eq!(a, b);
        pool.intern_value("other").unwrap();
        let c = pool.intern_value("same").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_bytes_used() {
        let mut pool = StringPoolBuilder::new(16, 4);
        pool.intern_atomic("abc").unwrap();
        pool.intern_value("de").unwrap();
        assert_eq!(pool.finish().bytes_used(), 5);
    }
}
