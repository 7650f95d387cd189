//! Append-only sequence with tail-sharing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// An append-only sequence with cheap snapshots.
///
/// A series is a window over a shared backing vector. Cloning a series, or
/// taking a [`prefix`](Self::prefix), shares the backing storage; pushing
/// onto an up-to-date series appends in place when the storage is not
/// shared, and copies the visible window otherwise. Consumers that fold a
/// series incrementally remember how many items they consumed and resume
/// from [`tail`](Self::tail).
#[derive(Clone)]
pub struct IncrementalSeries<T> {
    items: Arc<Vec<T>>,
    len: usize,
}

impl<T: Clone> IncrementalSeries<T> {
    /// Creates an empty series.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            len: 0,
        }
    }

    /// Creates a series over the given items.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        let len = items.len();
        Self {
            items: Arc::new(items),
            len,
        }
    }

    /// Returns the number of visible items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no items are visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the visible items as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.len]
    }

    /// Returns the item at `index`, if visible.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// Returns the last visible item.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.as_slice().last()
    }

    /// Iterates over the visible items.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Iterates over the visible items starting at `from`.
    ///
    /// This is the resume point for incremental folds.
    pub fn tail(&self, from: usize) -> std::slice::Iter<'_, T> {
        self.items[from.min(self.len)..self.len].iter()
    }

    /// Returns a snapshot of the first `len` items, sharing storage.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            items: Arc::clone(&self.items),
            len: len.min(self.len),
        }
    }

    /// Appends an item.
    ///
    /// A series whose window does not cover its whole backing vector (a
    /// prefix snapshot) first copies the visible window so the shared tail
    /// is never clobbered.
    pub fn push(&mut self, item: T) {
        if self.len < self.items.len() {
            let mut copied: Vec<T> = self.as_slice().to_vec();
            copied.push(item);
            self.len = copied.len();
            self.items = Arc::new(copied);
        } else {
            Arc::make_mut(&mut self.items).push(item);
            self.len += 1;
        }
    }
}

impl<T: Clone> Default for IncrementalSeries<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for IncrementalSeries<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items[..self.len]).finish()
    }
}

impl<T: PartialEq> PartialEq for IncrementalSeries<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items[..self.len] == other.items[..other.len]
    }
}

impl<T: Eq> Eq for IncrementalSeries<T> {}

impl<T: Serialize> Serialize for IncrementalSeries<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items[..self.len].serialize(serializer)
    }
}

impl<'de, T: Clone + Deserialize<'de>> Deserialize<'de> for IncrementalSeries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_vec(Vec::<T>::deserialize(deserializer)?))
    }
}

impl<'a, T: Clone> IntoIterator for &'a IncrementalSeries<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
