use crate::error::{NetworkError, Result};

/// Capacity used by [`SampleBuffer::default`].
pub const DEFAULT_CAPACITY: usize = 1000;

/// Fixed-capacity store for samples, labels or scores collected before a run.
///
/// Pushing past capacity is an error rather than a reallocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> SampleBuffer<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) -> Result<()> {
        if self.items.len() >= self.capacity {
            return Err(NetworkError::BufferOverflow {
                capacity: self.capacity,
            });
        }
        self.items.push(item);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<&T> {
        self.items.get(index).ok_or(NetworkError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(NetworkError::IndexOutOfRange { index, len })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn count_where<P>(&self, mut pred: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().filter(|item| pred(item)).count()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: PartialOrd + Copy> SampleBuffer<T> {
    /// Smallest element; `None` when empty. Incomparable pairs (NaN) are skipped over.
    pub fn min(&self) -> Option<T> {
        self.items
            .iter()
            .copied()
            .reduce(|a, b| if b < a { b } else { a })
    }

    /// Largest element; `None` when empty.
    pub fn max(&self) -> Option<T> {
        self.items
            .iter()
            .copied()
            .reduce(|a, b| if b > a { b } else { a })
    }
}

impl<T> Default for SampleBuffer<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
