//! Growable backing store for constant values.
//!
//! [`ConstantStorage`] is a contiguous array of plain-old-data values (`f32`
//! for float constants, `i32` for int and sampler constants). Growth is
//! geometric in fixed-size blocks so appending stays amortized O(1), and new
//! slots are always zero-filled.

use std::ops::{Index, IndexMut};

use bytemuck::Pod;

/// Granularity of capacity growth, in elements.
pub const STORAGE_GROW_BLOCK: usize = 16;

/// Contiguous, zero-padded value storage for one parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantStorage<T: Pod> {
    values: Vec<T>,
}

/// Float constant storage.
pub type FloatConstantStorage = ConstantStorage<f32>;
/// Int and sampler constant storage.
pub type IntConstantStorage = ConstantStorage<i32>;

impl<T: Pod> Default for ConstantStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Pod> ConstantStorage<T> {
    /// Create empty storage.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Create storage holding `len` zero values.
    pub fn zeroed(len: usize) -> Self {
        let mut storage = Self::new();
        storage.resize(len);
        storage
    }

    /// Number of values stored.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Allocated capacity.
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    fn reserve_for(&mut self, new_len: usize) {
        if new_len <= self.values.capacity() {
            return;
        }
        let doubled = self.values.capacity().saturating_mul(2);
        let target = new_len.max(doubled).div_ceil(STORAGE_GROW_BLOCK) * STORAGE_GROW_BLOCK;
        self.values.reserve_exact(target - self.values.len());
    }

    /// Append a value and return its index.
    pub fn add(&mut self, value: T) -> usize {
        self.reserve_for(self.values.len() + 1);
        self.values.push(value);
        self.values.len() - 1
    }

    /// Get the value at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.values.get(index).copied()
    }

    /// Overwrite the value at `index`. Returns false when out of range.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Grow to at least `len` slots, filling new ones with zero.
    ///
    /// Never shrinks; a smaller `len` is a no-op.
    pub fn resize(&mut self, len: usize) {
        if len <= self.values.len() {
            return;
        }
        self.reserve_for(len);
        self.values.resize(len, T::zeroed());
    }

    /// Remove `count` values starting at `index`, shifting the tail down.
    ///
    /// The range is clamped to the current length.
    pub fn remove_range(&mut self, index: usize, count: usize) {
        let start = index.min(self.values.len());
        let end = index.saturating_add(count).min(self.values.len());
        self.values.drain(start..end);
    }

    /// Remove all values, keeping the allocation.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Copy `src` into the storage starting at `offset`.
    ///
    /// Values that would land past the end are dropped. Returns the number
    /// of values written.
    pub fn write(&mut self, offset: usize, src: &[T]) -> usize {
        let available = self.values.len().saturating_sub(offset);
        let count = src.len().min(available);
        if count > 0 {
            self.values[offset..offset + count].copy_from_slice(&src[..count]);
        }
        count
    }

    /// Borrow `len` values starting at `offset`, if the range is in bounds.
    pub fn read(&self, offset: usize, len: usize) -> Option<&[T]> {
        let end = offset.checked_add(len)?;
        self.values.get(offset..end)
    }

    /// Contiguous view of all values.
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Mutable contiguous view of all values.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Raw bytes of the storage, suitable for uploading into a GPU buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.values)
    }
}

impl<T: Pod> Index<usize> for ConstantStorage<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.values[index]
    }
}

impl<T: Pod> IndexMut<usize> for ConstantStorage<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.values[index]
    }
}

impl<T: Pod> From<Vec<T>> for ConstantStorage<T> {
    fn from(values: Vec<T>) -> Self {
        Self { values }
    }
}
