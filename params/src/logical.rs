//! Logical to physical index mapping.
//!
//! Low-level programs address constants by register ("logical") index. The
//! [`LogicalBufferMap`] assigns each logical index a region inside the
//! physical float or int buffer the first time it is used. Once assigned, a
//! region never moves: parameter sets created from the same program all bind
//! against the same offsets, and a set may hold offsets it resolved earlier.
//!
//! The map is shared between every parameter set of a program and can be
//! grown from several threads at once, so all access goes through a lock.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::types::Variability;

/// Physical index of a logical slot that has not been allocated.
pub const UNUSED_PHYSICAL_INDEX: usize = usize::MAX;

/// Where a logical index lives in the physical buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogicalIndexUse {
    /// Offset into the physical buffer.
    pub physical_index: usize,
    /// Number of slots currently reserved for this index.
    pub current_size: usize,
    /// How frequently values written here change.
    pub variability: Variability,
}

impl Default for LogicalIndexUse {
    fn default() -> Self {
        Self {
            physical_index: UNUSED_PHYSICAL_INDEX,
            current_size: 0,
            variability: Variability::GLOBAL,
        }
    }
}

impl LogicalIndexUse {
    /// Create a use record for an allocated region.
    pub fn new(physical_index: usize, current_size: usize, variability: Variability) -> Self {
        Self {
            physical_index,
            current_size,
            variability,
        }
    }

    /// Returns true if this use points at a real physical region.
    pub fn is_allocated(&self) -> bool {
        self.physical_index != UNUSED_PHYSICAL_INDEX
    }
}

#[derive(Debug, Default)]
struct LogicalBufferMapInner {
    map: BTreeMap<usize, LogicalIndexUse>,
    buffer_size: usize,
}

/// Thread-safe, grow-only map from logical index to physical region.
#[derive(Debug, Default)]
pub struct LogicalBufferMap {
    inner: Mutex<LogicalBufferMapInner>,
}

static_assertions::assert_impl_all!(LogicalBufferMap: Send, Sync);

impl LogicalBufferMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of physical slots allocated so far.
    pub fn buffer_size(&self) -> usize {
        self.inner.lock().buffer_size
    }

    /// Number of mapped logical indices.
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    /// Returns true if no logical index has been mapped.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().map.is_empty()
    }

    /// Current mapping for a logical index.
    pub fn get(&self, logical_index: usize) -> Option<LogicalIndexUse> {
        self.inner.lock().map.get(&logical_index).copied()
    }

    /// Look up or allocate the region for `logical_index`.
    ///
    /// An existing mapping is returned unchanged unless `requested_size` is
    /// larger than its current size. In that case the region grows in place
    /// when it is the last region of the buffer; otherwise growing would
    /// require relocating it, which is never done, and the mapping keeps its
    /// size.
    ///
    /// A new mapping is placed at the end of the buffer. A request of `n`
    /// slots maps `ceil(n / 4)` consecutive logical indices, one per
    /// 4-component register, starting at `logical_index`. Returns `None` for
    /// a new index with `requested_size == 0`.
    pub fn use_index(
        &self,
        logical_index: usize,
        requested_size: usize,
        variability: Variability,
    ) -> Option<LogicalIndexUse> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let buffer_size = inner.buffer_size;

        if let Some(existing) = inner.map.get_mut(&logical_index) {
            if requested_size > existing.current_size {
                if existing.physical_index + existing.current_size == buffer_size {
                    let grow_by = requested_size - existing.current_size;
                    existing.current_size = requested_size;
                    let updated = *existing;
                    inner.buffer_size += grow_by;
                    return Some(updated);
                }
                log::warn!(
                    "Logical index {} cannot grow from {} to {} slots without relocation",
                    logical_index,
                    existing.current_size,
                    requested_size
                );
            }
            return Some(*existing);
        }

        if requested_size == 0 {
            return None;
        }

        let physical_index = buffer_size;
        let registers = requested_size.div_ceil(4);
        for register in 0..registers {
            let offset = register * 4;
            inner.map.entry(logical_index + register).or_insert_with(|| {
                LogicalIndexUse::new(
                    physical_index + offset,
                    requested_size - offset,
                    variability,
                )
            });
        }
        inner.buffer_size += requested_size;

        inner.map.get(&logical_index).copied()
    }

    /// Change the recorded variability of a mapped logical index.
    pub fn set_variability(&self, logical_index: usize, variability: Variability) -> bool {
        match self.inner.lock().map.get_mut(&logical_index) {
            Some(entry) => {
                entry.variability = variability;
                true
            }
            None => false,
        }
    }

    /// Reverse lookup: the logical index whose region starts at `physical_index`.
    pub fn logical_for_physical(&self, physical_index: usize) -> Option<usize> {
        self.inner
            .lock()
            .map
            .iter()
            .find(|(_, entry)| entry.physical_index == physical_index)
            .map(|(logical, _)| *logical)
    }

    /// Snapshot of all mappings in logical index order.
    pub fn entries(&self) -> Vec<(usize, LogicalIndexUse)> {
        self.inner
            .lock()
            .map
            .iter()
            .map(|(logical, entry)| (*logical, *entry))
            .collect()
    }
}
