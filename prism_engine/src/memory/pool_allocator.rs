/// Pooled block allocator backing resource payloads
///
/// Vertex/index bytes, pixels and shader code are kept in `PoolBlock`s
/// handed out by an `Allocator`. `PoolAllocator` rounds requests up to
/// power-of-two size classes and recycles both the storage and the block ids.

use std::sync::{Arc, Mutex};
use rustc_hash::FxHashSet;
use crate::error::{Error, Result};
use crate::{engine_error, engine_warn};

/// Smallest size class (16 bytes)
const MIN_CLASS_SHIFT: u32 = 4;

/// Storage kept per size class once returned
const MAX_POOLED_PER_CLASS: usize = 32;

// ===== BLOCK =====

/// A block of pooled memory
///
/// Blocks are not `Clone`: each one is returned to its allocator exactly once.
#[derive(Debug)]
pub struct PoolBlock {
    id: u32,
    len: usize,
    storage: Vec<u8>,
}

impl PoolBlock {
    /// Allocator-unique block id (recycled after `free`)
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Requested size in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the size class backing this block
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.storage[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[..self.len]
    }
}

// ===== ALLOCATOR TRAIT =====

/// Allocator interface consumed by the resource factories
pub trait Allocator: Send {
    /// Allocate a zero-filled block of `size` bytes
    ///
    /// Returns None when the allocator cannot satisfy the request.
    fn alloc(&mut self, size: usize) -> Option<PoolBlock>;

    /// Return a block obtained from `alloc` on this allocator
    fn free(&mut self, block: PoolBlock);
}

/// Shared allocator handle held by factories
pub type SharedAllocator = Arc<Mutex<dyn Allocator>>;

/// Copy `bytes` into a freshly allocated block
pub fn store_bytes(allocator: &SharedAllocator, bytes: &[u8]) -> Result<PoolBlock> {
    let mut allocator = allocator.lock()
        .map_err(|_| Error::BackendError("Allocator lock poisoned".to_string()))?;
    let mut block = allocator.alloc(bytes.len()).ok_or(Error::OutOfMemory)?;
    block.as_mut_slice().copy_from_slice(bytes);
    Ok(block)
}

/// Allocate a zero-filled block without staging the bytes first
pub fn alloc_zeroed(allocator: &SharedAllocator, size: usize) -> Result<PoolBlock> {
    let mut allocator = allocator.lock()
        .map_err(|_| Error::BackendError("Allocator lock poisoned".to_string()))?;
    allocator.alloc(size).ok_or(Error::OutOfMemory)
}

/// Return a block to the shared allocator
pub fn release_block(allocator: &SharedAllocator, block: PoolBlock) {
    match allocator.lock() {
        Ok(mut allocator) => allocator.free(block),
        Err(_) => engine_error!("prism::PoolAllocator",
            "Allocator lock poisoned, block {} leaked", block.id()),
    }
}

// ===== POOL ALLOCATOR =====

/// Size-class pooled allocator with an optional byte budget
pub struct PoolAllocator {
    /// Returned storage, indexed by size class
    classes: Vec<Vec<Vec<u8>>>,
    live: FxHashSet<u32>,
    free_ids: Vec<u32>,
    next_id: u32,
    live_bytes: usize,
    peak_bytes: usize,
    budget: Option<usize>,
}

impl PoolAllocator {
    /// Create an unbounded allocator
    pub fn new() -> Self {
        Self {
            classes: Vec::new(),
            live: FxHashSet::default(),
            free_ids: Vec::new(),
            next_id: 0,
            live_bytes: 0,
            peak_bytes: 0,
            budget: None,
        }
    }

    /// Create an allocator that refuses to exceed `budget` live bytes
    pub fn with_budget(budget: usize) -> Self {
        Self { budget: Some(budget), ..Self::new() }
    }

    /// Number of blocks currently handed out
    pub fn live_blocks(&self) -> usize {
        self.live.len()
    }

    /// Sum of requested sizes of all live blocks
    pub fn live_bytes(&self) -> usize {
        self.live_bytes
    }

    /// Highest `live_bytes` ever observed
    pub fn peak_bytes(&self) -> usize {
        self.peak_bytes
    }

    /// Storage buffers waiting for reuse, across all size classes
    pub fn pooled_blocks(&self) -> usize {
        self.classes.iter().map(Vec::len).sum()
    }

    pub fn budget(&self) -> Option<usize> {
        self.budget
    }

    /// Size class index for a request, None past the largest power of two
    fn class_of(size: usize) -> Option<usize> {
        let rounded = size.max(1 << MIN_CLASS_SHIFT).checked_next_power_of_two()?;
        Some((rounded.trailing_zeros() - MIN_CLASS_SHIFT) as usize)
    }

    /// Fresh zeroed storage, None when the system refuses the reservation
    fn fresh_storage(capacity: usize) -> Option<Vec<u8>> {
        let mut storage = Vec::new();
        storage.try_reserve_exact(capacity).ok()?;
        storage.resize(capacity, 0);
        Some(storage)
    }

    fn class_capacity(class: usize) -> usize {
        1usize << (class as u32 + MIN_CLASS_SHIFT)
    }

    fn next_block_id(&mut self) -> u32 {
        self.free_ids.pop().unwrap_or_else(|| {
            let id = self.next_id;
            self.next_id += 1;
            id
        })
    }
}

impl Default for PoolAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator for PoolAllocator {
    fn alloc(&mut self, size: usize) -> Option<PoolBlock> {
        if let Some(budget) = self.budget {
            let within = self.live_bytes.checked_add(size).is_some_and(|total| total <= budget);
            if !within {
                engine_warn!("prism::PoolAllocator",
                    "Allocation of {} bytes exceeds budget ({} / {} live)",
                    size, self.live_bytes, budget);
                return None;
            }
        }

        let Some(class) = Self::class_of(size) else {
            engine_warn!("prism::PoolAllocator", "Allocation of {} bytes has no size class", size);
            return None;
        };
        if self.classes.len() <= class {
            self.classes.resize_with(class + 1, Vec::new);
        }
        let mut storage = match self.classes[class].pop() {
            Some(storage) => storage,
            None => match Self::fresh_storage(Self::class_capacity(class)) {
                Some(storage) => storage,
                None => {
                    engine_warn!("prism::PoolAllocator", "System refused {} bytes", Self::class_capacity(class));
                    return None;
                }
            },
        };
        storage[..size].fill(0);

        let id = self.next_block_id();
        self.live.insert(id);
        self.live_bytes += size;
        self.peak_bytes = self.peak_bytes.max(self.live_bytes);

        Some(PoolBlock { id, len: size, storage })
    }

    fn free(&mut self, block: PoolBlock) {
        debug_assert!(self.live.contains(&block.id), "freeing a block this allocator does not own: {}", block.id);
        if !self.live.remove(&block.id) {
            engine_error!("prism::PoolAllocator", "Refusing to free foreign block {}", block.id);
            return;
        }

        self.live_bytes -= block.len;
        self.free_ids.push(block.id);

        let Some(class) = Self::class_of(block.storage.len()) else {
            return;
        };
        if self.classes.len() <= class {
            self.classes.resize_with(class + 1, Vec::new);
        }
        if self.classes[class].len() < MAX_POOLED_PER_CLASS {
            self.classes[class].push(block.storage);
        }
    }
}

#[cfg(test)]
#[path = "pool_allocator_tests.rs"]
mod tests;
