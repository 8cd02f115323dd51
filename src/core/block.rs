//! Fixed-size physical memory blocks
//!
//! The store is built once from a list of sizes. Block indices are stable for
//! the lifetime of the store: blocks are never inserted, removed or resized,
//! only their allocation flag flips from free to allocated.

use crate::error::{FitError, Result};
use serde::{Deserialize, Serialize};

/// A single physical memory block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    size: u64,
    allocated: bool,
}

impl Block {
    fn new(size: u64) -> Self {
        Block {
            size,
            allocated: false,
        }
    }

    /// Capacity of the block
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    pub fn is_free(&self) -> bool {
        !self.allocated
    }

    /// Check if this block is free and large enough for `request`
    pub fn fits(&self, request: u64) -> bool {
        !self.allocated && self.size >= request
    }
}

/// Ordered, fixed-length collection of blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStore {
    blocks: Vec<Block>,

    /// Number of blocks still free
    free_blocks: usize,
}

impl BlockStore {
    /// Create a store with one free block per size, index-aligned
    ///
    /// # Errors
    ///
    /// Returns `InvalidBlockSize` if any size is zero.
    pub fn new(sizes: &[u64]) -> Result<Self> {
        if let Some(index) = sizes.iter().position(|&size| size == 0) {
            return Err(FitError::InvalidBlockSize { index, size: 0 });
        }

        let blocks: Vec<Block> = sizes.iter().map(|&size| Block::new(size)).collect();
        let free_blocks = blocks.len();

        Ok(BlockStore {
            blocks,
            free_blocks,
        })
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Check if a specific block is allocated (out-of-range reads as free)
    pub fn is_allocated(&self, index: usize) -> bool {
        self.blocks
            .get(index)
            .map(Block::is_allocated)
            .unwrap_or(false)
    }

    /// Mark a block as allocated
    ///
    /// Only the allocator calls this, with an index taken from scanning the
    /// store itself; the checks guard the invariant rather than user input.
    pub(crate) fn mark_allocated(&mut self, index: usize) -> Result<()> {
        let block = self
            .blocks
            .get_mut(index)
            .ok_or(FitError::InvalidBlockId(index))?;

        if block.allocated {
            return Err(FitError::BlockAlreadyAllocated(index));
        }

        block.allocated = true;
        self.free_blocks -= 1;
        Ok(())
    }

    pub fn total_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn free_blocks(&self) -> usize {
        self.free_blocks
    }

    /// Sum of all block sizes
    ///
    /// Widened to `u128` so any number of `u64` sizes sums without overflow.
    pub fn total_capacity(&self) -> u128 {
        self.blocks.iter().map(|b| u128::from(b.size())).sum()
    }

    /// Sum of the sizes of free blocks
    pub fn free_capacity(&self) -> u128 {
        self.blocks
            .iter()
            .filter(|b| b.is_free())
            .map(|b| u128::from(b.size()))
            .sum()
    }

    /// Size of the largest free block, if any
    pub fn largest_free(&self) -> Option<u64> {
        self.blocks
            .iter()
            .filter(|b| b.is_free())
            .map(Block::size)
            .max()
    }
}

impl<'a> IntoIterator for &'a BlockStore {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
