//! Read-only views of allocator state for presentation
//!
//! These records are produced by the display operations on
//! [`Allocator`](crate::allocator::Allocator); building them never mutates state.

use crate::error::Result;
use crate::page_table::PageEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStatus {
    pub index: usize,
    pub size: u64,
    pub allocated: bool,
}

impl BlockStatus {
    pub fn status(&self) -> &'static str {
        if self.allocated {
            "Allocated"
        } else {
            "Free"
        }
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block of size {}: {}", self.size, self.status())
    }
}

/// One page table row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMapping {
    pub page: usize,
    pub entry: PageEntry,
}

impl fmt::Display for PageMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page {} -> {}", self.page, self.entry)
    }
}

/// Full picture of blocks and page table at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub blocks: Vec<BlockStatus>,
    pub pages: Vec<PageMapping>,
    /// Next-fit cursor at the time of the snapshot
    pub cursor: usize,
}

impl MemorySnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for MemorySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            writeln!(f, "{}", block)?;
        }
        if !self.pages.is_empty() {
            writeln!(f, "Page table:")?;
            for mapping in &self.pages {
                writeln!(f, "  {}", mapping)?;
            }
        }
        Ok(())
    }
}
