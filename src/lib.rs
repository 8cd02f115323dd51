//! # blockfit - Contiguous Block Allocation Strategies
//!
//! `blockfit` models placing memory requests into a fixed set of fixed-size
//! physical blocks, with a flat page table recording which block backs each
//! virtual page.
//!
//! - **Four strategies**: first-fit, best-fit, worst-fit and next-fit
//! - **All-or-nothing requests**: a request allocates exactly one block or changes nothing
//! - **Page table**: optional virtual page -> block index mapping per allocation
//! - **Snapshots and stats**: display records, JSON export, waste and fragmentation figures
//!
//! ## Quick Start
//!
//! ```rust
//! use blockfit::{Allocator, PageEntry, Result};
//!
//! # fn main() -> Result<()> {
//! let mut allocator = Allocator::with_pages(&[100, 500, 200, 300, 600, 250], 3)?;
//!
//! assert!(allocator.first_fit_page(150, 0)?); // block 1 (500)
//! assert!(allocator.first_fit_page(450, 1)?); // block 4 (600)
//! assert!(!allocator.first_fit(700)?);        // nothing large enough
//!
//! for status in allocator.display_memory() {
//!     println!("{}", status);
//! }
//! assert_eq!(allocator.page_table().entry(1), Some(PageEntry::Frame(4)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Choosing a strategy at runtime
//!
//! ```rust
//! use blockfit::{AllocationStrategy, Allocator};
//!
//! # fn main() -> blockfit::Result<()> {
//! let strategy: AllocationStrategy = "worst-fit".parse()?;
//! let mut allocator = Allocator::new(&[100, 500, 200])?;
//!
//! let allocation = allocator.allocate(strategy, 150, None)?.unwrap();
//! assert_eq!(allocation.block_index, 1);
//! assert_eq!(allocation.waste(), 350);
//! # Ok(())
//! # }
//! ```

pub mod core;

// Re-export core modules internally so crate:: paths in core still work
pub(crate) use crate::core::{allocator, block, config, error, page_table, snapshot};

pub use crate::core::{
    allocator::{Allocation, AllocationStats, AllocationStrategy, Allocator, AllocatorBuilder},
    block::{Block, BlockStore},
    config::{RequestSpec, SimulatorConfig, DEMO_BLOCK_SIZES},
    error::{FitError, Result},
    page_table::{PageEntry, PageTable, PageTableIter},
    snapshot::{BlockStatus, MemorySnapshot, PageMapping},
};
