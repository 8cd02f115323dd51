//! Block allocator
//!
//! The allocator owns a [`BlockStore`] and a [`PageTable`] and places each
//! request into exactly one whole block, chosen by an [`AllocationStrategy`]:
//! - First-fit: lowest-index block that fits
//! - Best-fit: block leaving the least waste
//! - Worst-fit: block leaving the most waste
//! - Next-fit: first-fit resuming from the last allocated block
//!
//! A request either allocates one block (and maps one page, if asked) or
//! changes nothing.

pub mod strategy;

pub use strategy::AllocationStrategy;

use crate::block::BlockStore;
use crate::config::SimulatorConfig;
use crate::error::{FitError, Result};
use crate::page_table::PageTable;
use crate::snapshot::{BlockStatus, MemorySnapshot, PageMapping};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Record of one successful allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub strategy: AllocationStrategy,
    /// Requested size
    pub request: u64,
    pub block_index: usize,
    pub block_size: u64,
    /// Virtual page named by the request, if any
    pub page: Option<usize>,
    /// Whether the page table entry was written
    pub mapped: bool,
}

impl Allocation {
    /// Unused space left in the block
    pub fn waste(&self) -> u64 {
        self.block_size - self.request
    }
}

/// Allocator usage figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationStats {
    pub total_blocks: usize,
    pub free_blocks: usize,
    pub total_capacity: u128,
    pub free_capacity: u128,
    pub allocated_capacity: u128,
    /// Sum of all satisfied request sizes
    pub requested: u128,
    /// Space inside allocated blocks not covered by the request
    pub internal_waste: u128,
    pub failed_requests: usize,
    pub mapped_pages: usize,
}

/// Fixed-block allocator with a flat page table
#[derive(Debug, Clone)]
pub struct Allocator {
    blocks: BlockStore,
    page_table: PageTable,

    /// Next-fit starting point, index of the last next-fit allocation
    cursor: usize,

    /// Reject out-of-range pages before allocating instead of skipping the mapping
    strict_page_bounds: bool,

    history: Vec<Allocation>,
    failed_requests: usize,
}

impl Allocator {
    /// Create an allocator without paging
    pub fn new(block_sizes: &[u64]) -> Result<Self> {
        Self::with_pages(block_sizes, 0)
    }

    /// Create an allocator with `virtual_pages` unmapped page table entries
    pub fn with_pages(block_sizes: &[u64], virtual_pages: usize) -> Result<Self> {
        let blocks = BlockStore::new(block_sizes)?;
        debug!(
            "Created allocator with {} blocks, {} virtual pages",
            blocks.len(),
            virtual_pages
        );

        Ok(Allocator {
            blocks,
            page_table: PageTable::new(virtual_pages),
            cursor: 0,
            strict_page_bounds: false,
            history: Vec::new(),
            failed_requests: 0,
        })
    }

    /// Create an allocator from a simulator configuration
    pub fn from_config(config: &SimulatorConfig) -> Result<Self> {
        config.validate()?;
        AllocatorBuilder::new()
            .block_sizes(config.block_sizes.clone())
            .virtual_pages(config.virtual_pages)
            .strict_page_bounds(config.strict_page_bounds)
            .build()
    }

    /// Place `request` using `strategy`, optionally mapping `page` to the chosen block
    ///
    /// Returns `Ok(None)` when no free block is large enough. Blocks, page
    /// table and cursor are left untouched; only the `failed_requests`
    /// counter reported by [`stats`](Self::stats) is bumped.
    ///
    /// # Errors
    ///
    /// - `InvalidRequestSize` if `request` is zero
    /// - `PageOutOfRange` if strict page bounds are enabled and `page` is
    ///   outside the page table (checked before any mutation)
    pub fn allocate(
        &mut self,
        strategy: AllocationStrategy,
        request: u64,
        page: Option<usize>,
    ) -> Result<Option<Allocation>> {
        if request == 0 {
            return Err(FitError::InvalidRequestSize(request));
        }

        if let Some(page) = page {
            if self.strict_page_bounds && !self.page_table.contains_page(page) {
                return Err(FitError::PageOutOfRange {
                    page,
                    page_count: self.page_table.len(),
                });
            }
        }

        let (index, block_size) = match strategy
            .select(&self.blocks, request, self.cursor)
            .and_then(|index| self.blocks.get(index).map(|b| (index, b.size())))
        {
            Some(found) => found,
            None => {
                self.failed_requests += 1;
                info!("{}: No suitable block found for {}", strategy, request);
                return Ok(None);
            }
        };

        self.blocks.mark_allocated(index)?;

        let mapped = match page {
            Some(page) => {
                let written = self.page_table.map(page, index);
                if !written {
                    warn!(
                        "Virtual page {} out of range ({} pages), block {} left unmapped",
                        page,
                        self.page_table.len(),
                        index
                    );
                }
                written
            }
            None => false,
        };

        if strategy == AllocationStrategy::NextFit {
            debug!("Next-fit cursor {} -> {}", self.cursor, index);
            self.cursor = index;
        }

        info!(
            "{}: Allocated {} to block of size {}",
            strategy, request, block_size
        );

        let allocation = Allocation {
            strategy,
            request,
            block_index: index,
            block_size,
            page,
            mapped,
        };
        self.history.push(allocation);

        Ok(Some(allocation))
    }

    pub fn first_fit(&mut self, request: u64) -> Result<bool> {
        Ok(self
            .allocate(AllocationStrategy::FirstFit, request, None)?
            .is_some())
    }

    pub fn best_fit(&mut self, request: u64) -> Result<bool> {
        Ok(self
            .allocate(AllocationStrategy::BestFit, request, None)?
            .is_some())
    }

    pub fn worst_fit(&mut self, request: u64) -> Result<bool> {
        Ok(self
            .allocate(AllocationStrategy::WorstFit, request, None)?
            .is_some())
    }

    pub fn next_fit(&mut self, request: u64) -> Result<bool> {
        Ok(self
            .allocate(AllocationStrategy::NextFit, request, None)?
            .is_some())
    }

    /// First-fit allocation backing virtual page `page`
    pub fn first_fit_page(&mut self, request: u64, page: usize) -> Result<bool> {
        Ok(self
            .allocate(AllocationStrategy::FirstFit, request, Some(page))?
            .is_some())
    }

    /// Best-fit allocation backing virtual page `page`
    pub fn best_fit_page(&mut self, request: u64, page: usize) -> Result<bool> {
        Ok(self
            .allocate(AllocationStrategy::BestFit, request, Some(page))?
            .is_some())
    }

    /// Worst-fit allocation backing virtual page `page`
    pub fn worst_fit_page(&mut self, request: u64, page: usize) -> Result<bool> {
        Ok(self
            .allocate(AllocationStrategy::WorstFit, request, Some(page))?
            .is_some())
    }

    /// Next-fit allocation backing virtual page `page`
    pub fn next_fit_page(&mut self, request: u64, page: usize) -> Result<bool> {
        Ok(self
            .allocate(AllocationStrategy::NextFit, request, Some(page))?
            .is_some())
    }

    pub fn blocks(&self) -> &BlockStore {
        &self.blocks
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn strict_page_bounds(&self) -> bool {
        self.strict_page_bounds
    }

    /// Successful allocations, oldest first
    pub fn history(&self) -> &[Allocation] {
        &self.history
    }

    /// Size and status of every block, in index order
    pub fn display_memory(&self) -> Vec<BlockStatus> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, block)| BlockStatus {
                index,
                size: block.size(),
                allocated: block.is_allocated(),
            })
            .collect()
    }

    /// Every page table entry, in page order
    pub fn display_page_table(&self) -> Vec<PageMapping> {
        self.page_table
            .iter()
            .map(|(page, entry)| PageMapping { page, entry })
            .collect()
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            blocks: self.display_memory(),
            pages: self.display_page_table(),
            cursor: self.cursor,
        }
    }

    pub fn stats(&self) -> AllocationStats {
        let total_capacity = self.blocks.total_capacity();
        let free_capacity = self.blocks.free_capacity();
        let requested: u128 = self.history.iter().map(|a| u128::from(a.request)).sum();
        let internal_waste: u128 = self
            .history
            .iter()
            .map(|a| u128::from(a.waste()))
            .sum();

        AllocationStats {
            total_blocks: self.blocks.total_blocks(),
            free_blocks: self.blocks.free_blocks(),
            total_capacity,
            free_capacity,
            allocated_capacity: total_capacity - free_capacity,
            requested,
            internal_waste,
            failed_requests: self.failed_requests,
            mapped_pages: self.page_table.mapped_count(),
        }
    }

    /// External fragmentation (0.0 = all free space in one block)
    ///
    /// `1 - largest_free / free_capacity`, or 0.0 when nothing is free.
    pub fn fragmentation_score(&self) -> f64 {
        let free_capacity = self.blocks.free_capacity();
        match self.blocks.largest_free() {
            Some(largest) if free_capacity > 0 => 1.0 - largest as f64 / free_capacity as f64,
            _ => 0.0,
        }
    }
}

/// Builder for configuring an [`Allocator`]
///
/// # Examples
///
/// ```
/// use blockfit::AllocatorBuilder;
///
/// # fn main() -> blockfit::Result<()> {
/// let mut allocator = AllocatorBuilder::new()
///     .block_sizes(vec![100, 500, 200])
///     .virtual_pages(2)
///     .strict_page_bounds(true)
///     .build()?;
///
/// assert!(allocator.best_fit_page(150, 0)?);
/// # Ok(())
/// # }
/// ```
pub struct AllocatorBuilder {
    block_sizes: Vec<u64>,
    virtual_pages: usize,
    strict_page_bounds: bool,
}

impl AllocatorBuilder {
    pub fn new() -> Self {
        AllocatorBuilder {
            block_sizes: Vec::new(),
            virtual_pages: 0,
            strict_page_bounds: false,
        }
    }

    pub fn block_sizes(mut self, sizes: impl Into<Vec<u64>>) -> Self {
        self.block_sizes = sizes.into();
        self
    }

    pub fn virtual_pages(mut self, pages: usize) -> Self {
        self.virtual_pages = pages;
        self
    }

    /// Fail allocations naming an out-of-range page instead of skipping the mapping
    pub fn strict_page_bounds(mut self, strict: bool) -> Self {
        self.strict_page_bounds = strict;
        self
    }

    pub fn build(self) -> Result<Allocator> {
        let mut allocator = Allocator::with_pages(&self.block_sizes, self.virtual_pages)?;
        allocator.strict_page_bounds = self.strict_page_bounds;
        Ok(allocator)
    }
}

impl Default for AllocatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_table::PageEntry;

    const SIZES: [u64; 6] = [100, 500, 200, 300, 600, 250];

    fn allocated(allocator: &Allocator) -> Vec<bool> {
        allocator.blocks().iter().map(|b| b.is_allocated()).collect()
    }

    #[test]
    fn test_first_fit_sequence() {
        let mut alloc = Allocator::new(&SIZES).unwrap();

        assert!(alloc.first_fit(150).unwrap());
        assert!(alloc.first_fit(450).unwrap());
        assert!(!alloc.first_fit(700).unwrap());

        assert_eq!(
            allocated(&alloc),
            vec![false, true, false, false, true, false]
        );
    }

    #[test]
    fn test_zero_request_rejected() {
        let mut alloc = Allocator::new(&SIZES).unwrap();

        for strategy in AllocationStrategy::ALL {
            let result = alloc.allocate(strategy, 0, None);
            assert!(matches!(result, Err(FitError::InvalidRequestSize(0))));
        }
        assert_eq!(alloc.blocks().free_blocks(), SIZES.len());
        assert_eq!(alloc.stats().failed_requests, 0);
    }

    #[test]
    fn test_failed_request_changes_nothing() {
        let mut alloc = Allocator::with_pages(&SIZES, 2).unwrap();
        alloc.next_fit_page(250, 0).unwrap();

        let before = alloc.snapshot();
        for strategy in AllocationStrategy::ALL {
            assert!(alloc.allocate(strategy, 10_000, Some(1)).unwrap().is_none());
        }

        assert_eq!(alloc.snapshot(), before);
        assert_eq!(alloc.history().len(), 1);
        assert_eq!(alloc.stats().failed_requests, 4);
    }

    #[test]
    fn test_allocation_reports_chosen_block_size() {
        for strategy in AllocationStrategy::ALL {
            let mut alloc = Allocator::new(&SIZES).unwrap();
            for request in [150, 450, 90, 240] {
                let record = alloc.allocate(strategy, request, None).unwrap().unwrap();
                let block = alloc.blocks().get(record.block_index).unwrap();
                assert!(block.is_allocated());
                assert_eq!(record.block_size, block.size(), "{strategy} {request}");
                assert!(record.block_size >= request);
            }
        }
    }

    #[test]
    fn test_allocation_record() {
        let mut alloc = Allocator::with_pages(&SIZES, 1).unwrap();
        let record = alloc
            .allocate(AllocationStrategy::BestFit, 150, Some(0))
            .unwrap()
            .unwrap();

        assert_eq!(record.block_index, 2);
        assert_eq!(record.block_size, 200);
        assert_eq!(record.waste(), 50);
        assert!(record.mapped);
        assert_eq!(alloc.history(), &[record]);
    }

    #[test]
    fn test_next_fit_advances_cursor() {
        let mut alloc = Allocator::new(&SIZES).unwrap();
        assert_eq!(alloc.cursor(), 0);

        alloc.next_fit(150).unwrap(); // block 1
        assert_eq!(alloc.cursor(), 1);

        alloc.next_fit(150).unwrap(); // block 2
        assert_eq!(alloc.cursor(), 2);

        alloc.next_fit(550).unwrap(); // block 4
        assert_eq!(alloc.cursor(), 4);

        // 5 is 250, fits 200
        alloc.next_fit(200).unwrap();
        assert_eq!(alloc.cursor(), 5);

        // Wraps to 3 (300); 0 is too small
        alloc.next_fit(200).unwrap();
        assert_eq!(alloc.cursor(), 3);
    }

    #[test]
    fn test_next_fit_failure_keeps_cursor() {
        let mut alloc = Allocator::new(&SIZES).unwrap();
        alloc.next_fit(300).unwrap();
        assert_eq!(alloc.cursor(), 1);

        assert!(!alloc.next_fit(1000).unwrap());
        assert_eq!(alloc.cursor(), 1);
    }

    #[test]
    fn test_other_strategies_leave_cursor() {
        let mut alloc = Allocator::new(&SIZES).unwrap();
        alloc.worst_fit(100).unwrap();
        alloc.best_fit(100).unwrap();
        alloc.first_fit(100).unwrap();
        assert_eq!(alloc.cursor(), 0);
    }

    #[test]
    fn test_page_mapping() {
        let mut alloc = Allocator::with_pages(&SIZES, 3).unwrap();
        alloc.first_fit_page(150, 0).unwrap();
        alloc.first_fit_page(450, 1).unwrap();

        let entries: Vec<_> = alloc.page_table().iter().map(|(_, e)| e).collect();
        assert_eq!(
            entries,
            vec![PageEntry::Frame(1), PageEntry::Frame(4), PageEntry::Unmapped]
        );
    }

    #[test]
    fn test_out_of_range_page_is_permissive() {
        let mut alloc = Allocator::with_pages(&SIZES, 1).unwrap();
        let record = alloc
            .allocate(AllocationStrategy::FirstFit, 150, Some(5))
            .unwrap()
            .unwrap();

        assert!(!record.mapped);
        assert!(alloc.blocks().is_allocated(1));
        assert_eq!(alloc.page_table().mapped_count(), 0);
    }

    #[test]
    fn test_out_of_range_page_strict() {
        let mut alloc = AllocatorBuilder::new()
            .block_sizes(SIZES)
            .virtual_pages(1)
            .strict_page_bounds(true)
            .build()
            .unwrap();

        let result = alloc.first_fit_page(150, 1);
        assert!(matches!(
            result,
            Err(FitError::PageOutOfRange {
                page: 1,
                page_count: 1
            })
        ));
        assert_eq!(alloc.blocks().free_blocks(), SIZES.len());
        assert!(alloc.history().is_empty());

        assert!(alloc.first_fit_page(150, 0).unwrap());
    }

    #[test]
    fn test_no_paging_variant_ignores_pages() {
        let mut alloc = Allocator::new(&SIZES).unwrap();
        assert!(alloc.best_fit_page(150, 0).unwrap());
        assert!(alloc.display_page_table().is_empty());
    }

    #[test]
    fn test_display_is_pure() {
        let mut alloc = Allocator::with_pages(&SIZES, 2).unwrap();
        alloc.worst_fit_page(150, 1).unwrap();

        let first = alloc.display_memory();
        let second = alloc.display_memory();
        assert_eq!(first, second);
        assert_eq!(alloc.display_page_table(), alloc.display_page_table());
        assert_eq!(first[4].to_string(), "Block of size 600: Allocated");
    }

    #[test]
    fn test_stats() {
        let mut alloc = Allocator::with_pages(&SIZES, 2).unwrap();
        alloc.best_fit_page(150, 0).unwrap(); // 200
        alloc.best_fit_page(450, 1).unwrap(); // 500
        alloc.best_fit(700).unwrap();

        let stats = alloc.stats();
        assert_eq!(stats.total_blocks, 6);
        assert_eq!(stats.free_blocks, 4);
        assert_eq!(stats.total_capacity, 1950);
        assert_eq!(stats.allocated_capacity, 700);
        assert_eq!(stats.free_capacity, 1250);
        assert_eq!(stats.requested, 600);
        assert_eq!(stats.internal_waste, 100);
        assert_eq!(stats.failed_requests, 1);
        assert_eq!(stats.mapped_pages, 2);
    }

    #[test]
    fn test_stats_with_huge_blocks() {
        let mut alloc = Allocator::new(&[u64::MAX, 1]).unwrap();
        let max = u128::from(u64::MAX);

        // First-fit puts the 1-byte request in the huge block
        assert!(alloc.first_fit(1).unwrap());
        let stats = alloc.stats();
        assert_eq!(stats.total_capacity, max + 1);
        assert_eq!(stats.allocated_capacity, max);
        assert_eq!(stats.free_capacity, 1);
        assert_eq!(stats.internal_waste, max - 1);

        assert!(alloc.first_fit(1).unwrap());
        let stats = alloc.stats();
        assert_eq!(stats.allocated_capacity, max + 1);
        assert_eq!(stats.free_capacity, 0);
        assert_eq!(stats.requested, 2);
        assert_eq!(stats.internal_waste, max - 1);
    }

    #[test]
    fn test_fragmentation_score_with_huge_blocks() {
        let alloc = Allocator::new(&[u64::MAX, u64::MAX]).unwrap();
        assert!((alloc.fragmentation_score() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_fragmentation_score() {
        let mut alloc = Allocator::new(&[400]).unwrap();
        assert_eq!(alloc.fragmentation_score(), 0.0);

        alloc.first_fit(1).unwrap();
        assert_eq!(alloc.fragmentation_score(), 0.0);

        let mut alloc = Allocator::new(&[100, 300]).unwrap();
        assert!((alloc.fragmentation_score() - 0.25).abs() < f64::EPSILON);

        alloc.first_fit(300).unwrap();
        assert_eq!(alloc.fragmentation_score(), 0.0);
    }

    #[test]
    fn test_invalid_block_size() {
        let result = AllocatorBuilder::new().block_sizes(vec![10, 0]).build();
        assert!(matches!(
            result,
            Err(FitError::InvalidBlockSize { index: 1, .. })
        ));
    }
}
