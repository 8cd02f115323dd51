//! Candidate selection for the four placement strategies
//!
//! Each strategy only *chooses* a block index. Mutation happens in
//! [`Allocator::allocate`](super::Allocator::allocate) so the all-or-nothing
//! contract lives in one place.

use crate::block::BlockStore;
use crate::error::FitError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placement strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationStrategy {
    /// First free block large enough, scanning from index 0
    FirstFit,
    /// Free block leaving the least waste
    BestFit,
    /// Free block leaving the most waste
    WorstFit,
    /// First-fit starting at the cursor, wrapping around once
    NextFit,
}

impl AllocationStrategy {
    pub const ALL: [AllocationStrategy; 4] = [
        AllocationStrategy::FirstFit,
        AllocationStrategy::BestFit,
        AllocationStrategy::WorstFit,
        AllocationStrategy::NextFit,
    ];

    /// Pick a block index for `request`, or `None` if no free block fits
    ///
    /// `cursor` is only read by next-fit. Ties in best/worst fit go to the
    /// lowest index.
    pub fn select(&self, blocks: &BlockStore, request: u64, cursor: usize) -> Option<usize> {
        match self {
            AllocationStrategy::FirstFit => first_fit(blocks, request),
            AllocationStrategy::BestFit => best_fit(blocks, request),
            AllocationStrategy::WorstFit => worst_fit(blocks, request),
            AllocationStrategy::NextFit => next_fit(blocks, request, cursor),
        }
    }

    /// Kebab-case identifier used in configs and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStrategy::FirstFit => "first-fit",
            AllocationStrategy::BestFit => "best-fit",
            AllocationStrategy::WorstFit => "worst-fit",
            AllocationStrategy::NextFit => "next-fit",
        }
    }
}

impl fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AllocationStrategy::FirstFit => "First-Fit",
            AllocationStrategy::BestFit => "Best-Fit",
            AllocationStrategy::WorstFit => "Worst-Fit",
            AllocationStrategy::NextFit => "Next-Fit",
        };
        f.write_str(label)
    }
}

impl FromStr for AllocationStrategy {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first-fit" | "first_fit" | "firstfit" | "first" => Ok(AllocationStrategy::FirstFit),
            "best-fit" | "best_fit" | "bestfit" | "best" => Ok(AllocationStrategy::BestFit),
            "worst-fit" | "worst_fit" | "worstfit" | "worst" => Ok(AllocationStrategy::WorstFit),
            "next-fit" | "next_fit" | "nextfit" | "next" => Ok(AllocationStrategy::NextFit),
            _ => Err(FitError::UnknownStrategy(s.to_string())),
        }
    }
}

/// `(index, waste)` for every free block that fits, in index order
fn candidates(blocks: &BlockStore, request: u64) -> impl Iterator<Item = (usize, u64)> + '_ {
    blocks
        .iter()
        .enumerate()
        .filter(move |(_, block)| block.fits(request))
        .map(move |(index, block)| (index, block.size() - request))
}

fn first_fit(blocks: &BlockStore, request: u64) -> Option<usize> {
    candidates(blocks, request).next().map(|(index, _)| index)
}

fn best_fit(blocks: &BlockStore, request: u64) -> Option<usize> {
    // min_by_key keeps the first of equal minima
    candidates(blocks, request)
        .min_by_key(|&(_, waste)| waste)
        .map(|(index, _)| index)
}

fn worst_fit(blocks: &BlockStore, request: u64) -> Option<usize> {
    // max_by_key would keep the last of equal maxima
    candidates(blocks, request)
        .fold(None, |best: Option<(usize, u64)>, (index, waste)| match best {
            Some((_, max)) if waste <= max => best,
            _ => Some((index, waste)),
        })
        .map(|(index, _)| index)
}

fn next_fit(blocks: &BlockStore, request: u64, cursor: usize) -> Option<usize> {
    let len = blocks.len();
    let start = cursor.min(len);

    (start..len)
        .chain(0..start)
        .find(|&index| blocks.get(index).is_some_and(|block| block.fits(request)))
}
