//! Simulator configuration
//!
//! A configuration describes the physical blocks, the size of the page table
//! and a scripted list of requests replayed once per strategy.
//!
//! ```toml
//! block_sizes = [100, 500, 200, 300, 600, 250]
//! virtual_pages = 3
//! strategies = ["first-fit", "best-fit"]
//!
//! [[requests]]
//! size = 150
//! page = 0
//!
//! [[requests]]
//! size = 700
//! ```

use crate::allocator::AllocationStrategy;
use crate::error::{FitError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Block sizes used by the built-in demonstration
pub const DEMO_BLOCK_SIZES: [u64; 6] = [100, 500, 200, 300, 600, 250];

/// One scripted allocation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

impl RequestSpec {
    pub fn new(size: u64) -> Self {
        RequestSpec { size, page: None }
    }

    pub fn with_page(size: u64, page: usize) -> Self {
        RequestSpec {
            size,
            page: Some(page),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub block_sizes: Vec<u64>,

    #[serde(default)]
    pub virtual_pages: usize,

    #[serde(default)]
    pub strict_page_bounds: bool,

    /// Strategies to run, each against a fresh allocator
    #[serde(default = "default_strategies")]
    pub strategies: Vec<AllocationStrategy>,

    #[serde(default)]
    pub requests: Vec<RequestSpec>,
}

fn default_strategies() -> Vec<AllocationStrategy> {
    AllocationStrategy::ALL.to_vec()
}

impl SimulatorConfig {
    /// Parse and validate a TOML configuration
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: SimulatorConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| FitError::Config(e.to_string()))
    }

    /// Validate all fields
    ///
    /// Checks:
    /// - At least one block, all with positive size
    /// - At least one strategy
    /// - Every request has a positive size
    /// - With `strict_page_bounds`, every requested page is inside the page table
    pub fn validate(&self) -> Result<()> {
        if self.block_sizes.is_empty() {
            return Err(FitError::Config("block_sizes cannot be empty".to_string()));
        }

        if let Some(index) = self.block_sizes.iter().position(|&size| size == 0) {
            return Err(FitError::InvalidBlockSize { index, size: 0 });
        }

        if self.strategies.is_empty() {
            return Err(FitError::Config("strategies cannot be empty".to_string()));
        }

        if let Some(index) = self.requests.iter().position(|r| r.size == 0) {
            return Err(FitError::Config(format!(
                "request {} has size 0 (must be positive)",
                index
            )));
        }

        if self.strict_page_bounds {
            if let Some(page) = self
                .requests
                .iter()
                .filter_map(|r| r.page)
                .find(|&page| page >= self.virtual_pages)
            {
                return Err(FitError::PageOutOfRange {
                    page,
                    page_count: self.virtual_pages,
                });
            }
        }

        Ok(())
    }

    /// Keep only `strategy` in the run list
    pub fn restrict_to(mut self, strategy: AllocationStrategy) -> Self {
        self.strategies = vec![strategy];
        self
    }
}

impl Default for SimulatorConfig {
    /// Six blocks, three virtual pages, and a last request too large for any block
    fn default() -> Self {
        SimulatorConfig {
            block_sizes: DEMO_BLOCK_SIZES.to_vec(),
            virtual_pages: 3,
            strict_page_bounds: false,
            strategies: default_strategies(),
            requests: vec![
                RequestSpec::with_page(150, 0),
                RequestSpec::with_page(450, 1),
                RequestSpec::with_page(700, 2),
            ],
        }
    }
}
