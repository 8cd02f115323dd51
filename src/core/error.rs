use thiserror::Error;

#[derive(Error, Debug)]
pub enum FitError {
    #[error("Invalid request size: {0} (must be positive)")]
    InvalidRequestSize(u64),

    #[error("Invalid block size {size} at index {index} (must be positive)")]
    InvalidBlockSize { index: usize, size: u64 },

    #[error("Invalid block ID: {0}")]
    InvalidBlockId(usize),

    #[error("Block already allocated: {0}")]
    BlockAlreadyAllocated(usize),

    #[error("Virtual page {page} out of range (page table has {page_count} entries)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("Unknown allocation strategy: {0} (expected first-fit, best-fit, worst-fit or next-fit)")]
    UnknownStrategy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FitError>;
