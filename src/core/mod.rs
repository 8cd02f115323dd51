//! Core data structures and allocation engine

pub mod allocator;
pub mod block;
pub mod config;
pub mod error;
pub mod page_table;
pub mod snapshot;
