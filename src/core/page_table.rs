//! Single-level virtual page table
//!
//! One entry per virtual page. Entries start out unmapped and are written by
//! the allocator when an allocation names a page.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of one page table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageEntry {
    #[default]
    Unmapped,
    /// Index of the physical block backing this page
    Frame(usize),
}

impl PageEntry {
    pub fn frame(&self) -> Option<usize> {
        match self {
            PageEntry::Frame(frame) => Some(*frame),
            PageEntry::Unmapped => None,
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, PageEntry::Frame(_))
    }
}

impl fmt::Display for PageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageEntry::Frame(frame) => write!(f, "Frame {}", frame),
            PageEntry::Unmapped => write!(f, "unmapped"),
        }
    }
}

/// Fixed-length table mapping virtual pages to block indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTable {
    entries: Vec<PageEntry>,
}

impl PageTable {
    /// Create a table with `page_count` unmapped entries
    pub fn new(page_count: usize) -> Self {
        PageTable {
            entries: vec![PageEntry::Unmapped; page_count],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_page(&self, page: usize) -> bool {
        page < self.entries.len()
    }

    /// Look up an entry; `None` if the page is out of range
    pub fn entry(&self, page: usize) -> Option<PageEntry> {
        self.entries.get(page).copied()
    }

    /// Point `page` at `frame`
    ///
    /// Out-of-range pages are ignored. Returns whether the entry was written.
    pub fn map(&mut self, page: usize, frame: usize) -> bool {
        match self.entries.get_mut(page) {
            Some(entry) => {
                *entry = PageEntry::Frame(frame);
                true
            }
            None => false,
        }
    }

    /// Number of entries currently mapped
    pub fn mapped_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_mapped()).count()
    }

    /// Iterate `(page, entry)` pairs in ascending page order
    pub fn iter(&self) -> PageTableIter<'_> {
        PageTableIter {
            inner: self.entries.iter().enumerate(),
        }
    }
}

impl<'a> IntoIterator for &'a PageTable {
    type Item = (usize, PageEntry);
    type IntoIter = PageTableIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over page table entries, see [`PageTable::iter`]
#[derive(Debug, Clone)]
pub struct PageTableIter<'a> {
    inner: std::iter::Enumerate<std::slice::Iter<'a, PageEntry>>,
}

impl Iterator for PageTableIter<'_> {
    type Item = (usize, PageEntry);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(page, entry)| (page, *entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for PageTableIter<'_> {}
