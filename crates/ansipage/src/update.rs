//! Dirty-range list
//!
//! Each entry names a column range of one row that changed since the last
//! encode pass. Rows and columns are 1-based and the end column is exclusive.

use crate::page::Page;
use crate::PageError;

/// One dirty range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateType {
    pub row: u16,
    pub upd_beg: u16,
    pub upd_end: u16,
}

impl UpdateType {
    pub fn new(row: u16, upd_beg: u16, upd_end: u16) -> Self {
        Self {
            row,
            upd_beg,
            upd_end,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.upd_end <= self.upd_beg
    }

    /// Whether the range covers the whole row of a page `cols` wide
    pub fn is_whole_line(&self, cols: u16) -> bool {
        self.upd_beg == 1 && self.upd_end == cols + 1
    }
}

/// Ordered, bounded list of dirty ranges
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateList {
    entries: Vec<UpdateType>,
}

impl UpdateList {
    pub const CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(Self::CAPACITY),
        }
    }

    /// Every row of `page` as a whole-line range
    pub fn whole_page(page: &Page) -> Result<Self, PageError> {
        let mut list = Self::new();
        for row in 1..=page.rows() {
            list.push(UpdateType::new(row, 1, page.end_of_row()))?;
        }
        Ok(list)
    }

    pub fn push(&mut self, update: UpdateType) -> Result<(), PageError> {
        if self.entries.len() >= Self::CAPACITY {
            return Err(PageError::UpdateListFull(Self::CAPACITY));
        }
        self.entries.push(update);
        Ok(())
    }

    /// Room for `n` more entries
    pub fn has_room(&self, n: usize) -> bool {
        self.entries.len() + n <= Self::CAPACITY
    }

    pub fn last_mut(&mut self) -> Option<&mut UpdateType> {
        self.entries.last_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn as_slice(&self) -> &[UpdateType] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UpdateType> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a UpdateList {
    type Item = &'a UpdateType;
    type IntoIter = std::slice::Iter<'a, UpdateType>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
