//! Page diffing
//!
//! Builds the dirty-range list that takes one page image to another, for
//! callers that edit cells directly instead of going through the decoder.

use tracing::debug;

use crate::page::{Cell, Page};
use crate::update::{UpdateList, UpdateType};
use crate::PageError;

impl UpdateList {
    /// One range per changed row, spanning its first to last differing cell.
    pub fn diff(old: &Page, new: &Page) -> Result<Self, PageError> {
        if old.rows() != new.rows() || old.cols() != new.cols() {
            return Err(PageError::InvalidDimensions(format!(
                "cannot diff {}x{} against {}x{}",
                old.rows(),
                old.cols(),
                new.rows(),
                new.cols()
            )));
        }

        let mut list = Self::new();
        for row in 1..=new.rows() {
            let (Some(before), Some(after)) = (old.row_cells(row), new.row_cells(row)) else {
                continue;
            };
            if let Some((first, last)) = changed_span(before, after) {
                list.push(UpdateType::new(row, first as u16 + 1, last as u16 + 2))?;
            }
        }

        debug!("Page diff produced {} dirty ranges", list.len());
        Ok(list)
    }
}

/// Indices of the first and last differing cells
fn changed_span(old: &[Cell], new: &[Cell]) -> Option<(usize, usize)> {
    let first = old.iter().zip(new).position(|(a, b)| a != b)?;
    let last = old.iter().zip(new).rposition(|(a, b)| a != b)?;
    Some((first, last))
}
