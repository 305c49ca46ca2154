//! Differential ANSI page codec
//!
//! Encodes a grid of styled character cells into a minimal VT100/ANSI byte
//! stream given a list of dirty ranges, and decodes such streams back into the
//! same page model.

pub mod page;
pub mod status;
pub mod update;
pub mod tables;
pub mod encoder;
pub mod decoder;
pub mod diff;
pub mod snapshot;

pub use page::{charset, Cell, CharAttr, ColorPair, Page};
pub use status::{GraphicSlot, Status};
pub use update::{UpdateList, UpdateType};
pub use encoder::{AnsiEncoder, EncodeStatus, EncoderConfig, EncoderState, GraphicSets};
pub use decoder::AnsiDecoder;
pub use snapshot::{PageSnapshot, StatusSnapshot};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Invalid page dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Invalid dirty range at index {index}: {reason}")]
    InvalidUpdate { index: usize, reason: String },

    #[error("Resume index {index} is beyond the update list ({len} entries)")]
    ResumeOutOfRange { index: usize, len: usize },

    #[error("Update list is full ({0} entries)")]
    UpdateListFull(usize),

    #[error("Update list filled up after consuming {consumed} of {total} bytes")]
    DecodeIncomplete { consumed: usize, total: usize },

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}
