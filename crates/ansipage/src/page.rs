//! Page model
//!
//! A page is a fixed grid of character cells addressed 1-based by row and
//! column, the terminal status that goes with it, and the scrolling region.

use bitflags::bitflags;

use crate::status::Status;
use crate::PageError;

/// Graphic-set designators understood by VT100-class terminals.
///
/// Any other code in `0x30..=0x7E` is passed through as a vendor set.
pub mod charset {
    pub const US_ASCII: u8 = b'B';
    pub const UNITED_KINGDOM: u8 = b'A';
    pub const DEC_SPECIAL_GRAPHICS: u8 = b'0';
    pub const DEC_ALT_ROM: u8 = b'1';
    pub const DEC_ALT_ROM_GRAPHICS: u8 = b'2';

    /// Whether `code` can follow `ESC (` / `ESC )` as a designation.
    pub fn is_designator(code: u8) -> bool {
        (0x30..0x7F).contains(&code)
    }

    /// Map unusable designators to US-ASCII.
    pub fn resolve(code: u8) -> u8 {
        if is_designator(code) {
            code
        } else {
            US_ASCII
        }
    }
}

/// Colour indices for [`ColorPair`] nibbles.
pub mod colors {
    pub const BLACK: u8 = 0;
    pub const RED: u8 = 1;
    pub const GREEN: u8 = 2;
    pub const YELLOW: u8 = 3;
    pub const BLUE: u8 = 4;
    pub const MAGENTA: u8 = 5;
    pub const CYAN: u8 = 6;
    pub const WHITE: u8 = 7;
}

bitflags! {
    /// Monochrome attribute byte.
    ///
    /// The low five bits are independent attributes. The top three bits hold a
    /// double-width/height sub-code (see [`crate::tables::double`]).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CharAttr: u8 {
        const BLINK = 0x01;
        const REVVID = 0x02;
        const DIM = 0x04;
        const UNDLN = 0x08;
        const BRIGHT = 0x10;
        const DOUBLE = 0xE0;
    }
}

impl CharAttr {
    pub const PLAIN: Self = Self::empty();

    /// Attribute values at or above this carry a double sub-code.
    pub const SIMPLE_LIMIT: u8 = 0x20;

    pub fn is_simple(self) -> bool {
        self.bits() < Self::SIMPLE_LIMIT
    }

    /// The attribute with the double sub-code stripped.
    pub fn simple(self) -> Self {
        Self::from_bits_retain(self.bits() & (Self::SIMPLE_LIMIT - 1))
    }

    pub fn double_code(self) -> u8 {
        self.bits() >> 5
    }

    pub fn with_double(self, code: u8) -> Self {
        Self::from_bits_retain(self.simple().bits() | ((code & 0x07) << 5))
    }
}

/// Packed foreground (low nibble) / background (high nibble) colour byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorPair(u8);

impl ColorPair {
    /// Nibble value meaning "leave this channel alone".
    pub const MONOCOLOR: u8 = 0x0F;

    /// Both channels unset.
    pub const MONO: Self = Self(0xFF);

    pub const fn new(fg: u8, bg: u8) -> Self {
        Self((fg & 0x0F) | ((bg & 0x0F) << 4))
    }

    pub const fn fg_only(fg: u8) -> Self {
        Self::new(fg, Self::MONOCOLOR)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn fg(self) -> u8 {
        self.0 & 0x0F
    }

    pub const fn bg(self) -> u8 {
        self.0 >> 4
    }

    pub fn with_fg(self, fg: u8) -> Self {
        Self::new(fg, self.bg())
    }

    pub fn with_bg(self, bg: u8) -> Self {
        Self::new(self.fg(), bg)
    }

    pub fn is_mono(self) -> bool {
        self == Self::MONO
    }
}

impl Default for ColorPair {
    fn default() -> Self {
        Self::MONO
    }
}

/// A single character position on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Character code; `0` marks a cell with no content yet
    pub ch: u8,

    /// Graphic set the character is drawn from
    pub gs: u8,

    pub attr: CharAttr,

    /// Attribute used while the cell is shown faded
    pub fade_attr: CharAttr,

    pub color: ColorPair,

    pub fade_color: ColorPair,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: b' ',
            gs: charset::US_ASCII,
            attr: CharAttr::PLAIN,
            fade_attr: CharAttr::PLAIN,
            color: ColorPair::MONO,
            fade_color: ColorPair::MONO,
        }
    }
}

impl Cell {
    pub const NULL_CHAR: u8 = 0;

    pub fn new(ch: u8) -> Self {
        Self {
            ch,
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, attr: CharAttr) -> Self {
        self.attr = attr;
        self
    }

    pub fn with_color(mut self, color: ColorPair) -> Self {
        self.color = color;
        self
    }

    pub fn with_fade(mut self, attr: CharAttr, color: ColorPair) -> Self {
        self.fade_attr = attr;
        self.fade_color = color;
        self
    }

    pub fn with_gs(mut self, gs: u8) -> Self {
        self.gs = gs;
        self
    }

    pub fn is_null(&self) -> bool {
        self.ch == Self::NULL_CHAR
    }

    /// Plain, colourless space: what an erased line already shows.
    pub fn is_blank(&self) -> bool {
        self.ch == b' ' && self.attr.is_empty() && self.color.is_mono()
    }

    /// No fade rendition beyond what an erased cell carries.
    pub fn has_plain_fade(&self) -> bool {
        self.fade_attr.is_empty() && self.fade_color.is_mono()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Character grid plus terminal status
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    rows: u16,

    cols: u16,

    /// Cells in row-major order
    cells: Vec<Cell>,

    /// Cursor and current rendition
    pub status: Status,

    /// Status stored by DECSC
    pub saved: Status,

    pub scroll_top: u16,

    pub scroll_bot: u16,

    /// Index of the next dirty range an interrupted encode pass resumes from
    pub last_mod: usize,
}

impl Page {
    /// Largest row or column count a page may have
    pub const MAX_DIMENSION: u16 = u16::MAX - 1;

    /// Create a blank page
    pub fn new(rows: u16, cols: u16) -> Result<Self, PageError> {
        if rows == 0 || cols == 0 {
            return Err(PageError::InvalidDimensions(format!("{rows}x{cols}")));
        }
        // Exclusive range ends and the row below the cursor must fit in a u16
        if rows == u16::MAX || cols == u16::MAX {
            return Err(PageError::InvalidDimensions(format!(
                "{rows}x{cols} exceeds {}x{}",
                Page::MAX_DIMENSION,
                Page::MAX_DIMENSION
            )));
        }

        Ok(Self {
            rows,
            cols,
            cells: vec![Cell::default(); (rows as usize) * (cols as usize)],
            status: Status::default(),
            saved: Status::default(),
            scroll_top: 1,
            scroll_bot: rows,
            last_mod: 0,
        })
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// Exclusive end column of a whole-line range
    pub fn end_of_row(&self) -> u16 {
        self.cols + 1
    }

    fn offset(&self, row: u16, col: u16) -> Option<usize> {
        if row == 0 || col == 0 || row > self.rows || col > self.cols {
            return None;
        }
        Some((row as usize - 1) * (self.cols as usize) + (col as usize - 1))
    }

    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        self.offset(row, col).map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, row: u16, col: u16) -> Option<&mut Cell> {
        self.offset(row, col).map(move |i| &mut self.cells[i])
    }

    pub fn row_cells(&self, row: u16) -> Option<&[Cell]> {
        let start = self.offset(row, 1)?;
        Some(&self.cells[start..start + self.cols as usize])
    }

    /// Write `text` with the styling of `template`, clipped to the row.
    ///
    /// Returns the number of cells written.
    pub fn write_text(&mut self, row: u16, col: u16, text: &[u8], template: Cell) -> usize {
        let mut written = 0;
        for (i, &ch) in text.iter().enumerate() {
            let Some(cell) = self.cell_mut(row, col.saturating_add(i as u16)) else {
                break;
            };
            *cell = Cell { ch, ..template };
            written += 1;
        }
        written
    }

    /// Row contents as text, nulls shown as spaces
    pub fn row_text(&self, row: u16) -> String {
        self.row_cells(row)
            .map(|cells| {
                cells
                    .iter()
                    .map(|c| if c.is_null() { ' ' } else { c.ch as char })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Replace all cells; ignored unless the length matches.
    pub fn restore_cells(&mut self, cells: &[Cell]) -> bool {
        if cells.len() != self.cells.len() {
            return false;
        }
        self.cells.copy_from_slice(cells);
        true
    }

    /// Blank every cell
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Blank columns `from..=to` of `row`
    pub fn clear_span(&mut self, row: u16, from: u16, to: u16) {
        let to = to.min(self.cols);
        if from > to {
            return;
        }
        if let (Some(start), Some(end)) = (self.offset(row, from), self.offset(row, to)) {
            for cell in &mut self.cells[start..=end] {
                cell.clear();
            }
        }
    }

    /// Blank whole rows `from..=to`
    pub fn clear_rows(&mut self, from: u16, to: u16) {
        for row in from..=to.min(self.rows) {
            self.clear_span(row, 1, self.cols);
        }
    }

    /// Insert `n` blanks at `col`, pushing the rest of the row right.
    /// Cells pushed past the last column are lost.
    pub fn insert_blanks(&mut self, row: u16, col: u16, n: u16) {
        let Some(start) = self.offset(row, col) else {
            return;
        };
        let row_end = start + (self.cols - col + 1) as usize;
        let n = (n as usize).min(row_end - start);
        self.cells[start..row_end].rotate_right(n);
        for cell in &mut self.cells[start..start + n] {
            cell.clear();
        }
    }

    /// Delete `n` cells at `col`, pulling the rest of the row left and
    /// blanking the vacated cells at the end.
    pub fn delete_chars(&mut self, row: u16, col: u16, n: u16) {
        let Some(start) = self.offset(row, col) else {
            return;
        };
        let row_end = start + (self.cols - col + 1) as usize;
        let n = (n as usize).min(row_end - start);
        self.cells[start..row_end].rotate_left(n);
        for cell in &mut self.cells[row_end - n..row_end] {
            cell.clear();
        }
    }

    /// Move rows `top..=bottom` up by `n`, blanking the rows opened at the bottom.
    pub fn scroll_up(&mut self, top: u16, bottom: u16, n: u16) {
        self.scroll_region(top, bottom, n, true);
    }

    /// Move rows `top..=bottom` down by `n`, blanking the rows opened at the top.
    pub fn scroll_down(&mut self, top: u16, bottom: u16, n: u16) {
        self.scroll_region(top, bottom, n, false);
    }

    fn scroll_region(&mut self, top: u16, bottom: u16, n: u16, up: bool) {
        let bottom = bottom.min(self.rows);
        if n == 0 || top == 0 || top > bottom {
            return;
        }
        let n = n.min(bottom - top + 1);
        let width = self.cols as usize;
        let start = (top as usize - 1) * width;
        let end = bottom as usize * width;
        let shift = n as usize * width;

        let region = &mut self.cells[start..end];
        if up {
            region.rotate_left(shift);
            let len = region.len();
            region[len - shift..].fill(Cell::default());
        } else {
            region.rotate_right(shift);
            region[..shift].fill(Cell::default());
        }
    }
}
