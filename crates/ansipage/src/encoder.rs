//! Differential page encoder
//!
//! Walks the dirty-range list and emits the escape sequences and characters
//! that bring a terminal showing the previous page up to date, tracking what
//! has already been sent so unchanged rendition is never repeated.

use std::io::Write;

use tracing::{debug, trace};

use crate::page::{charset, Cell, CharAttr, ColorPair, Page};
use crate::status::GraphicSlot;
use crate::tables::{self, double};
use crate::update::{UpdateList, UpdateType};
use crate::PageError;

/// Blank runs longer than this in a cleared line are skipped
pub const SKIP_THRESHOLD: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStatus {
    /// Every dirty range was encoded
    Done,

    /// The byte budget ran out; `Page::last_mod` holds the resume index
    NotDone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderConfig {
    /// Also emit the private fading rendition of each cell
    pub fade_enabled: bool,

    /// Stop after the dirty range that takes a pass to this many bytes
    pub max_bytes_per_pass: Option<usize>,
}

/// G0/G1 registers as the terminal is believed to hold them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphicSets {
    pub g0: Option<u8>,
    pub g1: Option<u8>,
    pub g0_pinned: bool,
    pub g1_pinned: bool,

    /// Set of the last character sent; `None` forces a selection
    pub requested: Option<u8>,
}

impl GraphicSets {
    pub fn pinned(g0: Option<u8>, g1: Option<u8>) -> Self {
        Self {
            g0,
            g1,
            g0_pinned: g0.is_some(),
            g1_pinned: g1.is_some(),
            requested: None,
        }
    }

    /// Register a set is designated into when neither holds it
    pub fn victim(&self) -> GraphicSlot {
        if !self.g0_pinned && self.g0.is_none() {
            GraphicSlot::G0
        } else if !self.g1_pinned {
            GraphicSlot::G1
        } else if !self.g0_pinned {
            GraphicSlot::G0
        } else {
            GraphicSlot::G1
        }
    }

    fn select(&mut self, set: u8, out: &mut Vec<u8>) {
        if self.requested == Some(set) {
            return;
        }

        if self.g0 == Some(set) {
            out.push(tables::SI);
        } else if self.g1 == Some(set) {
            out.push(tables::SO);
        } else {
            match self.victim() {
                GraphicSlot::G0 => {
                    out.extend_from_slice(tables::DESIGNATE_G0);
                    out.push(set);
                    out.push(tables::SI);
                    self.g0 = Some(set);
                }
                GraphicSlot::G1 => {
                    out.extend_from_slice(tables::DESIGNATE_G1);
                    out.push(set);
                    out.push(tables::SO);
                    self.g1 = Some(set);
                }
            }
        }
        self.requested = Some(set);
    }
}

/// Rendition the terminal is known to be using
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderState {
    pub attr: CharAttr,
    pub color: ColorPair,
    pub fading: CharAttr,
    pub fade_color: ColorPair,
    pub graphics: GraphicSets,
}

impl EncoderState {
    pub fn new(graphics: GraphicSets) -> Self {
        Self {
            attr: CharAttr::PLAIN,
            color: ColorPair::MONO,
            fading: CharAttr::PLAIN,
            fade_color: ColorPair::MONO,
            graphics,
        }
    }

    pub fn snapshot(&self) -> Self {
        *self
    }

    pub fn restore(&mut self, saved: Self) {
        *self = saved;
    }

    fn is_plain(&self) -> bool {
        self.attr.is_empty() && self.color.is_mono()
    }
}

/// Start of a blank run that may be dropped
#[derive(Debug, Clone, Copy)]
struct SkipMark {
    out_len: usize,
    state: EncoderState,
    col: u16,
}

impl SkipMark {
    fn rollback(self, out: &mut Vec<u8>, state: &mut EncoderState, row: u16, end: u16) {
        trace!("Skipping blank run on row {} columns {}..{}", row, self.col, end);
        out.truncate(self.out_len);
        state.restore(self.state);
    }
}

/// Differential ANSI page encoder
#[derive(Debug, Clone, Default)]
pub struct AnsiEncoder {
    config: EncoderConfig,
}

impl AnsiEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode into a buffer, then hand it to `sink` in one write.
    pub fn encode_to<W: Write>(
        &self,
        page: &mut Page,
        updates: &UpdateList,
        sink: &mut W,
    ) -> Result<EncodeStatus, PageError> {
        let mut buf = Vec::new();
        let status = self.encode(page, updates, &mut buf)?;
        sink.write_all(&buf)?;
        sink.flush()?;
        Ok(status)
    }

    /// Append the update stream for `updates` to `out`.
    ///
    /// Starts at `page.last_mod`. On [`EncodeStatus::NotDone`] the index of
    /// the first range not yet sent is stored back in `page.last_mod`; on
    /// [`EncodeStatus::Done`] it is reset to 0.
    ///
    /// # Errors
    ///
    /// Fails without writing anything if a dirty range lies outside the page
    /// or the resume index is past the end of the list.
    pub fn encode(
        &self,
        page: &mut Page,
        updates: &UpdateList,
        out: &mut Vec<u8>,
    ) -> Result<EncodeStatus, PageError> {
        let entries = updates.as_slice();
        let first = page.last_mod;
        if first > entries.len() {
            return Err(PageError::ResumeOutOfRange {
                index: first,
                len: entries.len(),
            });
        }
        for (index, update) in entries.iter().enumerate().skip(first) {
            validate(page, index, update)?;
        }

        let start = out.len();
        out.extend_from_slice(tables::CURSOR_OFF);
        out.extend_from_slice(tables::LINE_WRAP_ON);
        out.extend_from_slice(tables::PLAIN);

        let graphics = GraphicSets::pinned(
            page.status.g0_set.map(charset::resolve),
            page.status.g1_set.map(charset::resolve),
        );
        if let Some(set) = graphics.g0 {
            out.extend_from_slice(tables::DESIGNATE_G0);
            out.push(set);
        }
        if let Some(set) = graphics.g1 {
            out.extend_from_slice(tables::DESIGNATE_G1);
            out.push(set);
        }

        let mut state = EncoderState::new(graphics);
        let mut status = EncodeStatus::Done;

        for (index, update) in entries.iter().enumerate().skip(first) {
            self.encode_range(page, update, &mut state, out);

            if let Some(budget) = self.config.max_bytes_per_pass {
                if out.len() - start >= budget && index + 1 < entries.len() {
                    page.last_mod = index + 1;
                    status = EncodeStatus::NotDone;
                    break;
                }
            }
        }

        if status == EncodeStatus::Done {
            page.last_mod = 0;
        }

        if !state.attr.is_simple() {
            out.extend_from_slice(tables::DOUBLE_SEQUENCE[double::OFF as usize]);
        }
        out.extend_from_slice(tables::FADE_OFF);
        out.push(0);

        debug!(
            "Encoded ranges {}..{} of {} into {} bytes ({:?})",
            first,
            if status == EncodeStatus::Done { entries.len() } else { page.last_mod },
            entries.len(),
            out.len() - start,
            status
        );
        Ok(status)
    }

    fn encode_range(
        &self,
        page: &Page,
        update: &UpdateType,
        state: &mut EncoderState,
        out: &mut Vec<u8>,
    ) {
        let row = update.row;

        // Keep a filled bottom-right cell from scrolling the screen
        if row == page.rows() {
            out.extend_from_slice(tables::LINE_WRAP_OFF);
        }

        let whole_line = update.is_whole_line(page.cols());
        if whole_line {
            push_position(out, row, 1);
            if !state.is_plain() {
                out.extend_from_slice(tables::PLAIN);
                state.attr = CharAttr::PLAIN;
                state.color = ColorPair::MONO;
            }
            out.extend_from_slice(tables::CLEAR_TO_EOL);
        }

        let mut reposition = true;
        let mut skip: Option<SkipMark> = None;

        for col in update.upd_beg..update.upd_end {
            let Some(cell) = page.cell(row, col) else {
                break;
            };

            if cell.is_null() {
                reposition = true;
                continue;
            }

            if whole_line {
                if self.erased_look(cell) {
                    if skip.is_none() {
                        skip = Some(SkipMark {
                            out_len: out.len(),
                            state: state.snapshot(),
                            col,
                        });
                    }
                } else if let Some(mark) = skip.take() {
                    if col - mark.col > SKIP_THRESHOLD {
                        mark.rollback(out, state, row, col);
                        reposition = true;
                    }
                }
            }

            if reposition {
                push_position(out, row, col);
                reposition = false;
            }

            self.encode_cell(cell, state, out);
        }

        if let Some(mark) = skip {
            if update.upd_end - mark.col > SKIP_THRESHOLD {
                mark.rollback(out, state, row, update.upd_end);
            }
        }
    }

    /// A cell the line clear already reproduces, so it may be skipped
    fn erased_look(&self, cell: &Cell) -> bool {
        cell.is_blank() && (!self.config.fade_enabled || cell.has_plain_fade())
    }

    fn encode_cell(&self, cell: &Cell, state: &mut EncoderState, out: &mut Vec<u8>) {
        state.graphics.select(charset::resolve(cell.gs), out);

        if state.attr != cell.attr || state.color != cell.color {
            push_sgr(out, cell.attr, cell.color);
            state.attr = cell.attr;
            state.color = cell.color;
        }

        if self.config.fade_enabled
            && (state.fading != cell.fade_attr || state.fade_color != cell.fade_color)
        {
            push_fade_sgr(out, cell.fade_attr, cell.fade_color);
            state.fading = cell.fade_attr;
            state.fade_color = cell.fade_color;
        }

        out.push(printable(cell.ch));
    }
}

fn validate(page: &Page, index: usize, update: &UpdateType) -> Result<(), PageError> {
    if update.row == 0 || update.row > page.rows() {
        return Err(PageError::InvalidUpdate {
            index,
            reason: format!("row {} outside 1..={}", update.row, page.rows()),
        });
    }
    if update.upd_beg == 0 || update.upd_beg > update.upd_end || update.upd_end > page.end_of_row()
    {
        return Err(PageError::InvalidUpdate {
            index,
            reason: format!(
                "columns {}..{} outside 1..{}",
                update.upd_beg,
                update.upd_end,
                page.end_of_row()
            ),
        });
    }
    Ok(())
}

/// Control bytes would be interpreted by the terminal; send a space instead.
fn printable(ch: u8) -> u8 {
    if (0x20..0x7F).contains(&ch) {
        ch
    } else {
        trace!("Replacing unprintable character {:#04x}", ch);
        b' '
    }
}

fn push_decimal(out: &mut Vec<u8>, value: u16) {
    let mut digits = [0u8; 5];
    let mut n = value;
    let mut i = digits.len();
    loop {
        i -= 1;
        digits[i] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    out.extend_from_slice(&digits[i..]);
}

/// `ESC [ row ; col H`
fn push_position(out: &mut Vec<u8>, row: u16, col: u16) {
    out.push(tables::ESC);
    out.push(b'[');
    push_decimal(out, row);
    out.push(b';');
    push_decimal(out, col);
    out.push(b'H');
}

fn push_colors(out: &mut Vec<u8>, color: ColorPair) {
    if let Some(seq) = tables::foreground(color.fg()) {
        out.extend_from_slice(seq);
    }
    if let Some(seq) = tables::background(color.bg()) {
        out.extend_from_slice(seq);
    }
}

fn push_sgr(out: &mut Vec<u8>, attr: CharAttr, color: ColorPair) {
    let pending_double = (!attr.is_simple()).then(|| attr.double_code());

    out.extend_from_slice(tables::attribute(attr.bits()));
    push_colors(out, color);
    out.push(tables::SGR_END);

    if let Some(code) = pending_double.filter(|&code| code != double::OFF) {
        if let Some(seq) = tables::double_sequence(code) {
            out.extend_from_slice(seq);
        }
    }
}

fn push_fade_sgr(out: &mut Vec<u8>, attr: CharAttr, color: ColorPair) {
    out.extend_from_slice(tables::fade_attribute(attr.bits()));
    push_colors(out, color);
    out.push(tables::SGR_END);
}
