//! ANSI stream decoder
//!
//! Uses the vte crate to parse the byte stream, applies each control function
//! to a [`Page`] and records the cells it touched in an [`UpdateList`].

use tracing::{debug, trace};
use vte::{Params, Perform};

use crate::page::{charset, Cell, CharAttr, ColorPair, Page};
use crate::status::{GraphicSlot, Status};
use crate::update::{UpdateList, UpdateType};
use crate::PageError;

pub const TAB_WIDTH: u16 = 8;

/// State that lives between control functions but not on the page
#[derive(Debug, Default)]
struct DecoderState {
    /// Last column written with auto-wrap on; the next character wraps first
    wrap_pending: bool,

    /// The whole scrolling region is already marked dirty
    scrolled: bool,
}

/// Applies ANSI/VT100 output to a page
pub struct AnsiDecoder {
    parser: vte::Parser,
    state: DecoderState,
}

impl Default for AnsiDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnsiDecoder {
    pub fn new() -> Self {
        Self {
            parser: vte::Parser::new(),
            state: DecoderState::default(),
        }
    }

    /// Apply `bytes` to `page`, appending dirty ranges to `updates`.
    ///
    /// A sequence split across calls is completed by the next call.
    ///
    /// # Errors
    ///
    /// [`PageError::DecodeIncomplete`] when `updates` fills up. Everything
    /// before `consumed` has been applied; the caller encodes, clears the
    /// list and feeds the rest again.
    pub fn decode(
        &mut self,
        page: &mut Page,
        bytes: &[u8],
        updates: &mut UpdateList,
    ) -> Result<(), PageError> {
        let Self { parser, state } = self;
        state.scrolled = false;

        let mut performer = Performer {
            page,
            updates,
            state,
            error: None,
            applied: false,
        };
        let mut consumed = 0;

        for (i, &byte) in bytes.iter().enumerate() {
            performer.applied = false;
            parser.advance(&mut performer, byte);

            if let Some(err) = performer.error.take() {
                debug!(
                    "Decode stopped after {} of {} bytes: {}",
                    consumed,
                    bytes.len(),
                    err
                );
                return Err(match err {
                    PageError::UpdateListFull(_) => PageError::DecodeIncomplete {
                        consumed,
                        total: bytes.len(),
                    },
                    other => other,
                });
            }
            if performer.applied {
                consumed = i + 1;
            }
        }

        debug!(
            "Decoded {} bytes into {} dirty ranges",
            bytes.len(),
            performer.updates.len()
        );
        Ok(())
    }

    /// Full reset: blank page, default status, every row dirty.
    pub fn reset(&mut self, page: &mut Page, updates: &mut UpdateList) -> Result<(), PageError> {
        self.parser = vte::Parser::new();
        Performer {
            page,
            updates,
            state: &mut self.state,
            error: None,
            applied: false,
        }
        .reset()
    }
}

struct Performer<'a> {
    page: &'a mut Page,
    updates: &'a mut UpdateList,
    state: &'a mut DecoderState,
    error: Option<PageError>,
    applied: bool,
}

fn param(params: &Params, index: usize) -> Option<u16> {
    params.iter().nth(index).and_then(|p| p.first().copied())
}

/// Repeat count: missing or zero means one
fn count(params: &Params) -> u16 {
    param(params, 0).unwrap_or(1).max(1)
}

impl<'a> Performer<'a> {
    fn finish(&mut self, result: Result<(), PageError>) {
        self.applied = true;
        if let Err(err) = result {
            self.error = Some(err);
        }
    }

    fn reserve(&self, n: usize) -> Result<(), PageError> {
        if self.updates.has_room(n) {
            Ok(())
        } else {
            Err(PageError::UpdateListFull(UpdateList::CAPACITY))
        }
    }

    /// Mark `beg..end` of `row` dirty, growing the last range when they touch.
    fn record(&mut self, row: u16, beg: u16, end: u16) -> Result<(), PageError> {
        if let Some(last) = self.updates.last_mut() {
            if last.row == row && beg <= last.upd_end && end >= last.upd_beg {
                last.upd_beg = last.upd_beg.min(beg);
                last.upd_end = last.upd_end.max(end);
                return Ok(());
            }
        }
        self.updates.push(UpdateType::new(row, beg, end))
    }

    fn record_rows(&mut self, from: u16, to: u16) -> Result<(), PageError> {
        let end = self.page.end_of_row();
        for row in from..=to {
            self.record(row, 1, end)?;
        }
        Ok(())
    }

    /// Scroll `row..=scroll_bot` by `n` lines.
    fn scroll(&mut self, up: bool, n: u16, row: u16) -> Result<(), PageError> {
        let bottom = self.page.scroll_bot;
        if n == 0 || row > bottom {
            return Ok(());
        }

        let from_top = row == self.page.scroll_top;
        let mark = !from_top || !self.state.scrolled;
        if mark {
            self.reserve((bottom - row + 1) as usize)?;
            self.record_rows(row, bottom)?;
        }

        if up {
            self.page.scroll_up(row, bottom, n);
        } else {
            self.page.scroll_down(row, bottom, n);
        }

        if from_top {
            self.state.scrolled = true;
        }
        Ok(())
    }

    fn put_char(&mut self, ch: u8) -> Result<(), PageError> {
        if self.state.wrap_pending {
            let row = self.page.status.row;
            if row == self.page.scroll_bot {
                self.scroll(true, 1, self.page.scroll_top)?;
                self.page.status.col = 1;
            } else if row != self.page.rows() {
                self.page.status.row += 1;
                self.page.status.col = 1;
            }
            self.state.wrap_pending = false;
        }

        let status = self.page.status;
        let (row, col) = (status.row, status.col);
        self.record(row, col, col + 1)?;

        if let Some(cell) = self.page.cell_mut(row, col) {
            *cell = Cell {
                ch,
                gs: status.active_set(),
                attr: status.cur_attr,
                fade_attr: status.fading,
                color: status.color,
                fade_color: status.fade_color,
            };
        }

        if col >= self.page.cols() {
            self.state.wrap_pending = status.wrap_on;
        } else {
            self.page.status.col += 1;
        }
        Ok(())
    }

    fn line_feed(&mut self) -> Result<(), PageError> {
        let row = self.page.status.row;
        if row == self.page.scroll_bot {
            self.scroll(true, 1, self.page.scroll_top)?;
        } else if row < self.page.rows() {
            self.page.status.row += 1;
        }
        self.state.wrap_pending = false;
        Ok(())
    }

    fn reverse_index(&mut self) -> Result<(), PageError> {
        let row = self.page.status.row;
        if row == self.page.scroll_top {
            self.scroll(false, 1, row)?;
        } else if row > 1 {
            self.page.status.row -= 1;
        }
        self.state.wrap_pending = false;
        Ok(())
    }

    fn move_to(&mut self, row: u16, col: u16) {
        self.page.status.row = row;
        self.page.status.col = col;
        self.state.wrap_pending = false;
    }

    fn cursor_up(&mut self, n: u16) {
        let status = self.page.status;
        let limit = if status.row >= self.page.scroll_top {
            self.page.scroll_top
        } else {
            1
        };
        self.move_to(status.row.saturating_sub(n).max(limit), status.col);
    }

    fn cursor_down(&mut self, n: u16) {
        let status = self.page.status;
        let limit = if status.row <= self.page.scroll_bot {
            self.page.scroll_bot
        } else {
            self.page.rows()
        };
        self.move_to(status.row.saturating_add(n).min(limit), status.col);
    }

    fn cursor_position(&mut self, params: &Params) {
        let row = param(params, 0).unwrap_or(1).max(1);
        let col = param(params, 1).unwrap_or(1).max(1);
        if row > self.page.rows() || col > self.page.cols() {
            trace!("Ignoring cursor position {};{} outside the page", row, col);
            return;
        }
        self.move_to(row, col);
    }

    fn tab(&mut self) {
        let status = self.page.status;
        let next = ((status.col - 1) / TAB_WIDTH + 1)
            .saturating_mul(TAB_WIDTH)
            .saturating_add(1);
        self.move_to(status.row, next.min(self.page.cols()));
    }

    fn erase_display(&mut self, mode: u16) -> Result<(), PageError> {
        let Status { row, col, .. } = self.page.status;
        let (rows, cols) = (self.page.rows(), self.page.cols());

        match mode {
            0 => {
                self.reserve((rows - row + 1) as usize)?;
                self.record(row, col, cols + 1)?;
                self.record_rows(row + 1, rows)?;
                self.page.clear_span(row, col, cols);
                self.page.clear_rows(row + 1, rows);
            }
            1 => {
                self.reserve(row as usize)?;
                self.record_rows(1, row - 1)?;
                self.record(row, 1, col + 1)?;
                self.page.clear_rows(1, row - 1);
                self.page.clear_span(row, 1, col);
            }
            2 => {
                self.reserve(rows as usize)?;
                self.record_rows(1, rows)?;
                self.page.clear();
            }
            _ => trace!("Ignoring erase display mode {}", mode),
        }
        Ok(())
    }

    fn erase_line(&mut self, mode: u16) -> Result<(), PageError> {
        let Status { row, col, .. } = self.page.status;
        let cols = self.page.cols();

        let (from, to) = match mode {
            0 => (col, cols),
            1 => (1, col),
            2 => (1, cols),
            _ => {
                trace!("Ignoring erase line mode {}", mode);
                return Ok(());
            }
        };
        self.record(row, from, to + 1)?;
        self.page.clear_span(row, from, to);
        Ok(())
    }

    fn insert_chars(&mut self, n: u16) -> Result<(), PageError> {
        let Status { row, col, .. } = self.page.status;
        self.record(row, col, self.page.end_of_row())?;
        self.page.insert_blanks(row, col, n);
        Ok(())
    }

    fn delete_chars(&mut self, n: u16) -> Result<(), PageError> {
        let Status { row, col, .. } = self.page.status;
        self.record(row, col, self.page.end_of_row())?;
        self.page.delete_chars(row, col, n);
        Ok(())
    }

    fn in_scroll_region(&self) -> bool {
        let row = self.page.status.row;
        row >= self.page.scroll_top && row <= self.page.scroll_bot
    }

    /// IL (`up == false`) and DL (`up == true`)
    fn insert_delete_lines(&mut self, n: u16, up: bool) -> Result<(), PageError> {
        if !self.in_scroll_region() {
            return Ok(());
        }
        let row = self.page.status.row;
        let n = n.min(self.page.scroll_bot - row + 1);
        self.scroll(up, n, row)?;
        self.move_to(row, 1);
        Ok(())
    }

    fn scroll_lines(&mut self, n: u16, up: bool) -> Result<(), PageError> {
        if !self.in_scroll_region() {
            return Ok(());
        }
        self.scroll(up, n, self.page.status.row)
    }

    fn set_scroll_region(&mut self, params: &Params) {
        let rows = self.page.rows();
        let top = param(params, 0).unwrap_or(1).max(1);
        let bottom = match param(params, 1) {
            Some(b) if b > 0 && b <= rows => b,
            _ => rows,
        };

        if bottom > top {
            self.page.scroll_top = top;
            self.page.scroll_bot = bottom;
            self.move_to(1, 1);
        }
        self.state.scrolled = false;
    }

    fn set_mode(&mut self, params: &Params, private: bool, on: bool) {
        let status = &mut self.page.status;
        match (private, param(params, 0)) {
            (true, Some(7)) => status.wrap_on = on,
            (false, Some(7)) => status.vem = on,
            (false, Some(16)) => status.hem = on,
            (_, mode) => trace!("Ignoring mode {:?} (private: {})", mode, private),
        }
    }

    fn select_rendition(&mut self, params: &Params, fade: bool) {
        let status = &mut self.page.status;
        status.set_fade(fade);

        for param in params.iter() {
            let Some(&code) = param.first() else {
                continue;
            };
            match code {
                0 => {
                    status.set_color(ColorPair::MONO);
                    status.set_plain();
                }
                1 => status.on_attr(CharAttr::BRIGHT),
                2 => status.on_attr(CharAttr::DIM),
                4 => status.on_attr(CharAttr::UNDLN),
                5 => status.on_attr(CharAttr::BLINK),
                7 => status.on_attr(CharAttr::REVVID),
                22 => status.off_attr(CharAttr::DIM | CharAttr::BRIGHT),
                24 => status.off_attr(CharAttr::UNDLN),
                25 => status.off_attr(CharAttr::BLINK),
                27 => status.off_attr(CharAttr::REVVID),
                30..=37 => status.set_fg((code - 30) as u8),
                40..=47 => status.set_bg((code - 40) as u8),
                _ => trace!("Ignoring SGR {}", code),
            }
        }
    }

    fn reset(&mut self) -> Result<(), PageError> {
        let rows = self.page.rows();
        self.page.clear();
        self.page.status = Status::default();
        self.page.saved = Status::default();
        self.page.scroll_top = 1;
        self.page.scroll_bot = rows;

        self.updates.clear();
        self.state.wrap_pending = false;
        self.state.scrolled = false;
        self.record_rows(1, rows)
    }
}

impl<'a> Perform for Performer<'a> {
    fn print(&mut self, c: char) {
        self.applied = true;
        // Only 7-bit printable characters occupy a cell
        if !(' '..='~').contains(&c) {
            trace!("Ignoring character {:?}", c);
            return;
        }
        let result = self.put_char(c as u8);
        self.finish(result);
    }

    fn execute(&mut self, byte: u8) {
        let result = match byte {
            // Backspace
            0x08 => {
                let status = self.page.status;
                self.move_to(status.row, status.col.saturating_sub(1).max(1));
                Ok(())
            }

            // Tab
            0x09 => {
                self.tab();
                Ok(())
            }

            // Line feed
            0x0A => self.line_feed(),

            // Carriage return
            0x0D => {
                let row = self.page.status.row;
                self.move_to(row, 1);
                Ok(())
            }

            // Shift out / shift in
            0x0E => {
                self.page.status.gr_set = GraphicSlot::G1;
                Ok(())
            }
            0x0F => {
                self.page.status.gr_set = GraphicSlot::G0;
                Ok(())
            }

            _ => Ok(()),
        };
        self.finish(result);
    }

    fn hook(&mut self, _params: &Params, _intermediates: &[u8], _ignore: bool, _c: char) {
        self.applied = true;
    }

    fn put(&mut self, _byte: u8) {}

    fn unhook(&mut self) {
        self.applied = true;
    }

    fn osc_dispatch(&mut self, _params: &[&[u8]], _bell_terminated: bool) {
        self.applied = true;
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], _ignore: bool, c: char) {
        let private = intermediates.first().copied();

        let result = match (private, c) {
            (None, '@') => self.insert_chars(count(params)),

            // Cursor movement
            (None, 'A') => {
                self.cursor_up(count(params));
                Ok(())
            }
            (None, 'B') => {
                self.cursor_down(count(params));
                Ok(())
            }
            (None, 'C') => {
                let status = self.page.status;
                let col = status.col.saturating_add(count(params)).min(self.page.cols());
                self.move_to(status.row, col);
                Ok(())
            }
            (None, 'D') => {
                let status = self.page.status;
                self.move_to(status.row, status.col.saturating_sub(count(params)).max(1));
                Ok(())
            }
            (None, 'H' | 'f') => {
                self.cursor_position(params);
                Ok(())
            }

            // Erase
            (None, 'J') => self.erase_display(param(params, 0).unwrap_or(0)),
            (None, 'K') => self.erase_line(param(params, 0).unwrap_or(0)),

            // Line and character editing
            (None, 'L') => self.insert_delete_lines(count(params), false),
            (None, 'M') => self.insert_delete_lines(count(params), true),
            (None, 'P') => self.delete_chars(count(params)),
            (None, 'S') => self.scroll_lines(count(params), true),
            (None, 'T') => self.scroll_lines(count(params), false),

            (None, 'p') => self.reset(),
            (None, 'r') => {
                self.set_scroll_region(params);
                Ok(())
            }

            (Some(b'?'), 'h') | (None, 'h') => {
                self.set_mode(params, private.is_some(), true);
                Ok(())
            }
            (Some(b'?'), 'l') | (None, 'l') => {
                self.set_mode(params, private.is_some(), false);
                Ok(())
            }

            (None, 'm') => {
                self.select_rendition(params, false);
                Ok(())
            }
            (Some(b'>'), 'm') => {
                self.select_rendition(params, true);
                Ok(())
            }

            _ => {
                trace!("Ignoring CSI {:?} {}", intermediates, c);
                Ok(())
            }
        };
        self.finish(result);
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
        let result = match (intermediates, byte) {
            ([], b'7') => {
                self.page.saved = self.page.status;
                Ok(())
            }
            ([], b'8') => {
                self.page.status = self.page.saved;
                self.state.wrap_pending = false;
                Ok(())
            }
            ([], b'D') => self.line_feed(),
            ([], b'E') => {
                self.page.status.col = 1;
                self.line_feed()
            }
            ([], b'M') => self.reverse_index(),
            ([], b'c') => self.reset(),

            // Graphic set designation
            ([b'('], set) if charset::is_designator(set) => {
                self.page.status.g0_set = Some(set);
                Ok(())
            }
            ([b')'], set) if charset::is_designator(set) => {
                self.page.status.g1_set = Some(set);
                Ok(())
            }

            _ => {
                trace!("Ignoring ESC {:?} {:?}", intermediates, byte as char);
                Ok(())
            }
        };
        self.finish(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode(page: &mut Page, input: &[u8]) -> UpdateList {
        let mut updates = UpdateList::new();
        AnsiDecoder::new().decode(page, input, &mut updates).unwrap();
        updates
    }

    fn ranges(updates: &UpdateList) -> Vec<(u16, u16, u16)> {
        updates.iter().map(|u| (u.row, u.upd_beg, u.upd_end)).collect()
    }

    #[test]
    fn test_text_is_written_and_recorded() {
        let mut page = Page::new(3, 10).unwrap();
        let updates = decode(&mut page, b"Hello\r\nWorld");

        assert_eq!(page.row_text(1), "Hello     ");
        assert_eq!(page.row_text(2), "World     ");
        assert_eq!(ranges(&updates), vec![(1, 1, 6), (2, 1, 6)]);
        assert_eq!((page.status.row, page.status.col), (2, 6));
    }

    #[test]
    fn test_rendition_is_stored_in_cells() {
        let mut page = Page::new(2, 10).unwrap();
        decode(&mut page, b"\x1b[1;4;31;42mA\x1b[22;24mB\x1b[0mC");

        let a = page.cell(1, 1).unwrap();
        assert_eq!(a.attr, CharAttr::BRIGHT | CharAttr::UNDLN);
        assert_eq!(a.color, ColorPair::new(1, 2));

        let b = page.cell(1, 2).unwrap();
        assert_eq!(b.attr, CharAttr::PLAIN);
        assert_eq!(b.color, ColorPair::new(1, 2));

        let c = page.cell(1, 3).unwrap();
        assert_eq!(c.attr, CharAttr::PLAIN);
        assert!(c.color.is_mono());
    }

    #[test]
    fn test_fade_rendition_is_separate() {
        let mut page = Page::new(2, 10).unwrap();
        decode(&mut page, b"\x1b[5m\x1b[>7;33mx");

        let cell = page.cell(1, 1).unwrap();
        assert_eq!(cell.attr, CharAttr::BLINK);
        assert_eq!(cell.fade_attr, CharAttr::REVVID);
        assert_eq!(cell.fade_color, ColorPair::fg_only(3));
        assert!(cell.color.is_mono());
    }

    #[test]
    fn test_private_sgr_is_ignored() {
        let mut page = Page::new(2, 10).unwrap();
        decode(&mut page, b"\x1b[?1mx");
        assert_eq!(page.cell(1, 1).unwrap().attr, CharAttr::PLAIN);
    }

    #[test]
    fn test_cursor_position_and_movement() {
        let mut page = Page::new(5, 10).unwrap();
        decode(&mut page, b"\x1b[3;4H");
        assert_eq!((page.status.row, page.status.col), (3, 4));

        decode(&mut page, b"\x1b[2A\x1b[20C");
        assert_eq!((page.status.row, page.status.col), (1, 10));

        decode(&mut page, b"\x1b[9B\x1b[3D\x08");
        assert_eq!((page.status.row, page.status.col), (5, 6));

        decode(&mut page, b"\x1b[9;1H");
        assert_eq!((page.status.row, page.status.col), (5, 6));

        decode(&mut page, b"\x1b[H");
        assert_eq!((page.status.row, page.status.col), (1, 1));
    }

    #[test]
    fn test_tab_stops() {
        let mut page = Page::new(2, 20).unwrap();
        decode(&mut page, b"\tx\ty\tz");
        assert_eq!(page.cell(1, 9).unwrap().ch, b'x');
        assert_eq!(page.cell(1, 17).unwrap().ch, b'y');
        assert_eq!(page.cell(1, 20).unwrap().ch, b'z');
    }

    #[test]
    fn test_erase_display_and_line() {
        let mut page = Page::new(3, 4).unwrap();
        decode(&mut page, b"aaaa\r\nbbbb\r\ncccc");

        let updates = decode(&mut page, b"\x1b[2;3H\x1b[K");
        assert_eq!(page.row_text(2), "bb  ");
        assert_eq!(ranges(&updates), vec![(2, 3, 5)]);

        let updates = decode(&mut page, b"\x1b[1K");
        assert_eq!(page.row_text(2), "    ");
        assert_eq!(ranges(&updates), vec![(2, 1, 4)]);

        let updates = decode(&mut page, b"\x1b[J");
        assert_eq!(page.row_text(1), "aaaa");
        assert_eq!(page.row_text(3), "    ");
        assert_eq!(ranges(&updates), vec![(2, 3, 5), (3, 1, 5)]);

        let updates = decode(&mut page, b"\x1b[2J");
        assert_eq!(page.row_text(1), "    ");
        assert_eq!(updates.len(), 3);
        assert!(updates.iter().all(|u| u.is_whole_line(4)));
    }

    #[test]
    fn test_wrap_only_when_enabled() {
        let mut page = Page::new(2, 3).unwrap();
        decode(&mut page, b"abcd");
        assert_eq!(page.row_text(1), "abd");
        assert_eq!(page.row_text(2), "   ");

        let mut page = Page::new(2, 3).unwrap();
        decode(&mut page, b"\x1b[?7habcd");
        assert_eq!(page.row_text(1), "abc");
        assert_eq!(page.row_text(2), "d  ");
        assert!(page.status.wrap_on);
    }

    #[test]
    fn test_line_feed_scrolls_at_bottom() {
        let mut page = Page::new(3, 2).unwrap();
        let updates = decode(&mut page, b"11\r\n22\r\n33\r\n44");

        assert_eq!(page.row_text(1), "22");
        assert_eq!(page.row_text(2), "33");
        assert_eq!(page.row_text(3), "44");
        assert!(updates.len() <= UpdateList::CAPACITY);
    }

    #[test]
    fn test_repeated_scrolls_mark_region_once() {
        let mut page = Page::new(4, 2).unwrap();
        let mut input = Vec::new();
        input.extend_from_slice(b"\x1b[4;1H");
        for _ in 0..1000 {
            input.extend_from_slice(b"\n");
        }
        let updates = decode(&mut page, &input);
        assert_eq!(ranges(&updates), vec![(1, 1, 3), (2, 1, 3), (3, 1, 3), (4, 1, 3)]);
    }

    #[test]
    fn test_scroll_region_and_reverse_index() {
        let mut page = Page::new(4, 2).unwrap();
        decode(&mut page, b"11\r\n22\r\n33\r\n44");

        decode(&mut page, b"\x1b[2;3r");
        assert_eq!((page.scroll_top, page.scroll_bot), (2, 3));
        assert_eq!((page.status.row, page.status.col), (1, 1));

        decode(&mut page, b"\x1b[2;1H\x1bM");
        assert_eq!(page.row_text(1), "11");
        assert_eq!(page.row_text(2), "  ");
        assert_eq!(page.row_text(3), "22");
        assert_eq!(page.row_text(4), "44");

        decode(&mut page, b"\x1b[3;1H\x1bD");
        assert_eq!(page.row_text(2), "22");
        assert_eq!(page.row_text(3), "  ");
        assert_eq!(page.row_text(4), "44");
    }

    #[test]
    fn test_invalid_scroll_region_ignored() {
        let mut page = Page::new(4, 2).unwrap();
        decode(&mut page, b"\x1b[3;2r");
        assert_eq!((page.scroll_top, page.scroll_bot), (1, 4));

        decode(&mut page, b"\x1b[2;99r");
        assert_eq!((page.scroll_top, page.scroll_bot), (2, 4));
    }

    #[test]
    fn test_insert_and_delete_lines() {
        let mut page = Page::new(4, 2).unwrap();
        decode(&mut page, b"11\r\n22\r\n33\r\n44");

        decode(&mut page, b"\x1b[2;2H\x1b[L");
        assert_eq!(page.row_text(2), "  ");
        assert_eq!(page.row_text(3), "22");
        assert_eq!(page.row_text(4), "33");
        assert_eq!(page.status.col, 1);

        decode(&mut page, b"\x1b[2M");
        assert_eq!(page.row_text(2), "33");
        assert_eq!(page.row_text(3), "  ");
        assert_eq!(page.row_text(4), "  ");
    }

    #[test]
    fn test_insert_and_delete_chars() {
        let mut page = Page::new(1, 6).unwrap();
        decode(&mut page, b"abcdef\x1b[1;2H\x1b[2@");
        assert_eq!(page.row_text(1), "a  bcd");

        let updates = decode(&mut page, b"\x1b[3P");
        assert_eq!(page.row_text(1), "acd   ");
        assert_eq!(ranges(&updates), vec![(1, 2, 7)]);
    }

    #[test]
    fn test_graphic_sets() {
        let mut page = Page::new(1, 10).unwrap();
        decode(&mut page, b"\x1b)0a\x0eq\x0fb\x1b(1c");

        assert_eq!(page.status.g1_set, Some(charset::DEC_SPECIAL_GRAPHICS));
        assert_eq!(page.status.g0_set, Some(charset::DEC_ALT_ROM));
        assert_eq!(page.cell(1, 1).unwrap().gs, charset::US_ASCII);
        assert_eq!(page.cell(1, 2).unwrap().gs, charset::DEC_SPECIAL_GRAPHICS);
        assert_eq!(page.cell(1, 3).unwrap().gs, charset::US_ASCII);
        assert_eq!(page.cell(1, 4).unwrap().gs, charset::DEC_ALT_ROM);
    }

    #[test]
    fn test_intermediate_byte_designation_is_ignored() {
        let mut page = Page::new(1, 10).unwrap();
        decode(&mut page, b"\x1b(0\x1b(!1z");

        assert_eq!(page.status.g0_set, Some(charset::DEC_SPECIAL_GRAPHICS));
        assert_eq!(page.cell(1, 1).unwrap().ch, b'z');
        assert_eq!(page.cell(1, 1).unwrap().gs, charset::DEC_SPECIAL_GRAPHICS);
    }

    #[test]
    fn test_save_and_restore_cursor() {
        let mut page = Page::new(5, 10).unwrap();
        decode(&mut page, b"\x1b[2;3H\x1b[7m\x1b7\x1b[5;5H\x1b[0m\x1b8x");

        let cell = page.cell(2, 3).unwrap();
        assert_eq!(cell.ch, b'x');
        assert_eq!(cell.attr, CharAttr::REVVID);
    }

    #[test]
    fn test_modes() {
        let mut page = Page::new(1, 10).unwrap();
        decode(&mut page, b"\x1b[7h\x1b[16h");
        assert!(page.status.vem && page.status.hem);
        assert!(!page.status.wrap_on);

        decode(&mut page, b"\x1b[7l\x1b[?7h");
        assert!(!page.status.vem);
        assert!(page.status.wrap_on);
    }

    #[test]
    fn test_reset_marks_every_row() {
        let mut page = Page::new(3, 4).unwrap();
        let mut updates = UpdateList::new();
        let mut decoder = AnsiDecoder::new();
        decoder
            .decode(&mut page, b"\x1b[2;3r\x1b[1mxyz\x1bc", &mut updates)
            .unwrap();

        assert_eq!(page.row_text(1), "    ");
        assert_eq!(page.status, Status::default());
        assert_eq!((page.scroll_top, page.scroll_bot), (1, 3));
        assert_eq!(ranges(&updates), vec![(1, 1, 5), (2, 1, 5), (3, 1, 5)]);
    }

    #[test]
    fn test_non_ascii_and_ignored_sequences() {
        let mut page = Page::new(1, 10).unwrap();
        decode(&mut page, "a\u{e9}b\x1b#3c\x1b[Zd".as_bytes());
        assert_eq!(page.row_text(1), "abcd      ");
    }

    #[test]
    fn test_sequence_split_across_calls() {
        let mut page = Page::new(2, 10).unwrap();
        let mut decoder = AnsiDecoder::new();
        let mut updates = UpdateList::new();

        decoder.decode(&mut page, b"\x1b[2;", &mut updates).unwrap();
        decoder.decode(&mut page, b"5Hx", &mut updates).unwrap();
        assert_eq!(page.cell(2, 5).unwrap().ch, b'x');
    }

    #[test]
    fn test_full_list_reports_consumed_bytes() {
        let mut page = Page::new(2, 10).unwrap();
        let mut decoder = AnsiDecoder::new();
        let mut updates = UpdateList::new();
        for _ in 0..UpdateList::CAPACITY {
            updates.push(UpdateType::new(2, 1, 2)).unwrap();
        }

        let input = b"\x1b[1;1Hab";
        let err = decoder.decode(&mut page, input, &mut updates).unwrap_err();
        assert!(matches!(
            err,
            PageError::DecodeIncomplete {
                consumed: 6,
                total: 8
            }
        ));
        assert_eq!(page.row_text(1), "          ");

        updates.clear();
        decoder.decode(&mut page, &input[6..], &mut updates).unwrap();
        assert_eq!(page.row_text(1), "ab        ");
        assert_eq!(ranges(&updates), vec![(1, 1, 3)]);
    }
}
