//! Page snapshots
//!
//! Flattened, archivable copy of a page image and its status, used to hand a
//! decoded page to a later encode pass or to another process.

use rkyv::{Archive, Deserialize, Serialize};

use crate::page::{Cell, CharAttr, ColorPair, Page};
use crate::status::{GraphicSlot, Status};
use crate::PageError;

#[derive(Archive, Deserialize, Serialize, Debug, Clone, PartialEq)]
#[archive(check_bytes)]
pub struct StatusSnapshot {
    pub row: u16,
    pub col: u16,
    pub cur_attr: u8,
    pub color: u8,
    pub fading: u8,
    pub fade_color: u8,

    /// 0 for G0, 1 for G1
    pub gr_set: u8,
    pub g0_set: Option<u8>,
    pub g1_set: Option<u8>,
    pub wrap_on: bool,
    pub vem: bool,
    pub hem: bool,
    pub fade_mode: bool,
}

impl From<&Status> for StatusSnapshot {
    fn from(status: &Status) -> Self {
        Self {
            row: status.row,
            col: status.col,
            cur_attr: status.cur_attr.bits(),
            color: status.color.bits(),
            fading: status.fading.bits(),
            fade_color: status.fade_color.bits(),
            gr_set: match status.gr_set {
                GraphicSlot::G0 => 0,
                GraphicSlot::G1 => 1,
            },
            g0_set: status.g0_set,
            g1_set: status.g1_set,
            wrap_on: status.wrap_on,
            vem: status.vem,
            hem: status.hem,
            fade_mode: status.fade_mode,
        }
    }
}

impl StatusSnapshot {
    fn to_status(&self, rows: u16, cols: u16) -> Result<Status, PageError> {
        if self.row == 0 || self.row > rows || self.col == 0 || self.col > cols {
            return Err(PageError::Snapshot(format!(
                "cursor {};{} outside {}x{} page",
                self.row, self.col, rows, cols
            )));
        }

        Ok(Status {
            row: self.row,
            col: self.col,
            cur_attr: CharAttr::from_bits_retain(self.cur_attr),
            color: ColorPair::from_bits(self.color),
            fading: CharAttr::from_bits_retain(self.fading),
            fade_color: ColorPair::from_bits(self.fade_color),
            gr_set: if self.gr_set == 0 {
                GraphicSlot::G0
            } else {
                GraphicSlot::G1
            },
            g0_set: self.g0_set,
            g1_set: self.g1_set,
            wrap_on: self.wrap_on,
            vem: self.vem,
            hem: self.hem,
            fade_mode: self.fade_mode,
        })
    }
}

/// Page image with one byte vector per cell field
#[derive(Archive, Deserialize, Serialize, Debug, Clone, PartialEq)]
#[archive(check_bytes)]
pub struct PageSnapshot {
    pub rows: u16,
    pub cols: u16,

    /// Cell fields in row-major order
    pub chars: Vec<u8>,
    pub graphic_sets: Vec<u8>,
    pub attrs: Vec<u8>,
    pub fade_attrs: Vec<u8>,
    pub colors: Vec<u8>,
    pub fade_colors: Vec<u8>,

    pub status: StatusSnapshot,
    pub saved: StatusSnapshot,
    pub scroll_top: u16,
    pub scroll_bot: u16,
    pub last_mod: u32,
}

impl PageSnapshot {
    /// Serialize snapshot to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, PageError> {
        rkyv::to_bytes::<_, 1024>(self)
            .map(|b| b.to_vec())
            .map_err(|e| PageError::Snapshot(e.to_string()))
    }

    /// Deserialize snapshot from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PageError> {
        let archived = rkyv::check_archived_root::<Self>(bytes)
            .map_err(|e| PageError::Snapshot(e.to_string()))?;

        archived
            .deserialize(&mut rkyv::Infallible)
            .map_err(|e| PageError::Snapshot(e.to_string()))
    }
}

impl Page {
    pub fn snapshot(&self) -> PageSnapshot {
        let cells = self.cells();
        let field = |f: fn(&Cell) -> u8| cells.iter().map(f).collect::<Vec<u8>>();

        PageSnapshot {
            rows: self.rows(),
            cols: self.cols(),
            chars: field(|c| c.ch),
            graphic_sets: field(|c| c.gs),
            attrs: field(|c| c.attr.bits()),
            fade_attrs: field(|c| c.fade_attr.bits()),
            colors: field(|c| c.color.bits()),
            fade_colors: field(|c| c.fade_color.bits()),
            status: StatusSnapshot::from(&self.status),
            saved: StatusSnapshot::from(&self.saved),
            scroll_top: self.scroll_top,
            scroll_bot: self.scroll_bot,
            last_mod: self.last_mod as u32,
        }
    }

    /// Rebuild a page, checking that every field agrees with the dimensions.
    pub fn from_snapshot(snapshot: &PageSnapshot) -> Result<Self, PageError> {
        let mut page = Page::new(snapshot.rows, snapshot.cols)?;
        let len = page.cells().len();

        let fields = [
            ("chars", &snapshot.chars),
            ("graphic_sets", &snapshot.graphic_sets),
            ("attrs", &snapshot.attrs),
            ("fade_attrs", &snapshot.fade_attrs),
            ("colors", &snapshot.colors),
            ("fade_colors", &snapshot.fade_colors),
        ];
        for (name, data) in fields {
            if data.len() != len {
                return Err(PageError::Snapshot(format!(
                    "{} has {} entries, expected {}",
                    name,
                    data.len(),
                    len
                )));
            }
        }

        let cells: Vec<Cell> = (0..len)
            .map(|i| Cell {
                ch: snapshot.chars[i],
                gs: snapshot.graphic_sets[i],
                attr: CharAttr::from_bits_retain(snapshot.attrs[i]),
                fade_attr: CharAttr::from_bits_retain(snapshot.fade_attrs[i]),
                color: ColorPair::from_bits(snapshot.colors[i]),
                fade_color: ColorPair::from_bits(snapshot.fade_colors[i]),
            })
            .collect();
        page.restore_cells(&cells);

        if snapshot.scroll_top == 0
            || snapshot.scroll_top > snapshot.scroll_bot
            || snapshot.scroll_bot > snapshot.rows
        {
            return Err(PageError::Snapshot(format!(
                "scroll region {}..={} outside {} rows",
                snapshot.scroll_top, snapshot.scroll_bot, snapshot.rows
            )));
        }

        page.status = snapshot.status.to_status(snapshot.rows, snapshot.cols)?;
        page.saved = snapshot.saved.to_status(snapshot.rows, snapshot.cols)?;
        page.scroll_top = snapshot.scroll_top;
        page.scroll_bot = snapshot.scroll_bot;
        page.last_mod = snapshot.last_mod as usize;
        Ok(page)
    }
}
