//! Terminal status mirror
//!
//! Cursor position and "currently active" rendition of the terminal. The
//! decoder applies escape sequences to it; the encoder reads the G0/G1
//! designations as pinned sets.

use crate::page::{charset, CharAttr, ColorPair};

/// Which designation register is shifted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphicSlot {
    #[default]
    G0,
    G1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// Cursor row (1-based)
    pub row: u16,

    /// Cursor column (1-based)
    pub col: u16,

    pub cur_attr: CharAttr,

    pub color: ColorPair,

    /// Fading attribute applied to new characters
    pub fading: CharAttr,

    pub fade_color: ColorPair,

    pub gr_set: GraphicSlot,

    pub g0_set: Option<u8>,

    pub g1_set: Option<u8>,

    /// Auto-wrap at the last column
    pub wrap_on: bool,

    /// Vertical editing mode
    pub vem: bool,

    /// Horizontal editing mode
    pub hem: bool,

    /// Route the attribute setters to the fading fields
    pub fade_mode: bool,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            row: 1,
            col: 1,
            cur_attr: CharAttr::PLAIN,
            color: ColorPair::MONO,
            fading: CharAttr::PLAIN,
            fade_color: ColorPair::MONO,
            gr_set: GraphicSlot::G0,
            g0_set: None,
            g1_set: None,
            wrap_on: false,
            vem: false,
            hem: false,
            fade_mode: false,
        }
    }
}

impl Status {
    pub fn set_fade(&mut self, on: bool) {
        self.fade_mode = on;
    }

    fn attr_mut(&mut self) -> &mut CharAttr {
        if self.fade_mode {
            &mut self.fading
        } else {
            &mut self.cur_attr
        }
    }

    fn color_mut(&mut self) -> &mut ColorPair {
        if self.fade_mode {
            &mut self.fade_color
        } else {
            &mut self.color
        }
    }

    pub fn set_plain(&mut self) {
        *self.attr_mut() = CharAttr::PLAIN;
    }

    pub fn set_attr(&mut self, attr: CharAttr) {
        *self.attr_mut() = attr;
    }

    pub fn on_attr(&mut self, attr: CharAttr) {
        self.attr_mut().insert(attr);
    }

    pub fn off_attr(&mut self, attr: CharAttr) {
        self.attr_mut().remove(attr);
    }

    pub fn set_color(&mut self, color: ColorPair) {
        *self.color_mut() = color;
    }

    pub fn set_fg(&mut self, fg: u8) {
        let color = self.color_mut();
        *color = color.with_fg(fg);
    }

    pub fn set_bg(&mut self, bg: u8) {
        let color = self.color_mut();
        *color = color.with_bg(bg);
    }

    /// Graphic set a printed character is drawn from
    pub fn active_set(&self) -> u8 {
        let set = match self.gr_set {
            GraphicSlot::G0 => self.g0_set,
            GraphicSlot::G1 => self.g1_set,
        };
        set.unwrap_or(charset::US_ASCII)
    }
}
