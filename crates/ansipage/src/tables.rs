//! Escape byte tables
//!
//! Literal parameter sequences indexed by attribute bits, colour nibble and
//! double-size sub-code. Everything here is `const` data.

pub const ESC: u8 = 0x1B;

/// Shift in: select G0
pub const SI: u8 = 0x0F;

/// Shift out: select G1
pub const SO: u8 = 0x0E;

pub const CURSOR_OFF: &[u8] = b"\x1b[?25l";
pub const LINE_WRAP_ON: &[u8] = b"\x1b[?7h";
pub const LINE_WRAP_OFF: &[u8] = b"\x1b[?7l";
pub const PLAIN: &[u8] = b"\x1b[0m";
pub const CLEAR_TO_EOL: &[u8] = b"\x1b[K";
pub const FADE_OFF: &[u8] = b"\x1b[>0m";
pub const DESIGNATE_G0: &[u8] = b"\x1b(";
pub const DESIGNATE_G1: &[u8] = b"\x1b)";
pub const SGR_END: u8 = b'm';

/// SGR openers for each combination of the five simple attribute bits:
/// blink 0x01 (5), reverse 0x02 (7), dim 0x04 (2), underline 0x08 (4),
/// bright 0x10 (1).
pub const ATTRIBUTE: [&[u8]; 32] = [
    b"\x1b[0",
    b"\x1b[0;5",
    b"\x1b[0;7",
    b"\x1b[0;5;7",
    b"\x1b[0;2",
    b"\x1b[0;2;5",
    b"\x1b[0;2;7",
    b"\x1b[0;2;5;7",
    b"\x1b[0;4",
    b"\x1b[0;4;5",
    b"\x1b[0;4;7",
    b"\x1b[0;4;5;7",
    b"\x1b[0;2;4",
    b"\x1b[0;2;4;5",
    b"\x1b[0;2;4;7",
    b"\x1b[0;2;4;5;7",
    b"\x1b[0;1",
    b"\x1b[0;1;5",
    b"\x1b[0;1;7",
    b"\x1b[0;1;5;7",
    b"\x1b[0;1;2",
    b"\x1b[0;1;2;5",
    b"\x1b[0;1;2;7",
    b"\x1b[0;1;2;5;7",
    b"\x1b[0;1;4",
    b"\x1b[0;1;4;5",
    b"\x1b[0;1;4;7",
    b"\x1b[0;1;4;5;7",
    b"\x1b[0;1;2;4",
    b"\x1b[0;1;2;4;5",
    b"\x1b[0;1;2;4;7",
    b"\x1b[0;1;2;4;5;7",
];

/// Same as [`ATTRIBUTE`] in the private `>` form that targets the fading state.
pub const FADE_ATTRIBUTE: [&[u8]; 32] = [
    b"\x1b[>0",
    b"\x1b[>0;5",
    b"\x1b[>0;7",
    b"\x1b[>0;5;7",
    b"\x1b[>0;2",
    b"\x1b[>0;2;5",
    b"\x1b[>0;2;7",
    b"\x1b[>0;2;5;7",
    b"\x1b[>0;4",
    b"\x1b[>0;4;5",
    b"\x1b[>0;4;7",
    b"\x1b[>0;4;5;7",
    b"\x1b[>0;2;4",
    b"\x1b[>0;2;4;5",
    b"\x1b[>0;2;4;7",
    b"\x1b[>0;2;4;5;7",
    b"\x1b[>0;1",
    b"\x1b[>0;1;5",
    b"\x1b[>0;1;7",
    b"\x1b[>0;1;5;7",
    b"\x1b[>0;1;2",
    b"\x1b[>0;1;2;5",
    b"\x1b[>0;1;2;7",
    b"\x1b[>0;1;2;5;7",
    b"\x1b[>0;1;4",
    b"\x1b[>0;1;4;5",
    b"\x1b[>0;1;4;7",
    b"\x1b[>0;1;4;5;7",
    b"\x1b[>0;1;2;4",
    b"\x1b[>0;1;2;4;5",
    b"\x1b[>0;1;2;4;7",
    b"\x1b[>0;1;2;4;5;7",
];

pub const FOREGROUND_COLOR: [&[u8]; 8] = [
    b";30", b";31", b";32", b";33", b";34", b";35", b";36", b";37",
];

pub const BACKGROUND_COLOR: [&[u8]; 8] = [
    b";40", b";41", b";42", b";43", b";44", b";45", b";46", b";47",
];

/// Double-size sub-codes stored in the top three attribute bits
pub mod double {
    pub const HIGH_TOP: u8 = 1;
    pub const HIGH_BOTTOM: u8 = 2;
    pub const HIGH_WIDE_TOP: u8 = 3;
    pub const HIGH_WIDE_BOTTOM: u8 = 4;
    pub const OFF: u8 = 5;
    pub const WIDE: u8 = 6;
}

/// DEC line-size controls indexed by double sub-code; index 0 is unused.
pub const DOUBLE_SEQUENCE: [&[u8]; 7] = [
    b"",
    b"\x1b#3",
    b"\x1b#4",
    b"\x1b#3",
    b"\x1b#4",
    b"\x1b#5",
    b"\x1b#6",
];

pub fn attribute(bits: u8) -> &'static [u8] {
    ATTRIBUTE[(bits & 0x1F) as usize]
}

pub fn fade_attribute(bits: u8) -> &'static [u8] {
    FADE_ATTRIBUTE[(bits & 0x1F) as usize]
}

/// `None` for the MONOCOLOR sentinel and any index without a table entry
pub fn foreground(index: u8) -> Option<&'static [u8]> {
    FOREGROUND_COLOR.get(index as usize).copied()
}

pub fn background(index: u8) -> Option<&'static [u8]> {
    BACKGROUND_COLOR.get(index as usize).copied()
}

pub fn double_sequence(code: u8) -> Option<&'static [u8]> {
    DOUBLE_SEQUENCE
        .get(code as usize)
        .copied()
        .filter(|seq| !seq.is_empty())
}
