use anyhow::Result;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestFixtures {
    temp_dir: TempDir,
}

impl TestFixtures {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    pub fn create_test_file(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let file_path = self.temp_dir.path().join(name);
        std::fs::write(&file_path, content)?;
        Ok(file_path)
    }

    /// Path inside the fixture directory that does not exist yet
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

// Common page images
pub mod pages {
    use ansipage::{charset, Cell, CharAttr, ColorPair, Page};

    /// Plain text, one line per row
    pub fn text_page(rows: u16, cols: u16, lines: &[&str]) -> Page {
        let mut page = Page::new(rows, cols).expect("fixture dimensions");
        for (i, line) in lines.iter().enumerate() {
            page.write_text(i as u16 + 1, 1, line.as_bytes(), Cell::default());
        }
        page
    }

    /// Quote board with a bright heading, coloured fields and a ruled line
    pub fn quote_board() -> Page {
        let mut page = Page::new(6, 40).expect("fixture dimensions");

        let heading = Cell::default().with_attr(CharAttr::BRIGHT | CharAttr::UNDLN);
        page.write_text(1, 1, b"QUOTES", heading);

        let rule = Cell::default().with_gs(charset::DEC_SPECIAL_GRAPHICS);
        page.write_text(2, 1, &[b'q'; 40], rule);

        let up = Cell::default().with_color(ColorPair::fg_only(2));
        let down = Cell::default().with_color(ColorPair::new(1, 0));
        page.write_text(3, 1, b"ABC", Cell::default());
        page.write_text(3, 20, b"101.25", up);
        page.write_text(4, 1, b"XYZ", Cell::default());
        page.write_text(4, 20, b"99.50", down);

        let blink = Cell::default()
            .with_attr(CharAttr::BLINK | CharAttr::REVVID)
            .with_fade(CharAttr::PLAIN, ColorPair::fg_only(3));
        page.write_text(6, 31, b"HALTED", blink);
        page
    }
}

// Common ANSI streams
pub mod data {
    pub const GREETING: &[u8] = b"\x1b[2J\x1b[HHello, World!";

    pub const COLORED_WORDS: &[u8] =
        b"\x1b[31mRed\x1b[0m \x1b[32mGreen\x1b[0m \x1b[1;34mBlue\x1b[0m";

    /// Title, box drawing and a scrolled status line
    pub const FRAMED_SCREEN: &[u8] = b"\x1b[?7h\x1b[2J\x1b[1;1H\x1b[1;4mTitle\x1b[0m\
        \x1b)0\x1b[2;1H\x0elqqqqk\x0f\
        \x1b[3;1H\x0ex\x0fabcd\x0ex\x0f\
        \x1b[4;1H\x0emqqqqj\x0f\
        \x1b[5;1H\x1b[7mstatus\x1b[0m\r\n\r\nend";

    pub fn generate_text_lines(count: usize) -> String {
        (0..count)
            .map(|i| format!("Line {i}: quick brown fox"))
            .collect::<Vec<_>>()
            .join("\r\n")
    }
}
