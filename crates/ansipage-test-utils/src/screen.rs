use ansipage::Page;
use anyhow::Result;
use similar::{ChangeTag, TextDiff};

/// Reference terminal that an encoded stream is replayed into
pub struct ScreenCapture {
    parser: vt100::Parser,
    cols: u16,
}

impl ScreenCapture {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            parser: vt100::Parser::new(rows, cols, 0),
            cols,
        }
    }

    pub fn process(&mut self, bytes: &[u8]) {
        self.parser.process(bytes);
    }

    pub fn screen(&self) -> &vt100::Screen {
        self.parser.screen()
    }

    /// Row text with untouched cells shown as spaces (1-based row)
    pub fn row_text(&self, row: u16) -> String {
        (0..self.cols)
            .map(|col| {
                self.screen()
                    .cell(row - 1, col)
                    .map(|cell| cell.contents())
                    .filter(|text| !text.is_empty())
                    .unwrap_or_else(|| " ".to_string())
            })
            .collect()
    }

    pub fn lines(&self) -> Vec<String> {
        let (rows, _) = self.screen().size();
        (1..=rows).map(|row| self.row_text(row)).collect()
    }
}

/// Text of every row of `page`
pub fn page_lines(page: &Page) -> Vec<String> {
    (1..=page.rows()).map(|row| page.row_text(row)).collect()
}

pub struct ScreenComparator;

impl Default for ScreenComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenComparator {
    pub fn new() -> Self {
        Self
    }

    pub fn compare_output(&self, expected: &str, actual: &str) -> Result<()> {
        let expected_clean = self.normalize_output(expected);
        let actual_clean = self.normalize_output(actual);

        if expected_clean == actual_clean {
            return Ok(());
        }

        // Generate diff for debugging
        let diff = TextDiff::from_lines(&expected_clean, &actual_clean);
        let mut diff_output = String::new();

        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            diff_output.push_str(&format!("{sign}{change}"));
        }

        anyhow::bail!(
            "Screen mismatch:\n\nExpected:\n{}\n\nActual:\n{}\n\nDiff:\n{}",
            expected_clean,
            actual_clean,
            diff_output
        )
    }

    pub fn compare_lines(&self, expected: &[String], actual: &[String]) -> Result<()> {
        if expected.len() != actual.len() {
            anyhow::bail!(
                "Row count mismatch: expected {} rows, got {} rows",
                expected.len(),
                actual.len()
            );
        }
        self.compare_output(&expected.join("\n"), &actual.join("\n"))
    }

    /// Compare the text of `page` with what the reference terminal shows
    pub fn compare_page(&self, page: &Page, capture: &ScreenCapture) -> Result<()> {
        self.compare_lines(&page_lines(page), &capture.lines())
    }

    fn normalize_output(&self, output: &str) -> String {
        output
            .lines()
            .map(|line| self.normalize_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn normalize_line(&self, line: &str) -> String {
        let stripped = strip_ansi_escapes::strip(line);
        let clean = String::from_utf8_lossy(&stripped);
        clean.trim_end().to_string()
    }
}
