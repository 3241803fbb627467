use std::io::{self, Write};

/// Content lines per page, excluding the footer.
pub const PAGE_HEIGHT_LINES: usize = 60;

const CONTINUED_SUFFIX: &str = " (continued)";

/// Pagination state threaded through document rendering: current page
/// number, lines consumed on the page, and the page's line budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub used: usize,
    pub height: usize,
}

impl PageCursor {
    pub fn new(height: usize) -> Self {
        Self {
            page: 1,
            used: 0,
            height,
        }
    }

    pub fn remaining(&self) -> usize {
        self.height.saturating_sub(self.used)
    }

    pub fn fits(&self, lines: usize) -> bool {
        lines <= self.remaining()
    }

    pub fn advance(&mut self, lines: usize) {
        self.used += lines;
    }

    pub fn next_page(&mut self) {
        self.page += 1;
        self.used = 0;
    }
}

/// Streams a paginated monospace document to a sink, one page at a time.
///
/// Every page opens with the document title (suffixed `(continued)` from
/// page two on) and any continuation header lines, and closes with a
/// page-number footer. Pages are padded to a fixed height and separated by
/// a form feed, so completed pages can be flushed without buffering the
/// whole document.
pub struct DocumentWriter<W: Write> {
    out: W,
    cursor: PageCursor,
    title: String,
    continuation: Vec<String>,
    lines: Vec<String>,
    page_open: bool,
}

impl<W: Write> DocumentWriter<W> {
    pub fn new(out: W, title: impl Into<String>) -> Self {
        Self::with_height(out, title, PAGE_HEIGHT_LINES)
    }

    pub fn with_height(out: W, title: impl Into<String>, height: usize) -> Self {
        Self {
            out,
            cursor: PageCursor::new(height),
            title: title.into(),
            continuation: Vec::new(),
            lines: Vec::new(),
            page_open: false,
        }
    }

    /// Header lines re-printed at the top of every page, under the title.
    pub fn with_continuation(mut self, lines: Vec<String>) -> Self {
        self.continuation = lines;
        self
    }

    /// Breaks the page unless `lines` more content lines fit on it.
    pub fn ensure_space(&mut self, lines: usize) -> io::Result<()> {
        self.open_page();
        if !self.cursor.fits(lines) {
            self.flush_page()?;
            self.open_page();
        }
        Ok(())
    }

    pub fn push_line(&mut self, line: &str) -> io::Result<()> {
        self.ensure_space(1)?;
        self.lines.push(line.to_string());
        self.cursor.advance(1);
        Ok(())
    }

    pub fn push_blank(&mut self) -> io::Result<()> {
        self.push_line("")
    }

    /// Flushes the final page and returns the page count. At least one page
    /// is always emitted.
    pub fn finish(mut self) -> io::Result<u32> {
        if !self.page_open && self.cursor.page > 1 {
            return Ok(self.cursor.page - 1);
        }
        self.open_page();
        let pages = self.cursor.page;
        self.flush_page()?;
        self.out.flush()?;
        Ok(pages)
    }

    fn open_page(&mut self) {
        if self.page_open {
            return;
        }
        self.page_open = true;
        let title = if self.cursor.page == 1 {
            self.title.clone()
        } else {
            format!("{}{}", self.title, CONTINUED_SUFFIX)
        };
        self.lines.push(title);
        self.lines.push(String::new());
        self.cursor.advance(2);
        for line in &self.continuation {
            self.lines.push(line.clone());
        }
        self.cursor.advance(self.continuation.len());
    }

    fn flush_page(&mut self) -> io::Result<()> {
        while self.lines.len() < self.cursor.height {
            self.lines.push(String::new());
        }
        self.lines.push(format!("Page {}", self.cursor.page));
        for line in &self.lines {
            writeln!(self.out, "{}", line)?;
        }
        writeln!(self.out, "\u{000C}")?;
        self.lines.clear();
        self.cursor.next_page();
        self.page_open = false;
        Ok(())
    }
}
