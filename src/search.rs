use crate::highlight::Highlight;
use crate::text_buffer::TextBuffer;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FindDir {
    Back,
    Forward,
}

struct SavedHighlight {
    y: usize,
    start: usize,
    hl: Vec<Highlight>,
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// Incremental row-wise search. State persists across calls within one search session
pub struct Search {
    last_match: Option<usize>,
    dir: FindDir,
    saved: Option<SavedHighlight>,
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

impl Search {
    pub fn new() -> Self {
        Self {
            last_match: None,
            dir: FindDir::Forward,
            saved: None,
        }
    }

    pub fn set_dir(&mut self, dir: FindDir) {
        self.dir = dir;
    }

    // Next search starts from the top of buffer
    pub fn reset(&mut self) {
        self.last_match = None;
        self.dir = FindDir::Forward;
    }

    // Put back highlights which were overwritten by the previous match. Calling this twice is
    // harmless since saved highlights are consumed
    pub fn restore_highlight(&mut self, buf: &mut TextBuffer) {
        if let Some(saved) = self.saved.take() {
            buf.replace_highlights(saved.y, saved.start, &saved.hl);
        }
    }

    fn next_line(&self, y: Option<usize>, num_rows: usize) -> usize {
        match (y, self.dir) {
            (None, _) => 0,
            (Some(y), FindDir::Forward) if y + 1 >= num_rows => 0,
            (Some(y), FindDir::Forward) => y + 1,
            (Some(0), FindDir::Back) => num_rows - 1,
            (Some(y), FindDir::Back) => y - 1,
        }
    }

    // Finds the first row containing `query` after the last match in the current direction,
    // wrapping around at both ends. On match the cursor moves to the match and the matched
    // region is highlighted until the next call or `restore_highlight`
    pub fn find(&mut self, buf: &mut TextBuffer, query: &[u8]) -> Option<(usize, usize)> {
        self.restore_highlight(buf);

        if query.is_empty() {
            return None;
        }
        if self.last_match.is_none() {
            self.dir = FindDir::Forward;
        }

        let num_rows = buf.rows().len();
        let mut current = self.last_match;
        for _ in 0..num_rows {
            let y = self.next_line(current, num_rows);
            current = Some(y);

            let row = &buf.rows()[y];
            if let Some(rx) = find_bytes(row.render_text(), query) {
                let cx = row.cx_from_rx(rx);
                self.last_match = Some(y);
                buf.set_cursor(cx, y);
                let hl = buf.replace_highlights(y, rx, &vec![Highlight::Match; query.len()]);
                self.saved = Some(SavedHighlight { y, start: rx, hl });
                return Some((cx, y));
            }
        }

        None
    }
}
