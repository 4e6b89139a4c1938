use crate::error::Result;
use crate::highlight::{Highlight, Highlighter};
use crate::language::Language;
use crate::row::Row;
use log::info;
use std::cmp;
use std::fs::{self, File};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::slice;

// Contain both actual path sequence and display string
pub struct FilePath {
    pub path: PathBuf,
    pub display: String,
}

impl FilePath {
    fn from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        FilePath {
            path: PathBuf::from(path),
            display: path.to_string_lossy().to_string(),
        }
    }

    fn from_string<S: Into<String>>(s: S) -> Self {
        let display = s.into();
        FilePath {
            path: PathBuf::from(&display),
            display,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum CursorDir {
    Left,
    Right,
    Up,
    Down,
}

pub struct Lines<'a>(slice::Iter<'a, Row>);

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|r| r.buffer())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.0.as_slice().len();
        (len, Some(len))
    }
}

pub struct TextBuffer {
    // (x, y) coordinate in internal text buffer of rows. cy may be rows.len() which means the
    // virtual empty line after the last line
    cx: usize,
    cy: usize,
    // File editor is opening
    file: Option<FilePath>,
    // Lines of text buffer
    rows: Vec<Row>,
    // Number of changes since the file was loaded or saved
    dirty: usize,
    // Language which current buffer belongs to. None means plain text
    lang: Option<&'static Language>,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl TextBuffer {
    pub fn empty() -> Self {
        Self {
            cx: 0,
            cy: 0,
            file: None,
            rows: vec![],
            dirty: 0,
            lang: None,
        }
    }

    pub fn with_lines<'a, I: Iterator<Item = &'a str>>(lines: I) -> Self {
        let mut buf = Self::empty();
        for line in lines {
            buf.insert_row(buf.rows.len(), line);
        }
        buf.dirty = 0;
        buf
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut buf = Self::empty();
        buf.file = Some(FilePath::from(path));
        buf.lang = Language::detect(path);

        match File::open(path) {
            Ok(f) => {
                for line in io::BufReader::new(f).split(b'\n') {
                    let mut line = line?;
                    while line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    buf.insert_row(buf.rows.len(), line);
                }
                info!(
                    "Opened {} ({} lines, {})",
                    path.display(),
                    buf.rows.len(),
                    buf.lang_name(),
                );
            }
            // When the path does not exist, consider it as a new file
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("New file {}", path.display());
            }
            Err(err) => return Err(err.into()),
        }

        buf.dirty = 0;
        Ok(buf)
    }

    fn carried_in_comment(&self, y: usize) -> bool {
        y > 0 && self.rows[y - 1].hl_open_comment()
    }

    fn highlighter_at(&self, y: usize) -> Highlighter {
        Highlighter::new(self.lang, self.carried_in_comment(y))
    }

    // Re-highlight rows from 'y' forward while open block comment state at end of a row keeps
    // changing. Iterative so that flipping comment state of many rows does not grow the stack
    fn propagate_highlight(&mut self, mut y: usize) {
        while y < self.rows.len() {
            let hl = self.highlighter_at(y);
            if !self.rows[y].update_highlight(hl) {
                break;
            }
            y += 1;
        }
    }

    fn renumber(&mut self, from: usize) {
        for (idx, row) in self.rows.iter_mut().enumerate().skip(from) {
            row.idx = idx;
        }
    }

    fn rehighlight_all(&mut self) {
        for y in 0..self.rows.len() {
            let hl = self.highlighter_at(y);
            self.rows[y].update_highlight(hl);
        }
    }

    pub fn set_lang(&mut self, lang: Option<&'static Language>) {
        self.lang = lang;
        self.rehighlight_all();
    }

    pub fn insert_row<B: Into<Vec<u8>>>(&mut self, at: usize, line: B) {
        if at > self.rows.len() {
            return;
        }

        let carried = self.carried_in_comment(at);
        let row = Row::new(at, line, self.highlighter_at(at));
        let open = row.hl_open_comment();
        self.rows.insert(at, row);
        self.renumber(at + 1);

        // The row after inserted one previously received the state from the row above
        if open != carried {
            self.propagate_highlight(at + 1);
        }
        self.dirty += 1;
    }

    pub fn delete_row(&mut self, at: usize) {
        if at >= self.rows.len() {
            return;
        }

        let removed = self.rows.remove(at);
        self.renumber(at);

        if removed.hl_open_comment() != self.carried_in_comment(at) {
            self.propagate_highlight(at);
        }
        self.dirty += 1;
    }

    pub fn row_insert_char(&mut self, y: usize, at: usize, c: u8) {
        if y >= self.rows.len() {
            return;
        }
        let hl = self.highlighter_at(y);
        if self.rows[y].insert_char(at, c, hl) {
            self.propagate_highlight(y + 1);
        }
        self.dirty += 1;
    }

    pub fn row_delete_char(&mut self, y: usize, at: usize) {
        if y >= self.rows.len() {
            return;
        }
        let hl = self.highlighter_at(y);
        if let Some(changed) = self.rows[y].delete_char(at, hl) {
            if changed {
                self.propagate_highlight(y + 1);
            }
            self.dirty += 1;
        }
    }

    pub fn row_append_string(&mut self, y: usize, s: &[u8]) {
        if y >= self.rows.len() {
            return;
        }
        let hl = self.highlighter_at(y);
        if self.rows[y].append(s, hl) {
            self.propagate_highlight(y + 1);
        }
        self.dirty += 1;
    }

    fn row_split_off(&mut self, y: usize, at: usize) -> Vec<u8> {
        let hl = self.highlighter_at(y);
        let (tail, changed) = self.rows[y].split_off(at, hl);
        if changed {
            self.propagate_highlight(y + 1);
        }
        self.dirty += 1;
        tail
    }

    pub fn insert_char(&mut self, c: u8) {
        if self.cy == self.rows.len() {
            self.insert_row(self.rows.len(), Vec::new());
        }
        self.row_insert_char(self.cy, self.cx, c);
        self.cx += 1;
    }

    pub fn insert_line(&mut self) {
        if self.cx == 0 {
            self.insert_row(self.cy, Vec::new());
        } else {
            let tail = self.row_split_off(self.cy, self.cx);
            self.insert_row(self.cy + 1, tail);
        }
        self.cy += 1;
        self.cx = 0;
    }

    fn squash_to_previous_line(&mut self) {
        let removed = self.rows[self.cy].buffer().to_vec();
        // Move cursor to previous line
        self.cy -= 1;
        // At top of line, backspace concats current line to previous line
        self.cx = self.rows[self.cy].len();
        self.row_append_string(self.cy, &removed);
        self.delete_row(self.cy + 1);
    }

    // Backspace
    pub fn delete_char(&mut self) {
        if self.cy == self.rows.len() || self.cx == 0 && self.cy == 0 {
            return;
        }
        if self.cx > 0 {
            self.row_delete_char(self.cy, self.cx - 1);
            self.cx -= 1;
        } else {
            self.squash_to_previous_line();
        }
    }

    pub fn delete_right_char(&mut self) {
        let (cx, cy) = self.cursor();
        self.move_cursor_one(CursorDir::Right);
        if self.cursor() != (cx, cy) {
            self.delete_char();
        }
    }

    pub fn move_cursor_one(&mut self, dir: CursorDir) {
        match dir {
            CursorDir::Up => self.cy = self.cy.saturating_sub(1),
            CursorDir::Left => {
                if self.cx > 0 {
                    self.cx -= 1;
                } else if self.cy > 0 {
                    // When moving to left at top of line, move cursor to end of previous line
                    self.cy -= 1;
                    self.cx = self.rows[self.cy].len();
                }
            }
            CursorDir::Down => {
                // Allow to move cursor until next line to the last line of file to enable to add a
                // new line at the end.
                if self.cy < self.rows.len() {
                    self.cy += 1;
                }
            }
            CursorDir::Right => {
                if self.cy < self.rows.len() {
                    if self.cx < self.rows[self.cy].len() {
                        self.cx += 1;
                    } else {
                        // When moving to right at the end of line, move cursor to top of next line.
                        self.cy += 1;
                        self.cx = 0;
                    }
                }
            }
        };

        // Snap cursor to end of line when moving up/down from longer line
        let len = self.rows.get(self.cy).map(Row::len).unwrap_or(0);
        if self.cx > len {
            self.cx = len;
        }
    }

    pub fn move_cursor_page(&mut self, dir: CursorDir, rowoff: usize, num_rows: usize) {
        self.cy = match dir {
            CursorDir::Up => rowoff, // Top of screen
            CursorDir::Down => {
                cmp::min((rowoff + num_rows).saturating_sub(1), self.rows.len()) // Bottom of screen
            }
            _ => unreachable!(),
        };
        for _ in 0..num_rows {
            self.move_cursor_one(dir);
        }
    }

    pub fn move_cursor_to_line_head(&mut self) {
        self.cx = 0;
    }

    pub fn move_cursor_to_line_end(&mut self) {
        if self.cy < self.rows.len() {
            self.cx = self.rows[self.cy].len();
        }
    }

    // Every line followed by exactly one newline, including the last one
    pub fn to_bytes(&self) -> Vec<u8> {
        let cap = self.rows.iter().map(|r| r.len() + 1).sum();
        let mut bytes = Vec::with_capacity(cap);
        for row in self.rows.iter() {
            bytes.extend_from_slice(row.buffer());
            bytes.push(b'\n');
        }
        bytes
    }

    // Returns the number of written bytes. On error, buffer state and modification counter are
    // not touched
    pub fn save(&mut self) -> Result<usize> {
        let file = if let Some(file) = &self.file {
            file
        } else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "no file name").into());
        };

        let bytes = self.to_bytes();
        fs::write(&file.path, &bytes)?;
        info!("Saved {} bytes to {}", bytes.len(), file.display);

        self.dirty = 0;
        Ok(bytes.len())
    }

    pub fn set_file<S: Into<String>>(&mut self, file_path: S) {
        let file = FilePath::from_string(file_path);
        let lang = Language::detect(&file.path);
        self.file = Some(file);
        if lang != self.lang {
            info!("Language changed to {}", lang.map(|l| l.name).unwrap_or("plain"));
            self.set_lang(lang);
        }
    }

    // Overlay highlights temporarily. Returns overwritten ones to restore them later
    pub fn replace_highlights(&mut self, y: usize, start: usize, hl: &[Highlight]) -> Vec<Highlight> {
        match self.rows.get_mut(y) {
            Some(row) => row.replace_highlights(start, hl),
            None => vec![],
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn lines(&self) -> Lines<'_> {
        Lines(self.rows.iter())
    }

    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    pub fn filename(&self) -> &str {
        self.file
            .as_ref()
            .map(|f| f.display.as_str())
            .unwrap_or("[No Name]")
    }

    pub fn modified(&self) -> bool {
        self.dirty > 0
    }

    pub fn dirty(&self) -> usize {
        self.dirty
    }

    pub fn lang(&self) -> Option<&'static Language> {
        self.lang
    }

    pub fn lang_name(&self) -> &'static str {
        self.lang.map(|l| l.name).unwrap_or("no ft")
    }

    pub fn cx(&self) -> usize {
        self.cx
    }

    pub fn cy(&self) -> usize {
        self.cy
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cx, self.cy)
    }

    pub fn set_cursor(&mut self, x: usize, y: usize) {
        self.cx = x;
        self.cy = y;
    }
}
