use crate::highlight::{Highlight, Highlighter};
use std::cmp;

pub const TAB_STOP: usize = 8;

// Every mutator splices `buf` and then recomputes `render` and `hl` before returning, so a row is
// never observed with render text or highlights out of sync with its raw bytes.
#[derive(Default, Debug)]
pub struct Row {
    pub idx: usize,
    buf: Vec<u8>,
    render: Vec<u8>,
    hl: Vec<Highlight>,
    hl_open_comment: bool,
}

impl Row {
    pub fn new<B: Into<Vec<u8>>>(idx: usize, line: B, hl: Highlighter) -> Row {
        let mut row = Row {
            idx,
            buf: line.into(),
            ..Default::default()
        };
        row.update(hl);
        row
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    pub fn render_text(&self) -> &[u8] {
        &self.render
    }

    pub fn highlights(&self) -> &[Highlight] {
        &self.hl
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn render_len(&self) -> usize {
        self.render.len()
    }

    pub fn hl_open_comment(&self) -> bool {
        self.hl_open_comment
    }

    fn update_render(&mut self) {
        let tabs = self.buf.iter().filter(|b| **b == b'\t').count();
        self.render.clear();
        self.render.reserve(self.buf.len() + tabs * (TAB_STOP - 1));
        for &b in self.buf.iter() {
            if b == b'\t' {
                self.render.push(b' ');
                while self.render.len() % TAB_STOP != 0 {
                    self.render.push(b' ');
                }
            } else {
                self.render.push(b);
            }
        }
    }

    // Returns true when open block comment state at end of this row was changed. In the case,
    // the next row must be highlighted again.
    pub fn update_highlight(&mut self, hl: Highlighter) -> bool {
        let open = hl.highlight(&self.render, &mut self.hl);
        let changed = self.hl_open_comment != open;
        self.hl_open_comment = open;
        changed
    }

    // Overwrites highlights from 'start' temporarily (e.g. search match) and returns overwritten
    // ones so that caller can restore them by calling this method again
    pub fn replace_highlights(&mut self, start: usize, hl: &[Highlight]) -> Vec<Highlight> {
        let end = cmp::min(start + hl.len(), self.hl.len());
        let start = cmp::min(start, end);
        let saved = self.hl[start..end].to_vec();
        self.hl[start..end].copy_from_slice(&hl[..end - start]);
        saved
    }

    fn update(&mut self, hl: Highlighter) -> bool {
        self.update_render();
        self.update_highlight(hl)
    }

    pub fn rx_from_cx(&self, cx: usize) -> usize {
        self.buf.iter().take(cx).fold(0, |rx, b| {
            if *b == b'\t' {
                // Proceed TAB_STOP spaces then subtract spaces by mod TAB_STOP
                rx + TAB_STOP - (rx % TAB_STOP)
            } else {
                rx + 1
            }
        })
    }

    pub fn cx_from_rx(&self, rx: usize) -> usize {
        let mut current_rx = 0;
        for (cx, b) in self.buf.iter().enumerate() {
            if *b == b'\t' {
                current_rx += TAB_STOP - (current_rx % TAB_STOP);
            } else {
                current_rx += 1;
            }
            if current_rx > rx {
                return cx; // Found
            }
        }
        self.buf.len() // Fall back to end of line
    }

    // Note: 'at' is an index of buffer, not render text. It is clamped to the end of line.
    pub fn insert_char(&mut self, at: usize, c: u8, hl: Highlighter) -> bool {
        if self.buf.len() <= at {
            self.buf.push(c);
        } else {
            self.buf.insert(at, c);
        }
        self.update(hl)
    }

    // Returns None when nothing was deleted. Otherwise returns whether the open comment state changed
    pub fn delete_char(&mut self, at: usize, hl: Highlighter) -> Option<bool> {
        if at < self.buf.len() {
            self.buf.remove(at);
            Some(self.update(hl))
        } else {
            None
        }
    }

    pub fn append(&mut self, s: &[u8], hl: Highlighter) -> bool {
        self.buf.extend_from_slice(s);
        self.update(hl)
    }

    // Cuts the row at 'at' and returns the tail
    pub fn split_off(&mut self, at: usize, hl: Highlighter) -> (Vec<u8>, bool) {
        let at = at.min(self.buf.len());
        let tail = self.buf.split_off(at);
        let changed = self.update(hl);
        (tail, changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::Highlight;
    use proptest::prelude::*;

    fn plain() -> Highlighter {
        Highlighter::new(None, false)
    }

    fn row(s: &str) -> Row {
        Row::new(0, s, plain())
    }

    #[test]
    fn render_without_tabs_is_copy() {
        let r = row("hello, world");
        assert_eq!(r.render_text(), r.buffer());
        assert_eq!(r.highlights().len(), r.render_len());
    }

    #[test]
    fn render_expands_tabs() {
        let r = row("\tab\tc");
        assert_eq!(r.render_text(), b"        ab      c");
        assert_eq!(r.render_len(), 17);
        assert_eq!(r.highlights().len(), 17);

        let r = row("1234567\tx");
        assert_eq!(r.render_text(), b"1234567 x");
    }

    #[test]
    fn column_mapping() {
        let r = row("a\tb");
        assert_eq!(r.rx_from_cx(0), 0);
        assert_eq!(r.rx_from_cx(1), 1);
        assert_eq!(r.rx_from_cx(2), 8);
        assert_eq!(r.rx_from_cx(3), 9);

        // Any render column inside the tab maps to the tab itself
        for rx in 1..8 {
            assert_eq!(r.cx_from_rx(rx), 1, "rx={}", rx);
        }
        assert_eq!(r.cx_from_rx(8), 2);
        assert_eq!(r.cx_from_rx(9), 3);
        assert_eq!(r.cx_from_rx(100), 3);
    }

    #[test]
    fn insert_char_clamps_column() {
        let mut r = row("abc");
        r.insert_char(3, b'd', plain());
        assert_eq!(r.buffer(), b"abcd");
        assert_eq!(r.render_len(), 4);
        assert!(r.highlights().iter().all(|h| *h == Highlight::Normal));

        r.insert_char(100, b'e', plain());
        assert_eq!(r.buffer(), b"abcde");
        r.insert_char(0, b'_', plain());
        assert_eq!(r.buffer(), b"_abcde");
    }

    #[test]
    fn delete_char_out_of_range_is_noop() {
        let mut r = row("ab");
        assert_eq!(r.delete_char(2, plain()), None);
        assert_eq!(r.buffer(), b"ab");
        assert_eq!(r.delete_char(0, plain()), Some(false));
        assert_eq!(r.buffer(), b"b");
    }

    #[test]
    fn render_follows_tab_edits() {
        let mut r = row("ab");
        r.insert_char(1, b'\t', plain());
        assert_eq!(r.render_text(), b"a       b");
        assert_eq!(r.highlights().len(), 9);
        r.delete_char(1, plain());
        assert_eq!(r.render_text(), b"ab");
        assert_eq!(r.highlights().len(), 2);
    }

    #[test]
    fn split_off_and_append() {
        let mut r = row("hello world");
        let (tail, _) = r.split_off(5, plain());
        assert_eq!(tail, b" world");
        assert_eq!(r.buffer(), b"hello");
        assert_eq!(r.render_len(), 5);
        r.append(&tail, plain());
        assert_eq!(r.buffer(), b"hello world");
        assert_eq!(r.render_len(), 11);
    }

    #[test]
    fn replace_and_restore_highlights() {
        let mut r = row("foo bar");
        let saved = r.replace_highlights(4, &[Highlight::Match; 3]);
        assert_eq!(saved, vec![Highlight::Normal; 3]);
        assert_eq!(&r.highlights()[4..], &[Highlight::Match; 3]);
        assert_eq!(&r.highlights()[..4], &[Highlight::Normal; 4]);

        r.replace_highlights(4, &saved);
        assert!(r.highlights().iter().all(|h| *h == Highlight::Normal));

        // Clipped at end of render text
        let saved = r.replace_highlights(6, &[Highlight::Match; 3]);
        assert_eq!(saved.len(), 1);
        assert_eq!(r.highlights().len(), 7);
    }

    proptest! {
        #[test]
        fn inverse_mapping(line in "[a-c\t ]{0,40}") {
            let r = row(&line);
            for c in 0..=r.len() {
                prop_assert_eq!(r.cx_from_rx(r.rx_from_cx(c)), c);
            }
        }

        #[test]
        fn highlight_len_matches_render(line in "[a-z\t\"/*0-9 ]{0,40}") {
            let r = Row::new(0, line.as_str(), Highlighter::new(Some(&crate::language::C), false));
            prop_assert_eq!(r.highlights().len(), r.render_len());
        }
    }
}
