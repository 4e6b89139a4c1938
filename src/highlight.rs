use crate::ansi_color::AnsiColor;
use crate::language::Language;

// One tag per byte of render text
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Highlight {
    Normal,
    Comment,
    BlockComment,
    Keyword,
    Type,
    String,
    Number,
    Match,
}

impl Default for Highlight {
    fn default() -> Self {
        Highlight::Normal
    }
}

impl Highlight {
    pub fn color(self) -> AnsiColor {
        use AnsiColor::*;
        use Highlight::*;
        match self {
            Normal => Reset,
            Comment | BlockComment => Gray,
            Keyword => Yellow,
            Type => Green,
            String => Purple,
            Number => Red,
            Match => YellowBG,
        }
    }
}

pub fn is_sep(b: u8) -> bool {
    // 0x0b is vertical tab which is_ascii_whitespace() does not include
    b.is_ascii_whitespace() || b == 0x0b || b == b'\0' || b",.()+-/*=~%<>[];".contains(&b)
}

enum ParseStep {
    Ahead(usize),
    Break,
}

struct LineHighlighter<'a> {
    syntax: &'static Language,
    input: &'a [u8],
    out: &'a mut [Highlight],
    in_comment: bool,
    in_string: Option<u8>, // Quote character which opened the string
    prev_sep: bool,
}

impl<'a> LineHighlighter<'a> {
    fn eat(&mut self, at: usize, len: usize, hl: Highlight) -> ParseStep {
        debug_assert!(len > 0);
        for out in self.out[at..at + len].iter_mut() {
            *out = hl;
        }
        ParseStep::Ahead(len)
    }

    fn highlight_line_comment(&mut self, at: usize) -> Option<ParseStep> {
        let leader = self.syntax.line_comment?;
        if self.in_string.is_some() || self.in_comment {
            return None;
        }
        if self.input[at..].starts_with(leader.as_bytes()) {
            // Highlight as comment until end of line
            for hl in self.out[at..].iter_mut() {
                *hl = Highlight::Comment;
            }
            Some(ParseStep::Break)
        } else {
            None
        }
    }

    fn highlight_block_comment(&mut self, at: usize) -> Option<ParseStep> {
        let (start, end) = self.syntax.block_comment?;
        if self.in_string.is_some() {
            return None;
        }

        let input = &self.input[at..];
        if self.in_comment {
            if input.starts_with(end.as_bytes()) {
                self.in_comment = false;
                self.prev_sep = true;
                Some(self.eat(at, end.len(), Highlight::BlockComment))
            } else {
                Some(self.eat(at, 1, Highlight::BlockComment))
            }
        } else if input.starts_with(start.as_bytes()) {
            // Consume whole start token here. Otherwise '/*/' would be wrongly closed
            self.in_comment = true;
            Some(self.eat(at, start.len(), Highlight::BlockComment))
        } else {
            None
        }
    }

    fn highlight_string(&mut self, at: usize) -> Option<ParseStep> {
        if !self.syntax.strings {
            return None;
        }

        let c = self.input[at];
        if let Some(quote) = self.in_string {
            if c == b'\\' && at + 1 < self.input.len() {
                return Some(self.eat(at, 2, Highlight::String));
            }
            if c == quote {
                self.in_string = None;
            }
            self.prev_sep = true;
            Some(self.eat(at, 1, Highlight::String))
        } else if c == b'"' || c == b'\'' {
            self.in_string = Some(c);
            Some(self.eat(at, 1, Highlight::String))
        } else {
            None
        }
    }

    fn highlight_number(&mut self, at: usize) -> Option<ParseStep> {
        if !self.syntax.numbers {
            return None;
        }

        let c = self.input[at];
        let prev_is_number = at > 0 && self.out[at - 1] == Highlight::Number;
        if c.is_ascii_digit() && (self.prev_sep || prev_is_number) || c == b'.' && prev_is_number {
            self.prev_sep = false;
            Some(self.eat(at, 1, Highlight::Number))
        } else {
            None
        }
    }

    fn highlight_keyword(&mut self, at: usize) -> Option<ParseStep> {
        if !self.prev_sep {
            return None;
        }

        let input = &self.input[at..];
        let (len, hl) = self
            .syntax
            .keywords
            .iter()
            .filter_map(|keyword| {
                let (word, hl) = match keyword.strip_suffix('|') {
                    Some(word) => (word.as_bytes(), Highlight::Type),
                    None => (keyword.as_bytes(), Highlight::Keyword),
                };
                // End of line counts as a separator
                let at_boundary = input.get(word.len()).map_or(true, |b| is_sep(*b));
                if !word.is_empty() && input.starts_with(word) && at_boundary {
                    Some((word.len(), hl))
                } else {
                    None
                }
            })
            .max_by_key(|(len, _)| *len)?;

        self.prev_sep = false;
        Some(self.eat(at, len, hl))
    }

    fn highlight_one(&mut self, at: usize) -> ParseStep {
        macro_rules! try_highlight {
            ($call:expr) => {
                if let Some(step) = $call {
                    return step;
                }
            };
        }

        try_highlight!(self.highlight_line_comment(at));
        try_highlight!(self.highlight_block_comment(at));
        try_highlight!(self.highlight_string(at));
        try_highlight!(self.highlight_number(at));
        try_highlight!(self.highlight_keyword(at));

        self.prev_sep = is_sep(self.input[at]);
        self.eat(at, 1, Highlight::Normal)
    }

    fn run(mut self) -> bool {
        let mut at = 0;
        while at < self.input.len() {
            match self.highlight_one(at) {
                ParseStep::Ahead(len) => at += len,
                ParseStep::Break => break,
            }
        }
        self.in_comment
    }
}

// Highlights one row. It carries the open block comment state from the previous row.
#[derive(Clone, Copy, Debug)]
pub struct Highlighter {
    lang: Option<&'static Language>,
    in_comment: bool,
}

impl Highlighter {
    pub fn new(lang: Option<&'static Language>, in_comment: bool) -> Self {
        Self { lang, in_comment }
    }

    // Fills `out` with exactly one tag per byte of `render` and returns whether a block comment
    // is left open at the end of the row
    pub fn highlight(self, render: &[u8], out: &mut Vec<Highlight>) -> bool {
        out.clear();
        out.resize(render.len(), Highlight::Normal);

        let syntax = if let Some(lang) = self.lang {
            lang
        } else {
            return false;
        };

        LineHighlighter {
            syntax,
            input: render,
            out: out.as_mut_slice(),
            in_comment: self.in_comment,
            in_string: None,
            prev_sep: true,
        }
        .run()
    }
}
