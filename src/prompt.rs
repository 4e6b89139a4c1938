use crate::error::Result;
use crate::input::{ctrl, Key};
use crate::screen::Screen;
use crate::search::{FindDir, Search};
use crate::text_buffer::TextBuffer;
use log::debug;
use std::io::Write;

#[derive(PartialEq, Debug)]
pub enum PromptResult {
    Canceled,
    Input(String),
}

// Sized is necessary to move self
pub trait Action: Sized {
    fn new<W: Write>(prompt: &mut Prompt<'_, W>) -> Self;

    // Called after every key press, including the key which finishes the prompt
    fn on_key<W: Write>(&mut self, _prompt: &mut Prompt<'_, W>, _input: &str, _key: Key) {}

    fn on_end<W: Write>(
        self, // Note: Consumes self
        _prompt: &mut Prompt<'_, W>,
        result: PromptResult,
    ) -> Result<PromptResult> {
        Ok(result)
    }
}

pub struct NoAction;
impl Action for NoAction {
    fn new<W: Write>(_prompt: &mut Prompt<'_, W>) -> Self {
        Self
    }
}

pub struct TextSearch {
    saved_cursor: (usize, usize),
    saved_offset: (usize, usize),
    search: Search,
    matched: bool,
}

impl Action for TextSearch {
    fn new<W: Write>(prompt: &mut Prompt<'_, W>) -> Self {
        debug!("Text search started at {:?}", prompt.buf.cursor());
        Self {
            saved_cursor: prompt.buf.cursor(),
            saved_offset: (prompt.screen.rowoff, prompt.screen.coloff),
            search: Search::new(),
            matched: false,
        }
    }

    fn on_key<W: Write>(&mut self, prompt: &mut Prompt<'_, W>, input: &str, key: Key) {
        use Key::*;

        match key {
            Enter | Escape => {
                self.search.restore_highlight(prompt.buf);
                self.search.reset();
                return;
            }
            ArrowRight | ArrowDown => self.search.set_dir(FindDir::Forward),
            ArrowLeft | ArrowUp => self.search.set_dir(FindDir::Back),
            // Query may have been changed. Search again from top
            _ => self.search.reset(),
        }

        self.matched = self.search.find(prompt.buf, input.as_bytes()).is_some();
        if self.matched {
            // Make next scroll put the matched line at the top of screen
            prompt.screen.rowoff = prompt.buf.rows().len();
        }
    }

    fn on_end<W: Write>(
        mut self,
        prompt: &mut Prompt<'_, W>,
        result: PromptResult,
    ) -> Result<PromptResult> {
        self.search.restore_highlight(prompt.buf);
        debug!("Text search finished: {:?} (matched={})", result, self.matched);

        match &result {
            PromptResult::Canceled => {
                let (cx, cy) = self.saved_cursor;
                prompt.buf.set_cursor(cx, cy);
                let (rowoff, coloff) = self.saved_offset;
                prompt.screen.rowoff = rowoff;
                prompt.screen.coloff = coloff;
            }
            PromptResult::Input(_) if self.matched => prompt.screen.set_info_message("Found"),
            PromptResult::Input(_) => prompt.screen.set_info_message("Not found"),
        }

        Ok(result)
    }
}

struct PromptTemplate<'a> {
    prefix: &'a str,
    suffix: &'a str,
}

impl<'a> PromptTemplate<'a> {
    // '{}' in template is replaced with user input
    fn parse(template: &'a str) -> Self {
        let mut it = template.splitn(2, "{}");
        let prefix = it.next().unwrap_or("");
        let suffix = it.next().unwrap_or("");
        Self { prefix, suffix }
    }

    fn build(&self, input: &str) -> String {
        let cap = self.prefix.len() + self.suffix.len() + input.len();
        let mut buf = String::with_capacity(cap);
        buf.push_str(self.prefix);
        buf.push_str(input);
        buf.push_str(self.suffix);
        buf
    }

    fn cursor_col(&self, input: &str) -> usize {
        self.prefix.len() + input.len() + 1 // Just after the input
    }
}

enum Step {
    Continue,
    Cancel,
    Confirm,
}

pub struct Prompt<'a, W: Write> {
    screen: &'a mut Screen<W>,
    buf: &'a mut TextBuffer,
}

impl<'a, W: Write> Prompt<'a, W> {
    pub fn new<'s: 'a, 'tb: 'a>(screen: &'s mut Screen<W>, buf: &'tb mut TextBuffer) -> Self {
        Self { screen, buf }
    }

    fn render_screen(&mut self, input: &str, template: &PromptTemplate<'_>) -> Result<()> {
        self.screen.set_info_message(template.build(input));
        let col = template.cursor_col(input);
        self.screen.render_with_message_cursor(self.buf, col)
    }

    fn handle_key(&mut self, buf: &mut String, key: Key) -> Step {
        use Key::*;
        match key {
            Backspace | Delete => {
                buf.pop();
            }
            Byte(b) if b == ctrl(b'h') => {
                buf.pop();
            }
            Escape => return Step::Cancel,
            Enter if !buf.is_empty() => return Step::Confirm,
            Byte(b) if b.is_ascii() && !b.is_ascii_control() => buf.push(b as char),
            _ => {}
        }
        Step::Continue
    }

    pub fn run<A, S, I>(&mut self, prompt: S, mut input: I) -> Result<PromptResult>
    where
        A: Action,
        S: AsRef<str>,
        I: Iterator<Item = Result<Key>>,
    {
        let mut action = A::new(self);
        let mut buf = String::new();
        let template = PromptTemplate::parse(prompt.as_ref());
        let mut result = PromptResult::Canceled; // When input ends before finishing prompt

        self.render_screen("", &template)?;

        while let Some(key) = input.next() {
            if self.screen.maybe_resize(&mut input)? {
                self.render_screen(&buf, &template)?;
            }

            let key = key?;
            if key == Key::Unidentified {
                continue;
            }

            let step = self.handle_key(&mut buf, key);
            action.on_key(self, &buf, key);

            match step {
                Step::Continue => self.render_screen(&buf, &template)?,
                Step::Cancel => break,
                Step::Confirm => {
                    result = PromptResult::Input(buf);
                    break;
                }
            }
        }

        self.screen.unset_message();
        action.on_end(self, result)
    }
}
