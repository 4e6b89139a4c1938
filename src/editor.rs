use crate::error::Result;
use crate::input::{ctrl, Key};
use crate::prompt::{self, Prompt, PromptResult};
use crate::screen::Screen;
use crate::text_buffer::{CursorDir, Lines, TextBuffer};
use log::{debug, info, warn};
use std::io::Write;

// Number of extra Ctrl-Q presses required to quit with unsaved changes
pub const QUIT_TIMES: usize = 3;

const CTRL_F: u8 = ctrl(b'f');
const CTRL_H: u8 = ctrl(b'h');
const CTRL_L: u8 = ctrl(b'l');
const CTRL_O: u8 = ctrl(b'o');
const CTRL_Q: u8 = ctrl(b'q');
const CTRL_S: u8 = ctrl(b's');

pub struct Editor<I: Iterator<Item = Result<Key>>, W: Write> {
    input: I, // Key stream represented as Iterator
    quit_times: usize,
    screen: Screen<W>,
    buf: TextBuffer,
}

impl<I, W> Editor<I, W>
where
    I: Iterator<Item = Result<Key>>,
    W: Write,
{
    pub fn with_buffer(
        buf: TextBuffer,
        mut input: I,
        output: W,
        window_size: Option<(usize, usize)>,
    ) -> Result<Editor<I, W>> {
        let screen = Screen::new(window_size, &mut input, output)?;
        Ok(Editor {
            input,
            quit_times: QUIT_TIMES,
            screen,
            buf,
        })
    }

    pub fn new(input: I, output: W, window_size: Option<(usize, usize)>) -> Result<Editor<I, W>> {
        Self::with_buffer(TextBuffer::empty(), input, output, window_size)
    }

    pub fn with_lines<'a, L: Iterator<Item = &'a str>>(
        lines: L,
        input: I,
        output: W,
        window_size: Option<(usize, usize)>,
    ) -> Result<Editor<I, W>> {
        Self::with_buffer(TextBuffer::with_lines(lines), input, output, window_size)
    }

    fn prompt<S: AsRef<str>>(&mut self, prompt: S) -> Result<PromptResult> {
        Prompt::new(&mut self.screen, &mut self.buf)
            .run::<prompt::NoAction, _, _>(prompt, &mut self.input)
    }

    fn save(&mut self) -> Result<()> {
        if !self.buf.has_file() {
            match self.prompt("Save as: {} (ESC to cancel)")? {
                PromptResult::Input(input) => self.buf.set_file(input),
                PromptResult::Canceled => {
                    self.screen.set_info_message("Save aborted");
                    return Ok(());
                }
            }
        }

        match self.buf.save() {
            Ok(bytes) => self
                .screen
                .set_info_message(format!("{} bytes written to disk", bytes)),
            Err(err) => {
                warn!("Could not save {}: {}", self.buf.filename(), err);
                self.screen
                    .set_error_message(format!("Can't save! I/O error: {}", err));
            }
        }

        Ok(())
    }

    fn open_buffer(&mut self) -> Result<()> {
        if self.buf.modified() {
            self.screen
                .set_error_message("Unsaved changes! Save with Ctrl-S before opening another file");
            return Ok(());
        }

        if let PromptResult::Input(input) = self.prompt("Open: {} (ESC to cancel)")? {
            match TextBuffer::open(&input) {
                Ok(buf) => {
                    self.buf = buf;
                    self.screen.rowoff = 0;
                    self.screen.coloff = 0;
                    self.screen.set_info_message(format!(
                        "Opened {} ({} lines)",
                        self.buf.filename(),
                        self.buf.rows().len()
                    ));
                }
                Err(err) => {
                    warn!("Could not open {}: {}", input, err);
                    self.screen
                        .set_error_message(format!("Can't open {}: {}", input, err));
                }
            }
        }

        Ok(())
    }

    fn find(&mut self) -> Result<()> {
        let prompt = "Search: {} (Use ESC/Arrows/Enter)";
        Prompt::new(&mut self.screen, &mut self.buf)
            .run::<prompt::TextSearch, _, _>(prompt, &mut self.input)?;
        Ok(())
    }

    fn handle_quit(&mut self) -> bool {
        if self.buf.modified() && self.quit_times > 0 {
            self.screen.set_error_message(format!(
                "WARNING!!! File has unsaved changes. Press Ctrl-Q {} more times to quit.",
                self.quit_times
            ));
            self.quit_times -= 1;
            false
        } else {
            true
        }
    }

    fn handle_not_mapped(&mut self, key: Key) {
        self.screen
            .set_error_message(format!("Key '{}' not mapped", key));
    }

    // Returns true when the editor should quit
    fn process_keypress(&mut self, key: Key) -> Result<bool> {
        use Key::*;

        let rowoff = self.screen.rowoff;
        let rows = self.screen.rows();

        match key {
            Unidentified | Cursor(..) => return Ok(false),
            Byte(CTRL_Q) => {
                let quit = self.handle_quit();
                debug!("Quit requested (quit={})", quit);
                return Ok(quit);
            }
            Byte(CTRL_S) => self.save()?,
            Byte(CTRL_F) => self.find()?,
            Byte(CTRL_O) => self.open_buffer()?,
            Byte(CTRL_L) | Escape => { /* Only refresh screen */ }
            Byte(CTRL_H) | Backspace => self.buf.delete_char(),
            Delete => self.buf.delete_right_char(),
            Enter => self.buf.insert_line(),
            ArrowUp => self.buf.move_cursor_one(CursorDir::Up),
            ArrowLeft => self.buf.move_cursor_one(CursorDir::Left),
            ArrowDown => self.buf.move_cursor_one(CursorDir::Down),
            ArrowRight => self.buf.move_cursor_one(CursorDir::Right),
            PageUp => self.buf.move_cursor_page(CursorDir::Up, rowoff, rows),
            PageDown => self.buf.move_cursor_page(CursorDir::Down, rowoff, rows),
            Home => self.buf.move_cursor_to_line_head(),
            End => self.buf.move_cursor_to_line_end(),
            Byte(b'\t') => self.buf.insert_char(b'\t'),
            Byte(b) if !b.is_ascii_control() => self.buf.insert_char(b),
            Byte(_) => self.handle_not_mapped(key),
        }

        self.quit_times = QUIT_TIMES;
        Ok(false)
    }

    pub fn edit(&mut self) -> Result<()> {
        info!("Start editing {}", self.buf.filename());
        self.screen.render(&self.buf)?; // First paint

        while let Some(key) = self.input.next() {
            if self.screen.maybe_resize(&mut self.input)? {
                debug!("Window resized to {}x{}", self.screen.cols(), self.screen.rows());
            }

            if self.process_keypress(key?)? {
                break;
            }

            self.screen.render(&self.buf)?;
        }

        self.screen.clear()
    }

    pub fn lines(&self) -> Lines<'_> {
        self.buf.lines()
    }

    pub fn buf(&self) -> &TextBuffer {
        &self.buf
    }

    pub fn screen(&self) -> &'_ Screen<W> {
        &self.screen
    }
}
