use crate::ansi_color::{AnsiColor, ColorSupport};
use crate::error::{Error, Result};
use crate::input::Key;
use crate::row::Row;
use crate::text_buffer::TextBuffer;
use signal_hook::consts::SIGWINCH;
use signal_hook::SigId;
use std::cmp;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const HELP: &str = "HELP: Ctrl-S = save | Ctrl-Q = quit | Ctrl-F = find | Ctrl-O = open";
const MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);
// Ticks (100ms each) to wait for the cursor position report
const CURSOR_REPORT_TICKS: usize = 10;

#[derive(PartialEq, Debug)]
enum StatusMessageKind {
    Info,
    Error,
}

struct StatusMessage {
    text: String,
    timestamp: Instant,
    kind: StatusMessageKind,
}

impl StatusMessage {
    fn new<S: Into<String>>(message: S, kind: StatusMessageKind) -> StatusMessage {
        StatusMessage {
            text: message.into(),
            timestamp: Instant::now(),
            kind,
        }
    }
}

// SIGWINCH sets the flag. It is polled between key inputs and unregistered on drop
struct ResizeWatcher(Arc<AtomicBool>, SigId);

impl ResizeWatcher {
    fn new() -> Result<Self> {
        let resized = Arc::new(AtomicBool::new(false));
        let id = signal_hook::flag::register(SIGWINCH, Arc::clone(&resized))?;
        Ok(ResizeWatcher(resized, id))
    }

    // Consecutive signals before polling are observed as one resize
    fn take_resized(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

impl Drop for ResizeWatcher {
    fn drop(&mut self) {
        signal_hook::low_level::unregister(self.1);
    }
}

fn query_window_size_by_cursor<I, W>(input: I, mut output: W) -> Result<(usize, usize)>
where
    I: Iterator<Item = Result<Key>>,
    W: Write,
{
    // By moving cursor at the bottom-right corner by 'B' and 'C' commands, get the size of
    // current screen. \x1b[9999;9999H is not available since it does not guarantee cursor
    // stops on the corner. Finaly command 'n' queries cursor position.
    output.write_all(b"\x1b[999C\x1b[999B\x1b[6n")?;
    output.flush()?;

    // Wait for response from terminal discarding other sequences
    for key in input.take(CURSOR_REPORT_TICKS) {
        if let Key::Cursor(r, c) = key? {
            return Ok((c, r));
        }
    }

    Err(Error::UnknownWindowSize)
}

fn get_window_size<I, W>(input: I, output: W) -> Result<(usize, usize)>
where
    I: Iterator<Item = Result<Key>>,
    W: Write,
{
    if let Some(size) = term_size::dimensions_stdout() {
        return Ok(size);
    }
    log::debug!("Terminal size is not available via ioctl. Falling back to cursor report");
    query_window_size_by_cursor(input, output)
}

pub struct Screen<W: Write> {
    output: W,
    // X coordinate in `render` text of rows
    rx: usize,
    // Screen size. Text area height excludes status bar and message bar
    num_cols: usize,
    num_rows: usize,
    message: Option<StatusMessage>,
    // Watches window resize only when the size was queried from terminal
    resize: Option<ResizeWatcher>,
    color_support: ColorSupport,
    // Scroll position (row/col offset)
    pub rowoff: usize,
    pub coloff: usize,
}

impl<W: Write> Screen<W> {
    pub fn new<I>(window_size: Option<(usize, usize)>, input: I, mut output: W) -> Result<Self>
    where
        I: Iterator<Item = Result<Key>>,
    {
        let (resize, (w, h)) = if let Some(s) = window_size {
            (None, s)
        } else {
            let watcher = ResizeWatcher::new()?;
            (Some(watcher), get_window_size(input, &mut output)?)
        };

        let mut screen = Self {
            output,
            rx: 0,
            num_cols: 0,
            num_rows: 0,
            message: Some(StatusMessage::new(HELP, StatusMessageKind::Info)),
            resize,
            color_support: ColorSupport::from_env(),
            rowoff: 0,
            coloff: 0,
        };
        screen.set_size(w, h)?;
        log::info!(
            "Screen {}x{} with color support {:?}",
            w,
            h,
            screen.color_support
        );
        Ok(screen)
    }

    fn set_size(&mut self, w: usize, h: usize) -> Result<()> {
        if w < 1 || h < 3 {
            return Err(Error::TooSmallWindow(w, h));
        }
        self.num_cols = w;
        // Screen height is 2 lines less than window height due to status bar and message bar
        self.num_rows = h - 2;
        Ok(())
    }

    pub fn resize(&mut self, w: usize, h: usize) -> Result<()> {
        self.set_size(w, h)?;
        log::debug!("Screen resized to {}x{}", w, h);
        Ok(())
    }

    // Returns true when window was resized after previous call
    pub fn maybe_resize<I>(&mut self, input: I) -> Result<bool>
    where
        I: Iterator<Item = Result<Key>>,
    {
        if !self.resize.as_ref().map_or(false, ResizeWatcher::take_resized) {
            return Ok(false);
        }
        let (w, h) = get_window_size(input, &mut self.output)?;
        self.resize(w, h)?;
        Ok(true)
    }

    fn draw_status_bar<B: Write>(&self, mut buf: B, text: &TextBuffer) -> io::Result<()> {
        AnsiColor::Invert.write_to(&mut buf, self.color_support)?;

        let name = text.filename();
        let name = &name.as_bytes()[..cmp::min(name.len(), 20)];
        let mut left = Vec::with_capacity(self.num_cols);
        left.extend_from_slice(name);
        write!(left, " - {} lines", text.rows().len())?;
        if text.modified() {
            left.extend_from_slice(b" (modified)");
        }
        let left = &left[..cmp::min(left.len(), self.num_cols)];
        buf.write_all(left)?;

        let right = format!("{} | {}/{}", text.lang_name(), text.cy() + 1, text.rows().len());
        let rest_len = self.num_cols - left.len();
        if right.len() <= rest_len {
            for _ in 0..rest_len - right.len() {
                buf.write_all(b" ")?; // Add spaces at center of status bar
            }
            buf.write_all(right.as_bytes())?;
        } else {
            for _ in 0..rest_len {
                buf.write_all(b" ")?;
            }
        }

        AnsiColor::Reset.write_to(&mut buf, self.color_support)?;
        buf.write_all(b"\r\n")
    }

    fn draw_message_bar<B: Write>(&self, mut buf: B, now: Instant) -> io::Result<()> {
        if let Some(message) = &self.message {
            if now.saturating_duration_since(message.timestamp) < MESSAGE_TIMEOUT {
                let text = message.text.as_bytes();
                let text = &text[..cmp::min(text.len(), self.num_cols)];
                if message.kind == StatusMessageKind::Error {
                    AnsiColor::RedBG.write_to(&mut buf, self.color_support)?;
                    buf.write_all(text)?;
                    AnsiColor::Reset.write_to(&mut buf, self.color_support)?;
                } else {
                    buf.write_all(text)?;
                }
            }
        }
        buf.write_all(b"\x1b[K")
    }

    fn draw_welcome_message<B: Write>(&self, mut buf: B) -> io::Result<()> {
        let msg = format!("Kilt editor -- version {}", VERSION);
        let len = cmp::min(msg.len(), self.num_cols);
        let padding = (self.num_cols - len) / 2;
        if padding > 0 {
            buf.write_all(b"~")?;
            for _ in 0..padding - 1 {
                buf.write_all(b" ")?;
            }
        }
        buf.write_all(&msg.as_bytes()[..len])
    }

    fn draw_row<B: Write>(&self, mut buf: B, row: &Row) -> io::Result<()> {
        let render = row.render_text();
        let start = cmp::min(self.coloff, render.len());
        let end = cmp::min(self.coloff + self.num_cols, render.len());

        // Each row starts with default color which was set at previous line end
        let mut current = AnsiColor::Reset;
        for (&b, hl) in render[start..end].iter().zip(&row.highlights()[start..end]) {
            if b.is_ascii_control() {
                // Show control character as '@', 'A', 'B', ... in inverted color
                let sym = if b <= 26 { b'@' + b } else { b'?' };
                AnsiColor::Invert.write_to(&mut buf, self.color_support)?;
                buf.write_all(&[sym])?;
                buf.write_all(b"\x1b[m")?;
                current.write_to(&mut buf, self.color_support)?;
                continue;
            }

            let color = hl.color();
            if color != current {
                // Background color remains unless it is reset explicitly
                if current.has_background() && color != AnsiColor::Reset {
                    AnsiColor::Reset.write_to(&mut buf, self.color_support)?;
                }
                color.write_to(&mut buf, self.color_support)?;
                current = color;
            }
            buf.write_all(&[b])?;
        }

        if current != AnsiColor::Reset {
            AnsiColor::Reset.write_to(&mut buf, self.color_support)?;
        }
        Ok(())
    }

    fn draw_rows<B: Write>(&self, mut buf: B, rows: &[Row]) -> io::Result<()> {
        AnsiColor::Reset.write_to(&mut buf, self.color_support)?;

        for y in 0..self.num_rows {
            let file_row = y + self.rowoff;
            if let Some(row) = rows.get(file_row) {
                self.draw_row(&mut buf, row)?;
            } else if rows.is_empty() && y == self.num_rows / 3 {
                self.draw_welcome_message(&mut buf)?;
            } else {
                buf.write_all(b"~")?;
            }

            // Erases the part of the line to the right of the cursor. http://vt100.net/docs/vt100-ug/chapter3.html#EL
            buf.write_all(b"\x1b[K\r\n")?;
        }

        Ok(())
    }

    // Composes one whole frame. Nothing is written to the terminal here. `cursor` is a 1-based
    // (row, col) position which overrides the text cursor
    fn frame(
        &self,
        text: &TextBuffer,
        cursor: Option<(usize, usize)>,
        now: Instant,
    ) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity((self.num_rows + 2) * self.num_cols);

        // \x1b[: Escape sequence header
        // Hide cursor while updating screen. 'l' is command to set mode http://vt100.net/docs/vt100-ug/chapter3.html#SM
        buf.write_all(b"\x1b[?25l")?;
        // H: Command to move cursor. Here \x1b[H is the same as \x1b[1;1H
        buf.write_all(b"\x1b[H")?;

        self.draw_rows(&mut buf, text.rows())?;
        self.draw_status_bar(&mut buf, text)?;
        self.draw_message_bar(&mut buf, now)?;

        // Move cursor
        let (cursor_row, cursor_col) = cursor.unwrap_or_else(|| {
            (
                text.cy().saturating_sub(self.rowoff) + 1,
                self.rx.saturating_sub(self.coloff) + 1,
            )
        });
        write!(buf, "\x1b[{};{}H", cursor_row, cursor_col)?;

        // Reveal cursor again. 'h' is command to reset mode https://vt100.net/docs/vt100-ug/chapter3.html#RM
        buf.write_all(b"\x1b[?25h")?;

        Ok(buf)
    }

    fn scroll(&mut self, text: &TextBuffer) {
        let (cx, cy) = text.cursor();

        // Calculate X coordinate to render considering tab stop
        self.rx = text.rows().get(cy).map_or(0, |row| row.rx_from_cx(cx));

        // Adjust scroll position when cursor is outside screen
        if cy < self.rowoff {
            // Scroll up when cursor is above the top of window
            self.rowoff = cy;
        }
        if cy >= self.rowoff + self.num_rows {
            // Scroll down when cursor is below the bottom of screen
            self.rowoff = cy - self.num_rows + 1;
        }
        if self.rx < self.coloff {
            self.coloff = self.rx;
        }
        if self.rx >= self.coloff + self.num_cols {
            self.coloff = self.rx - self.num_cols + 1;
        }
    }

    fn write_frame(&mut self, text: &TextBuffer, cursor: Option<(usize, usize)>) -> Result<()> {
        self.scroll(text);
        let frame = self.frame(text, cursor, Instant::now())?;
        // Whole frame is written at once to avoid flickering
        self.output.write_all(&frame)?;
        self.output.flush()?;
        Ok(())
    }

    pub fn render(&mut self, text: &TextBuffer) -> Result<()> {
        self.write_frame(text, None)
    }

    // Same as render() but the cursor is put at the given column of message bar
    pub fn render_with_message_cursor(&mut self, text: &TextBuffer, col: usize) -> Result<()> {
        let row = self.num_rows + 2;
        self.write_frame(text, Some((row, col)))
    }

    pub fn clear(&mut self) -> Result<()> {
        // 2: Argument of 'J' command to reset entire screen
        // J: Command to erase screen http://vt100.net/docs/vt100-ug/chapter3.html#ED
        self.output.write_all(b"\x1b[2J")?;
        // Set cursor position to left-top corner
        self.output.write_all(b"\x1b[H")?;
        self.output.flush()?;
        Ok(())
    }

    pub fn set_info_message<S: Into<String>>(&mut self, message: S) {
        self.message = Some(StatusMessage::new(message, StatusMessageKind::Info));
    }

    pub fn set_error_message<S: Into<String>>(&mut self, message: S) {
        self.message = Some(StatusMessage::new(message, StatusMessageKind::Error));
    }

    pub fn unset_message(&mut self) {
        self.message = None;
    }

    pub fn message_text(&self) -> &str {
        self.message.as_ref().map_or("", |m| m.text.as_str())
    }

    pub fn rows(&self) -> usize {
        self.num_rows
    }

    pub fn cols(&self) -> usize {
        self.num_cols
    }
}
