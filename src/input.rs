use crate::error::Result;
use std::fmt;
use std::io::{self, Read};
use std::os::unix::io::AsRawFd;
use std::str;

pub struct StdinRawMode {
    stdin: io::Stdin,
    orig: termios::Termios,
}

impl StdinRawMode {
    pub fn new() -> Result<StdinRawMode> {
        use termios::*;

        let stdin = io::stdin();
        let fd = stdin.as_raw_fd();
        let mut termios = Termios::from_fd(fd)?;
        let orig = termios;

        // Set terminal raw mode. Disable echo back, canonical mode, signals (SIGINT, SIGTSTP) and Ctrl+V.
        termios.c_lflag &= !(ECHO | ICANON | ISIG | IEXTEN);
        // Disable control flow mode (Ctrl+Q/Ctrl+S) and CR-to-NL translation
        termios.c_iflag &= !(IXON | ICRNL | BRKINT | INPCK | ISTRIP);
        // Disable output processing such as \n to \r\n translation
        termios.c_oflag &= !OPOST;
        // Ensure character size is 8bits
        termios.c_cflag |= CS8;
        // Do not wait for next byte with blocking since reading 0 byte is permitted
        termios.c_cc[VMIN] = 0;
        // Set read timeout to 1/10 second it enables 100ms timeout on read()
        termios.c_cc[VTIME] = 1;
        // Apply terminal configurations
        tcsetattr(fd, TCSAFLUSH, &termios)?;

        Ok(StdinRawMode { stdin, orig })
    }

    pub fn input_keys(self) -> InputSequences<Self> {
        InputSequences::new(self)
    }
}

impl Read for StdinRawMode {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stdin.read(buf)
    }
}

impl Drop for StdinRawMode {
    fn drop(&mut self) {
        // Restore original terminal mode. Nothing can be done on failure here
        let _ = termios::tcsetattr(self.stdin.as_raw_fd(), termios::TCSAFLUSH, &self.orig);
    }
}

pub const fn ctrl(b: u8) -> u8 {
    b & 0x1f
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Key {
    Unidentified,
    Byte(u8),
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    Home,
    End,
    Delete,
    Backspace,
    Enter,
    Escape,
    Cursor(usize, usize), // Pseudo key for cursor position report (row, col)
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Key::*;
        match self {
            Unidentified => write!(f, "UNKNOWN"),
            Byte(b' ') => write!(f, "SPACE"),
            Byte(b) if *b < 0x20 => write!(f, "C-{}", (*b | 0x60) as char),
            Byte(b) if b.is_ascii() => write!(f, "{}", *b as char),
            Byte(b) => write!(f, "\\x{:x}", b),
            ArrowLeft => write!(f, "LEFT"),
            ArrowRight => write!(f, "RIGHT"),
            ArrowUp => write!(f, "UP"),
            ArrowDown => write!(f, "DOWN"),
            PageUp => write!(f, "PAGEUP"),
            PageDown => write!(f, "PAGEDOWN"),
            Home => write!(f, "HOME"),
            End => write!(f, "END"),
            Delete => write!(f, "DELETE"),
            Backspace => write!(f, "BACKSPACE"),
            Enter => write!(f, "ENTER"),
            Escape => write!(f, "ESC"),
            Cursor(r, c) => write!(f, "CURSOR({},{})", r, c),
        }
    }
}

// Decodes raw bytes from terminal into keys
pub struct InputSequences<R: Read> {
    reader: R,
}

impl<R: Read> InputSequences<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut one_byte: [u8; 1] = [0];
        loop {
            match self.reader.read(&mut one_byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(one_byte[0])),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn decode_escape_sequence(&mut self) -> Result<Key> {
        use Key::*;

        // If next input does not arrive within next tick, it means that it is not an escape
        // sequence but a single ESC key.
        match self.read_byte()? {
            Some(b'[') => { /* fall through */ }
            Some(b'O') => {
                // e.g. \x1bOH sent by some terminals for HOME
                return Ok(match self.read_byte()? {
                    Some(b'H') => Home,
                    Some(b'F') => End,
                    _ => Escape,
                });
            }
            _ => return Ok(Escape),
        };

        // Now confirmed \x1b[ which is a header of escape sequence. Eat it until the end
        // of sequence
        let mut buf = vec![];
        let cmd = loop {
            if let Some(b) = self.read_byte()? {
                match b {
                    // Control command chars from http://ascii-table.com/ansi-escape-sequences-vt-100.php
                    b'A' | b'B' | b'C' | b'D' | b'F' | b'H' | b'K' | b'J' | b'R' | b'c' | b'f'
                    | b'g' | b'h' | b'l' | b'm' | b'n' | b'q' | b't' | b'y' | b'~' => break b,
                    _ => buf.push(b),
                }
            } else {
                // Unknown escape sequence ignored
                return Ok(Unidentified);
            }
        };

        fn parse_bytes_as_usize(b: &[u8]) -> Option<usize> {
            str::from_utf8(b).ok().and_then(|s| s.parse().ok())
        }

        let mut args = buf.split(|b| *b == b';');
        let key = match cmd {
            b'R' => {
                // https://vt100.net/docs/vt100-ug/chapter3.html#CPR e.g. \x1b[24;80R
                let mut i = args.filter_map(parse_bytes_as_usize);
                match (i.next(), i.next()) {
                    (Some(r), Some(c)) => Cursor(r, c),
                    _ => Unidentified,
                }
            }
            b'A' => ArrowUp,
            b'B' => ArrowDown,
            b'C' => ArrowRight,
            b'D' => ArrowLeft,
            b'H' => Home,
            b'F' => End,
            // e.g. \x1b[5~
            b'~' => match args.next() {
                Some(b"5") => PageUp,
                Some(b"6") => PageDown,
                Some(b"1") | Some(b"7") => Home,
                Some(b"4") | Some(b"8") => End,
                Some(b"3") => Delete,
                _ => Unidentified,
            },
            _ => Unidentified,
        };
        Ok(key)
    }

    fn decode(&mut self, b: u8) -> Result<Key> {
        match b {
            0x1b => self.decode_escape_sequence(),
            b'\r' => Ok(Key::Enter),
            127 => Ok(Key::Backspace),
            _ => Ok(Key::Byte(b)),
        }
    }

    fn read_key(&mut self) -> Result<Key> {
        if let Some(b) = self.read_byte()? {
            self.decode(b)
        } else {
            Ok(Key::Unidentified)
        }
    }
}

impl<R: Read> Iterator for InputSequences<R> {
    type Item = Result<Key>;

    // Read next byte from stdin with timeout 100ms. If nothing was read, it returns Key::Unidentified.
    // This method never returns None so for loop never ends
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.read_key())
    }
}
