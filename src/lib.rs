// Refs:
//   Build Your Own Text Editor: https://viewsourcecode.org/snaptoken/kilo/index.html
//   VT100 User Guide: https://vt100.net/docs/vt100-ug/chapter3.html

mod ansi_color;
mod editor;
mod error;
mod highlight;
mod input;
mod language;
mod prompt;
mod row;
mod screen;
mod search;
mod text_buffer;

#[cfg(test)]
mod ui_test;

pub use editor::Editor;
pub use error::{Error, Result};
pub use highlight::Highlight;
pub use input::{ctrl, InputSequences, Key, StdinRawMode};
pub use language::Language;
pub use row::Row;
pub use screen::{Screen, HELP, VERSION};
pub use text_buffer::{CursorDir, Lines, TextBuffer};
