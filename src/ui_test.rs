use crate::editor::Editor;
use crate::error::Result;
use crate::highlight::Highlight;
use crate::input::{self, Key};
use crate::language::{C, RUST};
use crate::text_buffer::TextBuffer;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};

use Key::*;

struct DummyInputs(Vec<Key>);

impl Iterator for DummyInputs {
    type Item = Result<Key>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.is_empty() {
            None
        } else {
            Some(Ok(self.0.remove(0)))
        }
    }
}

struct Discard;

impl Write for Discard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn key(c: char) -> Key {
    Byte(c as u8)
}

fn ctrl(c: char) -> Key {
    Byte(input::ctrl(c as u8))
}

fn keys(s: &str) -> Vec<Key> {
    s.bytes().map(Byte).collect()
}

fn lines<I: Iterator<Item = Result<Key>>, W: Write>(editor: &Editor<I, W>) -> Vec<String> {
    editor
        .lines()
        .map(|l| String::from_utf8_lossy(l).into_owned())
        .collect()
}

fn no_match_highlight<I: Iterator<Item = Result<Key>>, W: Write>(editor: &Editor<I, W>) -> bool {
    editor
        .buf()
        .rows()
        .iter()
        .all(|r| !r.highlights().contains(&Highlight::Match))
}

#[test]
fn test_empty_buffer() {
    let input = DummyInputs(vec![ctrl('q')]);
    let mut editor = Editor::new(input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    assert!(editor.screen().rows() > 0);
    assert!(editor.screen().cols() > 0);
    assert!(lines(&editor).is_empty());

    let msg = editor.screen().message_text();
    assert_eq!(msg, crate::screen::HELP);
}

#[test]
fn test_write_to_empty_buffer() {
    let input = DummyInputs(vec![key('a'), key('b'), key('c'), ctrl('q'), ctrl('q')]);
    let mut editor = Editor::new(input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    assert_eq!(lines(&editor), vec!["abc"]);
    assert!(editor.buf().modified());

    let msg = editor.screen().message_text();
    assert_eq!(
        msg,
        "WARNING!!! File has unsaved changes. Press Ctrl-Q 2 more times to quit."
    );
}

#[test]
fn test_quit_needs_confirmations() {
    let input = DummyInputs(vec![
        key('a'),
        ctrl('q'),
        ctrl('q'),
        ctrl('q'),
        ctrl('q'), // Quit here
        key('b'),
    ]);
    let mut editor = Editor::new(input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();
    assert_eq!(lines(&editor), vec!["a"]);
}

#[test]
fn test_quit_confirmation_reset_by_other_key() {
    let input = DummyInputs(vec![
        key('a'),
        ctrl('q'),
        ctrl('q'),
        ctrl('q'),
        key('b'), // Resets the count
        ctrl('q'),
        key('c'),
    ]);
    let mut editor = Editor::new(input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();
    assert_eq!(lines(&editor), vec!["abc"]);
}

#[test]
fn test_quit_unmodified_immediately() {
    let input = DummyInputs(vec![ctrl('q'), key('a')]);
    let mut editor =
        Editor::with_lines(vec!["x"].into_iter(), input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();
    assert_eq!(lines(&editor), vec!["x"]);
}

#[test]
fn test_move_cursor_down() {
    let input = DummyInputs(vec![
        key('a'),
        ArrowDown,
        key('b'),
        ArrowDown,
        key('c'),
        ctrl('q'),
        ctrl('q'),
    ]);
    let mut editor = Editor::new(input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    assert_eq!(lines(&editor), vec!["a", "b", "c"]);
}

#[test]
fn test_open_file() {
    let input = DummyInputs(vec![ctrl('q')]);

    let this_file = file!();
    let buf = TextBuffer::open(this_file).unwrap();
    let mut editor = Editor::with_buffer(buf, input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    let f = BufReader::new(File::open(this_file).unwrap());
    let actual = lines(&editor);
    let mut num_lines = 0;
    for (i, (expected, actual)) in f.lines().zip(actual.iter()).enumerate() {
        assert_eq!(&expected.unwrap(), actual, "Line: {}", i + 1);
        num_lines += 1;
    }
    assert_eq!(num_lines, actual.len());

    assert_eq!(editor.buf().lang(), Some(&RUST));
    assert!(!editor.buf().modified());
}

#[test]
fn test_key_not_mapped() {
    let input = DummyInputs(vec![ctrl('x')]);
    let mut editor = Editor::new(input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();
    assert_eq!(editor.screen().message_text(), "Key 'C-x' not mapped");
    assert!(lines(&editor).is_empty());
}

#[test]
fn test_output_frames() {
    let input = DummyInputs(vec![key('a'), ctrl('q'), ctrl('q'), ctrl('q'), ctrl('q')]);
    let mut out = Vec::new();
    let mut editor = Editor::new(input, &mut out, Some((80, 24))).unwrap();
    editor.edit().unwrap();
    drop(editor);

    let out = String::from_utf8_lossy(&out);
    // First paint, 4 frames after keys except the last quit
    assert_eq!(out.matches("\x1b[?25l\x1b[H").count(), 5, "{:?}", out);
    // Screen is cleared on quit
    assert!(out.ends_with("\x1b[2J\x1b[H"), "{:?}", out);
}

#[test]
fn test_search_wraparound() {
    let mut input = vec![ctrl('f')];
    input.extend(keys("foo"));
    input.push(ArrowRight);
    input.push(Enter);
    let input = DummyInputs(input);
    let mut editor = Editor::with_lines(
        vec!["foo", "bar", "xfoo"].into_iter(),
        input,
        Discard,
        Some((80, 24)),
    )
    .unwrap();
    editor.edit().unwrap();

    assert_eq!(editor.buf().cursor(), (1, 2));
    assert_eq!(editor.screen().message_text(), "Found");
    assert!(no_match_highlight(&editor));
}

#[test]
fn test_search_next_wraps_to_top() {
    let mut input = vec![ctrl('f')];
    input.extend(keys("foo"));
    input.extend(vec![ArrowDown, ArrowDown, Enter]);
    let input = DummyInputs(input);
    let mut editor = Editor::with_lines(
        vec!["foo", "bar", "foo"].into_iter(),
        input,
        Discard,
        Some((80, 24)),
    )
    .unwrap();
    editor.edit().unwrap();

    assert_eq!(editor.buf().cursor(), (0, 0));
}

#[test]
fn test_search_backward() {
    let mut input = vec![ctrl('f')];
    input.extend(keys("foo"));
    input.extend(vec![ArrowUp, Enter]);
    let input = DummyInputs(input);
    let mut editor = Editor::with_lines(
        vec!["foo", "bar", "a foo"].into_iter(),
        input,
        Discard,
        Some((80, 24)),
    )
    .unwrap();
    editor.edit().unwrap();

    assert_eq!(editor.buf().cursor(), (2, 2));
}

#[test]
fn test_search_cancel_restores_cursor() {
    let mut input = vec![ArrowDown, ArrowRight, ctrl('f')];
    input.extend(keys("baz"));
    input.push(Escape);
    let input = DummyInputs(input);
    let mut editor = Editor::with_lines(
        vec!["foo", "bar", "baz"].into_iter(),
        input,
        Discard,
        Some((80, 24)),
    )
    .unwrap();
    editor.edit().unwrap();

    assert_eq!(editor.buf().cursor(), (1, 1));
    assert_eq!(editor.screen().rowoff, 0);
    assert!(no_match_highlight(&editor));
}

#[test]
fn test_search_not_found() {
    let mut input = vec![ArrowDown, ctrl('f')];
    input.extend(keys("qux"));
    input.push(Enter);
    let input = DummyInputs(input);
    let mut editor = Editor::with_lines(
        vec!["foo", "bar"].into_iter(),
        input,
        Discard,
        Some((80, 24)),
    )
    .unwrap();
    editor.edit().unwrap();

    assert_eq!(editor.buf().cursor(), (0, 1));
    assert_eq!(editor.screen().message_text(), "Not found");
}

#[test]
fn test_search_query_edit_searches_from_top() {
    let mut input = vec![ctrl('f')];
    input.extend(keys("fo"));
    input.push(ArrowDown); // Row 2
    input.push(key('x')); // Query 'fox' is searched from top
    input.push(Backspace); // Query 'fo' is searched from top again
    input.push(Enter);
    let input = DummyInputs(input);
    let mut editor = Editor::with_lines(
        vec!["fo", "xx", "fox"].into_iter(),
        input,
        Discard,
        Some((80, 24)),
    )
    .unwrap();
    editor.edit().unwrap();

    assert_eq!(editor.buf().cursor(), (0, 0));
    assert!(no_match_highlight(&editor));
}

#[test]
fn test_search_scrolls_to_match() {
    let mut lines_: Vec<String> = (0..100).map(|i| format!("line {}", i)).collect();
    lines_[80] = "needle".to_string();
    let mut input = vec![ctrl('f')];
    input.extend(keys("needle"));
    input.push(Enter);
    let input = DummyInputs(input);
    let mut editor = Editor::with_lines(
        lines_.iter().map(String::as_str),
        input,
        Discard,
        Some((80, 24)),
    )
    .unwrap();
    editor.edit().unwrap();

    assert_eq!(editor.buf().cursor(), (0, 80));
    // Matched line is put at the top of screen
    assert_eq!(editor.screen().rowoff, 80);
}

#[test]
fn test_save_with_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.c");

    let mut input = vec![ctrl('s')];
    input.extend(keys(path.to_str().unwrap()));
    input.push(Enter);
    let input = DummyInputs(input);
    let mut editor = Editor::with_lines(
        vec!["int x;", "y"].into_iter(),
        input,
        Discard,
        Some((80, 24)),
    )
    .unwrap();
    editor.edit().unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"int x;\ny\n");
    assert_eq!(editor.screen().message_text(), "9 bytes written to disk");
    assert!(!editor.buf().modified());
    assert_eq!(editor.buf().lang(), Some(&C));
    assert_eq!(editor.buf().rows()[0].highlights()[0], Highlight::Type);
}

#[test]
fn test_save_aborted() {
    let input = DummyInputs(vec![key('a'), ctrl('s'), key('x'), Escape]);
    let mut editor = Editor::new(input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    assert_eq!(editor.screen().message_text(), "Save aborted");
    assert!(!editor.buf().has_file());
    assert!(editor.buf().modified());
}

#[test]
fn test_save_failure_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no").join("such").join("dir.txt");
    let mut buf = TextBuffer::with_lines(vec!["abc"].into_iter());
    buf.set_file(path.to_str().unwrap());

    let input = DummyInputs(vec![key('d'), ctrl('s')]);
    let mut editor = Editor::with_buffer(buf, input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    let msg = editor.screen().message_text();
    assert!(msg.starts_with("Can't save! I/O error: "), "{}", msg);
    assert!(editor.buf().modified());
    assert_eq!(lines(&editor), vec!["dabc"]);
}

#[test]
fn test_open_with_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hello.py");
    fs::write(&path, "# hi\r\nprint(1)\n").unwrap();

    let mut input = vec![ctrl('o')];
    input.extend(keys(path.to_str().unwrap()));
    input.push(Enter);
    let input = DummyInputs(input);
    let mut editor = Editor::new(input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    assert_eq!(lines(&editor), vec!["# hi", "print(1)"]);
    assert_eq!(editor.buf().lang_name(), "python");
    assert_eq!(editor.buf().cursor(), (0, 0));
    assert!(!editor.buf().modified());
}

#[test]
fn test_open_refused_while_modified() {
    let input = DummyInputs(vec![key('a'), ctrl('o'), key('b')]);
    let mut editor = Editor::new(input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    // 'b' is typed into the buffer since no prompt was shown
    assert_eq!(lines(&editor), vec!["ab"]);
}

#[test]
fn test_block_comment_typed_and_removed() {
    let mut buf = TextBuffer::with_lines(vec!["int a;", "int b;"].into_iter());
    buf.set_file("test.c");

    let input = DummyInputs(vec![key('/'), key('*')]);
    let mut editor = Editor::with_buffer(buf, input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();
    assert_eq!(
        editor.buf().rows()[1].highlights(),
        &[Highlight::BlockComment; 6]
    );

    let mut buf = TextBuffer::with_lines(vec!["/*int a;", "int b;"].into_iter());
    buf.set_file("test.c");
    buf.set_cursor(2, 0);
    let input = DummyInputs(vec![Backspace]);
    let mut editor = Editor::with_buffer(buf, input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();
    assert_eq!(&editor.buf().rows()[1].highlights()[..3], &[Highlight::Type; 3]);
}

macro_rules! test_text_edit {
    ($title:ident {
        before: $before:expr,
        input: [$($input:expr,)+],
        after: $after:expr,
        cursor: $cursor:expr,
    }) => {
        #[test]
        fn $title() {
            let input = DummyInputs(vec![$($input,)+]);

            let mut editor = Editor::with_lines(
                $before.lines().skip(1), // .skip(1) for first empty line
                input,
                Discard,
                Some((80, 24)),
            ).unwrap();
            editor.edit().unwrap();

            let actual = lines(&editor);
            let expected = $after.lines().skip(1).collect::<Vec<_>>(); // .skip(1) for first empty line

            assert_eq!(expected.len(), actual.len(), "expected='{:?}' actual='{:?}'", expected, actual);

            for (idx, (actual_line, expected_line)) in actual.iter().zip(expected.iter()).enumerate() {
                assert_eq!(
                    expected_line,
                    actual_line,
                    "Line {} mismatch! expected='{:?} actual='{:?}'", idx+1, expected, actual,
                );
            }

            assert_eq!(editor.buf().cursor(), $cursor)
        }
    };
}

test_text_edit!(
    insert_char {
        before: "
abc",
        input: [
            key('x'),
            ArrowRight,
            key('y'),
            End,
            key('z'),
        ],
        after: "
xaybcz",
        cursor: (6, 0),
    }
);

test_text_edit!(
    delete_char {
        before: "
abc
def",
        input: [
            ArrowDown,
            Backspace, // Joins lines
            Backspace,
            ctrl('h'),
        ],
        after: "
adef",
        cursor: (1, 0),
    }
);

test_text_edit!(
    backspace_at_top_is_noop {
        before: "
abc",
        input: [
            Backspace,
        ],
        after: "
abc",
        cursor: (0, 0),
    }
);

test_text_edit!(
    insert_tab {
        before: "
ab",
        input: [
            ArrowRight,
            key('\t'),
        ],
        after: "
a\tb",
        cursor: (2, 0),
    }
);

test_text_edit!(
    insert_line {
        before: "
abcd
efg",
        input: [
            ArrowRight,
            ArrowRight,
            Enter, // Split line
            Home,
            Enter, // Insert empty line above
            ArrowDown,
            End,
            Enter, // Insert empty line at end of line
        ],
        after: "
ab

cd
efg

",
        cursor: (0, 4),
    }
);

test_text_edit!(
    delete_right_char {
        before: "
abc
def",
        input: [
            Delete,
            End,
            Delete, // Joins next line
        ],
        after: "
bcdef",
        cursor: (2, 0),
    }
);

test_text_edit!(
    move_cursor_across_lines {
        before: "
abc
de",
        input: [
            End,
            ArrowRight, // Wraps to next line
            ArrowRight,
            ArrowLeft,
            ArrowLeft, // Wraps to previous line
            key('X'),
        ],
        after: "
abcX
de",
        cursor: (4, 0),
    }
);

test_text_edit!(
    snap_cursor_to_shorter_line {
        before: "
abcdef
ab",
        input: [
            End,
            ArrowDown,
            key('X'),
        ],
        after: "
abcdef
abX",
        cursor: (3, 1),
    }
);

test_text_edit!(
    append_after_last_line {
        before: "
abc",
        input: [
            ArrowDown,
            key('d'),
        ],
        after: "
abc
d",
        cursor: (1, 1),
    }
);

test_text_edit!(
    page_down_and_up {
        before: "
0
1
2
3
4
5
6
7
8
9
10
11
12
13
14
15
16
17
18
19
20
21
22
23
24
25
26
27
28
29",
        input: [
            PageDown, // Moves to the line after the last one
            key('x'),
            PageUp,
            key('y'),
        ],
        after: "
0y
1
2
3
4
5
6
7
8
9
10
11
12
13
14
15
16
17
18
19
20
21
22
23
24
25
26
27
28
29
x",
        cursor: (2, 0),
    }
);
