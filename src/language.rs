use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

// Static description of how to highlight one language. A keyword ending with '|' belongs to the
// second keyword class (built-in types) and the '|' itself is not part of the word.
pub struct Language {
    pub name: &'static str,
    // An entry starting with '.' matches a file extension. Others match as substring of file name
    pub file_match: &'static [&'static str],
    pub keywords: &'static [&'static str],
    pub line_comment: Option<&'static str>,
    pub block_comment: Option<(&'static str, &'static str)>,
    pub numbers: bool,
    pub strings: bool,
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Language({})", self.name)
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        // Profiles are static singletons so the name identifies them
        self.name == other.name
    }
}

pub const C: Language = Language {
    name: "c",
    file_match: &[".c", ".h", ".cpp", ".hpp", ".cc"],
    keywords: &[
        "switch", "if", "while", "for", "break", "continue", "return", "else", "struct", "union",
        "typedef", "static", "enum", "class", "case", "default", "goto", "do", "sizeof", "const",
        "extern", "volatile", "register", "int|", "long|", "double|", "float|", "char|",
        "unsigned|", "signed|", "void|", "short|", "auto|", "bool|",
    ],
    line_comment: Some("//"),
    block_comment: Some(("/*", "*/")),
    numbers: true,
    strings: true,
};

pub const RUST: Language = Language {
    name: "rust",
    file_match: &[".rs"],
    keywords: &[
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
        "extern", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
        "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "type",
        "union", "unsafe", "use", "where", "while", "true", "false", "i8|", "i16|", "i32|",
        "i64|", "i128|", "isize|", "u8|", "u16|", "u32|", "u64|", "u128|", "usize|", "f32|",
        "f64|", "bool|", "char|", "str|", "String|", "Vec|", "Box|", "Option|", "Result|",
    ],
    line_comment: Some("//"),
    block_comment: Some(("/*", "*/")),
    numbers: true,
    strings: true,
};

pub const GO: Language = Language {
    name: "go",
    file_match: &[".go"],
    keywords: &[
        "break", "case", "chan", "const", "continue", "default", "defer", "else",
        "fallthrough", "for", "func", "go", "goto", "if", "import", "interface", "map",
        "package", "range", "return", "select", "struct", "switch", "type", "var", "true",
        "false", "nil", "bool|", "byte|", "complex64|", "complex128|", "error|", "float32|",
        "float64|", "int|", "int8|", "int16|", "int32|", "int64|", "rune|", "string|", "uint|",
        "uint8|", "uint16|", "uint32|", "uint64|", "uintptr|",
    ],
    line_comment: Some("//"),
    block_comment: Some(("/*", "*/")),
    numbers: true,
    strings: true,
};

pub const JAVASCRIPT: Language = Language {
    name: "javascript",
    file_match: &[".js", ".jsx", ".mjs"],
    keywords: &[
        "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
        "do", "else", "export", "extends", "finally", "for", "function", "if", "import", "in",
        "instanceof", "let", "new", "return", "super", "switch", "this", "throw", "try",
        "typeof", "var", "void", "while", "with", "yield", "true", "false", "null",
        "undefined", "Array|", "Boolean|", "Date|", "Error|", "Function|", "JSON|", "Map|",
        "Math|", "Number|", "Object|", "Promise|", "RegExp|", "Set|", "String|", "Symbol|",
    ],
    line_comment: Some("//"),
    block_comment: Some(("/*", "*/")),
    numbers: true,
    strings: true,
};

pub const PYTHON: Language = Language {
    name: "python",
    file_match: &[".py"],
    keywords: &[
        "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del",
        "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in",
        "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
        "with", "yield", "True", "False", "None", "int|", "float|", "complex|", "list|",
        "tuple|", "range|", "str|", "bytes|", "bytearray|", "set|", "frozenset|", "dict|",
    ],
    line_comment: Some("#"),
    block_comment: None,
    numbers: true,
    strings: true,
};

pub static LANGUAGES: &[Language] = &[C, RUST, GO, JAVASCRIPT, PYTHON];

impl Language {
    fn matches(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(OsStr::to_str);
        let name = path.file_name().and_then(OsStr::to_str).unwrap_or("");
        self.file_match.iter().any(|pat| {
            if let Some(pat_ext) = pat.strip_prefix('.') {
                ext == Some(pat_ext)
            } else {
                name.contains(pat)
            }
        })
    }

    pub fn detect<P: AsRef<Path>>(path: P) -> Option<&'static Language> {
        let path = path.as_ref();
        LANGUAGES.iter().find(|lang| lang.matches(path))
    }
}
