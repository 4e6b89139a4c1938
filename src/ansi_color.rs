use std::env;
use std::io::{self, Write};
use term::terminfo::TermInfo;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ColorSupport {
    TrueColor,
    Extended256,
    Only16,
}

impl ColorSupport {
    // $COLORTERM takes precedence over the number of colors in terminfo
    fn detect(colorterm: Option<&str>, colors: Option<u32>) -> ColorSupport {
        match (colorterm, colors) {
            (Some("truecolor"), _) | (Some("24bit"), _) => ColorSupport::TrueColor,
            (_, Some(n)) if n >= 256 => ColorSupport::Extended256,
            _ => ColorSupport::Only16,
        }
    }

    pub fn from_env() -> ColorSupport {
        let colorterm = env::var("COLORTERM").ok();
        let colors = TermInfo::from_env()
            .ok()
            .and_then(|info| info.numbers.get("colors").map(|&n| u32::from(n)));
        Self::detect(colorterm.as_deref(), colors)
    }
}

// One entry of gruvbox palette: https://github.com/morhetz/gruvbox#palette
struct Tone {
    // SGR parameter for foreground in 16 colors. Background is this plus 10
    sgr16: u8,
    index256: u8,
    rgb: (u8, u8, u8),
}

const LIGHT: Tone = Tone { sgr16: 39, index256: 223, rgb: (0xeb, 0xdb, 0xb2) };
const DARK: Tone = Tone { sgr16: 30, index256: 235, rgb: (0x28, 0x28, 0x28) };
const RED: Tone = Tone { sgr16: 91, index256: 167, rgb: (0xfb, 0x49, 0x34) };
const GREEN: Tone = Tone { sgr16: 32, index256: 142, rgb: (0xb8, 0xbb, 0x26) };
const GRAY: Tone = Tone { sgr16: 90, index256: 246, rgb: (0xa8, 0x99, 0x84) };
const YELLOW: Tone = Tone { sgr16: 33, index256: 214, rgb: (0xfa, 0xbd, 0x2f) };
const PURPLE: Tone = Tone { sgr16: 95, index256: 175, rgb: (0xd3, 0x86, 0x9b) };
const DARK_RED: Tone = Tone { sgr16: 31, index256: 124, rgb: (0xcc, 0x24, 0x1d) };

impl Tone {
    // 'm' sets attributes to text printed after: https://vt100.net/docs/vt100-ug/chapter3.html#SGR
    // 256 colors: '\x1b[38;5;<n>m' (fg) and '\x1b[48;5;<n>m' (bg)
    // 24bit colors: '\x1b[38;2;<r>;<g>;<b>m' (fg) and '\x1b[48;2;<r>;<g>;<b>m' (bg)
    fn write<W: Write>(&self, mut out: W, bg: bool, support: ColorSupport) -> io::Result<()> {
        let layer = if bg { 48 } else { 38 };
        match support {
            ColorSupport::TrueColor => {
                let (r, g, b) = self.rgb;
                write!(out, "\x1b[{};2;{};{};{}m", layer, r, g, b)
            }
            ColorSupport::Extended256 => write!(out, "\x1b[{};5;{}m", layer, self.index256),
            ColorSupport::Only16 if bg => write!(out, "\x1b[{}m", self.sgr16 + 10),
            ColorSupport::Only16 => write!(out, "\x1b[{}m", self.sgr16),
        }
    }
}

fn write_pair<W: Write>(mut out: W, fg: &Tone, bg: &Tone, support: ColorSupport) -> io::Result<()> {
    if support == ColorSupport::Only16 {
        return write!(out, "\x1b[{};{}m", fg.sgr16, bg.sgr16 + 10);
    }
    fg.write(&mut out, false, support)?;
    bg.write(&mut out, true, support)
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum AnsiColor {
    Reset,
    Red,
    Green,
    Gray,
    Yellow,
    Purple,
    YellowBG,
    RedBG,
    Invert,
}

impl AnsiColor {
    pub fn write_to<W: Write>(self, mut out: W, support: ColorSupport) -> io::Result<()> {
        use AnsiColor::*;
        match self {
            Reset => {
                out.write_all(b"\x1b[39;0m")?;
                // Terminal default colors are kept with 16 colors. Otherwise paint the theme's
                if support != ColorSupport::Only16 {
                    write_pair(out, &LIGHT, &DARK, support)?;
                }
                Ok(())
            }
            Red => RED.write(out, false, support),
            Green => GREEN.write(out, false, support),
            Gray => GRAY.write(out, false, support),
            Yellow => YELLOW.write(out, false, support),
            Purple => PURPLE.write(out, false, support),
            YellowBG => write_pair(out, &DARK, &YELLOW, support),
            RedBG => DARK_RED.write(out, true, support),
            Invert => out.write_all(b"\x1b[7m"),
        }
    }

    // Foreground-only colors do not clear a background set before them
    pub fn has_background(self) -> bool {
        self == AnsiColor::YellowBG || self == AnsiColor::RedBG
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(color: AnsiColor, support: ColorSupport) -> String {
        let mut buf = vec![];
        color.write_to(&mut buf, support).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn detect_color_support() {
        use ColorSupport::*;
        assert_eq!(ColorSupport::detect(Some("truecolor"), Some(8)), TrueColor);
        assert_eq!(ColorSupport::detect(Some("24bit"), None), TrueColor);
        assert_eq!(ColorSupport::detect(Some("yes"), Some(256)), Extended256);
        assert_eq!(ColorSupport::detect(None, Some(88)), Only16);
        assert_eq!(ColorSupport::detect(None, None), Only16);
    }

    #[test]
    fn sequences_16_colors() {
        use AnsiColor::*;
        let s = ColorSupport::Only16;
        assert_eq!(seq(Reset, s), "\x1b[39;0m");
        assert_eq!(seq(Red, s), "\x1b[91m");
        assert_eq!(seq(YellowBG, s), "\x1b[30;43m");
        assert_eq!(seq(RedBG, s), "\x1b[41m");
        assert_eq!(seq(Invert, s), "\x1b[7m");
    }

    #[test]
    fn sequences_256_colors() {
        use AnsiColor::*;
        let s = ColorSupport::Extended256;
        assert_eq!(seq(Reset, s), "\x1b[39;0m\x1b[38;5;223m\x1b[48;5;235m");
        assert_eq!(seq(Gray, s), "\x1b[38;5;246m");
        assert_eq!(seq(YellowBG, s), "\x1b[38;5;235m\x1b[48;5;214m");
        assert_eq!(seq(RedBG, s), "\x1b[48;5;124m");
    }

    #[test]
    fn sequences_true_colors() {
        use AnsiColor::*;
        let s = ColorSupport::TrueColor;
        assert_eq!(seq(Green, s), "\x1b[38;2;184;187;38m");
        assert_eq!(seq(YellowBG, s), "\x1b[38;2;40;40;40m\x1b[48;2;250;189;47m");
        assert_eq!(seq(Invert, s), "\x1b[7m");
    }
}
