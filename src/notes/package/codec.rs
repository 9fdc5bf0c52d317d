//! Styled text <-> RTF.
//!
//! Only character formatting that [`TextStyle`] can express survives a
//! round trip. Fonts, colors, paragraph formatting and embedded objects found
//! in documents written by other editors are read past and dropped.

use crate::error::{NotesError, Result};
use crate::model::{StyledText, TextStyle};

/// Converts styled text to and from the byte stream stored in a package.
pub trait RichTextCodec: Send + Sync {
    fn encode(&self, text: &StyledText) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<StyledText>;
}

/// RTF 1.x codec for the `Text.rtf` entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtfCodec;

const HEADER: &str =
    "{\\rtf1\\ansi\\ansicpg1252\\deff0\\uc1\n{\\fonttbl\\f0\\fswiss\\fcharset0 Helvetica;}\n\\f0\\fs24 ";

const MAX_CONTROL_WORD_LEN: usize = 32;

// Destinations whose contents are not document text.
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "expandedcolortbl",
    "stylesheet",
    "info",
    "pict",
    "object",
    "header",
    "footer",
    "footnote",
    "listtable",
    "listoverridetable",
    "filetbl",
    "rsidtbl",
    "generator",
    "themedata",
    "latentstyles",
    "datastore",
    "xmlnstbl",
];

// Windows-1252 code points for bytes 0x80..=0x9F. Unassigned bytes map to
// the matching C1 control.
const CP1252_HIGH: [u32; 32] = [
    0x20AC, 0x0081, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160,
    0x2039, 0x0152, 0x008D, 0x017D, 0x008F, 0x0090, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022,
    0x2013, 0x2014, 0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0x009D, 0x017E, 0x0178,
];

impl RichTextCodec for RtfCodec {
    fn encode(&self, text: &StyledText) -> Result<Vec<u8>> {
        let segments = text.segments()?;

        let mut out = String::with_capacity(HEADER.len() + text.len() + 16);
        out.push_str(HEADER);
        for (fragment, style) in segments {
            if style.is_plain() {
                escape_into(fragment, &mut out);
                continue;
            }
            out.push('{');
            if style.bold {
                out.push_str("\\b");
            }
            if style.italic {
                out.push_str("\\i");
            }
            if style.underline {
                out.push_str("\\ul");
            }
            out.push(' ');
            escape_into(fragment, &mut out);
            out.push('}');
        }
        out.push_str("}\n");
        Ok(out.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<StyledText> {
        Decoder::new(bytes).run()
    }
}

fn escape_into(fragment: &str, out: &mut String) {
    for ch in fragment.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\n' => out.push_str("\\par\n"),
            '\t' => out.push_str("\\tab "),
            ' '..='~' => out.push(ch),
            _ => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    // RTF parameters are signed 16-bit.
                    let signed = if *unit > 0x7FFF {
                        *unit as i32 - 0x10000
                    } else {
                        *unit as i32
                    };
                    out.push_str(&format!("\\u{}?", signed));
                }
            }
        }
    }
}

fn cp1252_char(byte: u8) -> char {
    let code = match byte {
        0x80..=0x9F => CP1252_HIGH[(byte - 0x80) as usize],
        other => other as u32,
    };
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}

#[derive(Debug, Clone, Copy)]
struct GroupState {
    style: TextStyle,
    skip: bool,
    fallback_len: usize,
}

impl Default for GroupState {
    fn default() -> Self {
        Self {
            style: TextStyle::PLAIN,
            skip: false,
            fallback_len: 1,
        }
    }
}

struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    stack: Vec<GroupState>,
    out: StyledText,
    finished: bool,
    pending_fallback: usize,
    high_surrogate: Option<u16>,
}

impl<'a> Decoder<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            stack: Vec::new(),
            out: StyledText::new(),
            finished: false,
            pending_fallback: 0,
            high_surrogate: None,
        }
    }

    fn run(mut self) -> Result<StyledText> {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if !self.bytes[self.pos..].starts_with(b"{\\rtf") {
            return Err(malformed("missing {\\rtf header"));
        }

        while let Some(byte) = self.next_byte() {
            if self.finished {
                if byte.is_ascii_whitespace() || byte == 0 {
                    continue;
                }
                return Err(malformed("content after end of document"));
            }
            match byte {
                b'{' => {
                    let state = self.stack.last().copied().unwrap_or_default();
                    self.stack.push(state);
                    self.pending_fallback = 0;
                }
                b'}' => {
                    if self.stack.pop().is_none() {
                        return Err(malformed("unbalanced closing brace"));
                    }
                    self.pending_fallback = 0;
                    if self.stack.is_empty() {
                        self.finished = true;
                    }
                }
                b'\\' => self.control()?,
                b'\r' | b'\n' => {}
                other => self.emit(cp1252_char(other), true),
            }
        }

        if !self.finished {
            return Err(malformed("document ends inside a group"));
        }
        self.flush_surrogate();
        Ok(self.out)
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.bytes.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        byte
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn top(&mut self) -> &mut GroupState {
        // The header check guarantees a group is open before any control.
        if self.stack.is_empty() {
            self.stack.push(GroupState::default());
        }
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn control(&mut self) -> Result<()> {
        let byte = self
            .next_byte()
            .ok_or_else(|| malformed("truncated control sequence"))?;
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' => {
                let start = self.pos - 1;
                while matches!(self.peek(), Some(b) if b.is_ascii_alphabetic()) {
                    self.pos += 1;
                    if self.pos - start > MAX_CONTROL_WORD_LEN {
                        return Err(malformed("control word too long"));
                    }
                }
                // Slice is ASCII letters only.
                let word = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
                let param = self.parameter()?;
                if self.peek() == Some(b' ') {
                    self.pos += 1;
                }
                self.word(&word, param);
            }
            b'\'' => {
                let hex = self
                    .bytes
                    .get(self.pos..self.pos + 2)
                    .ok_or_else(|| malformed("truncated hex escape"))?;
                let hex = std::str::from_utf8(hex).map_err(|_| malformed("bad hex escape"))?;
                let value =
                    u8::from_str_radix(hex, 16).map_err(|_| malformed("bad hex escape"))?;
                self.pos += 2;
                self.emit(cp1252_char(value), true);
            }
            b'\\' | b'{' | b'}' => self.emit(byte as char, true),
            b'*' => self.top().skip = true,
            b'~' => self.emit('\u{00A0}', true),
            b'_' => self.emit('\u{2011}', true),
            b'\n' | b'\r' => self.emit('\n', false),
            _ => {}
        }
        Ok(())
    }

    fn parameter(&mut self) -> Result<Option<i32>> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return Ok(None);
        }
        let digits = String::from_utf8_lossy(&self.bytes[start..self.pos]);
        if digits == "-" {
            return Err(malformed("dangling minus in control parameter"));
        }
        digits
            .parse::<i32>()
            .map(Some)
            .map_err(|_| malformed("control parameter out of range"))
    }

    fn word(&mut self, word: &str, param: Option<i32>) {
        let on = param != Some(0);
        match word {
            "b" => self.top().style.bold = on,
            "i" => self.top().style.italic = on,
            "ul" => self.top().style.underline = on,
            "ulnone" => self.top().style.underline = false,
            "plain" => self.top().style = TextStyle::PLAIN,
            "par" | "line" => self.emit('\n', false),
            "tab" => self.emit('\t', false),
            "uc" => self.top().fallback_len = param.unwrap_or(1).max(0) as usize,
            "u" => {
                if let Some(value) = param {
                    let unit = value.rem_euclid(0x10000) as u32;
                    self.unicode_unit(unit);
                    self.pending_fallback = self.top().fallback_len;
                }
            }
            "emdash" => self.emit('\u{2014}', false),
            "endash" => self.emit('\u{2013}', false),
            "bullet" => self.emit('\u{2022}', false),
            "lquote" => self.emit('\u{2018}', false),
            "rquote" => self.emit('\u{2019}', false),
            "ldblquote" => self.emit('\u{201C}', false),
            "rdblquote" => self.emit('\u{201D}', false),
            w if SKIPPED_DESTINATIONS.contains(&w) => self.top().skip = true,
            _ => {}
        }
    }

    fn unicode_unit(&mut self, unit: u32) {
        if self.top().skip {
            return;
        }
        match unit {
            0xD800..=0xDBFF => {
                self.flush_surrogate();
                self.high_surrogate = Some(unit as u16);
            }
            0xDC00..=0xDFFF => {
                let ch = match self.high_surrogate.take() {
                    Some(high) => char::decode_utf16([high, unit as u16])
                        .next()
                        .and_then(|r| r.ok())
                        .unwrap_or(char::REPLACEMENT_CHARACTER),
                    None => char::REPLACEMENT_CHARACTER,
                };
                self.push(ch);
            }
            _ => {
                let ch = char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER);
                self.push(ch);
            }
        }
    }

    /// Emits document text. `counts_as_fallback` marks characters that may be
    /// the ANSI stand-in following a `\u` escape.
    fn emit(&mut self, ch: char, counts_as_fallback: bool) {
        if self.top().skip {
            return;
        }
        if counts_as_fallback && self.pending_fallback > 0 {
            self.pending_fallback -= 1;
            return;
        }
        self.pending_fallback = 0;
        self.push(ch);
    }

    fn push(&mut self, ch: char) {
        self.flush_surrogate();
        let style = self.top().style;
        let mut buf = [0u8; 4];
        self.out.push(ch.encode_utf8(&mut buf), style);
    }

    fn flush_surrogate(&mut self) {
        if self.high_surrogate.take().is_some() {
            let style = self.top().style;
            self.out.push("\u{FFFD}", style);
        }
    }
}

fn malformed(reason: &str) -> NotesError {
    NotesError::CannotLoadText(format!("malformed RTF: {}", reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeRun;

    fn decode(rtf: &str) -> StyledText {
        RtfCodec.decode(rtf.as_bytes()).unwrap()
    }

    #[test]
    fn encodes_styles_as_groups() {
        let text = StyledText::new()
            .with("Hello ", TextStyle::PLAIN)
            .with("bold", TextStyle::bold());
        let rtf = String::from_utf8(RtfCodec.encode(&text).unwrap()).unwrap();

        assert!(rtf.starts_with("{\\rtf1"));
        assert!(rtf.contains("Hello {\\b bold}"));
        assert!(rtf.trim_end().ends_with('}'));
    }

    #[test]
    fn escapes_specials_and_unicode() {
        let text = StyledText::plain("a{b}\\c\n\td é 😀");
        let rtf = String::from_utf8(RtfCodec.encode(&text).unwrap()).unwrap();

        assert!(rtf.contains("a\\{b\\}\\\\c\\par\n\\tab d \\u233? \\u-10179?\\u-8704?"));
        assert_eq!(RtfCodec.decode(rtf.as_bytes()).unwrap(), text);
    }

    #[test]
    fn round_trips_mixed_styles() {
        let text = StyledText::new()
            .with("plain ", TextStyle::PLAIN)
            .with("bold", TextStyle::bold())
            .with(" ", TextStyle::PLAIN)
            .with(
                "both",
                TextStyle {
                    bold: true,
                    italic: true,
                    underline: true,
                },
            )
            .with("\nnext line", TextStyle::italic());
        let bytes = RtfCodec.encode(&text).unwrap();
        assert_eq!(RtfCodec.decode(&bytes).unwrap(), text);
    }

    #[test]
    fn encode_rejects_bad_runs() {
        let text = StyledText::from_parts(
            "short",
            vec![AttributeRun {
                range: 3..40,
                style: TextStyle::bold(),
            }],
        );
        assert!(matches!(
            RtfCodec.encode(&text),
            Err(NotesError::CannotSaveText(_))
        ));
    }

    #[test]
    fn decodes_editor_output_with_tables_and_toggles() {
        let rtf = "{\\rtf1\\ansi\\ansicpg1252\\cocoartf2639\n\
            {\\fonttbl\\f0\\fswiss\\fcharset0 Helvetica;}\n\
            {\\colortbl;\\red255\\green255\\blue255;}\n\
            {\\*\\expandedcolortbl;;}\n\
            \\pard\\tx560\\pardirnatural\\partightenfactor0\n\
            \\f0\\fs24 \\cf0 Start \\b bold\\b0  then \\i it\\i0  \\ul under\\ulnone  \\'e9t\\'e9\\\n\
            done}";
        let text = decode(rtf);

        assert_eq!(text.text(), "Start bold then it under ét\u{e9}\ndone");
        let expected = StyledText::new()
            .with("Start ", TextStyle::PLAIN)
            .with("bold", TextStyle::bold())
            .with(" then ", TextStyle::PLAIN)
            .with("it", TextStyle::italic())
            .with(" ", TextStyle::PLAIN)
            .with("under", TextStyle::underline())
            .with(" ét\u{e9}\ndone", TextStyle::PLAIN);
        assert_eq!(text, expected);
    }

    #[test]
    fn unicode_fallback_is_skipped() {
        assert_eq!(decode("{\\rtf1 \\uc2 \\u8364 EU!}").text(), "€!");
        assert_eq!(decode("{\\rtf1 \\u8364?x}").text(), "€x");
        assert_eq!(decode("{\\rtf1 \\'80}").text(), "€");
    }

    #[test]
    fn group_style_is_restored_on_close() {
        let text = decode("{\\rtf1 a{\\b b}c}");
        let expected = StyledText::new()
            .with("a", TextStyle::PLAIN)
            .with("b", TextStyle::bold())
            .with("c", TextStyle::PLAIN);
        assert_eq!(text, expected);
    }

    #[test]
    fn rejects_malformed_documents() {
        for bad in [
            "plain text",
            "{\\rtf1 unterminated",
            "{\\rtf1 a}}",
            "{\\rtf1 a} trailing",
            "{\\rtf1 \\'zz}",
            "{\\rtf1 \\",
        ] {
            assert!(
                matches!(
                    RtfCodec.decode(bad.as_bytes()),
                    Err(NotesError::CannotLoadText(_))
                ),
                "accepted {:?}",
                bad
            );
        }
    }
}
