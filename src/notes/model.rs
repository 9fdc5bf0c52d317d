use crate::error::{NotesError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Character formatting carried by a run of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl TextStyle {
    pub const PLAIN: TextStyle = TextStyle {
        bold: false,
        italic: false,
        underline: false,
    };

    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::PLAIN
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Self::PLAIN
        }
    }

    pub fn underline() -> Self {
        Self {
            underline: true,
            ..Self::PLAIN
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::PLAIN
    }
}

/// A style applied to a byte range of the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRun {
    pub range: Range<usize>,
    pub style: TextStyle,
}

/// Text with formatting runs, the in-memory form of a note's body.
///
/// Runs are stored as given, so a `StyledText` built with [`StyledText::from_parts`]
/// may hold ranges that are out of bounds or overlapping. Such text cannot be
/// encoded; [`StyledText::segments`] reports the problem.
///
/// Two values compare equal when their text matches and their runs describe the
/// same formatting once adjacent runs of equal style are merged and plain runs
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct StyledText {
    text: String,
    runs: Vec<AttributeRun>,
}

impl StyledText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            runs: Vec::new(),
        }
    }

    pub fn from_parts(text: impl Into<String>, runs: Vec<AttributeRun>) -> Self {
        Self {
            text: text.into(),
            runs,
        }
    }

    /// Appends `fragment` with `style`, extending the previous run when the
    /// style matches.
    pub fn push(&mut self, fragment: &str, style: TextStyle) {
        if fragment.is_empty() {
            return;
        }
        let start = self.text.len();
        self.text.push_str(fragment);
        let end = self.text.len();
        if style.is_plain() {
            return;
        }
        if let Some(last) = self.runs.last_mut() {
            if last.style == style && last.range.end == start {
                last.range.end = end;
                return;
            }
        }
        self.runs.push(AttributeRun {
            range: start..end,
            style,
        });
    }

    pub fn with(mut self, fragment: &str, style: TextStyle) -> Self {
        self.push(fragment, style);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn runs(&self) -> &[AttributeRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Splits the text into consecutive `(fragment, style)` pairs covering the
    /// whole string, with unstyled gaps reported as plain.
    ///
    /// # Errors
    /// `CannotSaveText` when a run is empty, out of bounds, not on a character
    /// boundary, or overlaps another run.
    pub fn segments(&self) -> Result<Vec<(&str, TextStyle)>> {
        let mut runs: Vec<&AttributeRun> = self.runs.iter().collect();
        runs.sort_by_key(|run| run.range.start);

        let mut segments = Vec::with_capacity(runs.len() * 2 + 1);
        let mut cursor = 0;
        for run in runs {
            let Range { start, end } = run.range;
            if start >= end {
                return Err(NotesError::CannotSaveText(format!(
                    "empty attribute range {start}..{end}"
                )));
            }
            if end > self.text.len() {
                return Err(NotesError::CannotSaveText(format!(
                    "attribute range {start}..{end} exceeds text length {}",
                    self.text.len()
                )));
            }
            if !self.text.is_char_boundary(start) || !self.text.is_char_boundary(end) {
                return Err(NotesError::CannotSaveText(format!(
                    "attribute range {start}..{end} splits a character"
                )));
            }
            if start < cursor {
                return Err(NotesError::CannotSaveText(format!(
                    "attribute range {start}..{end} overlaps a previous run"
                )));
            }
            if start > cursor {
                segments.push((&self.text[cursor..start], TextStyle::PLAIN));
            }
            segments.push((&self.text[start..end], run.style));
            cursor = end;
        }
        if cursor < self.text.len() {
            segments.push((&self.text[cursor..], TextStyle::PLAIN));
        }
        Ok(segments)
    }

    fn canonical_runs(&self) -> Vec<AttributeRun> {
        match self.segments() {
            Ok(segments) => {
                let mut canonical = StyledText::new();
                for (fragment, style) in segments {
                    canonical.push(fragment, style);
                }
                canonical.runs
            }
            Err(_) => self.runs.clone(),
        }
    }
}

impl PartialEq for StyledText {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.canonical_runs() == other.canonical_runs()
    }
}

impl Eq for StyledText {}

impl From<&str> for StyledText {
    fn from(text: &str) -> Self {
        StyledText::plain(text)
    }
}

/// A place attached to a note, stored as `location.json` inside the package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            name: None,
            latitude,
            longitude,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
