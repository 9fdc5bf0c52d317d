//! Markdown bridge for styled text.
//!
//! The command line reads and prints note bodies as markdown. Strong maps to
//! bold and emphasis to italic; every block and line break becomes one
//! newline. Underline has no markdown form and is dropped on the way out.

use crate::error::{NotesError, Result};
use crate::model::{StyledText, TextStyle};
use pulldown_cmark::{CowStr, Event, Parser, Tag, TagEnd};
use pulldown_cmark_to_cmark::cmark;

impl StyledText {
    pub fn from_markdown(markdown: &str) -> StyledText {
        let mut styled = StyledText::new();
        let mut bold = 0usize;
        let mut italic = 0usize;
        let mut pending_break = false;

        for event in Parser::new(markdown) {
            match event {
                Event::Start(Tag::Strong) => bold += 1,
                Event::End(TagEnd::Strong) => bold = bold.saturating_sub(1),
                Event::Start(Tag::Emphasis) => italic += 1,
                Event::End(TagEnd::Emphasis) => italic = italic.saturating_sub(1),
                Event::Text(text) | Event::Code(text) => {
                    if pending_break {
                        styled.push("\n", TextStyle::PLAIN);
                        pending_break = false;
                    }
                    let style = TextStyle {
                        bold: bold > 0,
                        italic: italic > 0,
                        underline: false,
                    };
                    styled.push(&text, style);
                }
                Event::SoftBreak | Event::HardBreak => styled.push("\n", TextStyle::PLAIN),
                Event::End(
                    TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock,
                ) => {
                    pending_break = !styled.is_empty();
                }
                _ => {}
            }
        }

        // Code blocks end with their own newline.
        if styled.text().ends_with('\n') {
            let trimmed = styled.text().trim_end_matches('\n').to_string();
            let runs = styled
                .runs()
                .iter()
                .filter(|run| run.range.start < trimmed.len())
                .map(|run| {
                    let mut run = run.clone();
                    run.range.end = run.range.end.min(trimmed.len());
                    run
                })
                .collect();
            styled = StyledText::from_parts(trimmed, runs);
        }
        styled
    }

    /// Renders the text as markdown, one paragraph per line. Blank lines are
    /// not preserved.
    pub fn to_markdown(&self) -> Result<String> {
        let mut lines: Vec<Vec<(String, TextStyle)>> = vec![Vec::new()];
        for (fragment, style) in self.segments()? {
            for (i, part) in fragment.split('\n').enumerate() {
                if i > 0 {
                    lines.push(Vec::new());
                }
                if !part.is_empty() {
                    if let Some(line) = lines.last_mut() {
                        line.push((part.to_string(), style));
                    }
                }
            }
        }

        let mut events: Vec<Event<'static>> = Vec::new();
        for line in lines.into_iter().filter(|line| !line.is_empty()) {
            events.push(Event::Start(Tag::Paragraph));
            for (part, style) in line {
                push_styled(&mut events, part, style);
            }
            events.push(Event::End(TagEnd::Paragraph));
        }

        let mut output = String::new();
        cmark(events.iter(), &mut output)
            .map_err(|e| NotesError::CannotSaveText(format!("markdown rendering failed: {}", e)))?;
        Ok(output)
    }
}

fn push_styled(events: &mut Vec<Event<'static>>, part: String, style: TextStyle) {
    if !style.bold && !style.italic {
        events.push(Event::Text(CowStr::from(part)));
        return;
    }

    // Markers cannot sit next to whitespace, so keep it outside.
    let core = part.trim();
    if core.is_empty() {
        events.push(Event::Text(CowStr::from(part)));
        return;
    }
    let lead_len = part.len() - part.trim_start().len();
    let lead = &part[..lead_len];
    let trail = &part[lead_len + core.len()..];

    if !lead.is_empty() {
        events.push(Event::Text(CowStr::from(lead.to_string())));
    }
    if style.bold {
        events.push(Event::Start(Tag::Strong));
    }
    if style.italic {
        events.push(Event::Start(Tag::Emphasis));
    }
    events.push(Event::Text(CowStr::from(core.to_string())));
    if style.italic {
        events.push(Event::End(TagEnd::Emphasis));
    }
    if style.bold {
        events.push(Event::End(TagEnd::Strong));
    }
    if !trail.is_empty() {
        events.push(Event::Text(CowStr::from(trail.to_string())));
    }
}
