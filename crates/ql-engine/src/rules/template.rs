//! Query template parsing.
//!
//! Syntax on top of plain SQL:
//! - `:name` — named placeholder (ASCII identifier). `::` casts and colons
//!   inside single-quoted literals are left alone.
//! - `[[ ... ]]` — optional section, emitted only when every placeholder
//!   inside it has a value. Sections do not nest.

use crate::error::TemplateError;

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Param(String),
    Section(Vec<Segment>),
}

/// A parsed query template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
    /// Lowercased SQL with literal contents blanked and placeholders as `?`,
    /// used for keyword checks.
    shape: String,
}

impl Template {
    pub fn parse(src: &str) -> Result<Self, TemplateError> {
        let mut top: Vec<Segment> = Vec::new();
        let mut section: Option<(usize, Vec<Segment>)> = None;
        let mut text = String::new();
        let mut shape = String::with_capacity(src.len());
        let mut quote_start: Option<usize> = None;

        let mut chars = src.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if quote_start.is_some() {
                text.push(c);
                if c == '\'' {
                    quote_start = None;
                    shape.push('\'');
                }
                continue;
            }

            match c {
                '\'' => {
                    quote_start = Some(i);
                    text.push(c);
                    shape.push('\'');
                }
                '[' if matches!(chars.peek(), Some((_, '['))) => {
                    chars.next();
                    if section.is_some() {
                        return Err(TemplateError::NestedSection(i));
                    }
                    flush(&mut top, &mut text);
                    section = Some((i, Vec::new()));
                    shape.push(' ');
                }
                ']' if matches!(chars.peek(), Some((_, ']'))) => {
                    chars.next();
                    let Some((_, mut inner)) = section.take() else {
                        return Err(TemplateError::UnexpectedSectionEnd(i));
                    };
                    flush(&mut inner, &mut text);
                    top.push(Segment::Section(inner));
                    shape.push(' ');
                }
                ':' if matches!(chars.peek(), Some((_, ':'))) => {
                    chars.next();
                    text.push_str("::");
                    shape.push_str("::");
                }
                ':' if matches!(chars.peek(), Some((_, n)) if n.is_ascii_alphabetic() || *n == '_') =>
                {
                    let mut name = String::new();
                    while let Some((_, n)) = chars.peek() {
                        if n.is_ascii_alphanumeric() || *n == '_' {
                            name.push(*n);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let out = match section.as_mut() {
                        Some((_, inner)) => inner,
                        None => &mut top,
                    };
                    flush(out, &mut text);
                    out.push(Segment::Param(name));
                    shape.push('?');
                }
                _ => {
                    text.push(c);
                    shape.push(c.to_ascii_lowercase());
                }
            }
        }

        if let Some(start) = quote_start {
            return Err(TemplateError::UnterminatedQuote(start));
        }
        if let Some((start, _)) = section {
            return Err(TemplateError::UnclosedSection(start));
        }
        flush(&mut top, &mut text);

        Ok(Self {
            segments: top,
            shape,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Keyword-check view of the statement (see struct docs).
    pub fn shape(&self) -> &str {
        &self.shape
    }

    /// Every placeholder in order of appearance, with whether it sits in an
    /// optional section.
    pub fn placeholders(&self) -> Vec<(&str, bool)> {
        let mut out = Vec::new();
        for seg in &self.segments {
            match seg {
                Segment::Param(name) => out.push((name.as_str(), false)),
                Segment::Section(inner) => {
                    for s in inner {
                        if let Segment::Param(name) = s {
                            out.push((name.as_str(), true));
                        }
                    }
                }
                Segment::Text(_) => {}
            }
        }
        out
    }
}

fn flush(out: &mut Vec<Segment>, text: &mut String) {
    if !text.is_empty() {
        out.push(Segment::Text(std::mem::take(text)));
    }
}
