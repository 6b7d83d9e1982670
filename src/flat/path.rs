//! Flat paths and their text form
//!
//! A path names one leaf inside a nested entity. Its text form is what ends
//! up in a table header:
//!
//! - field segments are joined with `.`: `contact.address.city`
//! - list indices are bracketed: `projects[0].tags[1]`
//! - map keys are braced: `offices{NYC}.street`, `nested{{a}=b;{c}=d}`
//!
//! Key text is stored already escaped, so braces inside a key are either
//! escaped or balanced and the whole path can be re-parsed unambiguously.

use crate::error::{FlatError, Result};
use std::fmt;
use std::str::FromStr;

/// Characters that must be escaped inside map key text
const KEY_SPECIALS: &[char] = &['\\', '{', '}', '[', ']', '.', '=', ';'];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Field(String),
    Index(usize),
    /// Encoded (escaped) key text, without the surrounding braces
    Key(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FlatPath(Vec<Segment>);

impl FlatPath {
    pub fn root() -> Self {
        FlatPath(Vec::new())
    }

    pub fn field(name: impl Into<String>) -> Self {
        FlatPath(vec![Segment::Field(name.into())])
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<Segment> {
        self.0.pop()
    }

    pub fn child(&self, segment: Segment) -> FlatPath {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Append a relative path
    pub fn join(&self, rest: &[Segment]) -> FlatPath {
        let mut path = self.clone();
        path.0.extend_from_slice(rest);
        path
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut chars = text.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '[' => {
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some((_, ']')) => break,
                            Some((_, d)) if d.is_ascii_digit() => digits.push(d),
                            Some((_, other)) => {
                                return Err(FlatError::malformed(
                                    text,
                                    format!("unexpected {:?} in list index", other),
                                ))
                            }
                            None => return Err(FlatError::malformed(text, "unterminated list index")),
                        }
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| FlatError::malformed(text, "empty or oversized list index"))?;
                    segments.push(Segment::Index(index));
                }
                '{' => {
                    let start = pos + 1;
                    let mut depth = 1usize;
                    let mut end = None;
                    while let Some((i, k)) = chars.next() {
                        match k {
                            '\\' => {
                                if chars.next().is_none() {
                                    return Err(FlatError::malformed(text, "dangling escape in map key"));
                                }
                            }
                            '{' => depth += 1,
                            '}' => {
                                depth -= 1;
                                if depth == 0 {
                                    end = Some(i);
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }
                    let Some(end) = end else {
                        return Err(FlatError::malformed(text, "unterminated map key"));
                    };
                    segments.push(Segment::Key(text[start..end].to_string()));
                }
                '.' if segments.is_empty() => {
                    return Err(FlatError::malformed(text, "path starts with a separator"));
                }
                '.' => {
                    let name = read_name(text, &mut chars, String::new())?;
                    segments.push(Segment::Field(name));
                }
                ']' | '}' => {
                    return Err(FlatError::malformed(text, format!("unbalanced {:?}", c)));
                }
                '\\' => {
                    return Err(FlatError::malformed(text, "escape outside a map key"));
                }
                _ if segments.is_empty() => {
                    let name = read_name(text, &mut chars, String::from(c))?;
                    segments.push(Segment::Field(name));
                }
                _ => {
                    return Err(FlatError::malformed(
                        text,
                        format!("field name must follow a separator at byte {}", pos),
                    ))
                }
            }
        }

        Ok(FlatPath(segments))
    }
}

fn read_name(
    text: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    mut name: String,
) -> Result<String> {
    while let Some(&(_, c)) = chars.peek() {
        if matches!(c, '.' | '[' | '{') {
            break;
        }
        if matches!(c, ']' | '}' | '\\') {
            return Err(FlatError::malformed(text, format!("unexpected {:?} in field name", c)));
        }
        name.push(c);
        chars.next();
    }
    if name.is_empty() {
        return Err(FlatError::malformed(text, "empty field name"));
    }
    Ok(name)
}

impl fmt::Display for FlatPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
                Segment::Key(key) => write!(f, "{{{}}}", key)?,
            }
        }
        Ok(())
    }
}

impl FromStr for FlatPath {
    type Err = FlatError;

    fn from_str(s: &str) -> Result<Self> {
        FlatPath::parse(s)
    }
}

/// Escape text for use inside a `{...}` key segment
pub fn escape_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if KEY_SPECIALS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn unescape_key(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped) => out.push(escaped),
                None => return Err(FlatError::malformed(text, "dangling escape in map key")),
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

/// Split on `sep` wherever it appears outside braces and unescaped
pub(crate) fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested_path() {
        let path = FlatPath::field("projects")
            .child(Segment::Index(0))
            .child(Segment::Field("tags".to_string()))
            .child(Segment::Index(1));
        assert_eq!(path.to_string(), "projects[0].tags[1]");
    }

    #[test]
    fn test_parse_reverses_display() {
        for text in [
            "name",
            "contact.address.city",
            "projects[0].tags[12]",
            "offices{NYC}.street",
            "nested{{a}=b;{c}=d}",
            "metadata{a\\.b\\}c}",
            "{k}",
            "[3]",
        ] {
            let path = FlatPath::parse(text).unwrap();
            assert_eq!(path.to_string(), text);
        }
    }

    #[test]
    fn test_parse_composite_key_is_one_segment() {
        let path = FlatPath::parse("nested{{a}=b;{c}=d}").unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Field("nested".to_string()),
                Segment::Key("{a}=b;{c}=d".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["tags[", "tags[x]", "offices{NYC", ".name", "a..b", "a]", "a{b\\"] {
            let err = FlatPath::parse(bad).unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::MalformedPath, "{}", bad);
        }
    }

    #[test]
    fn test_key_escaping() {
        let raw = "a.b{c}=d;e\\f[0]";
        let escaped = escape_key(raw);
        assert_eq!(split_top_level(&escaped, ';').len(), 1);
        assert_eq!(unescape_key(&escaped).unwrap(), raw);
    }

    #[test]
    fn test_split_top_level_ignores_braced_separators() {
        let parts = split_top_level("{x;y}=1;{z}=2", ';');
        assert_eq!(parts, vec!["{x;y}=1", "{z}=2"]);
    }
}
