//! SQL `LIKE`-style wildcard patterns.
//!
//! `%` matches any (possibly empty) run of characters and `\%` matches a
//! literal percent sign. A backslash in front of anything else is an ordinary
//! character. Matching is case-sensitive and anchored at both ends.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Wildcard,
}

/// A compiled wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compiles `raw`, resolving `\%` escapes. Consecutive unescaped `%`
    /// collapse into a single wildcard.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' if chars.peek() == Some(&'%') => {
                    chars.next();
                    literal.push('%');
                }
                '%' => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    if segments.last() != Some(&Segment::Wildcard) {
                        segments.push(Segment::Wildcard);
                    }
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { raw, segments }
    }

    /// The unescaped text when the pattern contains no wildcard.
    pub fn as_literal(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [] => Some(""),
            [Segment::Literal(text)] => Some(text.as_str()),
            _ => None,
        }
    }

    /// True when the pattern is a lone wildcard and accepts every value.
    pub fn is_match_all(&self) -> bool {
        self.segments == [Segment::Wildcard]
    }

    pub fn matches(&self, value: &str) -> bool {
        let mut segments = self.segments.as_slice();
        let mut rest = value;

        if let [Segment::Literal(prefix), tail @ ..] = segments {
            match rest.strip_prefix(prefix.as_str()) {
                Some(remaining) => rest = remaining,
                None => return false,
            }
            segments = tail;
        }
        if segments.is_empty() {
            return rest.is_empty();
        }

        // From here on `segments` starts with a wildcard, so the suffix
        // cannot overlap the prefix consumed above.
        if let [head @ .., Segment::Literal(suffix)] = segments {
            match rest.strip_suffix(suffix.as_str()) {
                Some(remaining) => rest = remaining,
                None => return false,
            }
            segments = head;
        }

        // Inner literals float between wildcards: leftmost match is enough.
        for segment in segments {
            if let Segment::Literal(text) = segment {
                match rest.find(text.as_str()) {
                    Some(index) => rest = &rest[index + text.len()..],
                    None => return false,
                }
            }
        }
        true
    }

    /// Renders the pattern for a SQL `LIKE ... ESCAPE '\'` clause.
    pub fn to_sql_like(&self) -> String {
        let mut like = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Wildcard => like.push('%'),
                Segment::Literal(text) => {
                    for c in text.chars() {
                        if matches!(c, '%' | '_' | '\\') {
                            like.push('\\');
                        }
                        like.push(c);
                    }
                }
            }
        }
        like
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One-shot match of `pattern` against `value`.
pub fn matches(pattern: &str, value: &str) -> bool {
    Pattern::new(pattern).matches(value)
}
