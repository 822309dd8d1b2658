//! Recognition of fence marker lines.
//!
//! Follows the CommonMark rules for fenced code blocks: a fence is a run of at
//! least three backticks or three tildes, indented by no more than three
//! spaces. A block is closed by a run of the same character that is at least
//! as long as the opening run and carries no info string.

/// The character a fence is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceChar {
    Backtick,
    Tilde,
}

impl FenceChar {
    fn as_char(self) -> char {
        match self {
            FenceChar::Backtick => '`',
            FenceChar::Tilde => '~',
        }
    }
}

/// An opening fence line, e.g. ```` ```python ```` or `~~~~ text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningFence<'a> {
    pub kind: FenceChar,
    /// Length of the marker run
    pub len: usize,
    /// Everything after the marker run, trimmed
    pub info: &'a str,
}

const MAX_FENCE_INDENT: usize = 3;

/// Splits a line into its leading-space indentation and the rest, rejecting
/// lines indented too far to be a fence.
fn strip_indent(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches(' ');
    if line.len() - rest.len() > MAX_FENCE_INDENT {
        return None;
    }
    Some(rest)
}

fn run_length(s: &str, ch: char) -> usize {
    s.len() - s.trim_start_matches(ch).len()
}

/// Parses `line` (without its line terminator) as an opening fence.
pub fn parse_opening(line: &str) -> Option<OpeningFence<'_>> {
    let rest = strip_indent(line)?;
    let kind = match rest.chars().next()? {
        '`' => FenceChar::Backtick,
        '~' => FenceChar::Tilde,
        _ => return None,
    };

    let len = run_length(rest, kind.as_char());
    if len < 3 {
        return None;
    }

    let info = rest[len..].trim();
    // A backtick fence cannot carry backticks in its info string, otherwise
    // the line is an inline code span.
    if kind == FenceChar::Backtick && info.contains('`') {
        return None;
    }

    Some(OpeningFence { kind, len, info })
}

impl OpeningFence<'_> {
    /// Returns whether `line` closes a block opened by this fence.
    pub fn is_closed_by(&self, line: &str) -> bool {
        let Some(rest) = strip_indent(line) else {
            return false;
        };
        let len = run_length(rest, self.kind.as_char());
        len >= 3 && len >= self.len && rest[len..].trim().is_empty()
    }
}

/// Parse fence info string into language and flags
/// Examples:
/// - "python" -> ("python", [])
/// - "python,ignore" -> ("python", ["ignore"])
/// - "python propagate" -> ("python", ["propagate"])
/// - "" -> ("", [])
pub fn parse_fence_info(info: &str) -> (&str, Vec<&str>) {
    let mut parts = info
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty());

    let language = parts.next().unwrap_or("");
    let flags = parts.collect();

    (language, flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backtick_opening() {
        let fence = parse_opening("```python").unwrap();
        assert_eq!(fence.kind, FenceChar::Backtick);
        assert_eq!(fence.len, 3);
        assert_eq!(fence.info, "python");
    }

    #[test]
    fn test_parse_tilde_opening_with_indent() {
        let fence = parse_opening("   ~~~~  mermaid ").unwrap();
        assert_eq!(fence.kind, FenceChar::Tilde);
        assert_eq!(fence.len, 4);
        assert_eq!(fence.info, "mermaid");
    }

    #[test]
    fn test_rejects_non_fences() {
        assert!(parse_opening("``").is_none());
        assert!(parse_opening("    ```").is_none());
        assert!(parse_opening("text ```").is_none());
        assert!(parse_opening("```a`b").is_none());
        assert!(parse_opening("").is_none());
    }

    #[test]
    fn test_tilde_info_may_contain_backticks() {
        let fence = parse_opening("~~~ a`b").unwrap();
        assert_eq!(fence.info, "a`b");
    }

    #[test]
    fn test_closing_rules() {
        let fence = parse_opening("````python").unwrap();
        assert!(fence.is_closed_by("````"));
        assert!(fence.is_closed_by("  `````  "));
        assert!(!fence.is_closed_by("```"));
        assert!(!fence.is_closed_by("~~~~"));
        assert!(!fence.is_closed_by("```` python"));
        assert!(!fence.is_closed_by("    ````"));
    }

    #[test]
    fn test_parse_fence_info() {
        assert_eq!(parse_fence_info("python"), ("python", vec![]));
        assert_eq!(parse_fence_info("python,ignore"), ("python", vec!["ignore"]));
        assert_eq!(
            parse_fence_info("python, propagate ignore"),
            ("python", vec!["propagate", "ignore"])
        );
        assert_eq!(parse_fence_info(""), ("", vec![]));
    }
}
