//! Regex-driven split-and-dispatch for `analyze_string`.
use crate::error::TransformError;
use regex::Regex;
use std::collections::HashMap;

/// One matched substring, with its capture groups available positionally
/// and by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Captured {
    pub text: String,
    groups: Vec<Option<String>>,
    named: HashMap<String, Option<String>>,
}

impl Captured {
    /// Group 0 is the whole match.
    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }

    pub fn named_group(&self, name: &str) -> Option<&str> {
        self.named.get(name).and_then(|g| g.as_deref())
    }
}

/// A segment of the analyzed input: a gap between matches, or a match.
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Gap(String),
    Match(Captured),
}

/// Compiles `pattern` with the supported inline flags (`i`, `s`, `m`, `x`).
/// Matching is always global; a caller-supplied `g` is accepted and
/// ignored.
fn compile(pattern: &str, flags: &str) -> Result<Regex, TransformError> {
    let inline: String = flags.chars().filter(|c| "ismx".contains(*c)).collect();
    if inline.is_empty() {
        Ok(Regex::new(pattern)?)
    } else {
        Ok(Regex::new(&format!("(?{}){}", inline, pattern))?)
    }
}

/// Splits `input` into alternating gap and match pieces.
///
/// A zero-length *first* match raises. Later zero-length matches are
/// tolerated; the search cursor advances one character past them so the
/// loop terminates, and the stepped-over character lands in the next gap.
pub fn analyze(input: &str, pattern: &str, flags: &str) -> Result<Vec<Piece>, TransformError> {
    let regex = compile(pattern, flags)?;
    let names: Vec<Option<&str>> = regex.capture_names().collect();

    let mut pieces = Vec::new();
    // Where the search resumes, and where unconsumed input begins. The two
    // diverge only after a zero-length match.
    let mut cursor = 0;
    let mut gap_start = 0;
    let mut first = true;

    while cursor <= input.len() {
        let Some(caps) = regex.captures_at(input, cursor) else {
            break;
        };
        let whole = match caps.get(0) {
            Some(m) => m,
            None => break,
        };
        if whole.is_empty() && first {
            return Err(TransformError::ZeroLengthMatch(pattern.to_string()));
        }
        first = false;

        if whole.start() > gap_start {
            pieces.push(Piece::Gap(input[gap_start..whole.start()].to_string()));
        }

        let groups: Vec<Option<String>> = (0..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
            .collect();
        let named = names
            .iter()
            .flatten()
            .map(|name| {
                (
                    name.to_string(),
                    caps.name(name).map(|m| m.as_str().to_string()),
                )
            })
            .collect();
        pieces.push(Piece::Match(Captured {
            text: whole.as_str().to_string(),
            groups,
            named,
        }));

        gap_start = whole.end();
        if whole.end() > cursor {
            cursor = whole.end();
        } else {
            // Zero-length match: step the search over one character. The
            // character stays pending for the following gap.
            cursor += input[cursor..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
        }
    }

    if gap_start < input.len() {
        pieces.push(Piece::Gap(input[gap_start..].to_string()));
    }
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternates_gaps_and_matches() {
        let pieces = analyze("a1b2c3", r"\d", "").unwrap();
        let rendered: String = pieces
            .iter()
            .map(|p| match p {
                Piece::Gap(g) => g.clone(),
                Piece::Match(m) => format!("[{}]", m.text),
            })
            .collect();
        assert_eq!(rendered, "a[1]b[2]c[3]");
    }

    #[test]
    fn exposes_positional_and_named_groups() {
        let pieces = analyze("x=1", r"(?P<key>\w+)=(\d+)", "").unwrap();
        let m = pieces
            .iter()
            .find_map(|p| match p {
                Piece::Match(m) => Some(m),
                _ => None,
            })
            .unwrap();
        assert_eq!(m.group(0), Some("x=1"));
        assert_eq!(m.group(2), Some("1"));
        assert_eq!(m.named_group("key"), Some("x"));
    }

    #[test]
    fn first_zero_length_match_raises() {
        assert!(matches!(
            analyze("abc", r"x?", ""),
            Err(TransformError::ZeroLengthMatch(_))
        ));
    }

    #[test]
    fn later_zero_length_matches_advance() {
        // The first match is non-empty; later positions yield empty
        // matches and the search steps over them instead of raising.
        let pieces = analyze("ab", r"a|x?", "").unwrap();
        assert!(pieces.iter().any(|p| matches!(p, Piece::Match(m) if m.text.is_empty())));
        // Every input character still lands in some piece.
        let rendered: String = pieces
            .iter()
            .map(|p| match p {
                Piece::Gap(g) => g.as_str(),
                Piece::Match(m) => m.text.as_str(),
            })
            .collect();
        assert_eq!(rendered, "ab");
    }

    #[test]
    fn case_insensitive_flag() {
        let pieces = analyze("aAa", "A", "i").unwrap();
        let matches = pieces
            .iter()
            .filter(|p| matches!(p, Piece::Match(_)))
            .count();
        assert_eq!(matches, 3);
    }

    #[test]
    fn trailing_gap_is_reported() {
        let pieces = analyze("1ab", r"\d", "").unwrap();
        assert_eq!(
            pieces,
            vec![
                Piece::Match(Captured {
                    text: "1".to_string(),
                    groups: vec![Some("1".to_string())],
                    named: HashMap::new(),
                }),
                Piece::Gap("ab".to_string()),
            ]
        );
    }
}
