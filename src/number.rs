//! Position calculation and number formatting for `number()`.
use crate::engine::NodeAdapter;
use crate::error::TransformError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// How positions are derived from the tree when no explicit value is
/// given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberLevel {
    /// Position among matching preceding siblings.
    #[default]
    Single,
    /// A hierarchical chain of positions, outermost first.
    Multiple,
    /// A flat count across the whole scope, ignoring hierarchy.
    Any,
}

/// The argument to `number()`. Deserializable, so specs can sit in
/// declarative template configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NumberSpec {
    /// An explicit value; positions are not calculated when set.
    pub value: Option<i64>,
    /// The pattern counted nodes must match. Defaults to nodes of the same
    /// kind as the context node.
    pub count: Option<String>,
    /// An ancestor pattern bounding the counting scope.
    pub from: Option<String>,
    pub level: NumberLevel,
    /// Format token: `1` (optionally zero-padded), `a`, `A`, `i`, `I`.
    /// Anything unrecognized renders as plain decimal.
    pub format: Option<String>,
    pub grouping_separator: Option<String>,
    pub grouping_size: Option<usize>,
}

impl NumberSpec {
    pub fn value(value: i64) -> Self {
        NumberSpec {
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }
}

/// Whether `node` counts, per the spec's `count` pattern or, absent one,
/// same-kindness with the context node.
fn counts<A: NodeAdapter>(
    adapter: &A,
    spec: &NumberSpec,
    context: &A::Node,
    node: &A::Node,
) -> Result<bool, TransformError> {
    match &spec.count {
        Some(pattern) => adapter.matches(pattern, node),
        None => Ok(adapter.same_kind(context, node)),
    }
}

/// One-based position of `node` among its matching preceding siblings.
fn sibling_position<A: NodeAdapter>(
    adapter: &A,
    spec: &NumberSpec,
    context: &A::Node,
    node: &A::Node,
) -> Result<i64, TransformError> {
    let mut position = 1;
    if let Some(parent) = adapter.parent(node) {
        for sibling in adapter.children(&parent) {
            if sibling == *node {
                break;
            }
            if counts(adapter, spec, context, &sibling)? {
                position += 1;
            }
        }
    }
    Ok(position)
}

/// The ancestor-or-self chain of `node`, outermost first, stopping below
/// the nearest ancestor matching `from` (when given).
fn counting_chain<A: NodeAdapter>(
    adapter: &A,
    spec: &NumberSpec,
    node: &A::Node,
) -> Result<Vec<A::Node>, TransformError> {
    let mut chain = vec![node.clone()];
    let mut current = node.clone();
    while let Some(parent) = adapter.parent(&current) {
        if let Some(from) = &spec.from {
            if adapter.matches(from, &parent)? {
                break;
            }
        }
        chain.push(parent.clone());
        current = parent;
    }
    chain.reverse();
    Ok(chain)
}

/// Calculates the position vector for a node: one entry for level
/// `Single`/`Any`, one per counted ancestor level for `Multiple`.
pub fn calculate_position<A: NodeAdapter>(
    adapter: &A,
    spec: &NumberSpec,
    node: &A::Node,
) -> Result<Vec<i64>, TransformError> {
    match spec.level {
        NumberLevel::Single => {
            // The nearest ancestor-or-self that counts is the one whose
            // sibling position is reported.
            let mut target = node.clone();
            loop {
                if counts(adapter, spec, node, &target)? {
                    break;
                }
                match adapter.parent(&target) {
                    Some(parent) => target = parent,
                    None => break,
                }
            }
            Ok(vec![sibling_position(adapter, spec, node, &target)?])
        }
        NumberLevel::Multiple => {
            let mut positions = Vec::new();
            for ancestor in counting_chain(adapter, spec, node)? {
                if counts(adapter, spec, node, &ancestor)? {
                    positions.push(sibling_position(adapter, spec, node, &ancestor)?);
                }
            }
            if positions.is_empty() {
                positions.push(1);
            }
            Ok(positions)
        }
        NumberLevel::Any => {
            // Count matching nodes up to and including this one, in
            // document order, within the `from` scope.
            let scope_root = match &spec.from {
                Some(from) => {
                    let mut current = node.clone();
                    loop {
                        if adapter.matches(from, &current)? {
                            break current;
                        }
                        match adapter.parent(&current) {
                            Some(parent) => current = parent,
                            None => break current,
                        }
                    }
                }
                None => adapter.root(),
            };
            let mut count = 0;
            count_until(adapter, spec, node, &scope_root, node, &mut count)?;
            Ok(vec![count.max(1)])
        }
    }
}

/// Depth-first walk counting matches until `target` is passed. Returns
/// true once the target has been visited.
fn count_until<A: NodeAdapter>(
    adapter: &A,
    spec: &NumberSpec,
    context: &A::Node,
    current: &A::Node,
    target: &A::Node,
    count: &mut i64,
) -> Result<bool, TransformError> {
    if counts(adapter, spec, context, current)? {
        *count += 1;
    }
    if current == target {
        return Ok(true);
    }
    for child in adapter.children(current) {
        if count_until(adapter, spec, context, &child, target, count)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Renders a position vector per the format mini-language. Hierarchical
/// positions join with `.`.
pub fn format_positions(positions: &[i64], spec: &NumberSpec) -> String {
    let token = spec.format.as_deref().unwrap_or("1");
    positions
        .iter()
        .map(|&p| format_integer(p, token, spec))
        .join(".")
}

fn format_integer(n: i64, token: &str, spec: &NumberSpec) -> String {
    match token {
        "a" => alphabetic(n, false),
        "A" => alphabetic(n, true),
        "i" => roman(n, false),
        "I" => roman(n, true),
        _ => {
            // A run of leading zeros sets the minimum width; anything
            // unrecognized falls back to plain decimal.
            let width = if token.starts_with('0') && token.ends_with('1') {
                token.len()
            } else {
                0
            };
            decimal(n, width, spec)
        }
    }
}

fn decimal(n: i64, width: usize, spec: &NumberSpec) -> String {
    let digits = format!("{:0width$}", n, width = width);
    match (&spec.grouping_separator, spec.grouping_size) {
        (Some(sep), Some(size)) if size > 0 => group_digits(&digits, sep, size),
        _ => digits,
    }
}

/// Inserts `sep` every `size` digits, counting from the right.
fn group_digits(digits: &str, sep: &str, size: usize) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::new();
    for (i, c) in chars.iter().enumerate() {
        let remaining = chars.len() - i;
        if i > 0 && remaining % size == 0 && c.is_ascii_digit() {
            out.push_str(sep);
        }
        out.push(*c);
    }
    out
}

/// Alphabetic numbering: 1..=26 are a..z, then aa, ab, and so on.
fn alphabetic(n: i64, upper: bool) -> String {
    if n < 1 {
        return n.to_string();
    }
    let base = if upper { b'A' } else { b'a' };
    let mut out = Vec::new();
    let mut n = n;
    while n > 0 {
        n -= 1;
        out.push((base + (n % 26) as u8) as char);
        n /= 26;
    }
    out.reverse();
    out.into_iter().collect()
}

const ROMAN: &[(i64, &str)] = &[
    (1000, "m"),
    (900, "cm"),
    (500, "d"),
    (400, "cd"),
    (100, "c"),
    (90, "xc"),
    (50, "l"),
    (40, "xl"),
    (10, "x"),
    (9, "ix"),
    (5, "v"),
    (4, "iv"),
    (1, "i"),
];

/// Roman numerals; values outside 1..=3999 render as plain decimal.
fn roman(n: i64, upper: bool) -> String {
    if !(1..=3999).contains(&n) {
        return n.to_string();
    }
    let mut out = String::new();
    let mut n = n;
    for &(value, glyph) in ROMAN {
        while n >= value {
            if upper {
                out.push_str(&glyph.to_uppercase());
            } else {
                out.push_str(glyph);
            }
            n -= value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(n: i64, token: &str) -> String {
        format_integer(n, token, &NumberSpec::default())
    }

    #[test]
    fn roman_formats() {
        assert_eq!(fmt(9, "i"), "ix");
        assert_eq!(fmt(14, "I"), "XIV");
        assert_eq!(fmt(1987, "I"), "MCMLXXXVII");
        // Out of range falls back to decimal.
        assert_eq!(fmt(4000, "i"), "4000");
        assert_eq!(fmt(0, "I"), "0");
    }

    #[test]
    fn alphabetic_formats() {
        assert_eq!(fmt(1, "a"), "a");
        assert_eq!(fmt(26, "a"), "z");
        assert_eq!(fmt(27, "a"), "aa");
        assert_eq!(fmt(28, "A"), "AB");
        assert_eq!(fmt(703, "a"), "aaa");
    }

    #[test]
    fn zero_padding_and_grouping() {
        assert_eq!(fmt(7, "01"), "07");
        assert_eq!(fmt(7, "001"), "007");
        let spec = NumberSpec {
            grouping_separator: Some(",".to_string()),
            grouping_size: Some(3),
            ..Default::default()
        };
        assert_eq!(format_integer(1234567, "1", &spec), "1,234,567");
    }

    #[test]
    fn unknown_formats_fall_back_to_decimal() {
        assert_eq!(fmt(42, "w"), "42");
        assert_eq!(fmt(42, "latin"), "42");
    }

    #[test]
    fn hierarchical_positions_join_with_dots() {
        let spec = NumberSpec::default().with_format("1");
        assert_eq!(format_positions(&[2, 1, 3], &spec), "2.1.3");
    }
}
