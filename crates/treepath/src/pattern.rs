//! Compiled match patterns: does a given node match `chapter/para[2]`?
//!
//! Patterns are a restricted form of location path evaluated right-to-left
//! from the candidate node, so matching never requires searching the tree.
use crate::ast::{Axis, LocationPath, NodeTest, Predicate, Step};
use crate::engine::node_test_matches;
use crate::error::TreePathError;
use crate::node::{NodeType, TreeNode};
use crate::parser;
use std::fmt;

/// A compiled match pattern. A pattern can be a union of several location
/// paths, e.g. `para|note`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    paths: Vec<LocationPath>,
    original: String,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl Pattern {
    pub fn parse(text: &str) -> Result<Self, TreePathError> {
        let mut paths = Vec::new();
        for part in text.split('|') {
            let path = parser::parse_path(part)?;
            for step in &path.steps {
                if matches!(step.axis, Axis::SelfAxis | Axis::Parent) {
                    return Err(TreePathError::Parse(
                        text.to_string(),
                        "'.' and '..' steps are not allowed in match patterns".to_string(),
                    ));
                }
            }
            paths.push(path);
        }
        Ok(Pattern {
            paths,
            original: text.to_string(),
        })
    }

    /// True when `node` matches any of the union's paths.
    pub fn matches<'a, N: TreeNode<'a>>(&self, node: N, root: N) -> bool {
        self.paths.iter().any(|p| path_matches(p, node, root))
    }
}

fn path_matches<'a, N: TreeNode<'a>>(path: &LocationPath, node: N, root: N) -> bool {
    if path.steps.is_empty() {
        // "/" alone.
        return path.is_absolute && node == root;
    }
    match_steps(&path.steps, Some(node), path.is_absolute, root)
}

/// Matches `steps` against the ancestor chain ending at `current`,
/// right-to-left, so matching never walks more than the node's ancestry.
fn match_steps<'a, N: TreeNode<'a>>(
    steps: &[Step],
    current: Option<N>,
    is_absolute: bool,
    root: N,
) -> bool {
    let Some((last, rest)) = steps.split_last() else {
        return !is_absolute || current == Some(root);
    };

    if last.axis == Axis::Descendant {
        // The any-descendant marker: the rest of the pattern may match at
        // this node or at any of its ancestors.
        let mut cursor = current;
        loop {
            if match_steps(rest, cursor, is_absolute, root) {
                return true;
            }
            match cursor {
                Some(n) => cursor = n.parent(),
                None => return false,
            }
        }
    }

    let Some(node) = current else {
        return false;
    };
    if !step_matches(last, node) {
        return false;
    }
    match_steps(rest, node.parent(), is_absolute, root)
}

fn step_matches<'a, N: TreeNode<'a>>(step: &Step, node: N) -> bool {
    match step.axis {
        Axis::Attribute => {
            if node.node_type() != NodeType::Attribute {
                return false;
            }
        }
        Axis::Child => {
            // The child axis in patterns can match elements, text nodes,
            // comments, processing instructions — anything below an element.
            if node.node_type() == NodeType::Attribute {
                return false;
            }
            // Root is never reached by a child step.
            if node.node_type() == NodeType::Root {
                return false;
            }
        }
        _ => return false,
    }

    if !node_test_matches(node, &step.node_test, step.axis) {
        return false;
    }

    step.predicates.iter().all(|p| predicate_holds(p, node, step))
}

fn predicate_holds<'a, N: TreeNode<'a>>(pred: &Predicate, node: N, step: &Step) -> bool {
    match pred {
        Predicate::Position(p) => {
            let Some(parent) = node.parent() else {
                return *p == 1;
            };
            let position = parent
                .children()
                .take_while(|sib| *sib != node)
                .filter(|sib| node_test_matches(*sib, &step.node_test, step.axis))
                .count()
                + 1;
            position == *p
        }
        Predicate::AttributeEquals(name, value) => node
            .attributes()
            .any(|a| a.name().is_some_and(|q| q.local == name) && a.string_value() == *value),
        Predicate::HasChild(name) => node
            .children()
            .any(|c| c.name().is_some_and(|q| q.local == name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::mock::sample_tree;

    #[test]
    fn parses_common_patterns() {
        assert!(Pattern::parse("para").is_ok());
        assert!(Pattern::parse("/").is_ok());
        assert!(Pattern::parse("/*").is_ok());
        assert!(Pattern::parse("chapter/para").is_ok());
        assert!(Pattern::parse("para|title").is_ok());
        assert!(Pattern::parse("//para").is_ok());
        assert!(Pattern::parse("@id").is_ok());
        assert!(Pattern::parse("..").is_err());
    }

    #[test]
    fn name_and_path_matching() {
        let tree = sample_tree();
        let root = tree.node(0);
        let para = tree.node(5);
        let title = tree.node(3);

        assert!(Pattern::parse("para").unwrap().matches(para, root));
        assert!(!Pattern::parse("para").unwrap().matches(title, root));
        assert!(Pattern::parse("chapter/para").unwrap().matches(para, root));
        assert!(!Pattern::parse("appendix/para").unwrap().matches(para, root));
    }

    #[test]
    fn absolute_anchoring() {
        let tree = sample_tree();
        let root = tree.node(0);
        let chapter = tree.node(1);
        let para = tree.node(5);

        assert!(Pattern::parse("/").unwrap().matches(root, root));
        assert!(!Pattern::parse("/").unwrap().matches(chapter, root));
        assert!(Pattern::parse("/chapter").unwrap().matches(chapter, root));
        assert!(!Pattern::parse("/para").unwrap().matches(para, root));
    }

    #[test]
    fn descendant_marker_skips_levels() {
        let tree = sample_tree();
        let root = tree.node(0);
        let para = tree.node(5);
        let text = tree.node(6);

        assert!(Pattern::parse("//para").unwrap().matches(para, root));
        assert!(Pattern::parse("/chapter//text()").unwrap().matches(text, root));
        assert!(!Pattern::parse("/appendix//text()").unwrap().matches(text, root));
    }

    #[test]
    fn positional_predicate() {
        let tree = sample_tree();
        let root = tree.node(0);
        let first = tree.node(5);
        let second = tree.node(7);

        let p = Pattern::parse("para[2]").unwrap();
        assert!(!p.matches(first, root));
        assert!(p.matches(second, root));
    }

    #[test]
    fn union_and_attributes() {
        let tree = sample_tree();
        let root = tree.node(0);
        let attr = tree.node(2);
        let title = tree.node(3);

        assert!(Pattern::parse("missing|title").unwrap().matches(title, root));
        assert!(Pattern::parse("@id").unwrap().matches(attr, root));
        assert!(!Pattern::parse("@id").unwrap().matches(title, root));
    }
}
