//! The shared matching engine.
//!
//! Template dispatch, priority resolution, and the default no-match rules
//! are identical for both transformation flavors; everything
//! flavor-specific sits behind the [`NodeAdapter`] capability trait, which
//! is the only surface the engine (and the context built on it) uses to
//! talk to a source tree.
use crate::error::TransformError;
use crate::joiner::JoiningTransformer;
use crate::mode::{ModeConfig, OnMultipleMatch};
use crate::template::Template;
use itertools::Itertools;
use serde_json::Value;
use std::collections::HashMap;

/// The runtime-detected shape of a node, driving the default rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    /// The document root.
    Root,
    /// A structural node with named children (object, element).
    Branch,
    /// An ordered collection (array).
    List,
    /// A text or primitive leaf.
    Leaf,
    /// Anything else (comments, processing instructions, functions).
    Other,
}

/// Variable bindings and loop position visible to expression evaluation.
pub struct EvalScope<'a> {
    pub variables: &'a HashMap<String, Value>,
    /// Zero-based position within the enclosing iteration, if any.
    pub loop_position: Option<usize>,
}

/// The capability set a source-tree flavor provides to the engine.
pub trait NodeAdapter {
    type Node: Clone + PartialEq;

    fn root(&self) -> Self::Node;

    /// The pattern that matches exactly the document root in this flavor's
    /// dialect.
    fn root_pattern(&self) -> &'static str;

    /// Evaluates an expression to a single value.
    fn evaluate(
        &self,
        expr: &str,
        node: &Self::Node,
        scope: &EvalScope<'_>,
    ) -> Result<Value, TransformError>;

    /// Evaluates an expression as a boolean test: node-set non-emptiness,
    /// or scalar truthiness.
    fn evaluate_bool(
        &self,
        expr: &str,
        node: &Self::Node,
        scope: &EvalScope<'_>,
    ) -> Result<bool, TransformError>;

    /// Evaluates a selection expression to the node set it denotes.
    fn select(
        &self,
        expr: &str,
        node: &Self::Node,
        scope: &EvalScope<'_>,
    ) -> Result<Vec<Self::Node>, TransformError>;

    /// Whether `node` is a member of the node set `pattern` denotes.
    fn matches(&self, pattern: &str, node: &Self::Node) -> Result<bool, TransformError>;

    fn shape(&self, node: &Self::Node) -> NodeShape;

    /// Whether the text-only default rule descends into `Branch` nodes.
    /// Tree elements surface the text of their subtree; JSON objects
    /// contribute nothing.
    fn branch_text(&self) -> bool {
        true
    }

    fn text_content(&self, node: &Self::Node) -> String;
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Whether two nodes are of the same kind for position counting: same
    /// element name, or same property key / array membership.
    fn same_kind(&self, a: &Self::Node, b: &Self::Node) -> bool;

    /// The node's name, where it has one.
    fn node_name(&self, node: &Self::Node) -> Option<String>;

    /// Emits the node itself, without children, to the accumulator.
    fn shallow_copy(
        &self,
        node: &Self::Node,
        out: &mut dyn JoiningTransformer,
    ) -> Result<(), TransformError>;

    /// Emits the node's whole subtree verbatim to the accumulator.
    fn deep_copy(
        &self,
        node: &Self::Node,
        out: &mut dyn JoiningTransformer,
    ) -> Result<(), TransformError>;
}

/// Picks the template for a node under a mode, applying the priority rules
/// and the active conflict policy.
///
/// Returns the index of the winning template, or `None` when no template
/// matched (the caller falls back to the default rules).
pub fn find_template<A: NodeAdapter>(
    templates: &[Template<A>],
    adapter: &A,
    node: &A::Node,
    mode: Option<&str>,
    resolve_priority: &dyn Fn(&str) -> f64,
    config: &ModeConfig,
) -> Result<Option<usize>, TransformError> {
    // (index, pattern, priority) of every matching template, declaration
    // order preserved.
    let mut matches: Vec<(usize, &str, f64)> = Vec::new();
    for (index, template) in templates.iter().enumerate() {
        if template.mode.as_deref() != mode {
            continue;
        }
        let Some(pattern) = template.pattern.as_deref() else {
            continue;
        };
        if adapter.matches(pattern, node)? {
            let priority = template
                .priority
                .unwrap_or_else(|| resolve_priority(pattern));
            matches.push((index, pattern, priority));
        }
    }

    let Some(&(_, _, best)) = matches
        .iter()
        .max_by(|a, b| a.2.total_cmp(&b.2))
    else {
        return Ok(None);
    };

    // Even where priorities resolve the dispatch, overlapping patterns are
    // worth a warning.
    if matches.len() > 1 && config.warning_on_multiple_match {
        log::warn!(
            "{} templates match: {}",
            matches.len(),
            matches
                .iter()
                .map(|(_, pattern, priority)| format!("{} (priority {})", pattern, priority))
                .join(", ")
        );
    }

    let winners: Vec<&(usize, &str, f64)> =
        matches.iter().filter(|(_, _, p)| *p == best).collect();

    if winners.len() > 1 && config.on_multiple_match == OnMultipleMatch::Fail {
        return Err(TransformError::EqualPriorityConflict {
            first: winners[0].1.to_string(),
            second: winners[1].1.to_string(),
            priority: best,
        });
    }

    // Ties resolve in favor of the first-declared winner.
    Ok(winners.first().map(|(index, _, _)| *index))
}
