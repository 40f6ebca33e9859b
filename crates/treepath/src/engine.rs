//! Evaluation of tree-path expressions against a [`TreeNode`] tree.
use crate::ast::{Axis, Expression, LocationPath, NodeTest, Predicate, Step};
use crate::error::TreePathError;
use crate::node::{NodeType, TreeNode};
use std::collections::HashMap;
use std::marker::PhantomData;

/// The evaluator tier in use. The parser accepts the same grammar for every
/// tier; the higher tier unlocks additional functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Version {
    #[default]
    One,
    Three,
}

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum PathValue<N> {
    Nodes(Vec<N>),
    Str(String),
    Number(f64),
    Bool(bool),
}

impl<'a, N: TreeNode<'a>> PathValue<N> {
    /// Boolean coercion: a node set is true when non-empty, scalars follow
    /// their own truthiness.
    pub fn to_bool(&self) -> bool {
        match self {
            PathValue::Nodes(nodes) => !nodes.is_empty(),
            PathValue::Str(s) => !s.is_empty(),
            PathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            PathValue::Bool(b) => *b,
        }
    }

    /// String coercion: the string value of the first node, or the scalar
    /// rendered as text.
    pub fn into_string(self) -> String {
        match self {
            PathValue::Nodes(nodes) => nodes
                .first()
                .map(|n| n.string_value())
                .unwrap_or_default(),
            PathValue::Str(s) => s,
            PathValue::Number(n) => format_number(n),
            PathValue::Bool(b) => b.to_string(),
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            PathValue::Number(n) => *n,
            PathValue::Str(s) => s.trim().parse().unwrap_or(f64::NAN),
            PathValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            PathValue::Nodes(nodes) => nodes
                .first()
                .map(|n| n.string_value().trim().parse().unwrap_or(f64::NAN))
                .unwrap_or(f64::NAN),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Everything an evaluation needs to know about its surroundings.
pub struct EvaluationContext<'v, 'a, N: TreeNode<'a>> {
    pub context_node: N,
    pub root: N,
    pub variables: &'v HashMap<String, String>,
    /// One-based position of the context node in the current node list.
    pub position: usize,
    pub size: usize,
    pub version: Version,
    _lifetime: PhantomData<&'a ()>,
}

impl<'v, 'a, N: TreeNode<'a>> EvaluationContext<'v, 'a, N> {
    pub fn new(
        context_node: N,
        root: N,
        variables: &'v HashMap<String, String>,
        position: usize,
        size: usize,
        version: Version,
    ) -> Self {
        Self {
            context_node,
            root,
            variables,
            position,
            size,
            version,
            _lifetime: PhantomData,
        }
    }
}

/// Evaluates a parsed expression.
pub fn evaluate<'v, 'a, N: TreeNode<'a>>(
    expr: &Expression,
    ctx: &EvaluationContext<'v, 'a, N>,
) -> Result<PathValue<N>, TreePathError> {
    match expr {
        Expression::Literal(s) => Ok(PathValue::Str(s.clone())),
        Expression::Number(n) => Ok(PathValue::Number(*n)),
        Expression::Variable(name) => ctx
            .variables
            .get(name)
            .map(|v| PathValue::Str(v.clone()))
            .ok_or_else(|| TreePathError::UnknownVariable(name.clone())),
        Expression::Path(path) => Ok(PathValue::Nodes(select_path(path, ctx)?)),
        Expression::FunctionCall { name, args } => {
            let evaluated = args
                .iter()
                .map(|a| evaluate(a, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            call_function(name, evaluated, ctx)
        }
    }
}

/// Selects the node set a location path denotes.
pub fn select_path<'v, 'a, N: TreeNode<'a>>(
    path: &LocationPath,
    ctx: &EvaluationContext<'v, 'a, N>,
) -> Result<Vec<N>, TreePathError> {
    let mut current = if path.is_absolute {
        vec![ctx.root]
    } else {
        vec![ctx.context_node]
    };

    for step in &path.steps {
        let mut next = Vec::new();
        for node in current {
            let mut candidates: Vec<N> = axis_nodes(node, step.axis)
                .into_iter()
                .filter(|n| node_test_matches(*n, &step.node_test, step.axis))
                .collect();
            for pred in &step.predicates {
                candidates = apply_predicate(&candidates, pred);
            }
            next.extend(candidates);
        }
        next.dedup();
        current = next;
    }
    Ok(current)
}

fn axis_nodes<'a, N: TreeNode<'a>>(node: N, axis: Axis) -> Vec<N> {
    match axis {
        Axis::Child => node.children().collect(),
        Axis::Attribute => node.attributes().collect(),
        Axis::SelfAxis => vec![node],
        Axis::Parent => node.parent().into_iter().collect(),
        Axis::Descendant => {
            // Descendant-or-self, document order.
            let mut out = vec![node];
            collect_descendants(node, &mut out);
            out
        }
    }
}

fn collect_descendants<'a, N: TreeNode<'a>>(node: N, out: &mut Vec<N>) {
    for child in node.children() {
        out.push(child);
        collect_descendants(child, out);
    }
}

pub(crate) fn node_test_matches<'a, N: TreeNode<'a>>(
    node: N,
    test: &NodeTest,
    axis: Axis,
) -> bool {
    match test {
        NodeTest::AnyNode => true,
        NodeTest::Text => node.node_type() == NodeType::Text,
        NodeTest::Comment => node.node_type() == NodeType::Comment,
        NodeTest::ProcessingInstruction => {
            node.node_type() == NodeType::ProcessingInstruction
        }
        NodeTest::Wildcard => match axis {
            Axis::Attribute => node.node_type() == NodeType::Attribute,
            _ => node.node_type() == NodeType::Element,
        },
        NodeTest::Name(test_name) => node.name().is_some_and(|q| {
            if let Some((prefix, local)) = test_name.split_once(':') {
                q.prefix == Some(prefix) && q.local == local
            } else {
                q.local == test_name
            }
        }),
    }
}

fn apply_predicate<'a, N: TreeNode<'a>>(candidates: &[N], pred: &Predicate) -> Vec<N> {
    match pred {
        Predicate::Position(p) => candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| i + 1 == *p)
            .map(|(_, n)| *n)
            .collect(),
        Predicate::AttributeEquals(name, value) => candidates
            .iter()
            .filter(|n| {
                n.attributes()
                    .any(|a| a.name().is_some_and(|q| q.local == name) && a.string_value() == *value)
            })
            .copied()
            .collect(),
        Predicate::HasChild(name) => candidates
            .iter()
            .filter(|n| {
                n.children()
                    .any(|c| c.name().is_some_and(|q| q.local == name))
            })
            .copied()
            .collect(),
    }
}

// --- Functions ---

fn call_function<'v, 'a, N: TreeNode<'a>>(
    name: &str,
    args: Vec<PathValue<N>>,
    ctx: &EvaluationContext<'v, 'a, N>,
) -> Result<PathValue<N>, TreePathError> {
    match name {
        "position" => Ok(PathValue::Number(ctx.position as f64)),
        "last" => Ok(PathValue::Number(ctx.size as f64)),
        "true" => Ok(PathValue::Bool(true)),
        "false" => Ok(PathValue::Bool(false)),
        "not" => Ok(PathValue::Bool(
            !args.first().map(|v| v.to_bool()).unwrap_or(false),
        )),
        "count" => match args.into_iter().next() {
            Some(PathValue::Nodes(nodes)) => Ok(PathValue::Number(nodes.len() as f64)),
            _ => Err(TreePathError::TypeError(
                "count() expects a node set".to_string(),
            )),
        },
        "name" => {
            let node = match args.into_iter().next() {
                Some(PathValue::Nodes(nodes)) => nodes.into_iter().next(),
                None => Some(ctx.context_node),
                _ => None,
            };
            Ok(PathValue::Str(
                node.and_then(|n| n.name())
                    .map(|q| q.to_string())
                    .unwrap_or_default(),
            ))
        }
        "string" => Ok(PathValue::Str(
            args.into_iter().next().map(|v| v.into_string()).unwrap_or_default(),
        )),
        "concat" => Ok(PathValue::Str(
            args.into_iter().map(|v| v.into_string()).collect(),
        )),
        "contains" => {
            let mut it = args.into_iter();
            let haystack = it.next().map(|v| v.into_string()).unwrap_or_default();
            let needle = it.next().map(|v| v.into_string()).unwrap_or_default();
            Ok(PathValue::Bool(haystack.contains(&needle)))
        }
        "upper-case" | "lower-case" | "string-join" => {
            if ctx.version != Version::Three {
                return Err(TreePathError::VersionGate {
                    name: name.to_string(),
                    required: 3,
                });
            }
            call_tier_three(name, args)
        }
        other => Err(TreePathError::UnknownFunction(other.to_string())),
    }
}

fn call_tier_three<'a, N: TreeNode<'a>>(
    name: &str,
    args: Vec<PathValue<N>>,
) -> Result<PathValue<N>, TreePathError> {
    match name {
        "upper-case" => Ok(PathValue::Str(
            args.into_iter()
                .next()
                .map(|v| v.into_string().to_uppercase())
                .unwrap_or_default(),
        )),
        "lower-case" => Ok(PathValue::Str(
            args.into_iter()
                .next()
                .map(|v| v.into_string().to_lowercase())
                .unwrap_or_default(),
        )),
        "string-join" => {
            let mut it = args.into_iter();
            let items = match it.next() {
                Some(PathValue::Nodes(nodes)) => {
                    nodes.iter().map(|n| n.string_value()).collect::<Vec<_>>()
                }
                Some(other) => vec![other.into_string()],
                None => vec![],
            };
            let sep = it.next().map(|v| v.into_string()).unwrap_or_default();
            Ok(PathValue::Str(items.join(&sep)))
        }
        _ => unreachable!("gated above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::mock::sample_tree;
    use crate::parser::parse_expression;

    fn eval<'v, 'a, N: TreeNode<'a>>(
        expr: &str,
        ctx: &EvaluationContext<'v, 'a, N>,
    ) -> PathValue<N> {
        evaluate(&parse_expression(expr).unwrap(), ctx).unwrap()
    }

    #[test]
    fn selects_children_by_name() {
        let tree = sample_tree();
        let vars = HashMap::new();
        let ctx =
            EvaluationContext::new(tree.node(1), tree.node(0), &vars, 1, 1, Version::One);
        let PathValue::Nodes(nodes) = eval("para", &ctx) else {
            panic!("expected nodes");
        };
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn descendant_separator_finds_deep_nodes() {
        let tree = sample_tree();
        let vars = HashMap::new();
        let ctx =
            EvaluationContext::new(tree.node(0), tree.node(0), &vars, 1, 1, Version::One);
        let PathValue::Nodes(nodes) = eval("//para", &ctx) else {
            panic!("expected nodes");
        };
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn position_predicate_selects_one() {
        let tree = sample_tree();
        let vars = HashMap::new();
        let ctx =
            EvaluationContext::new(tree.node(1), tree.node(0), &vars, 1, 1, Version::One);
        let PathValue::Nodes(nodes) = eval("para[2]", &ctx) else {
            panic!("expected nodes");
        };
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].string_value(), "Second");
    }

    #[test]
    fn attribute_predicate_and_axis() {
        let tree = sample_tree();
        let vars = HashMap::new();
        let ctx =
            EvaluationContext::new(tree.node(0), tree.node(0), &vars, 1, 1, Version::One);
        let PathValue::Nodes(nodes) = eval("chapter[@id='c1']/title", &ctx) else {
            panic!("expected nodes");
        };
        assert_eq!(nodes.len(), 1);

        let PathValue::Nodes(attrs) = eval("chapter/@id", &ctx) else {
            panic!("expected nodes");
        };
        assert_eq!(attrs[0].string_value(), "c1");
    }

    #[test]
    fn core_functions() {
        let tree = sample_tree();
        let vars = HashMap::new();
        let ctx =
            EvaluationContext::new(tree.node(1), tree.node(0), &vars, 1, 1, Version::One);
        assert_eq!(eval("count(para)", &ctx), PathValue::Number(2.0));
        assert_eq!(
            eval("concat('a', 'b')", &ctx),
            PathValue::Str("ab".to_string())
        );
        assert!(eval("not(appendix)", &ctx).to_bool());
    }

    #[test]
    fn tier_three_functions_are_gated() {
        let tree = sample_tree();
        let vars = HashMap::new();
        let v1 = EvaluationContext::new(tree.node(1), tree.node(0), &vars, 1, 1, Version::One);
        let expr = parse_expression("upper-case('abc')").unwrap();
        assert!(matches!(
            evaluate(&expr, &v1),
            Err(TreePathError::VersionGate { .. })
        ));

        let v3 =
            EvaluationContext::new(tree.node(1), tree.node(0), &vars, 1, 1, Version::Three);
        assert_eq!(
            evaluate(&expr, &v3).unwrap(),
            PathValue::Str("ABC".to_string())
        );
    }
}
