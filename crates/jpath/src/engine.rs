//! Evaluation of JSON path expressions.
//!
//! Two entry points: [`evaluate`] produces one owned value (the first
//! selected, for paths), and [`select`] produces every selected value
//! together with its [`Location`], which is what pattern-membership tests
//! are built on.
use crate::ast::{Expression, Location, PathSegment, Selection};
use crate::error::JPathError;
use crate::functions::FunctionRegistry;
use serde_json::Value;
use std::collections::HashMap;

/// Everything an evaluation needs to know about its surroundings.
pub struct EvaluationContext<'v> {
    /// The node the expression is anchored at. `$` denotes this node.
    pub context_node: &'v Value,
    pub variables: &'v HashMap<String, Value>,
    pub functions: &'v FunctionRegistry,
    /// Zero-based position within the enclosing iteration, if any.
    pub loop_position: Option<usize>,
}

/// Evaluates an expression to a single owned value. Paths yield the first
/// selected value, or `Null` when nothing matches.
pub fn evaluate(expr: &Expression, ctx: &EvaluationContext<'_>) -> Result<Value, JPathError> {
    match expr {
        Expression::Literal(v) => Ok(v.clone()),
        Expression::FunctionCall { name, args } => {
            let func = ctx
                .functions
                .get(name)
                .ok_or_else(|| JPathError::UnknownFunction(name.clone()))?;
            let evaluated = args
                .iter()
                .map(|a| evaluate(a, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            func(ctx, evaluated)
        }
        Expression::Selection(sel) => Ok(select_values(sel, ctx)?
            .into_iter()
            .next()
            .cloned()
            .unwrap_or(Value::Null)),
    }
}

/// Evaluates an expression and coerces to a string.
pub fn evaluate_as_string(
    expr: &Expression,
    ctx: &EvaluationContext<'_>,
) -> Result<String, JPathError> {
    Ok(value_to_string(&evaluate(expr, ctx)?))
}

/// The truthiness test templates use: a selection is true when it matched
/// at least one value, a scalar follows its own truthiness.
pub fn evaluate_as_bool(
    expr: &Expression,
    ctx: &EvaluationContext<'_>,
) -> Result<bool, JPathError> {
    match expr {
        Expression::Selection(sel) => Ok(!select_values(sel, ctx)?.is_empty()),
        _ => Ok(value_truthy(&evaluate(expr, ctx)?)),
    }
}

pub fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

pub fn value_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Selects values with their locations. The returned locations are relative
/// to the context node; callers anchored at the document root therefore get
/// absolute locations.
pub fn select<'v>(
    expr: &Expression,
    ctx: &EvaluationContext<'v>,
) -> Result<Vec<(Location, &'v Value)>, JPathError> {
    match expr {
        Expression::Selection(sel) => select_located(sel, ctx),
        _ => Err(JPathError::TypeError(
            "only a selection can be used as a node-set".to_string(),
        )),
    }
}

fn select_values<'v>(
    sel: &Selection,
    ctx: &EvaluationContext<'v>,
) -> Result<Vec<&'v Value>, JPathError> {
    Ok(select_located(sel, ctx)?.into_iter().map(|(_, v)| v).collect())
}

fn select_located<'v>(
    sel: &Selection,
    ctx: &EvaluationContext<'v>,
) -> Result<Vec<(Location, &'v Value)>, JPathError> {
    match sel {
        Selection::CurrentContext => Ok(vec![(Location::default(), ctx.context_node)]),
        Selection::Variable(name) => {
            let value = ctx
                .variables
                .get(name)
                .ok_or_else(|| JPathError::UnknownVariable(name.clone()))?;
            Ok(vec![(Location::default(), value)])
        }
        Selection::Path { segments, .. } => {
            let mut current = vec![(Location::default(), ctx.context_node)];
            for segment in segments {
                let mut next = Vec::new();
                for (loc, value) in current {
                    apply_segment(segment, &loc, value, &mut next);
                }
                current = next;
            }
            Ok(current)
        }
    }
}

fn apply_segment<'v>(
    segment: &PathSegment,
    loc: &Location,
    value: &'v Value,
    out: &mut Vec<(Location, &'v Value)>,
) {
    match segment {
        PathSegment::Key(k) => {
            if let Some(v) = value.get(k.as_str()) {
                out.push((loc.child_key(k), v));
            }
        }
        PathSegment::Index(i) => {
            if let Some(v) = value.get(i) {
                out.push((loc.child_index(*i), v));
            }
        }
        PathSegment::Wildcard => match value {
            Value::Object(map) => {
                for (k, v) in map {
                    out.push((loc.child_key(k), v));
                }
            }
            Value::Array(items) => {
                for (i, v) in items.iter().enumerate() {
                    out.push((loc.child_index(i), v));
                }
            }
            _ => {}
        },
        PathSegment::Descendant(key) => collect_descendants(key, loc, value, out),
    }
}

fn collect_descendants<'v>(
    key: &str,
    loc: &Location,
    value: &'v Value,
    out: &mut Vec<(Location, &'v Value)>,
) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let child = loc.child_key(k);
                if k == key {
                    out.push((child.clone(), v));
                }
                collect_descendants(key, &child, v, out);
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                collect_descendants(key, &loc.child_index(i), v, out);
            }
        }
        _ => {}
    }
}
