//! The JSON-path flavor: a [`NodeAdapter`] over a `serde_json::Value`
//! document.
use crate::engine::{EvalScope, NodeAdapter, NodeShape};
use crate::error::TransformError;
use crate::joiner::JoiningTransformer;
use serde_json::Value;
use std::collections::HashMap;
use treeform_jpath::{
    self as jpath, EvaluationContext, FunctionRegistry, Location, LocationStep,
};

/// A node in a JSON document: the value plus its location from the
/// document root, which is the identity pattern matching works with.
#[derive(Debug, Clone)]
pub struct JsonNode {
    pub location: Location,
    pub value: Value,
}

impl PartialEq for JsonNode {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location
    }
}

pub struct JsonAdapter {
    root: Value,
    functions: FunctionRegistry,
}

impl JsonAdapter {
    pub fn new(root: Value) -> Self {
        JsonAdapter {
            root,
            functions: FunctionRegistry::default(),
        }
    }

    /// Registers an expression-level function, callable from any path
    /// expression this adapter evaluates.
    pub fn register_function(&mut self, name: &str, func: jpath::JPathFunction) {
        self.functions.register(name, func);
    }

    fn eval_context<'v>(
        &'v self,
        node: &'v JsonNode,
        scope: &'v EvalScope<'v>,
    ) -> EvaluationContext<'v> {
        EvaluationContext {
            context_node: &node.value,
            variables: scope.variables,
            functions: &self.functions,
            loop_position: scope.loop_position,
        }
    }

    /// Resolves a location against the document root.
    fn value_at(&self, location: &Location) -> Option<&Value> {
        let mut current = &self.root;
        for step in &location.0 {
            current = match step {
                LocationStep::Key(k) => current.get(k.as_str())?,
                LocationStep::Index(i) => current.get(i)?,
            };
        }
        Some(current)
    }
}

impl NodeAdapter for JsonAdapter {
    type Node = JsonNode;

    fn root(&self) -> JsonNode {
        JsonNode {
            location: Location::default(),
            value: self.root.clone(),
        }
    }

    fn root_pattern(&self) -> &'static str {
        "$"
    }

    fn evaluate(
        &self,
        expr: &str,
        node: &JsonNode,
        scope: &EvalScope<'_>,
    ) -> Result<Value, TransformError> {
        let parsed = jpath::parse_expression(expr)?;
        Ok(jpath::evaluate(&parsed, &self.eval_context(node, scope))?)
    }

    fn evaluate_bool(
        &self,
        expr: &str,
        node: &JsonNode,
        scope: &EvalScope<'_>,
    ) -> Result<bool, TransformError> {
        let parsed = jpath::parse_expression(expr)?;
        Ok(jpath::evaluate_as_bool(
            &parsed,
            &self.eval_context(node, scope),
        )?)
    }

    fn select(
        &self,
        expr: &str,
        node: &JsonNode,
        scope: &EvalScope<'_>,
    ) -> Result<Vec<JsonNode>, TransformError> {
        let parsed = jpath::parse_expression(expr)?;
        let selected = jpath::select(&parsed, &self.eval_context(node, scope))?;
        Ok(selected
            .into_iter()
            .map(|(relative, value)| JsonNode {
                location: node.location.join(&relative),
                value: value.clone(),
            })
            .collect())
    }

    fn matches(&self, pattern: &str, node: &JsonNode) -> Result<bool, TransformError> {
        let parsed = jpath::parse_expression(pattern)?;
        let root = self.root();
        let variables = HashMap::new();
        let scope = EvalScope {
            variables: &variables,
            loop_position: None,
        };
        let selected = jpath::select(&parsed, &self.eval_context(&root, &scope))?;
        Ok(selected
            .iter()
            .any(|(location, _)| *location == node.location))
    }

    fn shape(&self, node: &JsonNode) -> NodeShape {
        match &node.value {
            Value::Object(_) => NodeShape::Branch,
            Value::Array(_) => NodeShape::List,
            Value::Null => NodeShape::Other,
            _ => NodeShape::Leaf,
        }
    }

    fn branch_text(&self) -> bool {
        false
    }

    fn text_content(&self, node: &JsonNode) -> String {
        jpath::engine::value_to_string(&node.value)
    }

    fn children(&self, node: &JsonNode) -> Vec<JsonNode> {
        match &node.value {
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| JsonNode {
                    location: node.location.child_key(k),
                    value: v.clone(),
                })
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| JsonNode {
                    location: node.location.child_index(i),
                    value: v.clone(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn parent(&self, node: &JsonNode) -> Option<JsonNode> {
        let (parent, _) = node.location.split_parent()?;
        let value = self.value_at(&parent)?.clone();
        Some(JsonNode {
            location: parent,
            value,
        })
    }

    fn same_kind(&self, a: &JsonNode, b: &JsonNode) -> bool {
        match (a.location.0.last(), b.location.0.last()) {
            (Some(LocationStep::Key(x)), Some(LocationStep::Key(y))) => x == y,
            (Some(LocationStep::Index(_)), Some(LocationStep::Index(_))) => true,
            _ => false,
        }
    }

    fn node_name(&self, node: &JsonNode) -> Option<String> {
        match node.location.0.last() {
            Some(LocationStep::Key(k)) => Some(k.clone()),
            _ => None,
        }
    }

    fn shallow_copy(
        &self,
        node: &JsonNode,
        out: &mut dyn JoiningTransformer,
    ) -> Result<(), TransformError> {
        match &node.value {
            Value::Object(_) => {
                out.begin_object()?;
                out.end_object()
            }
            Value::Array(_) => {
                out.begin_array()?;
                out.end_array()
            }
            other => out.append(other),
        }
    }

    fn deep_copy(
        &self,
        node: &JsonNode,
        out: &mut dyn JoiningTransformer,
    ) -> Result<(), TransformError> {
        out.append(&node.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope(vars: &HashMap<String, Value>) -> EvalScope<'_> {
        EvalScope {
            variables: vars,
            loop_position: None,
        }
    }

    #[test]
    fn selection_carries_absolute_locations() {
        let adapter = JsonAdapter::new(json!({ "a": { "b": 1 } }));
        let vars = HashMap::new();
        let outer = adapter
            .select("$.a", &adapter.root(), &scope(&vars))
            .unwrap()
            .remove(0);
        let inner = adapter.select("$.b", &outer, &scope(&vars)).unwrap().remove(0);
        assert_eq!(inner.location.to_string(), "$.a.b");
        assert_eq!(inner.value, json!(1));
    }

    #[test]
    fn pattern_matching_is_location_membership() {
        let adapter = JsonAdapter::new(json!({ "items": [10, 20] }));
        let vars = HashMap::new();
        let nodes = adapter
            .select("$.items[*]", &adapter.root(), &scope(&vars))
            .unwrap();
        assert!(adapter.matches("$.items[*]", &nodes[1]).unwrap());
        assert!(adapter.matches("$.items[1]", &nodes[1]).unwrap());
        assert!(!adapter.matches("$.items[0]", &nodes[1]).unwrap());
        assert!(!adapter.matches("$.other", &nodes[1]).unwrap());
    }

    #[test]
    fn parent_resolves_through_the_document() {
        let adapter = JsonAdapter::new(json!({ "a": { "b": [1, 2] } }));
        let vars = HashMap::new();
        let node = adapter
            .select("$.a.b[1]", &adapter.root(), &scope(&vars))
            .unwrap()
            .remove(0);
        let parent = adapter.parent(&node).unwrap();
        assert_eq!(parent.location.to_string(), "$.a.b");
        assert_eq!(adapter.node_name(&parent).as_deref(), Some("b"));
    }
}
