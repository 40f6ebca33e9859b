//! The tree-path flavor: a [`NodeAdapter`] over a parsed document tree.
use crate::engine::{EvalScope, NodeAdapter, NodeShape};
use crate::error::TransformError;
use crate::joiner::JoiningTransformer;
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;
use treeform_dom::{Document, NodeId, NodeKind, NodeRef};
use treeform_treepath::{
    self as treepath, EvaluationContext, Expression, PathValue, Pattern, Version,
};

/// Nodes are arena ids; every evaluation borrows the shared document
/// internally, so the node handles themselves carry no lifetime.
pub struct TreeAdapter {
    doc: Rc<Document>,
    version: Version,
}

impl TreeAdapter {
    pub fn new(doc: Document, version: Version) -> Self {
        TreeAdapter {
            doc: Rc::new(doc),
            version,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn version(&self) -> Version {
        self.version
    }

    fn node_ref(&self, id: NodeId) -> NodeRef<'_> {
        self.doc.node_ref(id)
    }

    /// The tree-path evaluator takes string variable bindings.
    fn string_variables(scope: &EvalScope<'_>) -> HashMap<String, String> {
        scope
            .variables
            .iter()
            .map(|(k, v)| (k.clone(), treeform_jpath::engine::value_to_string(v)))
            .collect()
    }

    fn eval<'a>(
        &'a self,
        expr: &str,
        node: NodeId,
        variables: &HashMap<String, String>,
        scope: &EvalScope<'_>,
    ) -> Result<PathValue<NodeRef<'a>>, TransformError> {
        let parsed = treepath::parse_expression(expr)?;
        self.eval_parsed(&parsed, node, variables, scope)
    }

    fn eval_parsed<'a>(
        &'a self,
        parsed: &Expression,
        node: NodeId,
        variables: &HashMap<String, String>,
        scope: &EvalScope<'_>,
    ) -> Result<PathValue<NodeRef<'a>>, TransformError> {
        let position = scope.loop_position.map(|p| p + 1).unwrap_or(1);
        let ctx = EvaluationContext::new(
            self.node_ref(node),
            self.doc.root_ref(),
            variables,
            position,
            position.max(1),
            self.version,
        );
        Ok(treepath::evaluate(parsed, &ctx)?)
    }
}

fn path_value_to_json(value: PathValue<NodeRef<'_>>) -> Value {
    match value {
        PathValue::Bool(b) => Value::Bool(b),
        PathValue::Number(n) => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        other => Value::String(other.into_string()),
    }
}

impl NodeAdapter for TreeAdapter {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.doc.root()
    }

    fn root_pattern(&self) -> &'static str {
        "/"
    }

    fn evaluate(
        &self,
        expr: &str,
        node: &NodeId,
        scope: &EvalScope<'_>,
    ) -> Result<Value, TransformError> {
        let variables = Self::string_variables(scope);
        let value = self.eval(expr, *node, &variables, scope)?;
        Ok(path_value_to_json(value))
    }

    fn evaluate_bool(
        &self,
        expr: &str,
        node: &NodeId,
        scope: &EvalScope<'_>,
    ) -> Result<bool, TransformError> {
        let variables = Self::string_variables(scope);
        Ok(self.eval(expr, *node, &variables, scope)?.to_bool())
    }

    fn select(
        &self,
        expr: &str,
        node: &NodeId,
        scope: &EvalScope<'_>,
    ) -> Result<Vec<NodeId>, TransformError> {
        let variables = Self::string_variables(scope);
        match self.eval(expr, *node, &variables, scope)? {
            PathValue::Nodes(nodes) => Ok(nodes.into_iter().map(|n| n.id).collect()),
            other => Err(TransformError::TreePath(
                treepath::TreePathError::TypeError(format!(
                    "'{}' does not select nodes (got {:?})",
                    expr, other
                )),
            )),
        }
    }

    fn matches(&self, pattern: &str, node: &NodeId) -> Result<bool, TransformError> {
        let compiled = Pattern::parse(pattern)?;
        Ok(compiled.matches(self.node_ref(*node), self.doc.root_ref()))
    }

    fn shape(&self, node: &NodeId) -> NodeShape {
        match self.doc.kind(*node) {
            NodeKind::Root => NodeShape::Root,
            NodeKind::Element { .. } => NodeShape::Branch,
            NodeKind::Text(_) | NodeKind::Attribute { .. } => NodeShape::Leaf,
            NodeKind::Comment(_) | NodeKind::ProcessingInstruction { .. } => NodeShape::Other,
        }
    }

    fn text_content(&self, node: &NodeId) -> String {
        self.doc.string_value(*node)
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.doc.children(*node).to_vec()
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.doc.parent(*node)
    }

    fn same_kind(&self, a: &NodeId, b: &NodeId) -> bool {
        match (self.doc.kind(*a), self.doc.kind(*b)) {
            (
                NodeKind::Element { prefix: pa, local: la, .. },
                NodeKind::Element { prefix: pb, local: lb, .. },
            ) => pa == pb && la == lb,
            (NodeKind::Text(_), NodeKind::Text(_)) => true,
            _ => false,
        }
    }

    fn node_name(&self, node: &NodeId) -> Option<String> {
        self.doc.qualified_name(*node)
    }

    fn shallow_copy(
        &self,
        node: &NodeId,
        out: &mut dyn JoiningTransformer,
    ) -> Result<(), TransformError> {
        match self.doc.kind(*node) {
            NodeKind::Root => Ok(()),
            NodeKind::Element { .. } => {
                let name = self.doc.qualified_name(*node).unwrap_or_default();
                out.begin_element(&name)?;
                for &attr in self.doc.attributes(*node) {
                    if let NodeKind::Attribute { value, .. } = self.doc.kind(attr) {
                        let attr_name =
                            self.doc.qualified_name(attr).unwrap_or_default();
                        out.attribute(&attr_name, value)?;
                    }
                }
                out.end_element()
            }
            NodeKind::Text(t) => out.text(t),
            NodeKind::Attribute { value, .. } => out.text(value),
            NodeKind::Comment(c) => out.comment(c),
            NodeKind::ProcessingInstruction { target, data } => {
                out.processing_instruction(target, data)
            }
        }
    }

    fn deep_copy(
        &self,
        node: &NodeId,
        out: &mut dyn JoiningTransformer,
    ) -> Result<(), TransformError> {
        match self.doc.kind(*node) {
            NodeKind::Root => {
                for &child in self.doc.children(*node) {
                    self.deep_copy(&child, out)?;
                }
                Ok(())
            }
            NodeKind::Element { .. } => {
                let name = self.doc.qualified_name(*node).unwrap_or_default();
                out.begin_element(&name)?;
                for &attr in self.doc.attributes(*node) {
                    if let NodeKind::Attribute { value, .. } = self.doc.kind(attr) {
                        let attr_name =
                            self.doc.qualified_name(attr).unwrap_or_default();
                        out.attribute(&attr_name, value)?;
                    }
                }
                for &child in self.doc.children(*node) {
                    self.deep_copy(&child, out)?;
                }
                out.end_element()
            }
            _ => self.shallow_copy(node, out),
        }
    }
}
