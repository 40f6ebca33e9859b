//! An owned, mutable document tree.
//!
//! One arena type serves both sides of a transformation: parsed XML input is
//! navigated through [`NodeRef`], which implements the tree-path engine's
//! [`TreeNode`] trait, and the DOM output accumulator builds result trees
//! through the mutation API and serializes them with [`Document::to_xml`].
//!
//! Attributes are ordinary arena nodes attached to their owning element, so
//! navigation treats them uniformly with the rest of the tree.

mod parse;
mod serialize;

pub use parse::parse;
pub use serialize::{escape_attribute, escape_text};

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use thiserror::Error;
use treeform_treepath::{NodeType, QName, TreeNode};

#[derive(Error, Debug)]
pub enum DomError {
    #[error("XML parsing error: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),
}

/// An index into the document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Element {
        prefix: Option<String>,
        local: String,
        namespace: Option<String>,
    },
    Attribute {
        prefix: Option<String>,
        local: String,
        value: String,
    },
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<NodeId>,
}

/// An owned document tree. Node 0 is always the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            nodes: vec![NodeData {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
                attributes: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node_ref(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    pub fn root_ref(&self) -> NodeRef<'_> {
        self.node_ref(self.root())
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].attributes
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
        });
        id
    }

    /// Creates a detached element. A `prefix:local` name is split at the
    /// first colon.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let (prefix, local) = match name.split_once(':') {
            Some((p, l)) => (Some(p.to_string()), l.to_string()),
            None => (None, name.to_string()),
        };
        self.push(NodeKind::Element {
            prefix,
            local,
            namespace: None,
        })
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(NodeKind::Text(content.to_string()))
    }

    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(NodeKind::Comment(content.to_string()))
    }

    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> NodeId {
        self.push(NodeKind::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        })
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(0, child);
    }

    /// Sets (or replaces) an attribute on an element.
    pub fn set_attribute(
        &mut self,
        element: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        if !matches!(self.nodes[element.0].kind, NodeKind::Element { .. }) {
            return Err(DomError::NotAnElement(element));
        }
        let (prefix, local) = match name.split_once(':') {
            Some((p, l)) => (Some(p.to_string()), l.to_string()),
            None => (None, name.to_string()),
        };

        let existing = self.nodes[element.0].attributes.iter().copied().find(|a| {
            matches!(
                &self.nodes[a.0].kind,
                NodeKind::Attribute { prefix: p, local: l, .. } if *p == prefix && *l == local
            )
        });
        if let Some(attr) = existing {
            if let NodeKind::Attribute { value: v, .. } = &mut self.nodes[attr.0].kind {
                *v = value.to_string();
            }
            return Ok(());
        }

        let attr = self.push(NodeKind::Attribute {
            prefix,
            local,
            value: value.to_string(),
        });
        self.nodes[attr.0].parent = Some(element);
        self.nodes[element.0].attributes.push(attr);
        Ok(())
    }

    pub fn set_namespace(&mut self, element: NodeId, uri: &str) -> Result<(), DomError> {
        match &mut self.nodes[element.0].kind {
            NodeKind::Element { namespace, .. } => {
                *namespace = Some(uri.to_string());
                Ok(())
            }
            _ => Err(DomError::NotAnElement(element)),
        }
    }

    pub fn namespace(&self, element: NodeId) -> Option<&str> {
        match &self.nodes[element.0].kind {
            NodeKind::Element { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    /// The concatenated descendant text of a node, per the tree-path
    /// string-value rules.
    pub fn string_value(&self, id: NodeId) -> String {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => t.clone(),
            NodeKind::Comment(c) => c.clone(),
            NodeKind::Attribute { value, .. } => value.clone(),
            NodeKind::ProcessingInstruction { data, .. } => data.clone(),
            NodeKind::Root | NodeKind::Element { .. } => {
                let mut out = String::new();
                self.collect_text(id, &mut out);
                out
            }
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for &child in &self.nodes[id.0].children {
            match &self.nodes[child.0].kind {
                NodeKind::Text(t) => out.push_str(t),
                NodeKind::Element { .. } => self.collect_text(child, out),
                _ => {}
            }
        }
    }

    /// The element's qualified name rendered as written (`prefix:local`).
    pub fn qualified_name(&self, id: NodeId) -> Option<String> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { prefix, local, .. }
            | NodeKind::Attribute { prefix, local, .. } => Some(match prefix {
                Some(p) => format!("{}:{}", p, local),
                None => local.clone(),
            }),
            NodeKind::ProcessingInstruction { target, .. } => Some(target.clone()),
            _ => None,
        }
    }
}

/// A lightweight handle pairing a document with a node id. Identity and
/// ordering follow the arena index, which is document order for parsed
/// input.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    pub doc: &'a Document,
    pub id: NodeId,
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for NodeRef<'_> {}
impl PartialOrd for NodeRef<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for NodeRef<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
impl Hash for NodeRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<'a> TreeNode<'a> for NodeRef<'a> {
    fn node_type(&self) -> NodeType {
        match self.doc.kind(self.id) {
            NodeKind::Root => NodeType::Root,
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Attribute { .. } => NodeType::Attribute,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Comment(_) => NodeType::Comment,
            NodeKind::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
        }
    }

    fn name(&self) -> Option<QName<'a>> {
        match self.doc.kind(self.id) {
            NodeKind::Element { prefix, local, .. }
            | NodeKind::Attribute { prefix, local, .. } => Some(QName {
                prefix: prefix.as_deref(),
                local,
            }),
            NodeKind::ProcessingInstruction { target, .. } => Some(QName {
                prefix: None,
                local: target,
            }),
            _ => None,
        }
    }

    fn string_value(&self) -> String {
        self.doc.string_value(self.id)
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let doc = self.doc;
        let ids = doc.attributes(self.id).to_vec();
        Box::new(ids.into_iter().map(move |id| NodeRef { doc, id }))
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let doc = self.doc;
        let ids = doc.children(self.id).to_vec();
        Box::new(ids.into_iter().map(move |id| NodeRef { doc, id }))
    }

    fn parent(&self) -> Option<Self> {
        self.doc.parent(self.id).map(|id| NodeRef {
            doc: self.doc,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_navigates() {
        let mut doc = Document::new();
        let root = doc.root();
        let html = doc.create_element("html");
        doc.append_child(root, html);
        let body = doc.create_element("body");
        doc.append_child(html, body);
        let text = doc.create_text("hello");
        doc.append_child(body, text);
        doc.set_attribute(body, "class", "main").unwrap();

        assert_eq!(doc.string_value(root), "hello");
        let body_ref = doc.node_ref(body);
        assert_eq!(body_ref.name().unwrap().local, "body");
        assert_eq!(body_ref.attributes().count(), 1);
        assert_eq!(
            body_ref.parent().unwrap().name().unwrap().local,
            "html"
        );
    }

    #[test]
    fn replaces_existing_attribute() {
        let mut doc = Document::new();
        let el = doc.create_element("a");
        doc.set_attribute(el, "href", "one").unwrap();
        doc.set_attribute(el, "href", "two").unwrap();
        assert_eq!(doc.attributes(el).len(), 1);
        assert_eq!(doc.string_value(doc.attributes(el)[0]), "two");
    }

    #[test]
    fn attribute_on_text_is_an_error() {
        let mut doc = Document::new();
        let t = doc.create_text("x");
        assert!(doc.set_attribute(t, "a", "b").is_err());
    }

    #[test]
    fn splits_prefixed_names() {
        let mut doc = Document::new();
        let el = doc.create_element("svg:rect");
        let r = doc.node_ref(el);
        let name = r.name().unwrap();
        assert_eq!(name.prefix, Some("svg"));
        assert_eq!(name.local, "rect");
        assert_eq!(doc.qualified_name(el).unwrap(), "svg:rect");
    }
}
