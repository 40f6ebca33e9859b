//! The DOM-tree accumulator.
use super::{
    apply_character_maps, BuildState, CharacterMap, DocumentLog,
    JoiningTransformer, Output, OutputSpec, ResultDocument, TransformOutput,
};
use crate::error::TransformError;
use serde_json::Value;
use std::collections::HashMap;
use treeform_dom::{Document, NodeId, NodeKind};

/// Joins emitted content into a real document tree. Object and array builds
/// have no DOM representation, so their entries render as text nodes via
/// the scalar path.
pub struct DomJoiner {
    doc: Document,
    /// The node new content attaches to, innermost last.
    parents: Vec<NodeId>,
    states: Vec<BuildState>,
    /// In-scope namespace declarations, one map per open element. The
    /// default namespace is keyed by the empty string.
    ns_scopes: Vec<HashMap<String, String>>,
    spec: OutputSpec,
    character_maps: Vec<CharacterMap>,
    log: DocumentLog,
    snapshots: Vec<Snapshot>,
}

type Snapshot = (
    Document,
    Vec<NodeId>,
    Vec<BuildState>,
    Vec<HashMap<String, String>>,
    OutputSpec,
);

impl Default for DomJoiner {
    fn default() -> Self {
        Self::new()
    }
}

impl DomJoiner {
    pub fn new() -> Self {
        let doc = Document::new();
        let root = doc.root();
        DomJoiner {
            doc,
            parents: vec![root],
            states: vec![BuildState::Free],
            ns_scopes: vec![HashMap::new()],
            spec: OutputSpec::default(),
            character_maps: Vec::new(),
            log: DocumentLog::default(),
            snapshots: Vec::new(),
        }
    }

    fn state(&self) -> &BuildState {
        self.states.last().unwrap_or(&BuildState::Free)
    }

    fn current_parent(&self) -> NodeId {
        *self.parents.last().unwrap_or(&self.doc.root())
    }

    /// Leaving the open-tag state: attributes are no longer legal on the
    /// current element, and its declarations are complete, so the
    /// element's namespace can be resolved.
    fn close_open_tag(&mut self) -> Result<(), TransformError> {
        if matches!(self.state(), BuildState::InOpenTag { .. }) {
            self.resolve_open_namespace()?;
            self.states.pop();
            self.states.push(BuildState::Free);
        }
        Ok(())
    }

    fn lookup_namespace(&self, key: &str) -> Option<&str> {
        self.ns_scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(key))
            .map(String::as_str)
    }

    /// Resolves the open element's namespace from its name prefix, or from
    /// the in-scope default declaration for an unprefixed name.
    fn resolve_open_namespace(&mut self) -> Result<(), TransformError> {
        let el = self.current_parent();
        let key = match self.doc.kind(el) {
            NodeKind::Element {
                prefix,
                namespace: None,
                ..
            } => prefix.clone().unwrap_or_default(),
            _ => return Ok(()),
        };
        if let Some(uri) = self.lookup_namespace(&key).map(str::to_string) {
            self.doc.set_namespace(el, &uri)?;
        }
        Ok(())
    }

    fn append_text_node(&mut self, text: &str) {
        let mapped = apply_character_maps(text, &self.character_maps);
        let node = self.doc.create_text(&mapped);
        self.doc.append_child(self.current_parent(), node);
    }

    fn take_finished(&mut self) -> Result<Output, TransformError> {
        if self.spec.wants_declaration() {
            let pi = self
                .doc
                .create_processing_instruction("xml", &self.spec.declaration_body());
            let root = self.doc.root();
            self.doc.prepend_child(root, pi);
        }
        let doc = std::mem::take(&mut self.doc);
        Ok(Output::Dom(doc))
    }

    fn restore_snapshot(&mut self) -> Result<Output, TransformError> {
        let (doc, parents, states, ns_scopes, spec) = self.snapshots.pop().ok_or_else(|| {
            TransformError::BuilderState(
                "end_document without a matching begin_document".to_string(),
            )
        })?;
        let finished = self.take_finished()?;
        self.doc = doc;
        self.parents = parents;
        self.states = states;
        self.ns_scopes = ns_scopes;
        self.spec = spec;
        Ok(finished)
    }
}

impl JoiningTransformer for DomJoiner {
    fn append(&mut self, value: &Value) -> Result<(), TransformError> {
        self.close_open_tag()?;
        if matches!(self.state(), BuildState::InObject { pending: None }) {
            return Err(TransformError::ScalarOutsideProperty);
        }
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        if let Some(BuildState::InObject { pending }) = self.states.last_mut() {
            pending.take();
        }
        self.append_text_node(&text);
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), TransformError> {
        self.close_open_tag()?;
        self.append_text_node(text);
        Ok(())
    }

    fn raw(&mut self, text: &str) -> Result<(), TransformError> {
        self.close_open_tag()?;
        let node = self.doc.create_text(text);
        self.doc.append_child(self.current_parent(), node);
        Ok(())
    }

    fn begin_element(&mut self, name: &str) -> Result<(), TransformError> {
        self.close_open_tag()?;
        let el = self.doc.create_element(name);
        self.doc.append_child(self.current_parent(), el);
        self.parents.push(el);
        self.ns_scopes.push(HashMap::new());
        self.states.push(BuildState::InOpenTag {
            name: name.to_string(),
        });
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: &str) -> Result<(), TransformError> {
        if !matches!(self.state(), BuildState::InOpenTag { .. }) {
            return Err(TransformError::AttributeAfterContent(name.to_string()));
        }
        let el = self.current_parent();
        let mapped = apply_character_maps(value, &self.character_maps);
        // Namespace declarations scope the element and its descendants
        // rather than appearing as ordinary attributes.
        if name == "xmlns" {
            if let Some(scope) = self.ns_scopes.last_mut() {
                scope.insert(String::new(), mapped.clone());
            }
            self.doc.set_namespace(el, &mapped)?;
            return Ok(());
        }
        if let Some(prefix) = name.strip_prefix("xmlns:") {
            if let Some(scope) = self.ns_scopes.last_mut() {
                scope.insert(prefix.to_string(), mapped);
            }
            return Ok(());
        }
        self.doc.set_attribute(el, name, &mapped)?;
        Ok(())
    }

    fn end_element(&mut self) -> Result<(), TransformError> {
        self.close_open_tag()?;
        match self.state() {
            BuildState::Free if self.states.len() > 1 => {
                self.states.pop();
                self.parents.pop();
                self.ns_scopes.pop();
                Ok(())
            }
            other => Err(TransformError::BuilderState(format!(
                "end_element while in {:?}",
                other
            ))),
        }
    }

    fn comment(&mut self, text: &str) -> Result<(), TransformError> {
        self.close_open_tag()?;
        let node = self.doc.create_comment(text);
        self.doc.append_child(self.current_parent(), node);
        Ok(())
    }

    fn processing_instruction(
        &mut self,
        target: &str,
        data: &str,
    ) -> Result<(), TransformError> {
        self.close_open_tag()?;
        let node = self.doc.create_processing_instruction(target, data);
        self.doc.append_child(self.current_parent(), node);
        Ok(())
    }

    fn begin_object(&mut self) -> Result<(), TransformError> {
        self.close_open_tag()?;
        self.states.push(BuildState::InObject { pending: None });
        Ok(())
    }

    fn property(&mut self, name: &str) -> Result<(), TransformError> {
        match self.states.last_mut() {
            Some(BuildState::InObject { pending }) => {
                *pending = Some(name.to_string());
                Ok(())
            }
            _ => Err(TransformError::BuilderState(format!(
                "property '{}' outside an object build",
                name
            ))),
        }
    }

    fn end_object(&mut self) -> Result<(), TransformError> {
        match self.state() {
            BuildState::InObject { .. } => {
                self.states.pop();
                Ok(())
            }
            other => Err(TransformError::BuilderState(format!(
                "end_object while in {:?}",
                other
            ))),
        }
    }

    fn begin_array(&mut self) -> Result<(), TransformError> {
        self.close_open_tag()?;
        self.states.push(BuildState::InArray);
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), TransformError> {
        match self.state() {
            BuildState::InArray => {
                self.states.pop();
                Ok(())
            }
            other => Err(TransformError::BuilderState(format!(
                "end_array while in {:?}",
                other
            ))),
        }
    }

    fn set_output_spec(&mut self, spec: OutputSpec) {
        self.spec = spec;
    }

    fn output_spec(&self) -> &OutputSpec {
        &self.spec
    }

    fn set_character_maps(&mut self, maps: Vec<CharacterMap>) {
        self.character_maps = maps;
    }

    fn begin_document(&mut self) -> Result<(), TransformError> {
        let doc = std::mem::take(&mut self.doc);
        let root = Document::new().root();
        self.snapshots.push((
            doc,
            std::mem::replace(&mut self.parents, vec![root]),
            std::mem::replace(&mut self.states, vec![BuildState::Free]),
            std::mem::replace(&mut self.ns_scopes, vec![HashMap::new()]),
            std::mem::take(&mut self.spec),
        ));
        self.doc = Document::new();
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), TransformError> {
        let finished = self.restore_snapshot()?;
        self.log.documents.push(finished);
        Ok(())
    }

    fn end_result_document(
        &mut self,
        href: &str,
        format: String,
    ) -> Result<(), TransformError> {
        let finished = self.restore_snapshot()?;
        self.log.result_documents.push(ResultDocument {
            href: href.to_string(),
            format,
            content: finished,
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<TransformOutput, TransformError> {
        let output = self.take_finished()?;
        let log = std::mem::take(&mut self.log);
        Ok(TransformOutput {
            output,
            documents: log.documents,
            result_documents: log.result_documents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_real_nodes() {
        let mut j = DomJoiner::new();
        j.begin_element("html").unwrap();
        j.begin_element("body").unwrap();
        j.attribute("class", "main").unwrap();
        j.text("hello").unwrap();
        j.end_element().unwrap();
        j.end_element().unwrap();
        let out = j.finish().unwrap();
        let doc = out.output.as_dom().unwrap();
        assert_eq!(doc.to_xml(), "<html><body class=\"main\">hello</body></html>");
    }

    #[test]
    fn xmlns_attribute_sets_namespace() {
        let mut j = DomJoiner::new();
        j.begin_element("svg").unwrap();
        j.attribute("xmlns", "http://www.w3.org/2000/svg").unwrap();
        j.end_element().unwrap();
        let out = j.finish().unwrap();
        let doc = out.output.as_dom().unwrap();
        let root_children: Vec<_> = doc.children(doc.root()).to_vec();
        assert_eq!(doc.namespace(root_children[0]), Some("http://www.w3.org/2000/svg"));
    }

    #[test]
    fn prefixed_names_resolve_through_declarations() {
        let mut j = DomJoiner::new();
        j.begin_element("svg:svg").unwrap();
        j.attribute("xmlns:svg", "http://www.w3.org/2000/svg").unwrap();
        j.begin_element("svg:rect").unwrap();
        j.end_element().unwrap();
        j.end_element().unwrap();
        let out = j.finish().unwrap();
        let doc = out.output.as_dom().unwrap();
        let svg = doc.children(doc.root())[0];
        let rect = doc.children(svg)[0];
        assert_eq!(doc.namespace(svg), Some("http://www.w3.org/2000/svg"));
        // The declaration stays in scope for descendants and is not an
        // ordinary attribute.
        assert_eq!(doc.namespace(rect), Some("http://www.w3.org/2000/svg"));
        assert!(doc.attributes(svg).is_empty());
    }

    #[test]
    fn default_namespace_is_inherited() {
        let mut j = DomJoiner::new();
        j.begin_element("svg").unwrap();
        j.attribute("xmlns", "http://www.w3.org/2000/svg").unwrap();
        j.begin_element("rect").unwrap();
        j.end_element().unwrap();
        j.end_element().unwrap();
        let out = j.finish().unwrap();
        let doc = out.output.as_dom().unwrap();
        let svg = doc.children(doc.root())[0];
        let rect = doc.children(svg)[0];
        assert_eq!(doc.namespace(rect), Some("http://www.w3.org/2000/svg"));
    }

    #[test]
    fn declaration_becomes_a_processing_instruction() {
        let mut j = DomJoiner::new();
        j.set_output_spec(OutputSpec {
            version: Some("1.0".to_string()),
            ..Default::default()
        });
        j.begin_element("doc").unwrap();
        j.end_element().unwrap();
        let out = j.finish().unwrap();
        let doc = out.output.as_dom().unwrap();
        assert!(doc.to_xml().starts_with("<?xml version=\"1.0\"?>"));
    }

    #[test]
    fn attribute_after_text_is_an_error() {
        let mut j = DomJoiner::new();
        j.begin_element("p").unwrap();
        j.text("x").unwrap();
        assert!(j.attribute("a", "b").is_err());
    }
}
