//! The markup-string accumulator.
use super::{
    apply_character_maps, BuildState, CharacterMap, DocumentLog,
    JoiningTransformer, Output, OutputSpec, ResultDocument, TransformOutput,
};
use crate::error::TransformError;
use serde_json::Value;
use treeform_dom::{escape_attribute, escape_text};

/// Joins emitted content into one markup string. Object and array builds
/// render as JSON-shaped text so that the three accumulators stay
/// interchangeable under the same template logic.
pub struct StringJoiner {
    buffer: String,
    states: Vec<BuildState>,
    /// Open element names, innermost last, for closing tags.
    open_elements: Vec<String>,
    /// Whether the current object/array already holds an entry, per nesting
    /// level, for comma placement.
    seen_entry: Vec<bool>,
    spec: OutputSpec,
    character_maps: Vec<CharacterMap>,
    log: DocumentLog,
    /// Snapshots of (buffer, states, open_elements, seen_entry, spec) taken
    /// by `begin_document`.
    snapshots: Vec<(String, Vec<BuildState>, Vec<String>, Vec<bool>, OutputSpec)>,
}

impl Default for StringJoiner {
    fn default() -> Self {
        Self::new()
    }
}

impl StringJoiner {
    pub fn new() -> Self {
        StringJoiner {
            buffer: String::new(),
            states: vec![BuildState::Free],
            open_elements: Vec::new(),
            seen_entry: Vec::new(),
            spec: OutputSpec::default(),
            character_maps: Vec::new(),
            log: DocumentLog::default(),
            snapshots: Vec::new(),
        }
    }

    fn state(&self) -> &BuildState {
        // The stack is seeded with Free and never fully popped.
        self.states.last().unwrap_or(&BuildState::Free)
    }

    /// Closes a pending open tag with `>` if one is active. The tag state is
    /// replaced by a `Free` content scope that `end_element` pops.
    fn close_open_tag(&mut self) {
        if matches!(self.state(), BuildState::InOpenTag { .. }) {
            self.buffer.push('>');
            if let Some(BuildState::InOpenTag { name }) = self.states.pop() {
                self.open_elements.push(name);
            }
            self.states.push(BuildState::Free);
        }
    }

    /// Writes a separating comma inside the current object/array, then the
    /// pending property name when inside an object.
    fn begin_entry(&mut self) -> Result<(), TransformError> {
        match self.states.last_mut() {
            Some(BuildState::InObject { pending }) => {
                let name = pending.take().ok_or(TransformError::ScalarOutsideProperty)?;
                if let Some(seen) = self.seen_entry.last_mut() {
                    if *seen {
                        self.buffer.push(',');
                    }
                    *seen = true;
                }
                self.buffer.push('"');
                self.buffer.push_str(&name);
                self.buffer.push_str("\":");
                Ok(())
            }
            Some(BuildState::InArray) => {
                if let Some(seen) = self.seen_entry.last_mut() {
                    if *seen {
                        self.buffer.push(',');
                    }
                    *seen = true;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn mapped(&self, text: &str) -> String {
        apply_character_maps(text, &self.character_maps)
    }

    fn rendered_prefix(&self) -> String {
        let mut prefix = String::new();
        if self.spec.wants_declaration() {
            prefix.push_str(&format!("<?xml {}?>\n", self.spec.declaration_body()));
        }
        match (&self.spec.doctype_public, &self.spec.doctype_system) {
            (Some(public), Some(system)) => {
                prefix.push_str(&format!(
                    "<!DOCTYPE {} PUBLIC \"{}\" \"{}\">\n",
                    self.open_root_name(),
                    public,
                    system
                ));
            }
            (None, Some(system)) => {
                prefix.push_str(&format!(
                    "<!DOCTYPE {} SYSTEM \"{}\">\n",
                    self.open_root_name(),
                    system
                ));
            }
            _ => {}
        }
        prefix
    }

    /// The name of the first element in the buffer, for the doctype line.
    fn open_root_name(&self) -> String {
        let rest = match self.buffer.split_once('<') {
            Some((_, rest)) => rest,
            None => return "document".to_string(),
        };
        rest.chars()
            .take_while(|c| !c.is_whitespace() && *c != '>' && *c != '/')
            .collect()
    }

    fn take_finished(&mut self) -> Output {
        let prefix = self.rendered_prefix();
        let body = std::mem::take(&mut self.buffer);
        Output::Text(format!("{}{}", prefix, body))
    }

    fn restore_snapshot(&mut self) -> Result<Output, TransformError> {
        let (buffer, states, opens, seen, spec) =
            self.snapshots.pop().ok_or_else(|| {
                TransformError::BuilderState(
                    "end_document without a matching begin_document".to_string(),
                )
            })?;
        let finished = self.take_finished();
        self.buffer = buffer;
        self.states = states;
        self.open_elements = opens;
        self.seen_entry = seen;
        self.spec = spec;
        Ok(finished)
    }
}

impl JoiningTransformer for StringJoiner {
    fn append(&mut self, value: &Value) -> Result<(), TransformError> {
        self.close_open_tag();
        let in_structure = !matches!(self.state(), BuildState::Free);
        self.begin_entry()?;
        if in_structure {
            // Inside object/array builds the value keeps its JSON form.
            self.buffer.push_str(&value.to_string());
        } else {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            let mapped = self.mapped(&text);
            self.buffer.push_str(&escape_text(&mapped));
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), TransformError> {
        self.close_open_tag();
        if matches!(self.state(), BuildState::InObject { .. } | BuildState::InArray) {
            return self.append(&Value::String(text.to_string()));
        }
        let mapped = self.mapped(text);
        self.buffer.push_str(&escape_text(&mapped));
        Ok(())
    }

    fn raw(&mut self, text: &str) -> Result<(), TransformError> {
        self.close_open_tag();
        self.buffer.push_str(text);
        Ok(())
    }

    fn begin_element(&mut self, name: &str) -> Result<(), TransformError> {
        self.close_open_tag();
        self.begin_entry()?;
        self.buffer.push('<');
        self.buffer.push_str(name);
        self.states.push(BuildState::InOpenTag {
            name: name.to_string(),
        });
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: &str) -> Result<(), TransformError> {
        if !matches!(self.state(), BuildState::InOpenTag { .. }) {
            return Err(TransformError::AttributeAfterContent(name.to_string()));
        }
        let mapped = self.mapped(value);
        self.buffer
            .push_str(&format!(" {}=\"{}\"", name, escape_attribute(&mapped)));
        Ok(())
    }

    fn end_element(&mut self) -> Result<(), TransformError> {
        match self.state().clone() {
            BuildState::InOpenTag { .. } => {
                // Nothing was emitted inside the element: self-close.
                self.buffer.push_str("/>");
                self.states.pop();
                Ok(())
            }
            BuildState::Free if self.states.len() > 1 => {
                let name = self.open_elements.pop().ok_or_else(|| {
                    TransformError::BuilderState(
                        "end_element without an open element".to_string(),
                    )
                })?;
                self.states.pop();
                self.buffer.push_str(&format!("</{}>", name));
                Ok(())
            }
            other => Err(TransformError::BuilderState(format!(
                "end_element while in {:?}",
                other
            ))),
        }
    }

    fn comment(&mut self, text: &str) -> Result<(), TransformError> {
        self.close_open_tag();
        self.buffer.push_str(&format!("<!--{}-->", text));
        Ok(())
    }

    fn processing_instruction(
        &mut self,
        target: &str,
        data: &str,
    ) -> Result<(), TransformError> {
        self.close_open_tag();
        self.buffer.push_str(&format!("<?{} {}?>", target, data));
        Ok(())
    }

    fn begin_object(&mut self) -> Result<(), TransformError> {
        self.close_open_tag();
        self.begin_entry()?;
        self.buffer.push('{');
        self.states.push(BuildState::InObject { pending: None });
        self.seen_entry.push(false);
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
                self.buffer.push('}');
                self.states.pop();
                self.seen_entry.pop();
                Ok(())
            }
            other => Err(TransformError::BuilderState(format!(
                "end_object while in {:?}",
                other
            ))),
        }
    }

    fn begin_array(&mut self) -> Result<(), TransformError> {
        self.close_open_tag();
        self.begin_entry()?;
        self.buffer.push('[');
        self.states.push(BuildState::InArray);
        self.seen_entry.push(false);
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), TransformError> {
        match self.state() {
            BuildState::InArray => {
                self.buffer.push(']');
                self.states.pop();
                self.seen_entry.pop();
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
        self.snapshots.push((
            std::mem::take(&mut self.buffer),
            std::mem::replace(&mut self.states, vec![BuildState::Free]),
            std::mem::take(&mut self.open_elements),
            std::mem::take(&mut self.seen_entry),
            std::mem::take(&mut self.spec),
        ));
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
        let output = self.take_finished();
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
    use serde_json::json;

    #[test]
    fn builds_escaped_markup() {
        let mut j = StringJoiner::new();
        j.begin_element("p").unwrap();
        j.attribute("class", "a&b").unwrap();
        j.text("1 < 2").unwrap();
        j.end_element().unwrap();
        let out = j.finish().unwrap();
        assert_eq!(out.output.as_text().unwrap(), "<p class=\"a&amp;b\">1 &lt; 2</p>");
    }

    #[test]
    fn empty_elements_self_close() {
        let mut j = StringJoiner::new();
        j.begin_element("br").unwrap();
        j.end_element().unwrap();
        assert_eq!(j.finish().unwrap().output.as_text().unwrap(), "<br/>");
    }

    #[test]
    fn attribute_after_content_is_an_error() {
        let mut j = StringJoiner::new();
        j.begin_element("p").unwrap();
        j.text("hi").unwrap();
        assert!(matches!(
            j.attribute("x", "y"),
            Err(TransformError::AttributeAfterContent(_))
        ));
    }

    #[test]
    fn object_build_requires_a_property() {
        let mut j = StringJoiner::new();
        j.begin_object().unwrap();
        assert!(matches!(
            j.append(&json!(1)),
            Err(TransformError::ScalarOutsideProperty)
        ));
        j.property("a").unwrap();
        j.append(&json!(1)).unwrap();
        j.property("b").unwrap();
        j.append(&json!("x")).unwrap();
        j.end_object().unwrap();
        assert_eq!(
            j.finish().unwrap().output.as_text().unwrap(),
            "{\"a\":1,\"b\":\"x\"}"
        );
    }

    #[test]
    fn renders_declared_output_fields_only() {
        let mut j = StringJoiner::new();
        j.set_output_spec(OutputSpec {
            version: Some("1.0".to_string()),
            encoding: Some("UTF-8".to_string()),
            ..Default::default()
        });
        j.begin_element("doc").unwrap();
        j.end_element().unwrap();
        assert_eq!(
            j.finish().unwrap().output.as_text().unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<doc/>"
        );
    }

    #[test]
    fn character_maps_apply_before_escaping() {
        let mut j = StringJoiner::new();
        j.set_character_maps(vec![CharacterMap {
            name: "amp".to_string(),
            map: [('§', "&sect;".to_string())].into_iter().collect(),
        }]);
        j.raw("<p>").unwrap();
        j.text("a§b").unwrap();
        j.raw("</p>").unwrap();
        // The map's replacement is injected verbatim, the rest escaped.
        assert_eq!(
            j.finish().unwrap().output.as_text().unwrap(),
            "<p>a&amp;sect;b</p>"
        );
    }

    #[test]
    fn document_scope_is_isolated() {
        let mut j = StringJoiner::new();
        j.text("outer").unwrap();
        j.begin_document().unwrap();
        j.text("inner").unwrap();
        j.end_document().unwrap();
        let out = j.finish().unwrap();
        assert_eq!(out.output.as_text().unwrap(), "outer");
        assert_eq!(out.documents.len(), 1);
        assert_eq!(out.documents[0].as_text().unwrap(), "inner");
    }
}
