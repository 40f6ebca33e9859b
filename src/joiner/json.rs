//! The structured-array accumulator.
//!
//! Elements are represented as `[name, attributes, ...children]` tuples and
//! documents as a wrapper object carrying `child_nodes` plus declaration
//! metadata, so the joined result is itself an ordinary JSON value.
use super::{
    BuildState, CharacterMap, DocumentLog, JoiningTransformer, Output, OutputSpec,
    ResultDocument, TransformOutput,
};
use crate::error::TransformError;
use serde_json::{json, Map, Value};

/// One unfinished nested structure.
enum Frame {
    Object {
        map: Map<String, Value>,
        pending: Option<String>,
    },
    Array(Vec<Value>),
    Element {
        name: String,
        attributes: Map<String, Value>,
        children: Vec<Value>,
        /// Attributes are legal until content arrives.
        open: bool,
    },
}

impl Frame {
    fn state(&self) -> BuildState {
        match self {
            Frame::Object { pending, .. } => BuildState::InObject {
                pending: pending.clone(),
            },
            Frame::Array(_) => BuildState::InArray,
            Frame::Element { name, open: true, .. } => BuildState::InOpenTag {
                name: name.clone(),
            },
            Frame::Element { .. } => BuildState::Free,
        }
    }
}

pub struct JsonJoiner {
    /// Finished top-level values.
    root: Vec<Value>,
    frames: Vec<Frame>,
    spec: OutputSpec,
    log: DocumentLog,
    snapshots: Vec<(Vec<Value>, Vec<Frame>, OutputSpec)>,
}

impl Default for JsonJoiner {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonJoiner {
    pub fn new() -> Self {
        JsonJoiner {
            root: Vec::new(),
            frames: Vec::new(),
            spec: OutputSpec::default(),
            log: DocumentLog::default(),
            snapshots: Vec::new(),
        }
    }

    /// The active build state, derived from the innermost frame.
    fn state(&self) -> BuildState {
        self.frames
            .last()
            .map(Frame::state)
            .unwrap_or(BuildState::Free)
    }

    /// Routes a finished value into the innermost frame, or the root.
    fn push_value(&mut self, value: Value) -> Result<(), TransformError> {
        match self.frames.last_mut() {
            Some(Frame::Object { map, pending }) => {
                let name = pending.take().ok_or(TransformError::ScalarOutsideProperty)?;
                map.insert(name, value);
            }
            Some(Frame::Array(items)) => items.push(value),
            Some(Frame::Element { children, open, .. }) => {
                *open = false;
                children.push(value);
            }
            None => self.root.push(value),
        }
        Ok(())
    }

    fn take_finished(&mut self) -> Output {
        let values = std::mem::take(&mut self.root);
        let spec = std::mem::take(&mut self.spec);
        if spec.wants_declaration() || spec.method.is_some() {
            let mut wrapper = Map::new();
            wrapper.insert("child_nodes".to_string(), Value::Array(values));
            if let Some(v) = &spec.version {
                wrapper.insert("version".to_string(), json!(v));
            }
            if let Some(e) = &spec.encoding {
                wrapper.insert("encoding".to_string(), json!(e));
            }
            if let Some(s) = spec.standalone {
                wrapper.insert("standalone".to_string(), json!(s));
            }
            if let Some(m) = spec.method {
                wrapper.insert("method".to_string(), json!(m.as_str()));
            }
            return Output::Json(Value::Object(wrapper));
        }
        match values.len() {
            1 if matches!(values.first(), Some(Value::Array(_))) => {
                // A sole element tuple stands alone as the payload.
                Output::Json(values.into_iter().next().unwrap_or(Value::Null))
            }
            _ => Output::Json(Value::Array(values)),
        }
    }

    fn restore_snapshot(&mut self) -> Result<Output, TransformError> {
        let (root, frames, spec) = self.snapshots.pop().ok_or_else(|| {
            TransformError::BuilderState(
                "end_document without a matching begin_document".to_string(),
            )
        })?;
        let finished = self.take_finished();
        self.root = root;
        self.frames = frames;
        self.spec = spec;
        Ok(finished)
    }
}

impl JoiningTransformer for JsonJoiner {
    fn append(&mut self, value: &Value) -> Result<(), TransformError> {
        self.push_value(value.clone())
    }

    fn text(&mut self, text: &str) -> Result<(), TransformError> {
        self.push_value(Value::String(text.to_string()))
    }

    fn raw(&mut self, text: &str) -> Result<(), TransformError> {
        self.push_value(Value::String(text.to_string()))
    }

    fn begin_element(&mut self, name: &str) -> Result<(), TransformError> {
        if let Some(Frame::Element { open, .. }) = self.frames.last_mut() {
            *open = false;
        }
        self.frames.push(Frame::Element {
            name: name.to_string(),
            attributes: Map::new(),
            children: Vec::new(),
            open: true,
        });
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: &str) -> Result<(), TransformError> {
        match self.frames.last_mut() {
            Some(Frame::Element {
                attributes,
                open: true,
                ..
            }) => {
                attributes.insert(name.to_string(), json!(value));
                Ok(())
            }
            _ => Err(TransformError::AttributeAfterContent(name.to_string())),
        }
    }

    fn end_element(&mut self) -> Result<(), TransformError> {
        match self.frames.pop() {
            Some(Frame::Element {
                name,
                attributes,
                children,
                ..
            }) => {
                let mut tuple = vec![json!(name), Value::Object(attributes)];
                tuple.extend(children);
                self.push_value(Value::Array(tuple))
            }
            Some(other) => {
                self.frames.push(other);
                Err(TransformError::BuilderState(
                    "end_element while in a non-element build".to_string(),
                ))
            }
            None => Err(TransformError::BuilderState(
                "end_element without an open element".to_string(),
            )),
        }
    }

    fn comment(&mut self, text: &str) -> Result<(), TransformError> {
        self.push_value(json!(["#comment", {}, text]))
    }

    fn processing_instruction(
        &mut self,
        target: &str,
        data: &str,
    ) -> Result<(), TransformError> {
        self.push_value(json!([format!("?{}", target), {}, data]))
    }

    fn begin_object(&mut self) -> Result<(), TransformError> {
        if let Some(Frame::Element { open, .. }) = self.frames.last_mut() {
            *open = false;
        }
        self.frames.push(Frame::Object {
            map: Map::new(),
            pending: None,
        });
        Ok(())
    }

    fn property(&mut self, name: &str) -> Result<(), TransformError> {
        match self.frames.last_mut() {
            Some(Frame::Object { pending, .. }) => {
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
        match self.frames.pop() {
            Some(Frame::Object { map, .. }) => self.push_value(Value::Object(map)),
            Some(other) => {
                self.frames.push(other);
                Err(TransformError::BuilderState(
                    "end_object while in a non-object build".to_string(),
                ))
            }
            None => Err(TransformError::BuilderState(
                "end_object without an open object".to_string(),
            )),
        }
    }

    fn begin_array(&mut self) -> Result<(), TransformError> {
        if let Some(Frame::Element { open, .. }) = self.frames.last_mut() {
            *open = false;
        }
        self.frames.push(Frame::Array(Vec::new()));
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), TransformError> {
        match self.frames.pop() {
            Some(Frame::Array(items)) => self.push_value(Value::Array(items)),
            Some(other) => {
                self.frames.push(other);
                Err(TransformError::BuilderState(
                    "end_array while in a non-array build".to_string(),
                ))
            }
            None => Err(TransformError::BuilderState(
                "end_array without an open array".to_string(),
            )),
        }
    }

    fn set_output_spec(&mut self, spec: OutputSpec) {
        self.spec = spec;
    }

    fn output_spec(&self) -> &OutputSpec {
        &self.spec
    }

    fn set_character_maps(&mut self, _maps: Vec<CharacterMap>) {
        // Character maps only affect serialized text output.
    }

    fn begin_document(&mut self) -> Result<(), TransformError> {
        self.snapshots.push((
            std::mem::take(&mut self.root),
            std::mem::take(&mut self.frames),
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
