//! Output accumulation.
//!
//! Three accumulator implementations share one contract: templates emit
//! events (elements, attributes, text, objects, arrays) through the
//! [`JoiningTransformer`] trait and the accumulator joins them into a
//! markup string, a DOM tree, or a structured-array value.
//!
//! The central invariant is the build-state stack: exactly one
//! [`BuildState`] is active at any time, nested builder calls push a new
//! state and restore the previous one on return. All three implementations
//! enforce the same failure semantics through it: a scalar appended inside
//! an object build without a pending property name is an error, and so is
//! an attribute declared after the owning element's open tag was closed by
//! content.

mod dom;
mod json;
mod string;

pub use dom::DomJoiner;
pub use json::JsonJoiner;
pub use string::StringJoiner;

use crate::error::TransformError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The transient build state of an accumulator.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildState {
    /// Top level, or inside closed element content.
    Free,
    /// Inside an object build. `pending` holds the property name the next
    /// appended value will be assigned to.
    InObject { pending: Option<String> },
    /// Inside an array build.
    InArray,
    /// Inside an element whose open tag has not been closed yet, so
    /// attributes are still legal.
    InOpenTag { name: String },
}

/// Serialization options declared through `output()`. Only fields that were
/// actually set are rendered. Deserializable, so an output declaration can
/// sit in template configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputSpec {
    pub method: Option<OutputMethod>,
    pub version: Option<String>,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
    pub doctype_public: Option<String>,
    pub doctype_system: Option<String>,
    pub omit_xml_declaration: bool,
    pub use_character_maps: Vec<String>,
    pub cdata_section_elements: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMethod {
    Xml,
    Html,
    Xhtml,
    Text,
}

impl OutputMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMethod::Xml => "xml",
            OutputMethod::Html => "html",
            OutputMethod::Xhtml => "xhtml",
            OutputMethod::Text => "text",
        }
    }
}

impl OutputSpec {
    /// True when any declaration field was set and the declaration was not
    /// explicitly omitted.
    pub fn wants_declaration(&self) -> bool {
        !self.omit_xml_declaration
            && (self.version.is_some() || self.encoding.is_some() || self.standalone.is_some())
    }

    /// The declaration body, rendering only the declared subset of
    /// version/encoding/standalone.
    pub fn declaration_body(&self) -> String {
        let mut parts = Vec::new();
        if let Some(v) = &self.version {
            parts.push(format!("version=\"{}\"", v));
        }
        if let Some(e) = &self.encoding {
            parts.push(format!("encoding=\"{}\"", e));
        }
        if let Some(s) = self.standalone {
            parts.push(format!("standalone=\"{}\"", if s { "yes" } else { "no" }));
        }
        parts.join(" ")
    }
}

/// A named character-substitution table applied to text and attribute
/// values before escaping.
#[derive(Debug, Clone, Default)]
pub struct CharacterMap {
    pub name: String,
    pub map: HashMap<char, String>,
}

/// Applies every in-use character map to `text`, in declaration order.
pub fn apply_character_maps(text: &str, maps: &[CharacterMap]) -> String {
    if maps.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    'chars: for c in text.chars() {
        for map in maps {
            if let Some(replacement) = map.map.get(&c) {
                out.push_str(replacement);
                continue 'chars;
            }
        }
        out.push(c);
    }
    out
}

/// The finished primary accumulation of one transform (or of one nested
/// document scope).
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Text(String),
    Dom(treeform_dom::Document),
    Json(Value),
}

impl Output {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Output::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Output::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dom(&self) -> Option<&treeform_dom::Document> {
        match self {
            Output::Dom(d) => Some(d),
            _ => None,
        }
    }
}

/// A secondary output produced by `result_document()`, tagged with its
/// destination and resolved format.
#[derive(Debug, Clone)]
pub struct ResultDocument {
    pub href: String,
    pub format: String,
    pub content: Output,
}

/// Secondary accumulations collected over one transform: anonymous
/// `document()` scopes in order, and keyed `result_document()` outputs.
#[derive(Debug, Clone, Default)]
pub struct DocumentLog {
    pub documents: Vec<Output>,
    pub result_documents: Vec<ResultDocument>,
}

/// The complete result of a transform.
#[derive(Debug)]
pub struct TransformOutput {
    pub output: Output,
    pub documents: Vec<Output>,
    pub result_documents: Vec<ResultDocument>,
}

/// The accumulator contract shared by the string, DOM, and structured-array
/// implementations.
pub trait JoiningTransformer {
    /// Appends a scalar value, routed by the active build state: object
    /// states require a pending property, array states push an item, tag
    /// states close the open tag first.
    fn append(&mut self, value: &Value) -> Result<(), TransformError>;

    /// Appends text content, character-mapped and escaped per the
    /// implementation's rules.
    fn text(&mut self, text: &str) -> Result<(), TransformError>;

    /// Appends text verbatim, bypassing character maps and escaping.
    fn raw(&mut self, text: &str) -> Result<(), TransformError>;

    fn begin_element(&mut self, name: &str) -> Result<(), TransformError>;
    fn attribute(&mut self, name: &str, value: &str) -> Result<(), TransformError>;
    fn end_element(&mut self) -> Result<(), TransformError>;
    fn comment(&mut self, text: &str) -> Result<(), TransformError>;
    fn processing_instruction(&mut self, target: &str, data: &str)
        -> Result<(), TransformError>;

    fn begin_object(&mut self) -> Result<(), TransformError>;
    /// Names the property the next appended value is assigned to.
    fn property(&mut self, name: &str) -> Result<(), TransformError>;
    fn end_object(&mut self) -> Result<(), TransformError>;
    fn begin_array(&mut self) -> Result<(), TransformError>;
    fn end_array(&mut self) -> Result<(), TransformError>;

    fn set_output_spec(&mut self, spec: OutputSpec);
    fn output_spec(&self) -> &OutputSpec;
    /// Installs the character maps named by the output spec's
    /// `use_character_maps`, resolved by the context.
    fn set_character_maps(&mut self, maps: Vec<CharacterMap>);

    /// Opens an isolated nested accumulation scope: the enclosing state is
    /// snapshotted and a fresh accumulator takes its place.
    fn begin_document(&mut self) -> Result<(), TransformError>;
    /// Closes the innermost document scope, restores the enclosing state,
    /// and records the finished sub-document in the document log.
    fn end_document(&mut self) -> Result<(), TransformError>;
    /// Like [`end_document`](Self::end_document), but records the result
    /// keyed by `href` with the given resolved format.
    fn end_result_document(
        &mut self,
        href: &str,
        format: String,
    ) -> Result<(), TransformError>;

    /// Consumes the accumulation and returns the finished output plus the
    /// document log.
    fn finish(&mut self) -> Result<TransformOutput, TransformError>;
}

/// Resolves the format of a result document: a method declared through
/// `output()` inside the document scope wins over the per-call fallback.
pub fn resolve_result_format(spec: &OutputSpec, fallback: Option<&str>) -> String {
    match (&spec.method, fallback) {
        (Some(method), _) => method.as_str().to_string(),
        (None, Some(f)) => f.to_string(),
        (None, None) => "xml".to_string(),
    }
}
