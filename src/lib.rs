//! A declarative, template-driven tree-transformation engine.
//!
//! Given a hierarchical source — a JSON value or a parsed markup tree —
//! and a set of pattern-matched templates, `treeform` produces output in
//! one of three shapes: a markup string, a DOM tree, or a structured
//! JSON value. It is a stylesheet-processor analogue driven by two path
//! dialects (`treeform-jpath` for JSON sources, `treeform-treepath` for
//! trees) behind one template API.
//!
//! ```
//! use serde_json::json;
//! use treeform::{OutputKind, Processor, Template};
//!
//! let result = Processor::jsonpath(json!({ "greeting": "hello" }))
//!     .template(Template::matching("$", |ctx, _, _| {
//!         ctx.apply_templates(Some("$.greeting"), None)?;
//!         Ok(None)
//!     }))
//!     .template(Template::matching("$.greeting", |ctx, _, _| {
//!         ctx.value_of(".")?;
//!         Ok(None)
//!     }))
//!     .output_kind(OutputKind::String)
//!     .success(|_| {})
//!     .transform(None)
//!     .unwrap();
//! assert_eq!(result.output.as_text(), Some("hello"));
//! ```

pub mod analyze;
pub mod context;
pub mod engine;
pub mod error;
pub mod joiner;
pub mod mode;
pub mod number;
pub mod priority;
pub mod processor;
pub mod template;


pub use analyze::{Captured, Piece};
pub use context::json::{JsonAdapter, JsonNode};
pub use context::tree::TreeAdapter;
pub use context::{Branch, Context, GroupBy, KeyDef};
pub use engine::{EvalScope, NodeAdapter, NodeShape};
pub use error::TransformError;
pub use joiner::{
    CharacterMap, DomJoiner, JoiningTransformer, JsonJoiner, Output, OutputMethod,
    OutputSpec, ResultDocument, StringJoiner, TransformOutput,
};
pub use mode::{ModeConfig, OnMultipleMatch, OnNoMatch};
pub use number::{NumberLevel, NumberSpec};
pub use processor::{OutputKind, Processor};
pub use template::{InvokeConfig, Template, TemplateBody};

pub use treeform_dom as dom;
pub use treeform_jpath as jpath;
pub use treeform_treepath as treepath;
