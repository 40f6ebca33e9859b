//! Template rules.
use crate::context::Context;
use crate::engine::NodeAdapter;
use crate::error::TransformError;
use serde_json::Value;

/// The body of a template: a closure invoked with the context, the matched
/// node, and the invocation configuration. A returned `Some(value)` is
/// appended to the output after the body runs.
pub type TemplateBody<A> = Box<
    dyn Fn(
        &mut Context<A>,
        &<A as NodeAdapter>::Node,
        &InvokeConfig,
    ) -> Result<Option<Value>, TransformError>,
>;

/// What a template invocation knows about how it was reached.
#[derive(Debug, Clone, Default)]
pub struct InvokeConfig {
    pub mode: Option<String>,
}

/// One transformation rule. A template without a pattern is name-only: it
/// never participates in pattern matching and is reachable only through
/// `call_template`.
pub struct Template<A: NodeAdapter> {
    pub pattern: Option<String>,
    pub name: Option<String>,
    pub mode: Option<String>,
    pub priority: Option<f64>,
    pub body: TemplateBody<A>,
}

impl<A: NodeAdapter> Template<A> {
    /// A pattern-matched template.
    pub fn matching(
        pattern: &str,
        body: impl Fn(
                &mut Context<A>,
                &A::Node,
                &InvokeConfig,
            ) -> Result<Option<Value>, TransformError>
            + 'static,
    ) -> Self {
        Template {
            pattern: Some(pattern.to_string()),
            name: None,
            mode: None,
            priority: None,
            body: Box::new(body),
        }
    }

    /// A name-only template, reachable through `call_template`.
    pub fn named(
        name: &str,
        body: impl Fn(
                &mut Context<A>,
                &A::Node,
                &InvokeConfig,
            ) -> Result<Option<Value>, TransformError>
            + 'static,
    ) -> Self {
        Template {
            pattern: None,
            name: Some(name.to_string()),
            mode: None,
            priority: None,
            body: Box::new(body),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_mode(mut self, mode: &str) -> Self {
        self.mode = Some(mode.to_string());
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// A label for diagnostics: the name if present, otherwise the pattern.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.pattern.as_deref())
            .unwrap_or("<anonymous>")
    }
}

impl<A: NodeAdapter> std::fmt::Debug for Template<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("pattern", &self.pattern)
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}
