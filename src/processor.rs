//! The facade: configuration, validation, and the top-level transform
//! call.
use crate::context::json::JsonAdapter;
use crate::context::tree::TreeAdapter;
use crate::context::Context;
use crate::engine::NodeAdapter;
use crate::error::TransformError;
use crate::joiner::{
    DomJoiner, JoiningTransformer, JsonJoiner, Output, StringJoiner, TransformOutput,
};
use crate::mode::{ModeConfig, OnMultipleMatch};
use crate::template::{InvokeConfig, Template};
use serde_json::Value;
use std::collections::HashSet;
use std::rc::Rc;
use treeform_treepath::Version;

/// Which accumulator the facade constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    #[default]
    String,
    Dom,
    Json,
}

/// A configured transform over one source document. Constructed through
/// [`Processor::jsonpath`] or [`Processor::treepath`], which is where the
/// engine flavor is chosen.
pub struct Processor<A: NodeAdapter> {
    adapter: A,
    templates: Vec<Template<A>>,
    initial_mode: Option<String>,
    output_kind: OutputKind,
    joiner: Option<Box<dyn JoiningTransformer>>,
    mode_config: ModeConfig,
    error_on_equal_priority: bool,
    resolve_priority: Rc<dyn Fn(&str) -> f64>,
    unwrap_single_result: bool,
    success: Option<Box<dyn FnMut(&Output)>>,
}

impl Processor<JsonAdapter> {
    /// A transform over a JSON value, navigated with the JSON path dialect.
    pub fn jsonpath(data: Value) -> Self {
        Self::with_adapter(JsonAdapter::new(data))
    }
}

impl Processor<TreeAdapter> {
    /// A transform over a parsed document tree, navigated with the tree
    /// path dialect.
    pub fn treepath(doc: treeform_dom::Document) -> Self {
        Self::with_adapter(TreeAdapter::new(doc, Version::default()))
    }

    /// Parses markup text and transforms the resulting tree.
    pub fn treepath_str(xml: &str) -> Result<Self, TransformError> {
        Ok(Self::treepath(treeform_dom::parse(xml)?))
    }

    /// Selects the tree-path evaluator tier.
    pub fn version(mut self, version: Version) -> Self {
        let doc = self.adapter.document().clone();
        self.adapter = TreeAdapter::new(doc, version);
        self
    }
}

impl<A: NodeAdapter> Processor<A> {
    fn with_adapter(adapter: A) -> Self {
        Processor {
            adapter,
            templates: Vec::new(),
            initial_mode: None,
            output_kind: OutputKind::default(),
            joiner: None,
            mode_config: ModeConfig::default(),
            error_on_equal_priority: false,
            resolve_priority: Rc::new(crate::priority::resolve),
            unwrap_single_result: false,
            success: None,
        }
    }

    pub fn template(mut self, template: Template<A>) -> Self {
        self.templates.push(template);
        self
    }

    pub fn templates(mut self, templates: Vec<Template<A>>) -> Self {
        self.templates.extend(templates);
        self
    }

    /// A bare callback treated as the sole root-matched template.
    pub fn query(
        self,
        body: impl Fn(&mut Context<A>, &A::Node, &InvokeConfig) -> Result<Option<Value>, TransformError>
            + 'static,
    ) -> Self {
        let pattern = self.adapter.root_pattern();
        self.template(Template::matching(pattern, body))
    }

    pub fn mode(mut self, mode: &str) -> Self {
        self.initial_mode = Some(mode.to_string());
        self
    }

    pub fn output_kind(mut self, kind: OutputKind) -> Self {
        self.output_kind = kind;
        self
    }

    /// Injects a pre-built accumulator instead of constructing one from
    /// the output kind.
    pub fn joining_transformer(mut self, joiner: Box<dyn JoiningTransformer>) -> Self {
        self.joiner = Some(joiner);
        self
    }

    pub fn mode_config(mut self, config: ModeConfig) -> Self {
        self.mode_config = config;
        self
    }

    /// Wires the default conflict policy to fail on equal priorities.
    pub fn error_on_equal_priority(mut self, enabled: bool) -> Self {
        self.error_on_equal_priority = enabled;
        self
    }

    /// Overrides the specificity resolver.
    pub fn priority_resolver(mut self, resolver: impl Fn(&str) -> f64 + 'static) -> Self {
        self.resolve_priority = Rc::new(resolver);
        self
    }

    /// For JSON output: collapse a single-element root array to its sole
    /// member.
    pub fn unwrap_single_result(mut self, enabled: bool) -> Self {
        self.unwrap_single_result = enabled;
        self
    }

    /// The required result callback; `transform` both returns the output
    /// and delivers it here.
    pub fn success(mut self, callback: impl FnMut(&Output) + 'static) -> Self {
        self.success = Some(Box::new(callback));
        self
    }

    fn validate(&self) -> Result<(), TransformError> {
        if self.success.is_none() {
            return Err(TransformError::Config(
                "a success callback is required".to_string(),
            ));
        }
        if self.templates.is_empty() {
            return Err(TransformError::Config(
                "at least one template is required".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for template in &self.templates {
            if let Some(name) = &template.name {
                if !names.insert(name.clone()) {
                    return Err(TransformError::DuplicateTemplateName(name.clone()));
                }
            }
        }
        Ok(())
    }

    fn build_joiner(&mut self) -> Box<dyn JoiningTransformer> {
        if let Some(joiner) = self.joiner.take() {
            return joiner;
        }
        match self.output_kind {
            OutputKind::String => Box::new(StringJoiner::new()),
            OutputKind::Dom => Box::new(DomJoiner::new()),
            OutputKind::Json => Box::new(JsonJoiner::new()),
        }
    }

    /// Runs the transform: validates, builds the accumulator and context,
    /// dispatches the root node under `mode` (or the configured initial
    /// mode), and returns the finished output after delivering it through
    /// the success callback.
    pub fn transform(mut self, mode: Option<&str>) -> Result<TransformOutput, TransformError> {
        self.validate()?;
        if self.error_on_equal_priority {
            self.mode_config.on_multiple_match = OnMultipleMatch::Fail;
        }

        let joiner = self.build_joiner();
        let requested = mode
            .map(String::from)
            .or_else(|| self.initial_mode.clone());
        log::debug!(
            "starting transform: {} template(s), mode {:?}",
            self.templates.len(),
            requested
        );

        let mut context = Context::new(
            self.adapter,
            joiner,
            Rc::new(self.templates),
            self.resolve_priority,
            self.mode_config,
        );
        context.apply_root(requested.as_deref())?;
        let mut result = context.finish()?;

        if self.unwrap_single_result {
            result.output = unwrap_single(result.output);
        }
        if let Some(callback) = self.success.as_mut() {
            callback(&result.output);
        }
        Ok(result)
    }
}

/// Collapses a one-element root array to its sole member.
fn unwrap_single(output: Output) -> Output {
    match output {
        Output::Json(Value::Array(items)) if items.len() == 1 => {
            Output::Json(items.into_iter().next().unwrap_or(Value::Null))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_callback_is_required() {
        let result = Processor::jsonpath(json!({}))
            .query(|_, _, _| Ok(None))
            .transform(None);
        assert!(matches!(result, Err(TransformError::Config(_))));
    }

    #[test]
    fn duplicate_template_names_are_rejected() {
        let result = Processor::jsonpath(json!({}))
            .template(Template::named("t", |_, _, _| Ok(None)))
            .template(Template::named("t", |_, _, _| Ok(None)))
            .success(|_| {})
            .transform(None);
        assert!(matches!(
            result,
            Err(TransformError::DuplicateTemplateName(_))
        ));
    }

    #[test]
    fn an_empty_template_set_is_rejected() {
        let result = Processor::jsonpath(json!({}))
            .success(|_| {})
            .transform(None);
        assert!(matches!(result, Err(TransformError::Config(_))));
    }

    #[test]
    fn unwrap_single_result_collapses_the_array() {
        assert_eq!(
            unwrap_single(Output::Json(json!(["only"]))),
            Output::Json(json!("only"))
        );
        assert_eq!(
            unwrap_single(Output::Json(json!(["a", "b"]))),
            Output::Json(json!(["a", "b"]))
        );
    }
}
