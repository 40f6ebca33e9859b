//! The transformation context: the object template bodies run against.
//!
//! One context lives for exactly one transform. The current node and its
//! parent are swapped with stack discipline around every nested template
//! application; every registry (variables, keys, property sets, attribute
//! sets, character maps, namespace aliases, functions) is transform-scoped
//! and mutates monotonically.

pub mod json;
pub mod tree;

use crate::analyze::{self, Captured, Piece};
use crate::engine::{find_template, EvalScope, NodeAdapter, NodeShape};
use crate::error::TransformError;
use crate::joiner::{CharacterMap, JoiningTransformer, OutputSpec, TransformOutput};
use crate::mode::{ModeConfig, OnNoMatch};
use crate::number::{calculate_position, format_positions, NumberSpec};
use crate::template::{InvokeConfig, Template};
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// A named `{match, use}` pair for lookup-by-value queries.
#[derive(Debug, Clone)]
pub struct KeyDef {
    pub match_pattern: String,
    pub use_expr: String,
}

/// How `for_each_group` partitions a node set.
pub enum GroupBy<'g> {
    /// Group by equal computed key, first-seen order.
    Key(&'g str),
    /// Group adjacent runs of equal computed key.
    Adjacent(&'g str),
    /// Start a new group at every node matching the pattern.
    StartingWith(&'g str),
    /// Close the group after every node matching the pattern.
    EndingWith(&'g str),
}

/// One arm of a `choose`.
pub struct Branch<'c, A: NodeAdapter> {
    pub test: &'c str,
    pub body: Box<dyn FnOnce(&mut Context<A>) -> Result<(), TransformError> + 'c>,
}

impl<'c, A: NodeAdapter> Branch<'c, A> {
    pub fn new(
        test: &'c str,
        body: impl FnOnce(&mut Context<A>) -> Result<(), TransformError> + 'c,
    ) -> Self {
        Branch {
            test,
            body: Box::new(body),
        }
    }
}

/// A namespaced, arity-keyed callable registered by templates.
pub type ContextFunction<A> =
    dyn Fn(&mut Context<A>, Vec<Value>) -> Result<Value, TransformError>;

pub struct Context<A: NodeAdapter> {
    adapter: A,
    out: Box<dyn JoiningTransformer>,
    templates: Rc<Vec<Template<A>>>,
    resolve_priority: Rc<dyn Fn(&str) -> f64>,

    current: A::Node,
    parent: Option<A::Node>,
    parent_key: Option<String>,
    loop_position: Option<usize>,

    variables: HashMap<String, Value>,
    params: HashMap<String, Value>,
    keys: HashMap<String, KeyDef>,
    property_sets: HashMap<String, Vec<(String, Value)>>,
    attribute_sets: HashMap<String, Vec<(String, String)>>,
    character_maps: HashMap<String, CharacterMap>,
    namespace_aliases: HashMap<String, String>,
    functions: HashMap<(String, String, usize), Rc<ContextFunction<A>>>,

    mode_config: ModeConfig,
}

impl<A: NodeAdapter> Context<A> {
    pub fn new(
        adapter: A,
        out: Box<dyn JoiningTransformer>,
        templates: Rc<Vec<Template<A>>>,
        resolve_priority: Rc<dyn Fn(&str) -> f64>,
        mode_config: ModeConfig,
    ) -> Self {
        let current = adapter.root();
        Context {
            adapter,
            out,
            templates,
            resolve_priority,
            current,
            parent: None,
            parent_key: None,
            loop_position: None,
            variables: HashMap::new(),
            params: HashMap::new(),
            keys: HashMap::new(),
            property_sets: HashMap::new(),
            attribute_sets: HashMap::new(),
            character_maps: HashMap::new(),
            namespace_aliases: HashMap::new(),
            functions: HashMap::new(),
            mode_config,
        }
    }

    // --- State access ---

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn current(&self) -> &A::Node {
        &self.current
    }

    pub fn parent(&self) -> Option<&A::Node> {
        self.parent.as_ref()
    }

    /// The property key the current node sits under, where it has one.
    pub fn parent_key(&self) -> Option<&str> {
        self.parent_key.as_deref()
    }

    pub fn mode_config(&self) -> &ModeConfig {
        &self.mode_config
    }

    fn scope(&self) -> EvalScope<'_> {
        EvalScope {
            variables: &self.variables,
            loop_position: self.loop_position,
        }
    }

    // --- Expression access ---

    /// Evaluates an expression against the current node.
    pub fn evaluate(&self, expr: &str) -> Result<Value, TransformError> {
        self.adapter.evaluate(expr, &self.current, &self.scope())
    }

    /// The boolean test shared by choose/if/assert: node-set non-emptiness,
    /// or scalar truthiness.
    pub fn test(&self, expr: &str) -> Result<bool, TransformError> {
        self.adapter.evaluate_bool(expr, &self.current, &self.scope())
    }

    /// Selects the node set an expression denotes, from the current node.
    pub fn select(&self, expr: &str) -> Result<Vec<A::Node>, TransformError> {
        self.adapter.select(expr, &self.current, &self.scope())
    }

    // --- Template dispatch ---

    /// Applies templates to the node set `expr` selects (the current
    /// node's children when `expr` is `None`), under `mode`.
    pub fn apply_templates(
        &mut self,
        expr: Option<&str>,
        mode: Option<&str>,
    ) -> Result<(), TransformError> {
        let nodes = match expr {
            Some(e) => self.select(e)?,
            None => self.adapter.children(&self.current),
        };
        for (position, node) in nodes.iter().enumerate() {
            self.apply_to_node(node, mode, position)?;
        }
        Ok(())
    }

    /// Template dispatch for a single node: priority rules, conflict
    /// policy, then the winning body, or the default rules when nothing
    /// matched.
    fn apply_to_node(
        &mut self,
        node: &A::Node,
        mode: Option<&str>,
        position: usize,
    ) -> Result<(), TransformError> {
        let templates = Rc::clone(&self.templates);
        let found = find_template(
            &templates,
            &self.adapter,
            node,
            mode,
            &*self.resolve_priority,
            &self.mode_config,
        )?;

        match found {
            Some(index) => {
                let cfg = InvokeConfig {
                    mode: mode.map(String::from),
                };
                let returned =
                    self.invoke_body(&templates[index], node, &cfg, Some(position))?;
                if let Some(value) = returned {
                    self.out.append(&value)?;
                }
                Ok(())
            }
            None => {
                if self.mode_config.warning_on_no_match {
                    log::warn!(
                        "no template matched (mode {:?}); falling back to {:?}",
                        mode,
                        self.mode_config.on_no_match
                    );
                }
                self.default_rule(node, mode)
            }
        }
    }

    /// Runs a template body with the context triple swapped to the node,
    /// restoring it afterwards.
    fn invoke_body(
        &mut self,
        template: &Template<A>,
        node: &A::Node,
        cfg: &InvokeConfig,
        position: Option<usize>,
    ) -> Result<Option<Value>, TransformError> {
        let saved_current = std::mem::replace(&mut self.current, node.clone());
        let saved_parent =
            std::mem::replace(&mut self.parent, self.adapter.parent(node));
        let saved_key =
            std::mem::replace(&mut self.parent_key, self.adapter.node_name(node));
        let saved_position = self.loop_position;
        if let Some(p) = position {
            self.loop_position = Some(p);
        }

        let result = (template.body)(self, node, cfg);

        self.current = saved_current;
        self.parent = saved_parent;
        self.parent_key = saved_key;
        self.loop_position = saved_position;
        result
    }

    /// The built-in fallback rules, selected by node shape and governed by
    /// the active `on_no_match` policy.
    fn default_rule(&mut self, node: &A::Node, mode: Option<&str>) -> Result<(), TransformError> {
        match self.mode_config.on_no_match {
            OnNoMatch::Fail => Err(TransformError::NoMatch),
            OnNoMatch::ShallowCopy => {
                self.adapter.shallow_copy(node, self.out.as_mut())
            }
            OnNoMatch::DeepCopy => self.adapter.deep_copy(node, self.out.as_mut()),
            OnNoMatch::TextOnlyCopy => match self.adapter.shape(node) {
                NodeShape::Leaf => {
                    let text = self.adapter.text_content(node);
                    self.out.text(&text)
                }
                NodeShape::Other => Ok(()),
                NodeShape::Branch if !self.adapter.branch_text() => Ok(()),
                _ => self.apply_to_children(node, mode),
            },
            OnNoMatch::ApplyTemplates | OnNoMatch::ShallowSkip => {
                self.apply_to_children(node, mode)
            }
            OnNoMatch::DeepSkip => Ok(()),
        }
    }

    fn apply_to_children(
        &mut self,
        node: &A::Node,
        mode: Option<&str>,
    ) -> Result<(), TransformError> {
        for (position, child) in self.adapter.children(node).iter().enumerate() {
            self.apply_to_node(child, mode, position)?;
        }
        Ok(())
    }

    /// Invokes a named template directly, independent of pattern matching.
    /// Parameter bindings are saved into `params` and restored afterwards.
    pub fn call_template(
        &mut self,
        name: &str,
        params: Vec<(String, Value)>,
    ) -> Result<(), TransformError> {
        let templates = Rc::clone(&self.templates);
        let template = templates
            .iter()
            .find(|t| t.name.as_deref() == Some(name))
            .ok_or_else(|| TransformError::UnknownNamedTemplate(name.to_string()))?;

        let saved_params = std::mem::take(&mut self.params);
        self.params = params.into_iter().collect();

        let cfg = InvokeConfig::default();
        let node = self.current.clone();
        let result = self.invoke_body(template, &node, &cfg, None);

        self.params = saved_params;
        if let Some(value) = result? {
            self.out.append(&value)?;
        }
        Ok(())
    }

    /// The current call-scoped parameter bindings.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    // --- Iteration ---

    /// Invokes `body` once per selected node, without template dispatch.
    pub fn for_each(
        &mut self,
        expr: &str,
        mut body: impl FnMut(&mut Self, &A::Node) -> Result<(), TransformError>,
    ) -> Result<(), TransformError> {
        let nodes = self.select(expr)?;
        for (position, node) in nodes.iter().enumerate() {
            let saved_current = std::mem::replace(&mut self.current, node.clone());
            let saved_position = self.loop_position.replace(position);
            let result = body(self, node);
            self.current = saved_current;
            self.loop_position = saved_position;
            result?;
        }
        Ok(())
    }

    /// Partitions the selected node set and invokes `body` once per group
    /// with the group's key and members.
    pub fn for_each_group(
        &mut self,
        expr: &str,
        grouping: GroupBy<'_>,
        mut body: impl FnMut(&mut Self, &Value, &[A::Node]) -> Result<(), TransformError>,
    ) -> Result<(), TransformError> {
        let nodes = self.select(expr)?;
        let groups = self.partition(&nodes, &grouping)?;
        for (key, members) in groups {
            let Some(first) = members.first() else {
                continue;
            };
            let saved_current = std::mem::replace(&mut self.current, first.clone());
            let result = body(self, &key, &members);
            self.current = saved_current;
            result?;
        }
        Ok(())
    }

    fn partition(
        &self,
        nodes: &[A::Node],
        grouping: &GroupBy<'_>,
    ) -> Result<Vec<(Value, Vec<A::Node>)>, TransformError> {
        match grouping {
            GroupBy::Key(key_expr) => {
                let mut order: Vec<Value> = Vec::new();
                let mut groups: HashMap<String, Vec<A::Node>> = HashMap::new();
                for node in nodes {
                    let key = self.adapter.evaluate(key_expr, node, &self.scope())?;
                    let tag = key.to_string();
                    if !groups.contains_key(&tag) {
                        order.push(key);
                    }
                    groups.entry(tag).or_default().push(node.clone());
                }
                Ok(order
                    .into_iter()
                    .map(|key| {
                        let members = groups.remove(&key.to_string()).unwrap_or_default();
                        (key, members)
                    })
                    .collect())
            }
            GroupBy::Adjacent(key_expr) => {
                let mut result: Vec<(Value, Vec<A::Node>)> = Vec::new();
                for node in nodes {
                    let key = self.adapter.evaluate(key_expr, node, &self.scope())?;
                    match result.last_mut() {
                        Some((last_key, members)) if *last_key == key => {
                            members.push(node.clone());
                        }
                        _ => result.push((key, vec![node.clone()])),
                    }
                }
                Ok(result)
            }
            GroupBy::StartingWith(pattern) => {
                let mut result: Vec<(Value, Vec<A::Node>)> = Vec::new();
                for node in nodes {
                    let starts = self.adapter.matches(pattern, node)?;
                    if starts || result.is_empty() {
                        result.push((Value::from(result.len() + 1), Vec::new()));
                    }
                    if let Some((_, members)) = result.last_mut() {
                        members.push(node.clone());
                    }
                }
                Ok(result)
            }
            GroupBy::EndingWith(pattern) => {
                let mut result: Vec<(Value, Vec<A::Node>)> = Vec::new();
                let mut open = false;
                for node in nodes {
                    if !open {
                        result.push((Value::from(result.len() + 1), Vec::new()));
                        open = true;
                    }
                    if let Some((_, members)) = result.last_mut() {
                        members.push(node.clone());
                    }
                    if self.adapter.matches(pattern, node)? {
                        open = false;
                    }
                }
                Ok(result)
            }
        }
    }

    // --- Conditionals ---

    /// Takes the first branch whose test passes, else `otherwise`.
    pub fn choose<'c>(
        &mut self,
        branches: Vec<Branch<'c, A>>,
        otherwise: Option<Box<dyn FnOnce(&mut Self) -> Result<(), TransformError> + 'c>>,
    ) -> Result<(), TransformError> {
        for branch in branches {
            if self.test(branch.test)? {
                return (branch.body)(self);
            }
        }
        if let Some(body) = otherwise {
            return body(self);
        }
        Ok(())
    }

    /// Runs `body` when the test passes; reports whether it did.
    pub fn if_(
        &mut self,
        test: &str,
        body: impl FnOnce(&mut Self) -> Result<(), TransformError>,
    ) -> Result<bool, TransformError> {
        if self.test(test)? {
            body(self)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Raises unless the test passes.
    pub fn assert(&mut self, test: &str, message: Option<&str>) -> Result<(), TransformError> {
        if self.test(test)? {
            Ok(())
        } else {
            Err(TransformError::Assertion(
                message.unwrap_or(test).to_string(),
            ))
        }
    }

    // --- Output building ---

    /// Evaluates an expression and appends its text rendering.
    pub fn value_of(&mut self, expr: &str) -> Result<(), TransformError> {
        let value = self.evaluate(expr)?;
        let text = match &value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        self.out.text(&text)
    }

    pub fn text(&mut self, content: &str) -> Result<(), TransformError> {
        self.out.text(content)
    }

    /// Appends text verbatim, bypassing escaping and character maps.
    pub fn raw(&mut self, content: &str) -> Result<(), TransformError> {
        self.out.raw(content)
    }

    pub fn append(&mut self, value: &Value) -> Result<(), TransformError> {
        self.out.append(value)
    }

    pub fn comment(&mut self, content: &str) -> Result<(), TransformError> {
        self.out.comment(content)
    }

    pub fn processing_instruction(
        &mut self,
        target: &str,
        data: &str,
    ) -> Result<(), TransformError> {
        self.out.processing_instruction(target, data)
    }

    /// Builds an element around `body`. The name passes through any
    /// declared namespace alias.
    pub fn element(
        &mut self,
        name: &str,
        body: impl FnOnce(&mut Self) -> Result<(), TransformError>,
    ) -> Result<(), TransformError> {
        let resolved = self.aliased_name(name);
        self.out.begin_element(&resolved)?;
        body(self)?;
        self.out.end_element()
    }

    pub fn attribute(&mut self, name: &str, value: &str) -> Result<(), TransformError> {
        let resolved = self.aliased_name(name);
        self.out.attribute(&resolved, value)
    }

    /// Applies every attribute of a declared attribute set.
    pub fn use_attribute_set(&mut self, name: &str) -> Result<(), TransformError> {
        let set = self
            .attribute_sets
            .get(name)
            .cloned()
            .ok_or_else(|| TransformError::Config(format!("unknown attribute set '{}'", name)))?;
        for (attr, value) in set {
            self.attribute(&attr, &value)?;
        }
        Ok(())
    }

    pub fn object(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<(), TransformError>,
    ) -> Result<(), TransformError> {
        self.out.begin_object()?;
        body(self)?;
        self.out.end_object()
    }

    pub fn array(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<(), TransformError>,
    ) -> Result<(), TransformError> {
        self.out.begin_array()?;
        body(self)?;
        self.out.end_array()
    }

    /// Names the property the next appended value fills.
    pub fn property(&mut self, name: &str) -> Result<(), TransformError> {
        self.out.property(name)
    }

    /// Writes every property of a declared property set into the current
    /// object build.
    pub fn use_property_set(&mut self, name: &str) -> Result<(), TransformError> {
        let set = self
            .property_sets
            .get(name)
            .cloned()
            .ok_or_else(|| TransformError::Config(format!("unknown property set '{}'", name)))?;
        for (prop, value) in set {
            self.out.property(&prop)?;
            self.out.append(&value)?;
        }
        Ok(())
    }

    /// Deep-copies the nodes `expr` selects (the current node when `None`)
    /// into the output.
    pub fn copy_of(&mut self, expr: Option<&str>) -> Result<(), TransformError> {
        let nodes = match expr {
            Some(e) => self.select(e)?,
            None => vec![self.current.clone()],
        };
        for node in nodes {
            self.adapter.deep_copy(&node, self.out.as_mut())?;
        }
        Ok(())
    }

    // --- Registries ---

    /// Binds a variable. Bindings are conventionally write-once; rebinding
    /// replaces the value.
    pub fn variable(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    pub fn variable_value(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn property_set(&mut self, name: &str, properties: Vec<(String, Value)>) {
        self.property_sets.insert(name.to_string(), properties);
    }

    pub fn attribute_set(&mut self, name: &str, attributes: Vec<(String, String)>) {
        self.attribute_sets.insert(name.to_string(), attributes);
    }

    pub fn character_map(&mut self, name: &str, map: HashMap<char, String>) {
        self.character_maps.insert(
            name.to_string(),
            CharacterMap {
                name: name.to_string(),
                map,
            },
        );
    }

    pub fn namespace_alias(&mut self, from_prefix: &str, to_prefix: &str) {
        self.namespace_aliases
            .insert(from_prefix.to_string(), to_prefix.to_string());
    }

    fn aliased_name(&self, name: &str) -> String {
        let Some((prefix, local)) = name.split_once(':') else {
            return name.to_string();
        };
        match self.namespace_aliases.get(prefix) {
            Some(alias) if alias.is_empty() => local.to_string(),
            Some(alias) => format!("{}:{}", alias, local),
            None => name.to_string(),
        }
    }

    /// Declares a named key for `get_key` lookups.
    pub fn key(&mut self, name: &str, match_pattern: &str, use_expr: &str) {
        self.keys.insert(
            name.to_string(),
            KeyDef {
                match_pattern: match_pattern.to_string(),
                use_expr: use_expr.to_string(),
            },
        );
    }

    /// Looks up every node whose key value equals `value`, across the whole
    /// document.
    pub fn get_key(&self, name: &str, value: &Value) -> Result<Vec<A::Node>, TransformError> {
        let def = self
            .keys
            .get(name)
            .ok_or_else(|| TransformError::UnknownKey(name.to_string()))?;
        let wanted = value_text(value);
        let mut found = Vec::new();
        let mut stack = vec![self.adapter.root()];
        while let Some(node) = stack.pop() {
            if self.adapter.matches(&def.match_pattern, &node)? {
                let key = self.adapter.evaluate(&def.use_expr, &node, &self.scope())?;
                if value_text(&key) == wanted {
                    found.push(node.clone());
                }
            }
            let mut children = self.adapter.children(&node);
            children.reverse();
            stack.extend(children);
        }
        Ok(found)
    }

    /// Registers a namespaced, arity-keyed function. An empty namespace or
    /// a duplicate registration is a configuration error.
    pub fn function(
        &mut self,
        namespace: &str,
        name: &str,
        arity: usize,
        body: impl Fn(&mut Self, Vec<Value>) -> Result<Value, TransformError> + 'static,
    ) -> Result<(), TransformError> {
        if namespace.is_empty() {
            return Err(TransformError::FunctionWithoutNamespace(name.to_string()));
        }
        let key = (namespace.to_string(), name.to_string(), arity);
        if self.functions.contains_key(&key) {
            return Err(TransformError::DuplicateFunction {
                namespace: namespace.to_string(),
                name: name.to_string(),
                arity,
            });
        }
        self.functions.insert(key, Rc::new(body));
        Ok(())
    }

    /// Calls a registered function, resolved by namespace, name, and the
    /// argument count.
    pub fn invoke(
        &mut self,
        namespace: &str,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, TransformError> {
        let key = (namespace.to_string(), name.to_string(), args.len());
        let func = self
            .functions
            .get(&key)
            .cloned()
            .ok_or_else(|| TransformError::UnknownFunction {
                namespace: namespace.to_string(),
                name: name.to_string(),
                arity: args.len(),
            })?;
        func(self, args)
    }

    // --- Mode configuration ---

    /// Runs `body` under a replacement mode configuration, restoring the
    /// enclosing one afterwards.
    pub fn with_mode_config(
        &mut self,
        config: ModeConfig,
        body: impl FnOnce(&mut Self) -> Result<(), TransformError>,
    ) -> Result<(), TransformError> {
        let saved = std::mem::replace(&mut self.mode_config, config);
        let result = body(self);
        self.mode_config = saved;
        result
    }

    // --- Formatting helpers ---

    /// Formats a number: the explicit value when given, otherwise the
    /// calculated position of the current node.
    pub fn number(&self, spec: &NumberSpec) -> Result<String, TransformError> {
        let positions = match spec.value {
            Some(v) => vec![v],
            None => calculate_position(&self.adapter, spec, &self.current)?,
        };
        Ok(format_positions(&positions, spec))
    }

    /// Splits `input` by repeatedly matching `pattern`, dispatching matches
    /// to `matching` and the gaps between them to `non_matching`.
    pub fn analyze_string(
        &mut self,
        input: &str,
        pattern: &str,
        flags: &str,
        matching: &mut dyn FnMut(&mut Self, &Captured) -> Result<(), TransformError>,
        mut non_matching: Option<&mut dyn FnMut(&mut Self, &str) -> Result<(), TransformError>>,
    ) -> Result<(), TransformError> {
        for piece in analyze::analyze(input, pattern, flags)? {
            match piece {
                Piece::Match(captured) => matching(self, &captured)?,
                Piece::Gap(gap) => {
                    if let Some(handler) = non_matching.as_mut() {
                        handler(self, &gap)?;
                    }
                }
            }
        }
        Ok(())
    }

    // --- Output configuration and secondary documents ---

    /// Declares serialization options and installs any in-use character
    /// maps on the accumulator.
    pub fn output(&mut self, spec: OutputSpec) -> Result<(), TransformError> {
        let mut maps = Vec::new();
        for name in &spec.use_character_maps {
            let map = self.character_maps.get(name).cloned().ok_or_else(|| {
                TransformError::Config(format!("unknown character map '{}'", name))
            })?;
            maps.push(map);
        }
        self.out.set_character_maps(maps);
        self.out.set_output_spec(spec);
        Ok(())
    }

    /// Accumulates `body` into an isolated sub-document, appended to the
    /// transform's document list.
    pub fn document(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<(), TransformError>,
    ) -> Result<(), TransformError> {
        self.out.begin_document()?;
        body(self)?;
        self.out.end_document()
    }

    /// Like [`document`](Self::document), but tags the result with `href`.
    /// The format declared through `output()` inside the scope wins over
    /// the `format` fallback.
    pub fn result_document(
        &mut self,
        href: &str,
        format: Option<&str>,
        body: impl FnOnce(&mut Self) -> Result<(), TransformError>,
    ) -> Result<(), TransformError> {
        self.out.begin_document()?;
        body(self)?;
        let resolved =
            crate::joiner::resolve_result_format(self.out.output_spec(), format);
        self.out.end_result_document(href, resolved)
    }

    /// Finishes the accumulation. Used by the facade once the root rule
    /// returns.
    pub(crate) fn finish(mut self) -> Result<TransformOutput, TransformError> {
        self.out.finish()
    }

    /// Dispatches the initial node under the initial mode. Used by the
    /// facade.
    pub(crate) fn apply_root(&mut self, mode: Option<&str>) -> Result<(), TransformError> {
        let root = self.adapter.root();
        self.apply_to_node(&root, mode, 0)
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
