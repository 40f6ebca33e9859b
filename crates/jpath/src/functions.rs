//! Built-in functions for the JSON path dialect.
use crate::engine::{value_to_string, EvaluationContext};
use crate::error::JPathError;
use serde_json::Value;
use std::collections::HashMap;

pub type JPathFunction =
    fn(&EvaluationContext<'_>, Vec<Value>) -> Result<Value, JPathError>;

/// Holds every callable function, looked up case-insensitively.
pub struct FunctionRegistry {
    functions: HashMap<String, JPathFunction>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };
        registry.register("upper", fn_upper);
        registry.register("lower", fn_lower);
        registry.register("concat", fn_concat);
        registry.register("contains", fn_contains);
        registry.register("count", fn_count);
        registry.register("position", fn_position);
        registry.register("equals", fn_equals);
        registry.register("join", fn_join);
        registry.register("not", fn_not);
        registry
    }
}

impl FunctionRegistry {
    pub fn register(&mut self, name: &str, func: JPathFunction) {
        self.functions.insert(name.to_lowercase(), func);
    }

    pub fn get(&self, name: &str) -> Option<&JPathFunction> {
        self.functions.get(&name.to_lowercase())
    }
}

fn arity_error(function: &str, expected: &str) -> JPathError {
    JPathError::Function {
        function: function.to_string(),
        message: format!("expected {} argument(s)", expected),
    }
}

fn fn_upper(_ctx: &EvaluationContext<'_>, args: Vec<Value>) -> Result<Value, JPathError> {
    match args.as_slice() {
        [v] => Ok(Value::String(value_to_string(v).to_uppercase())),
        _ => Err(arity_error("upper", "1")),
    }
}

fn fn_lower(_ctx: &EvaluationContext<'_>, args: Vec<Value>) -> Result<Value, JPathError> {
    match args.as_slice() {
        [v] => Ok(Value::String(value_to_string(v).to_lowercase())),
        _ => Err(arity_error("lower", "1")),
    }
}

fn fn_concat(_ctx: &EvaluationContext<'_>, args: Vec<Value>) -> Result<Value, JPathError> {
    let joined: String = args.iter().map(value_to_string).collect();
    Ok(Value::String(joined))
}

fn fn_contains(_ctx: &EvaluationContext<'_>, args: Vec<Value>) -> Result<Value, JPathError> {
    match args.as_slice() {
        [haystack, needle] => Ok(Value::Bool(
            value_to_string(haystack).contains(&value_to_string(needle)),
        )),
        _ => Err(arity_error("contains", "2")),
    }
}

fn fn_count(_ctx: &EvaluationContext<'_>, args: Vec<Value>) -> Result<Value, JPathError> {
    match args.as_slice() {
        [Value::Array(items)] => Ok(Value::from(items.len())),
        [Value::Object(map)] => Ok(Value::from(map.len())),
        [Value::Null] => Ok(Value::from(0)),
        [_] => Ok(Value::from(1)),
        _ => Err(arity_error("count", "1")),
    }
}

fn fn_position(ctx: &EvaluationContext<'_>, args: Vec<Value>) -> Result<Value, JPathError> {
    if !args.is_empty() {
        return Err(arity_error("position", "0"));
    }
    match ctx.loop_position {
        // One-based, matching the numbering conventions elsewhere.
        Some(p) => Ok(Value::from(p + 1)),
        None => Err(JPathError::Function {
            function: "position".to_string(),
            message: "no enclosing iteration".to_string(),
        }),
    }
}

fn fn_equals(_ctx: &EvaluationContext<'_>, args: Vec<Value>) -> Result<Value, JPathError> {
    match args.as_slice() {
        [a, b] => Ok(Value::Bool(a == b)),
        _ => Err(arity_error("equals", "2")),
    }
}

fn fn_join(_ctx: &EvaluationContext<'_>, args: Vec<Value>) -> Result<Value, JPathError> {
    match args.as_slice() {
        [Value::Array(items), sep] => {
            let sep = value_to_string(sep);
            let joined = items
                .iter()
                .map(value_to_string)
                .collect::<Vec<_>>()
                .join(&sep);
            Ok(Value::String(joined))
        }
        [other, _] => Err(JPathError::TypeError(format!(
            "join expects an array, got {}",
            value_to_string(other)
        ))),
        _ => Err(arity_error("join", "2")),
    }
}

fn fn_not(_ctx: &EvaluationContext<'_>, args: Vec<Value>) -> Result<Value, JPathError> {
    match args.as_slice() {
        [v] => Ok(Value::Bool(!crate::engine::value_truthy(v))),
        _ => Err(arity_error("not", "1")),
    }
}
