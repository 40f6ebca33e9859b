//! A JSON-native path and expression engine.
//!
//! Selects data out of a `serde_json::Value` with a compact path dialect
//! (`$.orders[0].id`, `$..price`, `items[*]`) and evaluates small
//! expressions over it, including calls into a pluggable function
//! registry. Selections report the [`Location`] of every match, which the
//! template layer uses for pattern matching.

pub mod ast;
pub mod engine;
pub mod error;
pub mod functions;
mod parser;

// --- Public API ---
pub use ast::{Expression, Location, LocationStep, PathSegment, Selection};
pub use engine::{
    EvaluationContext, evaluate, evaluate_as_bool, evaluate_as_string, select,
};
pub use error::JPathError;
pub use functions::{FunctionRegistry, JPathFunction};
pub use parser::parse_expression;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::collections::HashMap;

    fn eval(input: &str, data: &Value) -> Value {
        let expr = parse_expression(input).unwrap();
        let vars = HashMap::new();
        let funcs = FunctionRegistry::default();
        let e_ctx = EvaluationContext {
            context_node: data,
            variables: &vars,
            functions: &funcs,
            loop_position: None,
        };
        evaluate(&expr, &e_ctx).unwrap()
    }

    #[test]
    fn evaluates_simple_paths() {
        let data = json!({ "customer": { "name": "ACME" } });
        assert_eq!(eval("customer.name", &data), json!("ACME"));
        assert_eq!(eval("$.customer.name", &data), json!("ACME"));
    }

    #[test]
    fn evaluates_indexed_paths() {
        let data = json!({ "orders": [ { "id": "A" }, { "id": "B" } ] });
        assert_eq!(eval("orders[1].id", &data), json!("B"));
    }

    #[test]
    fn missing_paths_yield_null() {
        let data = json!({ "a": 1 });
        assert_eq!(eval("$.b.c", &data), json!(null));
    }

    #[test]
    fn evaluates_functions() {
        let data = json!({ "name": "world" });
        assert_eq!(eval("upper($.name)", &data), json!("WORLD"));
        assert_eq!(
            eval("concat('hello, ', $.name)", &data),
            json!("hello, world")
        );
    }

    #[test]
    fn variables_resolve_from_scope() {
        let expr = parse_expression("$greeting").unwrap();
        let data = json!({});
        let mut vars = HashMap::new();
        vars.insert("greeting".to_string(), json!("hi"));
        let funcs = FunctionRegistry::default();
        let e_ctx = EvaluationContext {
            context_node: &data,
            variables: &vars,
            functions: &funcs,
            loop_position: None,
        };
        assert_eq!(evaluate(&expr, &e_ctx).unwrap(), json!("hi"));
        assert!(matches!(
            evaluate(&parse_expression("$missing").unwrap(), &e_ctx),
            Err(JPathError::UnknownVariable(_))
        ));
    }

    #[test]
    fn select_reports_locations() {
        let data = json!({ "items": [ { "price": 1 }, { "price": 2 } ] });
        let expr = parse_expression("$..price").unwrap();
        let vars = HashMap::new();
        let funcs = FunctionRegistry::default();
        let e_ctx = EvaluationContext {
            context_node: &data,
            variables: &vars,
            functions: &funcs,
            loop_position: None,
        };
        let selected = select(&expr, &e_ctx).unwrap();
        let locations: Vec<String> =
            selected.iter().map(|(l, _)| l.to_string()).collect();
        assert_eq!(locations, vec!["$.items[0].price", "$.items[1].price"]);
        assert_eq!(selected[1].1, &json!(2));
    }

    #[test]
    fn wildcard_selects_every_child() {
        let data = json!({ "a": 1, "b": 2 });
        let expr = parse_expression("$.*").unwrap();
        let vars = HashMap::new();
        let funcs = FunctionRegistry::default();
        let e_ctx = EvaluationContext {
            context_node: &data,
            variables: &vars,
            functions: &funcs,
            loop_position: None,
        };
        assert_eq!(select(&expr, &e_ctx).unwrap().len(), 2);
    }

    #[test]
    fn truthiness_of_selections_and_scalars() {
        let data = json!({ "flag": false, "items": [1] });
        let vars = HashMap::new();
        let funcs = FunctionRegistry::default();
        let e_ctx = EvaluationContext {
            context_node: &data,
            variables: &vars,
            functions: &funcs,
            loop_position: None,
        };
        // A selection is true when it matched something, even `false`.
        let expr = parse_expression("$.flag").unwrap();
        assert!(evaluate_as_bool(&expr, &e_ctx).unwrap());
        let expr = parse_expression("$.absent").unwrap();
        assert!(!evaluate_as_bool(&expr, &e_ctx).unwrap());
        let expr = parse_expression("''").unwrap();
        assert!(!evaluate_as_bool(&expr, &e_ctx).unwrap());
    }
}
