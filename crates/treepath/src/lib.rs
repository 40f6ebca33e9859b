//! A tree-path expression and match-pattern engine.
//!
//! The crate is written entirely against the [`TreeNode`] navigation trait,
//! so any hierarchical document implementation plugs in. Consumers get three
//! things: expression evaluation ([`evaluate`]), node selection
//! ([`select_path`]), and compiled match patterns ([`Pattern`]).

pub mod ast;
pub mod engine;
pub mod error;
pub mod node;
pub mod parser;
pub mod pattern;

pub use ast::{Axis, Expression, LocationPath, NodeTest, Predicate, Step};
pub use engine::{EvaluationContext, PathValue, Version, evaluate, select_path};
pub use error::TreePathError;
pub use node::{NodeType, QName, TreeNode};
pub use parser::parse_expression;
pub use pattern::Pattern;
