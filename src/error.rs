//! The error type for the whole transformation engine.
use thiserror::Error;
use treeform_dom::DomError;
use treeform_jpath::JPathError;
use treeform_treepath::TreePathError;

#[derive(Error, Debug)]
pub enum TransformError {
    /// Configuration problems caught before the transform starts.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Duplicate template name '{0}'")]
    DuplicateTemplateName(String),

    #[error("Function '{0}' must be registered with a namespace")]
    FunctionWithoutNamespace(String),

    #[error("A function named '{namespace}:{name}' with arity {arity} is already registered")]
    DuplicateFunction {
        namespace: String,
        name: String,
        arity: usize,
    },

    /// Two templates matched the same node with equal priority under the
    /// `Fail` policy.
    #[error("Equal-priority conflict: patterns '{first}' and '{second}' both match with priority {priority}")]
    EqualPriorityConflict {
        first: String,
        second: String,
        priority: f64,
    },

    #[error("No template named '{0}' has been declared")]
    UnknownNamedTemplate(String),

    #[error("No function '{namespace}:{name}' with arity {arity} has been registered")]
    UnknownFunction {
        namespace: String,
        name: String,
        arity: usize,
    },

    #[error("No key named '{0}' has been declared")]
    UnknownKey(String),

    #[error("No template matched and the active mode is configured to fail on no match")]
    NoMatch,

    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// Scalar content appended inside an object build without naming a
    /// property first.
    #[error("Cannot append a value inside an object without a property name")]
    ScalarOutsideProperty,

    #[error("Cannot add attribute '{0}': the element's open tag is already closed")]
    AttributeAfterContent(String),

    #[error("Builder state error: {0}")]
    BuilderState(String),

    /// The first match of a string analysis was zero-length, which would
    /// subdivide the input indefinitely.
    #[error("Zero-length first match in string analysis for pattern '{0}'")]
    ZeroLengthMatch(String),

    #[error("Invalid regular expression: {0}")]
    Regex(#[from] regex::Error),

    #[error(transparent)]
    JPath(#[from] JPathError),

    #[error(transparent)]
    TreePath(#[from] TreePathError),

    #[error(transparent)]
    Dom(#[from] DomError),
}
