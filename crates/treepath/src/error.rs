use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum TreePathError {
    #[error("Tree-path parse error in '{0}': {1}")]
    Parse(String, String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Function '{name}' requires tree-path version {required}")]
    VersionGate { name: String, required: u32 },

    #[error("Unknown variable '${0}'")]
    UnknownVariable(String),

    #[error("Type error: {0}")]
    TypeError(String),
}
