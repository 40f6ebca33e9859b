use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum JPathError {
    #[error("JPath parse error in '{0}': {1}")]
    Parse(String, String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Unknown variable '${0}'")]
    UnknownVariable(String),

    #[error("Function '{function}' error: {message}")]
    Function { function: String, message: String },

    #[error("Type error: {0}")]
    TypeError(String),
}
