//! Errors raised while reflecting symbols

use crate::declaration::SymbolKind;
use crate::evaluate::EvaluationError;
use std::path::PathBuf;

/// Errors that can occur during reflection
#[derive(Debug, thiserror::Error)]
pub enum ReflectionError {
    #[error("Class \"{0}\" could not be found")]
    ClassNotFound(String),

    #[error("Provided node \"{name}\" is not class, but \"{kind}\"")]
    NotAClass { name: String, kind: SymbolKind },

    #[error("Provided node \"{name}\" is not interface, but \"{kind}\"")]
    NotAnInterface { name: String, kind: SymbolKind },

    #[error("Cyclic inheritance detected: {}", chain.join(" -> "))]
    CyclicInheritance { chain: Vec<String> },

    #[error("Inheritance of \"{name}\" exceeds the maximum depth of {max_depth}")]
    DepthExceeded { name: String, max_depth: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Method {class}::{method}() does not exist")]
    MethodNotFound { class: String, method: String },

    #[error("Property {class}::${property} does not exist")]
    PropertyNotFound { class: String, property: String },

    #[error("Constant {class}::{constant} does not exist")]
    ConstantNotFound { class: String, constant: String },

    #[error("Could not evaluate {class}::{name}: {source}")]
    Evaluation {
        class: String,
        name: String,
        #[source]
        source: EvaluationError,
    },

    #[error("Failed to parse {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReflectionError {
    /// Whether this error only says that a symbol does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ReflectionError::ClassNotFound(_)
                | ReflectionError::MethodNotFound { .. }
                | ReflectionError::PropertyNotFound { .. }
                | ReflectionError::ConstantNotFound { .. }
        )
    }
}
