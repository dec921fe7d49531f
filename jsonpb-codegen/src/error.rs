//! Error types for jsonpb-codegen

use thiserror::Error;

/// Result type alias for jsonpb-codegen operations
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Errors that can occur during code generation
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Failed to parse Go source at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Failed to print syntax tree: {message}")]
    Print {
        message: String,
        /// Output produced before the printer hit the malformed node
        partial: String,
    },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodegenError {
    /// Partial output carried by a print failure, if any
    pub fn partial_output(&self) -> Option<&str> {
        match self {
            CodegenError::Print { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for CodegenError {
    fn from(err: config::ConfigError) -> Self {
        CodegenError::Config(err.to_string())
    }
}

impl From<tree_sitter::LanguageError> for CodegenError {
    fn from(err: tree_sitter::LanguageError) -> Self {
        CodegenError::Config(format!("Go grammar is incompatible with tree-sitter: {}", err))
    }
}
