use crate::{Diagnostic, StateId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VizError {
    #[error("regex syntax error: {0}")]
    RegexSyntax(String),
    #[error("engine resource error: {0}")]
    EngineResource(String),
    #[error("state {state} has no node statement in the graph description")]
    AnnotationCoverage { state: StateId },
    #[error("invalid graph description: {0}")]
    InvalidDescription(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl VizError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RegexSyntax(_) => "regex_syntax",
            Self::EngineResource(_) => "engine_resource",
            Self::AnnotationCoverage { .. } => "annotation_coverage",
            Self::InvalidDescription(_) => "invalid_description",
            Self::Config(_) => "config",
            Self::Validation(_) => "validation",
        }
    }
}

/// Failure reported by the automaton engine itself.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("{0}")]
    Syntax(String),
    #[error("{0}")]
    Resource(String),
}

impl From<EngineError> for VizError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::Syntax(message) => Self::RegexSyntax(message),
            EngineError::Resource(message) => Self::EngineResource(message),
        }
    }
}

#[derive(Debug, Error, Clone)]
#[error("validation failed with {errors_count} error(s)")]
pub struct ValidationError {
    pub diagnostics: Vec<Diagnostic>,
    pub errors_count: usize,
}

impl ValidationError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        let errors_count = diagnostics.iter().filter(|d| d.is_error()).count();
        Self {
            diagnostics,
            errors_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_syntax_error_converted_expected_regex_syntax_verbatim() {
        let error = VizError::from(EngineError::Syntax("unbalanced ')' at 3".to_string()));
        assert_eq!(error.kind(), "regex_syntax");
        assert_eq!(error.to_string(), "regex syntax error: unbalanced ')' at 3");
    }

    #[test]
    fn engine_resource_error_converted_expected_engine_resource() {
        let error = VizError::from(EngineError::Resource("handle freed twice".to_string()));
        assert!(matches!(error, VizError::EngineResource(_)));
    }
}
