use crate::{
    Diagnostic, GraphDescription, MARKER_KEY, RANKDIR_KEY, Severity, Statement, ValidationError,
};
use std::collections::BTreeSet;

/// Rule families run by [`validate_with`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Off when a layout conflict was already reported as a warning; the
    /// existing directives are kept as found.
    pub layout_directive: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            layout_directive: true,
        }
    }
}

/// Checks that an annotated description is ready for the renderer.
pub fn validate(text: &str) -> Vec<Diagnostic> {
    validate_with(text, ValidateOptions::default())
}

pub fn validate_with(text: &str, options: ValidateOptions) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if let Err(message) = graphviz_rust::parse(text) {
        diagnostics.push(Diagnostic::new(
            "dot_syntax",
            Severity::Error,
            format!("renderer would reject the description: {message}"),
        ));
    }

    let description = match GraphDescription::parse(text) {
        Ok(description) => description,
        Err(error) => {
            diagnostics.push(Diagnostic::new(
                "description_subset",
                Severity::Error,
                error.to_string(),
            ));
            return diagnostics;
        }
    };

    diagnostics.extend(rule_single_marker(&description));
    diagnostics.extend(rule_unique_attributes(&description));
    if options.layout_directive {
        diagnostics.extend(rule_single_layout_directive(&description));
    }
    diagnostics
}

pub fn validate_or_raise(text: &str) -> Result<Vec<Diagnostic>, ValidationError> {
    validate_or_raise_with(text, ValidateOptions::default())
}

pub fn validate_or_raise_with(
    text: &str,
    options: ValidateOptions,
) -> Result<Vec<Diagnostic>, ValidationError> {
    let diagnostics = validate_with(text, options);
    if diagnostics.iter().any(Diagnostic::is_error) {
        return Err(ValidationError::new(diagnostics));
    }
    Ok(diagnostics)
}

fn rule_single_marker(description: &GraphDescription<'_>) -> Vec<Diagnostic> {
    description
        .nodes()
        .filter_map(|node| {
            let count = node
                .attrs
                .attrs
                .iter()
                .filter(|attr| attr.key == MARKER_KEY)
                .count();
            (count != 1).then(|| {
                Diagnostic::new(
                    "single_marker",
                    Severity::Error,
                    format!("state {} carries {count} role markers; expected 1", node.state),
                )
                .with_state(node.state)
            })
        })
        .collect()
}

fn rule_unique_attributes(description: &GraphDescription<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for node in description.nodes() {
        let mut seen = BTreeSet::new();
        for attr in &node.attrs.attrs {
            if !seen.insert(attr.key) && attr.key != MARKER_KEY {
                diagnostics.push(
                    Diagnostic::new(
                        "unique_attributes",
                        Severity::Error,
                        format!("state {} repeats attribute '{}'", node.state, attr.key),
                    )
                    .with_state(node.state),
                );
            }
        }
    }
    diagnostics
}

fn rule_single_layout_directive(description: &GraphDescription<'_>) -> Vec<Diagnostic> {
    let count = description
        .statements()
        .iter()
        .filter(|statement| match statement {
            Statement::Attribute(attr) => attr.key == RANKDIR_KEY,
            Statement::Defaults(defaults) => {
                defaults.target == "graph" && defaults.attrs.contains_key(RANKDIR_KEY)
            }
            _ => false,
        })
        .count();

    if count == 1 {
        Vec::new()
    } else {
        vec![Diagnostic::new(
            "single_layout_directive",
            Severity::Error,
            format!("description must carry exactly one layout directive; found {count}"),
        )]
    }
}
