use crate::{
    AnnotatedGraph, Diagnostic, LAYOUT_CONFLICT_RULE, LayoutDirectiveInjector, StateAnnotator,
    StateRoles, ValidateOptions, VizConfig, VizError, validate_or_raise_with,
};
use tracing::debug;

/// A rewrite over description text.
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, source: &str, diagnostics: &mut Vec<Diagnostic>)
        -> Result<String, VizError>;
}

impl Transform for StateAnnotator {
    fn name(&self) -> &str {
        "state_roles"
    }

    fn apply(
        &self,
        source: &str,
        _diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<String, VizError> {
        self.annotate(source)
    }
}

impl Transform for LayoutDirectiveInjector {
    fn name(&self) -> &str {
        "layout_directive"
    }

    fn apply(
        &self,
        source: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<String, VizError> {
        let (output, outcome) = self.inject(source)?;
        diagnostics.extend(outcome.diagnostic());
        Ok(output)
    }
}

pub fn apply_builtin_transforms(
    source: &str,
    roles: &StateRoles,
    config: &VizConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<String, VizError> {
    let annotated =
        StateAnnotator::new(roles.clone(), config.marker_style).apply(source, diagnostics)?;
    LayoutDirectiveInjector::new(config.rankdir).apply(&annotated, diagnostics)
}

/// Annotates a raw engine description: role markers, then layout, then any
/// custom transforms, then (when configured) output validation.
pub fn prepare_description(
    source: &str,
    roles: &StateRoles,
    config: &VizConfig,
    custom_transforms: &[&dyn Transform],
) -> Result<(AnnotatedGraph, Vec<Diagnostic>), VizError> {
    let mut diagnostics = Vec::new();
    let mut text = apply_builtin_transforms(source, roles, config, &mut diagnostics)?;

    for transform in custom_transforms {
        debug!(transform = transform.name(), "applying custom transform");
        text = transform.apply(&text, &mut diagnostics)?;
    }

    if config.validate_output {
        let options = ValidateOptions {
            layout_directive: !diagnostics
                .iter()
                .any(|diagnostic| diagnostic.rule == LAYOUT_CONFLICT_RULE),
        };
        diagnostics.extend(validate_or_raise_with(&text, options)?);
    }

    Ok((AnnotatedGraph::new(text), diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StateId;

    const TWO_STATES: &str =
        "digraph {\n    0 [ label = \"0\" ]\n    1 [ label = \"1\" ]\n    0 -> 1 [ label = \"a\" ]\n}\n";

    struct Uppercase;

    impl Transform for Uppercase {
        fn name(&self) -> &str {
            "uppercase_edges"
        }

        fn apply(
            &self,
            source: &str,
            _diagnostics: &mut Vec<Diagnostic>,
        ) -> Result<String, VizError> {
            Ok(source.replace("label = \"a\"", "label = \"A\""))
        }
    }

    #[test]
    fn prepare_description_expected_markers_and_layout() {
        let roles = StateRoles::new(StateId(0), [StateId(1)]);
        let (graph, diagnostics) =
            prepare_description(TWO_STATES, &roles, &VizConfig::default(), &[])
                .expect("description should prepare");
        assert!(diagnostics.is_empty());
        assert_eq!(
            graph.as_str(),
            "digraph {\n    0 [ label = \"0\" shape = Mcircle ]\n    1 [ label = \"1\" shape = doublecircle ]\n    0 -> 1 [ label = \"a\" ]\n    rankdir = LR\n}\n"
        );
    }

    #[test]
    fn prepare_description_custom_transform_expected_applied_after_builtins() {
        let roles = StateRoles::new(StateId(0), [StateId(1)]);
        let (graph, _) =
            prepare_description(TWO_STATES, &roles, &VizConfig::default(), &[&Uppercase])
                .expect("description should prepare");
        assert!(graph.as_str().contains("0 -> 1 [ label = \"A\" ]"));
        assert!(graph.as_str().contains("rankdir = LR"));
    }

    #[test]
    fn prepare_description_layout_conflict_expected_warning_only() {
        let source = "digraph {\n    rankdir = TB\n    0 [ label = \"0\" ]\n}\n";
        let roles = StateRoles::new(StateId(0), [StateId(0)]);
        let (graph, diagnostics) =
            prepare_description(source, &roles, &VizConfig::default(), &[])
                .expect("conflict is not fatal");
        assert!(graph.as_str().contains("rankdir = TB"));
        assert!(!graph.as_str().contains("rankdir = LR"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule, LAYOUT_CONFLICT_RULE);
    }

    #[test]
    fn prepare_description_repeated_or_mixed_directives_expected_single_warning() {
        let roles = StateRoles::new(StateId(0), [StateId(0)]);
        for source in [
            "digraph {\n    rankdir = LR\n    rankdir = LR\n    0 [ label = \"0\" ]\n}\n",
            "digraph {\n    graph [ rankdir = TB ]\n    rankdir = TB\n    0 [ label = \"0\" ]\n}\n",
        ] {
            let (graph, diagnostics) =
                prepare_description(source, &roles, &VizConfig::default(), &[])
                    .expect("conflict is not fatal");
            assert_eq!(graph.as_str().matches("rankdir").count(), 2, "{source}");
            assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
            assert_eq!(diagnostics[0].rule, LAYOUT_CONFLICT_RULE);
            assert!(!diagnostics[0].is_error());
        }
    }
}
