use crate::{
    GraphDescription, MARKER_KEY, MarkerStyle, Splice, StateId, StateRoles, VizError,
    apply_splices,
};
use tracing::{debug, warn};

/// Rewrites node statements so each one carries exactly one role marker.
#[derive(Clone, Debug)]
pub struct StateAnnotator {
    roles: StateRoles,
    style: MarkerStyle,
}

impl StateAnnotator {
    pub fn new(roles: StateRoles, style: MarkerStyle) -> Self {
        Self { roles, style }
    }

    pub fn annotate(&self, source: &str) -> Result<String, VizError> {
        let description = GraphDescription::parse(source)?;
        let splices = self.plan(&description)?;
        Ok(apply_splices(source, splices))
    }

    /// Computes the marker splices for `description` without touching it.
    ///
    /// Every start/accepting id is located before any splice is produced, so
    /// a coverage failure never yields a half-marked description. Nodes that
    /// already carry [`MARKER_KEY`] are skipped, which makes annotation
    /// idempotent.
    pub fn plan(&self, description: &GraphDescription<'_>) -> Result<Vec<Splice>, VizError> {
        for state in self.roles.marked_states() {
            if let Err(error) = description.locate(state) {
                warn!(
                    %state,
                    role = self.roles.role_of(state).as_str(),
                    "state missing from graph description"
                );
                return Err(error);
            }
        }

        let source = description.source();
        let mut splices = Vec::new();
        for node in description.nodes() {
            if node.attrs.contains_key(MARKER_KEY) {
                debug!(state = %node.state, "node already annotated");
                continue;
            }

            let role = self.roles.role_of(node.state);
            let offset = node.attrs.close_offset();
            let mut text = String::new();
            if !source[..offset].ends_with(char::is_whitespace) {
                text.push(' ');
            }
            text.push_str(&self.style.marker(role).render());
            splices.push(Splice::new(offset, text));
        }

        debug!(
            style = self.style.as_str(),
            marked = splices.len(),
            nodes = description.node_count(),
            "annotation planned"
        );
        Ok(splices)
    }
}

/// Marks `start` and `accepting` with the default marker style.
pub fn annotate(
    source: &str,
    start: StateId,
    accepting: impl IntoIterator<Item = StateId>,
) -> Result<String, VizError> {
    StateAnnotator::new(StateRoles::new(start, accepting), MarkerStyle::default()).annotate(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_STATES: &str = "digraph {\n    0 [ label = \"0\" ]\n    1 [ label = \"1\" ]\n    2 [ label = \"2\" ]\n    0 -> 1 [ label = \"a\" ]\n    1 -> 2 [ label = \"b\" ]\n}\n";

    #[test]
    fn annotate_start_accepting_plain_expected_one_marker_each() {
        let output =
            annotate(THREE_STATES, StateId(0), [StateId(2)]).expect("annotation should succeed");
        assert!(output.contains("0 [ label = \"0\" shape = Mcircle ]"));
        assert!(output.contains("1 [ label = \"1\" shape = circle ]"));
        assert!(output.contains("2 [ label = \"2\" shape = doublecircle ]"));
        assert!(output.contains("0 -> 1 [ label = \"a\" ]"));
    }

    #[test]
    fn annotate_twice_expected_identical_output() {
        let once =
            annotate(THREE_STATES, StateId(0), [StateId(2)]).expect("annotation should succeed");
        let twice = annotate(&once, StateId(0), [StateId(2)]).expect("annotation should succeed");
        assert_eq!(once, twice);
    }

    #[test]
    fn annotate_missing_accepting_expected_coverage_error_and_no_output() {
        let error =
            annotate(THREE_STATES, StateId(0), [StateId(2), StateId(7)]).expect_err("must fail");
        assert!(matches!(error, VizError::AnnotationCoverage { state: StateId(7) }));
    }

    #[test]
    fn annotate_compact_attr_list_expected_separating_space() {
        let source = "digraph {\n0 [label=\"0\"]\n}\n";
        let output =
            annotate(source, StateId(0), Vec::<StateId>::new()).expect("annotation should succeed");
        assert_eq!(output, "digraph {\n0 [label=\"0\" shape = Mcircle ]\n}\n");
    }

    #[test]
    fn annotate_external_label_style_expected_start_xlabel() {
        let annotator = StateAnnotator::new(
            StateRoles::new(StateId(0), [StateId(1)]),
            MarkerStyle::ExternalLabel,
        );
        let output = annotator.annotate(THREE_STATES).expect("annotation should succeed");
        assert!(output.contains("0 [ label = \"0\" shape = circle xlabel = \"start\" ]"));
        assert!(output.contains("1 [ label = \"1\" shape = doublecircle ]"));
    }
}
