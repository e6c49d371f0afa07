use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of one automaton state, as written in its node label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub u32);

impl From<u32> for StateId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateRole {
    Start,
    Accepting,
    StartAndAccepting,
    Plain,
}

impl StateRole {
    pub fn classify(state: StateId, start: StateId, accepting: &BTreeSet<StateId>) -> Self {
        match (state == start, accepting.contains(&state)) {
            (true, true) => Self::StartAndAccepting,
            (true, false) => Self::Start,
            (false, true) => Self::Accepting,
            (false, false) => Self::Plain,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Accepting => "accepting",
            Self::StartAndAccepting => "start_and_accepting",
            Self::Plain => "plain",
        }
    }
}

/// Start and accepting states reported by the engine for one automaton.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRoles {
    pub start: StateId,
    pub accepting: BTreeSet<StateId>,
}

impl StateRoles {
    pub fn new(start: StateId, accepting: impl IntoIterator<Item = StateId>) -> Self {
        Self {
            start,
            accepting: accepting.into_iter().collect(),
        }
    }

    pub fn role_of(&self, state: StateId) -> StateRole {
        StateRole::classify(state, self.start, &self.accepting)
    }

    /// Every state that must carry a non-plain marker, start first.
    pub fn marked_states(&self) -> impl Iterator<Item = StateId> + '_ {
        std::iter::once(self.start).chain(
            self.accepting
                .iter()
                .copied()
                .filter(move |state| *state != self.start),
        )
    }
}

/// A graph description whose nodes all carry a role marker and which holds
/// exactly one layout directive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotatedGraph(String);

impl AnnotatedGraph {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AnnotatedGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_start_also_accepting_expected_combined_role() {
        let roles = StateRoles::new(StateId(0), [StateId(2), StateId(0), StateId(2)]);
        assert_eq!(roles.role_of(StateId(0)), StateRole::StartAndAccepting);
        assert_eq!(roles.role_of(StateId(2)), StateRole::Accepting);
        assert_eq!(roles.role_of(StateId(1)), StateRole::Plain);
    }

    #[test]
    fn marked_states_start_in_accepting_expected_no_duplicate() {
        let roles = StateRoles::new(StateId(1), [StateId(1), StateId(3)]);
        let marked: Vec<_> = roles.marked_states().collect();
        assert_eq!(marked, vec![StateId(1), StateId(3)]);
    }
}
