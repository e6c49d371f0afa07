//! In-memory automaton engine for tests and demos.
//!
//! `ScriptedEngine` does not compile regexes; it returns descriptions that
//! were scripted for a given pattern, in the engine's own output format, and
//! records every handle it hands out and every release call it receives.

use crate::{
    AutomatonEngine, DfaHandle, EnfaHandle, EngineError, GraphHandle, HandleKind, NfaHandle,
    StateId,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Minimized DFA for `b*`: a single state that is both start and accepting.
pub const B_STAR_DOT: &str = "digraph {\n    0 [ label = \"0\" ]\n    0 -> 0 [ label = \"b\" ]\n}\n";

/// Minimized DFA for `a|b*` as the engine reports it.
pub const A_OR_B_STAR_DOT: &str = "digraph {\n    0 [ label = \"0\" ]\n    1 [ label = \"1\" ]\n    2 [ label = \"2\" ]\n    0 -> 1 [ label = \"a\" ]\n    0 -> 2 [ label = \"b\" ]\n    2 -> 2 [ label = \"b\" ]\n}\n";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptedAutomaton {
    pub dot: String,
    pub start: StateId,
    pub accepting: BTreeSet<StateId>,
}

impl ScriptedAutomaton {
    pub fn new(
        dot: impl Into<String>,
        start: StateId,
        accepting: impl IntoIterator<Item = StateId>,
    ) -> Self {
        Self {
            dot: dot.into(),
            start,
            accepting: accepting.into_iter().collect(),
        }
    }
}

/// Engine step that the script forces to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScriptedFailure {
    ConvertToNfa,
    Minimize,
    GraphRepresentation,
    DotDescription,
    Release(HandleKind),
}

#[derive(Clone, Debug, Default)]
pub struct HandleLedger {
    inner: Arc<Mutex<LedgerState>>,
}

#[derive(Clone, Debug, Default)]
struct LedgerState {
    acquired: Vec<HandleKind>,
    released: Vec<HandleKind>,
}

impl HandleLedger {
    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_acquired(&self, kind: HandleKind) {
        self.state().acquired.push(kind);
    }

    fn record_released(&self, kind: HandleKind) {
        self.state().released.push(kind);
    }

    pub fn acquired(&self) -> Vec<HandleKind> {
        self.state().acquired.clone()
    }

    /// Every release call, including ones the script made fail.
    pub fn released(&self) -> Vec<HandleKind> {
        self.state().released.clone()
    }

    /// Handles acquired but never passed to `release`.
    pub fn outstanding(&self) -> Vec<HandleKind> {
        let state = self.state();
        let mut outstanding = state.acquired.clone();
        for kind in &state.released {
            if let Some(index) = outstanding.iter().position(|held| held == kind) {
                outstanding.remove(index);
            }
        }
        outstanding
    }
}

#[derive(Clone, Debug, Default)]
pub struct ScriptedEngine {
    automata: BTreeMap<String, ScriptedAutomaton>,
    rejections: BTreeMap<String, String>,
    failures: BTreeSet<ScriptedFailure>,
    ledger: HandleLedger,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine preloaded with the `b*` and `a|b*` automata.
    pub fn with_fixtures() -> Self {
        Self::new()
            .script(
                "b*",
                ScriptedAutomaton::new(B_STAR_DOT, StateId(0), [StateId(0)]),
            )
            .script(
                "a|b*",
                ScriptedAutomaton::new(A_OR_B_STAR_DOT, StateId(0), [StateId(1), StateId(2)]),
            )
    }

    pub fn script(mut self, regex: impl Into<String>, automaton: ScriptedAutomaton) -> Self {
        self.automata.insert(regex.into(), automaton);
        self
    }

    pub fn reject(mut self, regex: impl Into<String>, message: impl Into<String>) -> Self {
        self.rejections.insert(regex.into(), message.into());
        self
    }

    pub fn fail_at(mut self, failure: ScriptedFailure) -> Self {
        self.failures.insert(failure);
        self
    }

    pub fn ledger(&self) -> HandleLedger {
        self.ledger.clone()
    }
}

#[derive(Debug)]
struct Session {
    automaton: ScriptedAutomaton,
    failures: BTreeSet<ScriptedFailure>,
    ledger: HandleLedger,
}

impl Session {
    fn check(&self, failure: ScriptedFailure) -> Result<(), EngineError> {
        if self.failures.contains(&failure) {
            return Err(EngineError::Resource(format!(
                "scripted failure at {failure:?}"
            )));
        }
        Ok(())
    }

    fn acquire(self: &Arc<Self>, kind: HandleKind) -> ScriptedHandle {
        self.ledger.record_acquired(kind);
        ScriptedHandle {
            kind,
            session: Arc::clone(self),
        }
    }
}

#[derive(Debug)]
struct ScriptedHandle {
    kind: HandleKind,
    session: Arc<Session>,
}

impl ScriptedHandle {
    fn finish(self) -> Result<(), EngineError> {
        self.session.ledger.record_released(self.kind);
        self.session.check(ScriptedFailure::Release(self.kind))
    }
}

#[async_trait]
impl AutomatonEngine for ScriptedEngine {
    async fn build_epsilon_nfa(&self, regex: &str) -> Result<Box<dyn EnfaHandle>, EngineError> {
        if let Some(message) = self.rejections.get(regex) {
            return Err(EngineError::Syntax(message.clone()));
        }
        let automaton = self.automata.get(regex).cloned().ok_or_else(|| {
            EngineError::Syntax(format!("unsupported regex syntax in '{regex}'"))
        })?;

        let session = Arc::new(Session {
            automaton,
            failures: self.failures.clone(),
            ledger: self.ledger.clone(),
        });
        Ok(Box::new(session.acquire(HandleKind::Enfa)))
    }
}

#[async_trait]
impl EnfaHandle for ScriptedHandle {
    async fn convert_to_nfa(&self) -> Result<Box<dyn NfaHandle>, EngineError> {
        self.session.check(ScriptedFailure::ConvertToNfa)?;
        Ok(Box::new(self.session.acquire(HandleKind::Nfa)))
    }

    fn release(self: Box<Self>) -> Result<(), EngineError> {
        (*self).finish()
    }
}

#[async_trait]
impl NfaHandle for ScriptedHandle {
    async fn minimized_dfa(&self) -> Result<Box<dyn DfaHandle>, EngineError> {
        self.session.check(ScriptedFailure::Minimize)?;
        Ok(Box::new(self.session.acquire(HandleKind::Dfa)))
    }

    fn release(self: Box<Self>) -> Result<(), EngineError> {
        (*self).finish()
    }
}

#[async_trait]
impl DfaHandle for ScriptedHandle {
    async fn graph_representation(&self) -> Result<Box<dyn GraphHandle>, EngineError> {
        self.session.check(ScriptedFailure::GraphRepresentation)?;
        Ok(Box::new(self.session.acquire(HandleKind::Graph)))
    }

    fn release(self: Box<Self>) -> Result<(), EngineError> {
        (*self).finish()
    }
}

#[async_trait]
impl GraphHandle for ScriptedHandle {
    async fn dot_description(&self) -> Result<String, EngineError> {
        self.session.check(ScriptedFailure::DotDescription)?;
        Ok(self.session.automaton.dot.clone())
    }

    async fn start_state(&self) -> Result<StateId, EngineError> {
        Ok(self.session.automaton.start)
    }

    async fn accepting_states(&self) -> Result<BTreeSet<StateId>, EngineError> {
        Ok(self.session.automaton.accepting.clone())
    }

    fn release(self: Box<Self>) -> Result<(), EngineError> {
        (*self).finish()
    }
}
