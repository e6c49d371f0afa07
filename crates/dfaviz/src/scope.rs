use crate::{
    DfaHandle, EnfaHandle, EngineError, GraphHandle, HandleKind, NfaHandle, PipelineEventKind,
    PipelineEventSink,
};
use tracing::{debug, warn};

/// Owns the engine handles acquired by one pipeline invocation.
///
/// Handles are released in reverse acquisition order, each exactly once,
/// either through [`HandleScope::release_all`] or, if the invocation is
/// abandoned, when the scope is dropped.
#[derive(Default)]
pub struct HandleScope {
    enfa: Option<Box<dyn EnfaHandle>>,
    nfa: Option<Box<dyn NfaHandle>>,
    dfa: Option<Box<dyn DfaHandle>>,
    graph: Option<Box<dyn GraphHandle>>,
    events: PipelineEventSink,
}

impl HandleScope {
    pub fn new(events: PipelineEventSink) -> Self {
        Self {
            enfa: None,
            nfa: None,
            dfa: None,
            graph: None,
            events,
        }
    }

    pub fn hold_enfa(&mut self, handle: Box<dyn EnfaHandle>) -> &dyn EnfaHandle {
        debug!(handle = %HandleKind::Enfa, "handle acquired");
        &**self.enfa.insert(handle)
    }

    pub fn hold_nfa(&mut self, handle: Box<dyn NfaHandle>) -> &dyn NfaHandle {
        debug!(handle = %HandleKind::Nfa, "handle acquired");
        &**self.nfa.insert(handle)
    }

    pub fn hold_dfa(&mut self, handle: Box<dyn DfaHandle>) -> &dyn DfaHandle {
        debug!(handle = %HandleKind::Dfa, "handle acquired");
        &**self.dfa.insert(handle)
    }

    pub fn hold_graph(&mut self, handle: Box<dyn GraphHandle>) -> &dyn GraphHandle {
        debug!(handle = %HandleKind::Graph, "handle acquired");
        &**self.graph.insert(handle)
    }

    pub fn held(&self) -> Vec<HandleKind> {
        let mut kinds = Vec::new();
        if self.enfa.is_some() {
            kinds.push(HandleKind::Enfa);
        }
        if self.nfa.is_some() {
            kinds.push(HandleKind::Nfa);
        }
        if self.dfa.is_some() {
            kinds.push(HandleKind::Dfa);
        }
        if self.graph.is_some() {
            kinds.push(HandleKind::Graph);
        }
        kinds
    }

    /// Releases every held handle. All handles are attempted even when one
    /// fails; the first failure is returned.
    pub fn release_all(&mut self) -> Result<(), EngineError> {
        let mut first_error = None;
        let results = [
            (HandleKind::Graph, self.graph.take().map(|handle| handle.release())),
            (HandleKind::Dfa, self.dfa.take().map(|handle| handle.release())),
            (HandleKind::Nfa, self.nfa.take().map(|handle| handle.release())),
            (HandleKind::Enfa, self.enfa.take().map(|handle| handle.release())),
        ];

        for (kind, result) in results {
            match result {
                None => {}
                Some(Ok(())) => {
                    debug!(handle = %kind, "handle released");
                    self.events
                        .emit(PipelineEventKind::HandleReleased { handle: kind });
                }
                Some(Err(error)) => {
                    warn!(handle = %kind, error = %error, "handle release failed");
                    first_error.get_or_insert(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Drop for HandleScope {
    fn drop(&mut self) {
        if self.held().is_empty() {
            return;
        }
        warn!(held = ?self.held(), "handle scope dropped with live handles; releasing");
        let _ = self.release_all();
    }
}
