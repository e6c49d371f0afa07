//! Seams to the external automaton engine and renderer.
//!
//! Handles are owned by the caller once returned. `release` consumes the
//! boxed handle, so a released handle cannot be used again.

use crate::{AnnotatedGraph, EngineError, StateId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    Enfa,
    Nfa,
    Dfa,
    Graph,
}

impl HandleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enfa => "enfa",
            Self::Nfa => "nfa",
            Self::Dfa => "dfa",
            Self::Graph => "graph",
        }
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait AutomatonEngine: Send + Sync {
    async fn build_epsilon_nfa(&self, regex: &str) -> Result<Box<dyn EnfaHandle>, EngineError>;
}

#[async_trait]
pub trait EnfaHandle: Send + Sync {
    async fn convert_to_nfa(&self) -> Result<Box<dyn NfaHandle>, EngineError>;
    fn release(self: Box<Self>) -> Result<(), EngineError>;
}

#[async_trait]
pub trait NfaHandle: Send + Sync {
    async fn minimized_dfa(&self) -> Result<Box<dyn DfaHandle>, EngineError>;
    fn release(self: Box<Self>) -> Result<(), EngineError>;
}

#[async_trait]
pub trait DfaHandle: Send + Sync {
    async fn graph_representation(&self) -> Result<Box<dyn GraphHandle>, EngineError>;
    fn release(self: Box<Self>) -> Result<(), EngineError>;
}

#[async_trait]
pub trait GraphHandle: Send + Sync {
    async fn dot_description(&self) -> Result<String, EngineError>;
    async fn start_state(&self) -> Result<StateId, EngineError>;
    async fn accepting_states(&self) -> Result<BTreeSet<StateId>, EngineError>;
    fn release(self: Box<Self>) -> Result<(), EngineError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub graph: AnnotatedGraph,
    /// Layout width the caller wants the drawing to fit, in pixels.
    pub width_hint: Option<u32>,
}

#[async_trait]
pub trait GraphRenderer: Send + Sync {
    type Output: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn render(&self, request: RenderRequest) -> Result<Self::Output, Self::Error>;
}
