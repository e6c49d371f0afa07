//! Annotation pipeline for automaton graph descriptions.
//!
//! The automaton engine compiles a regex into a minimized DFA and hands back
//! a DOT description plus the start and accepting state ids. This crate turns
//! that raw description into a render-ready one:
//! parse statements -> mark state roles -> inject layout -> validate.

pub mod annotate;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod events;
pub mod graph;
pub mod layout;
pub mod marker;
pub mod parse;
pub mod pipeline;
pub mod scope;
pub mod testing;
pub mod transforms;
pub mod validate;

pub use annotate::*;
pub use config::*;
pub use diagnostics::*;
pub use engine::*;
pub use errors::*;
pub use events::*;
pub use graph::*;
pub use layout::*;
pub use marker::*;
pub use parse::*;
pub use pipeline::*;
pub use scope::*;
pub use transforms::*;
pub use validate::*;
