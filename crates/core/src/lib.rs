//! # Labdesk Core
//!
//! Domain types, traits, and error definitions for the Labdesk workspace
//! agent. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every upstream service is defined as a trait here (`Retriever`,
//! `ChatHead`, `TextGenerator`) and so is the manager's brain
//! (`DecisionProcedure`). Implementations live in their respective crates.
//! This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod decision;
pub mod error;
pub mod fragment;
pub mod generate;
pub mod run;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use decision::{Action, Decision, DecisionContext, DecisionProcedure};
pub use error::{DecisionError, Error, Result, UpstreamError};
pub use fragment::{ContextFragment, DraftAnswer};
pub use generate::{GenerateRequest, TextGenerator};
pub use run::{RunResult, RunState, TraceEntry};
pub use tool::{ChatHead, Retriever, ToolRegistry};
