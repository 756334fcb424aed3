//! The manager loop and query modes — the heart of Labdesk.
//!
//! Manager mode follows a **Decide → Invoke → Observe** cycle:
//!
//! 1. **Ask** the decision procedure for the next action
//! 2. **If stop**: emit its answer and finish
//! 3. **If a tool**: execute it, spend one unit of budget, record a trace
//!    entry (failures included), and loop
//! 4. When the budget hits zero without a stop, synthesize a final answer
//!    from the best available draft
//!
//! The loop makes at most `budget` tool invocations and `budget + 1`
//! decision calls per run, so it always terminates.
//!
//! The pass-through modes (`rag_only`, `copilot`, `study_guide`) have no
//! decision logic; they call their upstreams once each and are dispatched
//! by [`WorkspaceService`].

pub mod decision;
pub mod loop_runner;
pub mod modes;
pub mod service;

pub use decision::ManagerDecision;
pub use loop_runner::ManagerLoop;
pub use service::{Mode, QueryOutcome, WorkspaceService};
