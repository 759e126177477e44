//! IGenBench core: item model, resumable state, and the generation and
//! evaluation workflows.
//!
//! A run handles one item. Generation writes `<out>/<id>/<id>_<model>.<ext>`
//! and records it in `<out>/<id>/<id>.json`. Evaluation asks a judge model
//! one binary question at a time and saves the state file after every
//! answer, keyed by (generating model, evaluating model), so `resume` skips
//! whatever is already judged.

pub mod engine;
pub mod errors;
pub mod fs;
pub mod judge;
pub mod naming;
pub mod store;
pub mod vis_item;
pub mod workflow;

pub use engine::{EvalEngine, GenEngine};
pub use errors::{ErrorCategory, RunError, RunErrorKind};
pub use store::ItemStore;
pub use vis_item::{EvalEntry, EvaluationScore, Judgment, Question, VisItem, VisItemError};
pub use workflow::{EvalWorkflow, GenWorkflow, WorkflowConfig};
