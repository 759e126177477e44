//! Generation and evaluation workflows: validated config, state store and engine
//! wired together for one item per run.

mod config;
mod eval;
mod gen;

pub use config::WorkflowConfig;
pub use eval::EvalWorkflow;
pub use gen::GenWorkflow;
