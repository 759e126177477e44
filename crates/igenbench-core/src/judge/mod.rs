//! Judge prompt construction and response parsing.

mod parse;
mod prompt;

pub use parse::{extract_json, parse_judgment};
pub use prompt::build_factual_qa_prompt;
