use clap::{Parser, Subcommand};

pub mod common;
pub mod eval;
pub mod gen;
pub use common::*;
pub use eval::*;
pub use gen::*;

#[derive(Parser)]
#[command(
    name = "igenbench",
    version,
    about = "Infographic generation benchmark: render items with text-to-image models and judge them question by question"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate an image for a VISItem with a text-to-image model
    Gen(GenArgs),
    /// Judge a generated image against the item's benchmark questions
    Eval(EvalArgs),
    Version,
}
