use super::RunArgs;

#[derive(clap::Args, Clone, Debug)]
pub struct GenArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Model to use for image generation
    #[arg(long, default_value = "gemini-2.0-flash-exp")]
    pub model: String,
}
