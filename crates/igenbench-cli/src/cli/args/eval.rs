use std::path::PathBuf;

use super::RunArgs;

#[derive(clap::Args, Clone, Debug)]
pub struct EvalArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Generation model whose image is evaluated
    #[arg(long)]
    pub gen_model: String,

    /// Image to evaluate. Default: the item's generation record, then
    /// <output-dir>/<id>/<id>_<gen model>.<ext>
    #[arg(long)]
    pub image_path: Option<PathBuf>,

    /// JSONL question bank; questions for this item are added before judging
    #[arg(long)]
    pub questions: Option<PathBuf>,

    /// Judge model
    #[arg(long, default_value = "gemini-2.5-flash")]
    pub model: String,
}
