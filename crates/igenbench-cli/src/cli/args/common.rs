//! Arguments shared by `gen` and `eval`.

use std::path::PathBuf;

#[derive(clap::Args, Clone, Debug)]
pub struct RunArgs {
    /// Path to the VISItem JSON file
    #[arg(long)]
    pub info_path: PathBuf,

    /// Provider: google, openrouter, replicate, fake
    #[arg(long, default_value = "google", env = "IGENBENCH_PROVIDER")]
    pub provider: String,

    /// Output directory; item state lands in <output-dir>/<id>/<id>.json
    #[arg(long, default_value = "outputs/", env = "IGENBENCH_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Reuse saved state and skip work that is already done
    #[arg(long)]
    pub resume: bool,
}
