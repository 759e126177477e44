use std::path::Path;

use igenbench_core::{errors::retry_guidance, ErrorCategory, RunError, RunErrorKind};
use igenbench_providers::ProviderConfig;
use tracing::{error, info, warn};

use crate::exit_codes;

pub mod dispatch;
pub mod eval;
pub mod gen;

pub use dispatch::dispatch;

/// Log a failed command the way users expect to read it and pick the exit code.
pub(crate) fn report_failure(
    stage: &str,
    info_path: &Path,
    err: &anyhow::Error,
    provider_config: &ProviderConfig,
) -> i32 {
    let run_error = RunError::from_anyhow(err);

    match run_error.kind {
        RunErrorKind::NotFound => error!("File not found: {:#}", err),
        RunErrorKind::InvalidInput => error!("Invalid input: {:#}", err),
        _ => {
            error!("{} failed for {}: {:#}", stage, info_path.display(), err);
            if ErrorCategory::of(&run_error).should_retry() {
                let attempts = provider_config.max_retries + 1;
                warn!("{}", retry_guidance(&run_error, attempts, attempts));
                info!("Progress is saved; re-run with --resume to continue");
            }
        }
    }

    exit_codes::for_kind(&run_error.kind)
}
