use std::path::PathBuf;

use igenbench_core::{GenWorkflow, WorkflowConfig};
use igenbench_providers::ProviderConfig;
use tracing::info;

use super::super::args::GenArgs;
use super::report_failure;
use crate::exit_codes;

pub async fn run(args: GenArgs) -> i32 {
    let provider_config = ProviderConfig::from_env();
    match execute(&args, &provider_config).await {
        Ok((item_id, saved)) => {
            info!(
                "Generation completed for {}.json, saved to {}",
                item_id,
                saved.display()
            );
            exit_codes::SUCCESS
        }
        Err(e) => report_failure("Generation", &args.run.info_path, &e, &provider_config),
    }
}

async fn execute(
    args: &GenArgs,
    provider_config: &ProviderConfig,
) -> anyhow::Result<(String, PathBuf)> {
    let config = WorkflowConfig::new(
        &args.run.provider,
        &args.model,
        &args.run.output_dir,
        args.run.resume,
    );
    let workflow = GenWorkflow::from_config(config, provider_config)?;

    let item = workflow
        .store()
        .load_item(&args.run.info_path, args.run.resume)?;
    let item = workflow.run(item).await?;
    let saved = workflow.store().save_item(&item)?;

    Ok((item.id, saved))
}
