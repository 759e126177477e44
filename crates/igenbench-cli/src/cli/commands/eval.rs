use std::path::PathBuf;

use igenbench_core::{EvalWorkflow, Question, RunError, WorkflowConfig};
use igenbench_providers::ProviderConfig;
use tracing::info;

use super::super::args::EvalArgs;
use super::report_failure;
use crate::exit_codes;

pub async fn run(args: EvalArgs) -> i32 {
    let provider_config = ProviderConfig::from_env();
    match execute(&args, &provider_config).await {
        Ok((item_id, saved)) => {
            info!(
                "Evaluation completed successfully for {}.json, saved to {}",
                item_id,
                saved.display()
            );
            exit_codes::SUCCESS
        }
        Err(e) => report_failure("Evaluation", &args.run.info_path, &e, &provider_config),
    }
}

async fn execute(
    args: &EvalArgs,
    provider_config: &ProviderConfig,
) -> anyhow::Result<(String, PathBuf)> {
    let config = WorkflowConfig::new(
        &args.run.provider,
        &args.model,
        &args.run.output_dir,
        args.run.resume,
    );
    let workflow = EvalWorkflow::from_config(config, provider_config)?;

    let mut item = workflow
        .store()
        .load_item(&args.run.info_path, args.run.resume)?;

    if let Some(bank) = &args.questions {
        if !bank.is_file() {
            return Err(RunError::not_found(
                bank.display().to_string(),
                "question bank does not exist",
            )
            .into());
        }
        let questions = Question::load_for_item(bank, &item.id)?;
        let added = item.attach_questions(&questions);
        info!(
            item_id = %item.id,
            "Loaded {} questions for item {} from {} ({} new)",
            questions.len(),
            item.id,
            bank.display(),
            added
        );
    }

    let item = workflow
        .run(item, &args.gen_model, args.image_path.as_deref())
        .await?;
    let saved = workflow.store().save_item(&item)?;

    Ok((item.id, saved))
}
