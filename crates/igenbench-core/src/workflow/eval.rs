use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use igenbench_providers::{ImageInput, ProviderClient, ProviderConfig};
use tracing::info;

use crate::engine::EvalEngine;
use crate::errors::RunError;
use crate::naming::{find_generated_image, resolve_image_path};
use crate::store::ItemStore;
use crate::vis_item::VisItem;

use super::config::WorkflowConfig;

/// Judges every question of an item against one generated image.
///
/// State is saved after each judged question, so an interrupted run picks up
/// at the first unjudged question when resumed.
#[derive(Debug)]
pub struct EvalWorkflow {
    config: WorkflowConfig,
    store: ItemStore,
    engine: EvalEngine,
}

impl EvalWorkflow {
    pub fn new(config: WorkflowConfig, client: Arc<dyn ProviderClient>) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            store: ItemStore::new(config.output_dir.clone()),
            engine: EvalEngine::new(client, config.model.clone()),
            config,
        })
    }

    pub fn from_config(
        config: WorkflowConfig,
        provider_config: &ProviderConfig,
    ) -> anyhow::Result<Self> {
        let client = config.build_client(provider_config)?;
        Self::new(config, client)
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Image to judge: explicit path, then the generation record, then the
    /// conventional output path with any supported extension.
    pub fn resolve_image(
        &self,
        item: &VisItem,
        gen_model: &str,
        explicit: Option<&Path>,
    ) -> Result<PathBuf, RunError> {
        if let Some(path) = explicit {
            return if path.is_file() {
                Ok(path.to_path_buf())
            } else {
                Err(RunError::not_found(
                    path.display().to_string(),
                    "image path does not exist",
                ))
            };
        }

        if let Some(recorded) = item.generation_path(gen_model) {
            let recorded = Path::new(recorded);
            if recorded.is_file() {
                return Ok(recorded.to_path_buf());
            }
        }

        find_generated_image(&item.id, gen_model, &self.config.output_dir).ok_or_else(|| {
            let expected = resolve_image_path(&item.id, gen_model, &self.config.output_dir, "png");
            RunError::not_found(
                expected.display().to_string(),
                format!("no generated image for item {} and model {}", item.id, gen_model),
            )
        })
    }

    pub async fn run(
        &self,
        mut item: VisItem,
        gen_model: &str,
        image_path: Option<&Path>,
    ) -> anyhow::Result<VisItem> {
        let eval_model = self.engine.model();

        if self.config.resume && self.engine.is_fully_evaluated(&item, gen_model, eval_model) {
            info!(
                item_id = %item.id,
                gen_model,
                eval_model,
                "All questions already evaluated for item {} with {} on {}",
                item.id,
                eval_model,
                gen_model
            );
            return Ok(item);
        }

        if item.evaluation.is_empty() {
            return Err(RunError::invalid_input(format!(
                "No questions found for item {}. Questions should be generated before evaluation.",
                item.id
            ))
            .into());
        }

        let image_path = self.resolve_image(&item, gen_model, image_path)?;

        info!(
            item_id = %item.id,
            gen_model,
            eval_model,
            "Evaluating item {} with {} on {}",
            item.id,
            eval_model,
            gen_model
        );

        let bytes = std::fs::read(&image_path)
            .with_context(|| format!("failed to read image {}", image_path.display()))?;
        let image = ImageInput::new(bytes);

        let total = item.evaluation.len();
        for i in 0..total {
            let entry = &item.evaluation[i];
            if self.config.resume && self.engine.has_judgment(entry, gen_model, eval_model) {
                info!(
                    question = i + 1,
                    total,
                    "Skipping question {} / {} (already evaluated by {} on {})",
                    i + 1,
                    total,
                    eval_model,
                    gen_model
                );
                continue;
            }

            info!(
                item_id = %item.id,
                question = i + 1,
                total,
                "Evaluating item {} with {} on {} -> {} / {}",
                item.id,
                eval_model,
                gen_model,
                i + 1,
                total
            );

            let judgment = self
                .engine
                .judge_entry(entry, gen_model, eval_model, &image)
                .await
                .with_context(|| {
                    format!(
                        "judging question {} / {} of item {} with {} failed",
                        i + 1,
                        total,
                        item.id,
                        eval_model
                    )
                })?;
            item.evaluation[i].add_judgment(judgment);

            self.store.save_item(&item)?;
        }

        let score = item.score(gen_model, eval_model);
        info!(
            item_id = %item.id,
            gen_model,
            eval_model,
            "Score for item {}: {} / {} passed ({} judged)",
            item.id,
            score.passed,
            score.total,
            score.judged
        );

        Ok(item)
    }
}
