use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use igenbench_providers::{ProviderClient, ProviderConfig};
use tracing::info;

use crate::engine::GenEngine;
use crate::fs::atomic_write;
use crate::naming::resolve_image_path;
use crate::store::ItemStore;
use crate::vis_item::VisItem;

use super::config::WorkflowConfig;

/// Text-to-image generation for one item.
#[derive(Debug)]
pub struct GenWorkflow {
    config: WorkflowConfig,
    store: ItemStore,
    engine: GenEngine,
}

impl GenWorkflow {
    pub fn new(config: WorkflowConfig, client: Arc<dyn ProviderClient>) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            store: ItemStore::new(config.output_dir.clone()),
            engine: GenEngine::new(client, config.model.clone()),
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

    pub async fn run(&self, mut item: VisItem) -> anyhow::Result<VisItem> {
        let model = self.config.model.as_str();

        if self.config.resume {
            if let Some(existing) = item.generation_path(model) {
                if Path::new(existing).is_file() {
                    info!(
                        item_id = %item.id,
                        model,
                        "Image already exists for {}/{}: {}",
                        item.id,
                        model,
                        existing
                    );
                    return Ok(item);
                }
            }
        }

        info!(item_id = %item.id, model, "Generating image for item {} with {}", item.id, model);

        let image = self
            .engine
            .text_to_image(&item)
            .await
            .with_context(|| format!("text-to-image failed for item {} with {}", item.id, model))?;
        let image_path = resolve_image_path(
            &item.id,
            model,
            &self.config.output_dir,
            image.extension(),
        );
        atomic_write(&image_path, &image.bytes)
            .with_context(|| format!("failed to write image {}", image_path.display()))?;

        item.update_generation(model, image_path.display().to_string());
        self.store.save_item(&item)?;

        info!(item_id = %item.id, model, "Image generated: {}", image_path.display());
        Ok(item)
    }
}
