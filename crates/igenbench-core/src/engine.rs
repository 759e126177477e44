//! Engines wrap a provider client and a model name for one kind of call.

use std::sync::Arc;

use igenbench_providers::{GeneratedImage, ImageInput, ProviderClient};
use tracing::debug;

use crate::errors::RunError;
use crate::judge::{build_factual_qa_prompt, parse_judgment};
use crate::vis_item::{EvalEntry, Judgment, VisItem};

/// Text-to-image generation.
#[derive(Clone)]
pub struct GenEngine {
    client: Arc<dyn ProviderClient>,
    model: String,
}

impl GenEngine {
    pub fn new(client: Arc<dyn ProviderClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn text_to_image(&self, item: &VisItem) -> anyhow::Result<GeneratedImage> {
        let prompt = item
            .t2i_prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                RunError::invalid_input(format!(
                    "Generation requires t2i_prompt to be set (item {})",
                    item.id
                ))
            })?;

        let image = self.client.generate_image(&self.model, prompt).await?;
        debug!(
            item_id = %item.id,
            model = %self.model,
            bytes = image.bytes.len(),
            format = image.extension(),
            "image generated"
        );
        Ok(image)
    }
}

/// Judge-model calls for evaluation entries.
#[derive(Clone)]
pub struct EvalEngine {
    client: Arc<dyn ProviderClient>,
    model: String,
}

impl EvalEngine {
    pub fn new(client: Arc<dyn ProviderClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_judgment(&self, entry: &EvalEntry, gen_model: &str, eval_model: &str) -> bool {
        entry.has_judgment(gen_model, eval_model)
    }

    pub fn is_fully_evaluated(&self, item: &VisItem, gen_model: &str, eval_model: &str) -> bool {
        item.is_evaluation_complete(gen_model, eval_model)
    }

    /// Ask the judge model one question about `image`.
    pub async fn judge_entry(
        &self,
        entry: &EvalEntry,
        gen_model: &str,
        eval_model: &str,
        image: &ImageInput,
    ) -> anyhow::Result<Judgment> {
        let question = entry.question.trim();
        if question.is_empty() {
            return Err(RunError::invalid_input("Question is required").into());
        }

        let prompt = build_factual_qa_prompt(question);
        let response = self
            .client
            .understand_image(eval_model, image, &prompt)
            .await?;

        let judgment = parse_judgment(&response, gen_model, eval_model);
        if judgment.answer.is_empty() {
            debug!(eval_model, response_len = response.len(), "judge response had no answer");
        }
        Ok(judgment)
    }
}

impl std::fmt::Debug for GenEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenEngine")
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .finish()
    }
}

impl std::fmt::Debug for EvalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalEngine")
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RunErrorKind;
    use igenbench_providers::{FakeClient, PLACEHOLDER_PNG};

    fn fake(answer: &str) -> Arc<dyn ProviderClient> {
        Arc::new(FakeClient::new(answer))
    }

    #[tokio::test]
    async fn generation_requires_prompt() {
        let engine = GenEngine::new(fake("1"), "m");
        let mut item = VisItem::new("1");
        item.t2i_prompt = Some("   ".into());
        let err = engine.text_to_image(&item).await.unwrap_err();
        assert_eq!(RunError::from_anyhow(&err).kind, RunErrorKind::InvalidInput);

        item.t2i_prompt = Some("A chart".into());
        let image = engine.text_to_image(&item).await.unwrap();
        assert_eq!(image.bytes, PLACEHOLDER_PNG);
    }

    #[tokio::test]
    async fn judge_entry_parses_fake_response() {
        let engine = EvalEngine::new(fake("0"), "judge");
        let entry = EvalEntry {
            question: "Is there a legend?".into(),
            ..EvalEntry::default()
        };
        let image = ImageInput::new(PLACEHOLDER_PNG.to_vec());
        let j = engine.judge_entry(&entry, "g", "judge", &image).await.unwrap();
        assert_eq!(j.answer, "0");
        assert_eq!(j.analysis, "fake judge");
        assert_eq!(j.gen_model, "g");

        let blank = EvalEntry::default();
        let err = engine.judge_entry(&blank, "g", "judge", &image).await.unwrap_err();
        assert_eq!(RunError::from_anyhow(&err).kind, RunErrorKind::InvalidInput);
    }
}
