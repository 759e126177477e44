#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use igenbench_core::{EvalEntry, VisItem};
use igenbench_providers::{
    GeneratedImage, ImageInput, ProviderClient, ProviderError, ProviderResult, PLACEHOLDER_PNG,
};

/// Provider double that counts calls and can fail on a given judge call.
#[derive(Default)]
pub struct CountingClient {
    pub generate_calls: AtomicUsize,
    pub judge_calls: AtomicUsize,
    /// 1-based judge call that returns a server error.
    pub fail_on_judge_call: Option<usize>,
    pub prompts: std::sync::Mutex<Vec<String>>,
}

impl CountingClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(call: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_on_judge_call: Some(call),
            ..Self::default()
        })
    }

    pub fn generations(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn judgments(&self) -> usize {
        self.judge_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for CountingClient {
    async fn generate_image(&self, _model: &str, _prompt: &str) -> ProviderResult<GeneratedImage> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(GeneratedImage::new(PLACEHOLDER_PNG.to_vec()))
    }

    async fn understand_image(
        &self,
        _model: &str,
        _image: &ImageInput,
        prompt: &str,
    ) -> ProviderResult<String> {
        let call = self.judge_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_judge_call == Some(call) {
            return Err(ProviderError::Server {
                provider: "counting".into(),
                status: 503,
                message: "overloaded".into(),
            });
        }
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(format!(
            "```json\n{{\"analysis\": \"call {}\", \"answer\": \"{}\"}}\n```",
            call,
            call % 2
        ))
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

pub fn item_with_questions(id: &str, n: usize) -> VisItem {
    let mut item = VisItem::new(id);
    item.t2i_prompt = Some("A stacked bar chart of energy mix by year".into());
    item.chart_type = Some("bar".into());
    for i in 0..n {
        item.evaluation.push(EvalEntry {
            source: "prompt".into(),
            ground: format!("fact {}", i + 1),
            question: format!("Is fact {} shown?", i + 1),
            question_type: "factual".into(),
            judgments: Vec::new(),
        });
    }
    item
}

pub fn write_item(dir: &Path, item: &VisItem) -> PathBuf {
    let path = dir.join(format!("{}.json", item.id));
    std::fs::write(&path, serde_json::to_string_pretty(item).unwrap()).unwrap();
    path
}

pub fn write_image(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, PLACEHOLDER_PNG).unwrap();
}
