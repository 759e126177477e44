mod common;

use common::{item_with_questions, write_item, CountingClient};
use igenbench_core::{GenWorkflow, RunError, RunErrorKind, VisItem, WorkflowConfig};
use igenbench_providers::PLACEHOLDER_PNG;

const MODEL: &str = "google/gemini-2.5-flash-image-preview";

#[tokio::test]
async fn generation_writes_image_and_state() {
    let out = tempfile::tempdir().unwrap();
    let client = CountingClient::new();
    let wf = GenWorkflow::new(
        WorkflowConfig::new("openrouter", MODEL, out.path(), false),
        client.clone(),
    )
    .unwrap();

    let item = wf.run(item_with_questions("20", 1)).await.unwrap();
    assert_eq!(client.generations(), 1);

    let expected = out.path().join("20/20_gemini_2_5_flash_image_preview.png");
    assert_eq!(
        item.generation_path(MODEL),
        Some(expected.display().to_string().as_str())
    );
    assert_eq!(std::fs::read(&expected).unwrap(), PLACEHOLDER_PNG);

    let saved = VisItem::from_path(&out.path().join("20/20.json")).unwrap();
    assert_eq!(saved, item);
}

#[tokio::test]
async fn resume_with_existing_image_makes_no_call() {
    let out = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let source = write_item(src.path(), &item_with_questions("21", 1));
    let config = WorkflowConfig::new("google", MODEL, out.path(), true);

    let first = CountingClient::new();
    let wf = GenWorkflow::new(config.clone(), first.clone()).unwrap();
    let item = wf.store().load_item(&source, true).unwrap();
    wf.run(item).await.unwrap();
    assert_eq!(first.generations(), 1);

    let second = CountingClient::new();
    let wf = GenWorkflow::new(config, second.clone()).unwrap();
    let item = wf.store().load_item(&source, true).unwrap();
    assert!(wf.store().is_generation_complete("21", MODEL));
    wf.run(item).await.unwrap();
    assert_eq!(second.generations(), 0);
}

#[tokio::test]
async fn resume_regenerates_when_recorded_file_is_missing() {
    let out = tempfile::tempdir().unwrap();
    let config = WorkflowConfig::new("google", MODEL, out.path(), true);

    let mut item = item_with_questions("22", 1);
    item.update_generation(MODEL, out.path().join("gone.png").display().to_string());

    let client = CountingClient::new();
    let wf = GenWorkflow::new(config, client.clone()).unwrap();
    let item = wf.run(item).await.unwrap();
    assert_eq!(client.generations(), 1);
    assert!(item
        .generation_path(MODEL)
        .unwrap()
        .ends_with("22_gemini_2_5_flash_image_preview.png"));
}

#[tokio::test]
async fn missing_prompt_is_invalid_input() {
    let out = tempfile::tempdir().unwrap();
    let client = CountingClient::new();
    let wf = GenWorkflow::new(
        WorkflowConfig::new("google", MODEL, out.path(), false),
        client.clone(),
    )
    .unwrap();

    let err = wf.run(VisItem::new("23")).await.unwrap_err();
    assert_eq!(RunError::from_anyhow(&err).kind, RunErrorKind::InvalidInput);
    assert_eq!(client.generations(), 0);
    assert!(!out.path().join("23/23.json").exists());
}
