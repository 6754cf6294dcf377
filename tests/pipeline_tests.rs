//! End-to-end pipeline tests
//!
//! Runs the edit pipeline against both the mock client and a wiremock Ollama
//! server and checks the artifact it leaves behind.

mod common;

use common::mocks::MockLLMClient;
use copyedit::editing::{CancelSignal, CopyEditor, EditorPipeline, RunRequest, TextChunker};
use copyedit::jobs::{self, JobRegistry};
use copyedit::llm::{GenerationOptions, OllamaClient};
use copyedit::storage::OutputStore;
use copyedit::types::{AppError, JobStatus};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Three paragraphs that each fill a 20-character chunk on their own
const THREE_PARAGRAPHS: &str = "First paragraph ok.\nSecond paragraph!!\nThird paragraph...";

fn pipeline(client: Arc<dyn copyedit::LLMClient>, dir: &TempDir) -> EditorPipeline {
    EditorPipeline::new(
        TextChunker::new(20),
        CopyEditor::new(client),
        OutputStore::new(dir.path()),
    )
}

fn request(text: &str) -> RunRequest<'_> {
    RunRequest {
        job_id: Uuid::new_v4(),
        text,
        estimated_chunks: 1,
    }
}

#[tokio::test]
async fn test_each_chunk_is_sent_in_order_with_the_edit_prompt() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(MockLLMClient::numbered());
    let pipeline = pipeline(client.clone(), &dir);

    let summary = pipeline
        .run(request(THREE_PARAGRAPHS), &CancelSignal::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(summary.chunks, 3);
    let prompts = client.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("First paragraph ok."));
    assert!(prompts[1].contains("Second paragraph!!"));
    assert!(prompts[2].contains("Third paragraph..."));
    assert!(prompts.iter().all(|p| p.contains("Chicago")));

    assert_eq!(
        pipeline.store().read_latest().unwrap(),
        "edited 1\n\nedited 2\n\nedited 3\n\n"
    );
}

#[tokio::test]
async fn test_probe_refusal_processes_nothing() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("edited.txt"), "last good result").unwrap();

    let client = Arc::new(MockLLMClient::numbered().unavailable());
    let pipeline = pipeline(client.clone(), &dir);

    let err = pipeline.editor().ensure_available().await.unwrap_err();
    assert!(matches!(err, AppError::ServiceUnavailable(_)));
    assert_eq!(client.calls(), 0);
    assert_eq!(pipeline.store().read_latest().unwrap(), "last good result");
}

#[tokio::test]
async fn test_second_chunk_failure_stops_the_run() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("edited.txt"), "last good result").unwrap();

    let client = Arc::new(MockLLMClient::numbered().failing_on(2));
    let pipeline = pipeline(client.clone(), &dir);

    let err = pipeline
        .run(request(THREE_PARAGRAPHS), &CancelSignal::new(), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(&err, AppError::ServiceError(msg) if msg.contains("chunk 2 of 3")));
    assert_eq!(client.calls(), 2);
    assert_eq!(pipeline.store().read_latest().unwrap(), "last good result");
}

#[tokio::test]
async fn test_identical_runs_produce_identical_artifacts() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(MockLLMClient::new("  Same edit every time.\n"));
    let pipeline = pipeline(client, &dir);

    pipeline
        .run(request(THREE_PARAGRAPHS), &CancelSignal::new(), |_| {})
        .await
        .unwrap();
    let first = pipeline.store().read_latest().unwrap();

    pipeline
        .run(request(THREE_PARAGRAPHS), &CancelSignal::new(), |_| {})
        .await
        .unwrap();
    let second = pipeline.store().read_latest().unwrap();

    assert_eq!(first, second);
    assert_eq!(first, "Same edit every time.\n\n".repeat(3));
}

#[tokio::test]
async fn test_run_against_mocked_ollama() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/show"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    for (marker, reply) in [
        ("First paragraph", "First paragraph, ok."),
        ("Second paragraph", "Second paragraph!"),
        ("Third paragraph", "Third paragraph."),
    ] {
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_string_contains(marker))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": reply,
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let client = OllamaClient::new(
        server.uri(),
        "llama3.2".to_string(),
        GenerationOptions::default(),
    )
    .unwrap();
    let pipeline = pipeline(Arc::new(client), &dir);

    pipeline.editor().ensure_available().await.unwrap();
    pipeline
        .run(request(THREE_PARAGRAPHS), &CancelSignal::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(
        pipeline.store().read_latest().unwrap(),
        "First paragraph, ok.\n\nSecond paragraph!\n\nThird paragraph.\n\n"
    );
}

#[tokio::test]
async fn test_mocked_ollama_failure_keeps_previous_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_string_contains("Second paragraph"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_string_contains("Third paragraph"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "x" })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "ok" })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("edited.txt"), "last good result").unwrap();
    let client = OllamaClient::new(
        server.uri(),
        "llama3.2".to_string(),
        GenerationOptions::default(),
    )
    .unwrap();
    let pipeline = pipeline(Arc::new(client), &dir);

    let err = pipeline
        .run(request(THREE_PARAGRAPHS), &CancelSignal::new(), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(&err, AppError::ServiceError(msg) if msg.contains("model crashed")));
    assert_eq!(pipeline.store().read_latest().unwrap(), "last good result");
}

#[tokio::test]
async fn test_driven_job_records_outcome() {
    let dir = TempDir::new().unwrap();
    let registry = Arc::new(JobRegistry::new());
    let pipeline = Arc::new(pipeline(Arc::new(MockLLMClient::numbered()), &dir));

    let job = registry
        .submit(THREE_PARAGRAPHS.to_string(), vec![], 3)
        .unwrap();
    let ticket = registry.start(job.id).unwrap();
    jobs::drive(registry.clone(), pipeline.clone(), ticket).await;

    let job = registry.get(job.id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress.completed, 3);
    assert_eq!(job.summary.unwrap().chunks, 3);
    assert_eq!(registry.active_job(), None);
}

#[tokio::test]
async fn test_cancelled_job_is_recorded() {
    let dir = TempDir::new().unwrap();
    let registry = Arc::new(JobRegistry::new());
    let client = MockLLMClient::numbered().with_delay(Duration::from_secs(30));
    let pipeline = Arc::new(pipeline(Arc::new(client), &dir));

    let job = registry
        .submit(THREE_PARAGRAPHS.to_string(), vec![], 3)
        .unwrap();
    let ticket = registry.start(job.id).unwrap();
    let handle = tokio::spawn(jobs::drive(registry.clone(), pipeline.clone(), ticket));

    tokio::time::sleep(Duration::from_millis(50)).await;
    registry.cancel(job.id).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("run should stop promptly")
        .unwrap();

    assert_eq!(registry.get(job.id).unwrap().status, JobStatus::Cancelled);
    assert!(!pipeline.store().has_artifact());
}
