//! Chapter drafting through the writer stage.

mod test_utils;

use opentale_error::OpentaleErrorKind;
use opentale_pipeline::{ChapterPipeline, StageOrchestrator, StreamOutcome};
use std::sync::Arc;
use test_utils::{MockResponse, MockService, delta_text, drain, memory_store};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

async fn pipeline(service: &MockService) -> (ChapterPipeline, Arc<opentale_pipeline::ContextStore>) {
    let (_backend, store) = memory_store();
    store.write_world("WORLD_ELEMENTS:\n\nCoast").await.unwrap();
    store.write_characters("CHARACTER_PROFILES:\n\nMara").await.unwrap();
    store
        .write_outline("Chapter 1: Landfall\nArrive.\nChapter 2: Wreck\nSink.", 2)
        .await
        .unwrap();
    let pipeline = ChapterPipeline::new(
        Arc::new(StageOrchestrator::default()),
        Arc::new(service.clone()),
        store.clone(),
    );
    (pipeline, store)
}

#[tokio::test]
async fn test_unknown_chapter_is_not_found() {
    let service = MockService::default();
    let (pipeline, store) = pipeline(&service).await;

    let err = pipeline
        .generate(9, &store.snapshot().await, None)
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), OpentaleErrorKind::NotFound(_)));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_writer_request_carries_world_characters_and_prompt() {
    let service = MockService::default();
    let (pipeline, store) = pipeline(&service).await;

    let request = pipeline
        .writer_request(1, &store.snapshot().await, Some("  "))
        .unwrap();
    let messages = request.messages();
    let user = &messages[0].content;

    assert!(user.contains("Generate Chapter 1: Landfall"));
    assert!(user.contains("Chapter outline: Arrive."));
    assert!(user.contains("World: WORLD_ELEMENTS:"));
    assert!(user.contains("Characters: CHARACTER_PROFILES:"));
    assert!(!user.contains("Arrive.\n\n"));
}

#[tokio::test]
async fn test_streamed_chapter_is_stored_as_streamed() {
    let service = MockService::new(vec![MockResponse::deltas(&[
        "The keeper ",
        "climbed.\n\n\n",
        "The lamp burned.",
    ])]);
    let (pipeline, store) = pipeline(&service).await;
    let (tx, rx) = mpsc::channel(16);

    let outcome = pipeline
        .generate_stream(1, &store.snapshot().await, None, tx, CancellationToken::new())
        .await
        .unwrap();
    let events = drain(rx).await;

    assert_eq!(delta_text(&events), "The keeper climbed.\n\n\nThe lamp burned.");
    assert!(matches!(outcome, StreamOutcome::Completed(_)));
    assert_eq!(
        store.snapshot().await.chapter(1).unwrap().content().as_deref(),
        Some("The keeper climbed.\nThe lamp burned.")
    );
}

#[tokio::test]
async fn test_cancelled_chapter_stream_keeps_previous_content() {
    let service = MockService::new(vec![
        MockResponse::Text("SCENE FINAL: First draft.".into()),
        MockResponse::DeltasThenHang(vec!["Second ".into(), "draft".into()]),
    ]);
    let (pipeline, store) = pipeline(&service).await;
    pipeline
        .generate(1, &store.snapshot().await, None)
        .await
        .unwrap();

    let (tx, mut rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    let task = {
        let pipeline = pipeline.clone();
        let snapshot = store.snapshot().await;
        let cancel = cancel.clone();
        tokio::spawn(async move { pipeline.generate_stream(1, &snapshot, None, tx, cancel).await })
    };

    assert!(rx.recv().await.unwrap().is_heartbeat());
    rx.recv().await.unwrap();
    cancel.cancel();

    assert_eq!(task.await.unwrap().unwrap(), StreamOutcome::Cancelled);
    assert_eq!(
        store.snapshot().await.chapter(1).unwrap().content().as_deref(),
        Some("First draft.")
    );
}
