//! Stage workflows against a scripted generation service.

mod test_utils;

use opentale_core::{Role, StageIdentifier};
use opentale_error::{
    BuilderErrorKind, ConfigurationErrorKind, OpentaleErrorKind, UpstreamGenerationErrorKind,
};
use opentale_interface::{ArtifactKey, ArtifactStore};
use opentale_pipeline::{StageOrchestrator, StreamOutcome, Studio, StudioSettings};
use opentale_storage::InMemoryArtifactStore;
use std::sync::Arc;
use test_utils::{MockResponse, MockService, memory_store};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const OUTLINE_REPLY: &str = "Here you go.\nOUTLINE:\n\nChapter 1: Landfall\n- Key Events:\n  * Arrival\n\nChapter 2: Wreck\n- Key Events:\n  * Storm\n\nEND OF OUTLINE\nEnjoy!";

fn studio(service: &MockService) -> (Arc<InMemoryArtifactStore>, Studio) {
    let (backend, store) = memory_store();
    let studio = Studio::new(
        StageOrchestrator::default(),
        Arc::new(service.clone()),
        store,
        StudioSettings::default(),
    );
    (backend, studio)
}

async fn with_world_and_characters(studio: &Studio) {
    studio.begin("lighthouse keepers", 2).await.unwrap();
    studio
        .save_world("WORLD_ELEMENTS:\n\nCoast:\n- Fog")
        .await
        .unwrap();
    studio
        .save_characters("CHARACTER_PROFILES:\n\nMara:\n- Role: keeper")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_full_workflow() {
    let service = MockService::new(vec![
        MockResponse::Text("Sure!\nWORLD_ELEMENTS:\n\nCoast:\n\n\n\n- Fog".into()),
        MockResponse::Text("CHARACTER_PROFILES:\n\nMara:\n- Role: keeper".into()),
        MockResponse::Text(OUTLINE_REPLY.into()),
        MockResponse::Text(
            "SCENE: rough\nSCENE FINAL:\nThe keeper climbed.\n\nThe lamp burned.".into(),
        ),
        MockResponse::Text("SCENE FINAL: The storm broke.".into()),
    ]);
    let (backend, studio) = studio(&service);

    studio.begin("lighthouse keepers", 2).await.unwrap();

    let world = studio.generate_world().await.unwrap();
    assert_eq!(world.text(), "WORLD_ELEMENTS:\n\nCoast:\n\n- Fog");
    assert!(service.last_call().messages[0].content.contains("lighthouse keepers"));

    studio.generate_characters(None).await.unwrap();
    let call = service.last_call();
    assert!(call.system_prompt.contains("Coast:"));
    assert!(call.messages[0].content.contains("Create 3 distinct characters"));

    let outline = studio.generate_outline().await.unwrap();
    assert!(outline.warning().is_none());
    assert!(outline.text().starts_with("OUTLINE:"));
    assert!(outline.text().ends_with("END OF OUTLINE"));
    assert!(service.last_call().system_prompt.contains("EXACTLY 2 chapters"));

    let first = studio.generate_chapter(1, None).await.unwrap();
    assert_eq!(first.text(), "The keeper climbed.\nThe lamp burned.");

    studio
        .generate_chapter(2, Some("Make it stormy"))
        .await
        .unwrap();
    let call = service.last_call();
    assert!(call.system_prompt.contains("Chapter 1: Landfall"));
    assert!(call.messages[0].content.contains("Generate Chapter 2: Wreck"));
    assert!(call.messages[0].content.contains("The lamp burned."));
    assert!(call.messages[0].content.contains("Make it stormy"));

    let snapshot = studio.snapshot().await;
    assert_eq!(
        snapshot.chapter(2).unwrap().content().as_deref(),
        Some("The storm broke.")
    );
    assert_eq!(
        backend.load("test", ArtifactKey::Chapter(1)).await.unwrap().as_deref(),
        Some("The keeper climbed.\nThe lamp burned.")
    );
}

#[tokio::test]
async fn test_missing_prerequisite_makes_no_call() {
    let service = MockService::default();
    let (_backend, studio) = studio(&service);

    let err = studio.generate_characters(None).await.unwrap_err();
    assert!(matches!(err.kind(), OpentaleErrorKind::MissingPrerequisite(_)));

    let err = studio.generate_chapter(1, None).await.unwrap_err();
    assert!(matches!(err.kind(), OpentaleErrorKind::NotFound(_)));

    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_outline_requires_characters() {
    let service = MockService::default();
    let (_backend, studio) = studio(&service);
    studio.save_world("WORLD_ELEMENTS:\n\nCoast").await.unwrap();

    let err = studio.generate_outline().await.unwrap_err();
    match err.kind() {
        OpentaleErrorKind::MissingPrerequisite(missing) => {
            assert_eq!(missing.stage, "outline_creator");
            assert!(format!("{}", missing).contains("characters"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_chat_replays_history() {
    let service = MockService::new(vec![
        MockResponse::Text("What era?".into()),
        MockResponse::Text("Bronze age it is.".into()),
    ]);
    let (_backend, studio) = studio(&service);

    studio
        .chat(StageIdentifier::WorldBuilderChat, "A drowned city")
        .await
        .unwrap();
    let reply = studio
        .chat(StageIdentifier::WorldBuilderChat, "Bronze age")
        .await
        .unwrap();
    assert_eq!(reply, "Bronze age it is.");

    let call = service.last_call();
    let turns: Vec<(Role, &str)> = call
        .messages
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect();
    assert_eq!(
        turns,
        vec![
            (Role::User, "A drowned city"),
            (Role::Assistant, "What era?"),
            (Role::User, "Bronze age"),
        ]
    );

    let snapshot = studio.snapshot().await;
    assert_eq!(snapshot.history(StageIdentifier::WorldBuilderChat).len(), 4);
    assert!(snapshot.history(StageIdentifier::OutlineCreatorChat).is_empty());
}

#[tokio::test]
async fn test_chat_rejects_non_chat_stage() {
    let service = MockService::default();
    let (_backend, studio) = studio(&service);

    let err = studio
        .chat(StageIdentifier::Writer, "hello")
        .await
        .unwrap_err();
    match err.kind() {
        OpentaleErrorKind::Configuration(config) => assert_eq!(
            config.kind,
            ConfigurationErrorKind::NotChatStage("writer".into())
        ),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_cancelled_chat_turn_is_not_recorded() {
    let service = MockService::new(vec![MockResponse::DeltasThenHang(vec!["Tell me".into()])]);
    let (backend, studio) = studio(&service);
    let studio = Arc::new(studio);
    let (tx, mut rx) = mpsc::channel(4);
    let cancel = CancellationToken::new();

    let task = {
        let studio = studio.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            studio
                .chat_stream(StageIdentifier::WorldBuilderChat, "Hi", tx, cancel)
                .await
        })
    };

    assert!(rx.recv().await.unwrap().is_heartbeat());
    assert!(!rx.recv().await.unwrap().is_done());
    cancel.cancel();

    assert_eq!(task.await.unwrap().unwrap(), StreamOutcome::Cancelled);
    assert!(
        studio
            .snapshot()
            .await
            .history(StageIdentifier::WorldBuilderChat)
            .is_empty()
    );
    assert!(backend.is_empty().await);
}

#[tokio::test]
async fn test_finalize_world_adds_header_and_uses_chat() {
    let service = MockService::new(vec![
        MockResponse::Text("Islands, then.".into()),
        MockResponse::Text("A sunken empire of islands.".into()),
    ]);
    let (_backend, studio) = studio(&service);
    studio.begin("sea empire", 5).await.unwrap();
    studio
        .chat(StageIdentifier::WorldBuilderChat, "Islands?")
        .await
        .unwrap();

    let world = studio.finalize_world().await.unwrap();
    assert_eq!(world.text(), "WORLD_ELEMENTS:\n\nA sunken empire of islands.");

    let call = service.last_call();
    assert_eq!(call.messages.len(), 3);
    assert!(call.messages[2].content.contains("'sea empire'"));
}

#[tokio::test]
async fn test_finalize_outline_lowers_temperature() {
    let service = MockService::new(vec![MockResponse::Text(OUTLINE_REPLY.into())]);
    let (_backend, studio) = studio(&service);
    with_world_and_characters(&studio).await;

    studio.finalize_outline().await.unwrap();

    let call = service.last_call();
    assert_eq!(*call.params.temperature(), 0.6);
    assert!(call.messages.last().unwrap().content.contains("EXACTLY 2 chapters"));
    assert_eq!(studio.snapshot().await.chapters().len(), 2);
}

#[tokio::test]
async fn test_outline_without_declared_count_uses_default_everywhere() {
    let service = MockService::new(vec![MockResponse::Text(OUTLINE_REPLY.into())]);
    let (_backend, studio) = studio(&service);
    studio.save_world("WORLD_ELEMENTS:\n\nCoast").await.unwrap();
    studio
        .save_characters("CHARACTER_PROFILES:\n\nMara")
        .await
        .unwrap();

    studio.generate_outline().await.unwrap();

    let call = service.last_call();
    assert!(call.system_prompt.contains("EXACTLY 10 chapters"));
    assert!(!call.system_prompt.contains("EXACTLY 0 chapters"));
    assert!(call.messages[0].content.contains("10-chapter outline"));
}

#[tokio::test]
async fn test_save_outline_keeps_surviving_chapter_content() {
    let service = MockService::new(vec![MockResponse::Text("SCENE FINAL: Landfall prose.".into())]);
    let (_backend, studio) = studio(&service);
    with_world_and_characters(&studio).await;
    studio
        .save_outline("Chapter 1: Landfall\r\nbody\r\n\r\n\r\nChapter 2: Wreck\r\nbody", None)
        .await
        .unwrap();
    studio.generate_chapter(1, None).await.unwrap();

    let saved = studio
        .save_outline("Chapter 1: Landfall\nnew body\n\nChapter 3: Rescue\nbody", Some(3))
        .await
        .unwrap();
    assert!(saved.warning().is_none());

    let snapshot = studio.snapshot().await;
    let numbers: Vec<u32> = snapshot.chapters().keys().copied().collect();
    assert_eq!(numbers, vec![1, 3]);
    assert_eq!(
        snapshot.chapter(1).unwrap().content().as_deref(),
        Some("Landfall prose.")
    );
    assert_eq!(snapshot.chapter(1).unwrap().prompt(), "new body");
}

#[tokio::test]
async fn test_save_outline_without_headers_warns() {
    let service = MockService::default();
    let (_backend, studio) = studio(&service);

    let saved = studio
        .save_outline("Just some notes.", Some(4))
        .await
        .unwrap();
    assert_eq!(saved.warning().map(|w| w.declared_chapter_count), Some(4));
    assert_eq!(studio.snapshot().await.chapters().len(), 4);
}

#[tokio::test]
async fn test_regenerate_chapters() {
    let service = MockService::default();
    let (_backend, studio) = studio(&service);

    let err = studio.regenerate_chapters(Some(3)).await.unwrap_err();
    assert!(matches!(err.kind(), OpentaleErrorKind::NotFound(_)));

    studio
        .save_outline("Chapter 2: B\nChapter 1: A", None)
        .await
        .unwrap();
    studio.regenerate_chapters(Some(3)).await.unwrap();
    assert_eq!(studio.snapshot().await.chapters().len(), 2);
}

#[tokio::test]
async fn test_edit_chapter() {
    let service = MockService::new(vec![
        MockResponse::Text("SCENE FINAL: Rough prose.".into()),
        MockResponse::Text("FEEDBACK: tighten\nEDITED_SCENE:\nPolished prose.".into()),
    ]);
    let (_backend, studio) = studio(&service);
    with_world_and_characters(&studio).await;
    studio
        .save_outline("Chapter 1: Landfall\nbody", None)
        .await
        .unwrap();

    let err = studio.edit_chapter(1).await.unwrap_err();
    assert!(matches!(err.kind(), OpentaleErrorKind::MissingPrerequisite(_)));

    studio.generate_chapter(1, None).await.unwrap();
    let edited = studio.edit_chapter(1).await.unwrap();
    assert_eq!(edited.text(), "Polished prose.");
    assert!(service.last_call().messages[0].content.contains("Rough prose."));
    assert_eq!(
        studio.snapshot().await.chapter(1).unwrap().content().as_deref(),
        Some("Polished prose.")
    );
}

#[tokio::test]
async fn test_consult_does_not_persist() {
    let service = MockService::new(vec![MockResponse::Text(
        "Preamble\nSTORY_ARC:\n- Major Plot Points:\n  rise".into(),
    )]);
    let (backend, studio) = studio(&service);

    let arc = studio
        .consult(StageIdentifier::StoryPlanner, "Plan it")
        .await
        .unwrap();
    assert!(arc.starts_with("STORY_ARC:"));
    assert!(backend.is_empty().await);
}

#[tokio::test]
async fn test_upstream_failure_leaves_slot_empty() {
    let service = MockService::new(vec![MockResponse::Error(
        UpstreamGenerationErrorKind::Request("connection refused".into()),
    )]);
    let (backend, studio) = studio(&service);

    let err = studio.generate_world().await.unwrap_err();
    assert!(err.is_upstream());
    assert!(!studio.snapshot().await.has_world_theme());
    assert!(backend.load("test", ArtifactKey::World).await.unwrap().is_none());
}

#[tokio::test]
async fn test_streamed_outline_populates_chapters() {
    let service = MockService::new(vec![MockResponse::deltas(&[
        "OUTLINE:\n\nChapter 1: Landfall\n",
        "- Key Events:\n  * Arrival\n\n",
        "Chapter 2: Wreck\n- Key Events:\n  * Storm\n\nEND OF OUTLINE",
    ])]);
    let (_backend, studio) = studio(&service);
    with_world_and_characters(&studio).await;
    let (tx, _rx) = mpsc::channel(16);

    let outcome = studio
        .generate_outline_stream(tx, CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(outcome, StreamOutcome::Completed(_)));
    assert!(service.last_call().streaming);
    let snapshot = studio.snapshot().await;
    assert_eq!(snapshot.chapter(2).unwrap().title(), "Wreck");
}

#[tokio::test]
async fn test_reset_clears_project() {
    let service = MockService::default();
    let (backend, studio) = studio(&service);
    with_world_and_characters(&studio).await;

    studio.reset().await.unwrap();

    assert!(!studio.snapshot().await.has_world_theme());
    assert!(backend.is_empty().await);
}

#[test]
fn test_zero_chapter_setting_is_rejected() {
    let err = StudioSettings::builder()
        .chapter_count(0u32)
        .build()
        .unwrap_err();
    assert!(matches!(err.kind, BuilderErrorKind::InvalidSettings(_)));
}
