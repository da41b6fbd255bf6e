//! Configuration wiring tests: overrides reach the orchestrator and the studio.

use opentale::{
    ContextSnapshot, ContextStore, FileSystemArtifactStore, OpentaleConfig, StageIdentifier,
};
use std::sync::Arc;

fn write_config(dir: &tempfile::TempDir, text: &str) -> std::path::PathBuf {
    let path = dir.path().join("opentale.toml");
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn prompt_override_reaches_requests() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[generation]
temperature = 0.3

[prompts]
story_planner = "Plan a book about {{ topic }}."
"#,
    );

    let config = OpentaleConfig::from_file(&path).unwrap();
    let orchestrator = config.orchestrator().unwrap();

    let mut snapshot = ContextSnapshot::default();
    snapshot.set_topic("tidal clocks");
    let request = orchestrator
        .build(StageIdentifier::StoryPlanner, &snapshot, &[], "Plan it.")
        .unwrap();

    assert_eq!(request.system_prompt(), "Plan a book about tidal clocks.");
    assert_eq!(*request.params().temperature(), 0.3);
    assert_eq!(*request.params().seed(), Some(42));
}

#[test]
fn override_with_unknown_slot_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[prompts]\nwriter = \"Write as {{author}}.\"\n");

    let config = OpentaleConfig::from_file(&path).unwrap();
    assert!(config.orchestrator().is_err());
}

#[test]
fn studio_settings_follow_project_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "[project]\nchapter_count = 24\ncharacter_count = 5\n\n[generation]\noutline_temperature = 0.5\n",
    );

    let settings = OpentaleConfig::from_file(&path)
        .unwrap()
        .studio_settings()
        .unwrap();
    assert_eq!(*settings.chapter_count(), 24);
    assert_eq!(*settings.character_count(), 5);
    assert_eq!(*settings.outline_temperature(), 0.5);
}

#[tokio::test]
async fn output_dir_holds_reopenable_projects() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("books");
    let path = write_config(
        &dir,
        &format!("[project]\noutput_dir = {:?}\n", output.display().to_string()),
    );
    let config = OpentaleConfig::from_file(&path).unwrap();

    let backend = Arc::new(FileSystemArtifactStore::new(&config.project.output_dir).unwrap());
    let store = ContextStore::open("harbor", backend.clone()).await.unwrap();
    store.write_world("WORLD_ELEMENTS:\n\nFog.").await.unwrap();
    store
        .write_outline("Chapter 1: Fog\nChapter 2: Lamp", 2)
        .await
        .unwrap();

    let reopened = ContextStore::open("harbor", backend).await.unwrap();
    let snapshot = reopened.snapshot().await;
    assert_eq!(snapshot.world_theme(), "WORLD_ELEMENTS:\n\nFog.");
    assert_eq!(snapshot.outline().parsed().len(), 2);
    assert!(output.join("harbor").join("chapters.json").exists());
}
