//! Stage prompt templates.
//!
//! Every [`StageIdentifier`] maps to exactly one system prompt template.
//! Templates reference project state through `{{slot}}` placeholders:
//!
//! | slot | value |
//! |---|---|
//! | `{{world_theme}}` | world setting document |
//! | `{{characters}}` | character profiles |
//! | `{{chapter_count}}` | declared number of chapters |
//! | `{{outline_overview}}` | "Complete Book Outline:" listing of parsed chapters |
//! | `{{topic}}` | book topic |
//!
//! Rendering a template that names any other slot is a
//! [`ConfigurationError`](opentale_error::ConfigurationError).

mod templates;

use opentale_core::{ContextSnapshot, StageIdentifier};
use opentale_error::{ConfigurationError, ConfigurationErrorKind};
use regex::Regex;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, instrument};

static SLOT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("Invalid regex pattern"));

/// A placeholder a template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TemplateSlot {
    /// World setting document
    #[display("world_theme")]
    WorldTheme,
    /// Character profiles
    #[display("characters")]
    Characters,
    /// Declared chapter count
    #[display("chapter_count")]
    ChapterCount,
    /// Listing of parsed chapters
    #[display("outline_overview")]
    OutlineOverview,
    /// Book topic
    #[display("topic")]
    Topic,
}

impl TemplateSlot {
    fn value(&self, snapshot: &ContextSnapshot) -> String {
        match self {
            Self::WorldTheme => snapshot.world_theme().clone(),
            Self::Characters => snapshot.characters().clone(),
            Self::ChapterCount => snapshot.chapter_count().to_string(),
            Self::OutlineOverview => outline_overview(snapshot),
            Self::Topic => snapshot.topic().clone(),
        }
    }
}

impl FromStr for TemplateSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "world_theme" => Ok(Self::WorldTheme),
            "characters" => Ok(Self::Characters),
            "chapter_count" => Ok(Self::ChapterCount),
            "outline_overview" => Ok(Self::OutlineOverview),
            "topic" => Ok(Self::Topic),
            other => Err(other.to_string()),
        }
    }
}

/// Renders the parsed outline as context for later stages.
///
/// Empty when no chapter records exist.
pub fn outline_overview(snapshot: &ContextSnapshot) -> String {
    if snapshot.chapters().is_empty() {
        return String::new();
    }

    let mut parts = vec!["Complete Book Outline:".to_string()];
    for record in snapshot.chapters().values() {
        parts.push(format!("\nChapter {}: {}", record.number(), record.title()));
        parts.push(record.prompt().clone());
    }
    parts.join("\n")
}

/// Immutable mapping from stage to system prompt template.
///
/// # Examples
///
/// ```
/// use opentale_core::{ContextSnapshot, StageIdentifier};
/// use opentale_pipeline::PromptCatalog;
///
/// let catalog = PromptCatalog::default();
/// let mut snapshot = ContextSnapshot::default();
/// snapshot.set_chapter_count(12);
///
/// let prompt = catalog.render(StageIdentifier::OutlineCreator, &snapshot).unwrap();
/// assert!(prompt.contains("EXACTLY 12 chapters"));
/// assert!(prompt.contains("END OF OUTLINE"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PromptCatalog {
    overrides: HashMap<StageIdentifier, String>,
}

impl PromptCatalog {
    /// Catalog with the built-in templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog whose templates are replaced for the named stages.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if a key is not a stage identifier or
    /// a template references an unknown slot.
    #[instrument(skip(overrides), fields(count = overrides.len()))]
    pub fn with_overrides(
        overrides: &HashMap<String, String>,
    ) -> Result<Self, ConfigurationError> {
        let mut parsed = HashMap::new();
        for (name, template) in overrides {
            let stage: StageIdentifier = name.parse()?;
            validate(stage, template)?;
            debug!(stage = %stage, "Using prompt override");
            parsed.insert(stage, template.clone());
        }
        Ok(Self { overrides: parsed })
    }

    /// The unrendered template for `stage`.
    pub fn template(&self, stage: StageIdentifier) -> &str {
        self.overrides
            .get(&stage)
            .map(String::as_str)
            .unwrap_or_else(|| templates::builtin(stage))
    }

    /// Render the template for `stage` against a snapshot.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` for an unknown slot.
    pub fn render(
        &self,
        stage: StageIdentifier,
        snapshot: &ContextSnapshot,
    ) -> Result<String, ConfigurationError> {
        let template = self.template(stage);
        let mut rendered = String::with_capacity(template.len());
        let mut last = 0;

        for cap in SLOT_PATTERN.captures_iter(template) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let slot = parse_slot(stage, name.as_str())?;
            rendered.push_str(&template[last..whole.start()]);
            rendered.push_str(&slot.value(snapshot));
            last = whole.end();
        }
        rendered.push_str(&template[last..]);

        Ok(rendered)
    }

    /// Render a stage identified by name.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if `name` is not a stage identifier.
    pub fn render_named(
        &self,
        name: &str,
        snapshot: &ContextSnapshot,
    ) -> Result<String, ConfigurationError> {
        self.render(name.parse()?, snapshot)
    }
}

fn parse_slot(stage: StageIdentifier, name: &str) -> Result<TemplateSlot, ConfigurationError> {
    name.parse().map_err(|slot| {
        ConfigurationError::new(ConfigurationErrorKind::UnknownSlot {
            stage: stage.to_string(),
            slot,
        })
    })
}

fn validate(stage: StageIdentifier, template: &str) -> Result<(), ConfigurationError> {
    for cap in SLOT_PATTERN.captures_iter(template) {
        if let Some(name) = cap.get(1) {
            parse_slot(stage, name.as_str())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentale_core::{ChapterRecord, OutlineDocument};
    use strum::IntoEnumIterator;

    fn snapshot() -> ContextSnapshot {
        let mut snapshot = ContextSnapshot::default();
        snapshot.set_topic("lighthouse keepers");
        snapshot.set_chapter_count(3);
        snapshot.set_world_theme("WORLD_ELEMENTS:\n\nA storm coast.");
        snapshot.set_characters("CHARACTER_PROFILES:\n\nMara.");
        snapshot.set_outline(OutlineDocument::new(
            "OUTLINE:",
            vec![
                ChapterRecord::new(1, "Landfall", "- Key Events:\n  * Arrival"),
                ChapterRecord::new(2, "Wreck", "- Key Events:\n  * Storm"),
            ],
        ));
        snapshot
    }

    #[test]
    fn every_builtin_template_renders() {
        let catalog = PromptCatalog::new();
        let snapshot = snapshot();
        for stage in StageIdentifier::iter() {
            let rendered = catalog.render(stage, &snapshot).unwrap();
            assert!(!rendered.contains("{{"), "unrendered slot in {}", stage);
        }
    }

    #[test]
    fn templates_carry_format_markers() {
        let catalog = PromptCatalog::new();
        let snapshot = snapshot();
        let cases = [
            (StageIdentifier::WorldBuilder, "WORLD_ELEMENTS:"),
            (StageIdentifier::CharacterGenerator, "CHARACTER_PROFILES:"),
            (StageIdentifier::StoryPlanner, "STORY_ARC:"),
            (StageIdentifier::OutlineCreator, "END OF OUTLINE"),
            (StageIdentifier::Writer, "SCENE FINAL:"),
            (StageIdentifier::Editor, "EDITED_SCENE:"),
            (StageIdentifier::MemoryKeeper, "CONTINUITY ALERT:"),
        ];
        for (stage, marker) in cases {
            assert!(
                catalog.render(stage, &snapshot).unwrap().contains(marker),
                "{} template lacks {}",
                stage,
                marker
            );
        }
    }

    #[test]
    fn writer_sees_outline_overview() {
        let rendered = PromptCatalog::new()
            .render(StageIdentifier::Writer, &snapshot())
            .unwrap();
        assert!(rendered.contains("Complete Book Outline:"));
        assert!(rendered.contains("Chapter 2: Wreck"));
    }

    #[test]
    fn override_with_unknown_slot_is_rejected() {
        let overrides = HashMap::from([(
            "writer".to_string(),
            "Write in the style of {{author}}".to_string(),
        )]);
        let err = PromptCatalog::with_overrides(&overrides).unwrap_err();
        assert_eq!(
            err.kind,
            ConfigurationErrorKind::UnknownSlot {
                stage: "writer".to_string(),
                slot: "author".to_string()
            }
        );
    }

    #[test]
    fn override_for_unknown_stage_is_rejected() {
        let overrides = HashMap::from([("narrator".to_string(), "Narrate.".to_string())]);
        let err = PromptCatalog::with_overrides(&overrides).unwrap_err();
        assert_eq!(
            err.kind,
            ConfigurationErrorKind::UnknownStage("narrator".to_string())
        );
    }

    #[test]
    fn override_replaces_builtin() {
        let overrides = HashMap::from([(
            "story_planner".to_string(),
            "Plan a story about {{ topic }}.".to_string(),
        )]);
        let catalog = PromptCatalog::with_overrides(&overrides).unwrap();
        assert_eq!(
            catalog
                .render(StageIdentifier::StoryPlanner, &snapshot())
                .unwrap(),
            "Plan a story about lighthouse keepers."
        );
    }

    #[test]
    fn render_named_rejects_unknown_stage() {
        assert!(
            PromptCatalog::new()
                .render_named("illustrator", &snapshot())
                .is_err()
        );
    }
}
