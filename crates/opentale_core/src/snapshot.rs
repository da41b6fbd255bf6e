//! Project state snapshots.

use crate::{ChapterRecord, ChatMessage, OutlineDocument, StageIdentifier};
use opentale_error::{MissingPrerequisiteError, NotFoundError, NotFoundKind, Prerequisite};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the pipeline knows about one project.
///
/// Stages receive an owned copy; mutation goes through the slot setters,
/// each of which touches exactly one slot.
///
/// # Examples
///
/// ```
/// use opentale_core::{ContextSnapshot, StageIdentifier};
///
/// let mut snapshot = ContextSnapshot::default();
/// assert!(snapshot.check_prerequisites(StageIdentifier::CharacterGenerator).is_err());
///
/// snapshot.set_world_theme("WORLD_ELEMENTS:\n\nA drowned archipelago.");
/// assert!(snapshot.check_prerequisites(StageIdentifier::CharacterGenerator).is_ok());
/// ```
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
)]
pub struct ContextSnapshot {
    /// Book topic supplied by the author
    topic: String,
    /// Declared number of chapters
    chapter_count: u32,
    /// World setting document
    world_theme: String,
    /// Character profiles
    characters: String,
    /// Raw and parsed outline
    outline: OutlineDocument,
    /// Chapter records keyed by number
    chapters: BTreeMap<u32, ChapterRecord>,
    /// Conversation per chat-capable stage
    chat_histories: BTreeMap<StageIdentifier, Vec<ChatMessage>>,
}

impl ContextSnapshot {
    /// Whether a world setting has been stored.
    pub fn has_world_theme(&self) -> bool {
        !self.world_theme.trim().is_empty()
    }

    /// Whether character profiles have been stored.
    pub fn has_characters(&self) -> bool {
        !self.characters.trim().is_empty()
    }

    /// Whether the outline yielded at least one chapter record.
    pub fn has_outline(&self) -> bool {
        !self.chapters.is_empty()
    }

    /// Fails with the first missing dependency of `stage`.
    pub fn check_prerequisites(
        &self,
        stage: StageIdentifier,
    ) -> Result<(), MissingPrerequisiteError> {
        for prerequisite in stage.prerequisites() {
            let present = match prerequisite {
                Prerequisite::WorldTheme => self.has_world_theme(),
                Prerequisite::Characters => self.has_characters(),
                Prerequisite::Outline => self.has_outline(),
                Prerequisite::ChapterContent(n) => self
                    .chapters
                    .get(n)
                    .is_some_and(|record| record.content().is_some()),
            };
            if !present {
                return Err(MissingPrerequisiteError::new(
                    stage.as_str(),
                    *prerequisite,
                ));
            }
        }
        Ok(())
    }

    /// The record for chapter `number`.
    pub fn chapter(&self, number: u32) -> Result<&ChapterRecord, NotFoundError> {
        self.chapters
            .get(&number)
            .ok_or_else(|| NotFoundError::new(NotFoundKind::Chapter(number)))
    }

    /// Conversation so far for a chat-capable stage.
    pub fn history(&self, stage: StageIdentifier) -> &[ChatMessage] {
        self.chat_histories
            .get(&stage)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Set the book topic.
    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
    }

    /// Set the declared chapter count.
    pub fn set_chapter_count(&mut self, chapter_count: u32) {
        self.chapter_count = chapter_count;
    }

    /// Write the world slot.
    pub fn set_world_theme(&mut self, world_theme: impl Into<String>) {
        self.world_theme = world_theme.into();
    }

    /// Write the characters slot.
    pub fn set_characters(&mut self, characters: impl Into<String>) {
        self.characters = characters.into();
    }

    /// Write the outline slot and rebuild the chapter map from its records.
    ///
    /// Content already generated for a chapter number that survives the
    /// new outline is kept.
    pub fn set_outline(&mut self, outline: OutlineDocument) {
        let mut chapters = BTreeMap::new();
        for record in outline.parsed() {
            let number = *record.number();
            let content = self
                .chapters
                .get(&number)
                .and_then(|existing| existing.content().clone());
            chapters.insert(number, record.plan().with_content(content));
        }
        self.chapters = chapters;
        self.outline = outline;
    }

    /// Write the content of chapter `number`.
    pub fn set_chapter_content(
        &mut self,
        number: u32,
        content: impl Into<String>,
    ) -> Result<(), NotFoundError> {
        let record = self
            .chapters
            .get_mut(&number)
            .ok_or_else(|| NotFoundError::new(NotFoundKind::Chapter(number)))?;
        record.set_content(content);
        Ok(())
    }

    /// Replace the conversation of a chat-capable stage.
    pub fn set_history(&mut self, stage: StageIdentifier, history: Vec<ChatMessage>) {
        self.chat_histories.insert(stage, history);
    }

    /// Append one completed exchange to a stage's conversation.
    pub fn push_chat_turn(
        &mut self,
        stage: StageIdentifier,
        user_turn: impl Into<String>,
        reply: impl Into<String>,
    ) {
        let history = self.chat_histories.entry(stage).or_default();
        history.push(ChatMessage::user(user_turn));
        history.push(ChatMessage::assistant(reply));
    }
}
