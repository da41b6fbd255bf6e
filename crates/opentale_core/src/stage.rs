//! Pipeline stage identifiers.

use opentale_error::{ConfigurationError, ConfigurationErrorKind, Prerequisite};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::IntoEnumIterator;

/// One phase of the writing pipeline.
///
/// The set is closed: every stage has exactly one prompt template and one
/// extraction rule, and both are matched exhaustively.
///
/// # Examples
///
/// ```
/// use opentale_core::StageIdentifier;
///
/// let stage: StageIdentifier = "outline_creator".parse().unwrap();
/// assert_eq!(stage, StageIdentifier::OutlineCreator);
/// assert!("narrator".parse::<StageIdentifier>().is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum StageIdentifier {
    /// Builds the world setting document
    #[display("world_builder")]
    WorldBuilder,
    /// Conversational world exploration
    #[display("world_builder_chat")]
    WorldBuilderChat,
    /// Creates character profiles
    #[display("character_generator")]
    CharacterGenerator,
    /// Produces the chapter outline
    #[display("outline_creator")]
    OutlineCreator,
    /// Conversational outline refinement
    #[display("outline_creator_chat")]
    OutlineCreatorChat,
    /// Plans the overall story arc
    #[display("story_planner")]
    StoryPlanner,
    /// Drafts chapter prose
    #[display("writer")]
    Writer,
    /// Reviews and revises chapter prose
    #[display("editor")]
    Editor,
    /// Tracks continuity across chapters
    #[display("memory_keeper")]
    MemoryKeeper,
}

impl StageIdentifier {
    /// Wire name of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorldBuilder => "world_builder",
            Self::WorldBuilderChat => "world_builder_chat",
            Self::CharacterGenerator => "character_generator",
            Self::OutlineCreator => "outline_creator",
            Self::OutlineCreatorChat => "outline_creator_chat",
            Self::StoryPlanner => "story_planner",
            Self::Writer => "writer",
            Self::Editor => "editor",
            Self::MemoryKeeper => "memory_keeper",
        }
    }

    /// Whether replies from this stage are conversational and kept verbatim.
    pub fn is_chat(&self) -> bool {
        matches!(self, Self::WorldBuilderChat | Self::OutlineCreatorChat)
    }

    /// Slots that must be populated before this stage may run.
    ///
    /// # Examples
    ///
    /// ```
    /// use opentale_core::StageIdentifier;
    /// use opentale_error::Prerequisite;
    ///
    /// assert!(StageIdentifier::WorldBuilder.prerequisites().is_empty());
    /// assert_eq!(
    ///     StageIdentifier::CharacterGenerator.prerequisites(),
    ///     &[Prerequisite::WorldTheme]
    /// );
    /// ```
    pub fn prerequisites(&self) -> &'static [Prerequisite] {
        match self {
            Self::WorldBuilder | Self::WorldBuilderChat | Self::StoryPlanner => &[],
            Self::CharacterGenerator => &[Prerequisite::WorldTheme],
            Self::OutlineCreator | Self::OutlineCreatorChat => {
                &[Prerequisite::WorldTheme, Prerequisite::Characters]
            }
            Self::Writer | Self::Editor | Self::MemoryKeeper => &[Prerequisite::Outline],
        }
    }
}

impl FromStr for StageIdentifier {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::iter()
            .find(|stage| stage.as_str() == wanted)
            .ok_or_else(|| {
                ConfigurationError::new(ConfigurationErrorKind::UnknownStage(wanted.to_string()))
            })
    }
}
