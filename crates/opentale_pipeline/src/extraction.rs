//! Stage-specific extraction of the usable part of a model response.
//!
//! The rules live in one table, [`rule_for`], and are interpreted by a single
//! function, [`extract`]. Extraction never fails: when an expected marker is
//! missing, the rule's fallback applies and the response is returned whole.

use opentale_core::StageIdentifier;
use tracing::{debug, warn};

/// Headers that indicate a world document written without the main marker.
const WORLD_ALTERNATES: &[&str] = &["Time Period", "Setting:", "Locations:", "Major Locations"];

/// Headers that indicate character profiles written without the main marker.
const CHARACTER_ALTERNATES: &[&str] = &["Character 1:", "Main Character:", "Protagonist:"];

/// How to pull the usable text out of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionRule {
    /// Return the response unchanged
    Verbatim,
    /// Text from `start` through the end of `end`, both markers included
    Between {
        /// Opening marker
        start: &'static str,
        /// Closing marker, searched after the opening one
        end: &'static str,
    },
    /// Trimmed text between the first `marker` and the next one (or the end)
    After {
        /// Marker preceding the wanted text
        marker: &'static str,
    },
    /// Trimmed text from `start` to the end of the response
    Section {
        /// Section header
        start: &'static str,
        /// Headers that signal a usable response without `start`
        alternates: &'static [&'static str],
    },
}

/// The extraction rule for a stage.
pub fn rule_for(stage: StageIdentifier) -> ExtractionRule {
    match stage {
        StageIdentifier::OutlineCreator => ExtractionRule::Between {
            start: "OUTLINE:",
            end: "END OF OUTLINE",
        },
        StageIdentifier::Writer => ExtractionRule::After {
            marker: "SCENE FINAL:",
        },
        StageIdentifier::Editor => ExtractionRule::After {
            marker: "EDITED_SCENE:",
        },
        StageIdentifier::WorldBuilder => ExtractionRule::Section {
            start: "WORLD_ELEMENTS:",
            alternates: WORLD_ALTERNATES,
        },
        StageIdentifier::CharacterGenerator => ExtractionRule::Section {
            start: "CHARACTER_PROFILES:",
            alternates: CHARACTER_ALTERNATES,
        },
        StageIdentifier::StoryPlanner => ExtractionRule::Section {
            start: "STORY_ARC:",
            alternates: &[],
        },
        StageIdentifier::MemoryKeeper
        | StageIdentifier::WorldBuilderChat
        | StageIdentifier::OutlineCreatorChat => ExtractionRule::Verbatim,
    }
}

/// Apply the extraction rule of `stage` to a raw response.
///
/// # Examples
///
/// ```
/// use opentale_core::StageIdentifier;
/// use opentale_pipeline::extract;
///
/// assert_eq!(
///     extract(StageIdentifier::Writer, "draft text SCENE FINAL: final text here"),
///     "final text here"
/// );
/// ```
pub fn extract(stage: StageIdentifier, raw: &str) -> String {
    let extracted = rule_for(stage).apply(raw);
    debug!(
        stage = %stage,
        raw_len = raw.len(),
        extracted_len = extracted.len(),
        "Extracted response"
    );
    extracted
}

impl ExtractionRule {
    /// Interpret this rule against a raw response.
    pub fn apply(&self, raw: &str) -> String {
        match *self {
            Self::Verbatim => raw.to_string(),
            Self::Between { start, end } => {
                let Some(from) = raw.find(start) else {
                    warn!(marker = start, "Start marker missing; keeping full response");
                    return raw.to_string();
                };
                match raw[from..].find(end) {
                    Some(offset) => raw[from..from + offset + end.len()].to_string(),
                    None => {
                        warn!(marker = end, "End marker missing; keeping full response");
                        raw.to_string()
                    }
                }
            }
            Self::After { marker } => match raw.split(marker).nth(1) {
                Some(segment) => segment.trim().to_string(),
                None => raw.to_string(),
            },
            Self::Section { start, alternates } => {
                if let Some(from) = raw.find(start) {
                    return raw[from..].trim().to_string();
                }
                match alternates.iter().find(|header| raw.contains(*header)) {
                    Some(header) => {
                        debug!(marker = start, alternate = header, "Using alternate section header")
                    }
                    None => warn!(marker = start, "Section marker missing; keeping full response"),
                }
                raw.to_string()
            }
        }
    }
}
