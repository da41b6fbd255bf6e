//! Whitespace normalization applied before text is persisted.

use opentale_core::ArtifactSlot;
use regex::Regex;
use std::sync::LazyLock;

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("Invalid regex pattern"));
static PARAGRAPH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("Invalid regex pattern"));

/// How newline runs are collapsed for a given artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum NewlinePolicy {
    /// Narrative text: runs of 2+ newlines become one
    #[display("single")]
    Single,
    /// Reference documents: runs of 3+ newlines become exactly two
    #[display("paragraph")]
    Paragraph,
    /// Conversation replies: stored exactly as received
    #[display("verbatim")]
    Verbatim,
}

impl NewlinePolicy {
    /// Policy for the slot a finalize writes into.
    pub fn for_slot(slot: ArtifactSlot) -> Self {
        match slot {
            ArtifactSlot::Chapter(_) => Self::Single,
            ArtifactSlot::World | ArtifactSlot::Characters | ArtifactSlot::Outline => {
                Self::Paragraph
            }
            ArtifactSlot::Chat(_) => Self::Verbatim,
        }
    }

    /// Apply the policy: normalize line endings, collapse runs, trim.
    ///
    /// # Examples
    ///
    /// ```
    /// use opentale_pipeline::NewlinePolicy;
    ///
    /// assert_eq!(NewlinePolicy::Single.apply("  a\n\n\nb  "), "a\nb");
    /// assert_eq!(NewlinePolicy::Paragraph.apply("a\n\n\n\nb"), "a\n\nb");
    /// assert_eq!(NewlinePolicy::Verbatim.apply(" a\n\n\nb "), " a\n\n\nb ");
    /// ```
    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::Verbatim => text.to_string(),
            Self::Single => collapse(&BLANK_RUN, text, "\n"),
            Self::Paragraph => collapse(&PARAGRAPH_RUN, text, "\n\n"),
        }
    }
}

fn collapse(pattern: &Regex, text: &str, replacement: &str) -> String {
    let unix = text.replace("\r\n", "\n");
    pattern.replace_all(&unix, replacement).trim().to_string()
}

/// Normalize a human-edited document before it replaces a slot.
///
/// Line endings become LF, runs of blank lines shrink to one paragraph
/// break, and surrounding whitespace is removed.
pub fn normalize_manual_edit(text: &str) -> String {
    collapse(&BLANK_RUN, text, "\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentale_core::StageIdentifier;

    #[test]
    fn chapters_use_single_newlines() {
        assert_eq!(
            NewlinePolicy::for_slot(ArtifactSlot::Chapter(4)),
            NewlinePolicy::Single
        );
        assert_eq!(
            NewlinePolicy::Single.apply("\n\nThe tide rose.\n\n\nShe ran.\n"),
            "The tide rose.\nShe ran."
        );
    }

    #[test]
    fn documents_keep_paragraph_breaks() {
        assert_eq!(
            NewlinePolicy::for_slot(ArtifactSlot::World),
            NewlinePolicy::Paragraph
        );
        assert_eq!(
            NewlinePolicy::Paragraph.apply("WORLD_ELEMENTS:\n\nHarbor:\n\n\n\n- Fog\n"),
            "WORLD_ELEMENTS:\n\nHarbor:\n\n- Fog"
        );
    }

    #[test]
    fn chat_replies_are_untouched() {
        let reply = "  Tell me more.\n\n\n";
        assert_eq!(
            NewlinePolicy::for_slot(ArtifactSlot::Chat(StageIdentifier::WorldBuilderChat))
                .apply(reply),
            reply
        );
    }

    #[test]
    fn carriage_returns_are_removed() {
        assert_eq!(NewlinePolicy::Single.apply("a\r\n\r\nb"), "a\nb");
    }

    #[test]
    fn manual_edit_collapses_blank_lines_to_one_paragraph_break() {
        assert_eq!(
            normalize_manual_edit("\r\nChapter 1: A\r\n\r\n\r\nbody\n\n\n\n"),
            "Chapter 1: A\n\nbody"
        );
    }
}
