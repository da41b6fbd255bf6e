//! Chapter records.

use serde::{Deserialize, Serialize};

/// One planned and possibly generated chapter.
///
/// Serialized as `{chapter_number, title, prompt}`; `content` is only
/// present once the chapter has been written.
///
/// # Examples
///
/// ```
/// use opentale_core::ChapterRecord;
///
/// let record = ChapterRecord::new(1, "The Beginning", "- Key Events:\n  * A");
/// let json = serde_json::to_value(&record).unwrap();
/// assert_eq!(json["chapter_number"], 1);
/// assert!(json.get("content").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters)]
pub struct ChapterRecord {
    /// Chapter number, unique within a project
    #[serde(rename = "chapter_number")]
    number: u32,
    /// Chapter title
    title: String,
    /// Outline body used to prompt the writer
    prompt: String,
    /// Generated chapter text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl ChapterRecord {
    /// Create a record with no content yet.
    pub fn new(number: u32, title: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            prompt: prompt.into(),
            content: None,
        }
    }

    /// Replace the generated text.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }

    /// Return the record with `content` set.
    pub fn with_content(mut self, content: Option<String>) -> Self {
        self.content = content;
        self
    }

    /// The record without its generated text, as stored in `chapters.json`.
    pub fn plan(&self) -> Self {
        Self {
            content: None,
            ..self.clone()
        }
    }
}
