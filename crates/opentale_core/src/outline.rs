//! Outline documents.

use crate::ChapterRecord;
use serde::{Deserialize, Serialize};

/// Raw outline text plus the chapter records parsed from it.
///
/// The raw text is the editable source of truth; `parsed` is derived and
/// can be regenerated from it at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct OutlineDocument {
    /// Outline as generated or edited
    raw_text: String,
    /// Ordered chapter records
    parsed: Vec<ChapterRecord>,
}

impl OutlineDocument {
    /// Create a document from raw text and its parsed records.
    pub fn new(raw_text: impl Into<String>, parsed: Vec<ChapterRecord>) -> Self {
        Self {
            raw_text: raw_text.into(),
            parsed,
        }
    }

    /// Whether no outline text has been stored.
    pub fn is_empty(&self) -> bool {
        self.raw_text.trim().is_empty()
    }

    /// The parsed record for `number`, if any.
    pub fn chapter(&self, number: u32) -> Option<&ChapterRecord> {
        self.parsed.iter().find(|record| *record.number() == number)
    }
}
