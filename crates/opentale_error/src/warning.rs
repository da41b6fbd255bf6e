//! Non-fatal degraded-output reports.

/// The outline parser found no chapter headers and synthesized stubs.
///
/// # Examples
///
/// ```
/// use opentale_error::ParseFallbackWarning;
///
/// let warning = ParseFallbackWarning::new(10);
/// assert!(format!("{}", warning).contains("10"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display(
    "No chapter headers found in outline; generated {} placeholder chapters",
    declared_chapter_count
)]
pub struct ParseFallbackWarning {
    /// Number of stub records that were generated
    pub declared_chapter_count: u32,
}

impl ParseFallbackWarning {
    /// Create a warning for a fallback that produced `declared_chapter_count` stubs.
    pub fn new(declared_chapter_count: u32) -> Self {
        Self {
            declared_chapter_count,
        }
    }
}
