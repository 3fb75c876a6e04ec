//! Analysis prompt metadata.
//!
//! Prompts ("analysis strategies") are a static catalog loaded from storage;
//! only their metadata matters to the core. The prompt text itself is an
//! external concern of the analysis backend.

use serde::{Deserialize, Serialize};

/// Metadata for one analysis prompt.
///
/// # Examples
///
/// ```
/// use ds_core::Prompt;
///
/// let prompt = Prompt {
///     id: "compare".to_owned(),
///     title: "Compare documents".to_owned(),
///     description: "Cross-document comparison".to_owned(),
///     category: Some("multi".to_owned()),
///     multi_document: true,
/// };
///
/// // Multi-document prompts need at least two selected items.
/// assert!(!prompt.available_for(1));
/// assert!(prompt.available_for(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Stable prompt identifier; doubles as the task strategy key.
    pub id: String,

    /// Short display title.
    pub title: String,

    /// Longer description of what the analysis produces.
    pub description: String,

    /// Optional display category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Whether this prompt operates across several documents at once.
    #[serde(default)]
    pub multi_document: bool,
}

impl Prompt {
    /// Returns `true` if this prompt can be offered for a selection of the
    /// given size.
    ///
    /// Multi-document prompts are only offered when two or more items are
    /// selected; single-document prompts are always available for a
    /// non-empty selection.
    #[inline]
    #[must_use]
    pub const fn available_for(&self, selection_count: usize) -> bool {
        if self.multi_document {
            selection_count >= 2
        } else {
            selection_count >= 1
        }
    }
}
