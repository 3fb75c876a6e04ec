//! The analysis prompt catalog.
//!
//! Prompts are a static list loaded from a JSON file; the core only needs
//! their metadata to group tasks and to gate multi-document strategies in
//! the selection UI.

use std::fs;

use camino::Utf8Path;
use ds_core::Prompt;
use tracing::info;

use crate::error::QueueError;

/// The loaded prompt catalog.
///
/// # Examples
///
/// ```
/// use ds_queue::PromptCatalog;
/// use ds_core::Prompt;
///
/// let catalog = PromptCatalog::from_prompts(vec![
///     Prompt {
///         id: "summary".to_owned(),
///         title: "Summarize".to_owned(),
///         description: "One-page summary".to_owned(),
///         category: None,
///         multi_document: false,
///     },
///     Prompt {
///         id: "compare".to_owned(),
///         title: "Compare".to_owned(),
///         description: "Cross-document comparison".to_owned(),
///         category: None,
///         multi_document: true,
///     },
/// ]);
///
/// // A single selected file only sees single-document prompts.
/// let offered = catalog.selectable(1);
/// assert_eq!(offered.len(), 1);
/// assert_eq!(offered[0].id, "summary");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PromptCatalog {
    /// All known prompts, in catalog order.
    prompts: Vec<Prompt>,
}

impl PromptCatalog {
    /// Creates a catalog from an in-memory prompt list.
    #[must_use]
    pub fn from_prompts(prompts: Vec<Prompt>) -> Self {
        Self { prompts }
    }

    /// Loads the catalog from a JSON file.
    ///
    /// A missing file yields an empty catalog - prompt-less deployments
    /// can still track files, they just have nothing to dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Persist`] on I/O failure and
    /// [`QueueError::Parse`] when the file is not valid JSON.
    pub fn load(path: &Utf8Path) -> Result<Self, QueueError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path.as_std_path())
            .map_err(|e| QueueError::persist(path.to_owned(), e))?;
        let prompts: Vec<Prompt> = serde_json::from_str(&contents)?;

        info!(path = %path, count = prompts.len(), "Prompt catalog loaded");
        Ok(Self { prompts })
    }

    /// Returns all prompts in catalog order.
    #[must_use]
    pub fn list(&self) -> &[Prompt] {
        &self.prompts
    }

    /// Returns one prompt by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.id == id)
    }

    /// Returns the prompts that can be offered for a selection of the
    /// given size (multi-document prompts need two or more items).
    #[must_use]
    pub fn selectable(&self, selection_count: usize) -> Vec<&Prompt> {
        self.prompts
            .iter()
            .filter(|p| p.available_for(selection_count))
            .collect()
    }

    /// Returns the number of prompts in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Returns `true` if the catalog holds no prompts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn prompt(id: &str, multi: bool) -> Prompt {
        Prompt {
            id: id.to_owned(),
            title: id.to_owned(),
            description: String::new(),
            category: None,
            multi_document: multi,
        }
    }

    #[test]
    fn test_get_by_id() {
        let catalog = PromptCatalog::from_prompts(vec![prompt("summary", false)]);
        assert!(catalog.get("summary").is_some());
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_selectable_gates_multi_document() {
        let catalog =
            PromptCatalog::from_prompts(vec![prompt("summary", false), prompt("compare", true)]);

        assert_eq!(catalog.selectable(0).len(), 0);
        assert_eq!(catalog.selectable(1).len(), 1);
        assert_eq!(catalog.selectable(2).len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let catalog =
            PromptCatalog::load(Utf8Path::new("/nonexistent/prompts.json")).expect("load failed");
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = Utf8Path::from_path(dir.path())
            .expect("Invalid path")
            .join("prompts_list.json");

        let json = r#"[
            {"id": "summary", "title": "Summarize", "description": "One-page summary"},
            {"id": "compare", "title": "Compare", "description": "Comparison", "multi_document": true}
        ]"#;
        fs::write(path.as_std_path(), json).expect("write failed");

        let catalog = PromptCatalog::load(&path).expect("load failed");
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("compare").is_some_and(|p| p.multi_document));
    }
}
