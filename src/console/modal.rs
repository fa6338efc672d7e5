/// What a delete confirmation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteKind {
    Article,
    Category,
}

impl DeleteKind {
    pub fn label(self) -> &'static str {
        match self {
            DeleteKind::Article => "article",
            DeleteKind::Category => "category",
        }
    }
}

/// The single modal the admin console can show at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    CreateCategory,
    EditCategory { id: String, name: String },
    Delete {
        kind: DeleteKind,
        id: String,
        name: String,
    },
}

impl Modal {
    pub fn delete_article(id: impl Into<String>, title: impl Into<String>) -> Self {
        Modal::Delete {
            kind: DeleteKind::Article,
            id: id.into(),
            name: title.into(),
        }
    }

    pub fn delete_category(id: impl Into<String>, name: impl Into<String>) -> Self {
        Modal::Delete {
            kind: DeleteKind::Category,
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn title(&self) -> String {
        match self {
            Modal::CreateCategory => "Create Category".to_string(),
            Modal::EditCategory { .. } => "Edit Category".to_string(),
            Modal::Delete { kind, .. } => match kind {
                DeleteKind::Article => "Delete Article".to_string(),
                DeleteKind::Category => "Delete Category".to_string(),
            },
        }
    }

    /// Body text shown under the title.
    pub fn prompt(&self) -> String {
        match self {
            Modal::CreateCategory => "Name of the new category".to_string(),
            Modal::EditCategory { name, .. } => format!("Rename \"{name}\" to"),
            Modal::Delete { kind, name, .. } => format!(
                "Delete {} \"{name}\"? This cannot be undone.",
                kind.label()
            ),
        }
    }

    /// Whether submitting requires a text value (the category name).
    pub fn needs_input(&self) -> bool {
        matches!(self, Modal::CreateCategory | Modal::EditCategory { .. })
    }

    /// Pre-filled input for the text field.
    pub fn initial_input(&self) -> &str {
        match self {
            Modal::EditCategory { name, .. } => name,
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles_and_prompts() {
        assert_eq!(Modal::CreateCategory.title(), "Create Category");
        let delete = Modal::delete_article("a1", "Rust 2026");
        assert_eq!(delete.title(), "Delete Article");
        assert_eq!(
            delete.prompt(),
            "Delete article \"Rust 2026\"? This cannot be undone."
        );
        assert!(!delete.needs_input());
    }

    #[test]
    fn test_edit_prefills_current_name() {
        let edit = Modal::EditCategory {
            id: "c1".to_string(),
            name: "tech".to_string(),
        };
        assert!(edit.needs_input());
        assert_eq!(edit.initial_input(), "tech");
        assert_eq!(Modal::CreateCategory.initial_input(), "");
    }
}
