use crate::error::CatalogError;
use crate::schema::{ObjectSchema, SchemaNode};
use serde::Deserialize;
use std::fs;

/// Everything the gateway publishes about one model.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    pub slug: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub developer: String,
    #[serde(default)]
    pub input: ObjectSchema,
    #[serde(default)]
    pub output: ObjectSchema,
    #[serde(default)]
    pub error: Option<SchemaNode>,
}

impl ModelMetadata {
    /// The display name, falling back to the slug.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.slug)
    }

    /// The heading shown above a model's form: name, slug and description.
    pub fn header(&self) -> String {
        let mut header = format!("{} ({})", self.label(), self.slug);
        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            header.push('\n');
            header.push_str(description);
        }
        header
    }

    /// Case-insensitive match of a trimmed search query against the label or
    /// description.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.label().to_lowercase().contains(&query)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&query))
    }

    /// Parses a JSON array of model metadata.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, CatalogError> {
        serde_json::from_str(json).map_err(|e| CatalogError::JsonParseError(e.to_string()))
    }

    /// Loads a JSON array of model metadata from a file.
    pub fn list_from_file(path: &str) -> Result<Vec<Self>, CatalogError> {
        let content = fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::list_from_json(&content)
    }
}
