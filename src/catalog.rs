//! The list of runnable models and which one is selected.

use crate::data::ModelMetadata;
use crate::error::CatalogError;
use crate::gateway::ModelGateway;
use tracing::{info, warn};
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    models: Vec<ModelMetadata>,
}

impl Catalog {
    /// Builds a catalog. An empty list is reported as `NotFound`.
    pub fn new(models: Vec<ModelMetadata>) -> Result<Self, CatalogError> {
        if models.is_empty() {
            return Err(CatalogError::NotFound);
        }
        Ok(Self { models })
    }

    /// Fetches the catalog from the gateway. Any failure reads as "no models".
    pub async fn fetch(gateway: &dyn ModelGateway) -> Result<Self, CatalogError> {
        match gateway.list_models().await {
            Ok(models) => {
                info!(count = models.len(), "loaded model catalog");
                Self::new(models)
            }
            Err(e) => {
                warn!(error = %e, "failed to load model catalog");
                Err(CatalogError::NotFound)
            }
        }
    }

    /// Loads a catalog saved as a JSON array of model metadata.
    pub fn from_file(path: &str) -> Result<Self, CatalogError> {
        Self::new(ModelMetadata::list_from_file(path)?)
    }

    pub fn models(&self) -> &[ModelMetadata] {
        &self.models
    }

    pub fn find(&self, slug: &str) -> Option<&ModelMetadata> {
        self.models.iter().find(|m| m.slug == slug)
    }

    /// Models whose name or description contains the query, ignoring case
    /// and surrounding whitespace.
    pub fn search(&self, query: &str) -> Vec<&ModelMetadata> {
        self.models.iter().filter(|m| m.matches(query)).collect()
    }
}

/// The selected model, as carried in the page's `slug` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub slug: Option<String>,
}

impl Selection {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: Some(slug.into()),
        }
    }

    /// Reads the `slug` parameter from a query string (with or without `?`).
    pub fn from_query(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        let slug = form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == "slug")
            .map(|(_, value)| value.into_owned())
            .filter(|slug| !slug.is_empty());
        Self { slug }
    }

    /// `/?slug=...` for a selection, `/` for none.
    pub fn to_query(&self) -> String {
        match &self.slug {
            Some(slug) => {
                let query: String = form_urlencoded::Serializer::new(String::new())
                    .append_pair("slug", slug)
                    .finish();
                format!("/?{}", query)
            }
            None => "/".to_string(),
        }
    }

    /// The selected model. A slug matching nothing selects nothing.
    pub fn resolve<'c>(&self, catalog: &'c Catalog) -> Option<&'c ModelMetadata> {
        catalog.find(self.slug.as_deref()?)
    }
}
