use crate::core::{Result, RouterError};
use std::collections::HashMap;
use std::sync::Arc;

/// Catalog of named queries: a stable name mapped to its SQL text.
///
/// Callers that execute by name never ship the query text at call time, so
/// the router needs this catalog to find the text behind a name. Like
/// [`EntityCatalog`](crate::catalog::EntityCatalog) it is built once during
/// startup and copy-on-write, cheap to clone and safe to share.
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    queries: Arc<HashMap<String, String>>,
}

impl QueryCatalog {
    pub fn new() -> Self {
        Self {
            queries: Arc::new(HashMap::new()),
        }
    }

    /// Register a named query - returns a NEW catalog, the old one unchanged
    pub fn with_query(self, name: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if self.queries.contains_key(&name) {
            return Err(RouterError::DuplicateQuery(name));
        }

        let mut new_queries = (*self.queries).clone();
        new_queries.insert(name, text.into());

        Ok(Self {
            queries: Arc::new(new_queries),
        })
    }

    /// Load a catalog from a JSON object of `{ "name": "sql text" }` pairs.
    pub fn from_json(json: &str) -> Result<Self> {
        let queries: HashMap<String, String> =
            serde_json::from_str(json).map_err(|e| RouterError::ParseError(e.to_string()))?;

        queries
            .into_iter()
            .try_fold(Self::new(), |catalog, (name, text)| {
                catalog.with_query(name, text)
            })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.queries.get(name).map(|text| text.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.queries
            .iter()
            .map(|(name, text)| (name.as_str(), text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self::new()
    }
}
