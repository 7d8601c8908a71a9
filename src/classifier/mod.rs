pub mod analyzer;
pub mod retriable;

pub use analyzer::{QueryAnalyzer, SqlQueryAnalyzer};
pub use retriable::is_retriable_shape;

use crate::catalog::QueryCatalog;
use crate::core::EntityType;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Everything the router needs to know about one query, learned once.
///
/// `retriable == false` means the query must always run on the primary; its
/// entity set is empty because nobody looks at it. Retriable descriptors
/// carry the full set of entity types the query reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    entity_types: HashSet<EntityType>,
    retriable: bool,
}

impl QueryDescriptor {
    fn retriable(entity_types: HashSet<EntityType>) -> Self {
        Self {
            entity_types,
            retriable: true,
        }
    }

    fn non_retriable() -> Self {
        Self {
            entity_types: HashSet::new(),
            retriable: false,
        }
    }

    pub fn entity_types(&self) -> &HashSet<EntityType> {
        &self.entity_types
    }

    pub fn is_retriable(&self) -> bool {
        self.retriable
    }
}

/// Permanently memoizing query classifier.
///
/// Each distinct query is analyzed at most once per process: the shape gate
/// and (when the gate passes) the SQL analysis run on first sight, and the
/// resulting descriptor is cached forever under the query's identifier
/// (named queries by name, ad-hoc queries by their literal text). Failed
/// classifications are remembered in their own set so a hopeless query never
/// hits the parser twice.
///
/// Infallible by construction: any failure, including a poisoned cache lock,
/// collapses into the shared non-retriable descriptor, which the router turns
/// into a primary read.
pub struct QueryClassifier {
    analyzer: Arc<dyn QueryAnalyzer>,
    descriptors: RwLock<HashMap<String, Arc<QueryDescriptor>>>,
    non_retriable: RwLock<HashSet<String>>,
    non_retriable_descriptor: Arc<QueryDescriptor>,
}

impl QueryClassifier {
    pub fn new(analyzer: Arc<dyn QueryAnalyzer>) -> Self {
        Self {
            analyzer,
            descriptors: RwLock::new(HashMap::new()),
            non_retriable: RwLock::new(HashSet::new()),
            non_retriable_descriptor: Arc::new(QueryDescriptor::non_retriable()),
        }
    }

    /// Classify a query, returning the cached descriptor when one exists.
    ///
    /// Lock discipline: lookups under a read lock, analysis under no lock at
    /// all, insertion under a write lock. Two tasks classifying the same new
    /// identifier may both do the work; the result is deterministic and the
    /// last writer wins.
    pub fn classify(&self, identifier: &str, text: &str) -> Arc<QueryDescriptor> {
        match self.non_retriable.read() {
            Ok(known) => {
                if known.contains(identifier) {
                    return Arc::clone(&self.non_retriable_descriptor);
                }
            }
            Err(_) => return Arc::clone(&self.non_retriable_descriptor),
        }

        match self.descriptors.read() {
            Ok(cache) => {
                if let Some(descriptor) = cache.get(identifier) {
                    return Arc::clone(descriptor);
                }
            }
            Err(_) => return Arc::clone(&self.non_retriable_descriptor),
        }

        // First sight of this identifier: classify outside any lock
        if !retriable::is_retriable_shape(text) {
            debug!(
                "Query '{}' is not a retriable shape; pinned to primary",
                identifier
            );
            return self.remember_non_retriable(identifier);
        }

        match self.analyzer.referenced_entities(text) {
            Ok(entity_types) => {
                let descriptor = Arc::new(QueryDescriptor::retriable(entity_types));
                if let Ok(mut cache) = self.descriptors.write() {
                    cache.insert(identifier.to_string(), Arc::clone(&descriptor));
                }
                descriptor
            }
            Err(e) => {
                warn!(
                    "Query '{}' could not be analyzed ({}); pinned to primary",
                    identifier, e
                );
                self.remember_non_retriable(identifier)
            }
        }
    }

    /// Classify every named query eagerly, the one-time startup scan
    pub fn prescan(&self, queries: &QueryCatalog) {
        let mut eligible = 0usize;
        for (name, text) in queries.iter() {
            if self.classify(name, text).is_retriable() {
                eligible += 1;
            }
        }
        info!(
            "Prescanned {} named queries, {} eligible for replica reads",
            queries.len(),
            eligible
        );
    }

    fn remember_non_retriable(&self, identifier: &str) -> Arc<QueryDescriptor> {
        if let Ok(mut known) = self.non_retriable.write() {
            known.insert(identifier.to_string());
        }
        Arc::clone(&self.non_retriable_descriptor)
    }
}
