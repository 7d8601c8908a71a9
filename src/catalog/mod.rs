pub mod entity;
pub mod queries;

pub use entity::{Association, AssociationKind, EntityDescriptor};
pub use queries::QueryCatalog;

use crate::core::{EntityType, Result, RouterError};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of every persistent entity type and its declared associations.
///
/// Built once during startup registration and immutable afterwards; clones
/// are cheap (`Arc` snapshots, copy-on-write on registration) so the catalog
/// can be shared with the analyzer and the graph builder without locking.
#[derive(Debug, Clone)]
pub struct EntityCatalog {
    descriptors: Arc<HashMap<EntityType, EntityDescriptor>>,
    /// Lowercased relation name -> entity type, for query analysis
    by_relation: Arc<HashMap<String, EntityType>>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self {
            descriptors: Arc::new(HashMap::new()),
            by_relation: Arc::new(HashMap::new()),
        }
    }

    /// Register an entity - returns a NEW catalog, the old one is unchanged.
    ///
    /// Fails on a duplicate entity name or a relation name already claimed by
    /// another entity (relation names are compared case-insensitively).
    pub fn with_entity(self, descriptor: EntityDescriptor) -> Result<Self> {
        let name = descriptor.name().clone();
        let relation_key = descriptor.relation_name().to_lowercase();

        if self.descriptors.contains_key(&name) {
            return Err(RouterError::DuplicateEntity(name.name().to_string()));
        }

        if let Some(owner) = self.by_relation.get(&relation_key) {
            return Err(RouterError::DuplicateRelation(
                descriptor.relation_name().to_string(),
                owner.name().to_string(),
            ));
        }

        // Copy-on-write: clone the maps, add the entity
        let mut new_descriptors = (*self.descriptors).clone();
        let mut new_by_relation = (*self.by_relation).clone();
        new_by_relation.insert(relation_key, name.clone());
        new_descriptors.insert(name, descriptor);

        Ok(Self {
            descriptors: Arc::new(new_descriptors),
            by_relation: Arc::new(new_by_relation),
        })
    }

    /// Load a catalog from a JSON array of entity descriptors.
    ///
    /// This is the "hand-maintained schema table" form:
    ///
    /// ```json
    /// [
    ///   { "name": "Order", "relation": "TORDER",
    ///     "associations": [ { "kind": "OneToMany", "target": "OrderLine" } ] },
    ///   { "name": "OrderLine", "relation": "TORDERLINE" }
    /// ]
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let descriptors: Vec<EntityDescriptor> =
            serde_json::from_str(json).map_err(|e| RouterError::ParseError(e.to_string()))?;

        descriptors
            .into_iter()
            .try_fold(Self::new(), |catalog, descriptor| {
                catalog.with_entity(descriptor)
            })
    }

    pub fn get(&self, entity: &EntityType) -> Option<&EntityDescriptor> {
        self.descriptors.get(entity)
    }

    pub fn contains(&self, entity: &EntityType) -> bool {
        self.descriptors.contains_key(entity)
    }

    /// Resolve a relation name as written in a query - case-insensitive
    pub fn resolve_relation(&self, relation: &str) -> Option<&EntityType> {
        self.by_relation.get(&relation.to_lowercase())
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.descriptors.values()
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.descriptors.keys()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for EntityCatalog {
    fn default() -> Self {
        Self::new()
    }
}
