use crate::catalog::EntityCatalog;
use crate::core::EntityType;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

/// Directed one-hop association graph over entity types.
///
/// An edge `A -> B` means entity A declares an association whose target (or
/// element type) is B. Only declared, direct edges are stored: the graph is
/// not a transitive closure, so a chain A -> B -> C does not make A and C
/// structurally coupled. The routing check compensates by testing both
/// directions of each pair.
///
/// Built exactly once from the catalog at startup; read-only afterwards.
/// The default value is the empty graph.
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    edges: HashMap<EntityType, HashSet<EntityType>>,
}

impl RelationshipGraph {
    /// Build the graph from every declared association in the catalog.
    ///
    /// Never fails: an association whose target cannot be resolved at all is
    /// skipped with a warning (no edge, no structural coupling assumed), and a
    /// target that resolves to an entity missing from the catalog is still
    /// recorded since the extra edge can only route more reads to the primary.
    pub fn build(catalog: &EntityCatalog) -> Self {
        let mut edges: HashMap<EntityType, HashSet<EntityType>> = HashMap::new();
        let mut skipped = 0usize;

        for descriptor in catalog.descriptors() {
            let source = descriptor.name().clone();
            let targets = edges.entry(source.clone()).or_default();

            for association in descriptor.associations() {
                match association.resolved_target() {
                    Some(target) => {
                        if !catalog.contains(target) {
                            warn!(
                                "Association {} -> {} points at an unregistered entity; edge kept",
                                source, target
                            );
                        }
                        targets.insert(target.clone());
                    }
                    None => {
                        skipped += 1;
                        warn!(
                            "Association on {} ({:?}) has no resolvable target; edge skipped",
                            source, association.kind
                        );
                    }
                }
            }
        }

        let graph = Self { edges };
        info!(
            "Relationship graph built: {} entities, {} edges{}",
            graph.entity_count(),
            graph.edge_count(),
            if skipped > 0 {
                format!(", {} unresolvable associations skipped", skipped)
            } else {
                String::new()
            }
        );
        debug!("Relationship graph edges: {:?}", graph.edges);

        graph
    }

    /// Does `src` declare a direct association to `dst`?
    pub fn references(&self, src: &EntityType, dst: &EntityType) -> bool {
        self.edges
            .get(src)
            .map(|targets| targets.contains(dst))
            .unwrap_or(false)
    }

    /// Does any entity declare a direct association from `dst` to `src`?
    pub fn referenced_by(&self, src: &EntityType, dst: &EntityType) -> bool {
        self.references(dst, src)
    }

    /// Forward neighbors of an entity (empty for unknown entities)
    pub fn neighbors(&self, entity: &EntityType) -> impl Iterator<Item = &EntityType> {
        self.edges.get(entity).into_iter().flatten()
    }

    pub fn entity_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|targets| targets.len()).sum()
    }
}
