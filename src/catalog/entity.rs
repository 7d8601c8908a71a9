use crate::core::EntityType;
use serde::{Deserialize, Serialize};

/// Declared cardinality of an association between two entity types.
///
/// The kind has no routing significance on its own: any association, in any
/// direction, couples the two types for staleness purposes. It is kept so a
/// hand-maintained schema table can mirror its mapping layer one to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssociationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

/// One declared association from an owning entity to a target entity type.
///
/// `target` is the concrete target when the mapping declares one. Mappings
/// that declare a generic/placeholder target instead carry an `element_type`
/// (the collection's element declaration); `resolved_target` prefers the
/// concrete target and falls back to the element type. When neither is
/// present the association contributes no edge to the relationship graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub kind: AssociationKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<EntityType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<EntityType>,
}

impl Association {
    pub fn new(kind: AssociationKind, target: impl Into<EntityType>) -> Self {
        Self {
            kind,
            target: Some(target.into()),
            element_type: None,
        }
    }

    /// An association whose mapping declared no concrete target
    pub fn unresolved(kind: AssociationKind) -> Self {
        Self {
            kind,
            target: None,
            element_type: None,
        }
    }

    pub fn one_to_one(target: impl Into<EntityType>) -> Self {
        Self::new(AssociationKind::OneToOne, target)
    }

    pub fn one_to_many(target: impl Into<EntityType>) -> Self {
        Self::new(AssociationKind::OneToMany, target)
    }

    pub fn many_to_one(target: impl Into<EntityType>) -> Self {
        Self::new(AssociationKind::ManyToOne, target)
    }

    pub fn many_to_many(target: impl Into<EntityType>) -> Self {
        Self::new(AssociationKind::ManyToMany, target)
    }

    /// Set the secondary element-type declaration
    pub fn element_type(mut self, element: impl Into<EntityType>) -> Self {
        self.element_type = Some(element.into());
        self
    }

    /// The concrete target this association couples to, if determinable
    pub fn resolved_target(&self) -> Option<&EntityType> {
        self.target.as_ref().or(self.element_type.as_ref())
    }
}

/// Declarative description of one persistent entity type.
///
/// Holds what a mapping layer would otherwise expose through annotation
/// scanning: the entity name, the relation its queries read from, and every
/// association-bearing member's target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    name: EntityType,

    /// Relation (table) name the entity's queries reference. Defaults to the
    /// entity name; comparison is case-insensitive either way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    relation: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    associations: Vec<Association>,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<EntityType>) -> Self {
        Self {
            name: name.into(),
            relation: None,
            associations: Vec::new(),
        }
    }

    /// Set the relation (table) name
    pub fn relation(mut self, relation: &str) -> Self {
        self.relation = Some(relation.to_string());
        self
    }

    /// Add a declared association
    pub fn association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    pub fn one_to_one(self, target: impl Into<EntityType>) -> Self {
        self.association(Association::one_to_one(target))
    }

    pub fn one_to_many(self, target: impl Into<EntityType>) -> Self {
        self.association(Association::one_to_many(target))
    }

    pub fn many_to_one(self, target: impl Into<EntityType>) -> Self {
        self.association(Association::many_to_one(target))
    }

    pub fn many_to_many(self, target: impl Into<EntityType>) -> Self {
        self.association(Association::many_to_many(target))
    }

    pub fn name(&self) -> &EntityType {
        &self.name
    }

    pub fn relation_name(&self) -> &str {
        self.relation.as_deref().unwrap_or_else(|| self.name.name())
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }
}
