use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a persistent entity kind (e.g. `Order`, `Customer`).
///
/// Entity types are created once, when the entity catalog is registered, and
/// are immutable afterwards. They carry no behavior: they serve as nodes in
/// the relationship graph and as elements of query entity sets and write sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EntityType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Kind of mutation applied to an entity within a unit of work.
///
/// All three kinds mark the entity type as dirty in exactly the same way; the
/// variant survives into log lines so a host engine can tell an insert-heavy
/// unit of work from a delete-heavy one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Create => f.write_str("CREATE"),
            ChangeType::Update => f.write_str("UPDATE"),
            ChangeType::Delete => f.write_str("DELETE"),
        }
    }
}

/// Where a read should be executed.
///
/// `Primary` is always safe; `Replica` is returned only when the router has
/// positively established that replication lag cannot surface a write made by
/// the current unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutingDecision {
    Primary,
    Replica,
}

impl RoutingDecision {
    pub fn is_primary(&self) -> bool {
        matches!(self, RoutingDecision::Primary)
    }

    pub fn is_replica(&self) -> bool {
        matches!(self, RoutingDecision::Replica)
    }
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingDecision::Primary => f.write_str("PRIMARY"),
            RoutingDecision::Replica => f.write_str("REPLICA"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_identity() {
        let order = EntityType::new("Order");
        let order2 = EntityType::from("Order");
        let customer = EntityType::new("Customer");

        assert_eq!(order, order2);
        assert_ne!(order, customer);
        assert_eq!(order.name(), "Order");
        assert_eq!(order.to_string(), "Order");
    }

    #[test]
    fn test_entity_type_is_case_sensitive() {
        // Catalog lookups normalize case; the type itself does not.
        assert_ne!(EntityType::new("Order"), EntityType::new("ORDER"));
    }

    #[test]
    fn test_routing_decision_helpers() {
        assert!(RoutingDecision::Primary.is_primary());
        assert!(!RoutingDecision::Primary.is_replica());
        assert!(RoutingDecision::Replica.is_replica());
        assert_eq!(RoutingDecision::Primary.to_string(), "PRIMARY");
        assert_eq!(RoutingDecision::Replica.to_string(), "REPLICA");
    }

    #[test]
    fn test_change_type_display() {
        assert_eq!(ChangeType::Create.to_string(), "CREATE");
        assert_eq!(ChangeType::Update.to_string(), "UPDATE");
        assert_eq!(ChangeType::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_entity_type_serde_is_transparent() {
        let order = EntityType::new("Order");
        let json = serde_json::to_string(&order).unwrap();
        assert_eq!(json, "\"Order\"");

        let back: EntityType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, order);
    }
}
