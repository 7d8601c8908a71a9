// ============================================================================
// ReplicaGuard Library
// ============================================================================
//
// Replica-safety query routing for a primary/replica SQL database pair.
// Given what the current unit of work has written and which entity types a
// query reads, the router decides per query whether a lagging read replica
// can serve it or the primary must. It may over-route to the primary; it
// never routes to the replica when staleness could be observable.
//
// ============================================================================

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod core;
pub mod graph;
pub mod router;
pub mod toggle;
pub mod writeset;

// Re-export main types for convenience
pub use core::{ChangeType, EntityType, Result, RouterError, RoutingDecision};
pub use router::{QueryRouter, QueryRouterBuilder};
pub use writeset::{UnitOfWork, UnitOfWorkId};

// Re-export configuration and schema API
pub use catalog::{Association, AssociationKind, EntityCatalog, EntityDescriptor, QueryCatalog};
pub use config::{EndpointConfig, RouterConfig};

// Re-export collaborator seams and their shipped implementations
pub use classifier::{QueryAnalyzer, QueryClassifier, QueryDescriptor, SqlQueryAnalyzer};
pub use graph::RelationshipGraph;
pub use toggle::{
    ConnectionProbe, NoopObjectCache, ObjectCacheControl, ReplicaToggle, StaticConnectionProbe,
    TcpConnectionProbe,
};
