// ============================================================================
// Query Router
// ============================================================================
//
// The decision engine that ties everything together. Per read query it
// answers one question: primary or replica? The answer is conservative by
// construction. Every failure mode (unknown query, parse trouble, missing
// unit of work) lands on the primary; only a query that is positively known
// to touch nothing the current unit of work has written may go to the
// replica.
//
// ============================================================================

use crate::catalog::{EntityCatalog, QueryCatalog};
use crate::classifier::{QueryAnalyzer, QueryClassifier, SqlQueryAnalyzer};
use crate::config::RouterConfig;
use crate::core::{EntityType, Result, RoutingDecision};
use crate::graph::RelationshipGraph;
use crate::toggle::{
    ConnectionProbe, NoopObjectCache, ObjectCacheControl, ReplicaToggle, TcpConnectionProbe,
};
use crate::writeset::UnitOfWork;
use log::{debug, info, trace, warn};
use std::sync::Arc;

/// Replica-safety router for a primary/replica database pair.
///
/// Construct one per process through [`QueryRouterBuilder`] and share it
/// freely; every routing entry point is `&self`, lock-free after the first
/// classification of each query, and infallible.
///
/// # Examples
///
/// ```
/// use replicaguard::{
///     ChangeType, EndpointConfig, EntityCatalog, EntityDescriptor, EntityType,
///     QueryRouter, RouterConfig, StaticConnectionProbe, UnitOfWork,
/// };
/// use std::sync::Arc;
///
/// # fn main() -> replicaguard::Result<()> {
/// # tokio_test::block_on(async {
/// let catalog = EntityCatalog::new()
///     .with_entity(
///         EntityDescriptor::new("Order")
///             .relation("TORDER")
///             .one_to_many("OrderLine"),
///     )?
///     .with_entity(EntityDescriptor::new("OrderLine").relation("TORDERLINE"))?;
///
/// let router = QueryRouter::builder(RouterConfig::with_replica(
///         EndpointConfig::from_url("postgres://primary.db:5432/shop")?,
///         EndpointConfig::from_url("postgres://replica.db:5432/shop")?,
///     ))
///     .entities(catalog)
///     .probe(Arc::new(StaticConnectionProbe))
///     .build()
///     .await?;
///
/// let mut uow = UnitOfWork::begin();
/// let q = "SELECT * FROM torder WHERE id = 1";
///
/// // Nothing written yet: the replica is safe
/// assert!(router.route_adhoc(q, Some(&uow)).is_replica());
///
/// // After a write to Order, the same query must see the primary
/// uow.record(ChangeType::Update, &EntityType::new("Order"));
/// assert!(router.route_adhoc(q, Some(&uow)).is_primary());
/// # Ok(())
/// # })
/// # }
/// ```
pub struct QueryRouter {
    enabled: bool,
    classifier: QueryClassifier,
    graph: RelationshipGraph,
    queries: QueryCatalog,
}

impl QueryRouter {
    pub fn builder(config: RouterConfig) -> QueryRouterBuilder {
        QueryRouterBuilder::new(config)
    }

    /// Was replica routing enabled at startup?
    pub fn replica_enabled(&self) -> bool {
        self.enabled
    }

    /// Route a registered named query.
    ///
    /// A name missing from the catalog is a caller bug, but not one worth
    /// failing a read over: it routes to the primary with a warning.
    pub fn route_named(&self, name: &str, uow: Option<&UnitOfWork>) -> RoutingDecision {
        if !self.enabled {
            debug!("{}: replica routing disabled; PRIMARY", name);
            return RoutingDecision::Primary;
        }

        let text = match self.queries.get(name) {
            Some(text) => text,
            None => {
                warn!("{}: not a registered named query; PRIMARY", name);
                return RoutingDecision::Primary;
            }
        };

        let descriptor = self.classifier.classify(name, text);
        if !descriptor.is_retriable() {
            debug!("{}: not retriable; PRIMARY", name);
            return RoutingDecision::Primary;
        }

        self.decide(name, descriptor.entity_types(), uow)
    }

    /// Route an ad-hoc query by its literal text (also the cache key).
    pub fn route_adhoc(&self, text: &str, uow: Option<&UnitOfWork>) -> RoutingDecision {
        if !self.enabled {
            debug!("ad-hoc query: replica routing disabled; PRIMARY");
            return RoutingDecision::Primary;
        }

        let descriptor = self.classifier.classify(text, text);
        if !descriptor.is_retriable() {
            debug!("{}: not retriable; PRIMARY", text);
            return RoutingDecision::Primary;
        }

        self.decide(text, descriptor.entity_types(), uow)
    }

    /// Route a direct load of one entity by key.
    ///
    /// A keyed load is retriable by shape, so only the write-set checks
    /// apply, with the entity itself as the whole queried set.
    pub fn route_load(&self, entity: &EntityType, uow: Option<&UnitOfWork>) -> RoutingDecision {
        if !self.enabled {
            debug!("load {}: replica routing disabled; PRIMARY", entity);
            return RoutingDecision::Primary;
        }

        self.decide(entity.name(), std::slice::from_ref(entity), uow)
    }

    /// Write-set part of the decision: queried entities against the unit of
    /// work, directly and through one association hop in either direction.
    fn decide<'a, I>(&self, label: &str, queried: I, uow: Option<&UnitOfWork>) -> RoutingDecision
    where
        I: IntoIterator<Item = &'a EntityType> + Copy,
    {
        let uow = match uow {
            Some(uow) => uow,
            None => {
                debug!("{}: no unit of work in scope; PRIMARY", label);
                return RoutingDecision::Primary;
            }
        };

        if !uow.has_writes() {
            trace!("{}: write set of {} empty; REPLICA", label, uow.id());
            return RoutingDecision::Replica;
        }

        for entity in queried {
            if uow.contains(entity) {
                debug!(
                    "{}: {} has pending writes in {}; PRIMARY",
                    label,
                    entity,
                    uow.id()
                );
                return RoutingDecision::Primary;
            }
        }

        for entity in queried {
            for written in uow.write_set() {
                if self.graph.references(entity, written) || self.graph.references(written, entity)
                {
                    debug!(
                        "{}: {} is associated with {} written in {}; PRIMARY",
                        label,
                        entity,
                        written,
                        uow.id()
                    );
                    return RoutingDecision::Primary;
                }
            }
        }

        trace!("{}: no overlap with write set of {}; REPLICA", label, uow.id());
        RoutingDecision::Replica
    }
}

/// Builder assembling a [`QueryRouter`] from its collaborators.
///
/// `build` is async because it runs the toggle's connection probes. The
/// defaults suit a production host: TCP probing (an unreachable endpoint
/// fails startup), no object cache, the SQL analyzer over the registered
/// entity catalog, and an eager prescan of every named query when routing
/// comes up enabled.
pub struct QueryRouterBuilder {
    config: RouterConfig,
    catalog: EntityCatalog,
    queries: QueryCatalog,
    analyzer: Option<Arc<dyn QueryAnalyzer>>,
    probe: Option<Arc<dyn ConnectionProbe>>,
    cache: Option<Arc<dyn ObjectCacheControl>>,
    prescan: bool,
}

impl QueryRouterBuilder {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            catalog: EntityCatalog::new(),
            queries: QueryCatalog::new(),
            analyzer: None,
            probe: None,
            cache: None,
            prescan: true,
        }
    }

    /// Set the entity catalog (schema and associations)
    pub fn entities(mut self, catalog: EntityCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Set the named query catalog
    pub fn named_queries(mut self, queries: QueryCatalog) -> Self {
        self.queries = queries;
        self
    }

    /// Replace the SQL analyzer
    pub fn analyzer(mut self, analyzer: Arc<dyn QueryAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Replace the connection probe
    pub fn probe(mut self, probe: Arc<dyn ConnectionProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Attach the host's object cache control
    pub fn object_cache(mut self, cache: Arc<dyn ObjectCacheControl>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Skip the startup prescan of named queries
    pub fn skip_prescan(mut self) -> Self {
        self.prescan = false;
        self
    }

    pub async fn build(self) -> Result<QueryRouter> {
        self.config.validate()?;

        let probe = self
            .probe
            .unwrap_or_else(|| Arc::new(TcpConnectionProbe) as Arc<dyn ConnectionProbe>);
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(NoopObjectCache) as Arc<dyn ObjectCacheControl>);

        let toggle = ReplicaToggle::new();
        let enabled = toggle
            .decide(probe.as_ref(), &self.config, cache.as_ref())
            .await?;

        // A disabled router answers PRIMARY before consulting the graph or
        // the classifier, so the one-time scans only run when enabled.
        let graph = if enabled {
            RelationshipGraph::build(&self.catalog)
        } else {
            RelationshipGraph::default()
        };

        let analyzer = self.analyzer.unwrap_or_else(|| {
            Arc::new(SqlQueryAnalyzer::new(self.catalog.clone())) as Arc<dyn QueryAnalyzer>
        });
        let classifier = QueryClassifier::new(analyzer);

        if enabled && self.prescan {
            classifier.prescan(&self.queries);
        }

        info!(
            "Query router ready: {} entities, {} named queries, replica routing {}",
            self.catalog.len(),
            self.queries.len(),
            if enabled { "enabled" } else { "disabled" }
        );

        Ok(QueryRouter {
            enabled,
            classifier,
            graph,
            queries: self.queries,
        })
    }
}
