use crate::catalog::EntityCatalog;
use crate::core::{EntityType, Result, RouterError};
use sqlparser::ast::{ObjectName, Query, Statement, Visit, Visitor};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::collections::HashSet;
use std::ops::ControlFlow;

/// Static analysis seam: which registered entity types does a query read?
///
/// The router only ever needs the SET of entity types behind a query text.
/// Production uses [`SqlQueryAnalyzer`]; tests substitute doubles to count
/// invocations or force failures.
pub trait QueryAnalyzer: Send + Sync {
    /// Every entity type whose relation the query references, across FROM,
    /// JOINs, derived tables, set operations and subqueries. `Err` means the
    /// query could not be understood completely; the caller must treat the
    /// query as unsafe for a replica.
    fn referenced_entities(&self, text: &str) -> Result<HashSet<EntityType>>;
}

/// Collects every relation reference in a query, plus the CTE names declared
/// along the way so they can be told apart from real relations.
#[derive(Default)]
struct RelationCollector {
    relations: Vec<ObjectName>,
    cte_names: HashSet<String>,
    nested_statement: bool,
}

impl Visitor for RelationCollector {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.cte_names.insert(cte.alias.name.value.to_lowercase());
            }
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<Self::Break> {
        self.relations.push(relation.clone());
        ControlFlow::Continue(())
    }

    // Traversal starts at the Query node, so a Statement can only be reached
    // nested inside it: an INSERT, UPDATE or DELETE body behind a WITH
    // prologue or inside a CTE. No such statement is a pure read.
    fn pre_visit_statement(&mut self, _statement: &Statement) -> ControlFlow<Self::Break> {
        self.nested_statement = true;
        ControlFlow::Break(())
    }
}

/// Default analyzer: parses the text with `sqlparser` (PostgreSQL dialect)
/// and resolves every referenced relation against the entity catalog.
///
/// Anything short of a completely understood read is an error, never a
/// partial result: an incomplete entity set would let a stale read through.
/// That covers parse failures and non-SELECT statements, writes nested
/// behind a WITH prologue or inside a CTE body, relations no registered
/// entity claims, and CTE aliases that shadow a mapped relation.
pub struct SqlQueryAnalyzer {
    catalog: EntityCatalog,
    dialect: PostgreSqlDialect,
}

impl SqlQueryAnalyzer {
    pub fn new(catalog: EntityCatalog) -> Self {
        Self {
            catalog,
            dialect: PostgreSqlDialect {},
        }
    }

    fn single_query(&self, text: &str) -> Result<Box<Query>> {
        let mut statements = Parser::parse_sql(&self.dialect, text)
            .map_err(|e| RouterError::ParseError(e.to_string()))?;

        if statements.len() != 1 {
            return Err(RouterError::ParseError(format!(
                "expected a single statement, found {}",
                statements.len()
            )));
        }

        match statements.remove(0) {
            Statement::Query(query) => Ok(query),
            other => Err(RouterError::ParseError(format!(
                "not a read statement: {}",
                other
            ))),
        }
    }
}

impl QueryAnalyzer for SqlQueryAnalyzer {
    fn referenced_entities(&self, text: &str) -> Result<HashSet<EntityType>> {
        let query = self.single_query(text)?;

        let mut collector = RelationCollector::default();
        let _ = query.visit(&mut collector);

        if collector.nested_statement {
            return Err(RouterError::ParseError(format!(
                "query embeds a data-modifying statement: {}",
                text
            )));
        }

        let mut entities = HashSet::new();
        for relation in &collector.relations {
            let raw = relation
                .0
                .last()
                .map(|part| part.to_string())
                .ok_or_else(|| RouterError::ParseError("empty relation name".into()))?;
            let name = raw.trim_matches('"');

            // An unqualified name matching a CTE normally refers to the CTE,
            // not a relation; a schema-qualified name never can. But a WITH
            // inside a derived table is invisible to the enclosing query, so
            // a CTE alias that is also a mapped relation leaves the
            // reference ambiguous.
            if relation.0.len() == 1 && collector.cte_names.contains(&name.to_lowercase()) {
                if self.catalog.resolve_relation(name).is_some() {
                    return Err(RouterError::ParseError(format!(
                        "CTE '{}' shadows a mapped relation",
                        name
                    )));
                }
                continue;
            }

            match self.catalog.resolve_relation(name) {
                Some(entity) => {
                    entities.insert(entity.clone());
                }
                None => {
                    return Err(RouterError::ParseError(format!(
                        "relation '{}' does not map to a registered entity",
                        name
                    )));
                }
            }
        }

        Ok(entities)
    }
}
