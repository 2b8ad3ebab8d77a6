//! # Catalog Interface
//!
//! The catalog supplies the two facts the optimizer needs about a base relation: how
//! many columns it has, and the baseline statistics `(l, u, f, d)` for each column as
//! seeded by the statistics-collection component. The optimizer reads these once per
//! query; afterwards only private per-plan copies are mutated.
//!
//! ## Trait Design
//!
//! `Catalog` is used behind `&dyn Catalog` so that a storage engine can back it with
//! its own metadata. `InMemoryCatalog` is a `HashMap`-based implementation populated
//! programmatically, used by tests and by the HTTP server.

use crate::stats::ColumnStats;
use crate::RelationId;
use std::collections::HashMap;

/// Catalog provides column counts and baseline statistics per relation.
pub trait Catalog: Send + Sync {
    fn column_count(&self, relation: RelationId) -> Option<usize>;
    fn column_stats(&self, relation: RelationId, column: usize) -> Option<ColumnStats>;
}

/// In-memory catalog for testing and development.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    /// Baseline statistics per relation, one entry per column.
    pub relations: HashMap<RelationId, Vec<ColumnStats>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_relation(&mut self, relation: RelationId, columns: Vec<ColumnStats>) {
        self.relations.insert(relation, columns);
    }

    pub fn with_relation(mut self, relation: RelationId, columns: Vec<ColumnStats>) -> Self {
        self.add_relation(relation, columns);
        self
    }
}

impl Catalog for InMemoryCatalog {
    fn column_count(&self, relation: RelationId) -> Option<usize> {
        self.relations.get(&relation).map(Vec::len)
    }

    fn column_stats(&self, relation: RelationId, column: usize) -> Option<ColumnStats> {
        self.relations
            .get(&relation)
            .and_then(|cols| cols.get(column))
            .copied()
    }
}
