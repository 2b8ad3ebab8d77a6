//! # Join Enumeration
//!
//! This module drives the bottom-up dynamic-programming search for the cheapest
//! left-deep join order.
//!
//! ## How It Works
//!
//! 1. **Bind**: resolve predicate bindings to relation ids and check them against
//!    the catalog.
//! 2. **Local predicates**: apply every filter and self-join once to the shared
//!    baseline statistics. No plan exists yet, so every plan starts from the
//!    filtered baseline.
//! 3. **Lattice**: enumerate the connected relation subsets in discovery order.
//! 4. **Leaves**: install one leaf plan per base relation.
//! 5. **Extend**: for each subset `S` and each relation `r` connected to it, extend
//!    the best plan of `S` by `r` and keep it if it is the first or strictly the
//!    cheapest plan for `S ∪ {r}`.
//! 6. **Write back**: the plan for the full relation set dictates the new predicate
//!    order, copied into the caller's query.
//!
//! ## Memoization
//!
//! Each subset keeps only its cheapest plan, so the number of plans alive at once is
//! bounded by the number of connected subsets. Ties keep the plan installed first.

use crate::catalog::Catalog;
use crate::cost::Cost;
use crate::error::{OptimizeError, Result};
use crate::join_tree::{JoinTree, PlanContext};
use crate::memo::{InstallOutcome, MemoTable};
use crate::query::{BoundPredicate, QueryInfo};
use crate::stats::StatsTable;
use crate::subset::{build_lattice, JoinGraph, RelationSet};
use serde::Serialize;
use tracing::{debug, trace};

/// Limits that keep the search from running away on very large queries.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Upper bound on the number of relations in one query.
    pub max_relations: usize,
    /// Upper bound on the number of connected subsets in the lattice.
    pub max_subsets: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_relations: 16,
            max_subsets: 100_000,
        }
    }
}

/// Summary of one optimization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    /// Cost of the winning plan.
    pub cost: Cost,
    /// Canonical key of the full relation set.
    pub final_key: String,
    /// Connected subsets in the lattice.
    pub subsets: usize,
    /// Plans constructed, leaves included.
    pub plans_built: usize,
    /// Times a cheaper plan replaced an installed one.
    pub replaced: usize,
    /// Two-relation candidates skipped because the pair was already resolved.
    pub symmetric_skips: usize,
}

/// The enumeration driver.
pub struct JoinEnumerator<'a> {
    catalog: &'a dyn Catalog,
    config: SearchConfig,
}

impl<'a> JoinEnumerator<'a> {
    pub fn new(catalog: &'a dyn Catalog, config: SearchConfig) -> Self {
        Self { catalog, config }
    }

    /// Reorder `query.predicates` into the cheapest execution order found.
    ///
    /// On error the query is left untouched.
    pub fn optimize(&self, query: &mut QueryInfo) -> Result<SearchReport> {
        let (best, report) = self.best_plan(query)?;
        query.predicates = best.ordered_predicates(&query.predicates);
        debug!(
            "Predicate order: {}",
            query
                .predicates
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(" & ")
        );
        Ok(report)
    }

    /// Run the search and return the winning plan without touching the query.
    pub fn best_plan(&self, query: &QueryInfo) -> Result<(JoinTree, SearchReport)> {
        if query.relation_count() > self.config.max_relations {
            return Err(OptimizeError::TooManyRelations {
                relations: query.relation_count(),
                limit: self.config.max_relations,
            });
        }
        let predicates = query.bind(self.catalog)?;

        let mut baseline = StatsTable::from_catalog(self.catalog, &query.relations)?;
        apply_local_predicates(&mut baseline, &predicates);
        trace!("Baseline after local predicates:\n{}", baseline);

        let graph = JoinGraph::from_predicates(&predicates);
        let lattice = build_lattice(&query.relations, &graph, self.config.max_subsets)?;
        debug!(
            "Starting join enumeration: relations={}, predicates={}, subsets={}",
            query.relation_count(),
            query.predicate_count(),
            lattice.len()
        );

        let ctx = PlanContext {
            predicates: &predicates,
            baseline: &baseline,
        };
        let mut memo = MemoTable::new();
        let mut report = SearchReport {
            cost: Cost::zero(),
            final_key: String::new(),
            subsets: lattice.len(),
            plans_built: 0,
            replaced: 0,
            symmetric_skips: 0,
        };

        for &rel in &query.relations {
            let leaf = JoinTree::leaf(rel, ctx);
            memo.install(leaf.ir_set().canonical_key(), leaf);
            report.plans_built += 1;
        }

        for subset in &lattice {
            let subset_key = subset.canonical_key();
            for &rel in &query.relations {
                if subset.contains(rel) || !graph.is_connected_to(subset, rel) {
                    continue;
                }
                let next = subset.with(rel);
                let key = next.canonical_key();
                if memo.is_symmetric_duplicate(&key, next.len()) {
                    report.symmetric_skips += 1;
                    continue;
                }
                let Some(parent) = memo.get(&subset_key) else {
                    debug!("No plan for subset {}, skipping", subset_key);
                    continue;
                };
                let candidate = JoinTree::extend(parent, rel, ctx);
                report.plans_built += 1;
                if memo.install(key, candidate) == InstallOutcome::Replaced {
                    report.replaced += 1;
                }
            }
        }

        let full: RelationSet = query.relations.iter().copied().collect();
        let final_key = full.canonical_key();
        let best = memo.take(&final_key).ok_or_else(|| OptimizeError::DisconnectedJoinGraph {
            reachable: lattice
                .iter()
                .max_by_key(|s| s.len())
                .map(RelationSet::canonical_key)
                .unwrap_or_default(),
        })?;

        report.cost = best.cost();
        report.final_key = final_key;
        debug!(
            "Join enumeration complete: plan={}, cost={:.1}, plans_built={}, replaced={}",
            report.final_key, report.cost.total, report.plans_built, report.replaced
        );
        Ok((best, report))
    }
}

/// Apply every filter and self-join to the baseline statistics.
pub fn apply_local_predicates(stats: &mut StatsTable, predicates: &[BoundPredicate]) {
    for p in predicates {
        match *p {
            BoundPredicate::Filter {
                relation,
                column,
                op,
                value,
            } => stats.apply_filter(relation, column, op, value, &[]),
            BoundPredicate::SelfJoin {
                relation,
                left_column,
                right_column,
            } => stats.apply_self_join(relation, left_column, right_column),
            BoundPredicate::Join { .. } => {}
        }
    }
}

/// Optimize `query` in place with the default search limits.
pub fn optimize_query(catalog: &dyn Catalog, query: &mut QueryInfo) -> Result<SearchReport> {
    JoinEnumerator::new(catalog, SearchConfig::default()).optimize(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::predicate::{FilterOp, Predicate};
    use crate::stats::ColumnStats;

    #[test]
    fn test_search_config_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.max_relations, 16);
        assert_eq!(config.max_subsets, 100_000);
    }

    #[test]
    fn test_single_relation_query() {
        let catalog = InMemoryCatalog::new().with_relation(
            4,
            vec![ColumnStats::new(0.0, 100.0, 1000.0, 100.0), ColumnStats::new(0.0, 10.0, 1000.0, 10.0)],
        );
        let mut query = QueryInfo::new(
            vec![4],
            vec![Predicate::self_join(0, 0, 1), Predicate::filter(0, 0, FilterOp::Gt, 20)],
        );
        let report = optimize_query(&catalog, &mut query).unwrap();
        assert_eq!(report.final_key, "4");
        assert_eq!(report.cost, Cost::zero());
        assert_eq!(report.plans_built, 1);
        assert_eq!(query.predicates.len(), 2);
    }

    #[test]
    fn test_local_predicates_update_baseline() {
        let mut stats = StatsTable::new();
        stats.insert(0, vec![ColumnStats::new(0.0, 100.0, 1000.0, 100.0)]);
        let preds = vec![
            BoundPredicate::Filter { relation: 0, column: 0, op: FilterOp::Lt, value: 25.0 },
            BoundPredicate::Join { left: 0, left_column: 0, right: 1, right_column: 0 },
        ];
        apply_local_predicates(&mut stats, &preds);
        assert_eq!(stats.get(0, 0).map(|s| s.rows), Some(250.0));
    }

    #[test]
    fn test_too_many_relations() {
        let catalog = InMemoryCatalog::new();
        let config = SearchConfig {
            max_relations: 2,
            ..SearchConfig::default()
        };
        let mut query = QueryInfo::new(vec![0, 1, 2], vec![]);
        assert_eq!(
            JoinEnumerator::new(&catalog, config).optimize(&mut query),
            Err(OptimizeError::TooManyRelations { relations: 3, limit: 2 })
        );
    }
}
