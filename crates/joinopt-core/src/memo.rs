//! # Memo Table
//!
//! The memo maps the canonical key of a relation subset to the cheapest plan found so
//! far for exactly that subset. It is the sole owner of every installed plan: when a
//! cheaper plan arrives the previous one is dropped, so there is never more than one
//! "current best" for a subset.

use crate::join_tree::JoinTree;
use std::collections::HashMap;
use tracing::trace;

/// What `MemoTable::install` did with a candidate plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// No plan existed for the subset; the candidate is now the best.
    Inserted,
    /// Two-relation subset already resolved from the other side; candidate discarded.
    SymmetricSkip,
    /// The candidate was strictly cheaper and replaced the previous plan.
    Replaced,
    /// The existing plan was at least as cheap; candidate discarded.
    Kept,
}

/// Best plan per relation subset.
#[derive(Debug, Default)]
pub struct MemoTable {
    best: HashMap<String, JoinTree>,
}

impl MemoTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&JoinTree> {
        self.best.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.best.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// True when a candidate for `key` would be skipped without being built.
    ///
    /// A two-relation subset has only one join to apply, so once either insertion
    /// order has produced a plan the reverse order adds nothing.
    pub fn is_symmetric_duplicate(&self, key: &str, relations: usize) -> bool {
        relations == 2 && self.contains(key)
    }

    /// Install `candidate` for `key` unless the current plan is at least as cheap.
    pub fn install(&mut self, key: String, candidate: JoinTree) -> InstallOutcome {
        let relations = candidate.ir_set().len();
        if self.is_symmetric_duplicate(&key, relations) {
            trace!("Skipping symmetric pair {}", key);
            return InstallOutcome::SymmetricSkip;
        }
        match self.best.get(&key) {
            None => {
                trace!("New plan for {}: cost={:.1}", key, candidate.cost().total);
                self.best.insert(key, candidate);
                InstallOutcome::Inserted
            }
            Some(existing) if candidate.cost().is_cheaper_than(&existing.cost()) => {
                trace!(
                    "Replacing plan for {}: cost {:.1} -> {:.1}",
                    key,
                    existing.cost().total,
                    candidate.cost().total
                );
                self.best.insert(key, candidate);
                InstallOutcome::Replaced
            }
            Some(_) => InstallOutcome::Kept,
        }
    }

    /// Remove and return the plan for `key`.
    pub fn take(&mut self, key: &str) -> Option<JoinTree> {
        self.best.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join_tree::PlanContext;
    use crate::query::BoundPredicate;
    use crate::stats::{ColumnStats, StatsTable};

    fn setup() -> (Vec<BoundPredicate>, StatsTable) {
        let mut t = StatsTable::new();
        t.insert(0, vec![ColumnStats::new(0.0, 100.0, 1000.0, 100.0)]);
        t.insert(1, vec![ColumnStats::new(0.0, 100.0, 10.0, 10.0)]);
        t.insert(2, vec![ColumnStats::new(0.0, 100.0, 500.0, 100.0)]);
        let preds = vec![
            BoundPredicate::Join { left: 0, left_column: 0, right: 1, right_column: 0 },
            BoundPredicate::Join { left: 1, left_column: 0, right: 2, right_column: 0 },
        ];
        (preds, t)
    }

    #[test]
    fn test_pair_installed_once() {
        let (preds, base) = setup();
        let ctx = PlanContext { predicates: &preds, baseline: &base };
        let mut memo = MemoTable::new();

        let forward = JoinTree::extend(&JoinTree::leaf(0, ctx), 1, ctx);
        let reverse = JoinTree::extend(&JoinTree::leaf(1, ctx), 0, ctx);
        assert_eq!(memo.install("0-1".into(), forward), InstallOutcome::Inserted);
        assert_eq!(memo.install("0-1".into(), reverse), InstallOutcome::SymmetricSkip);
        assert_eq!(memo.len(), 1);
        assert_eq!(memo.get("0-1").map(|t| t.order()[0]), Some(0));
    }

    #[test]
    fn test_cheaper_plan_replaces_and_ties_keep() {
        let (preds, base) = setup();
        let ctx = PlanContext { predicates: &preds, baseline: &base };
        let mut memo = MemoTable::new();

        let via_01 = JoinTree::extend(&JoinTree::extend(&JoinTree::leaf(0, ctx), 1, ctx), 2, ctx);
        let via_12 = JoinTree::extend(&JoinTree::extend(&JoinTree::leaf(1, ctx), 2, ctx), 0, ctx);
        let (cheap, dear) = if via_01.cost() < via_12.cost() {
            (via_01, via_12)
        } else {
            (via_12, via_01)
        };
        let cheap_cost = cheap.cost();

        assert_eq!(memo.install("0-1-2".into(), dear.clone()), InstallOutcome::Inserted);
        let expected = if cheap_cost == dear.cost() {
            InstallOutcome::Kept
        } else {
            InstallOutcome::Replaced
        };
        assert_eq!(memo.install("0-1-2".into(), cheap.clone()), expected);
        assert_eq!(memo.install("0-1-2".into(), cheap), InstallOutcome::Kept);
        assert_eq!(memo.get("0-1-2").map(|t| t.cost()), Some(cheap_cost));
        assert!(memo.take("0-1-2").is_some());
        assert!(memo.is_empty());
    }
}
