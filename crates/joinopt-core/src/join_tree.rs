//! # Candidate Left-Deep Plans
//!
//! A `JoinTree` is one candidate plan for a subset of the query's relations. It owns
//! everything it needs to be compared against its competitors:
//!
//! - the ascending set of relations combined so far (`ir_set`),
//! - its own predicate order, as a permutation of the query's predicate indices,
//!   with the first `last_predicate` entries already placed in execution order,
//! - a private copy of the statistics table, updated as joins are applied,
//! - its accumulated cost.
//!
//! Plans are never mutated after construction. A leaf plan covers one base relation;
//! an extended plan adds exactly one base relation to a parent plan.

use crate::cost::{probe_rows, Cost};
use crate::predicate::Predicate;
use crate::query::BoundPredicate;
use crate::stats::StatsTable;
use crate::subset::RelationSet;
use crate::RelationId;
use tracing::trace;

/// Read-only inputs shared by every plan of one optimization.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    /// The query's predicates, bound to relation ids, in parser order.
    pub predicates: &'a [BoundPredicate],
    /// Baseline statistics with filters and self-joins already applied.
    pub baseline: &'a StatsTable,
}

/// A candidate plan over a subset of relations.
#[derive(Debug, Clone)]
pub struct JoinTree {
    ir_set: RelationSet,
    cost: Cost,
    order: Vec<usize>,
    stats: StatsTable,
    last_predicate: usize,
}

impl JoinTree {
    /// Plan for a single base relation: its filters and self-joins go first.
    pub fn leaf(relation: RelationId, ctx: PlanContext<'_>) -> Self {
        let mut order: Vec<usize> = (0..ctx.predicates.len()).collect();
        let last_predicate = promote(&mut order, 0, |i| {
            ctx.predicates[i].local_relation() == Some(relation)
        });
        Self {
            ir_set: RelationSet::singleton(relation),
            cost: Cost::zero(),
            order,
            stats: ctx.baseline.clone(),
            last_predicate,
        }
    }

    /// Plan that joins `relation` onto `parent`.
    pub fn extend(parent: &JoinTree, relation: RelationId, ctx: PlanContext<'_>) -> Self {
        let mut order = parent.order.clone();
        let mut stats = parent.stats.clone();

        // Remaining filters and self-joins of every relation keep their place ahead of the joins.
        let filters_end = promote(&mut order, parent.last_predicate, |i| ctx.predicates[i].is_local());

        let ir = &parent.ir_set;
        let last_predicate = promote(&mut order, filters_end, |i| {
            ctx.predicates[i]
                .join_sides()
                .is_some_and(|(l, _, r, _)| (ir.contains(l) || ir.contains(r)) && (relation == l || relation == r))
        });

        for &i in &order[filters_end..last_predicate] {
            if let Some((l, lc, r, rc)) = ctx.predicates[i].join_sides() {
                if ir.contains(l) {
                    stats.apply_join(l, lc, r, rc, ir.as_slice());
                } else {
                    stats.apply_join(r, rc, l, lc, ir.as_slice());
                }
            }
        }

        let cost = parent.cost.add(probe_rows(&stats, relation));
        let ir_set = parent.ir_set.with(relation);
        trace!(
            "Built plan {} from {} + {}: cost={:.1}",
            ir_set,
            parent.ir_set,
            relation,
            cost.total
        );

        Self {
            ir_set,
            cost,
            order,
            stats,
            last_predicate,
        }
    }

    pub fn ir_set(&self) -> &RelationSet {
        &self.ir_set
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn stats(&self) -> &StatsTable {
        &self.stats
    }

    /// Number of predicates already placed in execution order.
    pub fn last_predicate(&self) -> usize {
        self.last_predicate
    }

    /// The plan's predicate order as indices into the query's predicate array.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// The query's predicates rearranged into this plan's order.
    pub fn ordered_predicates(&self, predicates: &[Predicate]) -> Vec<Predicate> {
        self.order.iter().map(|&i| predicates[i].clone()).collect()
    }
}

/// Stably move every entry of `order[start..]` accepted by `keep` to the front of that
/// range. Returns the end of the moved block.
fn promote(order: &mut [usize], start: usize, mut keep: impl FnMut(usize) -> bool) -> usize {
    let tail = &mut order[start..];
    let (mut moved, rest): (Vec<usize>, Vec<usize>) = tail.iter().copied().partition(|&i| keep(i));
    let end = start + moved.len();
    moved.extend(rest);
    tail.copy_from_slice(&moved);
    end
}
