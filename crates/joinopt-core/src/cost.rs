//! # Plan Cost
//!
//! A plan's cost is the sum, over every base relation joined in after the first, of
//! the estimated row count of that relation's probe column once the join has been
//! applied. Column 0 is the fixed probe column of every relation.
//!
//! Costs only grow as a plan is extended, so the cost of a plan for a relation subset
//! is a lower bound for every plan built on top of it.

use crate::stats::StatsTable;
use crate::RelationId;
use serde::{Deserialize, Serialize};

/// Column whose row estimate is charged when a relation is joined in.
pub const PROBE_COLUMN: usize = 0;

/// Cost is a single comparable value representing the estimated expense of a plan.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Cost {
    /// Accumulated probe-column rows. Lower is better.
    pub total: f64,
}

impl Cost {
    pub fn zero() -> Self {
        Self { total: 0.0 }
    }

    pub fn new(total: f64) -> Self {
        Self { total }
    }

    pub fn add(self, rows: f64) -> Self {
        Self {
            total: self.total + rows,
        }
    }

    /// Strict comparison used to decide whether a new plan replaces the current one.
    pub fn is_cheaper_than(&self, other: &Cost) -> bool {
        self.total < other.total
    }
}

impl PartialEq for Cost {
    fn eq(&self, other: &Self) -> bool {
        self.total == other.total
    }
}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.total.partial_cmp(&other.total)
    }
}

/// Rows charged for joining `relation` in, given the plan's statistics after the join.
pub fn probe_rows(stats: &StatsTable, relation: RelationId) -> f64 {
    stats
        .get(relation, PROBE_COLUMN)
        .map(|s| s.rows)
        .unwrap_or(0.0)
}
