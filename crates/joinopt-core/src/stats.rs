//! # Column Statistics and Propagation Formulas
//!
//! Every (relation, column) pair carries four numbers:
//!
//! - **`low` / `high`** (`l`, `u`): the value range of the column.
//! - **`rows`** (`f`): the estimated number of rows of the relation that survive the
//!   predicates applied so far.
//! - **`distinct`** (`d`): the estimated number of distinct values left in the column.
//!
//! A column is degenerate when `rows == distinct == 0`. All formulas tolerate zero
//! estimates; they never divide by a zero `rows` or `distinct`.
//!
//! ## Assumptions
//!
//! Values are uniformly distributed over `[low, high]` and columns are independent.
//! The formulas are approximations; after cascading updates the columns of one
//! relation may disagree slightly on `rows`.
//!
//! ## Derivation Formulas
//!
//! - **Range filter** `col < k` / `col > k`: the retained fraction is
//!   `(k - l) / (u - l)` or `(u - k) / (u - l)`; `rows` and `distinct` scale by it.
//!   A literal beyond the bound being tightened (`k < l` for `<`, `k > u` for `>`)
//!   or a single-valued range empties the column; a literal beyond the other bound
//!   is clamped to the range and keeps every row.
//! - **Equality filter** `col = k`: the column collapses to the single value `k`,
//!   `rows' = rows / distinct`, `distinct' = 1`.
//! - **Equi-join** `A.x = B.y`: both columns are clamped to the intersected range
//!   `[max(l), min(u)]`, then with `n = u - l + 1`:
//!   `rows' = rows_A * rows_B / n`, `distinct' = distinct_A * distinct_B / n`.
//! - **Self-join** `R.x = R.y`: both columns are clamped to the intersected range and
//!   `rows' = rows / n`.
//!
//! ## Cascading
//!
//! After a column changes, every other affected column is rescaled with
//!
//! ```text
//! d_other' = d_other * (1 - (1 - retained)^(f_other / d_other))
//! f_other' = f'
//! ```
//!
//! where `retained` is the surviving fraction of the updated column. The "IR" forms
//! also rescale the columns of relations already joined into the same intermediate
//! result, since those rows are correlated through earlier joins.

use crate::catalog::Catalog;
use crate::error::{OptimizeError, Result};
use crate::predicate::FilterOp;
use crate::RelationId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Statistics of a single column: `(l, u, f, d)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Lowest value (`l`).
    pub low: f64,
    /// Highest value (`u`).
    pub high: f64,
    /// Estimated surviving rows (`f`).
    pub rows: f64,
    /// Estimated distinct values (`d`).
    pub distinct: f64,
}

impl ColumnStats {
    pub fn new(low: f64, high: f64, rows: f64, distinct: f64) -> Self {
        Self {
            low,
            high,
            rows,
            distinct,
        }
    }

    /// Returns a copy with `rows` and `distinct` zeroed.
    pub fn emptied(self) -> Self {
        Self {
            rows: 0.0,
            distinct: 0.0,
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0.0 && self.distinct == 0.0
    }

    /// True when the values are finite, `0 <= distinct <= rows`, and `low <= high`
    /// unless the column is degenerate.
    pub fn is_valid(&self) -> bool {
        let finite = [self.low, self.high, self.rows, self.distinct]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.distinct >= 0.0
            && self.distinct <= self.rows
            && (self.low <= self.high || self.is_empty())
    }

    /// Statistics after `col < k`.
    pub fn less_than(&self, k: f64) -> Self {
        let k = k.min(self.high);
        let out = Self {
            high: k,
            ..*self
        };
        if k < self.low || self.low == self.high {
            return out.emptied();
        }
        let frac = (k - self.low) / (self.high - self.low);
        Self {
            rows: self.rows * frac,
            distinct: self.distinct * frac,
            ..out
        }
    }

    /// Statistics after `col > k`.
    pub fn greater_than(&self, k: f64) -> Self {
        let k = k.max(self.low);
        let out = Self {
            low: k,
            ..*self
        };
        if k > self.high || self.low == self.high {
            return out.emptied();
        }
        let frac = (self.high - k) / (self.high - self.low);
        Self {
            rows: self.rows * frac,
            distinct: self.distinct * frac,
            ..out
        }
    }

    /// Statistics after `col = k`.
    pub fn equal_to(&self, k: f64) -> Self {
        let out = Self {
            low: k,
            high: k,
            ..*self
        };
        if k < self.low || k > self.high || self.distinct == 0.0 {
            return out.emptied();
        }
        Self {
            rows: self.rows / self.distinct.max(1.0),
            distinct: self.distinct.min(1.0),
            ..out
        }
    }

    /// Statistics after a filter with the given operator.
    pub fn filter(&self, op: FilterOp, k: f64) -> Self {
        match op {
            FilterOp::Eq => self.equal_to(k),
            FilterOp::Lt => self.less_than(k),
            FilterOp::Gt => self.greater_than(k),
        }
    }

    /// Clamp the column to `[low, high]` the way a join does before estimating.
    fn clamp_to(&self, low: f64, high: f64) -> Self {
        self.greater_than(low).less_than(high)
    }

    /// Rescale a column that was not the target of an update.
    fn decay(&mut self, retained: f64, rows: f64) {
        if self.distinct == 0.0 || rows == 0.0 {
            *self = self.emptied();
            return;
        }
        let retained = if retained.is_finite() {
            retained.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.distinct *= 1.0 - (1.0 - retained).powf(self.rows / self.distinct);
        self.rows = rows;
    }
}

/// `new / old`, or 0 when `old` is 0.
fn ratio(new: f64, old: f64) -> f64 {
    if old == 0.0 {
        0.0
    } else {
        new / old
    }
}

/// Intersected range of two join columns.
fn join_range(a: &ColumnStats, b: &ColumnStats) -> (f64, f64) {
    (a.low.max(b.low), a.high.min(b.high))
}

/// Post-join statistics from two columns already clamped to `[low, high]`.
fn join_point(a: &ColumnStats, b: &ColumnStats, low: f64, high: f64) -> ColumnStats {
    let n = high - low + 1.0;
    let out = ColumnStats {
        low,
        high,
        rows: 0.0,
        distinct: 0.0,
    };
    if n <= 0.0 {
        return out;
    }
    ColumnStats {
        rows: (a.rows * b.rows) / n,
        distinct: (a.distinct * b.distinct) / n,
        ..out
    }
}

/// Estimate the statistics of both join columns after `a = b`.
///
/// The result is symmetric in its arguments. `StatsTable::apply_join` produces the
/// same numbers for the joined columns.
pub fn estimate_join(a: &ColumnStats, b: &ColumnStats) -> ColumnStats {
    let (low, high) = join_range(a, b);
    join_point(&a.clamp_to(low, high), &b.clamp_to(low, high), low, high)
}

/// Statistics of every column of the relations taking part in one query.
///
/// Cloning the table is the deep copy that isolates competing plans from each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsTable {
    relations: HashMap<RelationId, Vec<ColumnStats>>,
}

impl StatsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the baseline statistics of `relations` from the catalog.
    ///
    /// Every cell is checked with `ColumnStats::is_valid` before any formula sees it.
    pub fn from_catalog(catalog: &dyn Catalog, relations: &[RelationId]) -> Result<Self> {
        let mut table = Self::new();
        for &rel in relations {
            let columns = catalog
                .column_count(rel)
                .ok_or(OptimizeError::UnknownRelation(rel))?;
            let stats = (0..columns)
                .map(|col| {
                    let stats = catalog
                        .column_stats(rel, col)
                        .ok_or(OptimizeError::MissingStatistics { relation: rel, column: col })?;
                    if !stats.is_valid() {
                        return Err(OptimizeError::InvalidStatistics { relation: rel, column: col });
                    }
                    Ok(stats)
                })
                .collect::<Result<Vec<_>>>()?;
            table.insert(rel, stats);
        }
        Ok(table)
    }

    pub fn insert(&mut self, relation: RelationId, columns: Vec<ColumnStats>) {
        self.relations.insert(relation, columns);
    }

    pub fn get(&self, relation: RelationId, column: usize) -> Option<ColumnStats> {
        self.relations.get(&relation)?.get(column).copied()
    }

    fn set(&mut self, relation: RelationId, column: usize, stats: ColumnStats) {
        if let Some(slot) = self
            .relations
            .get_mut(&relation)
            .and_then(|cols| cols.get_mut(column))
        {
            *slot = stats;
        }
    }

    /// Rescale every column of `relation` except those in `skip`.
    fn cascade(&mut self, relation: RelationId, skip: &[usize], retained: f64, rows: f64) {
        if let Some(cols) = self.relations.get_mut(&relation) {
            for (i, col) in cols.iter_mut().enumerate() {
                if !skip.contains(&i) {
                    col.decay(retained, rows);
                }
            }
        }
    }

    /// Preview a filter without touching the table.
    pub fn eval_filter(&self, relation: RelationId, column: usize, op: FilterOp, k: f64) -> Option<ColumnStats> {
        self.get(relation, column).map(|s| s.filter(op, k))
    }

    /// Apply `relation.column op k`.
    ///
    /// The rest of the relation is rescaled. Every relation in `correlated` other
    /// than `relation` is rescaled too; pass an empty slice for a base relation.
    pub fn apply_filter(
        &mut self,
        relation: RelationId,
        column: usize,
        op: FilterOp,
        k: f64,
        correlated: &[RelationId],
    ) {
        let Some(before) = self.get(relation, column) else {
            return;
        };
        let after = before.filter(op, k);
        self.set(relation, column, after);

        let retained = ratio(after.rows, before.rows);
        self.cascade(relation, &[column], retained, after.rows);
        for &other in correlated {
            if other != relation {
                self.cascade(other, &[], retained, after.rows);
            }
        }
    }

    /// Apply `relation.a = relation.b`.
    pub fn apply_self_join(&mut self, relation: RelationId, a: usize, b: usize) {
        if a == b {
            return;
        }
        let (Some(ca), Some(cb)) = (self.get(relation, a), self.get(relation, b)) else {
            return;
        };
        let (low, high) = join_range(&ca, &cb);
        self.apply_filter(relation, a, FilterOp::Gt, low, &[]);
        self.apply_filter(relation, a, FilterOp::Lt, high, &[]);
        self.apply_filter(relation, b, FilterOp::Gt, low, &[]);
        self.apply_filter(relation, b, FilterOp::Lt, high, &[]);

        // The last filter propagated its row count to every column.
        let rows = self.get(relation, b).map(|s| s.rows).unwrap_or(0.0);
        let n = high - low + 1.0;
        let new_rows = if n <= 0.0 { 0.0 } else { rows / n.max(1.0) };

        self.cascade(relation, &[], ratio(new_rows, rows), new_rows);
        for col in [a, b] {
            if let Some(s) = self.get(relation, col) {
                self.set(relation, col, ColumnStats { low, high, ..s });
            }
        }
    }

    /// Preview the joined column statistics of `a.col_a = b.col_b`.
    pub fn eval_join(&self, rel_a: RelationId, col_a: usize, rel_b: RelationId, col_b: usize) -> Option<ColumnStats> {
        Some(estimate_join(&self.get(rel_a, col_a)?, &self.get(rel_b, col_b)?))
    }

    /// Apply `rel_a.col_a = rel_b.col_b`.
    ///
    /// `rel_a` is the side already folded into the intermediate result described by
    /// `ir_set`; `rel_b` is the base relation being joined in. Only `rel_a`'s range
    /// clamp cascades into the intermediate result.
    pub fn apply_join(
        &mut self,
        rel_a: RelationId,
        col_a: usize,
        rel_b: RelationId,
        col_b: usize,
        ir_set: &[RelationId],
    ) {
        let (Some(a), Some(b)) = (self.get(rel_a, col_a), self.get(rel_b, col_b)) else {
            return;
        };
        let (low, high) = join_range(&a, &b);

        self.apply_filter(rel_a, col_a, FilterOp::Gt, low, ir_set);
        self.apply_filter(rel_a, col_a, FilterOp::Lt, high, ir_set);
        self.apply_filter(rel_b, col_b, FilterOp::Gt, low, &[]);
        self.apply_filter(rel_b, col_b, FilterOp::Lt, high, &[]);

        let (Some(clamped_a), Some(clamped_b)) = (self.get(rel_a, col_a), self.get(rel_b, col_b)) else {
            return;
        };
        let joined = join_point(&clamped_a, &clamped_b, low, high);
        self.set(rel_a, col_a, joined);
        self.set(rel_b, col_b, joined);

        self.cascade(rel_a, &[col_a], ratio(joined.distinct, a.distinct), joined.rows);
        self.cascade(rel_b, &[col_b], ratio(joined.distinct, b.distinct), joined.rows);
        for &other in ir_set {
            if other != rel_a && other != rel_b {
                self.cascade(other, &[], ratio(joined.distinct, a.distinct), joined.rows);
            }
        }
    }
}

impl fmt::Display for StatsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.relations.keys().copied().collect();
        ids.sort_unstable();
        for rel in ids {
            for (i, s) in self.relations[&rel].iter().enumerate() {
                writeln!(
                    f,
                    "{}.{}: l={} u={} f={} d={}",
                    rel, i, s.low, s.high, s.rows, s.distinct
                )?;
            }
        }
        Ok(())
    }
}
