//! # Query Context
//!
//! The query context is the optimizer's input and output: the ordered list of relation
//! ids, and the predicate array whose order the optimizer rewrites. Relation ids and
//! counts are never touched; the predicate array keeps its length and contents.
//!
//! Before searching, predicates are *bound*: each binding is replaced by the relation
//! id it refers to, and columns are checked against the catalog. Binding happens once
//! per optimization so the search works on plain relation ids.

use crate::catalog::Catalog;
use crate::error::{OptimizeError, Result};
use crate::predicate::{FilterOp, Predicate, PredicateKind};
use crate::RelationId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The query handed to the optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInfo {
    /// Relation ids in binding order.
    pub relations: Vec<RelationId>,
    /// Predicates in execution order; reordered in place by the optimizer.
    pub predicates: Vec<Predicate>,
}

impl QueryInfo {
    pub fn new(relations: Vec<RelationId>, predicates: Vec<Predicate>) -> Self {
        Self {
            relations,
            predicates,
        }
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    pub fn relation_at(&self, binding: usize) -> Option<RelationId> {
        self.relations.get(binding).copied()
    }

    /// Check the query against the catalog and resolve every predicate.
    pub fn bind(&self, catalog: &dyn Catalog) -> Result<Vec<BoundPredicate>> {
        if self.relations.is_empty() {
            return Err(OptimizeError::EmptyQuery);
        }
        let mut seen = HashSet::new();
        for &rel in &self.relations {
            if !seen.insert(rel) {
                return Err(OptimizeError::DuplicateRelation(rel));
            }
            match catalog.column_count(rel) {
                Some(n) if n > 0 => {}
                _ => return Err(OptimizeError::UnknownRelation(rel)),
            }
        }

        self.predicates
            .iter()
            .enumerate()
            .map(|(i, p)| {
                for (binding, column) in p.columns() {
                    let rel = self.relation_at(binding).ok_or(OptimizeError::UnknownBinding {
                        predicate: i,
                        binding,
                        relations: self.relations.len(),
                    })?;
                    let columns = catalog.column_count(rel).unwrap_or(0);
                    if column >= columns {
                        return Err(OptimizeError::ColumnOutOfRange {
                            relation: rel,
                            column,
                            columns,
                        });
                    }
                }
                Ok(self.bind_unchecked(p))
            })
            .collect()
    }

    fn bind_unchecked(&self, p: &Predicate) -> BoundPredicate {
        let rel = |b: usize| self.relations[b];
        match *p {
            Predicate::Filter {
                binding,
                column,
                op,
                value,
            } => BoundPredicate::Filter {
                relation: rel(binding),
                column,
                op,
                value: value as f64,
            },
            Predicate::Join {
                left_binding,
                left_column,
                right_binding,
                right_column,
            } if left_binding == right_binding => BoundPredicate::SelfJoin {
                relation: rel(left_binding),
                left_column,
                right_column,
            },
            Predicate::Join {
                left_binding,
                left_column,
                right_binding,
                right_column,
            } => BoundPredicate::Join {
                left: rel(left_binding),
                left_column,
                right: rel(right_binding),
                right_column,
            },
            Predicate::SelfJoin {
                binding,
                left_column,
                right_column,
            } => BoundPredicate::SelfJoin {
                relation: rel(binding),
                left_column,
                right_column,
            },
        }
    }
}

/// A predicate with bindings resolved to relation ids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundPredicate {
    Filter {
        relation: RelationId,
        column: usize,
        op: FilterOp,
        value: f64,
    },
    Join {
        left: RelationId,
        left_column: usize,
        right: RelationId,
        right_column: usize,
    },
    SelfJoin {
        relation: RelationId,
        left_column: usize,
        right_column: usize,
    },
}

impl BoundPredicate {
    pub fn kind(&self) -> PredicateKind {
        match self {
            BoundPredicate::Filter { .. } => PredicateKind::Filter,
            BoundPredicate::Join { .. } => PredicateKind::Join,
            BoundPredicate::SelfJoin { .. } => PredicateKind::SelfJoin,
        }
    }

    /// True for filters and self-joins, which only ever touch one relation.
    pub fn is_local(&self) -> bool {
        !matches!(self, BoundPredicate::Join { .. })
    }

    /// The relation a filter or self-join applies to.
    pub fn local_relation(&self) -> Option<RelationId> {
        match *self {
            BoundPredicate::Filter { relation, .. } | BoundPredicate::SelfJoin { relation, .. } => Some(relation),
            BoundPredicate::Join { .. } => None,
        }
    }

    /// `(left, left_column, right, right_column)` of a join.
    pub fn join_sides(&self) -> Option<(RelationId, usize, RelationId, usize)> {
        match *self {
            BoundPredicate::Join {
                left,
                left_column,
                right,
                right_column,
            } => Some((left, left_column, right, right_column)),
            _ => None,
        }
    }
}
