//! # Query Predicates
//!
//! Predicates arrive from the query parser as a flat array. The optimizer never adds,
//! removes or rewrites a predicate; it only decides the position each one takes in
//! the execution order.
//!
//! ## Variants
//!
//! - **Filter**: `binding.column op literal` with `op` one of `=`, `<`, `>`.
//! - **Join**: `binding.column = binding.column` across two different relations.
//! - **SelfJoin**: `binding.column = binding.column` within a single relation.
//!
//! Relations are referenced by *binding*, the position of the relation in the
//! query's relation list. The relation id is looked up through the query.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator of a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            FilterOp::Eq => '=',
            FilterOp::Lt => '<',
            FilterOp::Gt => '>',
        };
        write!(f, "{}", c)
    }
}

/// Classification used when reordering predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    Filter,
    Join,
    SelfJoin,
}

/// A single predicate of the query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Predicate {
    #[serde(rename_all = "camelCase")]
    Filter {
        binding: usize,
        column: usize,
        op: FilterOp,
        value: u64,
    },
    #[serde(rename_all = "camelCase")]
    Join {
        left_binding: usize,
        left_column: usize,
        right_binding: usize,
        right_column: usize,
    },
    #[serde(rename_all = "camelCase")]
    SelfJoin {
        binding: usize,
        left_column: usize,
        right_column: usize,
    },
}

impl Predicate {
    pub fn filter(binding: usize, column: usize, op: FilterOp, value: u64) -> Self {
        Predicate::Filter {
            binding,
            column,
            op,
            value,
        }
    }

    pub fn join(left_binding: usize, left_column: usize, right_binding: usize, right_column: usize) -> Self {
        Predicate::Join {
            left_binding,
            left_column,
            right_binding,
            right_column,
        }
    }

    pub fn self_join(binding: usize, left_column: usize, right_column: usize) -> Self {
        Predicate::SelfJoin {
            binding,
            left_column,
            right_column,
        }
    }

    pub fn kind(&self) -> PredicateKind {
        match self {
            Predicate::Filter { .. } => PredicateKind::Filter,
            Predicate::Join { .. } => PredicateKind::Join,
            Predicate::SelfJoin { .. } => PredicateKind::SelfJoin,
        }
    }

    /// Every (binding, column) pair the predicate reads.
    pub fn columns(&self) -> Vec<(usize, usize)> {
        match *self {
            Predicate::Filter { binding, column, .. } => vec![(binding, column)],
            Predicate::Join {
                left_binding,
                left_column,
                right_binding,
                right_column,
            } => vec![(left_binding, left_column), (right_binding, right_column)],
            Predicate::SelfJoin {
                binding,
                left_column,
                right_column,
            } => vec![(binding, left_column), (binding, right_column)],
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Filter {
                binding,
                column,
                op,
                value,
            } => write!(f, "{}.{}{}{}", binding, column, op, value),
            Predicate::Join {
                left_binding,
                left_column,
                right_binding,
                right_column,
            } => write!(f, "{}.{}={}.{}", left_binding, left_column, right_binding, right_column),
            Predicate::SelfJoin {
                binding,
                left_column,
                right_column,
            } => write!(f, "{}.{}={}.{}", binding, left_column, binding, right_column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Predicate::filter(0, 1, FilterOp::Lt, 50).to_string(), "0.1<50");
        assert_eq!(Predicate::join(0, 0, 2, 1).to_string(), "0.0=2.1");
        assert_eq!(Predicate::self_join(1, 0, 2).to_string(), "1.0=1.2");
    }

    #[test]
    fn test_wire_format() {
        let json = r#"{"type":"filter","binding":0,"column":1,"op":">","value":7}"#;
        let p: Predicate = serde_json::from_str(json).unwrap();
        assert_eq!(p, Predicate::filter(0, 1, FilterOp::Gt, 7));

        let join = Predicate::join(0, 0, 1, 2);
        let encoded = serde_json::to_string(&join).unwrap();
        assert!(encoded.contains(r#""type":"join""#));
        assert!(encoded.contains(r#""rightColumn":2"#));
    }
}
