//! Errors raised while preparing a query for join enumeration.
//!
//! The search itself never fails: a missing memo entry means "build a plan" and
//! degenerate statistics collapse to zero estimates. Everything here is an input
//! problem detected before the first plan is built, or a configured search limit.

use crate::RelationId;

pub type Result<T> = std::result::Result<T, OptimizeError>;

/// Errors that can occur during join-order optimization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptimizeError {
    /// The query names no relations at all.
    #[error("Empty query: no relations")]
    EmptyQuery,
    /// The same relation id appears twice; statistics are keyed by relation id.
    #[error("Relation {0} appears more than once in the query")]
    DuplicateRelation(RelationId),
    /// A predicate refers to a binding past the end of the relation list.
    #[error("Predicate {predicate} refers to binding {binding}, but the query has {relations} relations")]
    UnknownBinding {
        predicate: usize,
        binding: usize,
        relations: usize,
    },
    /// The catalog has no entry (or no columns) for a relation of the query.
    #[error("Relation {0} is not in the catalog")]
    UnknownRelation(RelationId),
    /// A predicate refers to a column the relation does not have.
    #[error("Column {column} is out of range for relation {relation} ({columns} columns)")]
    ColumnOutOfRange {
        relation: RelationId,
        column: usize,
        columns: usize,
    },
    /// The catalog reports columns for a relation but cannot supply statistics for one.
    #[error("Missing statistics for {relation}.{column}")]
    MissingStatistics { relation: RelationId, column: usize },
    /// Baseline statistics break `l <= u` (unless degenerate), `0 <= d <= f`, or are not finite.
    #[error("Invalid statistics for {relation}.{column}")]
    InvalidStatistics { relation: RelationId, column: usize },
    /// The join predicates do not connect every relation; a cross product would be needed.
    #[error("Join graph is disconnected: best reachable subset is {reachable}")]
    DisconnectedJoinGraph { reachable: String },
    /// More relations than the search is configured to handle.
    #[error("Query has {relations} relations, limit is {limit}")]
    TooManyRelations { relations: usize, limit: usize },
    /// The connected-subset lattice outgrew the configured limit.
    #[error("Search space exceeded: more than {limit} connected subsets")]
    SearchSpaceExceeded { limit: usize },
}
