//! # joinopt-core: Statistics-Driven Join-Order Optimizer
//!
//! This crate picks an execution order for a multi-relation query made of filters,
//! equi-joins and self-joins. It estimates intermediate cardinalities from per-column
//! statistics and runs a memoized dynamic-programming search over connected relation
//! subsets, extending left-deep plans one base relation at a time.
//!
//! ## Module Overview
//!
//! - **`catalog`**: Catalog trait for column counts and baseline column statistics.
//! - **`predicate`**: FILTER / JOIN / SELFJOIN predicates as produced by the query parser.
//! - **`query`**: The query context (relations + predicates) and its validation.
//! - **`stats`**: Column statistics and the propagation formulas for filters and joins.
//! - **`cost`**: The scalar plan cost and the probe-column cost contribution.
//! - **`subset`**: Canonical relation sets, the join graph and the connected-subset lattice.
//! - **`join_tree`**: A candidate left-deep plan with its private statistics snapshot.
//! - **`memo`**: The memo table holding the cheapest plan per relation subset.
//! - **`search`**: The enumeration driver that ties everything together.
//! - **`error`**: Errors raised for malformed input.
//!
//! ## Example
//!
//! ```ignore
//! let mut query = QueryInfo::new(vec![0, 1], vec![Predicate::join(0, 0, 1, 0)]);
//! let report = JoinEnumerator::new(&catalog, SearchConfig::default()).optimize(&mut query)?;
//! ```

pub mod catalog;
pub mod cost;
pub mod error;
pub mod join_tree;
pub mod memo;
pub mod predicate;
pub mod query;
pub mod search;
pub mod stats;
pub mod subset;

/// Identifier of a base relation in the catalog.
pub type RelationId = u64;
