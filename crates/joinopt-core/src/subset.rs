//! # Relation Subsets and the Join Graph
//!
//! The search space is the set of *connected* relation subsets: subsets whose
//! relations are linked by JOIN predicates without needing a cross product.
//!
//! ## Canonical Keys
//!
//! A `RelationSet` keeps its ids ascending and duplicate-free, so the same set always
//! serializes to the same dash-joined key (`"0-2-5"`) regardless of the order in which
//! its relations were added. The key indexes the memo table.
//!
//! ## Lattice Construction
//!
//! Subsets are discovered layer by layer. Layer 1 holds the singletons; layer `k + 1`
//! holds every subset obtained by adding a connected relation to a subset of layer
//! `k`. Each subset is recorded once, under its first discovery, so processing the
//! lattice in discovery order visits every proper subset before its supersets.
//! Construction stops as soon as a layer produces nothing new.

use crate::error::{OptimizeError, Result};
use crate::query::BoundPredicate;
use crate::RelationId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::trace;

/// An ascending, duplicate-free set of relation ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationSet(Vec<RelationId>);

impl RelationSet {
    pub fn singleton(relation: RelationId) -> Self {
        Self(vec![relation])
    }

    /// A copy of the set with `relation` inserted in order.
    pub fn with(&self, relation: RelationId) -> Self {
        let mut ids = self.0.clone();
        if let Err(pos) = ids.binary_search(&relation) {
            ids.insert(pos, relation);
        }
        Self(ids)
    }

    pub fn contains(&self, relation: RelationId) -> bool {
        self.0.binary_search(&relation).is_ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[RelationId] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = RelationId> + '_ {
        self.0.iter().copied()
    }

    /// Ascending, dash-joined encoding of the set.
    pub fn canonical_key(&self) -> String {
        self.0
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl FromIterator<RelationId> for RelationSet {
    fn from_iter<I: IntoIterator<Item = RelationId>>(iter: I) -> Self {
        let mut ids: Vec<_> = iter.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }
}

impl fmt::Display for RelationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_key())
    }
}

/// Undirected graph with relations as nodes and JOIN predicates as edges.
#[derive(Debug, Clone, Default)]
pub struct JoinGraph {
    edges: HashMap<RelationId, HashSet<RelationId>>,
}

impl JoinGraph {
    pub fn from_predicates(predicates: &[BoundPredicate]) -> Self {
        let mut graph = Self::default();
        for (left, _, right, _) in predicates.iter().filter_map(BoundPredicate::join_sides) {
            graph.add_edge(left, right);
        }
        graph
    }

    pub fn add_edge(&mut self, a: RelationId, b: RelationId) {
        self.edges.entry(a).or_default().insert(b);
        self.edges.entry(b).or_default().insert(a);
    }

    pub fn has_edge(&self, a: RelationId, b: RelationId) -> bool {
        self.edges.get(&a).is_some_and(|n| n.contains(&b))
    }

    /// True when some JOIN predicate links `relation` to a member of `set`.
    pub fn is_connected_to(&self, set: &RelationSet, relation: RelationId) -> bool {
        self.edges
            .get(&relation)
            .is_some_and(|n| n.iter().any(|&m| m != relation && set.contains(m)))
    }

    /// True when the subgraph induced by `set` is connected.
    pub fn is_connected(&self, set: &RelationSet) -> bool {
        let mut ids = set.iter();
        let Some(first) = ids.next() else {
            return true;
        };
        let mut reached = RelationSet::singleton(first);
        let mut frontier = vec![first];
        while let Some(rel) = frontier.pop() {
            for next in set.iter() {
                if !reached.contains(next) && self.has_edge(rel, next) {
                    reached = reached.with(next);
                    frontier.push(next);
                }
            }
        }
        reached.len() == set.len()
    }
}

/// Enumerate every connected subset of `relations`, in discovery order.
///
/// Fails with `SearchSpaceExceeded` once more than `limit` subsets are found.
pub fn build_lattice(relations: &[RelationId], graph: &JoinGraph, limit: usize) -> Result<Vec<RelationSet>> {
    let mut lattice: Vec<RelationSet> = relations.iter().map(|&r| RelationSet::singleton(r)).collect();
    let mut seen: HashSet<String> = lattice.iter().map(RelationSet::canonical_key).collect();
    if lattice.len() > limit {
        return Err(OptimizeError::SearchSpaceExceeded { limit });
    }

    let mut start = 0;
    loop {
        let end = lattice.len();
        for i in start..end {
            let current = lattice[i].clone();
            for &rel in relations {
                if current.contains(rel) || !graph.is_connected_to(&current, rel) {
                    continue;
                }
                let next = current.with(rel);
                if seen.insert(next.canonical_key()) {
                    trace!("Discovered subset {} from {}", next, current);
                    lattice.push(next);
                    if lattice.len() > limit {
                        return Err(OptimizeError::SearchSpaceExceeded { limit });
                    }
                }
            }
        }
        if lattice.len() == end {
            break;
        }
        start = end;
    }
    Ok(lattice)
}
