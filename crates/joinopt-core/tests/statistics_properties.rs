//! Property-based tests for the estimation formulas and the search space.

use joinopt_core::catalog::InMemoryCatalog;
use joinopt_core::join_tree::{JoinTree, PlanContext};
use joinopt_core::predicate::{FilterOp, Predicate, PredicateKind};
use joinopt_core::query::QueryInfo;
use joinopt_core::search::{apply_local_predicates, optimize_query};
use joinopt_core::stats::{estimate_join, ColumnStats, StatsTable};
use joinopt_core::subset::{build_lattice, JoinGraph, RelationSet};
use proptest::prelude::*;

fn column_stats() -> impl Strategy<Value = ColumnStats> {
    (0u32..500, 0u32..500, 0u32..10_000, 0.0f64..=1.0).prop_map(|(low, width, rows, frac)| {
        let low = low as f64;
        let high = low + width as f64;
        let rows = rows as f64;
        let distinct = (rows.min(width as f64 + 1.0) * frac).floor();
        ColumnStats::new(low, high, rows, distinct)
    })
}

fn filter_op() -> impl Strategy<Value = FilterOp> {
    prop_oneof![Just(FilterOp::Eq), Just(FilterOp::Lt), Just(FilterOp::Gt)]
}

/// A chain query over `n` relations with two columns each, plus a few filters.
fn chain_query() -> impl Strategy<Value = (InMemoryCatalog, QueryInfo)> {
    (2usize..6).prop_flat_map(|n| {
        (
            prop::collection::vec(prop::collection::vec(column_stats(), 2), n),
            prop::collection::vec((0usize..2, 0usize..2), n - 1),
            prop::collection::vec((0..n, 0usize..2, filter_op(), 0u64..1000), 0..4),
            Just(n),
        )
            .prop_map(|(columns, joins, filters, n)| {
                let mut catalog = InMemoryCatalog::new();
                for (rel, cols) in columns.into_iter().enumerate() {
                    catalog.add_relation(rel as u64, cols);
                }
                let mut predicates: Vec<Predicate> = joins
                    .into_iter()
                    .enumerate()
                    .map(|(i, (lc, rc))| Predicate::join(i, lc, i + 1, rc))
                    .collect();
                predicates.extend(filters.into_iter().map(|(b, c, op, k)| Predicate::filter(b, c, op, k)));
                let relations = (0..n as u64).collect();
                (catalog, QueryInfo::new(relations, predicates))
            })
    })
}

proptest! {
    #[test]
    fn prop_range_filter_scales_by_covered_fraction(s in column_stats(), t in 0.0f64..=1.0) {
        prop_assume!(s.high > s.low);
        let k = s.low + t * (s.high - s.low);
        let lt = s.less_than(k);
        let gt = s.greater_than(k);
        let expected_lt = s.rows * (k - s.low) / (s.high - s.low);
        let expected_gt = s.rows * (s.high - k) / (s.high - s.low);
        prop_assert!((lt.rows - expected_lt).abs() <= 1e-6 * s.rows.max(1.0));
        prop_assert!((gt.rows - expected_gt).abs() <= 1e-6 * s.rows.max(1.0));
        let expected_lt_d = s.distinct * (k - s.low) / (s.high - s.low);
        let expected_gt_d = s.distinct * (s.high - k) / (s.high - s.low);
        prop_assert!((lt.distinct - expected_lt_d).abs() <= 1e-6 * s.distinct.max(1.0));
        prop_assert!((gt.distinct - expected_gt_d).abs() <= 1e-6 * s.distinct.max(1.0));
        prop_assert_eq!(lt.high, k);
        prop_assert_eq!(gt.low, k);
    }

    #[test]
    fn prop_filter_never_adds_rows(s in column_stats(), op in filter_op(), k in 0u32..1200) {
        let after = s.filter(op, k as f64);
        prop_assert!(after.rows <= s.rows);
        prop_assert!(after.distinct <= s.distinct.max(1.0));
        prop_assert!(after.rows >= 0.0);
    }

    #[test]
    fn prop_literal_outside_range_empties(s in column_stats(), op in filter_op(), gap in 1u32..100) {
        let below = s.low - gap as f64;
        let above = s.high + gap as f64;
        match op {
            FilterOp::Lt => {
                prop_assert!(s.less_than(below).is_empty());
                // a bound past the far end of the range keeps every row
                if s.high > s.low {
                    prop_assert_eq!(s.less_than(above), s);
                }
            }
            FilterOp::Gt => {
                prop_assert!(s.greater_than(above).is_empty());
                if s.high > s.low {
                    prop_assert_eq!(s.greater_than(below), s);
                }
            }
            FilterOp::Eq => {
                prop_assert!(s.equal_to(below).is_empty());
                prop_assert!(s.equal_to(above).is_empty());
            }
        }
    }

    #[test]
    fn prop_join_estimate_is_symmetric(a in column_stats(), b in column_stats()) {
        let ab = estimate_join(&a, &b);
        let ba = estimate_join(&b, &a);
        prop_assert_eq!(ab.rows, ba.rows);
        prop_assert_eq!(ab.distinct, ba.distinct);
        prop_assert_eq!((ab.low, ab.high), (ba.low, ba.high));
    }

    #[test]
    fn prop_apply_join_matches_preview(a in column_stats(), b in column_stats(), other in column_stats()) {
        let mut t = StatsTable::new();
        t.insert(0, vec![a, other]);
        t.insert(1, vec![b]);
        let preview = t.eval_join(0, 0, 1, 0);
        t.apply_join(0, 0, 1, 0, &[0]);
        prop_assert_eq!(t.get(0, 0), preview);
        prop_assert_eq!(t.get(1, 0), preview);
    }

    #[test]
    fn prop_apply_filter_matches_preview(
        a in column_stats(),
        other in column_stats(),
        op in filter_op(),
        k in 0u32..1200,
    ) {
        let mut t = StatsTable::new();
        t.insert(0, vec![a, other]);
        let preview = t.eval_filter(0, 0, op, k as f64);
        t.apply_filter(0, 0, op, k as f64, &[]);
        prop_assert_eq!(t.get(0, 0), preview);
    }

    #[test]
    fn prop_self_join_on_one_column_is_identity(a in column_stats(), b in column_stats(), col in 0usize..2) {
        let mut t = StatsTable::new();
        t.insert(3, vec![a, b]);
        let before = t.clone();
        t.apply_self_join(3, col, col);
        prop_assert_eq!(t, before);
    }

    #[test]
    fn prop_canonical_key_ignores_insertion_order(
        ids in prop::collection::vec(0u64..50, 1..10).prop_shuffle(),
    ) {
        let forward: RelationSet = ids.iter().copied().collect();
        let mut reversed = RelationSet::singleton(ids[ids.len() - 1]);
        for &id in ids.iter().rev() {
            reversed = reversed.with(id);
        }
        prop_assert_eq!(forward.canonical_key(), reversed.canonical_key());
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(forward.as_slice(), sorted.as_slice());
    }

    #[test]
    fn prop_lattice_holds_only_connected_subsets(
        n in 1u64..7,
        edges in prop::collection::vec((0u64..7, 0u64..7), 0..10),
    ) {
        let relations: Vec<u64> = (0..n).collect();
        let mut graph = JoinGraph::default();
        for (a, b) in edges.into_iter().filter(|&(a, b)| a < n && b < n && a != b) {
            graph.add_edge(a, b);
        }
        let lattice = build_lattice(&relations, &graph, 10_000).unwrap();
        prop_assert!(lattice.iter().all(|s| graph.is_connected(s)));

        let keys: std::collections::HashSet<_> = lattice.iter().map(RelationSet::canonical_key).collect();
        prop_assert_eq!(keys.len(), lattice.len());

        let full: RelationSet = relations.iter().copied().collect();
        prop_assert_eq!(keys.contains(&full.canonical_key()), graph.is_connected(&full));
    }

    #[test]
    fn prop_extension_never_lowers_cost((catalog, query) in chain_query()) {
        let bound = query.bind(&catalog).unwrap();
        let mut baseline = StatsTable::from_catalog(&catalog, &query.relations).unwrap();
        apply_local_predicates(&mut baseline, &bound);
        let ctx = PlanContext { predicates: &bound, baseline: &baseline };

        let mut tree = JoinTree::leaf(query.relations[0], ctx);
        for &rel in &query.relations[1..] {
            let child = JoinTree::extend(&tree, rel, ctx);
            prop_assert!(child.cost() >= tree.cost());
            prop_assert!(child.last_predicate() >= tree.last_predicate());
            tree = child;
        }
        prop_assert_eq!(tree.last_predicate(), query.predicates.len());
    }

    #[test]
    fn prop_optimize_permutes_predicates((catalog, query) in chain_query()) {
        let mut optimized = query.clone();
        optimize_query(&catalog, &mut optimized).unwrap();
        prop_assert_eq!(&optimized.relations, &query.relations);

        let mut before: Vec<_> = query.predicates.iter().map(|p| p.to_string()).collect();
        let mut after: Vec<_> = optimized.predicates.iter().map(|p| p.to_string()).collect();
        before.sort();
        after.sort();
        prop_assert_eq!(before, after);

        let first_join = optimized
            .predicates
            .iter()
            .position(|p| p.kind() == PredicateKind::Join)
            .unwrap_or(optimized.predicates.len());
        prop_assert!(optimized.predicates[first_join..].iter().all(|p| p.kind() == PredicateKind::Join));
    }
}
