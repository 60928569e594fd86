use std::collections::BTreeSet;

use exg::{vs_enumerate, Dfg, IntSet, IoSubgraph};

/// Two sources feeding a three-node layer combined into one node.
fn fan() -> Dfg {
    Dfg::from_edges(&[
        (0, 2),
        (0, 3),
        (1, 3),
        (1, 4),
        (2, 5),
        (3, 5),
        (4, 5),
        (5, 6),
    ])
}

fn chain() -> Dfg {
    Dfg::from_edges(&[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)])
}

fn lattice() -> Dfg {
    Dfg::from_edges(&[
        (0, 2),
        (1, 2),
        (1, 3),
        (2, 4),
        (2, 5),
        (3, 5),
        (4, 6),
        (5, 6),
        (5, 7),
        (6, 8),
        (7, 8),
        (8, 9),
    ])
}

/// Oracle: every non-empty, forbidden-free, convex, I/O-bounded node set,
/// by exhaustive subset enumeration.
fn valid_subgraphs(dfg: &Dfg, max_num_in: usize, max_num_out: usize) -> BTreeSet<Vec<usize>> {
    let n = dfg.num_nodes();
    assert!(n <= 16);
    let forbidden = dfg.forbidden();
    let mut result = BTreeSet::new();
    for mask in 1u32..(1u32 << n) {
        let mut nodes = IntSet::with_capacity(n);
        for u in 0..n {
            if mask & (1 << u) != 0 {
                nodes.insert(u);
            }
        }
        if nodes.intersects(&forbidden) {
            continue;
        }
        let config = IoSubgraph::from_nodes(dfg, nodes.clone());
        if *config.nodes() != config.closure(dfg) {
            continue;
        }
        if config.num_in() > max_num_in || config.num_out() > max_num_out {
            continue;
        }
        result.insert(nodes.ones().collect());
    }
    result
}

fn enumerated(dfg: &Dfg, max_num_in: usize, max_num_out: usize) -> BTreeSet<Vec<usize>> {
    let mut result = BTreeSet::new();
    vs_enumerate(dfg, max_num_in, max_num_out, &mut |subgraph: &IoSubgraph| {
        result.insert(subgraph.nodes().ones().collect());
    });
    result
}

fn assert_matches_oracle(dfg: &Dfg) {
    for (max_num_in, max_num_out) in [(1, 1), (2, 1), (2, 2), (3, 2), (4, 4)] {
        assert_eq!(
            enumerated(dfg, max_num_in, max_num_out),
            valid_subgraphs(dfg, max_num_in, max_num_out),
            "bounds ({max_num_in}, {max_num_out})"
        );
    }
}

#[test]
fn fan_matches_oracle() {
    assert_matches_oracle(&fan());
}

#[test]
fn chain_matches_oracle() {
    assert_matches_oracle(&chain());
}

#[test]
fn lattice_matches_oracle() {
    assert_matches_oracle(&lattice());
}

#[test]
fn emitted_subgraphs_are_convex_and_bounded() {
    let dfg = lattice();
    let forbidden = dfg.forbidden();
    let mut seen = 0;
    vs_enumerate(&dfg, 2, 2, &mut |subgraph: &IoSubgraph| {
        seen += 1;
        assert_eq!(*subgraph.nodes(), subgraph.closure(&dfg));
        assert!(!subgraph.nodes().intersects(&forbidden));
        assert!(subgraph.num_in() <= 2);
        assert!(subgraph.num_out() <= 2);
    });
    assert!(seen > 0);
}

#[test]
fn explicitly_forbidden_nodes_are_excluded() {
    let mut dfg = lattice();
    dfg.set_forbidden(5);
    assert_matches_oracle(&dfg);
    vs_enumerate(&dfg, 4, 4, &mut |subgraph: &IoSubgraph| {
        assert!(!subgraph.nodes().contains(5));
    });
}
