use exg::{Dfg, IntSet, IoSubgraph};
use rand::seq::SliceRandom;

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

fn sorted(set: &exg::vset::VSet<usize>) -> Vec<usize> {
    let mut v = set.to_vec();
    v.sort_unstable();
    v
}

/// The incremental input/output/weight bookkeeping must agree with a full
/// recomputation after any sequence of insertions and removals.
#[test]
fn incremental_io_matches_recomputation() {
    let dfg = lattice();
    let mut rng = rand::thread_rng();
    let ids: Vec<usize> = (0..dfg.num_nodes()).collect();

    let mut config = IoSubgraph::with_capacity(dfg.num_nodes());
    let mut members = IntSet::with_capacity(dfg.num_nodes());
    for _ in 0..300 {
        let &u = ids.choose(&mut rng).unwrap();
        if members.contains(u) {
            members.remove(u);
            config.remove(&dfg, u);
        } else {
            members.insert(u);
            config.insert(&dfg, u);
        }

        let fresh = IoSubgraph::from_nodes(&dfg, members.clone());
        assert_eq!(config.nodes(), fresh.nodes());
        assert_eq!(sorted(config.inputs()), sorted(fresh.inputs()));
        assert_eq!(sorted(config.outputs()), sorted(fresh.outputs()));
        assert!((config.weight() - fresh.weight()).abs() < 1e-9);
    }
}

#[test]
fn closure_detects_non_convex_sets() {
    let dfg = lattice();

    // 2 and 6 with the paths through 4 and 5 missing
    let mut nodes = IntSet::with_capacity(dfg.num_nodes());
    nodes.insert(2);
    nodes.insert(6);
    let config = IoSubgraph::from_nodes(&dfg, nodes.clone());
    let closure = config.closure(&dfg);
    assert_ne!(*config.nodes(), closure);
    assert!(closure.contains(4));
    assert!(closure.contains(5));

    // adding them back closes the set
    nodes.insert(4);
    nodes.insert(5);
    let config = IoSubgraph::from_nodes(&dfg, nodes);
    assert_eq!(*config.nodes(), config.closure(&dfg));
}

#[test]
fn interface_of_a_known_set() {
    let dfg = lattice();
    let mut nodes = IntSet::with_capacity(dfg.num_nodes());
    for u in [2, 4, 5] {
        nodes.insert(u);
    }
    let config = IoSubgraph::from_nodes(&dfg, nodes);
    // 0 and 1 feed 2, 3 feeds 5
    assert_eq!(sorted(config.inputs()), vec![0, 1, 3]);
    // 4 and 5 escape to 6, 5 to 7 as well
    assert_eq!(sorted(config.outputs()), vec![4, 5]);
    assert_eq!(config.num_in(), 3);
    assert_eq!(config.num_out(), 2);
    assert!((config.weight() - 3.0).abs() < 1e-9);
}

#[test]
fn weighted_updates_track_node_weights() {
    let mut dfg = lattice();
    *dfg.weight_mut(2) = 2.5;
    *dfg.weight_mut(5) = 0.5;

    let mut config = IoSubgraph::with_capacity(dfg.num_nodes());
    config.insert(&dfg, 2);
    assert!((config.weight() - 2.5).abs() < 1e-9);
    config.insert(&dfg, 5);
    assert!((config.weight() - 3.0).abs() < 1e-9);
    config.remove(&dfg, 2);
    assert!((config.weight() - 0.5).abs() < 1e-9);
}
