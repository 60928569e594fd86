use exg::{dfs_postorder, Dfg};

#[test]
fn reverse_postorder_is_topological() {
    let dfg = Dfg::from_edges(&[
        (0, 4),
        (1, 4),
        (1, 5),
        (1, 6),
        (4, 2),
        (5, 2),
        (5, 3),
        (6, 0),
        (6, 3),
    ]);

    let mut order = Vec::new();
    dfs_postorder(&dfg, |u| order.push(u));
    order.reverse();
    assert_eq!(order, vec![1, 6, 5, 3, 0, 4, 2]);
}

#[test]
fn index_computes_transitive_closures() {
    // 0 -> 1 -> 2 -> 4, 1 -> 3 -> 4
    let dfg = Dfg::from_edges(&[(0, 1), (1, 2), (1, 3), (2, 4), (3, 4)]);

    assert_eq!(dfg.pred(0).ones().count(), 0);
    assert_eq!(dfg.pred(4).ones().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    assert_eq!(dfg.succ(0).ones().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    assert_eq!(dfg.succ(2).ones().collect::<Vec<_>>(), vec![4]);
    assert_eq!(dfg.pred(3).ones().collect::<Vec<_>>(), vec![0, 1]);

    // sources and sinks are implicitly forbidden
    assert_eq!(dfg.forbidden().ones().collect::<Vec<_>>(), vec![0, 4]);
}

#[test]
fn deep_chain_does_not_overflow() {
    let edges: Vec<(usize, usize)> = (0..10_000).map(|i| (i, i + 1)).collect();
    let dfg = Dfg::from_edges(&edges);
    assert_eq!(dfg.pred(10_000).count_ones(), 10_000);
    assert_eq!(dfg.succ(0).count_ones(), 10_000);
}
