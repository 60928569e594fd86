use exg::cluster::{scluster_enumerate, snode_enumerate};
use exg::Dfg;

fn chain() -> Dfg {
    Dfg::from_edges(&[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)])
}

fn pendant() -> Dfg {
    Dfg::from_edges(&[
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 4),
        (4, 5),
        (2, 6),
        (6, 7),
    ])
}

#[test]
fn chain_collapses_to_one_cluster() {
    let dfg = chain();
    let clusters = scluster_enumerate(&dfg);
    assert_eq!(clusters.len(), 1);

    let cluster = &clusters[0];
    assert_eq!(cluster.src(), 0);
    assert_eq!(cluster.dst(), 4);
    let mut members: Vec<usize> = cluster.nodes().iter().map(|&(u, _)| u).collect();
    members.sort_unstable();
    assert_eq!(members, vec![1, 2, 3]);
    // internal chain edges plus the edge from the external predecessor
    let mut edges = cluster.edges().to_vec();
    edges.sort_unstable();
    assert_eq!(edges, vec![(0, 1), (1, 2), (2, 3), (3, 4)]);
}

#[test]
fn pendant_splits_into_two_clusters() {
    let dfg = pendant();
    let mut clusters = scluster_enumerate(&dfg);
    clusters.sort_by_key(|cluster| cluster.src());
    assert_eq!(clusters.len(), 2);

    assert_eq!(clusters[0].src(), 0);
    assert_eq!(clusters[0].dst(), 2);
    assert_eq!(
        clusters[0].nodes().iter().map(|&(u, _)| u).collect::<Vec<_>>(),
        vec![1]
    );

    assert_eq!(clusters[1].src(), 2);
    assert_eq!(clusters[1].dst(), 4);
    assert_eq!(
        clusters[1].nodes().iter().map(|&(u, _)| u).collect::<Vec<_>>(),
        vec![3]
    );
}

#[test]
fn serial_nodes_need_external_pred_and_internal_succ() {
    let dfg = chain();
    let mut subgraph = exg::IntSet::with_capacity(dfg.num_nodes());
    for u in 1..=4 {
        subgraph.insert(u);
    }

    // without clusters, only node 1 qualifies: its predecessor 0 is
    // outside, its successor 2 inside
    let snodes = snode_enumerate(&dfg, &subgraph, &[]);
    assert_eq!(snodes.len(), 1);
    assert_eq!(snodes[0].nodes()[0].0, 1);
    assert_eq!(snodes[0].src(), 0);
    assert_eq!(snodes[0].dst(), 2);

    // with the chain cluster present, its dst is skipped and node 1 is
    // still the only candidate
    let clusters = scluster_enumerate(&dfg);
    let snodes = snode_enumerate(&dfg, &subgraph, &clusters);
    assert_eq!(snodes.len(), 1);
    assert_eq!(snodes[0].nodes()[0].0, 1);
}
