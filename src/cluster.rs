//! Serial clusters: linear 1-in/1-out chains that can be contracted to a
//! single synthetic edge during the refinement search and expanded back
//! when a result is recorded.

use crate::dfg::{Dfg, IoSubgraph};
use crate::intset::IntSet;
use crate::vs::vs_enumerate;

/// A serial region of the graph: `src` is its unique external predecessor,
/// `dst` the unique node receiving its value. `nodes` are the internal
/// members with their original weights, `edges` the internal edges removed
/// while the cluster is linked.
#[derive(Clone, Debug)]
pub struct SCluster {
    nodes: Vec<(usize, f64)>,
    edges: Vec<(usize, usize)>,
    src: usize,
    dst: usize,
}

impl SCluster {
    pub fn new(
        nodes: Vec<(usize, f64)>,
        edges: Vec<(usize, usize)>,
        src: usize,
        dst: usize,
    ) -> Self {
        SCluster {
            nodes,
            edges,
            src,
            dst,
        }
    }

    /// Pull the member nodes back into `config` if its `dst` is part of it.
    /// While the cluster is linked the members weigh nothing, so the
    /// config's cached weight is unchanged.
    pub fn expand(&self, dfg: &Dfg, config: &mut IoSubgraph) {
        if config.nodes().contains(self.dst) {
            for &(node, _) in &self.nodes {
                config.insert(dfg, node);
            }
        }
    }

    /// Inverse of [`SCluster::expand`].
    pub fn contract(&self, dfg: &Dfg, config: &mut IoSubgraph) {
        if config.nodes().contains(self.dst) {
            for &(node, _) in &self.nodes {
                config.remove(dfg, node);
            }
        }
    }

    pub fn src(&self) -> usize {
        self.src
    }

    pub fn dst(&self) -> usize {
        self.dst
    }

    pub fn nodes(&self) -> &[(usize, f64)] {
        &self.nodes
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }
}

/// Find the serial clusters of `dfg`: the subset-maximal convex subgraphs
/// with a single input and a single output and more than one node.
///
/// The (1, 1) enumeration guarantees a unique external predecessor and a
/// unique output node per surviving subgraph; this is asserted when
/// converting to the cluster record.
pub fn scluster_enumerate(dfg: &Dfg) -> Vec<SCluster> {
    let mut subgraphs: Vec<IoSubgraph> = Vec::new();
    vs_enumerate(dfg, 1, 1, &mut |subgraph: &IoSubgraph| {
        if subgraph.nodes().count_ones() == 1 {
            return;
        }
        for kept in &subgraphs {
            if subgraph.nodes().is_subset(kept.nodes()) {
                return;
            }
        }
        subgraphs.retain(|kept| !kept.nodes().is_subset(subgraph.nodes()));
        subgraphs.push(subgraph.clone());
    });

    let mut output = Vec::with_capacity(subgraphs.len());
    for subgraph in &subgraphs {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let mut vi = None;
        let mut vo = None;
        for u in subgraph.nodes().ones() {
            for &v in dfg.out_edges(u) {
                if subgraph.nodes().contains(v) {
                    edges.push((u, v));
                } else {
                    debug_assert!(vo.is_none() || vo == Some(u));
                    vo = Some(u);
                }
            }

            if vo != Some(u) {
                nodes.push((u, dfg.weight(u)));
            }

            for &v in dfg.in_edges(u) {
                if v >= dfg.num_nodes() || !subgraph.nodes().contains(v) {
                    edges.push((v, u));
                    debug_assert!(vi.is_none() || vi == Some(v));
                    vi = Some(v);
                }
            }
        }

        let (Some(src), Some(dst)) = (vi, vo) else {
            debug_assert!(false, "serial subgraph without src or dst");
            continue;
        };
        output.push(SCluster::new(nodes, edges, src, dst));
    }
    output
}

/// Find the single-node serial nodes of the subgraph given by `subgraph`
/// (a node set): nodes with exactly one in-edge coming from outside and one
/// out-edge staying inside, skipping nodes already acting as a cluster
/// `dst`. Degrees are taken from the current (possibly contracted) graph.
pub fn snode_enumerate(
    dfg: &Dfg,
    subgraph: &IntSet,
    s_clusters: &[SCluster],
) -> Vec<SCluster> {
    let mut nodes = subgraph.clone();
    for cluster in s_clusters {
        nodes.remove(cluster.dst());
    }

    let mut output = Vec::new();
    for i in nodes.ones() {
        if dfg.in_edges(i).len() == 1
            && dfg.out_edges(i).len() == 1
            && !subgraph.contains(dfg.in_edges(i)[0])
            && subgraph.contains(dfg.out_edges(i)[0])
        {
            let pred = dfg.in_edges(i)[0];
            let succ = dfg.out_edges(i)[0];
            output.push(SCluster::new(
                vec![(i, dfg.weight(i))],
                vec![(pred, i), (i, succ)],
                pred,
                succ,
            ));
        }
    }
    output
}
