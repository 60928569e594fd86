//! Maximal valid subgraph search.
//!
//! Candidate generation partitions the non-forbidden nodes into
//! *V-clusters* (classes of nodes with identical permissible-predecessor
//! sets), builds the compatibility graph of the clusters and enumerates its
//! maximal independent sets: every MIS, read back as the union of its
//! clusters' member nodes, is a candidate superset of a maximal valid
//! subgraph. Each candidate is then refined by a branch-and-bound that
//! drops nodes until the input/output bounds hold, giving away as little
//! weight as possible.
//!
//! During refinement, serial chains of the graph can be contracted to a
//! single synthetic edge (see [`crate::cluster`]); the contraction mutates
//! the graph and is always reverted before the enclosing scope returns.

use serde_json::json;

use crate::analysis::{sum_smallest, IoAnalysis};
use crate::cluster::{scluster_enumerate, snode_enumerate, SCluster};
use crate::dfg::{Dfg, IoSubgraph};
use crate::graph::{enumerate_mis, enumerate_mis_bk, Graph, MisVisitor};
use crate::intset::IntSet;
use crate::report::{fp_eq, progress, subgraph_json};

const USE_BK: bool = false;

/// How the single-result refinement sweeps the deletion budget.
///
/// All three produce the same `io_weight` on terminating inputs; they
/// differ only in the number of search calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IterType {
    /// Try budgets 1, 2, … and stop at the first feasible one.
    Linear,
    /// Try the largest budget first and walk down while feasible.
    #[default]
    LinearRev,
    /// Binary-search the smallest feasible budget.
    BinarySearch,
}

/// An equivalence class of nodes sharing one permissible-predecessor set.
#[derive(Clone, Debug)]
pub struct VCluster {
    pub nodes: Vec<usize>,
    p: IntSet,
}

impl VCluster {
    fn new(p: IntSet) -> Self {
        VCluster {
            nodes: Vec::new(),
            p,
        }
    }

    /// The permissible-predecessor set shared by the member nodes.
    pub fn p(&self) -> &IntSet {
        &self.p
    }
}

/// A candidate subgraph together with its refinement state.
#[derive(Clone, Debug)]
pub struct Mvs {
    pub subgraph: IoSubgraph,
    /// Set when the best refinement within bounds was a disconnected one.
    pub disconnected: bool,
    /// Best weight achieved within the I/O bounds so far.
    pub io_weight: i64,
}

impl Mvs {
    fn new(subgraph: IoSubgraph) -> Self {
        Mvs {
            subgraph,
            disconnected: false,
            io_weight: 0,
        }
    }
}

fn is_source(dfg: &Dfg, config: &IntSet, u: usize) -> bool {
    !dfg
        .in_edges(u)
        .iter()
        .any(|&v| v < dfg.num_nodes() && config.contains(v))
}

fn is_sink(dfg: &Dfg, config: &IntSet, u: usize) -> bool {
    !dfg.out_edges(u).iter().any(|&v| config.contains(v))
}

fn link_cluster(dfg: &mut Dfg, clustered: &mut IntSet, cluster: &SCluster) {
    for &(u, v) in cluster.edges() {
        dfg.remove_edge(u, v);
    }
    dfg.add_edge(cluster.src(), cluster.dst());
    for &(node, weight) in cluster.nodes() {
        clustered.insert(node);
        *dfg.weight_mut(cluster.dst()) += weight;
        *dfg.weight_mut(node) = 0.0;
    }
}

fn unlink_cluster(dfg: &mut Dfg, clustered: &mut IntSet, cluster: &SCluster) {
    dfg.remove_edge(cluster.src(), cluster.dst());
    for &(u, v) in cluster.edges() {
        dfg.add_edge(u, v);
    }
    for &(node, weight) in cluster.nodes() {
        clustered.remove(node);
        *dfg.weight_mut(cluster.dst()) -= weight;
        *dfg.weight_mut(node) = weight;
    }
}

struct CandidateCollector<'d> {
    dfg: &'d Dfg,
    v_clusters: &'d [VCluster],
    config: IoSubgraph,
    candidates: Vec<Mvs>,
}

impl MisVisitor for CandidateCollector<'_> {
    fn mis(&mut self, _set: &IntSet) {
        self.candidates.push(Mvs::new(self.config.clone()));
    }

    fn update(&mut self, _set: &IntSet, id: usize, added: bool) {
        for &v in &self.v_clusters[id].nodes {
            if added {
                self.config.insert(self.dfg, v);
            } else {
                self.config.remove(self.dfg, v);
            }
        }
    }
}

/// The enumeration driver.
///
/// Construction does all candidate generation; [`MvsFinder::enumerate`]
/// refines the candidates under the given bounds. The graph is borrowed
/// mutably for the lifetime of the finder because serial-cluster
/// contraction edits it in place; every edit is undone before `enumerate`
/// returns.
pub struct MvsFinder<'a> {
    dfg: &'a mut Dfg,
    s_clusters: Vec<SCluster>,
    s_nodes: Vec<SCluster>,
    mvs_vec: Vec<Mvs>,
    config: IoSubgraph,
    itype: IterType,
    flags: u8,
    nodes_left: IntSet,
    clustered: IntSet,
    count: usize,
    calls: usize,
    pruned: [usize; 3],
}

impl<'a> MvsFinder<'a> {
    pub fn new(dfg: &'a mut Dfg) -> Self {
        let num_nodes = dfg.num_nodes();
        let forbidden = dfg.forbidden();

        // compute P sets and group nodes into equivalence classes
        let mut v_clusters: Vec<VCluster> = Vec::new();
        let mut class_of = vec![0usize; num_nodes];
        let mut p = IntSet::with_capacity(num_nodes);
        for u in 0..num_nodes {
            if forbidden.contains(u) {
                continue;
            }
            for v in 0..num_nodes {
                // v is permissible iff no forbidden node sits on a path
                // between the cones of u and v
                if !forbidden.contains(v)
                    && !forbidden.intersects_intersection(dfg.pred(u), dfg.succ(v))
                    && !forbidden.intersects_intersection(dfg.succ(u), dfg.pred(v))
                {
                    p.insert(v);
                }
            }

            let class_id = match v_clusters.iter().position(|cluster| p == cluster.p) {
                Some(id) => id,
                None => {
                    v_clusters.push(VCluster::new(p.clone()));
                    v_clusters.len() - 1
                }
            };
            p.clear();
            v_clusters[class_id].nodes.push(u);
            class_of[u] = class_id;
        }

        // adjacency of the cluster graph, then complement it so that a MIS
        // is a maximal set of pairwise compatible clusters
        let num_clusters = v_clusters.len();
        let mut v_graph = Graph::with_nodes(num_clusters);
        for i in 0..num_clusters {
            for v in v_clusters[i].p.ones() {
                if class_of[v] != i {
                    v_graph.add_edge(i, class_of[v]);
                }
            }
        }
        v_graph.invert();

        let mut collector = CandidateCollector {
            dfg: &*dfg,
            v_clusters: &v_clusters,
            config: IoSubgraph::with_capacity(num_nodes),
            candidates: Vec::new(),
        };
        if !USE_BK {
            // the exhaustive search starts from the full set, so the
            // mirrored node config starts full as well
            for i in 0..num_nodes {
                if !forbidden.contains(i) {
                    collector.config.insert(collector.dfg, i);
                }
            }
        }
        let stats = if USE_BK {
            enumerate_mis_bk(&v_graph, &mut collector)
        } else {
            enumerate_mis(&v_graph, &mut collector)
        };
        let CandidateCollector {
            config,
            mut candidates,
            ..
        } = collector;

        let s_clusters = scluster_enumerate(dfg);
        let num_cluster_nodes: usize = s_clusters.iter().map(|c| c.nodes().len()).sum();
        progress(&json!({
            "calls": stats.calls,
            "num_clusters": num_clusters,
            "num_mvs-c": stats.count,
            "num_s-cluster-nodes": num_cluster_nodes,
        }));

        candidates.sort_by(|a, b| b.subgraph.weight().total_cmp(&a.subgraph.weight()));

        MvsFinder {
            dfg,
            s_clusters,
            s_nodes: Vec::new(),
            mvs_vec: candidates,
            config,
            itype: IterType::default(),
            flags: 0xff,
            nodes_left: IntSet::with_capacity(num_nodes),
            clustered: IntSet::with_capacity(num_nodes),
            count: 0,
            calls: 0,
            pruned: [0; 3],
        }
    }

    /// The weight-optimal refinements of all candidates under the given
    /// bounds, sorted by weight descending. Results within 1% of the
    /// maximum weight are treated as ties and retained.
    pub fn enumerate(
        &mut self,
        max_num_in: usize,
        max_num_out: usize,
        itype: IterType,
        flags: u8,
    ) -> Vec<IoSubgraph> {
        self.itype = itype;
        self.flags = flags;
        progress(&json!({
            "num_inputs": max_num_in,
            "num_outputs": max_num_out,
            "flags": flags,
        }));

        let mut output: Vec<IoSubgraph> = Vec::new();
        let mut max_io_weight: i64 = 0;
        let mut mvs_vec = std::mem::take(&mut self.mvs_vec);

        for mvsc in &mut mvs_vec {
            progress(&json!({
                "enum": false,
                "max_io_weight": max_io_weight,
                "mvs": subgraph_json(&mvsc.subgraph),
            }));
            let target = if self.flags & (1 << 5) != 0 {
                max_io_weight
            } else {
                0
            };
            if mvsc.subgraph.weight() >= target as f64 {
                if mvsc.subgraph.num_in() > max_num_in || mvsc.subgraph.num_out() > max_num_out
                {
                    self.find_mvsio(mvsc, true, target, max_num_in, max_num_out, &mut output);
                } else {
                    mvsc.io_weight = mvsc.subgraph.weight() as i64;
                }
                max_io_weight = max_io_weight.max(mvsc.io_weight);
            }
            progress(&json!({ "io_weight": mvsc.io_weight }));
        }

        for mvsc in &mut mvs_vec {
            if mvsc.io_weight == max_io_weight {
                progress(&json!({
                    "enum": true,
                    "max_io_weight": max_io_weight,
                    "mvs": subgraph_json(&mvsc.subgraph),
                }));
                if (mvsc.io_weight as f64) < mvsc.subgraph.weight() {
                    self.find_mvsio(
                        mvsc,
                        false,
                        max_io_weight,
                        max_num_in,
                        max_num_out,
                        &mut output,
                    );
                } else {
                    output.push(mvsc.subgraph.clone());
                }
            }
        }
        self.mvs_vec = mvs_vec;

        let mut max_weight: f64 = 0.0;
        for subgraph in &output {
            if subgraph.weight() > max_weight && !fp_eq(subgraph.weight(), max_weight, 0.01) {
                max_weight = subgraph.weight();
            }
        }
        output.retain(|subgraph| {
            !(max_weight > subgraph.weight() && !fp_eq(subgraph.weight(), max_weight, 0.01))
        });
        output.sort_by(|a, b| b.weight().total_cmp(&a.weight()));
        output
    }

    fn find_mvsio(
        &mut self,
        mvs: &mut Mvs,
        single: bool,
        mut max_io_weight: i64,
        max_num_in: usize,
        max_num_out: usize,
        io_output: &mut Vec<IoSubgraph>,
    ) {
        if self.flags & (1 << 4) == 0 {
            mvs.io_weight =
                self.find_mvsio_(mvs, single, max_io_weight, max_num_in, max_num_out, io_output);
            return;
        }

        // from here on every link is undone before return; the only exits
        // from this scope are at the bottom, past the unlink loops
        for cluster in &self.s_clusters {
            link_cluster(&mut *self.dfg, &mut self.clustered, cluster);
        }

        let mut s_weights: Vec<f64> = Vec::new();
        let mut s_node_input_delta: usize = 1;
        if single || !mvs.disconnected {
            self.s_nodes = snode_enumerate(&*self.dfg, mvs.subgraph.nodes(), &self.s_clusters);
            for cluster in &self.s_nodes {
                link_cluster(&mut *self.dfg, &mut self.clustered, cluster);
                s_weights.push(cluster.nodes()[0].1);
                if self.dfg.out_edges(cluster.src()).len() > 1 {
                    s_node_input_delta = 0;
                }
            }
            s_weights.sort_by(|a, b| b.total_cmp(a));
        }

        mvs.io_weight =
            self.find_mvsio_(mvs, single, max_io_weight, max_num_in, max_num_out, io_output);
        max_io_weight = max_io_weight.max(mvs.io_weight);

        // a disconnected result can beat the connected one: spend one
        // output (and possibly one input) per detached serial node and see
        // whether the remainder still reaches the target
        if single && max_num_out > 1 && !self.s_nodes.is_empty() {
            let mut m = (max_num_out - 1).min(self.s_nodes.len());
            if s_node_input_delta == 1 {
                m = m.min(max_num_in.saturating_sub(1));
            }
            let sum: f64 = s_weights.iter().take(m).sum();
            let mut psum = 0.0;
            let mut cur_num_in = max_num_in;
            let mut cur_num_out = max_num_out;
            for i in 0..m {
                cur_num_in -= s_node_input_delta;
                cur_num_out -= 1;
                psum += s_weights[i];
                let io_weight = self.find_mvsio_(
                    mvs,
                    true,
                    (max_io_weight as f64 - sum) as i64,
                    cur_num_in,
                    cur_num_out,
                    io_output,
                );
                if io_weight as f64 + psum >= mvs.io_weight as f64 {
                    mvs.disconnected = true;
                    break;
                }
                if (io_weight as f64) + sum < mvs.io_weight as f64 {
                    break;
                }
            }
        }

        for cluster in &self.s_nodes {
            unlink_cluster(&mut *self.dfg, &mut self.clustered, cluster);
        }
        self.s_nodes = Vec::new();

        if single && mvs.disconnected {
            mvs.io_weight =
                self.find_mvsio_(mvs, true, max_io_weight, max_num_in, max_num_out, io_output);
        }

        for cluster in &self.s_clusters {
            unlink_cluster(&mut *self.dfg, &mut self.clustered, cluster);
        }
    }

    fn find_mvsio_(
        &mut self,
        mvs: &mut Mvs,
        single: bool,
        max_io_weight: i64,
        max_num_in: usize,
        max_num_out: usize,
        io_output: &mut Vec<IoSubgraph>,
    ) -> i64 {
        self.nodes_left = mvs.subgraph.nodes().clone();
        self.nodes_left.difference_with(&self.clustered);
        self.config.assign(&*self.dfg, &self.nodes_left);

        let iweight = mvs.subgraph.weight().ceil() as i64;
        let max_dels = iweight - max_io_weight;
        progress(&json!({
            "connected": !mvs.disconnected,
            "enum": !single,
            "num_inputs": max_num_in,
            "num_outputs": max_num_out,
            "num_s-nodes": self.s_nodes.len(),
        }));

        if single {
            let mut io_weight: i64 = 0;
            match self.itype {
                IterType::Linear => {
                    let mut dels = 1;
                    while dels <= max_dels {
                        self.reset_stats();
                        self.visit(
                            dels as f64,
                            true,
                            &mut io_weight,
                            max_num_in,
                            max_num_out,
                            io_output,
                        );
                        self.dump_stats(iweight - dels);
                        if self.count > 0 {
                            break;
                        }
                        dels += 1;
                    }
                }
                IterType::LinearRev => {
                    let mut dels = max_dels;
                    while dels >= 1 {
                        self.reset_stats();
                        self.visit(
                            dels as f64,
                            true,
                            &mut io_weight,
                            max_num_in,
                            max_num_out,
                            io_output,
                        );
                        self.dump_stats(iweight - dels);
                        if self.count == 0 {
                            break;
                        }
                        dels -= 1;
                    }
                }
                IterType::BinarySearch => {
                    let mut low = 1;
                    let mut high = max_dels;
                    while high >= low {
                        let dels = (low + high) / 2;
                        self.reset_stats();
                        self.visit(
                            dels as f64,
                            true,
                            &mut io_weight,
                            max_num_in,
                            max_num_out,
                            io_output,
                        );
                        self.dump_stats(iweight - dels);
                        if self.count > 0 {
                            high = dels - 1;
                        } else {
                            low = dels + 1;
                        }
                    }
                }
            }
            io_weight
        } else {
            self.reset_stats();
            let mut max_weight = max_io_weight;
            self.visit(
                max_dels as f64,
                false,
                &mut max_weight,
                max_num_in,
                max_num_out,
                io_output,
            );
            self.dump_stats(max_io_weight);
            max_io_weight
        }
    }

    fn visit(
        &mut self,
        dels: f64,
        single: bool,
        max_weight: &mut i64,
        max_num_in: usize,
        max_num_out: usize,
        io_output: &mut Vec<IoSubgraph>,
    ) {
        self.calls += 1;

        if dels < 0.0 || (self.count > 0 && single) {
            return;
        }

        if self.config.num_in() <= max_num_in && self.config.num_out() <= max_num_out {
            let weight = self.config.weight();
            let iweight = weight as i64;
            let dfg: &Dfg = &*self.dfg;
            for cluster in &self.s_clusters {
                cluster.expand(dfg, &mut self.config);
            }
            for cluster in &self.s_nodes {
                cluster.expand(dfg, &mut self.config);
            }

            if single {
                self.count += 1;
                *max_weight = (*max_weight).max(iweight);
            } else if iweight == *max_weight
                && !io_output.iter().any(|m| m.nodes() == self.config.nodes())
            {
                self.count += 1;
                io_output.push(self.config.clone());
            }

            for cluster in &self.s_clusters {
                cluster.contract(dfg, &mut self.config);
            }
            for cluster in &self.s_nodes {
                cluster.contract(dfg, &mut self.config);
            }
            return;
        }

        let mut analysis = IoAnalysis::new(&*self.dfg, &self.config, &self.nodes_left);

        let mut prune = false;
        let mut required_dels_in: i64 = 0;
        let mut required_dels_out: i64 = 0;
        if self.config.num_in() > max_num_in {
            let over = self.config.num_in() - max_num_in;
            if analysis.num_perm_in() > max_num_in {
                if self.flags & (1 << 1) != 0 {
                    self.pruned[0] += 1;
                    prune = true;
                }
            } else {
                required_dels_in = sum_smallest(analysis.inputs_mut(), over).ceil() as i64;
            }
        }
        if self.config.num_out() > max_num_out {
            if analysis.num_perm_out() > max_num_out {
                if self.flags & (1 << 2) != 0 {
                    self.pruned[1] += 1;
                    prune = true;
                }
            } else {
                required_dels_out = (self.config.num_out() - max_num_out) as i64;
            }
        }

        let num_shared = (analysis.num_shared_non_perm_out() as i64)
            .min(required_dels_in)
            .min(required_dels_out);
        let mut rnodes_weight = 0.0;
        if !prune {
            rnodes_weight = sum_smallest(
                analysis.rnodes_mut(),
                (required_dels_in + required_dels_out - num_shared) as usize,
            );
        }

        if self.flags & (1 << 3) != 0 && rnodes_weight > dels {
            self.pruned[2] += 1;
            prune = true;
        }

        if prune {
            return;
        }

        let Some(id) = self.find_best_recursion_node(
            max_num_in,
            max_num_out,
            analysis.num_perm_in(),
            analysis.num_perm_out(),
        ) else {
            return;
        };

        self.nodes_left.remove(id);

        self.config.remove(&*self.dfg, id);
        let id_weight = self.dfg.weight(id);
        self.visit(
            dels - id_weight,
            single,
            max_weight,
            max_num_in,
            max_num_out,
            io_output,
        );

        self.config.insert(&*self.dfg, id);
        self.visit(dels, single, max_weight, max_num_in, max_num_out, io_output);

        self.nodes_left.insert(id);
    }

    /// Among the undecided nodes that are a source or a sink relative to
    /// the current config, pick the one whose removal makes the most
    /// interface nodes permanent; the tighter of the two budgets dominates
    /// the comparison.
    fn find_best_recursion_node(
        &mut self,
        max_num_in: usize,
        max_num_out: usize,
        num_perm_in: usize,
        num_perm_out: usize,
    ) -> Option<usize> {
        let mut best: Option<(usize, (i64, i64))> = None;
        let mut cursor = self.nodes_left.minimum();
        while let Some(u) = cursor {
            let source = is_source(&*self.dfg, self.config.nodes(), u);
            let sink = is_sink(&*self.dfg, self.config.nodes(), u);

            if source || sink {
                self.nodes_left.remove(u);
                let mut delta = (
                    IoAnalysis::count_perm_in(&*self.dfg, &self.config, &self.nodes_left) as i64
                        - num_perm_in as i64,
                    IoAnalysis::count_perm_out(&*self.dfg, &self.config, &self.nodes_left) as i64
                        - num_perm_out as i64,
                );
                self.nodes_left.insert(u);

                if max_num_in as i64 - num_perm_in as i64
                    > max_num_out as i64 - num_perm_out as i64
                {
                    std::mem::swap(&mut delta.0, &mut delta.1);
                }

                match best {
                    Some((_, best_delta)) if delta <= best_delta => {}
                    _ => best = Some((u, delta)),
                }
            }
            cursor = self.nodes_left.find_next(u + 1);
        }
        best.map(|(id, _)| id)
    }

    fn reset_stats(&mut self) {
        self.count = 0;
        self.calls = 0;
        self.pruned = [0; 3];
    }

    fn dump_stats(&self, min_weight: i64) {
        progress(&json!({
            "count": self.count,
            "min_weight": min_weight,
            "calls": self.calls,
            "pruned": self.pruned,
        }));
    }
}
