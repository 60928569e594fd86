//! The weighted data-flow graph and its derived subgraph views.
//!
//! A [`Dfg`] is built once from its textual description, then `index()`
//! computes the transitive predecessor and successor closure of every node.
//! Subgraphs are node sets over the graph; [`IoSubgraph`] additionally
//! maintains the external inputs, the output nodes and the total weight
//! under single-node insertion and removal.
//!
//! Subgraph views do not hold a reference to the graph: every derived query
//! takes `&Dfg`, which keeps the graph free to be mutated (serial-cluster
//! contraction) while node sets are alive.

use std::io::BufRead;

use fixedbitset::FixedBitSet;

use crate::intset::IntSet;
use crate::vset::VSet;
use crate::{parse_integer, ParseError};

#[derive(Clone, Debug)]
struct Node {
    in_list: VSet<usize>,
    out_list: VSet<usize>,
    weight: f64,
    forbidden: bool,
    pred: IntSet,
    succ: IntSet,
}

impl Node {
    fn new(num_nodes: usize) -> Self {
        Node {
            in_list: VSet::new(),
            out_list: VSet::new(),
            weight: 1.0,
            forbidden: false,
            pred: IntSet::with_capacity(num_nodes),
            succ: IntSet::with_capacity(num_nodes),
        }
    }
}

/// A weighted directed acyclic graph of data-flow operations.
#[derive(Clone, Debug)]
pub struct Dfg {
    name: String,
    frequency: u64,
    nodes: Vec<Node>,
}

impl Dfg {
    pub fn new(name: &str, num_nodes: usize, frequency: u64) -> Self {
        Dfg {
            name: name.to_owned(),
            frequency,
            nodes: (0..num_nodes).map(|_| Node::new(num_nodes)).collect(),
        }
    }

    /// Build an indexed unit-weight graph from an edge list. Node count is
    /// one past the largest mentioned id.
    pub fn from_edges(edges: &[(usize, usize)]) -> Self {
        let num_nodes = edges
            .iter()
            .map(|&(u, v)| u.max(v) + 1)
            .max()
            .unwrap_or(0);
        let mut dfg = Dfg::new("", num_nodes, 0);
        for &(u, v) in edges {
            dfg.add_edge(u, v);
        }
        dfg.index();
        dfg
    }

    /// Parse the line-oriented graph description.
    ///
    /// The `p <type> <num_nodes> <in> <out> <frequency>` header must come
    /// first; `n <id> <weight> <forbidden>` records set per-node data and
    /// `e <u> <v>` adds an edge (ids are 1-based in the input). Node
    /// weights are read only when `set_weights` is true, otherwise every
    /// node weighs 1. Any other line is an error. The returned graph is
    /// indexed.
    pub fn parse<R: BufRead>(input: R, set_weights: bool) -> Result<Dfg, ParseError> {
        let mut dfg: Option<Dfg> = None;
        let mut num_nodes = 0;

        for line in input.lines() {
            let line = line?;
            let fields: Vec<&str> = line.split(' ').collect();
            match fields[0] {
                "p" => {
                    if fields.len() < 6 {
                        return Err(ParseError::InvalidLine);
                    }
                    let nodes = parse_integer(fields[2], 0, i64::MAX)
                        .ok_or(ParseError::InvalidLine)?;
                    let freq = parse_integer(fields[5], 0, i64::MAX)
                        .ok_or(ParseError::InvalidLine)?;
                    num_nodes = nodes as usize;
                    dfg = Some(Dfg::new(fields[4], num_nodes, freq as u64));
                }
                "e" => {
                    let dfg = dfg.as_mut().ok_or(ParseError::InvalidLine)?;
                    if fields.len() < 3 {
                        return Err(ParseError::InvalidLine);
                    }
                    let u = parse_integer(fields[1], 1, num_nodes as i64)
                        .ok_or(ParseError::InvalidLine)?;
                    let v = parse_integer(fields[2], 1, num_nodes as i64)
                        .ok_or(ParseError::InvalidLine)?;
                    dfg.add_edge(u as usize - 1, v as usize - 1);
                }
                "n" => {
                    let dfg = dfg.as_mut().ok_or(ParseError::InvalidLine)?;
                    if fields.len() < 4 {
                        return Err(ParseError::InvalidLine);
                    }
                    let id = parse_integer(fields[1], 1, num_nodes as i64)
                        .ok_or(ParseError::InvalidLine)?;
                    let forbidden = parse_integer(fields[3], 0, 1)
                        .ok_or(ParseError::InvalidLine)?;
                    if forbidden == 1 {
                        dfg.set_forbidden(id as usize - 1);
                    }
                    if set_weights {
                        let weight: f64 = fields[2]
                            .parse()
                            .map_err(|_| ParseError::InvalidLine)?;
                        *dfg.weight_mut(id as usize - 1) = weight;
                    }
                }
                _ => return Err(ParseError::InvalidLine),
            }
        }

        let mut dfg = dfg.ok_or(ParseError::InvalidLine)?;
        debug_assert!(
            (0..dfg.num_nodes()).map(|u| dfg.weight(u)).sum::<f64>().is_finite()
        );
        dfg.index();
        Ok(dfg)
    }

    pub fn add_edge(&mut self, u: usize, v: usize) {
        self.nodes[u].out_list.add(v);
        self.nodes[v].in_list.add(u);
    }

    pub fn remove_edge(&mut self, u: usize, v: usize) {
        self.nodes[u].out_list.remove(v);
        self.nodes[v].in_list.remove(u);
    }

    pub fn set_forbidden(&mut self, u: usize) {
        self.nodes[u].forbidden = true;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn weight(&self, u: usize) -> f64 {
        self.nodes[u].weight
    }

    pub fn weight_mut(&mut self, u: usize) -> &mut f64 {
        &mut self.nodes[u].weight
    }

    pub fn in_edges(&self, u: usize) -> &VSet<usize> {
        &self.nodes[u].in_list
    }

    pub fn out_edges(&self, u: usize) -> &VSet<usize> {
        &self.nodes[u].out_list
    }

    /// Transitive predecessors of `u`, as computed by the last `index()`.
    pub fn pred(&self, u: usize) -> &IntSet {
        &self.nodes[u].pred
    }

    /// Transitive successors of `u`, as computed by the last `index()`.
    pub fn succ(&self, u: usize) -> &IntSet {
        &self.nodes[u].succ
    }

    pub fn is_forbidden(&self, u: usize) -> bool {
        self.nodes[u].forbidden
    }

    /// Nodes that may not appear in any enumerated subgraph: explicitly
    /// forbidden ones plus the graph's sources and sinks.
    pub fn forbidden(&self) -> IntSet {
        let mut set = IntSet::with_capacity(self.num_nodes());
        for u in 0..self.num_nodes() {
            if self.is_forbidden(u)
                || self.in_edges(u).is_empty()
                || self.out_edges(u).is_empty()
            {
                set.insert(u);
            }
        }
        set
    }

    /// Recompute the per-node `pred` and `succ` closures from the current
    /// edge set.
    pub fn index(&mut self) {
        let mut post = Vec::with_capacity(self.num_nodes());
        dfs_postorder(self, |u| post.push(u));

        for &u in &post {
            self.nodes[u].pred.clear();
            self.nodes[u].succ.clear();
        }

        // forward sweep in topological order (reverse post-order)
        for &u in post.iter().rev() {
            let pred_u = std::mem::take(&mut self.nodes[u].pred);
            for k in 0..self.nodes[u].out_list.len() {
                let v = self.nodes[u].out_list[k];
                self.nodes[v].pred.union_with(&pred_u);
                self.nodes[v].pred.insert(u);
            }
            self.nodes[u].pred = pred_u;
        }

        for &u in &post {
            let mut succ_u = std::mem::take(&mut self.nodes[u].succ);
            for k in 0..self.nodes[u].out_list.len() {
                let v = self.nodes[u].out_list[k];
                succ_u.union_with(&self.nodes[v].succ);
                succ_u.insert(v);
            }
            self.nodes[u].succ = succ_u;
        }
    }
}

/// Depth-first search over the whole graph, calling `visit_cb` on each node
/// in post-order. Roots are tried in index order, so the reverse of the
/// callback sequence is a topological order on acyclic input.
///
/// The traversal keeps an explicit stack; input graphs can be deep chains
/// and recursion is not an option.
pub fn dfs_postorder(dfg: &Dfg, mut visit_cb: impl FnMut(usize)) {
    let mut discovered = FixedBitSet::with_capacity(dfg.num_nodes());
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for root in 0..dfg.num_nodes() {
        if discovered.contains(root) {
            continue;
        }
        discovered.insert(root);
        stack.push((root, 0));
        while let Some((mut u, mut next)) = stack.pop() {
            loop {
                let out = dfg.out_edges(u);
                if next >= out.len() {
                    break;
                }
                let v = out[next];
                next += 1;
                if !discovered.contains(v) {
                    discovered.insert(v);
                    stack.push((u, next));
                    u = v;
                    next = 0;
                }
            }
            visit_cb(u);
        }
    }
}

// true iff at least one successor of `u` other than `z` belongs to `config`
fn has_internal_successor(dfg: &Dfg, config: &IntSet, u: usize, z: usize) -> bool {
    dfg.out_edges(u)
        .iter()
        .any(|&v| v != z && config.contains(v))
}

// true iff at least one successor of `u` other than `z` does not belong to
// `config`
fn has_external_successor(dfg: &Dfg, config: &IntSet, u: usize, z: usize) -> bool {
    dfg.out_edges(u)
        .iter()
        .any(|&v| v != z && !config.contains(v))
}

/// An induced subgraph, represented by its node set.
#[derive(Clone, Debug, Default)]
pub struct Subgraph {
    nodes: IntSet,
}

impl Subgraph {
    pub fn with_capacity(num_nodes: usize) -> Self {
        Subgraph {
            nodes: IntSet::with_capacity(num_nodes),
        }
    }

    pub fn from_nodes(nodes: IntSet) -> Self {
        Subgraph { nodes }
    }

    pub fn insert(&mut self, u: usize) {
        self.nodes.insert(u);
    }

    pub fn remove(&mut self, u: usize) {
        self.nodes.remove(u);
    }

    pub fn nodes(&self) -> &IntSet {
        &self.nodes
    }

    /// All transitive predecessors of the subgraph that lie outside it.
    pub fn pred(&self, dfg: &Dfg) -> IntSet {
        let mut out = IntSet::with_capacity(dfg.num_nodes());
        for u in self.nodes.ones() {
            out.union_with(dfg.pred(u));
        }
        out.difference_with(&self.nodes);
        out
    }

    /// All transitive successors of the subgraph that lie outside it.
    pub fn succ(&self, dfg: &Dfg) -> IntSet {
        let mut out = IntSet::with_capacity(dfg.num_nodes());
        for u in self.nodes.ones() {
            out.union_with(dfg.succ(u));
        }
        out.difference_with(&self.nodes);
        out
    }

    /// The nodes plus everything lying on a path between two of them. The
    /// subgraph is convex iff this equals its node set.
    pub fn closure(&self, dfg: &Dfg) -> IntSet {
        let between = &self.pred(dfg) & &self.succ(dfg);
        &self.nodes | &between
    }
}

/// A subgraph that keeps its interface and weight up to date.
///
/// `inputs` are the nodes outside the subgraph with at least one successor
/// inside; `outputs` are the nodes inside with at least one successor
/// outside. Both and the total weight are maintained incrementally by
/// [`IoSubgraph::insert`] and [`IoSubgraph::remove`].
#[derive(Clone, Debug, Default)]
pub struct IoSubgraph {
    sub: Subgraph,
    inputs: VSet<usize>,
    outputs: VSet<usize>,
    weight: f64,
}

impl IoSubgraph {
    pub fn with_capacity(num_nodes: usize) -> Self {
        IoSubgraph {
            sub: Subgraph::with_capacity(num_nodes),
            inputs: VSet::new(),
            outputs: VSet::new(),
            weight: 0.0,
        }
    }

    pub fn from_nodes(dfg: &Dfg, nodes: IntSet) -> Self {
        let mut config = IoSubgraph {
            sub: Subgraph::from_nodes(nodes),
            inputs: VSet::new(),
            outputs: VSet::new(),
            weight: 0.0,
        };
        config.init_io(dfg);
        config.init_weight(dfg);
        config
    }

    /// Replace the node set wholesale and recompute the caches.
    pub fn assign(&mut self, dfg: &Dfg, nodes: &IntSet) {
        self.sub = Subgraph::from_nodes(nodes.clone());
        self.init_io(dfg);
        self.init_weight(dfg);
    }

    pub fn nodes(&self) -> &IntSet {
        self.sub.nodes()
    }

    pub fn pred(&self, dfg: &Dfg) -> IntSet {
        self.sub.pred(dfg)
    }

    pub fn succ(&self, dfg: &Dfg) -> IntSet {
        self.sub.succ(dfg)
    }

    pub fn closure(&self, dfg: &Dfg) -> IntSet {
        self.sub.closure(dfg)
    }

    pub fn inputs(&self) -> &VSet<usize> {
        &self.inputs
    }

    pub fn outputs(&self) -> &VSet<usize> {
        &self.outputs
    }

    pub fn num_in(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_out(&self) -> usize {
        self.outputs.len()
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn insert(&mut self, dfg: &Dfg, u: usize) {
        self.sub.insert(u);
        self.update_io(dfg, u, true);
        self.weight += dfg.weight(u);
    }

    pub fn remove(&mut self, dfg: &Dfg, u: usize) {
        self.sub.remove(u);
        self.update_io(dfg, u, false);
        self.weight -= dfg.weight(u);
    }

    fn init_weight(&mut self, dfg: &Dfg) {
        self.weight = self.nodes().ones().map(|u| dfg.weight(u)).sum();
    }

    fn init_io(&mut self, dfg: &Dfg) {
        self.inputs = VSet::new();
        self.outputs = VSet::new();
        for u in 0..dfg.num_nodes() {
            if !self.nodes().contains(u) {
                if has_internal_successor(dfg, self.nodes(), u, u) {
                    self.inputs.add(u);
                }
            } else if has_external_successor(dfg, self.nodes(), u, u) {
                self.outputs.add(u);
            }
        }
    }

    fn update_io(&mut self, dfg: &Dfg, u: usize, add: bool) {
        let nodes = self.sub.nodes();

        if has_internal_successor(dfg, nodes, u, u) {
            if add {
                self.inputs.remove(u);
            } else {
                self.inputs.add(u);
            }
        }

        if has_external_successor(dfg, nodes, u, u) {
            if add {
                self.outputs.add(u);
            } else {
                self.outputs.remove(u);
            }
        }

        for &v in dfg.in_edges(u) {
            if v >= dfg.num_nodes() || !nodes.contains(v) {
                if !has_internal_successor(dfg, nodes, v, u) {
                    if add {
                        self.inputs.add(v);
                    } else {
                        self.inputs.remove(v);
                    }
                }
            } else if !has_external_successor(dfg, nodes, v, u) {
                if add {
                    self.outputs.remove(v);
                } else {
                    self.outputs.add(v);
                }
            }
        }
    }
}
