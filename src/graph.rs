//! Undirected simple graph and maximal-independent-set enumeration.
//!
//! Two enumerators are provided: an exhaustive branch-and-prune that keeps
//! per-node residual edge counts, and a Bron–Kerbosch variant with
//! pivoting. Both drive a [`MisVisitor`]: `mis` fires once per maximal
//! independent set, `update` on every commit and uncommit of a node, so a
//! caller can mirror the partial set incrementally.

use std::io::BufRead;

use crate::intset::IntSet;
use crate::vset::VSet;
use crate::{parse_integer, ParseError};

/// An undirected simple graph over `0..num_nodes`, adjacency stored as
/// small vectors.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<VSet<usize>>,
}

impl Graph {
    pub fn with_nodes(num_nodes: usize) -> Self {
        Graph {
            nodes: vec![VSet::new(); num_nodes],
        }
    }

    /// Build from an edge list; node count is one past the largest
    /// mentioned id.
    pub fn from_edges(edges: &[(usize, usize)]) -> Self {
        let num_nodes = edges
            .iter()
            .map(|&(u, v)| u.max(v) + 1)
            .max()
            .unwrap_or(0);
        let mut graph = Graph::with_nodes(num_nodes);
        for &(u, v) in edges {
            graph.add_edge(u, v);
        }
        graph
    }

    /// Parse a `p edge <num_nodes> …` header followed by `e <u> <v>` lines
    /// (1-based ids).
    pub fn parse<R: BufRead>(input: R) -> Result<Graph, ParseError> {
        let mut graph: Option<Graph> = None;
        let mut num_nodes = 0;

        for line in input.lines() {
            let line = line?;
            let fields: Vec<&str> = line.split(' ').collect();
            match fields[0] {
                "p" => {
                    if fields.len() < 3 {
                        return Err(ParseError::InvalidLine);
                    }
                    let nodes = parse_integer(fields[2], 0, i64::MAX)
                        .ok_or(ParseError::InvalidLine)?;
                    num_nodes = nodes as usize;
                    graph = Some(Graph::with_nodes(num_nodes));
                }
                "e" => {
                    let graph = graph.as_mut().ok_or(ParseError::InvalidLine)?;
                    if fields.len() < 3 {
                        return Err(ParseError::InvalidLine);
                    }
                    let u = parse_integer(fields[1], 1, num_nodes as i64)
                        .ok_or(ParseError::InvalidLine)?;
                    let v = parse_integer(fields[2], 1, num_nodes as i64)
                        .ok_or(ParseError::InvalidLine)?;
                    graph.add_edge(u as usize - 1, v as usize - 1);
                }
                _ => return Err(ParseError::InvalidLine),
            }
        }
        graph.ok_or(ParseError::InvalidLine)
    }

    pub fn add_edge(&mut self, u: usize, v: usize) {
        self.nodes[u].add(v);
        self.nodes[v].add(u);
    }

    pub fn remove_edge(&mut self, u: usize, v: usize) {
        self.nodes[u].remove(v);
        self.nodes[v].remove(u);
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// The sum of all node degrees, i.e. twice the number of undirected
    /// edges.
    pub fn num_edges(&self) -> usize {
        self.nodes.iter().map(|adj| adj.len()).sum()
    }

    pub fn edges(&self, u: usize) -> &VSet<usize> {
        &self.nodes[u]
    }

    /// Replace the graph by its complement (no self-loops).
    pub fn invert(&mut self) {
        let num_nodes = self.num_nodes();
        for i in 0..num_nodes {
            let mut sorted = self.nodes[i].to_vec();
            sorted.sort_unstable();
            let mut complement = VSet::new();
            let mut pos = 0;
            for u in 0..num_nodes {
                if pos < sorted.len() && sorted[pos] == u {
                    pos += 1;
                } else if u != i {
                    complement.push(u);
                }
            }
            self.nodes[i] = complement;
        }
    }
}

/// Receiver for the maximal-independent-set enumerators.
pub trait MisVisitor {
    /// Called once per maximal independent set with the full set.
    fn mis(&mut self, set: &IntSet) {
        let _ = set;
    }

    /// Called whenever `id` is committed to (`added`) or retracted from
    /// (`!added`) the current partial set.
    fn update(&mut self, set: &IntSet, id: usize, added: bool) {
        let _ = (set, id, added);
    }
}

/// The do-nothing visitor, for callers that only want the counters.
impl MisVisitor for () {}

/// Counters reported by the enumerators.
#[derive(Clone, Copy, Debug)]
pub struct MisStats {
    /// Number of maximal independent sets emitted.
    pub count: usize,
    /// Number of recursive search steps.
    pub calls: usize,
}

struct MisFinder<'a, V: MisVisitor> {
    graph: &'a Graph,
    visitor: &'a mut V,
    config: IntSet,
    nodes_left: IntSet,
    f_nodes: IntSet,
    num_edges: Vec<usize>,
    g_num_edges: usize,
    count: usize,
    calls: usize,
}

/// Enumerate all maximal independent sets of `graph` by exhaustive
/// branching with edge-count pruning.
pub fn enumerate_mis<V: MisVisitor>(graph: &Graph, visitor: &mut V) -> MisStats {
    let size = graph.num_nodes();
    let mut finder = MisFinder {
        graph,
        visitor,
        config: IntSet::with_capacity(size),
        nodes_left: IntSet::with_capacity(size),
        f_nodes: IntSet::with_capacity(size),
        num_edges: vec![0; size],
        g_num_edges: 0,
        count: 0,
        calls: 0,
    };
    for i in 0..size {
        finder.nodes_left.insert(i);
        finder.config.insert(i);
        finder.num_edges[i] = graph.edges(i).len();
        finder.g_num_edges += finder.num_edges[i];
    }
    finder.visit();
    MisStats {
        count: finder.count,
        calls: finder.calls,
    }
}

impl<V: MisVisitor> MisFinder<'_, V> {
    fn visit(&mut self) {
        self.calls += 1;

        if self.g_num_edges == 0 {
            self.visitor.mis(&self.config);
            self.count += 1;
            return;
        }

        // a pending forced exclusion takes priority over the degree
        // heuristic
        let mut is_f_node = false;
        let mut id = self.f_nodes.minimum();
        if let Some(f) = id {
            self.f_nodes.remove(f);
            is_f_node = true;
        } else {
            let mut max_edges = 0;
            let mut u = self.nodes_left.minimum();
            while let Some(n) = u {
                if self.num_edges[n] > max_edges {
                    max_edges = self.num_edges[n];
                    id = Some(n);
                }
                u = self.nodes_left.find_next(n + 1);
            }
        }
        let Some(id) = id else { return };

        self.nodes_left.remove(id);

        self.config.remove(id);
        self.visitor.update(&self.config, id, false);

        let mut prune = false;
        self.g_num_edges -= 2 * self.num_edges[id];
        for k in 0..self.graph.edges(id).len() {
            let v = self.graph.edges(id)[k];
            self.num_edges[v] -= 1;
            // an isolated excluded neighbor can never be covered again:
            // nothing below this branch is maximal
            if self.num_edges[v] == 0 && !self.config.contains(v) {
                prune = true;
            }
        }
        if !prune {
            self.visit();
        } else {
            self.f_nodes.clear();
        }

        self.config.insert(id);
        self.visitor.update(&self.config, id, true);

        self.g_num_edges += 2 * self.num_edges[id];
        if !is_f_node {
            for k in 0..self.graph.edges(id).len() {
                let v = self.graph.edges(id)[k];
                self.num_edges[v] += 1;
                if self.config.contains(v) {
                    debug_assert!(self.nodes_left.contains(v));
                    self.f_nodes.insert(v);
                }
            }
            self.visit();
        } else {
            for k in 0..self.graph.edges(id).len() {
                let v = self.graph.edges(id)[k];
                self.num_edges[v] += 1;
            }
        }

        self.nodes_left.insert(id);
    }
}

struct MisFinderBk<'a, V: MisVisitor> {
    graph: &'a Graph,
    visitor: &'a mut V,
    config: IntSet,
    nodes_left: IntSet,
    f_nodes: IntSet,
    count: usize,
    calls: usize,
}

/// Enumerate all maximal independent sets of `graph` with Bron–Kerbosch
/// and pivoting.
pub fn enumerate_mis_bk<V: MisVisitor>(graph: &Graph, visitor: &mut V) -> MisStats {
    let size = graph.num_nodes();
    let mut finder = MisFinderBk {
        graph,
        visitor,
        config: IntSet::with_capacity(size),
        nodes_left: IntSet::with_capacity(size),
        f_nodes: IntSet::with_capacity(size),
        count: 0,
        calls: 0,
    };
    for i in 0..size {
        finder.nodes_left.insert(i);
    }
    finder.visit();
    MisStats {
        count: finder.count,
        calls: finder.calls,
    }
}

fn find_pivot(
    graph: &Graph,
    candidates: &IntSet,
    p: &IntSet,
    best: &mut Option<(usize, usize)>,
) {
    for id in candidates.ones() {
        let score = graph.edges(id).iter().filter(|&&v| p.contains(v)).count();
        if best.map_or(true, |(_, best_score)| score < best_score) {
            *best = Some((id, score));
        }
    }
}

impl<V: MisVisitor> MisFinderBk<'_, V> {
    fn visit(&mut self) {
        self.calls += 1;

        if self.nodes_left.minimum().is_none() && self.f_nodes.minimum().is_none() {
            self.visitor.mis(&self.config);
            self.count += 1;
            return;
        }

        let mut p = self.nodes_left.clone();
        let mut x = self.f_nodes.clone();

        // pivot from P ∪ X minimizing |P ∩ N(v)|
        let mut best = None;
        find_pivot(self.graph, &self.nodes_left, &self.nodes_left, &mut best);
        find_pivot(self.graph, &self.f_nodes, &self.nodes_left, &mut best);
        let Some((pivot, _)) = best else { return };
        for j in 0..=self.graph.edges(pivot).len() {
            let id = if j < self.graph.edges(pivot).len() {
                self.graph.edges(pivot)[j]
            } else {
                pivot
            };
            if !p.contains(id) {
                continue;
            }

            self.nodes_left = p.clone();
            self.f_nodes = x.clone();

            self.nodes_left.remove(id);
            for k in 0..self.graph.edges(id).len() {
                let v = self.graph.edges(id)[k];
                self.nodes_left.remove(v);
                self.f_nodes.remove(v);
            }

            self.config.insert(id);
            self.visitor.update(&self.config, id, true);

            self.visit();

            self.config.remove(id);
            self.visitor.update(&self.config, id, false);

            p.remove(id);
            x.insert(id);
        }
    }
}
