//! Enumeration of convex subgraphs under input and output constraints.
//!
//! The algorithm grows a set of chosen output nodes outward: for every
//! candidate output set (canonicalized by only ever adding nodes below the
//! current minimum), the inner search extends the set's closure upward,
//! branching on the inclusion or exclusion of external predecessors until
//! none remain, and pruning as soon as the permanently-committed inputs
//! exceed the bound. See Pozzi, Atasu and Ienne, "Exact and approximate
//! algorithms for the extension of embedded processor instruction sets"
//! (the generalization of doi:10.1109/CSE.2009.167).

use crate::dfg::{Dfg, IoSubgraph, Subgraph};
use crate::intset::IntSet;

/// The forbidden set extended upward: starting from the graph's forbidden
/// nodes, any node with an out-edge into the excluded region and outside
/// `config` is excluded as well.
pub(crate) fn config_exclusion(dfg: &Dfg, config: &IntSet) -> IntSet {
    let mut out = dfg.forbidden();
    for b in (0..dfg.num_nodes()).rev() {
        if out.contains(b) {
            for &a in dfg.in_edges(b) {
                if a < dfg.num_nodes() && !config.contains(a) {
                    out.insert(a);
                }
            }
        }
    }
    out
}

struct VsFinder {
    config: IoSubgraph,
    excluded: IntSet,
}

impl VsFinder {
    fn new(dfg: &Dfg, outputs: &Subgraph) -> Self {
        VsFinder {
            config: IoSubgraph::from_nodes(dfg, outputs.closure(dfg)),
            excluded: config_exclusion(dfg, outputs.nodes()),
        }
    }

    fn visit<F>(&mut self, dfg: &Dfg, max_num_in: usize, output_cb: &mut F)
    where
        F: FnMut(&IoSubgraph),
    {
        // inputs inside the exclusion set can never be absorbed
        let num_perm_in = self
            .config
            .inputs()
            .iter()
            .filter(|&&u| u >= dfg.num_nodes() || self.excluded.contains(u))
            .count();
        if num_perm_in > max_num_in {
            return;
        }

        let mut id = None;
        for u in self.config.pred(dfg).ones() {
            if !self.excluded.contains(u) {
                id = Some(u);
            }
        }
        let Some(id) = id else {
            output_cb(&self.config);
            return;
        };

        self.config.insert(dfg, id);
        self.visit(dfg, max_num_in, output_cb);

        self.config.remove(dfg, id);
        let excluded_prev = self.excluded.clone();
        self.excluded.insert(id);
        self.excluded.union_with(dfg.pred(id));
        self.visit(dfg, max_num_in, output_cb);
        self.excluded = excluded_prev;
    }
}

fn vs_enumerate_<F>(
    dfg: &Dfg,
    outputs: &mut Subgraph,
    size: usize,
    max_num_in: usize,
    max_num_out: usize,
    output_cb: &mut F,
) where
    F: FnMut(&IoSubgraph),
{
    if size >= 1 {
        VsFinder::new(dfg, outputs).visit(dfg, max_num_in, output_cb);
    }
    if size < max_num_out {
        let exclusion = config_exclusion(dfg, outputs.nodes());
        let pred = outputs.pred(dfg);
        let mut valid = IntSet::with_capacity(dfg.num_nodes());
        for u in exclusion.ones() {
            if !dfg.is_forbidden(u)
                && !(pred.contains(u)
                    && dfg.succ(u).intersects_intersection(&pred, &exclusion))
            {
                valid.insert(u);
            }
        }

        let min = outputs.nodes().minimum();
        for u in 0..dfg.num_nodes() {
            if let Some(min) = min {
                if u >= min {
                    break;
                }
            }
            if valid.contains(u) {
                outputs.insert(u);
                vs_enumerate_(dfg, outputs, size + 1, max_num_in, max_num_out, output_cb);
                outputs.remove(u);
            }
        }
    }
}

/// Invoke `output_cb` for every convex subgraph of `dfg` with at most
/// `max_num_in` inputs, at most `max_num_out` outputs and no forbidden
/// node.
pub fn vs_enumerate<F>(dfg: &Dfg, max_num_in: usize, max_num_out: usize, output_cb: &mut F)
where
    F: FnMut(&IoSubgraph),
{
    let mut outputs = Subgraph::with_capacity(dfg.num_nodes());
    vs_enumerate_(dfg, &mut outputs, 0, max_num_in, max_num_out, output_cb);
}
