//! Interface analysis used by the refinement search to prune.
//!
//! Relative to a search state (the current `config` and the still
//! undecided `nodes_left`), a node is *permanent* when no decision in the
//! remaining subtree can remove it: either it is already committed, or
//! none of its transitive predecessors and successors intersect the
//! committed part of the config. Permanent inputs and outputs bound how
//! far the interface can still shrink; the removable-node weights bound
//! how cheaply.

use crate::dfg::{Dfg, IoSubgraph};
use crate::intset::IntSet;
use crate::vset::VMap;

fn is_permanent(dfg: &Dfg, config: &IntSet, nodes_left: &IntSet, u: usize) -> bool {
    if !nodes_left.contains(u) {
        return true;
    }
    if !dfg.pred(u).intersects_difference(config, nodes_left) {
        return false;
    }
    if !dfg.succ(u).intersects_difference(config, nodes_left) {
        return false;
    }
    true
}

fn input_is_permanent(dfg: &Dfg, config: &IntSet, nodes_left: &IntSet, u: usize) -> bool {
    dfg.out_edges(u)
        .iter()
        .any(|&v| config.contains(v) && is_permanent(dfg, config, nodes_left, v))
}

/// Interface summary of a search state.
pub struct IoAnalysis {
    num_perm_in: usize,
    num_perm_out: usize,
    num_shared_non_perm_out: usize,
    inputs: VMap<usize, f64>,
    rnodes: VMap<usize, f64>,
}

impl IoAnalysis {
    pub fn new(dfg: &Dfg, config: &IoSubgraph, nodes_left: &IntSet) -> Self {
        let mut num_perm_in = 0;
        let mut num_perm_out = 0;
        let mut num_shared_non_perm_out = 0;
        let mut inputs: VMap<usize, f64> = VMap::new();
        let mut rnodes: VMap<usize, f64> = VMap::new();

        for &v in config.inputs() {
            if input_is_permanent(dfg, config.nodes(), nodes_left, v) {
                num_perm_in += 1;
            } else {
                inputs.entry_or(v, 0.0);
                for &z in dfg.out_edges(v) {
                    if config.nodes().contains(z) {
                        *rnodes.entry_or(z, 0.0) += 1.0;
                    }
                }
            }
        }

        // score each removable input by how much of its fan-out is shared
        for (v, score) in inputs.iter_mut() {
            for &z in dfg.out_edges(*v) {
                if config.nodes().contains(z) {
                    let value = *rnodes.entry_or(z, 0.0);
                    *score += 1.0 / value;
                }
            }
        }

        for &output in config.outputs() {
            if is_permanent(dfg, config.nodes(), nodes_left, output) {
                num_perm_out += 1;
            } else {
                let value = rnodes.entry_or(output, 0.0);
                if *value >= 1.0 {
                    num_shared_non_perm_out += 1;
                }
            }
        }

        for (node, value) in rnodes.iter_mut() {
            *value = dfg.weight(*node);
        }

        IoAnalysis {
            num_perm_in,
            num_perm_out,
            num_shared_non_perm_out,
            inputs,
            rnodes,
        }
    }

    pub fn num_perm_in(&self) -> usize {
        self.num_perm_in
    }

    pub fn num_perm_out(&self) -> usize {
        self.num_perm_out
    }

    pub fn num_shared_non_perm_out(&self) -> usize {
        self.num_shared_non_perm_out
    }

    pub fn inputs_mut(&mut self) -> &mut VMap<usize, f64> {
        &mut self.inputs
    }

    pub fn rnodes_mut(&mut self) -> &mut VMap<usize, f64> {
        &mut self.rnodes
    }

    /// Number of permanent inputs of `config`, without the full analysis.
    pub fn count_perm_in(dfg: &Dfg, config: &IoSubgraph, nodes_left: &IntSet) -> usize {
        config
            .inputs()
            .iter()
            .filter(|&&v| input_is_permanent(dfg, config.nodes(), nodes_left, v))
            .count()
    }

    /// Number of permanent outputs of `config`, without the full analysis.
    pub fn count_perm_out(dfg: &Dfg, config: &IoSubgraph, nodes_left: &IntSet) -> usize {
        config
            .outputs()
            .iter()
            .filter(|&&v| is_permanent(dfg, config.nodes(), nodes_left, v))
            .count()
    }
}

/// Sort `map` by value ascending and return the sum of the `n` smallest
/// values.
pub fn sum_smallest(map: &mut VMap<usize, f64>, n: usize) -> f64 {
    map.sort_by(|a, b| a.1.total_cmp(&b.1));
    map.iter().take(n).map(|&(_, value)| value).sum()
}
