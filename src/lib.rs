//! **exg** identifies candidate custom instructions in data-flow graphs:
//! it enumerates the convex subgraphs of a weighted DAG whose interface
//! fits a given number of input and output ports, and searches for the
//! ones of maximal weight.
//!
//! The two entry points are [`vs_enumerate`], which walks every convex
//! I/O-bounded subgraph, and [`MvsFinder`], which finds the weight-optimal
//! ones through maximal-independent-set candidate generation followed by
//! branch-and-bound refinement. Graphs are read from a line-oriented text
//! format (see [`Dfg::parse`] and [`Graph::parse`]); the `vs`, `mvs`,
//! `mis` and `config_info` binaries wrap these into command line tools
//! that report JSON.

pub use crate::dfg::{dfs_postorder, Dfg, IoSubgraph, Subgraph};
pub use crate::graph::{enumerate_mis, enumerate_mis_bk, Graph, MisStats, MisVisitor};
pub use crate::intset::IntSet;
pub use crate::mvs::{IterType, Mvs, MvsFinder, VCluster};
pub use crate::vs::vs_enumerate;

pub mod analysis;
pub mod cluster;
pub mod dfg;
pub mod graph;
pub mod intset;
pub mod mvs;
pub mod report;
pub mod vs;
pub mod vset;

/// Error raised by the graph parsers.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A line that is not a well-formed `p`, `n` or `e` record.
    #[error("invalid line")]
    InvalidLine,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// strtol-style bounded integer parse used by all input formats
pub(crate) fn parse_integer(field: &str, min: i64, max: i64) -> Option<i64> {
    field.parse::<i64>().ok().filter(|v| (min..=max).contains(v))
}
