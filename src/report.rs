//! JSON output: the result document on standard output and the
//! one-object-per-line progress stream on standard error.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::json;

use crate::dfg::IoSubgraph;

/// Knuth's floating point comparison (The Art of Computer Programming,
/// vol. 2, pp. 217-219): `x` and `y` are equal when they differ by at most
/// `eps` scaled by the binary exponent of the larger operand. With
/// `eps = 0.01` this implements the "within 1%" near-tie policy of the
/// enumeration drivers.
pub fn fp_eq(x: f64, y: f64, eps: f64) -> bool {
    let diff = x - y;
    let larger = if x.abs() > y.abs() { x } else { y };
    let eps = eps * 2f64.powi(exponent(larger));
    diff >= -eps && diff <= eps
}

// binary exponent of a normal (or zero) f64, as frexp would report it
fn exponent(x: f64) -> i32 {
    let biased = (x.to_bits() >> 52) & 0x7ff;
    if biased == 0 {
        0
    } else {
        biased as i32 - 1022
    }
}

/// One progress object, printed as a single line on standard error.
pub fn progress(value: &serde_json::Value) {
    eprintln!("{value}");
}

/// The `{nodes, inputs, outputs}` rendering of a subgraph.
pub fn subgraph_json(config: &IoSubgraph) -> serde_json::Value {
    json!({
        "nodes": config.nodes().ones().collect::<Vec<_>>(),
        "inputs": config.inputs().to_vec(),
        "outputs": config.outputs().to_vec(),
    })
}

/// The result document of the `vs` and `mvs` tools.
#[derive(Serialize)]
pub struct Report<'a> {
    pub max_weight: f64,
    pub name: &'a str,
    pub num_nodes: usize,
    pub num_subgraphs: usize,
    pub subgraphs: Vec<serde_json::Value>,
    pub time: f64,
}

/// Pretty-print `value` to standard output with four-space indentation.
pub fn print_report<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfg::Dfg;
    use crate::intset::IntSet;

    #[test]
    fn near_ties_within_one_percent() {
        assert!(fp_eq(100.0, 99.5, 0.01));
        assert!(!fp_eq(100.0, 90.0, 0.01));
        assert!(fp_eq(0.0, 0.0, 0.01));
        assert!(fp_eq(1.0, 1.0, 0.01));
        assert!(!fp_eq(1.0, 2.0, 0.01));
    }

    #[test]
    fn subgraph_rendering() {
        let dfg = Dfg::from_edges(&[(0, 1), (1, 2), (2, 3)]);
        let mut nodes = IntSet::with_capacity(dfg.num_nodes());
        nodes.insert(1);
        nodes.insert(2);
        let config = IoSubgraph::from_nodes(&dfg, nodes);
        let value = subgraph_json(&config);
        assert_eq!(value["nodes"], serde_json::json!([1, 2]));
        assert_eq!(value["inputs"], serde_json::json!([0]));
        assert_eq!(value["outputs"], serde_json::json!([2]));
    }
}
