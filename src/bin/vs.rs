use std::io;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use exg::report::{fp_eq, print_report, subgraph_json, Report};
use exg::{vs_enumerate, Dfg, IoSubgraph};

/// Enumerate the convex subgraphs of a data-flow graph under input and
/// output port constraints. The graph is read from standard input; the
/// result document is written to standard output as JSON.
#[derive(Parser)]
#[command(name = "vs")]
struct Args {
    /// Enumerate all subgraphs instead of only the weight-optimal ones.
    #[arg(short = 'e')]
    enumerate_all: bool,

    /// Use the node weights from the input instead of unit weights.
    #[arg(short = 'w')]
    use_weights: bool,

    /// Maximum number of inputs.
    #[arg(value_name = "MAX-IN")]
    max_num_in: usize,

    /// Maximum number of outputs.
    #[arg(value_name = "MAX-OUT")]
    max_num_out: usize,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(1);
        }
    };

    let stdin = io::stdin();
    let dfg = match Dfg::parse(stdin.lock(), args.use_weights) {
        Ok(dfg) => dfg,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };
    if dfg.forbidden().count_ones() == dfg.num_nodes() {
        return ExitCode::from(1);
    }

    let start = Instant::now();
    let mut max_weight: f64 = 0.0;
    let mut output: Vec<IoSubgraph> = Vec::new();
    let enum_all = args.enumerate_all;
    vs_enumerate(
        &dfg,
        args.max_num_in,
        args.max_num_out,
        &mut |subgraph: &IoSubgraph| {
            let weight = subgraph.weight();
            if enum_all {
                if weight > max_weight {
                    max_weight = weight;
                }
                output.push(subgraph.clone());
            } else {
                if weight > max_weight && !fp_eq(weight, max_weight, 0.01) {
                    max_weight = weight;
                    output.retain(|kept| fp_eq(kept.weight(), max_weight, 0.01));
                }
                if weight >= max_weight || fp_eq(weight, max_weight, 0.01) {
                    output.push(subgraph.clone());
                }
            }
        },
    );
    let time = start.elapsed().as_secs_f64();

    let report = Report {
        max_weight,
        name: dfg.name(),
        num_nodes: dfg.num_nodes(),
        num_subgraphs: output.len(),
        subgraphs: output.iter().map(subgraph_json).collect(),
        time,
    };
    if print_report(&report).is_err() {
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
