use std::io;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};

use exg::report::{print_report, subgraph_json, Report};
use exg::{Dfg, IterType, MvsFinder};

/// Find the maximal valid subgraphs of a data-flow graph: the convex
/// subgraphs of maximal weight whose interface fits the given number of
/// input and output ports. The graph is read from standard input; the
/// result document is written to standard output as JSON, progress as one
/// JSON object per line on standard error.
#[derive(Parser)]
#[command(name = "mvs")]
struct Args {
    /// Iteration type of the single-result search.
    #[arg(short = 'i', value_enum, value_name = "TYPE", default_value_t = IterArg::LinearRev)]
    itype: IterArg,

    /// Disable optimizations: a comma-separated list of numbers, 1-3 the
    /// pruning criteria, 4 clustering, 5 improved weight computation.
    #[arg(short = 'o', value_name = "LIST")]
    disable: Option<String>,

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

#[derive(Clone, Copy, ValueEnum)]
enum IterArg {
    Linear,
    LinearRev,
    BinarySearch,
}

impl From<IterArg> for IterType {
    fn from(arg: IterArg) -> IterType {
        match arg {
            IterArg::Linear => IterType::Linear,
            IterArg::LinearRev => IterType::LinearRev,
            IterArg::BinarySearch => IterType::BinarySearch,
        }
    }
}

fn parse_flags(list: &str) -> Option<u8> {
    let mut flags = 0xffu8;
    for field in list.split(',') {
        let v: u32 = field.parse().ok().filter(|v| (1..=5).contains(v))?;
        flags &= !(1u8 << v);
    }
    Some(flags)
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(1);
        }
    };

    let flags = match args.disable.as_deref().map_or(Some(0xff), parse_flags) {
        Some(flags) => flags,
        None => {
            eprintln!("invalid optimization list");
            return ExitCode::from(1);
        }
    };

    let stdin = io::stdin();
    let mut dfg = match Dfg::parse(stdin.lock(), args.use_weights) {
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
    let mut finder = MvsFinder::new(&mut dfg);
    let output = finder.enumerate(
        args.max_num_in,
        args.max_num_out,
        args.itype.into(),
        flags,
    );
    let time = start.elapsed().as_secs_f64();

    let report = Report {
        max_weight: output.first().map_or(0.0, |subgraph| subgraph.weight()),
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
