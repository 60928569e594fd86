use std::io;
use std::process::ExitCode;

use clap::Parser;

use exg::report::{print_report, subgraph_json};
use exg::{Dfg, IoSubgraph};

/// Report the interface, convexity and validity of a user-supplied node
/// set of the data-flow graph read from standard input.
#[derive(Parser)]
#[command(name = "config_info")]
struct Args {
    /// Space-separated list of 0-based node ids.
    #[arg(value_name = "CONFIG")]
    config: String,
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
    let dfg = match Dfg::parse(stdin.lock(), false) {
        Ok(dfg) => dfg,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };

    let mut config = IoSubgraph::with_capacity(dfg.num_nodes());
    for field in args.config.split(' ') {
        let Some(v) = field.parse::<usize>().ok().filter(|&v| v < dfg.num_nodes()) else {
            eprintln!("invalid configuration");
            return ExitCode::from(1);
        };
        config.insert(&dfg, v);
    }

    let closure = config.closure(&dfg);
    let mut report = subgraph_json(&config);
    report["convex"] = (*config.nodes() == closure).into();
    report["valid"] = (!config.nodes().intersects(&dfg.forbidden())).into();
    if print_report(&report).is_err() {
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
