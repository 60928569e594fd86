use std::io;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use serde_json::json;

use exg::report::print_report;
use exg::{enumerate_mis, enumerate_mis_bk, Graph};

/// Count the maximal independent sets of an undirected graph read from
/// standard input.
#[derive(Parser)]
#[command(name = "mis")]
struct Args {
    /// Use the Bron-Kerbosch algorithm.
    #[arg(short = 'b')]
    bron_kerbosch: bool,

    /// Complement the graph before counting.
    #[arg(short = 'i')]
    invert: bool,
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
    let mut graph = match Graph::parse(stdin.lock()) {
        Ok(graph) => graph,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };
    if args.invert {
        graph.invert();
    }

    let start = Instant::now();
    let stats = if args.bron_kerbosch {
        enumerate_mis_bk(&graph, &mut ())
    } else {
        enumerate_mis(&graph, &mut ())
    };
    let time = start.elapsed().as_secs_f64();

    let report = json!({
        "calls": stats.calls,
        "num_MIS": stats.count,
        "num_edges": graph.num_edges() / 2,
        "num_nodes": graph.num_nodes(),
        "time": time,
    });
    if print_report(&report).is_err() {
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
