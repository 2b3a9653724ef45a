use clap::Parser;
use magma_harness::{run_all, ConformanceReport};

#[derive(Parser)]
#[command(name = "magma-harness", about = "run the MAGMA client binding conformance scenarios")]
struct Cli {
    /// Emit the report as JSON instead of a human-readable summary.
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let report = ConformanceReport::from_results(run_all());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report).unwrap());
    } else {
        for scenario in &report.scenarios {
            let marker = if scenario.passed { "PASS" } else { "FAIL" };
            println!("[{marker}] {} — {}", scenario.name, scenario.detail);
        }
        println!("{}/{} scenarios passed", report.passed, report.total);
    }

    if !report.all_passed() {
        std::process::exit(1);
    }
}
