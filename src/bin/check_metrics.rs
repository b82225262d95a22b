//! Simple utility to check metric table parsing
//!
//! Reads a captured `weaver multi metrics <name>` listing and prints the
//! values the manager would aggregate from it.

use std::env;
use std::fs;

use dsb_manager::metrics::{extract_samples, mean_duration, sum_counter, MetricClass, MetricKind};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <metric> <file>", args[0]);
        eprintln!("Metrics:");
        for metric in MetricKind::ALL {
            eprintln!("  {}", metric.runtime_name());
        }
        std::process::exit(1);
    }

    let metric = MetricKind::from_runtime_name(&args[1])
        .ok_or_else(|| format!("unknown metric '{}'", args[1]))?;
    let text = fs::read_to_string(&args[2])?;

    let samples = extract_samples(metric, &text);
    println!("Found {} rows for {}:", samples.len(), metric);
    for sample in &samples {
        println!("  {}", sample.value.as_f64());
    }

    match metric.class() {
        MetricClass::Counter => println!("sum: {}", sum_counter(&samples)),
        MetricClass::Duration => println!("mean: {:.2}", mean_duration(&samples)),
    }

    Ok(())
}
