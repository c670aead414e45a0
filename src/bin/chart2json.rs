//! CLI tool for reconstructing the chart of one region description

use chart_inspector::{process_region, WriterOptions};
use std::env;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <region.json>", args[0]);
        eprintln!("       {} <region.json> --detail", args[0]);
        process::exit(1);
    }

    let region_path = &args[1];
    let detail = args.get(2).map(|a| a == "--detail").unwrap_or(false);

    match process_region(region_path, WriterOptions { detail }) {
        Ok(result) => match result.chart {
            Some(chart) => match serde_json::to_string_pretty(&chart) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    println!("{}", serde_json::json!({ "error": e.to_string() }));
                    process::exit(1);
                }
            },
            None => {
                println!(
                    "{}",
                    serde_json::json!({
                        "error": "no chart found in region",
                        "processing_time_ms": result.processing_time_ms,
                    })
                );
                process::exit(1);
            }
        },
        Err(e) => {
            println!("{}", serde_json::json!({ "error": e.to_string() }));
            process::exit(1);
        }
    }
}
