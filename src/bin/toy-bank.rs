use std::{fs::File, io::Read};

use anyhow::{Context, Result};
use toy_bank::bin_utils::Service;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_SCENARIO: &str = include_str!("../../demos/john_and_jane.csv");

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let input: Box<dyn Read> = match std::env::args().nth(1) {
        Some(filename) => Box::new(
            File::open(&filename).with_context(|| format!("Failed to open `{filename}`"))?,
        ),
        None => {
            info!("no script given, running the demo scenario");
            Box::new(DEMO_SCENARIO.as_bytes())
        }
    };

    let service = Service {
        input,
        output: &mut std::io::stdout(),
        with_history: true,
        error_printer: Box::new(|line, err| eprintln!("Error at line {line}: {err}")),
    };
    service.run()
}
