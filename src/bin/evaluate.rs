use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::anyhow;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info, warn};

use scoreline::config::Config;
use scoreline::evaluation::{self, RawMatchInput};
use scoreline::file::FromJsonFile;
use scoreline::print;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// JSON file holding the raw match input
    input: Option<PathBuf>,

    /// JSON file overriding the default thresholds
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// print the evaluation as JSON instead of tables
    #[clap(long)]
    json: bool,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        self.input
            .as_ref()
            .ok_or(anyhow!("input file must be specified"))?;
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    let config = match &args.config {
        Some(path) => {
            debug!("loading config from {}", path.display());
            Config::from_json_file(path)?
        }
        None => Config::default(),
    };
    let input_path = args.input.ok_or(anyhow!("input file must be specified"))?;
    let input = RawMatchInput::from_json_file(&input_path)?;

    let start_time = Instant::now();
    let evaluation = match evaluation::evaluate_raw(&input, &config) {
        Ok(evaluation) => evaluation,
        Err(err) => {
            warn!("{}: {err}", input_path.display());
            return Ok(());
        }
    };
    let elapsed = start_time.elapsed();
    info!("evaluated {} in {:.3}ms", input_path.display(), elapsed.as_micros() as f64 / 1_000.);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
        return Ok(());
    }

    let console = Console::default();
    println!("Markets:\n{}", console.render(&print::tabulate_markets(&evaluation.markets)));
    println!("Goal rates:\n{}", console.render(&print::tabulate_goal_rates(&evaluation.goal_rates)));
    println!("1X2:\n{}", console.render(&print::tabulate_consensus(&evaluation.consensus)));
    println!(
        "Full-time scorelines:\n{}",
        console.render(&print::tabulate_scorelines(&evaluation.full_time))
    );
    println!(
        "Half-time scorelines:\n{}",
        console.render(&print::tabulate_scorelines(&evaluation.half_time))
    );
    println!("Goals O/U:\n{}", console.render(&print::tabulate_totals(&evaluation.full_time)));
    println!("Half/full:\n{}", console.render(&print::tabulate_half_full(&evaluation.half_full)));
    println!("{}", console.render(&print::tabulate_contradictions(&evaluation.contradictions)));

    Ok(())
}
