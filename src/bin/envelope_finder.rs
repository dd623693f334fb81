//! Envelope finder CLI: runs a step script against the simulated world.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use envelope_finder::{parse_coordinate, BeliefGrid, EnvelopeFinder, EnvelopeWorld, FinderConfig, StepScript};

#[derive(Parser)]
#[command(name = "envelope-finder")]
#[command(author, version, about = "SAT-based envelope finder agent", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// World dimension
    dim: u32,

    /// Step script: whitespace-separated x,y cells
    steps: PathBuf,

    /// Envelope location, as x,y
    #[arg(short, long, conflicts_with = "envelopes", required_unless_present = "envelopes")]
    envelope: Option<String>,

    /// File holding the envelope location as an x,y token
    #[arg(long)]
    envelopes: Option<PathBuf>,

    /// Run only the first N steps of the script
    #[arg(short = 'n', long)]
    num_steps: Option<usize>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ask the directional oracle after every move
    #[arg(long)]
    oracle: bool,

    /// Ignore the same-cell presence flag
    #[arg(long)]
    no_presence: bool,

    /// Number of query workers
    #[arg(long)]
    workers: Option<usize>,

    /// Per-query timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Expected belief grids, one per step, blank-line separated
    #[arg(long)]
    expect: Option<PathBuf>,

    /// Print step reports as JSON lines instead of grids
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn finder_config(&self) -> anyhow::Result<FinderConfig> {
        let mut config = match &self.config {
            Some(path) => FinderConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
            None => FinderConfig::default(),
        };
        config.world_dim = self.dim;
        config.ask_direction_oracle |= self.oracle;
        if self.no_presence {
            config.use_presence_flag = false;
        }
        if let Some(workers) = self.workers {
            config.query_workers = workers;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.query_timeout_ms = timeout_ms;
        }
        Ok(config.validate()?)
    }

    fn world(&self) -> anyhow::Result<EnvelopeWorld> {
        match (&self.envelope, &self.envelopes) {
            (Some(token), _) => Ok(EnvelopeWorld::new(self.dim, parse_coordinate(token, self.dim)?)?),
            (None, Some(path)) => {
                EnvelopeWorld::load(path, self.dim).with_context(|| format!("loading envelope from {}", path.display()))
            }
            (None, None) => anyhow::bail!("either --envelope or --envelopes is required"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = cli.finder_config()?;
    let world = cli.world()?;
    let mut script =
        StepScript::load(&cli.steps, cli.dim).with_context(|| format!("loading steps from {}", cli.steps.display()))?;
    if let Some(count) = cli.num_steps {
        script = script.truncated(count);
    }
    let expected = match &cli.expect {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            BeliefGrid::parse_sequence(&text, cli.dim)?
        }
        None => Vec::new(),
    };

    let mut finder = EnvelopeFinder::new(config, world)?;
    finder.load_steps(script)?;
    println!("{}", finder.state());

    let mut mismatches = 0usize;
    while finder.steps_remaining() > 0 {
        let report = finder.run_next_step()?;
        if cli.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("step {} at {}: {}", report.step, report.position, report.reading);
            println!("{}", finder.state());
        }
        if let Some(want) = expected.get(report.step - 1) {
            if want != finder.state() {
                mismatches += 1;
                eprintln!("step {}: state differs from expected\n{want}", report.step);
            }
        }
    }

    if let Some(cell) = finder.state().confirmed() {
        println!("envelope at {cell}");
    }
    if mismatches > 0 {
        anyhow::bail!("{mismatches} step(s) differ from the expected states");
    }
    Ok(())
}
