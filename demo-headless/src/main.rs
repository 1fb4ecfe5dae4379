use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wildfire_ca_core::{
    Cell, Coordinator, FireModel, FrameSink, RoundReport, SimError, SimResult, SimulationConfig,
    SpreadParams, StopReason, Wind, WindDirection,
};

/// Partitioned wildfire cellular automaton, headless front end
#[derive(Parser, Debug)]
#[command(name = "wildfire-ca")]
#[command(about = "Stochastic wildfire cellular automaton split across worker threads", long_about = None)]
struct Args {
    /// JSON config file; command-line values override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid rows
    #[arg(long)]
    rows: Option<usize>,

    /// Grid columns
    #[arg(long)]
    cols: Option<usize>,

    /// Worker threads (one region each)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Steps to run
    #[arg(short, long)]
    steps: Option<u64>,

    /// Run seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Wind direction (N, NE, E, SE, S, SW, W, NW)
    #[arg(long)]
    wind_direction: Option<WindDirection>,

    /// Wind speed
    #[arg(long)]
    wind_speed: Option<f32>,

    /// Fire model (intensity or owned)
    #[arg(short, long)]
    model: Option<FireModel>,

    /// Pause between frames in milliseconds
    #[arg(long)]
    frame_interval: Option<u64>,

    /// Draw the grid every N steps (0 = never)
    #[arg(short, long, default_value_t = 10)]
    render_every: u64,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

impl Args {
    /// Defaults, then the config file, then command-line overrides
    fn resolve_config(&self) -> SimResult<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_json_file(path)?,
            None => SimulationConfig::default(),
        };

        if let Some(model) = self.model {
            if model != config.spread.model {
                config.spread = SpreadParams::for_model(model);
            }
        }
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(cols) = self.cols {
            config.cols = cols;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(steps) = self.steps {
            config.max_steps = steps;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(interval) = self.frame_interval {
            config.frame_interval_ms = interval;
        }
        config.wind = Wind::new(
            self.wind_direction.unwrap_or(config.wind.direction),
            self.wind_speed.unwrap_or(config.wind.speed),
        );

        config.validate()?;
        Ok(config)
    }
}

/// Machine the run is on; informational only
struct HostInfo {
    hostname: String,
    os: &'static str,
    cores: usize,
}

impl HostInfo {
    fn detect() -> Self {
        let hostname = std::env::var("HOSTNAME")
            .or_else(|_| std::env::var("COMPUTERNAME"))
            .ok()
            .or_else(|| {
                std::fs::read_to_string("/etc/hostname")
                    .ok()
                    .map(|name| name.trim().to_string())
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        let cores = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        Self {
            hostname,
            os: std::env::consts::OS,
            cores,
        }
    }
}

/// Prints a stats row every step and the whole grid every `render_every` steps
struct AsciiRenderer {
    render_every: u64,
    model: FireModel,
}

impl AsciiRenderer {
    fn glyph(code: u8, tag: u16, model: FireModel) -> char {
        match code {
            Cell::EMPTY => '.',
            Cell::TREE_YOUNG => ',',
            Cell::TREE_MATURE => 't',
            Cell::TREE_OLD => 'T',
            Cell::FIRE_LOW if model == FireModel::Owned => {
                char::from(b'A' + (tag % 26) as u8)
            }
            Cell::FIRE_LOW => '+',
            Cell::FIRE_MEDIUM => '*',
            Cell::FIRE_HIGH => '#',
            Cell::BURNED => '-',
            Cell::ASH => '_',
            Cell::WATER => '~',
            _ => '?',
        }
    }

    fn draw(&self, report: &RoundReport) {
        let grid = &report.grid;
        let mut out = String::with_capacity((grid.cols() + 1) * grid.rows());
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let (code, tag) = grid.render_pair(row, col);
                out.push(Self::glyph(code, tag, self.model));
            }
            out.push('\n');
        }
        println!("\n{out}");
    }
}

impl FrameSink for AsciiRenderer {
    fn frame(&mut self, report: &RoundReport) {
        let s = &report.stats;
        let c = &report.counts;
        println!(
            "{:6} | {:6} | {:6} | {:6} | {:6} | {:7} | {:12} | {}",
            report.step,
            s.trees,
            s.fires,
            s.burned,
            s.ash,
            c.ignited,
            c.extinguished,
            if report.is_complete() {
                String::from("-")
            } else {
                format!("{:?}", report.stale_workers)
            }
        );
        if self.render_every > 0 && report.step % self.render_every == 0 {
            self.draw(report);
        }
    }
}

fn run(args: &Args) -> SimResult<()> {
    let config = args.resolve_config()?;
    if args.dump_config {
        let json = config
            .to_json_pretty()
            .map_err(|e| SimError::invalid_config("config", e.to_string()))?;
        println!("{json}");
        return Ok(());
    }

    let host = HostInfo::detect();
    println!("=== Wildfire Cellular Automaton ===\n");
    println!("Host: {} ({}, {} cores)", host.hostname, host.os, host.cores);
    println!(
        "Grid: {}x{}, {} worker(s), {} fire model",
        config.rows, config.cols, config.workers, config.spread.model
    );
    println!(
        "Wind: {} at {:.1}, {} steps\n",
        config.wind.direction, config.wind.speed, config.max_steps
    );

    let model = config.spread.model;
    let mut coordinator = Coordinator::spawn(config)?;
    info!("Run seed {}", coordinator.seed());

    match coordinator.snapshot() {
        Ok(initial) => {
            let s = initial.stats();
            println!(
                "Initial: {} trees, {} fires, {} empty, {} water\n",
                s.trees, s.fires, s.empty, s.water
            );
        }
        Err(e) => warn!("Initial snapshot unavailable: {}", e),
    }

    println!("  Step |  Trees |  Fires | Burned |    Ash | Ignited | Extinguished | Stale");
    println!("-------|--------|--------|--------|--------|---------|--------------|------");

    let mut renderer = AsciiRenderer {
        render_every: args.render_every,
        model,
    };
    let summary = coordinator.run(&mut renderer)?;
    coordinator.shutdown();

    println!("\n=== Simulation Complete ===");
    println!("Rounds run: {}", summary.rounds);
    println!("Final step: {}", summary.final_step);
    match summary.reason {
        StopReason::Completed => println!("Reached the step limit"),
        StopReason::Stopped => println!("Stopped by operator"),
        StopReason::WorkersLost => println!("Every worker was lost"),
    }
    if let Some(s) = summary.final_stats {
        println!(
            "Trees: {}, burning: {}, burned: {}, ash: {} (of {} cells)",
            s.trees, s.fires, s.burned, s.ash, s.total
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
