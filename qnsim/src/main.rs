//! Steps through a queueing network simulation in the terminal.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::default_trait_access,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use std::convert::TryFrom;
use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use eyre::WrapErr;
use indicatif::{ProgressBar, ProgressStyle};

use qnsim::{format_time, RenderOptions, Simulation, Step, Topology};

/// Built-in topologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
enum Builtin {
    /// See [`Topology::cheese_shop`].
    CheeseShop,
    /// See [`Topology::cheese_shop_with_tasting_station`].
    TastingStation,
}

/// Runs a queueing network simulation one event at a time.
#[derive(Parser)]
#[clap(version)]
struct Opt {
    /// Path to a JSON topology description. Takes precedence over `--builtin`.
    #[clap(long)]
    topology: Option<PathBuf>,

    /// Built-in topology: `cheese-shop` or `tasting-station`.
    #[clap(long, default_value = "cheese-shop")]
    builtin: Builtin,

    /// Random seed. If missing, the generator is seeded from system entropy.
    #[clap(long)]
    seed: Option<u64>,

    /// Runs without interaction until the clock passes this many minutes, then prints
    /// the final status.
    #[clap(long)]
    until: Option<f64>,

    /// Verbosity.
    #[clap(short, long, parse(from_occurrences))]
    verbose: i32,

    /// Store the logs this file.
    #[clap(long)]
    log_output: Option<PathBuf>,

    /// Do not log to the stderr.
    #[clap(long)]
    no_stderr: bool,
}

struct RunConfig {
    topology: Topology,
    seed: Option<u64>,
    until: Option<f64>,
}

impl TryFrom<&Opt> for RunConfig {
    type Error = eyre::Error;
    fn try_from(opt: &Opt) -> eyre::Result<Self> {
        let topology = if let Some(path) = &opt.topology {
            let file = File::open(path)
                .wrap_err_with(|| format!("unable to open topology file: {}", path.display()))?;
            Topology::from_reader(file)
                .wrap_err_with(|| format!("unable to load topology from {}", path.display()))?
        } else {
            match opt.builtin {
                Builtin::CheeseShop => Topology::cheese_shop(),
                Builtin::TastingStation => Topology::cheese_shop_with_tasting_station(),
            }
        };
        if let Some(until) = opt.until {
            eyre::ensure!(
                until.is_finite() && until >= 0.0,
                "invalid end time: {}",
                until
            );
        }
        Ok(Self {
            topology,
            seed: opt.seed,
            until: opt.until,
        })
    }
}

impl RunConfig {
    fn simulation(self) -> Simulation {
        match self.seed {
            Some(seed) => Simulation::with_seed(self.topology, seed),
            None => Simulation::new(self.topology),
        }
    }

    fn run(self) -> eyre::Result<()> {
        let until = self.until;
        let mut simulation = self.simulation();
        match until {
            Some(until) => run_until(&mut simulation, until),
            None => run_interactive(&mut simulation),
        }
    }
}

/// Advances the simulation until `until`, showing the progress, and prints the final status.
fn run_until(simulation: &mut Simulation, until: f64) -> eyre::Result<()> {
    let pb = ProgressBar::new(until.ceil() as u64)
        .with_style(ProgressStyle::default_bar().template("{msg} {wide_bar} {percent}%"));
    let mut events = 0_usize;
    while simulation.time() <= until {
        if let Step::Idle = simulation.advance()? {
            break;
        }
        events += 1;
        let minutes = simulation.time() as u64;
        if pb.position() < minutes {
            pb.set_position(minutes);
            pb.set_message(&format!(
                "[{time}] [E={events}]",
                time = format_time(simulation.time()),
                events = events
            ));
        }
    }
    pb.finish();
    log::info!("Processed {} events", events);
    println!("{}", simulation.status(RenderOptions::default()));
    Ok(())
}

/// Advances once and then one step per line of input, until `q` or the end of input.
fn run_interactive(simulation: &mut Simulation) -> eyre::Result<()> {
    println!("{}", simulation.title());
    simulation.advance()?;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        println!("{}", simulation.status(RenderOptions::default()));
        match simulation.peek_next_event() {
            Some(next) => print!("Next: {} (Enter to continue, q to quit) ", next),
            None => print!("Nothing pending (Enter to continue, q to quit) "),
        }
        io::stdout().flush()?;
        match lines.next().transpose()? {
            Some(line) if line.trim() != "q" => {
                simulation.advance()?;
            }
            _ => break,
        }
    }
    Ok(())
}

/// Set up a logger based on the given user options.
fn set_up_logger(opt: &Opt) -> Result<(), fern::InitError> {
    let log_level = match opt.verbose {
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        3 => log::LevelFilter::Trace,
        _ => log::LevelFilter::Warn,
    };
    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .level(log_level);
    let dispatch = if let Some(path) = &opt.log_output {
        let _ = fs::remove_file(path);
        dispatch.chain(
            fs::OpenOptions::new()
                .write(true)
                .create(true)
                .append(false)
                .open(path)?,
        )
    } else {
        dispatch
    };
    let dispatch = if opt.no_stderr {
        dispatch
    } else {
        dispatch.chain(io::stderr())
    };
    dispatch.apply()?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::parse();
    set_up_logger(&opt)?;
    RunConfig::try_from(&opt)?.run()
}
