//! rover: run the field bot against the offline simulator.
//!
//! Loads the account and knobs from a JSON config file, logs in, and keeps
//! the control loop alive: a lost session gets a pause, a fresh login, and
//! a restart, exactly as an operator would do by hand.

mod settings;
mod sim;

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rover_core::bot::{Bot, SpeciesNames};
use rover_core::creature::{EvolutionTable, SpeciesId};
use rover_core::dump::SnapshotDump;
use rover_core::error::BotError;
use rover_core::geo::{Coord, DirectRouter};

use settings::Settings;
use sim::SimTransport;

/// rover, an automated field agent
#[derive(Parser, Debug)]
#[command(name = "rover")]
#[command(author, version, about = "Walks, spins, captures, and triages on its own", long_about = None)]
struct Args {
    /// Path to the JSON config file
    #[arg(short = 'c', long = "config", default_value = "config.json")]
    config: String,

    /// Index of the account entry in the config file
    #[arg(short = 'i', long = "account-index", default_value_t = 0)]
    account_index: usize,

    /// Start location as "lat,lng" (overrides the config file)
    #[arg(short = 'l', long = "location")]
    location: Option<String>,

    /// Seed for the offline simulator world
    #[arg(short = 's', long = "seed", default_value_t = 4)]
    seed: u64,

    /// Stop after this many cycles (default: run until stopped)
    #[arg(long = "cycles")]
    cycles: Option<u64>,

    /// Directory for snapshot dumps
    #[arg(long = "data-dir", default_value = "data_dumps")]
    data_dir: String,

    /// Debug logging
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let settings = Settings::load(&args.config)?;
    let account = settings.account(args.account_index)?.clone();

    let location = args
        .location
        .as_deref()
        .or(account.location.as_deref())
        .context("no start location given (use --location or the config file)")?;
    let start = parse_location(location)?;

    let mut config = settings.bot.clone();
    if config.evolutions.is_empty() {
        config.evolutions = EvolutionTable::from_entries(rover_data::DEFAULT_EVOLUTIONS);
    }
    if let Some(cycles) = args.cycles {
        config.max_cycles = Some(cycles);
    }

    let names = species_names();
    info!(
        username = %account.username,
        lat = start.lat,
        lng = start.lng,
        "starting rover"
    );

    // Restart with a fresh login whenever the session dies.
    loop {
        let mut transport = SimTransport::new(args.seed);
        if let Err(err) = transport.login(&account.username) {
            error!(%err, "login failed, retrying shortly");
            thread::sleep(settings.relogin_wait());
            continue;
        }

        let dump = SnapshotDump::new(&args.data_dir, &account.username);
        let mut bot = Bot::new(transport, DirectRouter, config.clone(), names.clone(), start)
            .with_dump(dump);

        match bot.run() {
            Ok(()) => {
                info!(captured = bot.captured_total(), "run finished");
                return Ok(());
            }
            Err(BotError::SessionExpired { reason }) => {
                error!(%reason, "session lost, restarting after a pause");
                thread::sleep(settings.relogin_wait());
            }
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "rover_core=debug,rover_cli=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Parse "lat,lng" or "lat,lng,alt".
fn parse_location(text: &str) -> Result<Coord> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != 2 && parts.len() != 3 {
        anyhow::bail!("location must be \"lat,lng\" or \"lat,lng,alt\", got {text:?}");
    }
    let lat: f64 = parts[0].parse().context("parsing latitude")?;
    let lng: f64 = parts[1].parse().context("parsing longitude")?;
    let mut coord = Coord::new(lat, lng);
    if parts.len() == 3 {
        coord.alt = parts[2].parse().context("parsing altitude")?;
    }
    Ok(coord)
}

fn species_names() -> SpeciesNames {
    rover_data::SPECIES_NAMES
        .iter()
        .map(|&(id, name)| (SpeciesId(id), name.to_string()))
        .collect()
}
