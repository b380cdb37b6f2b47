mod core;
mod engine;
mod renderer;
mod shared;
mod store;
mod sync;
mod ui;
mod utils;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::commands;
use crate::renderer::FaceStyle;
use crate::shared::{config::AppConfig, constants};
use crate::store::{InMemoryStore, JsonFileStore, MatchId, MatchState, MatchStore, MatchUpdate};
use crate::ui::interactive::WatchOptions;

#[derive(Parser)]
#[command(author, version, about = "Shared match clock for the terminal", long_about = None)]
struct Cli {
    /// Match store file (overrides the config file)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Config file
    #[arg(short, long, global = true, default_value = constants::CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a paused match
    New {
        /// Match id; defaults to the next free one
        #[arg(long)]
        id: Option<u64>,
        /// Seconds on the clock; defaults to the configured match duration
        #[arg(short, long)]
        duration: Option<u32>,
    },
    /// List every match with its current time
    List,
    /// Print one match
    Show {
        id: u64,
        /// Print the stored state as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Pause a running match or resume a paused one
    Toggle { id: u64 },
    /// Put the full duration back on the clock, paused
    Reset { id: u64 },
    /// Full-screen clock for one match
    Watch {
        id: u64,
        /// Hide the controls and never write to the store
        #[arg(short, long, default_value_t = false)]
        read_only: bool,
        /// Show the local shot clock panel
        #[arg(long, default_value_t = false)]
        shot_clock: bool,
        #[arg(short, long, value_enum, default_value_t = FaceStyle::Big)]
        face: FaceStyle,
    },
    /// Print a read-only clock line until Ctrl-C
    Follow { id: u64 },
    /// Pick a match and a mode interactively
    Menu {
        #[arg(short, long, value_enum, default_value_t = FaceStyle::Big)]
        face: FaceStyle,
    },
    /// Watch a throwaway in-memory match
    Demo {
        /// Seconds on the clock
        #[arg(short, long)]
        duration: Option<u32>,
        /// Start with the clock running
        #[arg(long, default_value_t = false)]
        running: bool,
        #[arg(short, long, value_enum, default_value_t = FaceStyle::Big)]
        face: FaceStyle,
    },
}

fn main() -> Result<()> {
    crate::utils::logger::init();

    // A previous crash may have left the terminal in raw mode.
    let _ = crossterm::terminal::disable_raw_mode();

    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(path) = cli.store {
        config.store_path = path;
    }
    crate::utils::logger::debug(&format!("config: {:?}", config));

    let store = JsonFileStore::open(config.store_path.clone());
    let now = Utc::now();

    match cli.command {
        Commands::New { id, duration } => {
            let duration = duration.unwrap_or(config.match_duration_secs);
            let created = commands::create_match(&store, id, duration, now)?;
            println!(
                "Created match {} in {}",
                created.match_id,
                store.path().display()
            );
        }
        Commands::List => {
            let lines = commands::list_lines(&store, now)?;
            if lines.is_empty() {
                println!("No matches in {}", store.path().display());
            }
            for line in lines {
                println!("{}", line);
            }
        }
        Commands::Show { id, json } => {
            let state = store
                .fetch(MatchId(id))
                .with_context(|| format!("cannot show match {}", MatchId(id)))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!("{}", commands::summary_line(&state, now));
            }
        }
        Commands::Toggle { id } => {
            let (transition, state) =
                commands::toggle_match(&store, MatchId(id), config.match_duration_secs, now)?;
            println!("{}: {}", transition, commands::summary_line(&state, now));
        }
        Commands::Reset { id } => {
            let state = commands::reset_match(&store, MatchId(id), config.match_duration_secs, now)?;
            println!("reset: {}", commands::summary_line(&state, now));
        }
        Commands::Watch {
            id,
            read_only,
            shot_clock,
            face,
        } => {
            let options = WatchOptions {
                view: config.view_options(read_only),
                shot_clock: shot_clock.then_some(config.shot_clock_secs),
                face,
            };
            crate::ui::interactive::run_match_clock(store, MatchId(id), options)?;
        }
        Commands::Follow { id } => {
            crate::ui::follow::run_follow(store, MatchId(id), config.view_options(true))?;
        }
        Commands::Menu { face } => {
            crate::core::launcher::run(store, &config, face)?;
        }
        Commands::Demo {
            duration,
            running,
            face,
        } => {
            let demo = InMemoryStore::new();
            let duration = duration.unwrap_or(config.match_duration_secs);
            let state = demo.create(MatchState::new(MatchId(1), duration, now))?;
            if running {
                demo.update(state.match_id, &MatchUpdate::resume(now))?;
            }

            let options = WatchOptions {
                view: config.view_options(false),
                shot_clock: Some(config.shot_clock_secs),
                face,
            };
            crate::ui::interactive::run_match_clock(demo, state.match_id, options)?;
        }
    }

    Ok(())
}
