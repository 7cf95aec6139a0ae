use std::sync::Arc;

use airq_core::{
    AirQualityApi, Config, ConfiguredPosition, Coordinates, DataOrchestrator, HttpAirQualityApi,
    Location, LocationResolver, NominatimGeocoder, OrchestratorHandle, OrchestratorSettings,
    Pollutant, ViewState, location::MIN_QUERY_CHARS,
};
use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, CustomType, MultiSelect, Select, Text};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "airq", version, about = "Air-quality CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where to look: a place name, or the configured home position.
#[derive(Debug, Args)]
pub struct Target {
    /// Place name to search for, e.g. "Paris" or "Mexico City".
    #[arg(required_unless_present = "here")]
    query: Option<String>,

    /// Use the configured home position instead of a search.
    #[arg(long, conflicts_with = "query")]
    here: bool,

    /// Take the first search result without asking.
    #[arg(long)]
    first: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively edit the configuration file.
    Configure,

    /// List places matching a query.
    Search {
        query: String,
    },

    /// Fetch everything once for a place and print it.
    Show {
        #[command(flatten)]
        target: Target,

        /// Pollutant to focus on (NO2, O3, HCHO).
        #[arg(long, short)]
        pollutant: Option<String>,
    },

    /// Keep a place on screen, refreshing on the configured interval.
    ///
    /// While running, type a pollutant name to switch focus, `r` to refresh,
    /// `t` for the local time and `q` to quit.
    Watch {
        #[command(flatten)]
        target: Target,

        #[arg(long, short)]
        pollutant: Option<String>,
    },

    /// Describe the pollutants the service knows about.
    Pollutants,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        // `configure` must be able to open a file that no longer validates.
        let cfg = if matches!(self.command, Command::Configure) {
            Config::load_unvalidated()?
        } else {
            Config::load()?
        };

        match self.command {
            Command::Configure => configure(cfg).await,
            Command::Search { query } => search(&cfg, &query).await,
            Command::Show { target, pollutant } => {
                let location = resolve_target(&resolver(&cfg), &target).await?;
                show(&cfg, location, pollutant.as_deref()).await
            }
            Command::Watch { target, pollutant } => {
                let location = resolve_target(&resolver(&cfg), &target).await?;
                watch(&cfg, location, pollutant.as_deref()).await
            }
            Command::Pollutants => pollutants(&cfg).await,
        }
    }
}

fn resolver(cfg: &Config) -> LocationResolver {
    LocationResolver::new(
        Box::new(NominatimGeocoder::new(&cfg.geocoder_base_url)),
        Box::new(ConfiguredPosition::new(cfg.home)),
    )
    .with_search_limit(cfg.search_limit)
}

fn start_orchestrator(cfg: &Config) -> Result<(OrchestratorHandle, tokio::task::JoinHandle<()>)> {
    let api = Arc::new(HttpAirQualityApi::with_timeout(&cfg.api_base_url, cfg.request_timeout()));
    let orchestrator = DataOrchestrator::new(api, OrchestratorSettings::from(cfg))
        .context("Invalid refresh settings")?;
    Ok(orchestrator.spawn())
}

async fn resolve_target(resolver: &LocationResolver, target: &Target) -> Result<Location> {
    if target.here {
        return resolver
            .resolve_current_device_position()
            .await
            .context("Could not determine your position");
    }

    let query = target.query.as_deref().ok_or_else(|| anyhow!("Provide a place name or --here"))?;
    let mut candidates = resolver.search_by_text(query).await;

    if candidates.is_empty() {
        bail!(
            "No places found for '{query}'.\n\
             Hint: queries need at least {MIN_QUERY_CHARS} characters."
        );
    }

    let chosen = if candidates.len() == 1 || target.first {
        candidates.swap_remove(0)
    } else {
        let names: Vec<String> = candidates.iter().map(|c| c.display_name.clone()).collect();
        let picked = Select::new("Which place?", names).raw_prompt()?;
        candidates.swap_remove(picked.index)
    };

    tracing::debug!(place = %chosen.display_name, "place selected");
    Ok(LocationResolver::select_candidate(&chosen))
}

async fn search(cfg: &Config, query: &str) -> Result<()> {
    if query.trim().chars().count() < MIN_QUERY_CHARS {
        println!("Type at least {MIN_QUERY_CHARS} characters to search.");
        return Ok(());
    }

    let candidates = resolver(cfg).search_by_text(query).await;
    if candidates.is_empty() {
        println!("No places found for '{query}'.");
    }
    for (i, c) in candidates.iter().enumerate() {
        println!("{:>2}. {} ({:.4}, {:.4})", i + 1, c.display_name, c.lat, c.lon);
    }
    Ok(())
}

/// Wait until a full cycle (and any pollutant refresh) has been applied.
async fn first_complete_state(handle: &OrchestratorHandle) -> Result<ViewState> {
    let mut rx = handle.subscribe();
    let state = rx
        .wait_for(|s| s.last_update.is_some() && !s.loading && !s.pollutant_loading)
        .await
        .map_err(|_| anyhow!("The refresh task stopped unexpectedly"))?;
    Ok(state.clone())
}

fn select_requested(handle: &OrchestratorHandle, pollutant: Option<&str>) -> Result<()> {
    if let Some(name) = pollutant {
        handle.select_pollutant(Pollutant::try_from(name)?)?;
    }
    Ok(())
}

async fn show(cfg: &Config, location: Location, pollutant: Option<&str>) -> Result<()> {
    let (handle, task) = start_orchestrator(cfg)?;
    select_requested(&handle, pollutant)?;
    handle.set_location(location)?;

    let state = first_complete_state(&handle).await?;
    print!("{}", render::render(&state));

    handle.shutdown()?;
    task.await.context("Refresh task panicked")?;
    Ok(())
}

async fn watch(cfg: &Config, location: Location, pollutant: Option<&str>) -> Result<()> {
    let (handle, task) = start_orchestrator(cfg)?;
    select_requested(&handle, pollutant)?;
    handle.set_location(location)?;

    println!("{}", render::WATCH_HELP);

    let mut rx = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_key = None;

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                if state.loading || state.pollutant_loading || state.last_update.is_none() {
                    continue;
                }
                let key = render::RenderKey::of(&state);
                if last_key.as_ref() != Some(&key) {
                    print!("{}", render::render(&state));
                    last_key = Some(key);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                if !handle_watch_input(&handle, line.trim())? {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown()?;
    task.await.context("Refresh task panicked")?;
    Ok(())
}

/// Returns `false` when the user asked to quit.
fn handle_watch_input(handle: &OrchestratorHandle, input: &str) -> Result<bool> {
    match input {
        "" => {}
        "q" | "quit" => return Ok(false),
        "r" | "refresh" => handle.refresh_now()?,
        "t" | "time" => println!("{}", render::clock_line(&handle.snapshot())),
        "?" | "help" => println!("{}", render::WATCH_HELP),
        other => match Pollutant::try_from(other) {
            Ok(p) => {
                if let Err(e) = handle.select_pollutant(p) {
                    println!("{e}");
                }
            }
            Err(e) => println!("{e}"),
        },
    }
    Ok(true)
}

async fn pollutants(cfg: &Config) -> Result<()> {
    let api = HttpAirQualityApi::with_timeout(&cfg.api_base_url, cfg.request_timeout());
    let catalog = api.pollutants().await.context("Failed to fetch pollutant catalog")?;
    print!("{}", render::render_catalog(&catalog));
    Ok(())
}

async fn configure(mut cfg: Config) -> Result<()> {
    cfg.api_base_url = Text::new("Air-quality service URL:")
        .with_default(&cfg.api_base_url)
        .prompt()?;

    cfg.geocoder_base_url = Text::new("Geocoder URL:")
        .with_default(&cfg.geocoder_base_url)
        .prompt()?;

    let all = Pollutant::all().to_vec();
    let current: Vec<usize> = all
        .iter()
        .enumerate()
        .filter(|(_, p)| cfg.tracked_pollutants.contains(p))
        .map(|(i, _)| i)
        .collect();
    let tracked = MultiSelect::new("Tracked pollutants:", all).with_default(&current).prompt()?;
    if tracked.is_empty() {
        bail!("Track at least one pollutant");
    }
    cfg.tracked_pollutants = tracked.clone();

    let start = tracked.iter().position(|p| *p == cfg.default_pollutant).unwrap_or(0);
    cfg.default_pollutant = Select::new("Default pollutant:", tracked)
        .with_starting_cursor(start)
        .prompt()?;

    cfg.refresh_interval_secs = CustomType::<u64>::new("Refresh interval (seconds):")
        .with_default(cfg.refresh_interval_secs)
        .with_error_message("Please type a whole number of seconds")
        .prompt()?;

    if Confirm::new("Set a home position for `--here`?").with_default(cfg.home.is_none()).prompt()? {
        let query = Text::new("Home place name:").prompt()?;
        let target = Target { query: Some(query), here: false, first: false };
        let home = resolve_target(&resolver(&cfg), &target).await?;
        println!("Home set to {} ({:.4}, {:.4})", home.name, home.lat, home.lon);
        cfg.home = Some(Coordinates { lat: home.lat, lon: home.lon });
    }

    cfg.validate()?;
    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
