//! Refresh coordination for a selected location.
//!
//! [`DataOrchestrator`] holds the fetch logic. [`DataOrchestrator::spawn`]
//! moves it into an actor task that owns the [`ViewState`], the periodic
//! refresh timer and the local-clock timer, and publishes every state change
//! on a watch channel.
//!
//! Every location change bumps a generation counter. Timer ticks and fetch
//! results carry the generation they were started under, and anything that
//! arrives for an older generation is dropped, so a slow response for a
//! previous location can never overwrite the current one.

use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender},
        watch,
    },
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    api::{AirQualityApi, DEFAULT_REQUEST_TIMEOUT, TimeLimitedApi},
    config::Config,
    error::{ApiError, OrchestratorError},
    model::{CurrentReading, Location},
    pollutant::Pollutant,
    snapshot::SnapshotFetcher,
    view_state::{CycleOutcome, ViewState},
};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);
pub const CLOCK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub tracked: Vec<Pollutant>,
    pub initial_pollutant: Pollutant,
    pub refresh_interval: Duration,
    pub clock_interval: Duration,
    pub forecast_hours: u32,

    /// Per-request bound; a request that outlasts it counts as failed.
    pub request_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            tracked: Pollutant::all().to_vec(),
            initial_pollutant: Pollutant::default(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            clock_interval: CLOCK_INTERVAL,
            forecast_hours: crate::config::DEFAULT_FORECAST_HOURS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl OrchestratorSettings {
    /// Deduplicate the tracked set and reject settings the actor cannot run.
    fn validated(mut self) -> Result<Self, OrchestratorError> {
        self.tracked.sort();
        self.tracked.dedup();

        if self.tracked.is_empty() {
            return Err(OrchestratorError::NothingTracked);
        }
        if !self.tracked.contains(&self.initial_pollutant) {
            return Err(OrchestratorError::NotTracked(self.initial_pollutant));
        }
        for (name, interval) in [
            ("refresh", self.refresh_interval),
            ("clock", self.clock_interval),
            ("request timeout", self.request_timeout),
        ] {
            if interval.is_zero() {
                return Err(OrchestratorError::ZeroInterval(name));
            }
        }
        if self.forecast_hours == 0 {
            return Err(OrchestratorError::ZeroForecastHours);
        }
        Ok(self)
    }
}

impl From<&Config> for OrchestratorSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            tracked: cfg.tracked(),
            initial_pollutant: cfg.default_pollutant,
            refresh_interval: cfg.refresh_interval(),
            clock_interval: CLOCK_INTERVAL,
            forecast_hours: cfg.forecast_hours,
            request_timeout: cfg.request_timeout(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataOrchestrator {
    api: Arc<dyn AirQualityApi>,
    snapshots: SnapshotFetcher,
    settings: OrchestratorSettings,
}

impl DataOrchestrator {
    /// Every call to `api` is bounded by `settings.request_timeout`.
    pub fn new(
        api: Arc<dyn AirQualityApi>,
        settings: OrchestratorSettings,
    ) -> Result<Self, OrchestratorError> {
        let settings = settings.validated()?;
        let api: Arc<dyn AirQualityApi> =
            Arc::new(TimeLimitedApi::new(api, settings.request_timeout));
        Ok(Self { snapshots: SnapshotFetcher::new(api.clone()), api, settings })
    }

    /// One full cycle: the five joined fetches, then a snapshot per tracked
    /// pollutant. Nothing here fails; failures are carried in the outcome.
    pub(crate) async fn run_cycle(&self, location: &Location, pollutant: Pollutant) -> CycleOutcome {
        tracing::debug!(location = %location.name, %pollutant, "full refresh started");

        let (current, forecast, alerts, catalog, overall_aqi) = tokio::join!(
            self.api.air_quality(location, pollutant),
            self.api.forecast(location, self.settings.forecast_hours),
            self.api.alerts(location),
            self.api.pollutants(),
            self.api.overall_aqi(location),
        );

        let snapshots = self.snapshots.fetch_all(location, &self.settings.tracked).await;

        CycleOutcome { pollutant, current, forecast, alerts, catalog, overall_aqi, snapshots }
    }

    pub(crate) async fn fetch_current(
        &self,
        location: &Location,
        pollutant: Pollutant,
    ) -> Result<CurrentReading, ApiError> {
        tracing::debug!(location = %location.name, %pollutant, "pollutant refresh started");
        self.api.air_quality(location, pollutant).await
    }

    /// Start the actor. The task ends on [`OrchestratorHandle::shutdown`] or
    /// once every handle has been dropped.
    pub fn spawn(self) -> (OrchestratorHandle, JoinHandle<()>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let initial = ViewState::new(self.settings.initial_pollutant);
        let (state_tx, state_rx) = watch::channel(initial.clone());

        let handle = OrchestratorHandle {
            events: events_tx.clone(),
            state: state_rx,
            tracked: self.settings.tracked.clone().into(),
        };

        let actor = Actor {
            core: Arc::new(self),
            state: initial,
            state_tx,
            events: events_tx.downgrade(),
            generation: 0,
            timers: Timers::default(),
            cycle: None,
            narrow_seq: 0,
        };
        drop(events_tx);

        let task = tokio::spawn(actor.run(events_rx));
        (handle, task)
    }
}

#[derive(Debug)]
enum Command {
    SetLocation(Location),
    ClearLocation,
    SelectPollutant(Pollutant),
    RefreshNow,
    Shutdown,
}

#[derive(Debug)]
enum Event {
    Command(Command),
    RefreshTick { generation: u64 },
    ClockTick { generation: u64 },
    CycleDone { generation: u64, outcome: CycleOutcome },
    NarrowDone {
        generation: u64,
        seq: u64,
        pollutant: Pollutant,
        current: Result<CurrentReading, ApiError>,
    },
}

/// Cloneable front door to a running orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    events: UnboundedSender<Event>,
    state: watch::Receiver<ViewState>,
    tracked: Arc<[Pollutant]>,
}

impl OrchestratorHandle {
    fn send(&self, command: Command) -> Result<(), OrchestratorError> {
        self.events.send(Event::Command(command)).map_err(|_| OrchestratorError::Stopped)
    }

    /// Replace the location; starts a full cycle and re-arms both timers.
    pub fn set_location(&self, location: Location) -> Result<(), OrchestratorError> {
        self.send(Command::SetLocation(location))
    }

    /// Disarm timers and return to the idle state.
    pub fn clear_location(&self) -> Result<(), OrchestratorError> {
        self.send(Command::ClearLocation)
    }

    pub fn select_pollutant(&self, pollutant: Pollutant) -> Result<(), OrchestratorError> {
        if !self.tracked.contains(&pollutant) {
            return Err(OrchestratorError::NotTracked(pollutant));
        }
        self.send(Command::SelectPollutant(pollutant))
    }

    /// Run a full cycle now without touching the periodic timer.
    pub fn refresh_now(&self) -> Result<(), OrchestratorError> {
        self.send(Command::RefreshNow)
    }

    pub fn shutdown(&self) -> Result<(), OrchestratorError> {
        self.send(Command::Shutdown)
    }

    pub fn tracked(&self) -> &[Pollutant] {
        &self.tracked
    }

    /// Copy of the latest published state.
    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.clone()
    }
}

/// Timers bound to one location generation.
#[derive(Debug, Default)]
struct Timers {
    refresh: Option<JoinHandle<()>>,
    clock: Option<JoinHandle<()>>,
}

impl Timers {
    fn arm(&mut self, generation: u64, settings: &OrchestratorSettings, events: &WeakUnboundedSender<Event>) {
        self.disarm();
        self.refresh = Some(spawn_ticker(settings.refresh_interval, events.clone(), move || {
            Event::RefreshTick { generation }
        }));
        self.clock = Some(spawn_ticker(settings.clock_interval, events.clone(), move || {
            Event::ClockTick { generation }
        }));
    }

    fn disarm(&mut self) {
        for handle in [self.refresh.take(), self.clock.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// First tick fires one `period` after arming.
fn spawn_ticker<F>(period: Duration, events: WeakUnboundedSender<Event>, make: F) -> JoinHandle<()>
where
    F: Fn() -> Event + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let Some(tx) = events.upgrade() else { break };
            if tx.send(make()).is_err() {
                break;
            }
        }
    })
}

struct InFlight {
    generation: u64,
    task: JoinHandle<()>,
}

struct Actor {
    core: Arc<DataOrchestrator>,
    state: ViewState,
    state_tx: watch::Sender<ViewState>,
    events: WeakUnboundedSender<Event>,
    generation: u64,
    timers: Timers,
    cycle: Option<InFlight>,
    narrow_seq: u64,
}

impl Actor {
    async fn run(mut self, mut events: UnboundedReceiver<Event>) {
        while let Some(event) = events.recv().await {
            match event {
                Event::Command(Command::Shutdown) => break,
                Event::Command(command) => self.on_command(command),
                Event::RefreshTick { generation } if generation == self.generation => {
                    tracing::debug!(generation, "periodic refresh");
                    self.start_cycle();
                }
                Event::ClockTick { generation } if generation == self.generation => {
                    self.state.tick_clock(Utc::now());
                    self.publish();
                }
                Event::CycleDone { generation, outcome } if generation == self.generation => {
                    self.cycle = None;
                    let apply_current = outcome.pollutant == self.state.selected_pollutant;
                    self.state.apply_cycle(outcome, apply_current, Utc::now());
                    tracing::info!(
                        location = self.location_name(),
                        data_available = self.state.data_available(),
                        "refresh cycle complete"
                    );
                    self.publish();
                }
                Event::NarrowDone { generation, seq, pollutant, current }
                    if generation == self.generation =>
                {
                    self.state.apply_narrow(pollutant, current, seq == self.narrow_seq);
                    self.publish();
                }
                stale => tracing::debug!(?stale, current = self.generation, "dropping stale event"),
            }
        }

        self.stop_all();
        tracing::debug!("orchestrator stopped");
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::SetLocation(location) => {
                tracing::info!(location = %location.name, lat = location.lat, lon = location.lon, "location changed");
                self.stop_all();
                self.generation += 1;
                self.state.reset_for(Some(location), Utc::now());
                self.timers.arm(self.generation, &self.core.settings, &self.events);
                self.start_cycle();
            }
            Command::ClearLocation => {
                tracing::info!("location cleared");
                self.stop_all();
                self.generation += 1;
                self.state.reset_for(None, Utc::now());
                self.publish();
            }
            Command::SelectPollutant(pollutant) => self.start_narrow(pollutant),
            Command::RefreshNow => self.start_cycle(),
            Command::Shutdown => {}
        }
    }

    fn location_name(&self) -> &str {
        self.state.location.as_ref().map(|l| l.name.as_str()).unwrap_or_default()
    }

    fn stop_all(&mut self) {
        self.timers.disarm();
        if let Some(inflight) = self.cycle.take() {
            inflight.task.abort();
        }
    }

    fn start_cycle(&mut self) {
        let Some(location) = self.state.location.clone() else {
            return;
        };

        if self.cycle.as_ref().is_some_and(|c| c.generation == self.generation) {
            tracing::debug!("refresh already in flight, skipping");
            return;
        }
        let Some(tx) = self.events.upgrade() else {
            return;
        };

        self.state.begin_cycle();
        self.publish();

        let core = self.core.clone();
        let generation = self.generation;
        let pollutant = self.state.selected_pollutant;

        let task = tokio::spawn(async move {
            let outcome = core.run_cycle(&location, pollutant).await;
            let _ = tx.send(Event::CycleDone { generation, outcome });
        });
        self.cycle = Some(InFlight { generation, task });
    }

    fn start_narrow(&mut self, pollutant: Pollutant) {
        self.state.begin_narrow(pollutant);
        self.publish();

        let Some(location) = self.state.location.clone() else {
            return;
        };
        let Some(tx) = self.events.upgrade() else {
            return;
        };

        self.narrow_seq += 1;
        let seq = self.narrow_seq;
        let generation = self.generation;
        let core = self.core.clone();

        tokio::spawn(async move {
            let current = core.fetch_current(&location, pollutant).await;
            let _ = tx.send(Event::NarrowDone { generation, seq, pollutant, current });
        });
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}
