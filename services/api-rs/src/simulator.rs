//! The generator loop and the state it shares with the control API.

use std::sync::Arc;
use std::time::Duration;

use evsim_generator::{EventGenerator, Variant};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::{ConfigUpdate, StreamConfig};
use crate::dispatcher::Dispatcher;
use crate::event_log::{EventLog, LoggedEvent};

struct Shared {
    config: RwLock<StreamConfig>,
    log: Mutex<EventLog>,
    dispatcher: Dispatcher,
    generator: EventGenerator,
}

impl Shared {
    /// Builds one event for the category selected right now, sends it, logs it.
    async fn tick(&self) -> LoggedEvent {
        let industry = self.config.read().await.industry;
        let event = self.generator.generate(industry, &mut rand::thread_rng());
        self.dispatcher.dispatch(&event).await;
        let id = self.log.lock().await.push(event.clone());
        debug!(id, %industry, "event generated");
        LoggedEvent { id, event }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStatus {
    pub running: bool,
    pub interval_ms: f64,
    pub events_per_minute: u32,
    pub industry: evsim_generator::Industry,
    pub variant: Variant,
    pub collector_loaded: bool,
    pub total_events: u64,
    pub logged: usize,
    pub capacity: usize,
}

/// Holds the config, the log, the dispatcher, and the single timer task.
///
/// Every transition goes through the `timer` mutex, so there is never more
/// than one interval task alive.
pub struct Simulator {
    shared: Arc<Shared>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Simulator {
    pub fn new(config: StreamConfig, variant: Variant, dispatcher: Dispatcher) -> Self {
        Self {
            shared: Arc::new(Shared {
                config: RwLock::new(config),
                log: Mutex::new(EventLog::for_variant(variant)),
                dispatcher,
                generator: EventGenerator::new(variant),
            }),
            timer: Mutex::new(None),
        }
    }

    /// Loads the collector for the initial key and host, and starts the
    /// stream if the config asks for it.
    pub async fn init(&self) {
        let config = self.config().await;
        self.shared.dispatcher.load(&config.write_key, &config.api_host).await;
        if config.enabled {
            let mut timer = self.timer.lock().await;
            self.launch(&mut timer, config.interval());
        }
    }

    pub async fn config(&self) -> StreamConfig {
        self.shared.config.read().await.clone()
    }

    pub async fn is_running(&self) -> bool {
        is_live(&*self.timer.lock().await)
    }

    /// IDLE → RUNNING. Returns `false` if a timer is already running.
    pub async fn start(&self) -> bool {
        let mut timer = self.timer.lock().await;
        if is_live(&timer) {
            return false;
        }
        let interval = {
            let mut config = self.shared.config.write().await;
            config.enabled = true;
            config.interval()
        };
        self.launch(&mut timer, interval);
        true
    }

    /// RUNNING → IDLE. Returns `false` if nothing was running.
    pub async fn stop(&self) -> bool {
        let mut timer = self.timer.lock().await;
        self.shared.config.write().await.enabled = false;
        halt(&mut timer)
    }

    pub async fn toggle(&self) -> bool {
        let mut timer = self.timer.lock().await;
        let mut config = self.shared.config.write().await;
        if halt(&mut timer) {
            config.enabled = false;
            info!("event stream stopped");
            false
        } else {
            config.enabled = true;
            let interval = config.interval();
            drop(config);
            self.launch(&mut timer, interval);
            true
        }
    }

    /// Applies user input. Key/host changes reload the collector; a running
    /// stream is rescheduled on any key, host, rate or industry change.
    pub async fn update(&self, update: ConfigUpdate) -> StreamConfig {
        let mut timer = self.timer.lock().await;
        let (delta, config) = {
            let mut config = self.shared.config.write().await;
            let delta = config.apply(update);
            (delta, config.clone())
        };

        if delta.collector_changed {
            self.shared.dispatcher.load(&config.write_key, &config.api_host).await;
        }

        let running = is_live(&timer);
        if !config.enabled {
            if halt(&mut timer) {
                info!("event stream stopped");
            }
        } else if !running {
            self.launch(&mut timer, config.interval());
        } else if delta.restart_needed {
            halt(&mut timer);
            self.launch(&mut timer, config.interval());
        }
        config
    }

    /// Runs one generation step immediately, outside the timer. The returned
    /// entry is the one pushed, even if the log is cleared right after.
    pub async fn generate_once(&self) -> LoggedEvent {
        self.shared.tick().await
    }

    pub async fn events(&self, limit: Option<usize>) -> Vec<LoggedEvent> {
        self.shared.log.lock().await.list(limit)
    }

    pub async fn event(&self, id: u64) -> Option<LoggedEvent> {
        self.shared.log.lock().await.get(id).cloned()
    }

    pub async fn clear_events(&self) -> usize {
        let cleared = self.shared.log.lock().await.clear();
        info!(cleared, "event log cleared");
        cleared
    }

    pub async fn status(&self) -> StreamStatus {
        let running = self.is_running().await;
        let config = self.config().await;
        let collector_loaded = self.shared.dispatcher.is_loaded().await;
        let log = self.shared.log.lock().await;
        StreamStatus {
            running,
            interval_ms: config.interval().as_secs_f64() * 1000.0,
            events_per_minute: config.events_per_minute,
            industry: config.industry,
            variant: self.shared.generator.variant(),
            collector_loaded,
            total_events: log.total(),
            logged: log.len(),
            capacity: log.capacity(),
        }
    }

    fn launch(&self, timer: &mut Option<JoinHandle<()>>, period: Duration) {
        halt(timer);
        let shared = self.shared.clone();
        info!(interval_ms = period.as_millis() as u64, "event stream started");
        *timer = Some(tokio::spawn(run(shared, period)));
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.get_mut().take() {
            handle.abort();
        }
    }
}

/// First tick one period after start; late ticks are skipped, not replayed.
async fn run(shared: Arc<Shared>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        shared.tick().await;
    }
}

fn is_live(timer: &Option<JoinHandle<()>>) -> bool {
    timer.as_ref().is_some_and(|handle| !handle.is_finished())
}

fn halt(timer: &mut Option<JoinHandle<()>>) -> bool {
    match timer.take() {
        Some(handle) => {
            let live = !handle.is_finished();
            handle.abort();
            live
        }
        None => false,
    }
}
