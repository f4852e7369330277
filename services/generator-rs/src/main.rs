use dotenvy::dotenv;
use evsim_generator::{tick_interval, EventGenerator, Industry, Variant};
use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_EVENTS_PER_MINUTE: u32 = 60;

#[derive(Debug, Deserialize, Serialize, Clone)]
struct Config {
    industry: Industry,
    events_per_minute: u32,
    variant: Variant,
    /// Stop after this many events; run forever when unset.
    count: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            industry: Industry::Ecommerce,
            events_per_minute: DEFAULT_EVENTS_PER_MINUTE,
            variant: Variant::Generator,
            count: None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    // stdout carries the events, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("EVSIM_"))
        .extract()
        .unwrap_or_else(|e| {
            warn!(error = %e, "invalid emitter configuration, using defaults");
            Config::default()
        });

    let period = match tick_interval(config.events_per_minute) {
        Some(period) => period,
        None => {
            warn!(
                events_per_minute = config.events_per_minute,
                "rate must be positive, using {}", DEFAULT_EVENTS_PER_MINUTE
            );
            tick_interval(DEFAULT_EVENTS_PER_MINUTE).ok_or("default rate must be positive")?
        }
    };

    info!(
        industry = %config.industry,
        variant = ?config.variant,
        interval_ms = period.as_millis() as u64,
        "emitter up, writing events to stdout"
    );

    let generator = EventGenerator::new(config.variant);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut emitted: u64 = 0;

    while !budget_spent(config.count, emitted) {
        ticker.tick().await;
        let event = generator.generate(config.industry, &mut rand::thread_rng());
        println!("{}", serde_json::to_string(&event)?);
        emitted += 1;
    }
    info!(emitted, "event budget reached, exiting");
    Ok(())
}

fn budget_spent(count: Option<u64>, emitted: u64) -> bool {
    count.is_some_and(|limit| emitted >= limit)
}
