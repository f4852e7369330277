use std::time::Duration;

use evsim_generator::{tick_interval, Industry, Variant};
use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_API_HOST: &str = "us-east-1.hightouch-events.com";
pub const DEFAULT_EVENTS_PER_MINUTE: u32 = 60;

/// Process settings, read once at startup from `.env` and `EVSIM_*` variables.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub api_port: u16,
    pub write_key: String,
    pub api_host: String,
    pub events_per_minute: u32,
    pub industry: Industry,
    pub variant: Variant,
    pub autostart: bool,
    pub dispatch_timeout_ms: u64,
    pub dry_run: bool,
    pub max_concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_port: 8080,
            write_key: String::new(),
            api_host: DEFAULT_API_HOST.to_string(),
            events_per_minute: DEFAULT_EVENTS_PER_MINUTE,
            industry: Industry::Ecommerce,
            variant: Variant::Generator,
            autostart: false,
            dispatch_timeout_ms: 5000,
            dry_run: false,
            max_concurrency: 32,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, figment::Error> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Settings::default())).merge(Env::prefixed("EVSIM_")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        let mut settings: Settings = figment.extract()?;
        if settings.events_per_minute == 0 {
            settings.events_per_minute = DEFAULT_EVENTS_PER_MINUTE;
        }
        if settings.max_concurrency == 0 {
            settings.max_concurrency = Settings::default().max_concurrency;
        }
        Ok(settings)
    }
}

/// User-editable stream settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamConfig {
    pub write_key: String,
    pub api_host: String,
    pub events_per_minute: u32,
    pub industry: Industry,
    pub enabled: bool,
}

impl From<&Settings> for StreamConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            write_key: settings.write_key.clone(),
            api_host: settings.api_host.clone(),
            events_per_minute: settings.events_per_minute.max(1),
            industry: settings.industry,
            enabled: settings.autostart,
        }
    }
}

impl StreamConfig {
    pub fn interval(&self) -> Duration {
        tick_interval(self.events_per_minute).unwrap_or(Duration::from_secs(1))
    }

    /// Applies user input. Fields left out of the update keep their value, and
    /// so does a rate that does not parse to a positive integer.
    pub fn apply(&mut self, update: ConfigUpdate) -> ConfigDelta {
        let mut delta = ConfigDelta::default();

        if let Some(key) = update.write_key {
            if key != self.write_key {
                self.write_key = key;
                delta.collector_changed = true;
            }
        }
        if let Some(host) = update.api_host {
            if host != self.api_host {
                self.api_host = host;
                delta.collector_changed = true;
            }
        }
        if let Some(rate) = update.events_per_minute.as_ref().and_then(parse_rate) {
            if rate != self.events_per_minute {
                self.events_per_minute = rate;
                delta.restart_needed = true;
            }
        }
        if let Some(industry) = update.industry {
            if industry != self.industry {
                self.industry = industry;
                delta.restart_needed = true;
            }
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }

        delta.restart_needed |= delta.collector_changed;
        delta
    }
}

/// Partial change to a [`StreamConfig`]. The rate is taken as raw JSON so
/// strings and floats from form inputs can be parsed leniently.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub write_key: Option<String>,
    pub api_host: Option<String>,
    pub events_per_minute: Option<Value>,
    pub industry: Option<Industry>,
    pub enabled: Option<bool>,
}

/// Side effects an applied update calls for.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConfigDelta {
    /// Key or host changed, the collector client must be reloaded.
    pub collector_changed: bool,
    /// A running timer must be rescheduled.
    pub restart_needed: bool,
}

/// parseInt-style reading of a rate: leading digits of a string, the integer
/// part of a number. Anything that is not a positive `u32` yields `None`.
pub fn parse_rate(value: &Value) -> Option<u32> {
    let rate = match value {
        Value::Number(n) => {
            if let Some(int) = n.as_u64() {
                int
            } else {
                let float = n.as_f64()?;
                if !float.is_finite() || float < 1.0 {
                    return None;
                }
                float.trunc() as u64
            }
        }
        Value::String(s) => {
            let s = s.trim_start();
            let s = s.strip_prefix('+').unwrap_or(s);
            let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u64>().ok()?
        }
        _ => return None,
    };
    u32::try_from(rate).ok().filter(|rate| *rate > 0)
}
