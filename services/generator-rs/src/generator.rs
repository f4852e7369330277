use std::time::Duration;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::event::{Event, EventKind};
use crate::industry::{Industry, IndustryTemplate, SIMULATOR_CATALOG};
use crate::random::{iso_now, iso_past, pick, prefixed_id, Payload};

const YEAR_MS: i64 = 365 * 86_400_000;

/// Which flavour of the tool is being reproduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Industry templates, mixed identify/track, newest-first log of 1000.
    #[default]
    Generator,
    /// Fixed storefront catalog, track only, oldest-first log of 100.
    Simulator,
}

impl Variant {
    /// Share of ticks that produce an identify call.
    pub fn identify_ratio(&self) -> f64 {
        match self {
            Variant::Generator => 0.2,
            Variant::Simulator => 0.0,
        }
    }

    pub fn log_capacity(&self) -> usize {
        match self {
            Variant::Generator => 1000,
            Variant::Simulator => 100,
        }
    }

    pub fn newest_first(&self) -> bool {
        matches!(self, Variant::Generator)
    }

    /// Catalog consulted for `industry`; the simulator has only one.
    pub fn catalog(&self, industry: Industry) -> &'static IndustryTemplate {
        match self {
            Variant::Generator => industry.template(),
            Variant::Simulator => &SIMULATOR_CATALOG,
        }
    }
}

/// Period between ticks for a positive rate, `60000 / events_per_minute` ms.
/// Returns `None` for a zero rate.
pub fn tick_interval(events_per_minute: u32) -> Option<Duration> {
    if events_per_minute == 0 {
        return None;
    }
    Some(Duration::from_secs_f64(60.0 / f64::from(events_per_minute)))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EventGenerator {
    variant: Variant,
}

impl EventGenerator {
    pub fn new(variant: Variant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Draws the event kind, then builds a matching payload for `industry`.
    pub fn generate(&self, industry: Industry, rng: &mut dyn RngCore) -> Event {
        let ratio = self.variant.identify_ratio();
        if ratio > 0.0 && rng.gen_bool(ratio) {
            self.identify(industry, rng)
        } else {
            self.track(industry, rng)
        }
    }

    pub fn track(&self, industry: Industry, rng: &mut dyn RngCore) -> Event {
        let catalog = self.variant.catalog(industry);
        let mut data = Payload::new();
        data.insert("event_name".to_string(), json!(catalog.pick_event(rng)));
        data.extend(catalog.properties(rng));
        Event::new(EventKind::Track, iso_now(), data)
    }

    pub fn identify(&self, industry: Industry, rng: &mut dyn RngCore) -> Event {
        let name = format!(
            "{} {}",
            pick(rng, &["John", "Emma", "Michael", "Sarah"]),
            pick(rng, &["Smith", "Johnson", "Williams", "Brown"])
        );
        let mut data = Payload::new();
        data.insert("id".to_string(), json!(prefixed_id(rng, "user")));
        data.insert(
            "email".to_string(),
            json!(format!("user{}@example.com", rng.gen_range(0..1000))),
        );
        data.insert("name".to_string(), json!(name));
        data.insert("created_at".to_string(), json!(iso_past(rng, YEAR_MS)));
        data.extend(self.variant.catalog(industry).traits(rng));
        Event::new(EventKind::Identify, iso_now(), data)
    }
}
