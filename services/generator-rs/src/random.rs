//! Small sampling helpers shared by the industry templates.

use chrono::{Duration, SecondsFormat, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{Map, Value};

/// Key-value payload carried by identify traits and track properties.
pub type Payload = Map<String, Value>;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

/// `prefix_` followed by nine lowercase base36 characters, e.g. `sess_k3j9x0a2b`.
pub fn prefixed_id<R: Rng + ?Sized>(rng: &mut R, prefix: &str) -> String {
    let suffix: String = (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}_{}", prefix, suffix)
}

pub fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&'static str]) -> &'static str {
    options.choose(rng).copied().unwrap_or_default()
}

/// True when a uniform draw lands above `threshold`, so `chance(rng, 0.2)` is true ~80% of the time.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, threshold: f64) -> bool {
    rng.gen::<f64>() > threshold
}

/// ISO-8601 timestamp in the `toISOString` shape (millisecond precision, `Z` suffix).
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Timestamp up to `max_ms` before now.
pub fn iso_past<R: Rng + ?Sized>(rng: &mut R, max_ms: i64) -> String {
    let offset = Duration::milliseconds(rng.gen_range(0..max_ms));
    (Utc::now() - offset).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Timestamp up to `max_ms` after now.
pub fn iso_future<R: Rng + ?Sized>(rng: &mut R, max_ms: i64) -> String {
    let offset = Duration::milliseconds(rng.gen_range(0..max_ms));
    (Utc::now() + offset).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Unwraps a `json!({...})` literal into its map.
pub(crate) fn object(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn prefixed_id_is_base36() {
        let mut rng = SmallRng::seed_from_u64(7);
        let id = prefixed_id(&mut rng, "prod");
        let (prefix, suffix) = id.split_once('_').unwrap();
        assert_eq!(prefix, "prod");
        assert_eq!(suffix.len(), 9);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn past_and_future_bracket_now() {
        let mut rng = SmallRng::seed_from_u64(1);
        let now = Utc::now();
        let past = DateTime::parse_from_rfc3339(&iso_past(&mut rng, 86_400_000)).unwrap();
        let future = DateTime::parse_from_rfc3339(&iso_future(&mut rng, 86_400_000)).unwrap();
        assert!(past <= now + Duration::seconds(1));
        assert!(future >= now - Duration::seconds(1));
    }

    #[test]
    fn iso_now_uses_millis_and_z() {
        let ts = iso_now();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2024-01-01T00:00:00.000Z".len());
    }

    #[test]
    fn pick_from_empty_is_blank() {
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(pick(&mut rng, &[]), "");
    }
}
