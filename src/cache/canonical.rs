//! Canonical-entity extraction for cache keys.
//!
//! Free-text queries about the same underlying request ("40A cable for a
//! shower 8m away" vs "cable size for 8.5kW shower, 8 metres") should land
//! on the same cache entry. This module extracts a small structured summary
//! — load type from a fixed vocabulary, power and distance rounded to
//! coarse buckets — and hashes it into a stable key.
//!
//! This is best-effort bucketing, not a correctness-critical mapping: a
//! missed entity only costs a cache miss. Everything here is pure so it can
//! be tested in isolation from the store.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

/// Power bucket width in watts. 8.0kW and 8.2kW must land in one bucket.
const POWER_BUCKET_W: f64 = 500.0;

/// Structured context supplied alongside a free-text query.
///
/// Explicit fields take precedence over anything extracted from the text.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    pub load_type: Option<String>,
    pub power_watts: Option<f64>,
    pub distance_metres: Option<f64>,
}

/// Fixed load-type vocabulary, ordered by specificity. First match wins.
const LOAD_VOCABULARY: &[(&str, &[&str])] = &[
    ("shower", &["shower"]),
    ("cooker", &["cooker", "oven", "hob"]),
    (
        "ev_charger",
        &["ev charger", "car charger", "charge point", "charging point", "ev charging"],
    ),
    ("immersion", &["immersion"]),
    ("heat_pump", &["heat pump"]),
    ("motor", &["motor"]),
    ("socket", &["socket", "ring final", "ring main"]),
    ("lighting", &["lighting", "light", "luminaire"]),
];

static POWER_KW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*kw").expect("valid regex"));
static POWER_W: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*w(?:att)?s?\b").expect("valid regex"));
static DISTANCE_M: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:metres?|meters?|m)\b").expect("valid regex"));

/// Classify the query's subject against the fixed vocabulary.
fn classify_load(query: &str) -> Option<&'static str> {
    let lowered = query.to_lowercase();
    LOAD_VOCABULARY
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(label, _)| *label)
}

/// Extract a power figure in watts. kW takes precedence over bare watts.
fn extract_power_watts(query: &str) -> Option<f64> {
    if let Some(caps) = POWER_KW.captures(query) {
        return caps[1].parse::<f64>().ok().map(|kw| kw * 1000.0);
    }
    POWER_W
        .captures(query)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

/// Extract a distance figure in metres.
fn extract_distance_metres(query: &str) -> Option<f64> {
    DISTANCE_M
        .captures(query)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

/// Round power to the nearest bucket.
fn bucket_power(watts: f64) -> u32 {
    ((watts / POWER_BUCKET_W).round() * POWER_BUCKET_W) as u32
}

/// Round distance to the nearest whole metre.
fn bucket_distance(metres: f64) -> u32 {
    metres.round() as u32
}

/// Build the canonical descriptor string for a query + context.
///
/// Deterministic field order; absent entities are encoded as `none` so the
/// descriptor shape is stable.
pub(crate) fn canonical_descriptor(query: &str, context: Option<&QueryContext>) -> String {
    let load_type = context
        .and_then(|c| c.load_type.as_deref())
        .map(str::to_lowercase)
        .or_else(|| classify_load(query).map(str::to_string));

    let power = context
        .and_then(|c| c.power_watts)
        .or_else(|| extract_power_watts(query))
        .map(bucket_power);

    let distance = context
        .and_then(|c| c.distance_metres)
        .or_else(|| extract_distance_metres(query))
        .map(bucket_distance);

    format!(
        "type={}|power={}|dist={}",
        load_type.as_deref().unwrap_or("none"),
        power.map_or_else(|| "none".to_string(), |p| p.to_string()),
        distance.map_or_else(|| "none".to_string(), |d| d.to_string()),
    )
}

/// Compute the cache key: SHA-256 of the canonical descriptor, hex-encoded.
///
/// A stable cross-process hash, so the same key works against a shared
/// backing store from any instance.
pub fn cache_key(query: &str, context: Option<&QueryContext>) -> String {
    let descriptor = canonical_descriptor(query, context);
    let digest = Sha256::digest(descriptor.as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_shower_queries() {
        assert_eq!(classify_load("what size cable for an 8kW shower"), Some("shower"));
        assert_eq!(classify_load("Electric Shower 8m away"), Some("shower"));
    }

    #[test]
    fn vocabulary_order_prefers_specific_loads() {
        // "shower" outranks "socket" when both appear
        assert_eq!(
            classify_load("socket next to the shower"),
            Some("shower")
        );
    }

    #[test]
    fn unknown_subject_is_none() {
        assert_eq!(classify_load("what colour is earth sleeving"), None);
    }

    #[test]
    fn extracts_kilowatts() {
        assert_eq!(extract_power_watts("an 8.5kW shower"), Some(8500.0));
        assert_eq!(extract_power_watts("a 7 kW charger"), Some(7000.0));
    }

    #[test]
    fn extracts_bare_watts() {
        assert_eq!(extract_power_watts("a 900W microwave"), Some(900.0));
        assert_eq!(extract_power_watts("a 900 watt load"), Some(900.0));
    }

    #[test]
    fn extracts_distance() {
        assert_eq!(extract_distance_metres("a run of 8m"), Some(8.0));
        assert_eq!(extract_distance_metres("8.4 metres from the board"), Some(8.4));
    }

    #[test]
    fn cable_csa_is_not_a_distance() {
        // "10mm2" must not parse as ten metres
        assert_eq!(extract_distance_metres("10mm2 twin and earth"), None);
    }

    #[test]
    fn power_buckets_to_nearest_500w() {
        assert_eq!(bucket_power(8000.0), 8000);
        assert_eq!(bucket_power(8200.0), 8000);
        assert_eq!(bucket_power(8300.0), 8500);
    }

    #[test]
    fn similar_queries_share_a_key() {
        let a = cache_key("what size cable for 8kW shower 8m away", None);
        let b = cache_key("cable size for 8.2kW shower, 8 metres", None);
        assert_eq!(a, b);
    }

    #[test]
    fn different_loads_get_different_keys() {
        let a = cache_key("cable for 8kW shower 8m away", None);
        let b = cache_key("cable for 8kW cooker 8m away", None);
        assert_ne!(a, b);
    }

    #[test]
    fn context_overrides_extraction() {
        let context = QueryContext {
            load_type: Some("cooker".into()),
            power_watts: Some(7200.0),
            distance_metres: Some(12.0),
        };
        let descriptor = canonical_descriptor("8kW shower 8m away", Some(&context));
        assert_eq!(descriptor, "type=cooker|power=7000|dist=12");
    }

    #[test]
    fn descriptor_stable_for_no_entities() {
        assert_eq!(
            canonical_descriptor("general wiring question", None),
            "type=none|power=none|dist=none"
        );
    }
}
