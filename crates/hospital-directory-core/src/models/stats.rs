//! Aggregate directory statistics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hospital count assumed until the backend reports one.
pub const DEFAULT_TOTAL_HOSPITALS: u64 = 150;

/// Region count assumed until the backend reports one.
pub const DEFAULT_TOTAL_STATES: u64 = 36;

/// Count for one region or category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyCount {
    #[serde(rename = "_id")]
    pub key: String,
    pub count: u64,
}

/// Count for one service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceCount {
    pub service: String,
    pub count: u64,
}

/// Directory statistics summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_hospitals: u64,
    pub total_states: u64,
    pub states: Vec<String>,
    pub by_state: Vec<KeyCount>,
    pub by_type: Vec<KeyCount>,
    pub by_service: Vec<ServiceCount>,
    /// Both totals were read from a payload rather than defaulted
    #[serde(skip)]
    pub totals_reported: bool,
}

impl Default for StatsSummary {
    fn default() -> Self {
        Self {
            total_hospitals: DEFAULT_TOTAL_HOSPITALS,
            total_states: DEFAULT_TOTAL_STATES,
            states: Vec::new(),
            by_state: Vec::new(),
            by_type: Vec::new(),
            by_service: Vec::new(),
            totals_reported: false,
        }
    }
}

impl StatsSummary {
    /// Parse a stats payload. Never fails.
    ///
    /// Accepted envelopes: `{data: {hospitalStats: {...}}}`, `{data: {...}}`,
    /// or the stats object itself. Anything else yields [`StatsSummary::default`].
    /// Missing or non-positive totals fall back to the defaults individually,
    /// and `totals_reported` is set only when both were present.
    pub fn parse(payload: &Value) -> Self {
        let Some(data) = locate_stats(payload) else {
            tracing::warn!("Unrecognized stats payload, using default summary");
            return Self::default();
        };

        let total_hospitals = positive_count(data.get("totalHospitals"));
        let total_states = positive_count(data.get("totalStates"));
        if total_hospitals.is_none() || total_states.is_none() {
            tracing::warn!("Stats payload missing usable totals, using defaults");
        }

        Self {
            total_hospitals: total_hospitals.unwrap_or(DEFAULT_TOTAL_HOSPITALS),
            total_states: total_states.unwrap_or(DEFAULT_TOTAL_STATES),
            totals_reported: total_hospitals.is_some() && total_states.is_some(),
            states: lenient_list(data.get("states")),
            by_state: lenient_list(data.get("byState")),
            by_type: lenient_list(data.get("byType")),
            by_service: lenient_list(data.get("byService")),
        }
    }

    /// Number of region pages for a given page size.
    pub fn total_pages(&self, page_size: u32) -> u32 {
        pages_for(self.total_states, page_size)
    }
}

/// Ceiling division of `items` into pages of `page_size`.
pub fn pages_for(items: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = items.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

fn locate_stats(payload: &Value) -> Option<&Value> {
    if let Some(data) = payload.get("data").filter(|d| d.is_object()) {
        return Some(
            data.get("hospitalStats")
                .filter(|s| s.is_object())
                .unwrap_or(data),
        );
    }
    if payload.get("totalHospitals").is_some() {
        return Some(payload);
    }
    None
}

/// Positive count from a number or numeric string.
pub fn positive_count(value: Option<&Value>) -> Option<u64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_finite() && n >= 1.0 {
        Some(n as u64)
    } else {
        None
    }
}

/// Decode a JSON array element by element, skipping malformed entries.
fn lenient_list<T: for<'de> Deserialize<'de>>(value: Option<&Value>) -> Vec<T> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| T::deserialize(item).ok())
                .collect()
        })
        .unwrap_or_default()
}
