//! Record pipeline: normalization, filtering and grouping.
//!
//! Pipeline: Raw JSON → Normalizer → FilterEngine → RegionGroups

mod filter;
mod grouper;
mod normalizer;

pub use filter::*;
pub use grouper::*;
pub use normalizer::*;

use serde_json::Value;

use crate::models::{FilterCriteria, Hospital, RawHospital};

/// Normalize raw records, dropping any that carry no identifier.
pub fn normalize_identified<I>(normalizer: &Normalizer, values: I) -> Vec<Hospital>
where
    I: IntoIterator<Item = Value>,
{
    let mut dropped = 0usize;
    let records: Vec<Hospital> = values
        .into_iter()
        .map(RawHospital::decode)
        .filter_map(|raw| {
            if raw.identifier().is_none() {
                dropped += 1;
                return None;
            }
            Some(normalizer.normalize(&raw))
        })
        .collect();

    if dropped > 0 {
        tracing::warn!("Dropped {} hospital record(s) without an identifier", dropped);
    }
    records
}

/// Filter a flat collection and group the matches by region.
pub fn filter_and_group(criteria: &FilterCriteria, records: &[Hospital]) -> RegionGroups {
    RegionGroups::group(FilterEngine::evaluate(criteria, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CostAmount;
    use serde_json::json;

    #[test]
    fn test_normalize_identified_drops_anonymous() {
        let records = normalize_identified(
            &Normalizer::new(),
            vec![
                json!({ "_id": "1", "state": "Lagos" }),
                json!({ "state": "Lagos", "name": "Nameless" }),
                json!({ "id": "legacy-2", "state": "Kano" }),
            ],
        );

        let ids: Vec<&str> = records.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "legacy-2"]);
    }

    #[test]
    fn test_lagos_scenario() {
        let records = normalize_identified(
            &Normalizer::new(),
            vec![
                json!({ "_id": "first", "state": "Lagos", "delivery_cost": { "normal": 5000 } }),
                json!({ "_id": "second", "state": "Lagos", "delivery_cost": { "normal": 7000, "cesarean": 9000 } }),
            ],
        );

        assert_eq!(records[0].delivery_cost.emergency, CostAmount::Number(5000.0));
        assert_eq!(records[1].delivery_cost.emergency, CostAmount::Number(7000.0));
        assert_eq!(records[1].delivery_cost.cs, Some(CostAmount::Number(9000.0)));

        let groups = filter_and_group(&FilterCriteria::new(), &records);
        assert_eq!(groups.regions(), vec!["Lagos"]);
        let lagos: Vec<&str> = groups.get("Lagos").unwrap().iter().map(|h| h.id.as_str()).collect();
        assert_eq!(lagos, vec!["first", "second"]);
    }
}
