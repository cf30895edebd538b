//! Filter evaluation over in-memory records and query building for the live backend.

use crate::models::{FilterCriteria, Hospital};

/// Evaluates [`FilterCriteria`] locally or translates them into search query parameters.
///
/// Both paths agree on every dimension except cost bounds, which only the
/// live backend applies (local costs are a mix of numbers and free text).
pub struct FilterEngine;

impl FilterEngine {
    /// Filter records, preserving input order.
    ///
    /// Empty criteria return every record unchanged.
    pub fn evaluate(criteria: &FilterCriteria, records: &[Hospital]) -> Vec<Hospital> {
        let criteria = criteria.normalized();
        if criteria.is_empty() {
            return records.to_vec();
        }
        let needle = criteria.query.as_ref().map(|q| q.to_lowercase());

        records
            .iter()
            .filter(|h| Self::matches_normalized(&criteria, needle.as_deref(), h))
            .cloned()
            .collect()
    }

    /// Check a single record against the criteria.
    pub fn matches(criteria: &FilterCriteria, hospital: &Hospital) -> bool {
        let criteria = criteria.normalized();
        let needle = criteria.query.as_ref().map(|q| q.to_lowercase());
        Self::matches_normalized(&criteria, needle.as_deref(), hospital)
    }

    fn matches_normalized(criteria: &FilterCriteria, needle: Option<&str>, hospital: &Hospital) -> bool {
        if let Some(state) = &criteria.state {
            if !hospital.in_region(state) {
                return false;
            }
        }

        if let Some(kind) = &criteria.hospital_type {
            if !hospital.hospital_type.matches(kind) {
                return false;
            }
        }

        if !criteria.services.is_empty() && !hospital.offers_any(&criteria.services) {
            return false;
        }

        if let Some(needle) = needle {
            if !hospital.matches_text(needle) {
                return false;
            }
        }

        true
    }

    /// Query parameters for `GET /hospitals/search_hospital`.
    ///
    /// Unset dimensions are omitted; `services` repeats once per requested service.
    pub fn to_query(criteria: &FilterCriteria) -> Vec<(&'static str, String)> {
        let criteria = criteria.normalized();
        let mut params = Vec::new();

        if let Some(state) = criteria.state {
            params.push(("state", state));
        }
        for service in criteria.services {
            params.push(("services", service));
        }
        if let Some(kind) = criteria.hospital_type {
            params.push(("type", kind));
        }
        if let Some(min) = criteria.min_cost {
            params.push(("minCost", min.to_string()));
        }
        if let Some(max) = criteria.max_cost {
            params.push(("maxCost", max.to_string()));
        }
        if let Some(query) = criteria.query {
            params.push(("query", query));
        }

        params
    }
}
