//! User-selected filter criteria.

use serde::{Deserialize, Serialize};

/// Filter criteria for the directory listing.
///
/// Dimensions combine with AND; the service set matches if a record offers
/// any one of the requested services. Blank strings count as unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterCriteria {
    /// Region (state), case-insensitive exact match
    pub state: Option<String>,
    /// Category label, case-insensitive exact match
    pub hospital_type: Option<String>,
    /// Requested services, exact membership
    pub services: Vec<String>,
    /// Lower cost bound (forwarded to the live backend only)
    pub min_cost: Option<f64>,
    /// Upper cost bound (forwarded to the live backend only)
    pub max_cost: Option<f64>,
    /// Free-text query over name and location
    pub query: Option<String>,
}

impl FilterCriteria {
    /// Empty criteria.
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria carrying only a free-text query.
    pub fn text(query: impl Into<String>) -> Self {
        Self::new().with_query(query)
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_type(mut self, hospital_type: impl Into<String>) -> Self {
        self.hospital_type = Some(hospital_type.into());
        self
    }

    /// Add a requested service; duplicates are ignored.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.toggle_service_on(service.into());
        self
    }

    pub fn with_cost_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_cost = min;
        self.max_cost = max;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    fn toggle_service_on(&mut self, service: String) {
        if !self.services.contains(&service) {
            self.services.push(service);
        }
    }

    /// Toggle a service in the requested set.
    pub fn toggle_service(&mut self, service: &str) {
        if let Some(pos) = self.services.iter().position(|s| s == service) {
            self.services.remove(pos);
        } else {
            self.services.push(service.to_string());
        }
    }

    /// Copy with blank strings cleared and text trimmed.
    pub fn normalized(&self) -> Self {
        fn clean(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }

        let mut services = Vec::with_capacity(self.services.len());
        for service in &self.services {
            if !service.trim().is_empty() && !services.contains(service) {
                services.push(service.clone());
            }
        }

        Self {
            state: clean(&self.state),
            hospital_type: clean(&self.hospital_type),
            services,
            min_cost: self.min_cost,
            max_cost: self.max_cost,
            query: clean(&self.query),
        }
    }

    /// True when no dimension is set.
    pub fn is_empty(&self) -> bool {
        self.active_filter_count() == 0
    }

    /// Number of active filter dimensions; a cost range counts once.
    pub fn active_filter_count(&self) -> usize {
        let normalized = self.normalized();
        [
            normalized.query.is_some(),
            normalized.state.is_some(),
            normalized.hospital_type.is_some(),
            !normalized.services.is_empty(),
            normalized.min_cost.is_some() || normalized.max_cost.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    pub fn clear_state(&mut self) {
        self.state = None;
    }

    pub fn clear_type(&mut self) {
        self.hospital_type = None;
    }

    pub fn clear_services(&mut self) {
        self.services.clear();
    }

    pub fn clear_cost_range(&mut self) {
        self.min_cost = None;
        self.max_cost = None;
    }

    pub fn clear_query(&mut self) {
        self.query = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_criteria_is_empty() {
        assert!(FilterCriteria::new().is_empty());
        assert!(FilterCriteria::text("   ").is_empty());
        assert!(FilterCriteria::new().with_state("").is_empty());
    }

    #[test]
    fn test_active_filter_count() {
        let criteria = FilterCriteria::new()
            .with_state("Lagos")
            .with_service("Maternity")
            .with_service("Emergency")
            .with_cost_range(Some(1000.0), Some(5000.0))
            .with_query(" reddington ");

        assert_eq!(criteria.active_filter_count(), 4);
        assert_eq!(criteria.normalized().query.as_deref(), Some("reddington"));
    }

    #[test]
    fn test_toggle_service() {
        let mut criteria = FilterCriteria::new().with_service("Maternity");
        criteria.toggle_service("Surgery");
        assert_eq!(criteria.services, vec!["Maternity", "Surgery"]);
        criteria.toggle_service("Maternity");
        assert_eq!(criteria.services, vec!["Surgery"]);
    }

    #[test]
    fn test_with_service_dedupes() {
        let criteria = FilterCriteria::new()
            .with_service("Maternity")
            .with_service("Maternity");
        assert_eq!(criteria.services.len(), 1);
    }

    #[test]
    fn test_clear_helpers() {
        let mut criteria = FilterCriteria::new()
            .with_type("Private")
            .with_cost_range(None, Some(9000.0));
        criteria.clear_type();
        criteria.clear_cost_range();
        assert!(criteria.is_empty());
    }
}
