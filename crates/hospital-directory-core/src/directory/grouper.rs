//! Region grouping.

use std::collections::BTreeMap;

use crate::models::Hospital;

/// Hospitals grouped by region.
///
/// Regions iterate in ascending lexicographic order; records keep insertion
/// order within a region. A region never holds an empty sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionGroups {
    groups: BTreeMap<String, Vec<Hospital>>,
}

impl RegionGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group a flat collection by each record's region.
    pub fn group<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Hospital>,
    {
        let mut groups = Self::new();
        for record in records {
            groups.insert(record);
        }
        groups
    }

    /// Build from pre-grouped buckets, dropping empty ones.
    pub fn from_buckets<I>(buckets: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<Hospital>)>,
    {
        let mut groups = BTreeMap::new();
        for (region, records) in buckets {
            if !records.is_empty() {
                groups
                    .entry(region)
                    .or_insert_with(Vec::new)
                    .extend(records);
            }
        }
        Self { groups }
    }

    /// Append a record to its region, creating the region if absent.
    pub fn insert(&mut self, record: Hospital) {
        self.groups
            .entry(record.state.clone())
            .or_default()
            .push(record);
    }

    /// Remove a record by id. Drops the region once it is empty.
    pub fn remove(&mut self, id: &str) -> Option<Hospital> {
        let (region, index) = self.groups.iter().find_map(|(region, records)| {
            records
                .iter()
                .position(|h| h.id == id)
                .map(|index| (region.clone(), index))
        })?;

        let records = self.groups.get_mut(&region)?;
        let removed = records.remove(index);
        if records.is_empty() {
            self.groups.remove(&region);
        }
        Some(removed)
    }

    pub fn find(&self, id: &str) -> Option<&Hospital> {
        self.groups.values().flatten().find(|h| h.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Hospital> {
        self.groups.values_mut().flatten().find(|h| h.id == id)
    }

    /// Region keys in ascending order.
    pub fn regions(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    pub fn get(&self, region: &str) -> Option<&[Hospital]> {
        self.groups.get(region).map(Vec::as_slice)
    }

    /// Iterate `(region, records)` in ascending region order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Hospital])> {
        self.groups
            .iter()
            .map(|(region, records)| (region.as_str(), records.as_slice()))
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of records across all regions.
    pub fn total_records(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Keep only the regions at `[start, start + count)` in key order.
    pub fn window(&self, start: usize, count: usize) -> Self {
        Self {
            groups: self
                .groups
                .iter()
                .skip(start)
                .take(count)
                .map(|(region, records)| (region.clone(), records.clone()))
                .collect(),
        }
    }

    /// Flatten into records, region by region.
    pub fn records(&self) -> impl Iterator<Item = &Hospital> {
        self.groups.values().flatten()
    }

    pub fn into_records(self) -> Vec<Hospital> {
        self.groups.into_values().flatten().collect()
    }
}
