//! In-memory fallback store seeded from the bundled dataset.
//!
//! Used when no record service is configured. The store owns its records;
//! callers only reach them through [`HospitalSource`] operations.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::directory::{normalize_identified, FilterEngine, Normalizer, RegionGroups};
use crate::models::{
    pages_for, Comment, FilterCriteria, Hospital, KeyCount, NewComment, NewHospital, ServiceCount,
    StatsSummary,
};

use super::envelope::submitted_record;
use super::{HospitalSource, ListPage, PageMeta, SourceError, SourceKind, SourceResult};

/// Bundled seed records, keyed by region.
const SEED_HOSPITALS: &str = include_str!("seed_hospitals.json");

/// Prefix of identifiers generated by the fallback store.
pub const FALLBACK_ID_PREFIX: &str = "mock-";

struct FallbackStore {
    groups: RegionGroups,
    /// Last millisecond stamp handed out, to keep generated ids strictly increasing
    last_id_millis: i64,
}

impl FallbackStore {
    fn next_id(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        let stamp = if now > self.last_id_millis {
            now
        } else {
            self.last_id_millis + 1
        };
        self.last_id_millis = stamp;
        format!("{}{}", FALLBACK_ID_PREFIX, stamp)
    }
}

/// Source serving from an owned in-memory store.
pub struct FallbackSource {
    store: Mutex<FallbackStore>,
    normalizer: Normalizer,
}

impl FallbackSource {
    /// Store seeded with the bundled dataset.
    pub fn seeded() -> SourceResult<Self> {
        Self::from_seed_json(SEED_HOSPITALS)
    }

    /// Store seeded from a `{region: [record]}` JSON document.
    pub fn from_seed_json(json: &str) -> SourceResult<Self> {
        let seed: BTreeMap<String, Vec<Value>> = serde_json::from_str(json)?;
        let normalizer = Normalizer::for_fallback();

        let groups = RegionGroups::from_buckets(
            seed.into_iter()
                .map(|(region, records)| (region, normalize_identified(&normalizer, records))),
        );
        tracing::debug!(
            "Fallback store seeded with {} hospital(s) in {} region(s)",
            groups.total_records(),
            groups.len()
        );

        Ok(Self::with_groups(groups))
    }

    /// Store holding exactly the given records.
    pub fn with_groups(groups: RegionGroups) -> Self {
        Self {
            store: Mutex::new(FallbackStore {
                groups,
                last_id_millis: 0,
            }),
            normalizer: Normalizer::for_fallback(),
        }
    }

    fn store(&self) -> SourceResult<MutexGuard<'_, FallbackStore>> {
        self.store.lock().map_err(|_| SourceError::StorePoisoned)
    }
}

#[async_trait]
impl HospitalSource for FallbackSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Fallback
    }

    async fn list(&self, page: u32, page_size: u32) -> SourceResult<ListPage> {
        let store = self.store()?;
        if page == 0 {
            return Ok(ListPage {
                groups: store.groups.clone(),
                meta: None,
            });
        }

        let size = page_size.max(1);
        let start = (page as usize - 1).saturating_mul(size as usize);
        Ok(ListPage {
            groups: store.groups.window(start, size as usize),
            meta: Some(PageMeta {
                page,
                limit: size,
                total: store.groups.total_records() as u64,
                total_pages: pages_for(store.groups.len() as u64, size),
            }),
        })
    }

    async fn stats(&self) -> SourceResult<StatsSummary> {
        let store = self.store()?;

        let mut by_type: Vec<KeyCount> = Vec::new();
        let mut by_service: Vec<ServiceCount> = Vec::new();
        for hospital in store.groups.records() {
            let kind = hospital.hospital_type.as_str();
            match by_type.iter_mut().find(|c| c.key == kind) {
                Some(count) => count.count += 1,
                None => by_type.push(KeyCount {
                    key: kind.to_string(),
                    count: 1,
                }),
            }
            for service in &hospital.services {
                match by_service.iter_mut().find(|c| &c.service == service) {
                    Some(count) => count.count += 1,
                    None => by_service.push(ServiceCount {
                        service: service.clone(),
                        count: 1,
                    }),
                }
            }
        }

        Ok(StatsSummary {
            total_hospitals: store.groups.total_records() as u64,
            total_states: store.groups.len() as u64,
            states: store.groups.regions().into_iter().map(str::to_string).collect(),
            by_state: store
                .groups
                .iter()
                .map(|(region, records)| KeyCount {
                    key: region.to_string(),
                    count: records.len() as u64,
                })
                .collect(),
            by_type,
            by_service,
            totals_reported: true,
        })
    }

    async fn search(&self, criteria: &FilterCriteria) -> SourceResult<Vec<Hospital>> {
        let store = self.store()?;
        let records: Vec<Hospital> = store.groups.records().cloned().collect();
        Ok(FilterEngine::evaluate(criteria, &records))
    }

    async fn get_by_id(&self, id: &str) -> SourceResult<Hospital> {
        self.store()?
            .groups
            .find(id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }

    async fn create(&self, hospital: &NewHospital) -> SourceResult<Hospital> {
        let mut store = self.store()?;
        let id = store.next_id();
        let created = submitted_record(&self.normalizer, hospital, &id)?;

        store.groups.insert(created.clone());
        tracing::info!("Fallback store created hospital {} in {}", created.id, created.state);
        Ok(created)
    }

    async fn add_comment(&self, id: &str, comment: &NewComment) -> SourceResult<Comment> {
        let mut store = self.store()?;
        let hospital = store
            .groups
            .find_mut(id)
            .ok_or_else(|| SourceError::NotFound(id.to_string()))?;

        let comment = Comment::new(comment.author.clone(), comment.text.clone());
        hospital.add_comment(comment.clone());
        Ok(comment)
    }

    async fn update(&self, id: &str, hospital: &NewHospital) -> SourceResult<Hospital> {
        let mut store = self.store()?;
        let existing = store
            .groups
            .find(id)
            .ok_or_else(|| SourceError::NotFound(id.to_string()))?;

        let mut updated = submitted_record(&self.normalizer, hospital, id)?;
        updated.comments = existing.comments.clone();

        if existing.state == updated.state {
            if let Some(slot) = store.groups.find_mut(id) {
                *slot = updated.clone();
            }
        } else {
            store.groups.remove(id);
            store.groups.insert(updated.clone());
        }
        tracing::info!("Fallback store updated hospital {}", id);
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> SourceResult<()> {
        let mut store = self.store()?;
        store
            .groups
            .remove(id)
            .ok_or_else(|| SourceError::NotFound(id.to_string()))?;
        tracing::info!("Fallback store deleted hospital {}", id);
        Ok(())
    }
}
