//! Hospital Directory Core Library
//!
//! Browsing, filtering and submission logic for a regional hospital directory,
//! shared by native front ends through UniFFI.
//!
//! # Architecture
//!
//! ```text
//!   Record service (HTTP)        Bundled seed data
//!            │                          │
//!       LiveSource               FallbackSource
//!            └────────────┬─────────────┘
//!                         │  HospitalSource (chosen once by config)
//!                         ▼
//!        Raw JSON → Normalizer → FilterEngine → RegionGroups
//!                         │
//!                         ▼
//!               PaginationController ──► watch subscribers
//!                         ▲
//!                  SearchDebouncer (free-text input)
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (Hospital, DeliveryCost, FilterCriteria, StatsSummary, raw wire shapes)
//! - [`directory`]: Normalizer, filter evaluation and region grouping
//! - [`source`]: Record sources (live HTTP and in-memory fallback)
//! - [`state`]: Pagination state machine and search debouncer
//! - [`config`]: Directory configuration

pub mod config;
pub mod directory;
pub mod models;
pub mod source;
pub mod state;

// Re-export commonly used types
pub use config::DirectoryConfig;
pub use directory::{FilterEngine, Normalizer, RegionGroups};
pub use models::{
    Comment, CostAmount, DeliveryCost, FilterCriteria, Hospital, HospitalType, NewComment,
    NewDeliveryCost, NewHospital, StatsSummary,
};
pub use source::{connect, FallbackSource, HospitalSource, LiveSource, SourceError, SourceKind};
pub use state::{LoadPhase, PaginationController, PaginationState, SearchDebouncer};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};
use std::time::Duration;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DirectoryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SourceError> for DirectoryError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::NotFound(id) => DirectoryError::NotFound(id),
            SourceError::Network(_) | SourceError::Status { .. } => {
                DirectoryError::Network(e.to_string())
            }
            SourceError::Json(_) => DirectoryError::Serialization(e.to_string()),
            SourceError::Config(_) => DirectoryError::InvalidInput(e.to_string()),
            SourceError::StorePoisoned => DirectoryError::Internal(e.to_string()),
        }
    }
}

impl From<config::ConfigError> for DirectoryError {
    fn from(e: config::ConfigError) -> Self {
        DirectoryError::InvalidInput(e.to_string())
    }
}

impl From<std::io::Error> for DirectoryError {
    fn from(e: std::io::Error) -> Self {
        DirectoryError::Internal(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for DirectoryError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DirectoryError::Internal(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open a directory backed by the source the configuration selects.
#[uniffi::export]
pub fn open_directory(config: FfiDirectoryConfig) -> Result<Arc<HospitalDirectory>, DirectoryError> {
    let config: DirectoryConfig = config.into();
    let source = source::connect(&config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    Ok(Arc::new(HospitalDirectory {
        runtime,
        controller: PaginationController::new(source, config.page_size),
        debouncer: Mutex::new(SearchDebouncer::new(config.quiet_interval)),
    }))
}

/// Install a `tracing` subscriber writing to stderr. Later calls are no-ops.
#[uniffi::export]
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    if tracing_subscriber::fmt().with_max_level(level).try_init().is_err() {
        tracing::debug!("Logging already initialized");
    }
}

// =========================================================================
// Main API Object
// =========================================================================

/// Directory handle for FFI. Async work runs on a private single-threaded runtime.
#[derive(uniffi::Object)]
pub struct HospitalDirectory {
    runtime: tokio::runtime::Runtime,
    controller: PaginationController,
    debouncer: Mutex<SearchDebouncer>,
}

#[uniffi::export]
impl HospitalDirectory {
    // =========================================================================
    // Listing
    // =========================================================================

    /// Fetch stats and the first page.
    pub fn load(&self) -> Result<FfiDirectoryView, DirectoryError> {
        self.runtime.block_on(self.controller.request_stats())?;
        Ok(self.view())
    }

    /// Go to a page. Out-of-range pages leave the view unchanged.
    pub fn go_to_page(&self, page: u32) -> Result<FfiDirectoryView, DirectoryError> {
        self.runtime.block_on(self.controller.request_page(page))?;
        Ok(self.view())
    }

    pub fn next_page(&self) -> Result<FfiDirectoryView, DirectoryError> {
        self.runtime.block_on(self.controller.next_page())?;
        Ok(self.view())
    }

    pub fn prev_page(&self) -> Result<FfiDirectoryView, DirectoryError> {
        self.runtime.block_on(self.controller.prev_page())?;
        Ok(self.view())
    }

    /// Current view.
    pub fn view(&self) -> FfiDirectoryView {
        self.controller.state().into()
    }

    /// Flip a displayed record's expansion flag.
    pub fn toggle_expanded(&self, id: String) -> bool {
        self.controller.toggle_expanded(&id)
    }

    // =========================================================================
    // Filtering and Search
    // =========================================================================

    /// Show every record matching the criteria. Empty criteria return to the listing.
    pub fn apply_filters(&self, criteria: FfiFilterCriteria) -> Result<FfiDirectoryView, DirectoryError> {
        self.runtime.block_on(self.controller.apply_filter(criteria.into()))?;
        Ok(self.view())
    }

    /// Clear filters and return to the first page.
    pub fn reset_filters(&self) -> Result<FfiDirectoryView, DirectoryError> {
        self.debouncer.lock()?.reset();
        self.runtime.block_on(self.controller.reset_filters())?;
        Ok(self.view())
    }

    /// Record search input at `now_ms` (host clock). Returns when it settles.
    pub fn search_input(&self, query: String, now_ms: u64) -> Result<Option<u64>, DirectoryError> {
        let mut debouncer = self.debouncer.lock()?;
        debouncer.input(query, now_ms);
        Ok(debouncer.deadline())
    }

    /// Run the pending search if it has settled by `now_ms`.
    ///
    /// Returns the new view, or `None` if nothing was evaluated.
    pub fn poll_search(&self, now_ms: u64) -> Result<Option<FfiDirectoryView>, DirectoryError> {
        let settled = self.debouncer.lock()?.poll(now_ms);
        let Some(query) = settled else {
            return Ok(None);
        };
        self.runtime.block_on(self.controller.quick_search(&query))?;
        Ok(Some(self.view()))
    }

    // =========================================================================
    // Records
    // =========================================================================

    pub fn get_hospital(&self, id: String) -> Result<FfiHospital, DirectoryError> {
        let hospital = self
            .runtime
            .block_on(self.controller.source().get_by_id(&id))?;
        Ok(hospital.into())
    }

    /// Submit a new hospital and refresh the view.
    pub fn add_hospital(&self, hospital: FfiNewHospital) -> Result<FfiHospital, DirectoryError> {
        let submission: NewHospital = hospital.into();
        let created = self
            .runtime
            .block_on(self.controller.source().create(&submission))?;
        self.refresh_after_write();
        Ok(created.into())
    }

    pub fn add_comment(&self, id: String, author: String, text: String) -> Result<FfiComment, DirectoryError> {
        let comment = NewComment { author, text };
        let added = self
            .runtime
            .block_on(self.controller.source().add_comment(&id, &comment))?;
        self.refresh_after_write();
        Ok(added.into())
    }

    pub fn update_hospital(&self, id: String, hospital: FfiNewHospital) -> Result<FfiHospital, DirectoryError> {
        let submission: NewHospital = hospital.into();
        let updated = self
            .runtime
            .block_on(self.controller.source().update(&id, &submission))?;
        self.refresh_after_write();
        Ok(updated.into())
    }

    pub fn delete_hospital(&self, id: String) -> Result<(), DirectoryError> {
        self.runtime
            .block_on(self.controller.source().delete(&id))?;
        self.refresh_after_write();
        Ok(())
    }
}

impl HospitalDirectory {
    /// Reload the view after a write; the write itself already succeeded.
    fn refresh_after_write(&self) {
        if let Err(e) = self.runtime.block_on(self.controller.refresh()) {
            tracing::warn!("View refresh after write failed: {}", e);
        }
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe directory configuration.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDirectoryConfig {
    /// Record service base URL; `None` uses the environment or built-in default
    pub base_url: Option<String>,
    pub use_fallback: bool,
    pub page_size: u32,
    pub request_timeout_secs: u64,
}

impl From<FfiDirectoryConfig> for DirectoryConfig {
    fn from(config: FfiDirectoryConfig) -> Self {
        let defaults = DirectoryConfig::default();
        DirectoryConfig {
            base_url: config.base_url.unwrap_or(defaults.base_url),
            use_fallback: config.use_fallback,
            page_size: config.page_size,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            quiet_interval: defaults.quiet_interval,
        }
    }
}

/// FFI-safe delivery cost.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDeliveryCost {
    pub normal: String,
    pub emergency: String,
    pub cs: Option<String>,
    pub currency: String,
}

impl From<DeliveryCost> for FfiDeliveryCost {
    fn from(cost: DeliveryCost) -> Self {
        Self {
            normal: cost.normal.to_string(),
            emergency: cost.emergency.to_string(),
            cs: cost.cs.map(|c| c.to_string()),
            currency: cost.currency,
        }
    }
}

/// FFI-safe comment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiComment {
    pub author: String,
    pub text: String,
    /// RFC 3339
    pub created_at: String,
}

impl From<Comment> for FfiComment {
    fn from(comment: Comment) -> Self {
        Self {
            author: comment.author,
            text: comment.text,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}

/// FFI-safe hospital.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHospital {
    pub id: String,
    pub state: String,
    pub name: String,
    pub location: String,
    pub services: Vec<String>,
    pub delivery_cost: FfiDeliveryCost,
    pub contact: String,
    pub hospital_type: String,
    pub comments: Vec<FfiComment>,
    pub expanded: bool,
}

impl From<Hospital> for FfiHospital {
    fn from(hospital: Hospital) -> Self {
        Self {
            id: hospital.id,
            state: hospital.state,
            name: hospital.name,
            location: hospital.location,
            services: hospital.services,
            delivery_cost: hospital.delivery_cost.into(),
            contact: hospital.contact,
            hospital_type: hospital.hospital_type.to_string(),
            comments: hospital.comments.into_iter().map(|c| c.into()).collect(),
            expanded: hospital.expanded,
        }
    }
}

/// FFI-safe hospital submission.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewHospital {
    pub state: String,
    pub name: String,
    pub location: String,
    pub services: Vec<String>,
    pub normal_cost: f64,
    pub emergency_cost: Option<f64>,
    pub cs_cost: Option<f64>,
    pub currency: String,
    pub contact: String,
    pub hospital_type: String,
    pub admin_code: Option<String>,
}

impl From<FfiNewHospital> for NewHospital {
    fn from(hospital: FfiNewHospital) -> Self {
        NewHospital {
            state: hospital.state,
            name: hospital.name,
            location: hospital.location,
            services: hospital.services,
            delivery_cost: NewDeliveryCost {
                normal: hospital.normal_cost.into(),
                emergency: hospital.emergency_cost.map(CostAmount::from),
                cs: hospital.cs_cost.map(CostAmount::from),
                currency: hospital.currency,
            },
            contact: hospital.contact,
            hospital_type: hospital.hospital_type,
            admin_code: hospital.admin_code,
        }
    }
}

/// FFI-safe filter criteria.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiFilterCriteria {
    pub state: Option<String>,
    pub hospital_type: Option<String>,
    pub services: Vec<String>,
    pub min_cost: Option<f64>,
    pub max_cost: Option<f64>,
    pub query: Option<String>,
}

impl From<FfiFilterCriteria> for FilterCriteria {
    fn from(criteria: FfiFilterCriteria) -> Self {
        FilterCriteria {
            state: criteria.state,
            hospital_type: criteria.hospital_type,
            services: criteria.services,
            min_cost: criteria.min_cost,
            max_cost: criteria.max_cost,
            query: criteria.query,
        }
    }
}

impl From<FilterCriteria> for FfiFilterCriteria {
    fn from(criteria: FilterCriteria) -> Self {
        Self {
            state: criteria.state,
            hospital_type: criteria.hospital_type,
            services: criteria.services,
            min_cost: criteria.min_cost,
            max_cost: criteria.max_cost,
            query: criteria.query,
        }
    }
}

/// FFI-safe region bucket.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRegionGroup {
    pub region: String,
    pub hospitals: Vec<FfiHospital>,
}

/// FFI-safe snapshot of the listing.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDirectoryView {
    pub phase: String,
    pub current_page: u32,
    pub total_pages: u32,
    pub pages: Vec<u32>,
    pub total_hospitals: u64,
    pub total_regions: u64,
    /// Regions in ascending order
    pub regions: Vec<FfiRegionGroup>,
    /// Active filter, if the view shows filtered results
    pub filter: Option<FfiFilterCriteria>,
    pub active_filter_count: u32,
    pub loading: bool,
    pub error: Option<String>,
}

impl From<PaginationState> for FfiDirectoryView {
    fn from(state: PaginationState) -> Self {
        let pages = state.pages();
        let active_filter_count = state
            .filter
            .as_ref()
            .map(|f| f.active_filter_count() as u32)
            .unwrap_or(0);
        let regions = state
            .groups
            .iter()
            .map(|(region, hospitals)| FfiRegionGroup {
                region: region.to_string(),
                hospitals: hospitals.iter().cloned().map(|h| h.into()).collect(),
            })
            .collect();

        Self {
            phase: format!("{:?}", state.phase),
            current_page: state.current_page,
            total_pages: state.total_pages,
            pages,
            total_hospitals: state.total_hospitals,
            total_regions: state.total_regions,
            regions,
            filter: state.filter.map(|f| f.into()),
            active_filter_count,
            loading: state.loading,
            error: state.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback_config() -> FfiDirectoryConfig {
        FfiDirectoryConfig {
            base_url: None,
            use_fallback: true,
            page_size: 4,
            request_timeout_secs: 5,
        }
    }

    fn kano() -> FfiNewHospital {
        FfiNewHospital {
            state: "Kano".into(),
            name: "Aminu Kano Teaching".into(),
            location: "Zaria Road".into(),
            services: vec!["Maternity".into()],
            normal_cost: 20000.0,
            emergency_cost: None,
            cs_cost: Some(80000.0),
            currency: "NGN".into(),
            contact: "+234 802 000 0000".into(),
            hospital_type: "Teaching".into(),
            admin_code: None,
        }
    }

    #[test]
    fn test_open_and_page_through_fallback() {
        let directory = open_directory(fallback_config()).unwrap();

        let view = directory.load().unwrap();
        assert_eq!(view.phase, "PageLoaded");
        assert_eq!(view.current_page, 1);
        assert_eq!(view.total_pages, 2);
        assert_eq!(view.pages, vec![1, 2]);
        let regions: Vec<&str> = view.regions.iter().map(|g| g.region.as_str()).collect();
        assert_eq!(regions, vec!["California", "Florida", "Georgia", "Illinois"]);

        let view = directory.next_page().unwrap();
        assert_eq!(view.current_page, 2);

        let view = directory.go_to_page(9).unwrap();
        assert_eq!(view.current_page, 2);
    }

    #[test]
    fn test_filters_and_search() {
        let directory = open_directory(fallback_config()).unwrap();
        directory.load().unwrap();

        let view = directory
            .apply_filters(FfiFilterCriteria {
                state: Some("texas".into()),
                ..FfiFilterCriteria::default()
            })
            .unwrap();
        assert_eq!(view.active_filter_count, 1);
        assert_eq!(view.regions.len(), 1);
        assert_eq!(view.regions[0].hospitals.len(), 2);

        assert_eq!(directory.search_input("miami".into(), 0).unwrap(), Some(400));
        assert!(directory.poll_search(100).unwrap().is_none());
        let view = directory.poll_search(400).unwrap().unwrap();
        assert_eq!(view.regions[0].hospitals[0].name, "Miami Sunshine Hospital");

        let view = directory.reset_filters().unwrap();
        assert!(view.filter.is_none());
        assert_eq!(view.current_page, 1);

        directory.search_input("miami".into(), 1000).unwrap();
        let view = directory.poll_search(1400).unwrap().unwrap();
        assert!(view.filter.is_some());
        assert_eq!(view.regions[0].hospitals[0].name, "Miami Sunshine Hospital");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = FfiDirectoryConfig {
            base_url: Some("https://api.example.com/v1/hospitals".into()),
            use_fallback: false,
            page_size: 10,
            request_timeout_secs: 0,
        };
        assert!(matches!(open_directory(config), Err(DirectoryError::InvalidInput(_))));
    }

    #[test]
    fn test_record_writes() {
        let directory = open_directory(fallback_config()).unwrap();
        directory.load().unwrap();

        let created = directory.add_hospital(kano()).unwrap();
        assert!(created.id.starts_with("mock-"));
        assert_eq!(created.delivery_cost.emergency, "20000");
        assert_eq!(created.delivery_cost.cs.as_deref(), Some("80000"));

        let comment = directory
            .add_comment(created.id.clone(), "Ada".into(), "Clean wards".into())
            .unwrap();
        assert_eq!(comment.author, "Ada");
        assert_eq!(directory.get_hospital(created.id.clone()).unwrap().comments.len(), 1);

        directory.delete_hospital(created.id.clone()).unwrap();
        assert!(matches!(
            directory.get_hospital(created.id),
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = open_directory(FfiDirectoryConfig {
            page_size: 0,
            ..fallback_config()
        });
        assert!(matches!(result, Err(DirectoryError::InvalidInput(_))));
    }
}
