//! Paged listing state and the controller that drives it.
//!
//! Lifecycle: `Uninitialized` (placeholder page count) → `StatsKnown`
//! (page count from the stats summary) → `PageLoaded` (records on display).
//!
//! Every fetch is issued a [`PageTicket`]; a completion carrying an older
//! ticket than the latest one issued is discarded, so a slow response can
//! never overwrite a newer page.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::directory::RegionGroups;
use crate::models::{
    pages_for, FilterCriteria, Hospital, StatsSummary, DEFAULT_TOTAL_HOSPITALS,
    DEFAULT_TOTAL_STATES,
};
use crate::source::{HospitalSource, ListPage, SourceError, SourceResult};

/// Where the listing is in its load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadPhase {
    Uninitialized,
    StatsKnown,
    PageLoaded,
}

/// Token identifying one issued fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTicket {
    generation: u64,
}

/// Snapshot of the listing as published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationState {
    pub phase: LoadPhase,
    /// 1-based page on display
    pub current_page: u32,
    /// Regions per page
    pub page_size: u32,
    pub total_pages: u32,
    pub total_hospitals: u64,
    pub total_regions: u64,
    /// Records on display, grouped by region
    pub groups: RegionGroups,
    /// Criteria behind the displayed results; `None` for the paged listing
    pub filter: Option<FilterCriteria>,
    pub loading: bool,
    /// Message of the last failed fetch
    pub error: Option<String>,
    generation: u64,
}

impl PaginationState {
    /// Placeholder state shown before any stats arrive.
    pub fn new(page_size: u32) -> Self {
        Self {
            phase: LoadPhase::Uninitialized,
            current_page: 1,
            page_size,
            total_pages: pages_for(DEFAULT_TOTAL_STATES, page_size),
            total_hospitals: DEFAULT_TOTAL_HOSPITALS,
            total_regions: DEFAULT_TOTAL_STATES,
            groups: RegionGroups::new(),
            filter: None,
            loading: false,
            error: None,
            generation: 0,
        }
    }

    /// Adopt totals from a stats summary. Defaulted or non-positive totals
    /// are ignored and the placeholder stays.
    pub fn apply_stats(&mut self, stats: &StatsSummary) -> bool {
        if !stats.totals_reported || stats.total_hospitals == 0 || stats.total_states == 0 {
            return false;
        }
        self.total_hospitals = stats.total_hospitals;
        self.total_regions = stats.total_states;
        self.total_pages = stats.total_pages(self.page_size);
        if self.phase == LoadPhase::Uninitialized {
            self.phase = LoadPhase::StatsKnown;
        }
        true
    }

    /// Whether `page` is within `1..=total_pages`.
    pub fn accepts_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }

    /// Issue a ticket for a new fetch. Any older ticket becomes stale.
    pub fn begin(&mut self) -> PageTicket {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        PageTicket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: PageTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Show a listing page. Returns false if the ticket is stale.
    pub fn complete_page(&mut self, ticket: PageTicket, page: u32, listing: ListPage) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        if let Some(meta) = listing.meta {
            if meta.total_pages > 0 {
                self.total_pages = meta.total_pages;
            }
            if meta.total > 0 {
                self.total_hospitals = meta.total;
            }
        }
        self.groups = listing.groups;
        self.current_page = page;
        self.filter = None;
        self.phase = LoadPhase::PageLoaded;
        true
    }

    /// Show the full result of a filtered search. Returns false if the ticket is stale.
    pub fn complete_filtered(
        &mut self,
        ticket: PageTicket,
        criteria: FilterCriteria,
        records: Vec<Hospital>,
    ) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        self.groups = RegionGroups::group(records);
        self.filter = Some(criteria);
        self.phase = LoadPhase::PageLoaded;
        true
    }

    /// Record a failed fetch, keeping the data on display. Returns false if the ticket is stale.
    pub fn fail(&mut self, ticket: PageTicket, message: impl Into<String>) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        self.error = Some(message.into());
        true
    }

    fn accept(&mut self, ticket: PageTicket) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                "Discarding stale response (generation {} < {})",
                ticket.generation,
                self.generation
            );
            return false;
        }
        self.loading = false;
        true
    }

    /// Page numbers `1..=total_pages`.
    pub fn pages(&self) -> Vec<u32> {
        (1..=self.total_pages).collect()
    }

    pub fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }

    pub fn has_next(&self) -> bool {
        self.filter.is_none() && self.current_page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.filter.is_none() && self.current_page > 1
    }
}

/// Drives [`PaginationState`] against a [`HospitalSource`] and publishes
/// every change to subscribers.
pub struct PaginationController {
    source: Arc<dyn HospitalSource>,
    publisher: watch::Sender<PaginationState>,
}

impl PaginationController {
    pub fn new(source: Arc<dyn HospitalSource>, page_size: u32) -> Self {
        let (publisher, _) = watch::channel(PaginationState::new(page_size));
        Self { source, publisher }
    }

    /// Current state.
    pub fn state(&self) -> PaginationState {
        self.publisher.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<PaginationState> {
        self.publisher.subscribe()
    }

    pub fn source(&self) -> &Arc<dyn HospitalSource> {
        &self.source
    }

    /// Initial load: fetch stats, then the first page.
    ///
    /// A stats failure only leaves the placeholder page count in place.
    pub async fn request_stats(&self) -> SourceResult<bool> {
        match self.source.stats().await {
            Ok(stats) => {
                if !self.publisher.send_if_modified(|s| s.apply_stats(&stats)) {
                    tracing::warn!("Stats carried no usable totals, keeping placeholder page count");
                }
            }
            Err(e) => {
                tracing::warn!("Stats unavailable, keeping placeholder page count: {}", e);
            }
        }
        self.load_page(1).await
    }

    /// Load page `page`. Out-of-range pages are ignored.
    ///
    /// Returns whether the fetched page was put on display.
    pub async fn request_page(&self, page: u32) -> SourceResult<bool> {
        if !self.publisher.borrow().accepts_page(page) {
            tracing::debug!("Ignoring request for out-of-range page {}", page);
            return Ok(false);
        }
        self.load_page(page).await
    }

    pub async fn next_page(&self) -> SourceResult<bool> {
        let next = self.publisher.borrow().current_page.saturating_add(1);
        self.request_page(next).await
    }

    pub async fn prev_page(&self) -> SourceResult<bool> {
        let prev = self.publisher.borrow().current_page.saturating_sub(1);
        self.request_page(prev).await
    }

    /// Show every record matching `criteria`, unpaginated.
    ///
    /// Empty criteria go back to the paged listing at the current page.
    pub async fn apply_filter(&self, criteria: FilterCriteria) -> SourceResult<bool> {
        let criteria = criteria.normalized();
        if criteria.is_empty() {
            let current = self.publisher.borrow().current_page;
            return self.request_page(current).await;
        }

        let ticket = self.begin();
        match self.source.search(&criteria).await {
            Ok(records) => {
                tracing::debug!("Filter matched {} hospital(s)", records.len());
                Ok(self
                    .publisher
                    .send_if_modified(|s| s.complete_filtered(ticket, criteria, records)))
            }
            Err(e) => self.settle_failure(ticket, e),
        }
    }

    /// Free-text search over name and location.
    pub async fn quick_search(&self, query: &str) -> SourceResult<bool> {
        self.apply_filter(FilterCriteria::text(query)).await
    }

    /// Clear any filter and return to the first page.
    pub async fn reset_filters(&self) -> SourceResult<bool> {
        self.load_page(1).await
    }

    /// Re-run whatever is on display (filter or page).
    pub async fn refresh(&self) -> SourceResult<bool> {
        let (filter, page) = {
            let state = self.publisher.borrow();
            (state.filter.clone(), state.current_page)
        };
        match filter {
            Some(criteria) => self.apply_filter(criteria).await,
            None => self.load_page(page).await,
        }
    }

    /// Flip the expansion flag of a displayed record.
    pub fn toggle_expanded(&self, id: &str) -> bool {
        self.publisher.send_if_modified(|s| match s.groups.find_mut(id) {
            Some(hospital) => {
                hospital.toggle_expanded();
                true
            }
            None => false,
        })
    }

    fn begin(&self) -> PageTicket {
        let mut ticket = PageTicket::default();
        self.publisher.send_modify(|s| ticket = s.begin());
        ticket
    }

    async fn load_page(&self, page: u32) -> SourceResult<bool> {
        let ticket = self.begin();
        let page_size = self.publisher.borrow().page_size;
        tracing::debug!("Loading page {} ({} regions per page)", page, page_size);

        match self.source.list(page, page_size).await {
            Ok(listing) => Ok(self
                .publisher
                .send_if_modified(|s| s.complete_page(ticket, page, listing))),
            Err(e) => self.settle_failure(ticket, e),
        }
    }

    /// Surface a failed fetch, unless a newer fetch has superseded it.
    fn settle_failure(&self, ticket: PageTicket, error: SourceError) -> SourceResult<bool> {
        if self.publisher.send_if_modified(|s| s.fail(ticket, error.to_string())) {
            Err(error)
        } else {
            tracing::debug!("Dropping superseded failure: {}", error);
            Ok(false)
        }
    }
}
