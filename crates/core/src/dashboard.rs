//! Dashboard composition.
//!
//! [`DashboardComposer`] takes an authenticated viewer, routes their role to a
//! view, resolves and guards their scope, then fetches every section of the
//! view in parallel through the [`AnalyticsSource`]. Each section settles
//! independently, so one failing fetch produces a partial view rather than a
//! failed page.
//!
//! A load is bounded by [`ComposerConfig::load_timeout`] and is abandoned as
//! soon as the same viewer starts a newer load on the same channel.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;

use crate::aggregation::activity::{summarize_activity, ActivitySummary, RECENT_EVENTS};
use crate::aggregation::attendance::{summarize_attendance, AttendanceSummary};
use crate::aggregation::finance::{summarize_fees, summarize_revenue, FinanceSummary, RevenueSummary};
use crate::aggregation::grades::{summarize_grades, GradeSummary};
use crate::aggregation::system::SystemStats;
use crate::guard::{guard, GuardDenial};
use crate::partial::{Completeness, Metric};
use crate::refresh::{RefreshTicket, RefreshTracker, SummaryCache};
use crate::retry::{with_retry, RetryPolicy};
use crate::router::{route, DashboardView, Section};
use crate::scope::{resolve, Narrowing, QueryScope, ScopeError, Viewer};
use crate::source::{AnalyticsSource, Counter, EventFilter, GradeFilter, RecordFilter, SourceError};
use crate::types::{DbId, Timestamp};
use crate::view::{hints, ViewState};

/// Refresh channel for full-dashboard loads.
pub const DASHBOARD_CHANNEL: &str = "dashboard";
/// Message shown when view assembly panics.
pub const ANALYTICS_ERROR: &str = "An analytics error occurred while building this view";
/// Message shown when every fetch of a view failed.
pub const FETCH_FAILED: &str = "Unable to load dashboard data";

// ---------------------------------------------------------------------------
// Section payloads
// ---------------------------------------------------------------------------

/// The computed summary of one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "section", content = "summary")]
pub enum SectionData {
    Finance(FinanceSummary),
    Transactions(RevenueSummary),
    Grades(GradeSummary),
    Attendance(AttendanceSummary),
    Activity(ActivitySummary),
    SystemStats(SystemStats),
}

impl SectionData {
    pub fn section(&self) -> Section {
        match self {
            SectionData::Finance(_) => Section::Finance,
            SectionData::Transactions(_) => Section::Transactions,
            SectionData::Grades(_) => Section::Grades,
            SectionData::Attendance(_) => Section::Attendance,
            SectionData::Activity(_) => Section::Activity,
            SectionData::SystemStats(_) => Section::SystemStats,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SectionData::Finance(s) => s.is_empty(),
            SectionData::Transactions(s) => s.is_empty(),
            SectionData::Grades(s) => s.is_empty(),
            SectionData::Attendance(s) => s.is_empty(),
            SectionData::Activity(s) => s.is_empty(),
            SectionData::SystemStats(s) => s.is_empty(),
        }
    }

    /// Sub-metrics that could not be fetched, prefixed with the section name.
    pub fn unavailable(&self) -> Vec<String> {
        match self {
            SectionData::SystemStats(stats) => stats
                .unavailable()
                .into_iter()
                .map(|name| format!("{}.{name}", Section::SystemStats.as_str()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Empty-state hint for a section.
pub fn hint_for(section: Section) -> &'static str {
    match section {
        Section::Finance => hints::FINANCE,
        Section::Transactions => hints::TRANSACTIONS,
        Section::Grades => hints::GRADES,
        Section::Attendance => hints::ATTENDANCE,
        Section::Activity => hints::ACTIVITY,
        Section::SystemStats => hints::SYSTEM,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardData {
    pub sections: Vec<SectionData>,
}

// ---------------------------------------------------------------------------
// Requests, reports, errors
// ---------------------------------------------------------------------------

/// One dashboard or widget load.
///
/// `as_of` anchors every relative time window, so two loads with the same
/// explicit anchor and unchanged backend state produce identical output.
/// When unset the composer anchors at the moment the load starts.
#[derive(Debug, Clone)]
pub struct DashboardRequest {
    pub viewer: Viewer,
    /// Target school. Only system viewers may leave this unset or pick a
    /// school other than their own.
    pub school_id: Option<DbId>,
    pub filter: RecordFilter,
    /// Activity window override in hours.
    pub window_hours: Option<i64>,
    pub as_of: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub view: DashboardView,
    pub scope: QueryScope,
    pub state: ViewState<DashboardData>,
    pub generated_at: Timestamp,
    /// Suggested client auto-refresh interval.
    pub refresh_hint_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WidgetReport {
    pub section: Section,
    pub scope: QueryScope,
    pub state: ViewState<SectionData>,
    pub generated_at: Timestamp,
    pub refresh_hint_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DashboardError {
    #[error("Access denied for role '{role}'")]
    AccessDenied { role: String },

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error("{}", .0.reason)]
    Denied(GuardDenial),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Superseded by a newer load")]
    Superseded,
}

impl From<GuardDenial> for DashboardError {
    fn from(denial: GuardDenial) -> Self {
        DashboardError::Denied(denial)
    }
}

// ---------------------------------------------------------------------------
// Composer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Upper bound on one load. Exceeding it yields [`ViewState::TimedOut`].
    pub load_timeout: Duration,
    pub retry: RetryPolicy,
    /// Default activity window in hours.
    pub activity_window_hours: i64,
    /// Cap on how long any cached section summary is reused.
    pub cache_max_ttl: Duration,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
            activity_window_hours: 24,
            cache_max_ttl: Duration::from_secs(600),
        }
    }
}

/// Cache identity of one computed section.
///
/// `anchor` is the request's explicit `as_of` for sections with a relative
/// time window and `None` otherwise, so loads pinned to different instants
/// never share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SectionKey {
    scope: QueryScope,
    filter: RecordFilter,
    section: Section,
    window_hours: i64,
    anchor: Option<Timestamp>,
}

fn widget_channel(section: Section) -> String {
    format!("widget:{}", section.as_str())
}

pub struct DashboardComposer {
    source: Arc<dyn AnalyticsSource>,
    config: ComposerConfig,
    tracker: RefreshTracker,
    cache: SummaryCache<SectionKey, SectionData>,
}

type SectionOutcome = (Section, Result<SectionData, SourceError>);

impl DashboardComposer {
    pub fn new(source: Arc<dyn AnalyticsSource>, config: ComposerConfig) -> Self {
        Self {
            source,
            config,
            tracker: RefreshTracker::new(),
            cache: SummaryCache::new(),
        }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Drop cached summaries older than the configured maximum TTL.
    pub fn evict_stale(&self) -> usize {
        self.cache.evict_older_than(self.config.cache_max_ttl)
    }

    /// Load the full dashboard for the viewer's role.
    pub async fn load_dashboard(
        &self,
        request: &DashboardRequest,
    ) -> Result<DashboardReport, DashboardError> {
        let view = route(&request.viewer.role);
        if let DashboardView::AccessDenied { role } = &view {
            tracing::warn!(user_id = request.viewer.user_id, role = %role, "Dashboard access denied");
            return Err(DashboardError::AccessDenied { role: role.clone() });
        }
        let scope = self.authorize(request, &view.sections())?;
        let sections = view.sections();
        let as_of = request.as_of.unwrap_or_else(chrono::Utc::now);

        let ticket = self.tracker.begin(request.viewer.user_id, DASHBOARD_CHANNEL);
        let load = join_all(sections.iter().map(|section| {
            self.fetch_cached(&scope, request, *section, as_of, ticket.generation)
        }));
        let settled = self.bounded(load, &ticket).await;
        self.tracker.finish(&ticket);

        let state = match settled? {
            Settled::Done(outcomes) => compose(outcomes),
            Settled::TimedOut => ViewState::TimedOut {
                after_secs: self.config.load_timeout.as_secs(),
            },
            Settled::Panicked => ViewState::Error {
                message: ANALYTICS_ERROR.to_string(),
                retryable: true,
            },
        };

        tracing::info!(
            user_id = request.viewer.user_id,
            view = view.name(),
            state = state.label(),
            generation = ticket.generation,
            "Dashboard composed",
        );

        Ok(DashboardReport {
            refresh_hint_secs: view.refresh_interval().map(|d| d.as_secs()),
            view,
            scope,
            state,
            generated_at: as_of,
        })
    }

    /// Load a single section on its own refresh channel.
    pub async fn load_section(
        &self,
        request: &DashboardRequest,
        section: Section,
    ) -> Result<WidgetReport, DashboardError> {
        if let DashboardView::AccessDenied { role } = route(&request.viewer.role) {
            return Err(DashboardError::AccessDenied { role });
        }
        let scope = self.authorize(request, &[section])?;
        let as_of = request.as_of.unwrap_or_else(chrono::Utc::now);

        let ticket = self.tracker.begin(request.viewer.user_id, &widget_channel(section));
        let load = self.fetch_cached(&scope, request, section, as_of, ticket.generation);
        let settled = self.bounded(load, &ticket).await;
        self.tracker.finish(&ticket);

        let state = match settled? {
            Settled::Done((_, result)) => section_state(section, result),
            Settled::TimedOut => ViewState::TimedOut {
                after_secs: self.config.load_timeout.as_secs(),
            },
            Settled::Panicked => ViewState::Error {
                message: ANALYTICS_ERROR.to_string(),
                retryable: true,
            },
        };

        tracing::debug!(
            user_id = request.viewer.user_id,
            section = section.as_str(),
            state = state.label(),
            "Widget composed",
        );
        Ok(widget_report(section, scope, state, as_of))
    }

    /// Read a widget without superseding a load already running for it.
    ///
    /// A fresh cached summary is returned as is. While the same viewer has a
    /// load in flight on the widget's channel the state is
    /// [`ViewState::Loading`]. Otherwise this behaves like
    /// [`load_section`](Self::load_section).
    pub async fn poll_section(
        &self,
        request: &DashboardRequest,
        section: Section,
    ) -> Result<WidgetReport, DashboardError> {
        if let DashboardView::AccessDenied { role } = route(&request.viewer.role) {
            return Err(DashboardError::AccessDenied { role });
        }
        let scope = self.authorize(request, &[section])?;
        let as_of = request.as_of.unwrap_or_else(chrono::Utc::now);

        let key = self.section_key(&scope, request, section);
        if let Some(hit) = self.cache.get(&key, self.ttl(section)) {
            return Ok(widget_report(section, scope, section_state(section, Ok(hit)), as_of));
        }
        if self
            .tracker
            .is_inflight(request.viewer.user_id, &widget_channel(section))
        {
            tracing::debug!(
                user_id = request.viewer.user_id,
                section = section.as_str(),
                "Widget load in flight",
            );
            return Ok(widget_report(section, scope, ViewState::Loading, as_of));
        }
        self.load_section(request, section).await
    }

    /// Validate the filter, resolve the viewer and guard every section.
    /// Nothing here touches the data source.
    fn authorize(
        &self,
        request: &DashboardRequest,
        sections: &[Section],
    ) -> Result<QueryScope, DashboardError> {
        request
            .filter
            .validate()
            .map_err(DashboardError::InvalidFilter)?;

        let resolved = resolve(&request.viewer).inspect_err(|e| {
            tracing::warn!(user_id = request.viewer.user_id, error = %e, "Scope resolution failed");
        })?;
        let scope = resolved.query_scope(request.school_id)?;

        for section in sections {
            guard(section.required_scope(), scope.level()).into_result()?;
        }
        Ok(scope)
    }

    /// Race `load` against the timeout and against supersession.
    async fn bounded<T>(
        &self,
        load: impl std::future::Future<Output = T>,
        ticket: &RefreshTicket,
    ) -> Result<Settled<T>, DashboardError> {
        let guarded = AssertUnwindSafe(load).catch_unwind();
        tokio::select! {
            biased;
            _ = ticket.superseded() => {
                tracing::debug!(generation = ticket.generation, "Load superseded, discarding");
                Err(DashboardError::Superseded)
            }
            res = tokio::time::timeout(self.config.load_timeout, guarded) => match res {
                Ok(Ok(value)) => Ok(Settled::Done(value)),
                Ok(Err(_)) => {
                    tracing::error!(generation = ticket.generation, "Panic while composing view");
                    Ok(Settled::Panicked)
                }
                Err(_) => {
                    tracing::warn!(
                        generation = ticket.generation,
                        timeout_secs = self.config.load_timeout.as_secs(),
                        "Dashboard load timed out",
                    );
                    Ok(Settled::TimedOut)
                }
            },
        }
    }

    async fn fetch_cached(
        &self,
        scope: &QueryScope,
        request: &DashboardRequest,
        section: Section,
        as_of: Timestamp,
        generation: u64,
    ) -> SectionOutcome {
        let key = self.section_key(scope, request, section);
        if let Some(hit) = self.cache.get(&key, self.ttl(section)) {
            return (section, Ok(hit));
        }

        let result = self.fetch_section(scope, request, section, as_of).await;
        if let Ok(data) = &result {
            self.cache.store(key, generation, data.clone());
        }
        (section, result)
    }

    fn section_key(
        &self,
        scope: &QueryScope,
        request: &DashboardRequest,
        section: Section,
    ) -> SectionKey {
        let windowed = matches!(section, Section::Activity | Section::SystemStats);
        SectionKey {
            scope: *scope,
            filter: request.filter.clone(),
            section,
            window_hours: self.window_hours(request),
            anchor: request.as_of.filter(|_| windowed),
        }
    }

    fn ttl(&self, section: Section) -> Duration {
        section.stale_after().min(self.config.cache_max_ttl)
    }

    fn window_hours(&self, request: &DashboardRequest) -> i64 {
        request
            .window_hours
            .unwrap_or(self.config.activity_window_hours)
            .clamp(1, 24 * 30)
    }

    async fn fetch_section(
        &self,
        scope: &QueryScope,
        request: &DashboardRequest,
        section: Section,
        as_of: Timestamp,
    ) -> Result<SectionData, SourceError> {
        let source = self.source.as_ref();
        let policy = &self.config.retry;
        let filter = &request.filter;

        match section {
            Section::Finance => {
                let fees = with_retry(policy, "fees", move || source.fees(scope, filter)).await?;
                Ok(SectionData::Finance(summarize_fees(&fees)))
            }
            Section::Transactions => {
                let txs =
                    with_retry(policy, "transactions", move || source.transactions(scope, filter))
                        .await?;
                Ok(SectionData::Transactions(summarize_revenue(&txs)))
            }
            Section::Grades => {
                let grade_filter = GradeFilter {
                    record: filter.clone(),
                    released_only: matches!(scope.narrowing(), Narrowing::Guardian(_)),
                };
                let grade_filter = &grade_filter;
                let grades =
                    with_retry(policy, "grades", move || source.grades(scope, grade_filter)).await?;
                Ok(SectionData::Grades(summarize_grades(&grades)))
            }
            Section::Attendance => {
                let records =
                    with_retry(policy, "attendance", move || source.attendance(scope, filter))
                        .await?;
                Ok(SectionData::Attendance(summarize_attendance(&records)))
            }
            Section::Activity => {
                let since = as_of - TimeDelta::hours(self.window_hours(request));
                let latest = EventFilter {
                    since,
                    limit: RECENT_EVENTS as i64,
                };
                let latest = &latest;
                let (buckets, users, events) = tokio::try_join!(
                    with_retry(policy, "event_buckets", move || source.event_buckets(scope, since)),
                    with_retry(policy, "active_users", move || {
                        source.count(scope, Counter::ActiveUsers { since })
                    }),
                    with_retry(policy, "events", move || source.events(scope, latest)),
                )?;
                Ok(SectionData::Activity(summarize_activity(
                    &buckets,
                    users,
                    &events,
                    RECENT_EVENTS,
                )))
            }
            Section::SystemStats => self.fetch_system_stats(scope, request, as_of).await,
        }
    }

    /// Fetch every platform counter in parallel. Fails only when all of
    /// them fail.
    async fn fetch_system_stats(
        &self,
        scope: &QueryScope,
        request: &DashboardRequest,
        as_of: Timestamp,
    ) -> Result<SectionData, SourceError> {
        let source = self.source.as_ref();
        let policy = &self.config.retry;
        let window_hours = self.window_hours(request);
        let since = as_of - TimeDelta::hours(window_hours);

        let counter = move |c: Counter| async move {
            with_retry(policy, c.as_str(), move || source.count(scope, c)).await
        };
        let (schools, users, students, active, alerts) = tokio::join!(
            counter(Counter::Schools),
            counter(Counter::Users),
            counter(Counter::Students),
            counter(Counter::ActiveUsers { since }),
            counter(Counter::Alerts { since }),
        );

        let first_error = [&schools, &users, &students, &active, &alerts]
            .into_iter()
            .find_map(|r| r.as_ref().err().cloned());

        let stats = SystemStats {
            schools: Metric::from(schools),
            users: Metric::from(users),
            students: Metric::from(students),
            active_users: Metric::from(active),
            alerts: Metric::from(alerts),
            window_hours,
        };
        match (stats.completeness(), first_error) {
            (Completeness::Failed, Some(e)) => Err(e),
            _ => Ok(SectionData::SystemStats(stats)),
        }
    }
}

enum Settled<T> {
    Done(T),
    TimedOut,
    Panicked,
}

fn widget_report(
    section: Section,
    scope: QueryScope,
    state: ViewState<SectionData>,
    generated_at: Timestamp,
) -> WidgetReport {
    WidgetReport {
        section,
        scope,
        state,
        generated_at,
        refresh_hint_secs: section.refresh_interval().map(|d| d.as_secs()),
    }
}

fn section_state(
    section: Section,
    result: Result<SectionData, SourceError>,
) -> ViewState<SectionData> {
    match result {
        Ok(data) if data.is_empty() => ViewState::empty(hint_for(section)),
        Ok(data) => {
            let unavailable = data.unavailable();
            ViewState::partial(data, unavailable)
        }
        Err(_) => ViewState::fetch_error(FETCH_FAILED),
    }
}

/// Fold settled sections into the view state.
///
/// All failed: retryable error. All succeeded but empty: empty state with an
/// actionable hint. Otherwise populated, flagged incomplete when any section
/// or sub-metric is unavailable.
fn compose(outcomes: Vec<SectionOutcome>) -> ViewState<DashboardData> {
    let total = outcomes.len();
    let mut sections = Vec::with_capacity(total);
    let mut unavailable = Vec::new();

    for (section, result) in outcomes {
        match result {
            Ok(data) => {
                unavailable.extend(data.unavailable());
                sections.push(data);
            }
            Err(e) => {
                tracing::warn!(section = section.as_str(), error = %e, "Section unavailable");
                unavailable.push(section.as_str().to_string());
            }
        }
    }

    if sections.is_empty() && total > 0 {
        return ViewState::fetch_error(FETCH_FAILED);
    }
    if unavailable.is_empty() && sections.iter().all(SectionData::is_empty) {
        let hint = match sections.as_slice() {
            [only] => hint_for(only.section()),
            _ => hints::DASHBOARD,
        };
        return ViewState::empty(hint);
    }
    ViewState::partial(DashboardData { sections }, unavailable)
}
