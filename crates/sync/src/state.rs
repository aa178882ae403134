//! Per-session view state for the admin console.
//!
//! [`AdminView`] is a pure reducer: [`AdminView::apply`] takes an [`Input`]
//! (a realtime event, a user action, or the result of an earlier
//! [`Command`]) and returns the commands the driver must run next. It never
//! performs I/O, so every transition is unit-tested without a server.
//!
//! The list only changes when the user asks for it. A `new-submission`
//! event marks the view stale and offers a refresh; it never reloads the
//! page under the reader. Every list fetch carries a request id and only
//! the newest one may land.

use intake_core::query::SubmissionListParams;
use intake_core::realtime::SubmissionEvent;
use intake_core::submission::SubmissionStatus;
use intake_core::types::DbId;

use crate::model::{ListPage, SubmissionView};

/// Shown when a list or detail fetch fails. Server details stay in the log.
pub const FETCH_FAILED_NOTICE: &str = "Could not load submissions. Please try again.";

/// Shown when a status change is refused.
pub const UPDATE_FAILED_NOTICE: &str = "Could not update the submission status.";

/// Freshness of the list relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// The list reflects the last completed fetch and nothing newer is known.
    Synced,
    /// The server has submissions the list does not show yet.
    StaleAvailable,
    /// A list fetch is in flight.
    Refreshing,
}

/// Something that happened to the session.
#[derive(Debug, Clone)]
pub enum Input {
    /// A decoded event from the admin channel.
    Event(SubmissionEvent),
    /// The realtime socket came back after a drop; events may have been missed.
    Reconnected,
    /// The user pressed refresh.
    RefreshRequested,
    /// Navigate to another page, keeping filters and sort.
    PageChanged(i64),
    /// New page size; returns to page 1.
    PageSizeChanged(i64),
    /// New filters (status, artist name, genre, dates, search); returns to page 1.
    FiltersChanged(SubmissionListParams),
    /// New sort key and direction, keeping the page.
    SortChanged { sort_by: String, sort_order: String },
    DetailOpened(DbId),
    DetailClosed,
    StatusChangeRequested { id: DbId, status: SubmissionStatus },
    ListLoaded {
        request_id: u64,
        result: Result<ListPage, String>,
    },
    DetailLoaded {
        request_id: u64,
        result: Result<SubmissionView, String>,
    },
    StatusChangeCompleted {
        id: DbId,
        result: Result<SubmissionView, String>,
    },
}

/// Work the driver must perform; results come back as [`Input`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchList {
        request_id: u64,
        params: SubmissionListParams,
    },
    FetchDetail {
        request_id: u64,
        id: DbId,
    },
    UpdateStatus {
        id: DbId,
        status: SubmissionStatus,
    },
}

/// Everything one admin session shows, plus the bookkeeping to keep it honest.
#[derive(Debug, Clone)]
pub struct AdminView {
    params: SubmissionListParams,
    page: ListPage,
    state: SyncState,
    detail: Option<SubmissionView>,
    notice: Option<String>,
    pending_updates: Vec<DbId>,

    next_request_id: u64,
    list_request: Option<u64>,
    detail_request: Option<(u64, DbId)>,
    /// State to return to if the in-flight list fetch fails.
    state_before_refresh: SyncState,
    /// A `new-submission` arrived while a fetch was in flight.
    stale_during_refresh: bool,
}

impl AdminView {
    /// A synced view over an initial page fetched with `params`.
    pub fn new(params: SubmissionListParams, page: ListPage) -> Self {
        Self {
            params,
            page,
            state: SyncState::Synced,
            detail: None,
            notice: None,
            pending_updates: Vec::new(),
            next_request_id: 1,
            list_request: None,
            detail_request: None,
            state_before_refresh: SyncState::Synced,
            stale_during_refresh: false,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn page(&self) -> &ListPage {
        &self.page
    }

    pub fn params(&self) -> &SubmissionListParams {
        &self.params
    }

    pub fn detail(&self) -> Option<&SubmissionView> {
        self.detail.as_ref()
    }

    /// Generic message for the last failure, cleared by the next success.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Submissions with a status change awaiting acknowledgement.
    pub fn pending_updates(&self) -> &[DbId] {
        &self.pending_updates
    }

    /// Whether a "new submissions available" prompt should be shown.
    pub fn is_stale(&self) -> bool {
        self.state == SyncState::StaleAvailable
    }

    /// Advance the state machine.
    pub fn apply(&mut self, input: Input) -> Vec<Command> {
        match input {
            Input::Event(SubmissionEvent::NewSubmission(_)) | Input::Reconnected => {
                self.mark_stale();
                Vec::new()
            }
            Input::Event(SubmissionEvent::SubmissionUpdated(payload)) => {
                if self.open_detail_id() == Some(payload.submission_id) {
                    vec![self.fetch_detail(payload.submission_id)]
                } else {
                    Vec::new()
                }
            }
            Input::RefreshRequested => vec![self.refresh()],
            Input::PageChanged(page) => {
                self.params.page = Some(page.max(1).to_string());
                vec![self.refresh()]
            }
            Input::PageSizeChanged(size) => {
                self.params.page_size = Some(size.to_string());
                self.params.page = None;
                vec![self.refresh()]
            }
            Input::FiltersChanged(filters) => {
                self.params = SubmissionListParams {
                    page: None,
                    page_size: self.params.page_size.take(),
                    sort_by: self.params.sort_by.take(),
                    sort_order: self.params.sort_order.take(),
                    ..filters
                };
                vec![self.refresh()]
            }
            Input::SortChanged {
                sort_by,
                sort_order,
            } => {
                self.params.sort_by = Some(sort_by);
                self.params.sort_order = Some(sort_order);
                vec![self.refresh()]
            }
            Input::DetailOpened(id) => {
                self.detail = None;
                vec![self.fetch_detail(id)]
            }
            Input::DetailClosed => {
                self.detail = None;
                self.detail_request = None;
                Vec::new()
            }
            Input::StatusChangeRequested { id, status } => {
                if !self.pending_updates.contains(&id) {
                    self.pending_updates.push(id);
                }
                vec![Command::UpdateStatus { id, status }]
            }
            Input::ListLoaded { request_id, result } => {
                self.list_loaded(request_id, result);
                Vec::new()
            }
            Input::DetailLoaded { request_id, result } => {
                self.detail_loaded(request_id, result);
                Vec::new()
            }
            Input::StatusChangeCompleted { id, result } => self.status_changed(id, result),
        }
    }

    // ---- transitions ----

    fn mark_stale(&mut self) {
        match self.state {
            SyncState::Refreshing => self.stale_during_refresh = true,
            SyncState::Synced | SyncState::StaleAvailable => {
                self.state = SyncState::StaleAvailable;
            }
        }
    }

    /// Re-issue the current list query. Supersedes any fetch in flight.
    fn refresh(&mut self) -> Command {
        if self.state != SyncState::Refreshing {
            self.state_before_refresh = self.state;
        }
        self.state = SyncState::Refreshing;

        let request_id = self.take_request_id();
        self.list_request = Some(request_id);
        Command::FetchList {
            request_id,
            params: self.params.clone(),
        }
    }

    fn fetch_detail(&mut self, id: DbId) -> Command {
        let request_id = self.take_request_id();
        self.detail_request = Some((request_id, id));
        Command::FetchDetail { request_id, id }
    }

    fn list_loaded(&mut self, request_id: u64, result: Result<ListPage, String>) {
        if self.list_request != Some(request_id) {
            tracing::debug!(request_id, "Discarding superseded list response");
            return;
        }
        self.list_request = None;
        let stale = std::mem::take(&mut self.stale_during_refresh);

        match result {
            Ok(page) => {
                self.page = page;
                self.notice = None;
                self.state = if stale {
                    SyncState::StaleAvailable
                } else {
                    SyncState::Synced
                };
            }
            Err(error) => {
                tracing::warn!(request_id, error = %error, "List refresh failed");
                self.notice = Some(FETCH_FAILED_NOTICE.to_string());
                self.state = if stale {
                    SyncState::StaleAvailable
                } else {
                    self.state_before_refresh
                };
            }
        }
    }

    fn detail_loaded(&mut self, request_id: u64, result: Result<SubmissionView, String>) {
        match self.detail_request {
            Some((current, _)) if current == request_id => {}
            _ => {
                tracing::debug!(request_id, "Discarding superseded detail response");
                return;
            }
        }

        match result {
            Ok(view) => self.detail = Some(view),
            Err(error) => {
                tracing::warn!(request_id, error = %error, "Detail fetch failed");
                self.notice = Some(FETCH_FAILED_NOTICE.to_string());
            }
        }
    }

    /// After the server acknowledges a write the current page is re-fetched
    /// whatever the staleness, so the list shows server truth.
    fn status_changed(&mut self, id: DbId, result: Result<SubmissionView, String>) -> Vec<Command> {
        self.pending_updates.retain(|pending| *pending != id);

        match result {
            Ok(view) => {
                if self.open_detail_id() == Some(id) {
                    self.detail = Some(view);
                }
                vec![self.refresh()]
            }
            Err(error) => {
                tracing::warn!(submission_id = id, error = %error, "Status change failed");
                self.notice = Some(UPDATE_FAILED_NOTICE.to_string());
                Vec::new()
            }
        }
    }

    fn open_detail_id(&self) -> Option<DbId> {
        self.detail_request.map(|(_, id)| id)
    }

    fn take_request_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
