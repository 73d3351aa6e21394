//! Voter list controller: fetch a page, toggle votes.
//!
//! The controller is a plain state machine. Network work is split into a
//! `begin_*` step that mutates local state and returns a request value, and
//! a `complete_*` step that applies the response. The async helpers
//! ([`VoterListController::fetch`], [`VoterListController::toggle`], ...)
//! just run both halves around a `VoterRegistry` call.
//!
//! Invariants:
//! - Only the most recently issued fetch may replace the list. Every fetch
//!   carries a sequence number; responses with an older number are dropped.
//! - Changing the search text or the vote filter resets the page to 1 before
//!   the next fetch is built.
//! - At most one voter is "toggling" at a time.
//! - Un-voting never reaches the Registry without an explicit confirmation.
//! - A successful toggle patches `has_voted`/`voted_at` of exactly one row;
//!   every other row, and the row order, are left untouched.

use std::time::Duration;

use pollcheck_client::{ApiError, VoterRegistry};
use pollcheck_types::{
    is_searchable, Gender, Pagination, ToggleResult, VoteFilter, Voter, VoterKey, VoterQuery,
    VotersPage,
};

use crate::deadline::{within, DEFAULT_CALL_TIMEOUT};

/// Which Registry operation a fetch uses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchKind {
    List,
    /// Search with the exact (untrimmed) text the operator typed.
    Search(String),
}

/// A tagged list/search request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub kind: FetchKind,
    pub query: VoterQuery,
}

impl FetchRequest {
    /// Issue this request against `registry`.
    pub async fn send<R: VoterRegistry>(&self, registry: &R) -> Result<VotersPage, ApiError> {
        match &self.kind {
            FetchKind::List => registry.list_voters(&self.query).await,
            FetchKind::Search(text) => registry.search_voters(text, &self.query).await,
        }
    }
}

/// What happened to a fetch response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The list and pagination were replaced.
    Applied,
    /// A newer fetch was issued meanwhile; the response was dropped.
    Stale,
    /// The list was cleared and an error is shown.
    Failed(ApiError),
    /// The Registry answered 401. The caller must reset the whole client.
    SessionExpired,
}

/// Load state of the list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListStatus {
    Idle,
    Loading,
    Ready,
    Error { message: String, retryable: bool },
}

/// What the list area should render right now.
#[derive(Debug, PartialEq, Eq)]
pub enum ListView<'a> {
    Loading,
    Error { message: &'a str, retryable: bool },
    Empty { message: &'static str },
    Rows(&'a [Voter]),
}

/// A toggle call that has been cleared to go to the Registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToggleRequest {
    pub voter: VoterKey,
}

/// Answer to "the operator clicked this row's vote control".
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToggleDecision {
    /// Marking voted: go ahead immediately.
    Proceed(ToggleRequest),
    /// Un-voting: the record is parked until confirmed or cancelled.
    NeedsConfirmation(Voter),
    /// Another toggle is still in flight.
    Busy,
    /// No such row in the current page.
    NotFound,
}

/// What happened to a toggle response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The row was patched with the Registry's answer.
    Applied(Voter),
    /// The Registry flipped the vote, but the row is no longer on screen.
    Detached(ToggleResult),
    /// Nothing changed locally; the failure was logged.
    Failed(ApiError),
    SessionExpired,
}

impl ToggleOutcome {
    /// Whether the Registry's vote state changed, i.e. aggregates are stale.
    pub fn is_vote_change(&self) -> bool {
        matches!(self, Self::Applied(_) | Self::Detached(_))
    }
}

/// End-to-end result of [`VoterListController::toggle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToggleFlow {
    AwaitingConfirmation(Voter),
    Busy,
    NotFound,
    Done(ToggleOutcome),
}

/// One page of voters and the toggle workflow over it.
pub struct VoterListController {
    search_query: String,
    vote_filter: VoteFilter,
    /// List-only refinements; the search endpoint ignores them.
    gender: Option<Gender>,
    age_range: (Option<u32>, Option<u32>),
    page: u32,
    voters: Vec<Voter>,
    pagination: Pagination,
    status: ListStatus,
    /// Sequence number handed to the next fetch.
    next_seq: u64,
    /// The only sequence number whose response may still be applied.
    latest_seq: Option<u64>,
    last_request: Option<(FetchKind, VoterQuery)>,
    toggling: Option<VoterKey>,
    pending_unvote: Option<Voter>,
    call_timeout: Duration,
}

impl VoterListController {
    pub fn new() -> Self {
        Self {
            search_query: String::new(),
            vote_filter: VoteFilter::All,
            gender: None,
            age_range: (None, None),
            page: 1,
            voters: Vec::new(),
            pagination: Pagination::default(),
            status: ListStatus::Idle,
            next_seq: 1,
            latest_seq: None,
            last_request: None,
            toggling: None,
            pending_unvote: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Bound every Registry call made through the async helpers.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn vote_filter(&self) -> VoteFilter {
        self.vote_filter
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn voters(&self) -> &[Voter] {
        &self.voters
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }

    pub fn toggling(&self) -> Option<&VoterKey> {
        self.toggling.as_ref()
    }

    pub fn is_toggling(&self, id: &VoterKey) -> bool {
        self.toggling.as_ref() == Some(id)
    }

    pub fn pending_unvote(&self) -> Option<&Voter> {
        self.pending_unvote.as_ref()
    }

    pub fn can_go_previous(&self) -> bool {
        self.pagination.has_previous(self.page)
    }

    pub fn can_go_next(&self) -> bool {
        self.pagination.has_next(self.page)
    }

    pub fn page_label(&self) -> String {
        self.pagination.label(self.page)
    }

    pub fn view(&self) -> ListView<'_> {
        match &self.status {
            ListStatus::Loading => ListView::Loading,
            ListStatus::Error { message, retryable } => ListView::Error {
                message,
                retryable: *retryable,
            },
            ListStatus::Idle | ListStatus::Ready if self.voters.is_empty() => ListView::Empty {
                message: if self.search_query.is_empty() {
                    "No voter data available."
                } else {
                    "Try a different search term."
                },
            },
            ListStatus::Idle | ListStatus::Ready => ListView::Rows(&self.voters),
        }
    }

    // ── Query state ────────────────────────────────────────────────────

    /// Returns whether the text changed. A change resets the page to 1.
    pub fn set_search_query(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text == self.search_query {
            return false;
        }
        self.search_query = text;
        self.page = 1;
        true
    }

    /// Returns whether the filter changed. A change resets the page to 1.
    pub fn set_vote_filter(&mut self, filter: VoteFilter) -> bool {
        if filter == self.vote_filter {
            return false;
        }
        self.vote_filter = filter;
        self.page = 1;
        true
    }

    /// Narrow plain listings by gender and age. Returns whether anything
    /// changed; a change resets the page to 1.
    pub fn set_list_refinements(
        &mut self,
        gender: Option<Gender>,
        min_age: Option<u32>,
        max_age: Option<u32>,
    ) -> bool {
        if gender == self.gender && (min_age, max_age) == self.age_range {
            return false;
        }
        self.gender = gender;
        self.age_range = (min_age, max_age);
        self.page = 1;
        true
    }

    /// Returns whether the page moved.
    pub fn next_page(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        self.page += 1;
        true
    }

    /// Returns whether the page moved.
    pub fn previous_page(&mut self) -> bool {
        if !self.can_go_previous() {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Jump to an explicit page, e.g. from a command line flag. Page 0 is
    /// treated as page 1.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    // ── Fetch ──────────────────────────────────────────────────────────

    /// Build the request for the current (search, filter, page) triple and
    /// mark the list as loading. Any earlier in-flight fetch becomes stale.
    pub fn begin_fetch(&mut self) -> FetchRequest {
        let mut query = VoterQuery::new(self.page, self.vote_filter)
            .with_age_range(self.age_range.0, self.age_range.1);
        query.gender = self.gender;
        let kind = if is_searchable(&self.search_query) {
            FetchKind::Search(self.search_query.clone())
        } else {
            FetchKind::List
        };
        self.issue(kind, query)
    }

    /// Re-issue the last request unchanged ("Try Again").
    pub fn begin_retry(&mut self) -> FetchRequest {
        match self.last_request.clone() {
            Some((kind, query)) => self.issue(kind, query),
            None => self.begin_fetch(),
        }
    }

    fn issue(&mut self, kind: FetchKind, query: VoterQuery) -> FetchRequest {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest_seq = Some(seq);
        self.last_request = Some((kind.clone(), query.clone()));
        self.status = ListStatus::Loading;
        // A parked un-vote belongs to the rows being replaced.
        if let Some(parked) = self.pending_unvote.take() {
            tracing::debug!(voter_id = %parked.id, "dropping unconfirmed un-vote");
        }
        tracing::debug!(seq, page = query.page, filter = %query.vote_filter, ?kind, "fetch issued");
        FetchRequest { seq, kind, query }
    }

    /// Apply a fetch response if it belongs to the newest request.
    pub fn complete_fetch(
        &mut self,
        request: &FetchRequest,
        result: Result<VotersPage, ApiError>,
    ) -> FetchOutcome {
        if self.latest_seq != Some(request.seq) {
            tracing::debug!(
                seq = request.seq,
                latest = ?self.latest_seq,
                "dropping stale fetch response"
            );
            return FetchOutcome::Stale;
        }
        self.latest_seq = None;

        match result {
            Ok(page) => {
                for voter in &page.voters {
                    if let Err(e) = voter.check_vote_invariant() {
                        tracing::warn!("registry sent an inconsistent record: {e}");
                    }
                }
                self.voters = page.voters;
                self.pagination = page.pagination;
                self.status = ListStatus::Ready;
                FetchOutcome::Applied
            }
            Err(ApiError::Unauthorized) => {
                self.voters.clear();
                self.status = ListStatus::Idle;
                FetchOutcome::SessionExpired
            }
            Err(e) => {
                tracing::warn!(seq = request.seq, "voter fetch failed: {e}");
                self.voters.clear();
                self.status = ListStatus::Error {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                };
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Show a single record looked up out of band, e.g. by voter ID.
    /// Any in-flight fetch becomes stale and a parked un-vote is dropped.
    pub fn show_voter(&mut self, voter: Voter) {
        self.latest_seq = None;
        self.last_request = None;
        self.pending_unvote = None;
        self.page = 1;
        self.pagination = Pagination {
            total: 1,
            pages: 1,
            ..Pagination::default()
        };
        self.voters = vec![voter];
        self.status = ListStatus::Ready;
    }

    /// Look up one voter by roll ID and show it as the only row.
    pub async fn load_voter<R: VoterRegistry>(
        &mut self,
        registry: &R,
        voter_id: &str,
    ) -> FetchOutcome {
        match within(self.call_timeout, registry.voter_by_id(voter_id)).await {
            Ok(voter) => {
                self.show_voter(voter);
                FetchOutcome::Applied
            }
            Err(ApiError::Unauthorized) => {
                self.voters.clear();
                self.status = ListStatus::Idle;
                FetchOutcome::SessionExpired
            }
            Err(e) => {
                tracing::warn!(voter_id, "voter lookup failed: {e}");
                self.voters.clear();
                self.status = ListStatus::Error {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                };
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Fetch the current triple from `registry` and apply the result.
    pub async fn fetch<R: VoterRegistry>(&mut self, registry: &R) -> FetchOutcome {
        let request = self.begin_fetch();
        let result = within(self.call_timeout, request.send(registry)).await;
        self.complete_fetch(&request, result)
    }

    /// Repeat the last request against `registry` and apply the result.
    pub async fn retry<R: VoterRegistry>(&mut self, registry: &R) -> FetchOutcome {
        let request = self.begin_retry();
        let result = within(self.call_timeout, request.send(registry)).await;
        self.complete_fetch(&request, result)
    }

    // ── Toggle ─────────────────────────────────────────────────────────

    /// The operator clicked the vote control of row `id`.
    pub fn request_toggle(&mut self, id: &VoterKey) -> ToggleDecision {
        if self.toggling.is_some() {
            return ToggleDecision::Busy;
        }
        let Some(voter) = self.voters.iter().find(|v| &v.id == id) else {
            return ToggleDecision::NotFound;
        };
        if voter.has_voted {
            let voter = voter.clone();
            self.pending_unvote = Some(voter.clone());
            return ToggleDecision::NeedsConfirmation(voter);
        }
        ToggleDecision::Proceed(self.mark_toggling(id.clone()))
    }

    /// The operator confirmed the parked un-vote.
    ///
    /// Returns `None` when nothing is parked or another toggle is in flight;
    /// in the latter case the parked record stays parked.
    pub fn confirm_unvote(&mut self) -> Option<ToggleRequest> {
        if self.toggling.is_some() {
            return None;
        }
        let voter = self.pending_unvote.take()?;
        Some(self.mark_toggling(voter.id))
    }

    /// The operator dismissed the confirmation. No network effect.
    pub fn cancel_unvote(&mut self) {
        self.pending_unvote = None;
    }

    fn mark_toggling(&mut self, id: VoterKey) -> ToggleRequest {
        self.toggling = Some(id.clone());
        ToggleRequest { voter: id }
    }

    /// Apply a toggle response. The row is only ever patched from the
    /// Registry's answer, never optimistically.
    pub fn complete_toggle(
        &mut self,
        request: &ToggleRequest,
        result: Result<ToggleResult, ApiError>,
    ) -> ToggleOutcome {
        if self.toggling.as_ref() == Some(&request.voter) {
            self.toggling = None;
        }

        match result {
            Ok(toggled) => match self.voters.iter_mut().find(|v| v.id == request.voter) {
                Some(voter) => {
                    voter.apply_toggle(&toggled);
                    tracing::info!(voter_id = %request.voter, has_voted = toggled.has_voted, "vote toggled");
                    ToggleOutcome::Applied(voter.clone())
                }
                None => {
                    tracing::debug!(voter_id = %request.voter, "toggle landed after the row left the list");
                    ToggleOutcome::Detached(toggled)
                }
            },
            Err(ApiError::Unauthorized) => ToggleOutcome::SessionExpired,
            Err(e) => {
                tracing::error!(voter_id = %request.voter, "failed to toggle vote: {e}");
                ToggleOutcome::Failed(e)
            }
        }
    }

    async fn perform_toggle<R: VoterRegistry>(
        &mut self,
        registry: &R,
        request: ToggleRequest,
    ) -> ToggleOutcome {
        let result = within(self.call_timeout, registry.toggle_vote(&request.voter)).await;
        self.complete_toggle(&request, result)
    }

    /// Run the whole toggle workflow for row `id`. Un-voting stops at
    /// [`ToggleFlow::AwaitingConfirmation`]; continue with
    /// [`confirm_and_toggle`](Self::confirm_and_toggle).
    pub async fn toggle<R: VoterRegistry>(&mut self, registry: &R, id: &VoterKey) -> ToggleFlow {
        match self.request_toggle(id) {
            ToggleDecision::Proceed(request) => {
                ToggleFlow::Done(self.perform_toggle(registry, request).await)
            }
            ToggleDecision::NeedsConfirmation(voter) => ToggleFlow::AwaitingConfirmation(voter),
            ToggleDecision::Busy => ToggleFlow::Busy,
            ToggleDecision::NotFound => ToggleFlow::NotFound,
        }
    }

    /// Confirm the parked un-vote and send it. `None` when nothing was parked
    /// or another toggle is still in flight.
    pub async fn confirm_and_toggle<R: VoterRegistry>(
        &mut self,
        registry: &R,
    ) -> Option<ToggleOutcome> {
        let request = self.confirm_unvote()?;
        Some(self.perform_toggle(registry, request).await)
    }
}

impl Default for VoterListController {
    fn default() -> Self {
        Self::new()
    }
}
