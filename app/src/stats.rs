//! Stats dashboard: one aggregate snapshot, loaded once and refreshed
//! silently whenever a vote changes anywhere in the client.

use std::time::Duration;

use pollcheck_client::{ApiError, VoterRegistry};
use pollcheck_types::VoterStats;

use crate::deadline::{within, DEFAULT_CALL_TIMEOUT};

/// Initial loads block the view; refreshes keep the current numbers on
/// screen until the new ones arrive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatsMode {
    Initial,
    Refresh,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatsRequest {
    pub seq: u64,
    pub mode: StatsMode,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatsState {
    Loading,
    Loaded(VoterStats),
    Error(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatsOutcome {
    Applied,
    Stale,
    /// For a refresh the previous snapshot stays visible.
    Failed(ApiError),
    SessionExpired,
}

pub struct StatsDashboard {
    state: StatsState,
    refreshing: bool,
    next_seq: u64,
    latest_seq: Option<u64>,
    /// Refresh key value this dashboard last acted on.
    seen_key: Option<u64>,
    call_timeout: Duration,
}

impl StatsDashboard {
    pub fn new() -> Self {
        Self {
            state: StatsState::Loading,
            refreshing: false,
            next_seq: 1,
            latest_seq: None,
            seen_key: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn state(&self) -> &StatsState {
        &self.state
    }

    pub fn stats(&self) -> Option<&VoterStats> {
        match &self.state {
            StatsState::Loaded(stats) => Some(stats),
            _ => None,
        }
    }

    /// Whether a silent refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// Start a load. An initial load replaces whatever is shown with the
    /// loading state; a refresh issued before anything was loaded behaves
    /// like an initial load.
    pub fn begin(&mut self, mode: StatsMode) -> StatsRequest {
        let mode = match (&self.state, mode) {
            (StatsState::Loaded(_), StatsMode::Refresh) => StatsMode::Refresh,
            _ => StatsMode::Initial,
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest_seq = Some(seq);
        match mode {
            StatsMode::Initial => {
                self.state = StatsState::Loading;
                self.refreshing = false;
            }
            StatsMode::Refresh => self.refreshing = true,
        }
        StatsRequest { seq, mode }
    }

    pub fn complete(
        &mut self,
        request: StatsRequest,
        result: Result<VoterStats, ApiError>,
    ) -> StatsOutcome {
        if self.latest_seq != Some(request.seq) {
            return StatsOutcome::Stale;
        }
        self.latest_seq = None;
        self.refreshing = false;

        match result {
            Ok(stats) => {
                self.state = StatsState::Loaded(stats);
                StatsOutcome::Applied
            }
            Err(e) if e.is_unauthorized() => StatsOutcome::SessionExpired,
            Err(e) => {
                match request.mode {
                    StatsMode::Initial => self.state = StatsState::Error(e.to_string()),
                    StatsMode::Refresh => {
                        tracing::warn!("stats refresh failed, keeping last snapshot: {e}")
                    }
                }
                StatsOutcome::Failed(e)
            }
        }
    }

    /// Compare the shell's refresh counter with the last one seen. The first
    /// observation asks for an initial load, every later change for a
    /// silent refresh, and an unchanged key for nothing.
    pub fn observe_refresh_key(&mut self, key: u64) -> Option<StatsRequest> {
        match self.seen_key {
            Some(seen) if seen == key => None,
            Some(_) => {
                self.seen_key = Some(key);
                Some(self.begin(StatsMode::Refresh))
            }
            None => {
                self.seen_key = Some(key);
                Some(self.begin(StatsMode::Initial))
            }
        }
    }

    async fn run<R: VoterRegistry>(&mut self, registry: &R, request: StatsRequest) -> StatsOutcome {
        let result = within(self.call_timeout, registry.stats()).await;
        self.complete(request, result)
    }

    pub async fn load<R: VoterRegistry>(&mut self, registry: &R) -> StatsOutcome {
        let request = self.begin(StatsMode::Initial);
        self.run(registry, request).await
    }

    pub async fn refresh<R: VoterRegistry>(&mut self, registry: &R) -> StatsOutcome {
        let request = self.begin(StatsMode::Refresh);
        self.run(registry, request).await
    }

    /// Load or refresh if `key` moved since the last call; `None` otherwise.
    pub async fn sync_refresh_key<R: VoterRegistry>(
        &mut self,
        registry: &R,
        key: u64,
    ) -> Option<StatsOutcome> {
        let request = self.observe_refresh_key(key)?;
        Some(self.run(registry, request).await)
    }
}

impl Default for StatsDashboard {
    fn default() -> Self {
        Self::new()
    }
}
