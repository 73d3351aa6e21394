//! Top-level client state: navigation, the auth gate, the query inputs and
//! the stats refresh counter.
//!
//! The shell owns one [`VoterListController`] and one [`StatsDashboard`].
//! A 401 seen by either one resets the whole client through
//! [`Shell::expire_session`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use pollcheck_client::{AuthService, VoterRegistry};
use pollcheck_types::{User, VoteFilter, VoterKey};

use crate::error::AppError;
use crate::list::{FetchOutcome, ToggleFlow, ToggleOutcome, VoterListController};
use crate::session::{AuthMode, LoginForm, Session};
use crate::stats::{StatsDashboard, StatsOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum View {
    Home,
    Search,
    Dashboard,
    Practice,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Search => "search",
            Self::Dashboard => "dashboard",
            Self::Practice => "practice",
        }
    }

    /// Search and Dashboard show voter data and sit behind the login modal.
    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Search | Self::Dashboard)
    }
}

impl FromStr for View {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "search" => Ok(Self::Search),
            "dashboard" => Ok(Self::Dashboard),
            "practice" => Ok(Self::Practice),
            other => Err(AppError::InvalidInput(format!("unknown view: {other}"))),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a navigation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    Shown(View),
    /// Not logged in; the login modal was opened instead.
    LoginRequired,
    /// The view is not in the enabled set.
    Disabled,
}

pub struct Shell {
    enabled: BTreeSet<View>,
    view: View,
    session: Session,
    login_form: LoginForm,
    login_modal_open: bool,
    search_text: String,
    vote_filter: VoteFilter,
    stats_refresh_key: u64,
    list: VoterListController,
    stats: StatsDashboard,
    call_timeout: Option<Duration>,
}

impl Shell {
    /// Home is always reachable, whatever `enabled` says.
    pub fn new(enabled: impl IntoIterator<Item = View>, token_present: bool) -> Self {
        let mut enabled: BTreeSet<View> = enabled.into_iter().collect();
        enabled.insert(View::Home);
        Self {
            enabled,
            view: View::Home,
            session: Session::from_token_present(token_present),
            login_form: LoginForm::new(),
            login_modal_open: false,
            search_text: String::new(),
            vote_filter: VoteFilter::All,
            stats_refresh_key: 0,
            list: VoterListController::new(),
            stats: StatsDashboard::new(),
            call_timeout: None,
        }
    }

    /// Build from the `enabled_views` names of a client config.
    pub fn from_view_names<S: AsRef<str>>(
        names: &[S],
        token_present: bool,
    ) -> Result<Self, AppError> {
        let views = names
            .iter()
            .map(|n| n.as_ref().parse::<View>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(views, token_present))
    }

    /// Bound every Registry call made by the list and the dashboard.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self.login_form = LoginForm::new().with_call_timeout(timeout);
        self.list = VoterListController::new().with_call_timeout(timeout);
        self.stats = StatsDashboard::new().with_call_timeout(timeout);
        self
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn view(&self) -> View {
        self.view
    }

    pub fn is_enabled(&self, view: View) -> bool {
        self.enabled.contains(&view)
    }

    pub fn enabled_views(&self) -> impl Iterator<Item = View> + '_ {
        self.enabled.iter().copied()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn login_form(&self) -> &LoginForm {
        &self.login_form
    }

    pub fn login_form_mut(&mut self) -> &mut LoginForm {
        &mut self.login_form
    }

    pub fn login_modal_open(&self) -> bool {
        self.login_modal_open
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn vote_filter(&self) -> VoteFilter {
        self.vote_filter
    }

    pub fn stats_refresh_key(&self) -> u64 {
        self.stats_refresh_key
    }

    pub fn list(&self) -> &VoterListController {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut VoterListController {
        &mut self.list
    }

    pub fn stats(&self) -> &StatsDashboard {
        &self.stats
    }

    // ── Navigation and inputs ──────────────────────────────────────────

    pub fn navigate(&mut self, view: View) -> Navigation {
        if !self.is_enabled(view) {
            return Navigation::Disabled;
        }
        if view.requires_auth() && !self.session.is_authenticated() {
            self.login_modal_open = true;
            return Navigation::LoginRequired;
        }
        self.view = view;
        Navigation::Shown(view)
    }

    pub fn open_login(&mut self) {
        self.login_modal_open = true;
    }

    pub fn close_login(&mut self) {
        self.login_modal_open = false;
        self.login_form.reset();
    }

    /// Returns whether the list needs a refetch.
    pub fn set_search_text(&mut self, text: impl Into<String>) -> bool {
        self.search_text = text.into();
        self.list.set_search_query(self.search_text.clone())
    }

    /// Returns whether the list needs a refetch.
    pub fn set_vote_filter(&mut self, filter: VoteFilter) -> bool {
        self.vote_filter = filter;
        self.list.set_vote_filter(filter)
    }

    /// Vote-change notification from the list: aggregates are now stale.
    pub fn on_vote_change(&mut self) {
        self.stats_refresh_key += 1;
        tracing::debug!(key = self.stats_refresh_key, "stats refresh requested");
    }

    // ── Session ────────────────────────────────────────────────────────

    /// Submit the login form. Success closes the modal and lands on Search.
    pub async fn login<A: AuthService>(&mut self, auth: &A) -> Result<User, AppError> {
        let response = self.login_form.submit(auth).await?;
        self.session.login_succeeded(response.user.clone());
        self.login_modal_open = false;
        self.view = if self.is_enabled(View::Search) {
            View::Search
        } else {
            View::Home
        };
        Ok(response.user)
    }

    /// Confirm a restored token by asking the Registry who it belongs to.
    /// An unusable token ends the session.
    pub async fn restore_session<A: AuthService>(&mut self, auth: &A) -> Option<User> {
        if !self.session.is_authenticated() {
            return None;
        }
        match auth.current_user().await {
            Ok(Some(user)) => {
                self.session.set_user(user.clone());
                Some(user)
            }
            Ok(None) => {
                self.reset_client();
                None
            }
            Err(e) => {
                tracing::warn!("could not restore session: {e}");
                None
            }
        }
    }

    pub fn request_logout(&mut self) -> bool {
        self.session.request_logout()
    }

    pub fn cancel_logout(&mut self) {
        self.session.cancel_logout();
    }

    /// Finish a confirmed logout: invalidate the token and go Home.
    pub async fn confirm_logout<A: AuthService>(&mut self, auth: &A) -> bool {
        if !self.session.confirm_logout() {
            return false;
        }
        if let Err(e) = auth.logout().await {
            tracing::warn!("logout did not complete cleanly: {e}");
        }
        self.reset_client();
        true
    }

    /// Hard reset after a 401: drop every piece of client state.
    pub fn expire_session(&mut self) {
        self.session.expire();
        self.reset_client();
    }

    fn reset_client(&mut self) {
        if self.session.is_authenticated() {
            self.session.expire();
        }
        self.view = View::Home;
        self.login_modal_open = false;
        self.login_form.switch_mode(AuthMode::Login);
        self.search_text.clear();
        self.vote_filter = VoteFilter::All;
        self.stats_refresh_key = 0;
        let (mut list, mut stats) = (VoterListController::new(), StatsDashboard::new());
        if let Some(timeout) = self.call_timeout {
            list = list.with_call_timeout(timeout);
            stats = stats.with_call_timeout(timeout);
        }
        self.list = list;
        self.stats = stats;
    }

    // ── Drivers ────────────────────────────────────────────────────────

    fn absorb_fetch(&mut self, outcome: FetchOutcome) -> FetchOutcome {
        if outcome == FetchOutcome::SessionExpired {
            self.expire_session();
        }
        outcome
    }

    fn absorb_toggle(&mut self, outcome: &ToggleOutcome) {
        if outcome.is_vote_change() {
            self.on_vote_change();
        } else if matches!(outcome, ToggleOutcome::SessionExpired) {
            self.expire_session();
        }
    }

    /// Fetch the list for the current search text, filter and page.
    pub async fn load_list<R: VoterRegistry>(&mut self, registry: &R) -> FetchOutcome {
        let outcome = self.list.fetch(registry).await;
        self.absorb_fetch(outcome)
    }

    pub async fn retry_list<R: VoterRegistry>(&mut self, registry: &R) -> FetchOutcome {
        let outcome = self.list.retry(registry).await;
        self.absorb_fetch(outcome)
    }

    /// Move to the next page and fetch it. `None` at the last page.
    pub async fn next_page<R: VoterRegistry>(&mut self, registry: &R) -> Option<FetchOutcome> {
        if !self.list.next_page() {
            return None;
        }
        Some(self.load_list(registry).await)
    }

    pub async fn previous_page<R: VoterRegistry>(&mut self, registry: &R) -> Option<FetchOutcome> {
        if !self.list.previous_page() {
            return None;
        }
        Some(self.load_list(registry).await)
    }

    pub async fn toggle<R: VoterRegistry>(&mut self, registry: &R, id: &VoterKey) -> ToggleFlow {
        let flow = self.list.toggle(registry, id).await;
        if let ToggleFlow::Done(outcome) = &flow {
            self.absorb_toggle(outcome);
        }
        flow
    }

    pub async fn confirm_unvote<R: VoterRegistry>(
        &mut self,
        registry: &R,
    ) -> Option<ToggleOutcome> {
        let outcome = self.list.confirm_and_toggle(registry).await?;
        self.absorb_toggle(&outcome);
        Some(outcome)
    }

    pub fn cancel_unvote(&mut self) {
        self.list.cancel_unvote();
    }

    /// Bring the dashboard up to date with the refresh counter.
    pub async fn sync_stats<R: VoterRegistry>(&mut self, registry: &R) -> Option<StatsOutcome> {
        let outcome = self
            .stats
            .sync_refresh_key(registry, self.stats_refresh_key)
            .await?;
        if outcome == StatsOutcome::SessionExpired {
            self.expire_session();
        }
        Some(outcome)
    }
}
