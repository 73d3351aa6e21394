//! End-to-end flows through the shell, the list controller and the stats
//! dashboard against an in-memory Registry.

use std::time::Duration;

use pollcheck_app::{
    FetchKind, FetchOutcome, ListView, Navigation, Shell, StatsOutcome, StatsState, ToggleFlow,
    ToggleOutcome, View, VoterListController,
};
use pollcheck_client::{ApiError, AuthService, VoterRegistry};
use pollcheck_nullables::registry::sample_voter;
use pollcheck_nullables::{Call, NullRegistry, Op};
use pollcheck_types::{
    AuthResponse, Credentials, Pagination, Registration, ToggleResult, User, VoteFilter, Voter,
    VoterKey, VoterQuery, VoterStats, VotersPage,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn voted_sample(n: usize) -> Voter {
    let mut v = sample_voter(n);
    v.has_voted = true;
    v.voted_at = Some("2026-01-15T08:30:00.000Z".to_string());
    v
}

fn logged_in_shell() -> Shell {
    let mut shell = Shell::new([View::Search, View::Dashboard], true);
    assert_eq!(shell.navigate(View::Search), Navigation::Shown(View::Search));
    shell
}

/// A Registry that accepts every call and never answers.
struct StalledRegistry;

impl VoterRegistry for StalledRegistry {
    async fn list_voters(&self, _query: &VoterQuery) -> Result<VotersPage, ApiError> {
        std::future::pending().await
    }

    async fn search_voters(&self, _text: &str, _query: &VoterQuery) -> Result<VotersPage, ApiError> {
        std::future::pending().await
    }

    async fn voter_by_id(&self, _voter_id: &str) -> Result<Voter, ApiError> {
        std::future::pending().await
    }

    async fn stats(&self) -> Result<VoterStats, ApiError> {
        std::future::pending().await
    }

    async fn toggle_vote(&self, _id: &VoterKey) -> Result<ToggleResult, ApiError> {
        std::future::pending().await
    }
}

impl AuthService for StalledRegistry {
    async fn login(&self, _credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        std::future::pending().await
    }

    async fn register(&self, _registration: &Registration) -> Result<AuthResponse, ApiError> {
        std::future::pending().await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, ApiError> {
        Ok(None)
    }

    fn has_session(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// 1. Fetching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_character_query_uses_list_endpoint() {
    let registry = NullRegistry::with_generated(5);
    let mut shell = logged_in_shell();
    shell.set_search_text(" R ");
    shell.load_list(&registry).await;

    assert_eq!(registry.calls_of(Op::Search).len(), 0);
    assert_eq!(registry.calls_of(Op::List).len(), 1);
}

#[tokio::test]
async fn search_sends_exact_query_with_filter() {
    let registry = NullRegistry::with_generated(5);
    let mut shell = logged_in_shell();
    shell.set_search_text("Rahul");
    shell.set_vote_filter(VoteFilter::Voted);
    shell.load_list(&registry).await;

    let calls = registry.calls_of(Op::Search);
    let [Call::Search(text, query)] = calls.as_slice() else {
        panic!("expected one search call, got {calls:?}");
    };
    assert_eq!(text, "Rahul");
    assert_eq!(
        query.search_params(text),
        vec![
            ("q", "Rahul".to_string()),
            ("page", "1".to_string()),
            ("limit", "20".to_string()),
            ("hasVoted", "true".to_string()),
        ]
    );
}

#[tokio::test]
async fn next_page_keeps_query_and_updates_label() {
    let registry = NullRegistry::with_generated(45);
    let mut shell = logged_in_shell();
    shell.set_vote_filter(VoteFilter::NotVoted);
    assert_eq!(shell.load_list(&registry).await, FetchOutcome::Applied);
    assert_eq!(shell.list().page_label(), "Page 1 of 3");
    assert!(!shell.list().can_go_previous());

    registry.clear_calls();
    assert_eq!(shell.next_page(&registry).await, Some(FetchOutcome::Applied));
    assert_eq!(
        registry.calls(),
        vec![Call::List(VoterQuery::new(2, VoteFilter::NotVoted))]
    );
    assert_eq!(shell.list().page_label(), "Page 2 of 3");
    assert!(shell.list().can_go_previous());
}

#[tokio::test]
async fn last_page_disables_next() {
    let registry = NullRegistry::with_generated(45);
    let mut shell = logged_in_shell();
    shell.load_list(&registry).await;
    shell.next_page(&registry).await;
    shell.next_page(&registry).await;
    assert_eq!(shell.list().page(), 3);
    assert!(!shell.list().can_go_next());

    registry.clear_calls();
    assert_eq!(shell.next_page(&registry).await, None);
    assert!(registry.calls().is_empty());
}

#[tokio::test]
async fn filter_change_fetches_page_one() {
    let registry = NullRegistry::with_generated(45);
    let mut shell = logged_in_shell();
    shell.load_list(&registry).await;
    shell.next_page(&registry).await;

    registry.clear_calls();
    assert!(shell.set_vote_filter(VoteFilter::Voted));
    shell.load_list(&registry).await;
    assert_eq!(
        registry.calls(),
        vec![Call::List(VoterQuery::new(1, VoteFilter::Voted))]
    );
}

#[tokio::test]
async fn interleaved_fetches_apply_only_the_newest() {
    let registry = NullRegistry::with_generated(30);
    let mut list = VoterListController::new();

    let slow = list.begin_fetch();
    list.set_search_query("Voter 3");
    let fast = list.begin_fetch();
    assert!(matches!(fast.kind, FetchKind::Search(_)));

    let fast_page = fast.send(&registry).await;
    let slow_page = slow.send(&registry).await;
    assert_eq!(list.complete_fetch(&fast, fast_page), FetchOutcome::Applied);
    assert_eq!(list.complete_fetch(&slow, slow_page), FetchOutcome::Stale);

    assert!(list
        .voters()
        .iter()
        .all(|v| v.name_english.contains("Voter 3")));
}

#[tokio::test]
async fn network_failure_then_try_again() {
    let registry = NullRegistry::with_generated(5);
    let mut shell = logged_in_shell();
    shell.set_search_text("Voter");
    registry.fail_next(Op::Search, ApiError::Network("connection refused".into()));

    let outcome = shell.load_list(&registry).await;
    assert!(matches!(outcome, FetchOutcome::Failed(ApiError::Network(_))));
    assert!(matches!(
        shell.list().view(),
        ListView::Error {
            retryable: true,
            ..
        }
    ));

    assert_eq!(shell.retry_list(&registry).await, FetchOutcome::Applied);
    let searches = registry.calls_of(Op::Search);
    assert_eq!(searches.len(), 2);
    assert_eq!(searches[0], searches[1]);
    assert!(matches!(shell.list().view(), ListView::Rows(rows) if rows.len() == 5));
}

#[tokio::test]
async fn stalled_fetch_times_out_into_error_state() {
    let mut list = VoterListController::new().with_call_timeout(Duration::from_millis(50));
    let outcome = list.fetch(&StalledRegistry).await;
    assert!(matches!(outcome, FetchOutcome::Failed(ApiError::Network(_))));
    assert!(matches!(
        list.view(),
        ListView::Error {
            retryable: true,
            ..
        }
    ));
}

// ---------------------------------------------------------------------------
// 2. Toggling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn marking_voted_is_immediate_and_patches_one_row() {
    let registry = NullRegistry::with_generated(5);
    let mut shell = logged_in_shell();
    shell.load_list(&registry).await;
    let before = shell.list().voters().to_vec();
    let target = before[2].id.clone();

    let flow = shell.toggle(&registry, &target).await;
    let ToggleFlow::Done(ToggleOutcome::Applied(updated)) = flow else {
        panic!("expected an applied toggle, got {flow:?}");
    };
    assert!(updated.has_voted);
    assert!(updated.voted_at.is_some());
    assert_eq!(registry.calls_of(Op::Toggle), vec![Call::Toggle(target.clone())]);

    let after = shell.list().voters();
    assert_eq!(after.len(), before.len());
    for (old, new) in before.iter().zip(after) {
        if old.id == target {
            let mut expected = old.clone();
            expected.has_voted = new.has_voted;
            expected.voted_at = new.voted_at.clone();
            assert_eq!(&expected, new);
        } else {
            assert_eq!(old, new);
        }
    }
    assert_eq!(shell.stats_refresh_key(), 1);
}

#[tokio::test]
async fn unvote_waits_for_confirmation() {
    let registry = NullRegistry::logged_in(vec![voted_sample(1), sample_voter(2)]);
    let mut shell = logged_in_shell();
    shell.load_list(&registry).await;
    let x = VoterKey::new("id-0001");

    let flow = shell.toggle(&registry, &x).await;
    let ToggleFlow::AwaitingConfirmation(pending) = flow else {
        panic!("expected confirmation, got {flow:?}");
    };
    assert_eq!(pending.name_english, "Voter 1");
    assert!(registry.calls_of(Op::Toggle).is_empty());

    let outcome = shell.confirm_unvote(&registry).await;
    let Some(ToggleOutcome::Applied(row)) = outcome else {
        panic!("expected applied toggle, got {outcome:?}");
    };
    assert!(!row.has_voted);
    assert_eq!(row.voted_at, None);
    assert_eq!(registry.calls_of(Op::Toggle), vec![Call::Toggle(x)]);
    assert_eq!(shell.stats_refresh_key(), 1);
}

#[tokio::test]
async fn cancelled_unvote_issues_no_call() {
    let registry = NullRegistry::logged_in(vec![voted_sample(1)]);
    let mut shell = logged_in_shell();
    shell.load_list(&registry).await;

    shell.toggle(&registry, &VoterKey::new("id-0001")).await;
    shell.cancel_unvote();
    assert!(shell.confirm_unvote(&registry).await.is_none());
    assert!(registry.calls_of(Op::Toggle).is_empty());
    assert!(shell.list().voters()[0].has_voted);
    assert_eq!(shell.stats_refresh_key(), 0);
}

#[tokio::test]
async fn paging_away_abandons_unconfirmed_unvote() {
    let mut voters: Vec<Voter> = (2..=25).map(sample_voter).collect();
    voters.insert(0, voted_sample(1));
    let registry = NullRegistry::logged_in(voters);
    let mut shell = logged_in_shell();
    shell.load_list(&registry).await;

    let flow = shell.toggle(&registry, &VoterKey::new("id-0001")).await;
    assert!(matches!(flow, ToggleFlow::AwaitingConfirmation(_)));
    assert_eq!(shell.next_page(&registry).await, Some(FetchOutcome::Applied));
    assert_eq!(shell.list().page(), 2);
    assert!(shell.list().pending_unvote().is_none());

    assert!(shell.confirm_unvote(&registry).await.is_none());
    assert!(registry.calls_of(Op::Toggle).is_empty());
    assert!(registry.voter(&VoterKey::new("id-0001")).unwrap().has_voted);
    assert_eq!(shell.stats_refresh_key(), 0);
}

#[tokio::test]
async fn lookup_by_roll_id_reaches_voters_beyond_first_page() {
    let mut voters: Vec<Voter> = (1..=45).map(sample_voter).collect();
    let mut short = voted_sample(46);
    short.voter_id = "Z".to_string();
    voters.push(short);
    let registry = NullRegistry::logged_in(voters);

    let mut list = VoterListController::new();
    assert_eq!(list.load_voter(&registry, "ABC0000040").await, FetchOutcome::Applied);
    assert_eq!(list.voters().len(), 1);
    assert_eq!(list.voters()[0].id.as_str(), "id-0040");
    assert_eq!(registry.calls(), vec![Call::ById("ABC0000040".into())]);

    assert_eq!(list.load_voter(&registry, "Z").await, FetchOutcome::Applied);
    let flow = list.toggle(&registry, &VoterKey::new("id-0046")).await;
    assert!(matches!(flow, ToggleFlow::AwaitingConfirmation(_)));
    let outcome = list.confirm_and_toggle(&registry).await;
    assert!(matches!(outcome, Some(ToggleOutcome::Applied(ref v)) if !v.has_voted));
}

#[tokio::test]
async fn lookup_of_unknown_roll_id_fails_without_rows() {
    let registry = NullRegistry::with_generated(3);
    let mut list = VoterListController::new();
    let outcome = list.load_voter(&registry, "NOPE").await;
    assert!(matches!(
        outcome,
        FetchOutcome::Failed(ApiError::Rejected { status: 404, .. })
    ));
    assert!(list.voters().is_empty());

    let expired = NullRegistry::new(vec![sample_voter(1)]);
    assert_eq!(list.load_voter(&expired, "ABC0000001").await, FetchOutcome::SessionExpired);
}

#[tokio::test]
async fn failed_toggle_leaves_row_untouched() {
    let registry = NullRegistry::with_generated(3);
    let mut shell = logged_in_shell();
    shell.load_list(&registry).await;
    let before = shell.list().voters().to_vec();
    registry.fail_next(Op::Toggle, ApiError::Network("reset by peer".into()));

    let flow = shell.toggle(&registry, &before[0].id).await;
    assert!(matches!(
        flow,
        ToggleFlow::Done(ToggleOutcome::Failed(ApiError::Network(_)))
    ));
    assert_eq!(shell.list().voters(), before.as_slice());
    assert_eq!(shell.list().toggling(), None);
    assert!(matches!(shell.list().view(), ListView::Rows(_)));
    assert_eq!(shell.stats_refresh_key(), 0);
}

#[tokio::test]
async fn stalled_toggle_clears_marker() {
    let mut list = VoterListController::new().with_call_timeout(Duration::from_millis(50));
    let req = list.begin_fetch();
    list.complete_fetch(
        &req,
        Ok(VotersPage {
            voters: vec![sample_voter(1)],
            pagination: Pagination {
                page: 1,
                limit: 20,
                total: 1,
                pages: 1,
            },
        }),
    );

    let flow = list.toggle(&StalledRegistry, &VoterKey::new("id-0001")).await;
    assert!(matches!(flow, ToggleFlow::Done(ToggleOutcome::Failed(_))));
    assert_eq!(list.toggling(), None);
    assert!(!list.voters()[0].has_voted);
}

// ---------------------------------------------------------------------------
// 3. Stats and session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn vote_change_triggers_one_silent_refresh() {
    let registry = NullRegistry::with_generated(4);
    let mut shell = logged_in_shell();
    assert_eq!(shell.sync_stats(&registry).await, Some(StatsOutcome::Applied));
    assert_eq!(shell.sync_stats(&registry).await, None);
    assert_eq!(shell.stats().stats().map(|s| s.voted), Some(0));

    shell.load_list(&registry).await;
    let id = shell.list().voters()[0].id.clone();
    shell.toggle(&registry, &id).await;

    assert_eq!(shell.sync_stats(&registry).await, Some(StatsOutcome::Applied));
    assert_eq!(shell.stats().stats().map(|s| s.voted), Some(1));
    assert_eq!(registry.calls_of(Op::Stats).len(), 2);
}

#[tokio::test]
async fn failed_refresh_keeps_numbers() {
    let registry = NullRegistry::with_generated(4);
    let mut shell = logged_in_shell();
    shell.sync_stats(&registry).await;
    shell.on_vote_change();
    registry.fail_next(Op::Stats, ApiError::Network("down".into()));

    let outcome = shell.sync_stats(&registry).await;
    assert!(matches!(outcome, Some(StatsOutcome::Failed(_))));
    assert!(matches!(shell.stats().state(), StatsState::Loaded(_)));
}

#[tokio::test]
async fn unauthorized_list_call_resets_client() {
    let registry = NullRegistry::with_generated(4);
    let mut shell = logged_in_shell();
    shell.set_search_text("Voter");
    shell.load_list(&registry).await;
    registry.expire_session();

    assert_eq!(shell.load_list(&registry).await, FetchOutcome::SessionExpired);
    assert!(!shell.session().is_authenticated());
    assert_eq!(shell.view(), View::Home);
    assert_eq!(shell.search_text(), "");
    assert!(shell.list().voters().is_empty());
    assert_eq!(shell.navigate(View::Search), Navigation::LoginRequired);
}

#[tokio::test]
async fn unauthorized_stats_call_resets_client() {
    let registry = NullRegistry::new(vec![sample_voter(1)]);
    let mut shell = logged_in_shell();
    assert_eq!(shell.sync_stats(&registry).await, Some(StatsOutcome::SessionExpired));
    assert!(!shell.session().is_authenticated());
}

#[tokio::test]
async fn stalled_login_honours_shell_timeout() {
    let mut shell = Shell::new([View::Search], false).with_call_timeout(Duration::from_millis(50));
    shell.open_login();
    let form = shell.login_form_mut();
    form.username = "booth7".into();
    form.password = "pw".into();

    let started = std::time::Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(5), shell.login(&StalledRegistry))
        .await
        .expect("login should give up on its own");
    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(shell.login_form().error().is_some());
    assert!(!shell.login_form().is_loading());
    assert_eq!(shell.view(), View::Home);
}

#[tokio::test]
async fn login_lands_on_search() {
    let registry = NullRegistry::new(vec![sample_voter(1)]);
    registry.add_account("booth7", "secret", "Booth Seven");
    let mut shell = Shell::new([View::Search], false);
    assert_eq!(shell.navigate(View::Search), Navigation::LoginRequired);

    shell.login_form_mut().username = "booth7".into();
    shell.login_form_mut().password = "wrong".into();
    assert!(shell.login(&registry).await.is_err());
    assert_eq!(
        shell.login_form().error(),
        Some("Invalid username or password")
    );
    assert!(shell.login_modal_open());

    shell.login_form_mut().password = "secret".into();
    let user = shell.login(&registry).await.unwrap();
    assert_eq!(user.username, "booth7");
    assert!(!shell.login_modal_open());
    assert_eq!(shell.view(), View::Search);
    assert!(registry.token().is_some());
}

#[tokio::test]
async fn logout_requires_confirmation_and_goes_home() {
    let registry = NullRegistry::with_generated(2);
    let mut shell = logged_in_shell();

    assert!(!shell.confirm_logout(&registry).await);
    assert!(registry.token().is_some());

    assert!(shell.request_logout());
    assert!(shell.confirm_logout(&registry).await);
    assert!(registry.token().is_none());
    assert_eq!(shell.view(), View::Home);
    assert!(!shell.session().is_authenticated());
}
