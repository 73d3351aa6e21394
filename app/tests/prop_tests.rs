use proptest::prelude::*;

use pollcheck_app::{FetchKind, ToggleDecision, VoterListController};
use pollcheck_types::{Gender, Pagination, VoteFilter, Voter, VoterKey, VotersPage, MIN_SEARCH_LEN};

fn filter() -> impl Strategy<Value = VoteFilter> {
    prop_oneof![
        Just(VoteFilter::All),
        Just(VoteFilter::Voted),
        Just(VoteFilter::NotVoted),
    ]
}

fn row(n: usize, voted: bool) -> Voter {
    Voter {
        id: VoterKey::new(format!("row-{n}")),
        voter_id: format!("XYZ{n:07}"),
        name_marathi: String::new(),
        name_english: format!("Row {n}"),
        relation_marathi: String::new(),
        relation_english: String::new(),
        house_no: String::new(),
        age: None,
        gender: Gender::Unreadable,
        has_voted: voted,
        voted_at: voted.then(|| "2026-01-15T10:00:00.000Z".to_string()),
    }
}

fn loaded(voted: &[bool], pages: u32) -> VoterListController {
    let mut list = VoterListController::new();
    let req = list.begin_fetch();
    let voters = voted.iter().enumerate().map(|(i, v)| row(i, *v)).collect();
    list.complete_fetch(
        &req,
        Ok(VotersPage {
            voters,
            pagination: Pagination {
                page: 1,
                limit: 20,
                total: u64::from(pages) * 20,
                pages,
            },
        }),
    );
    list
}

proptest! {
    /// Short queries never reach the search endpoint; longer ones are sent verbatim.
    #[test]
    fn search_threshold_picks_endpoint(text in "\\PC{0,8}", f in filter()) {
        let mut list = VoterListController::new();
        list.set_search_query(text.clone());
        list.set_vote_filter(f);
        let req = list.begin_fetch();
        if text.trim().chars().count() < MIN_SEARCH_LEN {
            prop_assert_eq!(req.kind, FetchKind::List);
        } else {
            prop_assert_eq!(req.kind, FetchKind::Search(text));
        }
        prop_assert_eq!(req.query.vote_filter, f);
    }

    /// Any change of search text or filter puts the next fetch on page 1.
    #[test]
    fn input_change_resets_page(
        pages in 2u32..50,
        advance in 1u32..49,
        text in "[a-z]{2,6}",
        f in filter(),
    ) {
        let mut list = loaded(&[false], pages);
        for _ in 0..advance {
            list.next_page();
        }
        let text_changed = list.set_search_query(text);
        let filter_changed = list.set_vote_filter(f);
        prop_assume!(text_changed || filter_changed);
        prop_assert_eq!(list.begin_fetch().query.page, 1);
    }

    /// Previous is off exactly at page 1, Next exactly at page >= pages.
    #[test]
    fn paging_controls_follow_bounds(pages in 0u32..30, steps in 0u32..40) {
        let mut list = loaded(&[false], pages);
        for _ in 0..steps {
            list.next_page();
        }
        let page = list.page();
        prop_assert!(page >= 1);
        prop_assert_eq!(list.can_go_previous(), page != 1);
        prop_assert_eq!(list.can_go_next(), page < pages);
    }

    /// Un-voting never produces a request before confirmation; voting always does.
    #[test]
    fn only_unvote_needs_confirmation(
        voted in prop::collection::vec(any::<bool>(), 1..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut list = loaded(&voted, 1);
        let i = pick.index(voted.len());
        let decision = list.request_toggle(&VoterKey::new(format!("row-{i}")));
        if voted[i] {
            prop_assert!(
                matches!(decision, ToggleDecision::NeedsConfirmation(_)),
                "expected confirmation for voted row"
            );
            prop_assert!(list.toggling().is_none());
        } else {
            prop_assert!(
                matches!(decision, ToggleDecision::Proceed(_)),
                "expected immediate toggle for unvoted row"
            );
        }
    }
}
