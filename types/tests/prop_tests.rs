use proptest::prelude::*;

use pollcheck_types::{is_searchable, Pagination, VoteFilter, VoterQuery, PAGE_SIZE};

fn any_filter() -> impl Strategy<Value = VoteFilter> {
    prop_oneof![
        Just(VoteFilter::All),
        Just(VoteFilter::Voted),
        Just(VoteFilter::NotVoted),
    ]
}

proptest! {
    /// "Previous" is disabled exactly on page 1.
    #[test]
    fn previous_disabled_only_on_first_page(page in 1u32..10_000, pages in 0u32..10_000) {
        let p = Pagination { page, limit: PAGE_SIZE, total: u64::from(pages) * 20, pages };
        prop_assert_eq!(!p.has_previous(page), page == 1);
    }

    /// "Next" is disabled exactly when page >= pages.
    #[test]
    fn next_disabled_at_or_past_last_page(page in 1u32..10_000, pages in 0u32..10_000) {
        let p = Pagination { page, limit: PAGE_SIZE, total: 0, pages };
        prop_assert_eq!(!p.has_next(page), page >= pages);
    }

    /// The hasVoted parameter is present iff the filter is not `all`.
    #[test]
    fn has_voted_param_tracks_filter(filter in any_filter(), page in 1u32..500, q in "[a-zA-Z]{2,12}") {
        let query = VoterQuery::new(page, filter);
        let expected = filter.has_voted().map(|v| v.to_string());
        let found = query.search_params(&q).into_iter().find(|(k, _)| *k == "hasVoted").map(|(_, v)| v);
        prop_assert_eq!(found, expected.clone());
        let found = query.list_params().into_iter().find(|(k, _)| *k == "hasVoted").map(|(_, v)| v);
        prop_assert_eq!(found, expected);
    }

    /// Search always carries the exact text and the fixed page size.
    #[test]
    fn search_params_carry_exact_text(q in "\\PC{0,24}", page in 1u32..500) {
        let params = VoterQuery::new(page, VoteFilter::All).search_params(&q);
        prop_assert_eq!(&params[0], &("q", q.clone()));
        prop_assert!(params.contains(&("limit", PAGE_SIZE.to_string())));
        prop_assert!(params.contains(&("page", page.to_string())));
    }

    /// Surrounding whitespace never makes a short query searchable.
    #[test]
    fn padding_does_not_count(pad in " {0,8}", c in "[a-z]") {
        let padded = format!("{pad}{c}{pad}");
        prop_assert!(!is_searchable(&padded));
    }
}
