//! Query state: the vote filter and the parameters of a list/search call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;
use crate::voter::Gender;

/// Page size used for every list and search call.
pub const PAGE_SIZE: u32 = 20;

/// Trimmed search text shorter than this is sent as a plain list call.
pub const MIN_SEARCH_LEN: usize = 2;

/// Tri-state vote-status refinement, applied server-side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteFilter {
    #[default]
    All,
    Voted,
    NotVoted,
}

impl VoteFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Voted => "voted",
            Self::NotVoted => "not_voted",
        }
    }

    /// Value of the `hasVoted` query parameter; `None` omits it.
    pub fn has_voted(&self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Voted => Some(true),
            Self::NotVoted => Some(false),
        }
    }
}

impl FromStr for VoteFilter {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "voted" => Ok(Self::Voted),
            "not_voted" | "not-voted" | "notvoted" => Ok(Self::NotVoted),
            other => Err(TypesError::InvalidVoteFilter(other.to_string())),
        }
    }
}

impl fmt::Display for VoteFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a single list or search request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoterQuery {
    pub page: u32,
    pub limit: u32,
    pub vote_filter: VoteFilter,
    /// List-only refinements; the search endpoint ignores them.
    pub gender: Option<Gender>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
}

impl VoterQuery {
    pub fn new(page: u32, vote_filter: VoteFilter) -> Self {
        Self {
            page,
            limit: PAGE_SIZE,
            vote_filter,
            gender: None,
            min_age: None,
            max_age: None,
        }
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_age_range(mut self, min_age: Option<u32>, max_age: Option<u32>) -> Self {
        self.min_age = min_age;
        self.max_age = max_age;
        self
    }

    /// Reject page 0 and inverted age ranges before anything goes on the wire.
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.page == 0 {
            return Err(TypesError::InvalidPage(self.page));
        }
        if let (Some(min), Some(max)) = (self.min_age, self.max_age) {
            if min > max {
                return Err(TypesError::InvalidAgeRange { min, max });
            }
        }
        Ok(())
    }

    /// Query string pairs for `GET /api/voters`.
    pub fn list_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(gender) = self.gender {
            params.push(("gender", gender.as_str().to_string()));
        }
        if let Some(min) = self.min_age {
            params.push(("minAge", min.to_string()));
        }
        if let Some(max) = self.max_age {
            params.push(("maxAge", max.to_string()));
        }
        if let Some(voted) = self.vote_filter.has_voted() {
            params.push(("hasVoted", voted.to_string()));
        }
        params
    }

    /// Query string pairs for `GET /api/voters/search`.
    pub fn search_params(&self, text: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", text.to_string()),
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(voted) = self.vote_filter.has_voted() {
            params.push(("hasVoted", voted.to_string()));
        }
        params
    }
}

impl Default for VoterQuery {
    fn default() -> Self {
        Self::new(1, VoteFilter::All)
    }
}

/// Whether `text` is long enough to be sent to the search endpoint.
pub fn is_searchable(text: &str) -> bool {
    text.trim().chars().count() >= MIN_SEARCH_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_filter_aliases() {
        assert_eq!("voted".parse::<VoteFilter>().unwrap(), VoteFilter::Voted);
        assert_eq!("not-voted".parse::<VoteFilter>().unwrap(), VoteFilter::NotVoted);
        assert_eq!(" ALL ".parse::<VoteFilter>().unwrap(), VoteFilter::All);
        assert!("maybe".parse::<VoteFilter>().is_err());
    }

    #[test]
    fn search_params_for_voted_filter() {
        let query = VoterQuery::new(1, VoteFilter::Voted);
        let params = query.search_params("Rahul");
        assert_eq!(
            params,
            vec![
                ("q", "Rahul".to_string()),
                ("page", "1".to_string()),
                ("limit", "20".to_string()),
                ("hasVoted", "true".to_string()),
            ]
        );
    }

    #[test]
    fn list_params_omit_has_voted_for_all() {
        let query = VoterQuery::new(3, VoteFilter::All)
            .with_gender(Gender::Female)
            .with_age_range(Some(18), Some(40));
        let params = query.list_params();
        assert!(params.iter().all(|(k, _)| *k != "hasVoted"));
        assert!(params.contains(&("gender", "Female".to_string())));
        assert!(params.contains(&("minAge", "18".to_string())));
        assert!(params.contains(&("maxAge", "40".to_string())));
    }

    #[test]
    fn not_voted_maps_to_false() {
        let query = VoterQuery::new(1, VoteFilter::NotVoted);
        assert!(query.list_params().contains(&("hasVoted", "false".to_string())));
    }

    #[test]
    fn validate_rejects_page_zero_and_inverted_range() {
        assert_eq!(
            VoterQuery::new(0, VoteFilter::All).validate(),
            Err(TypesError::InvalidPage(0))
        );
        let inverted = VoterQuery::default().with_age_range(Some(60), Some(30));
        assert!(inverted.validate().is_err());
        assert!(VoterQuery::default().validate().is_ok());
    }

    #[test]
    fn searchable_threshold_uses_trimmed_chars() {
        assert!(!is_searchable(""));
        assert!(!is_searchable(" a "));
        assert!(is_searchable("ab"));
        assert!(is_searchable("रा"));
    }
}
