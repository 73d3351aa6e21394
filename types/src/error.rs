//! Error type shared by the domain types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid vote filter: {0} (expected all, voted or not_voted)")]
    InvalidVoteFilter(String),

    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    #[error("invalid age range: min {min} is above max {max}")]
    InvalidAgeRange { min: u32, max: u32 },

    #[error("voter {voter_id} breaks the vote invariant: {reason}")]
    VoteInvariant { voter_id: String, reason: String },
}
