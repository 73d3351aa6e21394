//! Fundamental types for the PollCheck voter-roll client.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: voter records as the Registry returns them, query and filter
//! state, the pagination envelope, the aggregate stats snapshot, and the
//! authentication payloads.

pub mod auth;
pub mod error;
pub mod filter;
pub mod pagination;
mod serde_helpers;
pub mod stats;
pub mod voter;

pub use auth::{AuthResponse, Credentials, Registration, User};
pub use error::TypesError;
pub use filter::{is_searchable, VoteFilter, VoterQuery, MIN_SEARCH_LEN, PAGE_SIZE};
pub use pagination::{Pagination, VotersPage};
pub use stats::{AgeGroup, GenderTurnout, VoterStats};
pub use voter::{Gender, ToggleResult, Voter, VoterKey};
