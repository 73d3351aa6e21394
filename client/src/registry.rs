//! The Registry contract, as traits so the core can run against a double.

use std::future::Future;

use pollcheck_types::{
    AuthResponse, Credentials, Registration, ToggleResult, User, Voter, VoterKey, VoterQuery,
    VoterStats, VotersPage,
};

use crate::error::ApiError;

/// Voter data operations. Every call carries the session's bearer token.
pub trait VoterRegistry {
    /// `GET /api/voters`
    fn list_voters(
        &self,
        query: &VoterQuery,
    ) -> impl Future<Output = Result<VotersPage, ApiError>> + Send;

    /// `GET /api/voters/search`
    fn search_voters(
        &self,
        text: &str,
        query: &VoterQuery,
    ) -> impl Future<Output = Result<VotersPage, ApiError>> + Send;

    /// `GET /api/voters/by-id/:voterId`, keyed by the human-readable voter ID.
    fn voter_by_id(&self, voter_id: &str) -> impl Future<Output = Result<Voter, ApiError>> + Send;

    /// `GET /api/voters/stats`
    fn stats(&self) -> impl Future<Output = Result<VoterStats, ApiError>> + Send;

    /// `PATCH /api/voters/:id/vote`. The server flips the flag and stamps `votedAt`.
    fn toggle_vote(
        &self,
        id: &VoterKey,
    ) -> impl Future<Output = Result<ToggleResult, ApiError>> + Send;
}

/// Operator account operations.
pub trait AuthService {
    /// Stores the returned token on success.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    /// Stores the returned token on success.
    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    /// Best effort server-side invalidation; the local token is always cleared.
    fn logout(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `None` when there is no usable session.
    fn current_user(&self) -> impl Future<Output = Result<Option<User>, ApiError>> + Send;

    /// Whether a token is currently stored.
    fn has_session(&self) -> bool;
}
