//! The stateful core of the PollCheck client.
//!
//! - [`VoterListController`]: one page of voters for a (search, filter, page)
//!   triple, and the toggle-vote workflow with confirmation for un-voting.
//! - [`StatsDashboard`]: the aggregate snapshot, with blocking initial loads
//!   and silent refreshes.
//! - [`Session`] / [`LoginForm`]: the authentication gate.
//! - [`Shell`]: navigation, search/filter state and the stats refresh counter.
//!
//! Nothing here talks HTTP directly. Every network call goes through a
//! `VoterRegistry` or `AuthService` handed in by the caller, and every
//! outcome is applied to in-memory state in one step.

mod deadline;
pub mod error;
pub mod list;
pub mod session;
pub mod shell;
pub mod stats;

pub use deadline::DEFAULT_CALL_TIMEOUT;
pub use error::AppError;
pub use list::{
    FetchKind, FetchOutcome, FetchRequest, ListStatus, ListView, ToggleDecision, ToggleFlow,
    ToggleOutcome, ToggleRequest, VoterListController,
};
pub use session::{AuthMode, LoginForm, Session, SessionEvent, SessionState, Submission};
pub use shell::{Navigation, Shell, View};
pub use stats::{StatsDashboard, StatsMode, StatsOutcome, StatsRequest, StatsState};
