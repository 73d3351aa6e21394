//! Client for the remote voter Registry.
//!
//! The Registry owns every voter record and all vote state; this crate only
//! speaks its REST contract:
//! - `VoterRegistry`: list, search, lookup, stats, toggle vote
//! - `AuthService`: login, register, logout, current user
//! - `TokenStore`: where the opaque bearer token lives between runs
//!
//! `HttpRegistry` implements both traits over `reqwest`. Any 401 from a
//! voter or stats call clears the stored token before the error is returned.

pub mod config;
pub mod error;
pub mod http;
pub mod registry;
pub mod session;

pub use config::ClientConfig;
pub use error::ApiError;
pub use http::HttpRegistry;
pub use registry::{AuthService, VoterRegistry};
pub use session::{FileTokenStore, MemoryTokenStore, TokenStore};
