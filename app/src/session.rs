//! Authentication gate: the session state machine and the login/register form.

use std::time::Duration;

use pollcheck_client::AuthService;
use pollcheck_types::{AuthResponse, Credentials, Registration, User};

use crate::deadline::{within, DEFAULT_CALL_TIMEOUT};
use crate::error::AppError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    /// `user` is `None` when a stored token was found but the account has
    /// not been fetched yet.
    Authenticated { user: Option<User> },
}

/// The only ways the session can change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn(User),
    LoggedOut,
    /// The Registry answered 401 somewhere.
    Expired,
}

#[derive(Clone, Debug)]
pub struct Session {
    state: SessionState,
    logout_pending: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            logout_pending: false,
        }
    }

    /// Initial state derived from whether a token is stored.
    pub fn from_token_present(present: bool) -> Self {
        let state = if present {
            SessionState::Authenticated { user: None }
        } else {
            SessionState::Unauthenticated
        };
        Self {
            state,
            logout_pending: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated { user } => user.as_ref(),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn logout_pending(&self) -> bool {
        self.logout_pending
    }

    /// Apply one event. Every session change goes through here.
    pub fn transition(&mut self, event: SessionEvent) {
        self.logout_pending = false;
        self.state = match event {
            SessionEvent::LoggedIn(user) => {
                tracing::info!(username = %user.username, "logged in");
                SessionState::Authenticated { user: Some(user) }
            }
            SessionEvent::LoggedOut => {
                tracing::info!("logged out");
                SessionState::Unauthenticated
            }
            SessionEvent::Expired => {
                tracing::warn!("session expired");
                SessionState::Unauthenticated
            }
        };
    }

    pub fn login_succeeded(&mut self, user: User) {
        self.transition(SessionEvent::LoggedIn(user));
    }

    pub fn expire(&mut self) {
        self.transition(SessionEvent::Expired);
    }

    /// Fill in the account behind a restored token.
    pub fn set_user(&mut self, user: User) {
        if let SessionState::Authenticated { user: slot } = &mut self.state {
            *slot = Some(user);
        }
    }

    /// Ask for logout confirmation. Returns `false` when not logged in.
    pub fn request_logout(&mut self) -> bool {
        if !self.is_authenticated() {
            return false;
        }
        self.logout_pending = true;
        true
    }

    pub fn cancel_logout(&mut self) {
        self.logout_pending = false;
    }

    /// Returns `true` if a pending logout was confirmed; the caller then
    /// invalidates the token with the Registry.
    pub fn confirm_logout(&mut self) -> bool {
        if !self.logout_pending {
            return false;
        }
        self.transition(SessionEvent::LoggedOut);
        true
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

/// A validated form ready to send.
#[derive(Clone, Debug)]
pub enum Submission {
    Login(Credentials),
    Register(Registration),
}

/// Login/register modal state.
pub struct LoginForm {
    mode: AuthMode,
    pub username: String,
    pub password: String,
    pub name: String,
    pub security_code: String,
    error: Option<String>,
    loading: bool,
    call_timeout: Duration,
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            mode: AuthMode::default(),
            username: String::new(),
            password: String::new(),
            name: String::new(),
            security_code: String::new(),
            error: None,
            loading: false,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Bound the login and register calls.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Inline error banner text.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Switching mode clears every field and the error.
    pub fn switch_mode(&mut self, mode: AuthMode) {
        *self = Self {
            mode,
            ..Self::new().with_call_timeout(self.call_timeout)
        };
    }

    pub fn reset(&mut self) {
        self.switch_mode(self.mode);
    }

    pub fn submission(&self) -> Result<Submission, AppError> {
        let username = self.username.trim();
        if username.is_empty() || self.password.is_empty() {
            return Err(AppError::InvalidInput(
                "Username and password are required".into(),
            ));
        }
        match self.mode {
            AuthMode::Login => Ok(Submission::Login(Credentials::new(
                username,
                self.password.clone(),
            ))),
            AuthMode::Register => {
                let name = self.name.trim();
                if name.is_empty() {
                    return Err(AppError::InvalidInput("Name is required".into()));
                }
                let code = self.security_code.trim();
                if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
                    return Err(AppError::InvalidInput(
                        "Security code must be numeric".into(),
                    ));
                }
                Ok(Submission::Register(Registration {
                    username: username.to_string(),
                    password: self.password.clone(),
                    name: name.to_string(),
                    security_code: code.to_string(),
                }))
            }
        }
    }

    /// Validate and send the form. Failures land in the inline error; the
    /// Registry's own message is shown verbatim.
    pub async fn submit<A: AuthService>(&mut self, auth: &A) -> Result<AuthResponse, AppError> {
        let submission = match self.submission() {
            Ok(s) => s,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };
        self.error = None;
        self.loading = true;
        let result = match &submission {
            Submission::Login(credentials) => {
                within(self.call_timeout, auth.login(credentials)).await
            }
            Submission::Register(registration) => {
                within(self.call_timeout, auth.register(registration)).await
            }
        };
        self.loading = false;
        match result {
            Ok(response) => {
                self.reset();
                Ok(response)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 1,
            username: "booth7".into(),
            name: "Booth Seven".into(),
        }
    }

    #[test]
    fn token_presence_decides_initial_state() {
        assert!(Session::from_token_present(true).is_authenticated());
        assert!(!Session::from_token_present(false).is_authenticated());
    }

    #[test]
    fn logout_needs_confirmation() {
        let mut s = Session::new();
        s.login_succeeded(user());
        assert!(!s.confirm_logout());
        assert!(s.request_logout());
        s.cancel_logout();
        assert!(!s.confirm_logout());
        assert!(s.is_authenticated());

        s.request_logout();
        assert!(s.confirm_logout());
        assert!(!s.is_authenticated());
    }

    #[test]
    fn expiry_drops_pending_logout() {
        let mut s = Session::new();
        s.login_succeeded(user());
        s.request_logout();
        s.expire();
        assert_eq!(s.state(), &SessionState::Unauthenticated);
        assert!(!s.logout_pending());
    }

    #[test]
    fn switching_mode_clears_fields() {
        let mut f = LoginForm::new();
        f.username = "x".into();
        f.switch_mode(AuthMode::Register);
        assert_eq!(f.mode(), AuthMode::Register);
        assert!(f.username.is_empty());
    }

    #[test]
    fn switching_mode_keeps_call_timeout() {
        let mut f = LoginForm::new().with_call_timeout(Duration::from_secs(3));
        f.switch_mode(AuthMode::Register);
        f.reset();
        assert_eq!(f.call_timeout(), Duration::from_secs(3));
        assert_eq!(LoginForm::default().call_timeout(), DEFAULT_CALL_TIMEOUT);
    }

    #[test]
    fn register_requires_numeric_code() {
        let mut f = LoginForm::new();
        f.switch_mode(AuthMode::Register);
        f.username = "booth7".into();
        f.password = "pw".into();
        f.name = "Booth Seven".into();
        f.security_code = "48a1".into();
        assert!(f.submission().is_err());
        f.security_code = "4821".into();
        assert!(matches!(f.submission(), Ok(Submission::Register(_))));
    }

    #[test]
    fn login_requires_both_fields() {
        let mut f = LoginForm::new();
        f.username = "booth7".into();
        assert!(f.submission().is_err());
    }
}
