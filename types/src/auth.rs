//! Authentication payloads for the Registry's login/register endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The operator account returned by `/api/login`, `/api/register` and `/api/me`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Body of `POST /api/login`.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /api/register`.
///
/// The security code is a shared numeric secret that gates self-registration.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub name: String,
    pub security_code: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("security_code", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_uses_camel_case() {
        let reg = Registration {
            username: "admin".into(),
            password: "pw".into(),
            name: "Admin".into(),
            security_code: "4821".into(),
        };
        let json = serde_json::to_value(&reg).unwrap();
        assert_eq!(json["securityCode"], "4821");
    }

    #[test]
    fn debug_redacts_secrets() {
        let creds = Credentials::new("admin", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
    }
}
