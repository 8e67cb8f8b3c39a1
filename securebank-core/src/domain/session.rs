//! Session domain model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::Identity;

/// User record returned alongside a successful authentication
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub alias: String,
    pub cpf: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// What the remote service hands back for a successful exchange
#[derive(Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: String,
    pub profile: Option<Profile>,
}

impl fmt::Debug for AuthGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGrant")
            .field("token", &"<redacted>")
            .field("profile", &self.profile)
            .finish()
    }
}

/// The authenticated runtime context
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub token: String,
    pub profile: Option<Profile>,
}

impl Session {
    pub fn new(identity: Identity, grant: AuthGrant) -> Self {
        Self {
            identity,
            token: grant.token,
            profile: grant.profile,
        }
    }

    pub fn alias(&self) -> &str {
        &self.identity.alias
    }

    /// Display name, falling back to the alias when no profile was returned
    pub fn display_name(&self) -> &str {
        self.profile
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.identity.alias)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("token", &"<redacted>")
            .field("profile", &self.profile)
            .finish()
    }
}

/// Session lifecycle states
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated(Session),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticating => "authenticating",
            SessionState::Authenticated(_) => "authenticated",
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_alias() {
        let identity = Identity::new("kauazinho", "123456");
        let session = Session::new(
            identity.clone(),
            AuthGrant {
                token: "tok".into(),
                profile: None,
            },
        );
        assert_eq!(session.display_name(), "kauazinho");

        let session = Session::new(
            identity,
            AuthGrant {
                token: "tok".into(),
                profile: Some(Profile {
                    name: "Kaua Zipf".into(),
                    alias: "kauazinho".into(),
                    ..Default::default()
                }),
            },
        );
        assert_eq!(session.display_name(), "Kaua Zipf");
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new(
            Identity::new("kauazinho", "123456"),
            AuthGrant {
                token: "very-secret-token".into(),
                profile: None,
            },
        );
        assert!(!format!("{:?}", session).contains("very-secret-token"));
        assert_eq!(SessionState::Authenticated(session).name(), "authenticated");
    }
}
