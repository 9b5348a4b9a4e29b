//! Signed-in traveller identity
//!
//! Sign-in itself happens elsewhere. Components that care about the current
//! user receive a [`SessionAccessor`] explicitly instead of reaching for a
//! global.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub display_name: String, // always derived from the email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Session {
    /// Build a session from what the identity provider hands back.
    pub fn from_identity(uid: &str, email: &str, token: Option<String>) -> Self {
        Self {
            uid: uid.to_string(),
            email: email.to_string(),
            display_name: display_name_from_email(email),
            token,
        }
    }
}

/// The part of the address before '@'.
pub fn display_name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or_default().trim().to_string()
}

/// Read access to the current session
pub trait SessionAccessor: Send + Sync {
    fn current(&self) -> Option<Session>;
}

/// Nobody is signed in
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSession;

impl SessionAccessor for NoSession {
    fn current(&self) -> Option<Session> {
        None
    }
}

/// A fixed session, e.g. from a token passed on the command line
#[derive(Debug, Clone)]
pub struct StaticSession(pub Session);

impl SessionAccessor for StaticSession {
    fn current(&self) -> Option<Session> {
        Some(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_from_email() {
        assert_eq!(display_name_from_email("asha.rao@example.com"), "asha.rao");
        assert_eq!(display_name_from_email("no-at-sign"), "no-at-sign");
        assert_eq!(display_name_from_email(""), "");
    }

    #[test]
    fn test_session_from_identity() {
        let session = Session::from_identity("uid-1", "traveller@mail.in", None);
        assert_eq!(session.display_name, "traveller");
        assert_eq!(session.uid, "uid-1");
    }

    #[test]
    fn test_accessors() {
        assert!(NoSession.current().is_none());
        let accessor = StaticSession(Session::from_identity("u", "a@b.c", Some("t".to_string())));
        assert_eq!(accessor.current().unwrap().display_name, "a");
    }
}
