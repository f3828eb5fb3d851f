use serde::{Deserialize, Serialize};
use shared::domain::{ContentItem, UserId};

/// The signed-in user as reported by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl AuthUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            email: None,
            username: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Nickname written next to authored content: the profile username, else the
    /// local part of the email address.
    pub fn display_name(&self) -> String {
        if let Some(username) = self.username.as_deref().map(str::trim) {
            if !username.is_empty() {
                return username.to_string();
            }
        }
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Authentication state handed to every operation that needs to know who is acting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<AuthUser>,
}

impl Session {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(user: AuthUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|user| &user.id)
    }

    pub fn owns(&self, item: &ContentItem) -> bool {
        self.user_id().is_some_and(|id| *id == item.author_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_username() {
        let user = AuthUser::new("u1")
            .with_email("ada@example.com")
            .with_username("ada_l");
        assert_eq!(user.display_name(), "ada_l");
    }

    #[test]
    fn display_name_falls_back_to_email_local_part() {
        let user = AuthUser::new("u1")
            .with_email("grace@example.com")
            .with_username("  ");
        assert_eq!(user.display_name(), "grace");
        assert_eq!(AuthUser::new("u2").display_name(), "u2");
    }

    #[test]
    fn signed_out_session_has_no_user() {
        let session = Session::signed_out();
        assert!(session.user().is_none());
        assert!(session.user_id().is_none());
    }
}
