use super::Profile;

/// Authentication state.
///
/// `Resolving` covers the window where a token is known but its profile
/// has not been (re)loaded yet.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Resolving {
        token: String,
    },
    Authenticated {
        token: String,
        user: Profile,
    },
}

impl SessionState {
    /// Check if a profile is loaded
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn is_resolving(&self) -> bool {
        matches!(self, SessionState::Resolving { .. })
    }

    /// Bearer token, if any
    pub fn token(&self) -> Option<&str> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Resolving { token } | SessionState::Authenticated { token, .. } => {
                Some(token)
            }
        }
    }

    /// Loaded profile, if any
    pub fn user(&self) -> Option<&Profile> {
        match self {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    /// Label for the header
    pub fn display_name(&self) -> String {
        match self {
            SessionState::Authenticated { user, .. } => user.display_name().to_string(),
            SessionState::Resolving { .. } => "signing in...".to_string(),
            SessionState::Anonymous => "guest".to_string(),
        }
    }
}
