/// Where a session is in the login flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    LoggedOut,
    LoggedIn {
        username: String,
    },
}

/// Per-user interactive state, passed explicitly to every handler.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: AuthState,
}

impl Session {
    /// A fresh, logged-out session.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::LoggedIn { .. })
    }

    /// Name of the logged-in user, if any.
    pub fn username(&self) -> Option<&str> {
        match &self.state {
            AuthState::LoggedIn { username } => Some(username),
            AuthState::LoggedOut => None,
        }
    }

    /// LoggedOut -> LoggedIn. Returns false (and changes nothing) when
    /// someone is already logged in.
    pub fn log_in(&mut self, username: impl Into<String>) -> bool {
        match self.state {
            AuthState::LoggedOut => {
                self.state = AuthState::LoggedIn {
                    username: username.into(),
                };
                true
            }
            AuthState::LoggedIn { .. } => false,
        }
    }

    /// LoggedIn -> LoggedOut, clearing the username.
    pub fn log_out(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            AuthState::LoggedIn { .. } => true,
            AuthState::LoggedOut => false,
        }
    }
}
