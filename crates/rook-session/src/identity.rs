//! Identity provider seam.

/// Resolved account of the local user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    /// Stable subject identifier.
    pub subject: String,
    /// E-mail, sent as the identity field of session requests.
    pub email: String,
    /// Name shown to players.
    pub display_name: String,
}

/// Who is playing. `current_user` returns `None` until the account is
/// resolved.
pub trait IdentityProvider {
    /// The provider finished its startup check.
    fn is_initialized(&self) -> bool;
    /// A user is signed in.
    fn is_authenticated(&self) -> bool;
    /// The signed-in user, once resolved.
    fn current_user(&self) -> Option<UserInfo>;
}

/// Identity fixed at startup, e.g. read from the config file.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<UserInfo>,
}

impl StaticIdentity {
    /// A signed-in user.
    pub fn signed_in(user: UserInfo) -> Self {
        Self { user: Some(user) }
    }

    /// Nobody is signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl IdentityProvider for StaticIdentity {
    fn is_initialized(&self) -> bool {
        true
    }

    fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    fn current_user(&self) -> Option<UserInfo> {
        self.user.clone()
    }
}
