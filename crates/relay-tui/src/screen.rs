//! View identifier enum and the login → dashboard → edit flow.

use std::fmt;

/// Identifies each primary view.
///
/// Unlike a tabbed UI, views are not freely navigable: Dashboard and Edit
/// require an authenticated session, so all transitions go through
/// explicit actions (connect, logout, edit, back).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewId {
    #[default]
    Login,
    Dashboard,
    Edit,
}

impl ViewId {
    /// Short label for the status bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Dashboard => "Dashboard",
            Self::Edit => "Edit Slots",
        }
    }

    /// Whether this view is only reachable with working credentials.
    pub fn requires_auth(self) -> bool {
        !matches!(self, Self::Login)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_login_is_reachable_unauthenticated() {
        assert!(!ViewId::Login.requires_auth());
        assert!(ViewId::Dashboard.requires_auth());
        assert!(ViewId::Edit.requires_auth());
    }
}
