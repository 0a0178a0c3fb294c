//! View implementations. Each view is a top-level Component.

mod dashboard;
mod edit;
mod login;

use dashboard::DashboardScreen;
use edit::EditScreen;
use login::LoginScreen;

use crate::component::Component;
use crate::screen::ViewId;

/// Values prefilled into the login form, from CLI flags or saved config.
/// Unset fields fall back to the device factory defaults.
#[derive(Debug, Default, Clone)]
pub struct LoginPrefill {
    pub address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Create all three views, starting on Login.
pub fn create_views(prefill: LoginPrefill) -> Vec<(ViewId, Box<dyn Component>)> {
    vec![
        (
            ViewId::Login,
            Box::new(LoginScreen::new(prefill)) as Box<dyn Component>,
        ),
        (ViewId::Dashboard, Box::new(DashboardScreen::new())),
        (ViewId::Edit, Box::new(EditScreen::new())),
    ]
}
