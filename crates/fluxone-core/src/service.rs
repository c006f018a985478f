//! Services: named, application-scoped collaborators registered under
//! `service.<name>`.

use crate::action::AppLink;
use crate::application::Application;

/// Service capability.
pub trait Service: Send + Sync + 'static {
    /// Identifier used for the `service.<name>` container key.
    fn name(&self) -> &str;

    fn app_link(&self) -> &AppLink;

    fn app(&self) -> Option<Application> {
        self.app_link().app()
    }
}
