//! Service binding: presenting the SSO ticket to a downstream service.

use tracing::{debug, instrument};
use url::Url;

use seatwatch_core::Result;

use crate::session::CasSession;

/// Borrowed view of a [`CasSession`] used to log a downstream service in.
///
/// Binding must be repeated after every re-authentication: a fresh ticket
/// invalidates whatever trust the service had in the previous one.
pub struct ServiceBinder<'a> {
    session: &'a CasSession,
}

impl<'a> ServiceBinder<'a> {
    pub(crate) fn new(session: &'a CasSession) -> Self {
        Self { session }
    }

    /// Follow the service's SSO entry URL with the current session.
    ///
    /// Returns the final landing URL once the service trusts the session,
    /// or `None` when the request ended back on the portal (no valid
    /// ticket — the caller must `login()` again and re-bind).
    #[instrument(skip(self))]
    pub async fn bind(&self, service_url: &str) -> Result<Option<Url>> {
        let response = self.session.http().get(service_url).send().await?;
        let landed = response.url().clone();
        if landed.origin() == self.session.portal().origin() {
            debug!(%landed, "service binding refused, still on the portal");
            Ok(None)
        } else {
            debug!(%landed, "service bound");
            Ok(Some(landed))
        }
    }
}
