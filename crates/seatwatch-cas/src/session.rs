//! The CAS session state machine.

use std::fmt;
use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, LOCATION};
use reqwest::redirect::Policy;
use tracing::{debug, info, instrument, warn};

use seatwatch_core::error::ProtocolError;
use seatwatch_core::{ChallengeSolver, Credentials, PortalUrl, Result};

use crate::binder::ServiceBinder;
use crate::endpoints::{self, field};
use crate::markup;

/// The portal and the enrollment backend reject clients that do not look
/// like a browser.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

/// Authentication progress of a [`CasSession`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    /// No valid ticket; [`CasSession::login`] has not succeeded yet.
    #[default]
    Unauthenticated,
    /// A login attempt is waiting on the challenge answer.
    ChallengePending,
    /// The session cookies carry a valid ticket.
    Authenticated,
}

/// One authenticated HTTP session against the CAS portal.
///
/// The session owns the cookie jar; downstream clients borrow it through
/// accessors and never copy it. Two HTTP clients share the jar: [`http`]
/// follows redirects (already-authenticated detection, service binding),
/// [`http_bare`] does not (the login POST signals its outcome via the
/// `Location` header, which must be inspected rather than followed).
///
/// State transitions happen only inside [`login`]; a rejected login is an
/// expected outcome reported as `Ok(false)`, not an error.
///
/// [`http`]: CasSession::http
/// [`http_bare`]: CasSession::http_bare
/// [`login`]: CasSession::login
pub struct CasSession {
    portal: PortalUrl,
    credentials: Credentials,
    solver: Box<dyn ChallengeSolver>,
    http: reqwest::Client,
    http_bare: reqwest::Client,
    state: AuthState,
}

impl CasSession {
    /// Create a new session against `portal` with the given credentials
    /// and challenge solver.
    pub fn new(
        portal: PortalUrl,
        credentials: Credentials,
        solver: Box<dyn ChallengeSolver>,
    ) -> Self {
        let jar = Arc::new(Jar::default());
        let http = client_builder(jar.clone())
            .build()
            .expect("failed to build HTTP client");
        let http_bare = client_builder(jar)
            .redirect(Policy::none())
            .build()
            .expect("failed to build HTTP client");

        Self {
            portal,
            credentials,
            solver,
            http,
            http_bare,
            state: AuthState::Unauthenticated,
        }
    }

    /// Current authentication state.
    pub fn state(&self) -> AuthState {
        self.state
    }

    /// The portal this session authenticates against.
    pub fn portal(&self) -> &PortalUrl {
        &self.portal
    }

    /// Redirect-following client sharing this session's cookies.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Redirect-suppressing client sharing this session's cookies.
    pub fn http_bare(&self) -> &reqwest::Client {
        &self.http_bare
    }

    /// Binder view for presenting this session's ticket to a service.
    pub fn binder(&self) -> ServiceBinder<'_> {
        ServiceBinder::new(self)
    }

    /// Run the login state machine.
    ///
    /// Idempotent: when the portal answers the login page request with the
    /// success redirect, the session already holds a valid ticket and no
    /// credentials are resubmitted. Otherwise the per-attempt token is
    /// scraped from the page, the challenge branch is taken if the page
    /// demands one, and the credential form is posted with redirects
    /// disabled. Success is determined solely by a redirect status whose
    /// target equals the portal's success URL.
    ///
    /// Returns `Ok(true)` when the session ends up authenticated. A
    /// rejected login (bad credentials, wrong challenge answer, rate
    /// limiting) is `Ok(false)`, not an error.
    ///
    /// # Errors
    ///
    /// Fails with a protocol error when the login token cannot be located
    /// (page format drift), or with a transport error.
    #[instrument(skip(self), fields(username = %self.credentials.username()))]
    pub async fn login(&mut self) -> Result<bool> {
        let login_url = self.portal.join(endpoints::LOGIN);
        let success_url = self.portal.join(endpoints::SUCCESS);

        let response = self.http.get(&login_url).send().await?;
        if response.url().as_str() == success_url {
            debug!("portal reports an existing ticket");
            self.state = AuthState::Authenticated;
            return Ok(true);
        }

        let page = response.text().await?;
        let token = markup::extract_login_token(&page)
            .ok_or_else(|| {
                ProtocolError::new(
                    "login page",
                    "login token not found; the page format may have changed",
                )
            })?
            .to_string();

        let challenge = if markup::challenge_required(&page) {
            self.state = AuthState::ChallengePending;
            debug!("challenge required, fetching image");
            let image = self
                .http
                .get(self.portal.join(endpoints::CHALLENGE_IMAGE))
                .send()
                .await?
                .bytes()
                .await?;
            Some(self.solver.solve(&image).await?)
        } else {
            None
        };

        let show_code = if challenge.is_some() { "1" } else { "" };
        let mut form: Vec<(&str, &str)> = vec![
            (field::MODEL, endpoints::LOGIN_MODEL),
            (field::LOGIN_TOKEN, &token),
            (field::SERVICE, ""),
            (field::WARN, ""),
            (field::SHOW_CODE, show_code),
            (field::USERNAME, self.credentials.username()),
            (field::PASSWORD, self.credentials.password()),
            (field::BUTTON, ""),
        ];
        if let Some(answer) = challenge.as_deref() {
            form.push((field::CHALLENGE, answer));
        }

        let response = self.http_bare.post(&login_url).form(&form).send().await?;
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok());
        let authenticated =
            response.status().is_redirection() && location == Some(success_url.as_str());

        if authenticated {
            info!("login succeeded");
            self.state = AuthState::Authenticated;
        } else {
            warn!(status = %response.status(), "login rejected");
            self.state = AuthState::Unauthenticated;
        }
        Ok(authenticated)
    }
}

// Custom Debug impl that hides the cookie jar; Credentials redacts itself.
impl fmt::Debug for CasSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CasSession")
            .field("portal", &self.portal)
            .field("credentials", &self.credentials)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn client_builder(jar: Arc<Jar>) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(base_headers())
        .cookie_provider(jar)
}

fn base_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatwatch_core::NoopSolver;

    #[test]
    fn session_starts_unauthenticated() {
        let portal = PortalUrl::new("https://passport.ustc.edu.cn").unwrap();
        let credentials = Credentials::new("PB12345678", "secret");
        let session = CasSession::new(portal, credentials, Box::new(NoopSolver));
        assert_eq!(session.state(), AuthState::Unauthenticated);
    }

    #[test]
    fn debug_hides_password() {
        let portal = PortalUrl::new("https://passport.ustc.edu.cn").unwrap();
        let credentials = Credentials::new("PB12345678", "secret123");
        let session = CasSession::new(portal, credentials, Box::new(NoopSolver));
        let debug = format!("{:?}", session);
        assert!(!debug.contains("secret123"));
    }
}
