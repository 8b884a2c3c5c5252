//! seatwatch-cas - CAS single-sign-on session management.
//!
//! [`CasSession`] drives the portal's login state machine over one
//! cookie-carrying HTTP session; [`ServiceBinder`] presents the resulting
//! ticket to downstream services so they trust the session.
//!
//! # Example
//!
//! ```no_run
//! use seatwatch_cas::CasSession;
//! use seatwatch_core::{Credentials, NoopSolver, PortalUrl};
//!
//! # async fn example() -> seatwatch_core::Result<()> {
//! let portal = PortalUrl::new("https://passport.ustc.edu.cn")?;
//! let credentials = Credentials::new("PB12345678", "hunter2");
//! let mut session = CasSession::new(portal, credentials, Box::new(NoopSolver));
//!
//! if session.login().await? {
//!     let bound = session
//!         .binder()
//!         .bind("https://jw.ustc.edu.cn/ucas-sso/login")
//!         .await?;
//!     assert!(bound.is_some());
//! }
//! # Ok(())
//! # }
//! ```

mod binder;
mod endpoints;
mod markup;
mod session;

pub use binder::ServiceBinder;
pub use session::{AuthState, CasSession};
