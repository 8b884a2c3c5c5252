//! seatwatch-core - Core types and capability traits for seatwatch.
//!
//! This crate defines the domain vocabulary of the toolkit: credentials,
//! course and section identifiers, per-cycle snapshot types, the watch list,
//! the unified error taxonomy, and the capability traits the acquisition
//! scheduler is programmed against ([`ChallengeSolver`], [`Notifier`],
//! [`EnrollmentOps`]).

pub mod credentials;
pub mod error;
pub mod traits;
pub mod types;

// Re-export primary types at crate root for convenience
pub use credentials::Credentials;
pub use error::Error;
pub use traits::{ChallengeSolver, EnrollmentOps, LogNotifier, NoopSolver, Notifier};
pub use types::{
    CourseCode, CourseSection, EnrollOutcome, EnrollmentContext, PortalUrl, SeatSnapshot,
    SectionId, StudentId, TurnId, WatchList,
};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
