//! Capability traits.
//!
//! The acquisition scheduler is programmed against these single-purpose
//! contracts so every collaborator (challenge solver, notification channel,
//! enrollment backend) can be substituted with a deterministic stand-in
//! under test.

mod notifier;
mod ops;
mod solver;

pub use notifier::{LogNotifier, Notifier};
pub use ops::EnrollmentOps;
pub use solver::{ChallengeSolver, NoopSolver};
