//! seatwatch-enroll - Enrollment client and acquisition loop.
//!
//! [`EnrollmentClient`] wraps a CAS-bound session into the academic
//! system's course-select operations: context resolution, addable-section
//! listing, batched seat counts, and the two-phase add request.
//! [`Scheduler`] polls seat counts for a watch list and fires the add
//! request the moment a seat opens, recovering from session expiry and
//! pushing outcomes through a [`Notifier`](seatwatch_core::Notifier).

mod client;
mod endpoints;
mod scheduler;

pub use client::EnrollmentClient;
pub use scheduler::{Scheduler, SchedulerConfig};
