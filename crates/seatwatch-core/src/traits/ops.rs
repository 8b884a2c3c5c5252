//! Scheduler-facing enrollment operations.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::Result;
use crate::types::{
    CourseCode, CourseSection, EnrollOutcome, EnrollmentContext, SeatSnapshot, SectionId,
};

/// The operations the acquisition scheduler drives.
///
/// Implemented by the real enrollment client; test schedulers substitute a
/// scripted implementation. Any operation other than [`relogin`] may fail
/// with a session-expired error, after which the caller must go through
/// [`relogin`] before issuing further calls.
///
/// [`relogin`]: EnrollmentOps::relogin
#[async_trait]
pub trait EnrollmentOps: Send + Sync {
    /// Re-establish the full session: portal login, service binding and
    /// context resolution, in that order. Returns `Ok(false)` when the
    /// portal rejected the credentials or the challenge answer.
    async fn relogin(&mut self) -> Result<bool>;

    /// Resolve the student/turn pair for the current selection round.
    async fn resolve_context(&mut self) -> Result<EnrollmentContext>;

    /// Snapshot of all currently addable sections, keyed by course code.
    async fn addable_sections(&mut self) -> Result<HashMap<CourseCode, CourseSection>>;

    /// Live enrolled counts for the given section ids.
    async fn seat_counts(&mut self, ids: &[SectionId]) -> Result<SeatSnapshot>;

    /// Submit the two-phase add request for one section.
    async fn enroll(&mut self, id: SectionId) -> Result<EnrollOutcome>;
}
