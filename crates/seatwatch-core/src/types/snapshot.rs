//! Per-cycle snapshot types.

use std::collections::HashMap;

use super::course::{SectionId, StudentId, TurnId};

/// Live enrolled-count snapshot for a set of sections.
///
/// Valid only for the instant it was fetched; the poll loop replaces it
/// wholesale every cycle, and staleness between poll and submit is
/// tolerated by construction (the backend arbitrates contention).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeatSnapshot {
    counts: HashMap<SectionId, u32>,
}

impl SeatSnapshot {
    /// Wrap a fetched id-to-count mapping.
    pub fn new(counts: HashMap<SectionId, u32>) -> Self {
        Self { counts }
    }

    /// The enrolled count for `id`, if it was part of this snapshot.
    pub fn count_for(&self, id: SectionId) -> Option<u32> {
        self.counts.get(&id).copied()
    }

    /// Number of sections in this snapshot.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(SectionId, u32)> for SeatSnapshot {
    fn from_iter<I: IntoIterator<Item = (SectionId, u32)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

/// Identifiers scoping one authenticated course-selection round.
///
/// Invalidated by every re-authentication: both ids can change across
/// rounds, so the context must be re-resolved after each re-login.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnrollmentContext {
    /// The authenticated student.
    pub student_id: StudentId,
    /// The open selection round, or `None` while no round is open.
    /// With no round open, polling is a no-op rather than an error.
    pub turn: Option<TurnId>,
}

/// Outcome of a completed two-phase add request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnrollOutcome {
    /// Both phases succeeded and the backend accepted the request.
    Enrolled,
    /// Both phases completed but the backend refused the request, e.g.
    /// the seat was claimed between poll and submit.
    Refused {
        /// Human-readable reason reported by the backend.
        reason: String,
    },
}
