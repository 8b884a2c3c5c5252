//! Domain types for the seatwatch toolkit.

mod course;
mod portal_url;
mod snapshot;
mod watch_list;

pub use course::{CourseCode, CourseSection, SectionId, StudentId, TurnId};
pub use portal_url::PortalUrl;
pub use snapshot::{EnrollOutcome, EnrollmentContext, SeatSnapshot};
pub use watch_list::WatchList;
