//! Course and section identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated human-assigned course section code.
///
/// Codes look like `"MARX1501M.01"`: a course identifier plus a section
/// suffix. The backend treats them as unique within a selection round.
///
/// # Example
///
/// ```
/// use seatwatch_core::CourseCode;
///
/// let code = CourseCode::new("MARX1501M.01").unwrap();
/// assert_eq!(code.as_str(), "MARX1501M.01");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseCode(String);

impl CourseCode {
    /// Create a new course code from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty or contains whitespace.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref().trim();
        if s.is_empty() {
            return Err(InvalidInputError::Code {
                value: s.to_string(),
                reason: "must be non-empty".to_string(),
            }
            .into());
        }
        if s.chars().any(char::is_whitespace) {
            return Err(InvalidInputError::Code {
                value: s.to_string(),
                reason: "must not contain whitespace".to_string(),
            }
            .into());
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the full code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CourseCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CourseCode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CourseCode> for String {
    fn from(code: CourseCode) -> Self {
        code.0
    }
}

/// The backend's internal id for one course section ("lesson").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub i64);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The backend's id for the authenticated student.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub i64);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The id of one time-boxed course-selection round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(pub i64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable snapshot of one selectable course section.
///
/// Fetched wholesale each refresh cycle and discarded; ids and seat limits
/// can change between selection rounds, so nothing here is cached across a
/// re-authentication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CourseSection {
    /// Human-assigned code, unique within the round.
    pub code: CourseCode,
    /// Backend-internal section id.
    pub id: SectionId,
    /// Display name of the course.
    pub name: String,
    /// Seat capacity of this section.
    pub seat_limit: u32,
}

impl CourseSection {
    /// Human-readable "Name (CODE)" label used in notifications.
    pub fn headline(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }
}
