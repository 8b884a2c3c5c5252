//! The operator's watch list of course codes.

use super::course::CourseCode;

/// The set of course codes the scheduler is still trying to acquire.
///
/// A watch list is populated once at startup and only ever shrinks:
/// [`WatchList::resolve`] removes a code after a successful enrollment,
/// and there is no way to add codes afterwards. Removal is idempotent,
/// so a duplicate success signal cannot corrupt the list.
#[derive(Clone, Debug)]
pub struct WatchList {
    codes: Vec<CourseCode>,
}

impl WatchList {
    /// Build a watch list, dropping duplicates but keeping first-seen order.
    pub fn new(codes: impl IntoIterator<Item = CourseCode>) -> Self {
        let mut deduped: Vec<CourseCode> = Vec::new();
        for code in codes {
            if !deduped.contains(&code) {
                deduped.push(code);
            }
        }
        Self { codes: deduped }
    }

    /// Iterate over the codes still being watched.
    pub fn iter(&self) -> impl Iterator<Item = &CourseCode> {
        self.codes.iter()
    }

    /// Whether `code` is still being watched.
    pub fn contains(&self, code: &CourseCode) -> bool {
        self.codes.contains(code)
    }

    /// Remove `code` after a successful enrollment.
    ///
    /// Returns `true` if the code was present. Calling this twice for the
    /// same code removes it exactly once.
    pub fn resolve(&mut self, code: &CourseCode) -> bool {
        match self.codes.iter().position(|c| c == code) {
            Some(index) => {
                self.codes.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of codes still being watched.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether every watched code has been acquired.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl FromIterator<CourseCode> for WatchList {
    fn from_iter<I: IntoIterator<Item = CourseCode>>(iter: I) -> Self {
        Self::new(iter)
    }
}
