//! Course-select endpoints and wire types of the academic system.

use serde::Deserialize;

/// SSO entry the service binder follows to establish trust.
pub(crate) const SSO_ENTRY: &str = "ucas-sso/login";

/// Entry page; answers with a redirect carrying the student id.
pub(crate) const COURSE_SELECT: &str = "for-std/course-select";

/// Open selection rounds for a student.
pub(crate) const OPEN_TURNS: &str = "ws/for-std/course-select/open-turns";

/// All sections the student may currently add.
pub(crate) const ADDABLE_LESSONS: &str = "ws/for-std/course-select/addable-lessons";

/// Batched live enrolled counts.
pub(crate) const STD_COUNT: &str = "ws/for-std/course-select/std-count";

/// Phase one of the add request; answers with a request id.
pub(crate) const ADD_REQUEST: &str = "ws/for-std/course-select/add-request";

/// Phase two: confirmation of a pending request id.
pub(crate) const ADD_DROP_RESPONSE: &str = "ws/for-std/course-select/add-drop-response";

/// Business type id of the course-select module.
pub(crate) const COURSE_SELECT_BIZ_TYPE: &str = "2";

/// One selectable section as returned by `addable-lessons`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LessonRow {
    pub(crate) code: String,
    pub(crate) id: i64,
    pub(crate) limit_count: u32,
    pub(crate) course: CourseRef,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CourseRef {
    pub(crate) name_zh: String,
}

/// One open selection round as returned by `open-turns`.
#[derive(Debug, Deserialize)]
pub(crate) struct OpenTurnRow {
    pub(crate) id: i64,
}

/// Confirmation payload of the add request's second phase.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddDropResponse {
    pub(crate) success: bool,
    #[serde(default)]
    pub(crate) error_message: Option<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorMessage {
    pub(crate) text: String,
}
