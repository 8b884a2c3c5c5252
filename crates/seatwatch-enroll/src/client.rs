//! The enrollment client for the academic system.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{LOCATION, ORIGIN, REFERER};
use tracing::{debug, info, instrument, warn};
use url::Url;

use seatwatch_cas::CasSession;
use seatwatch_core::error::{AuthError, EnrollError, ProtocolError};
use seatwatch_core::{
    CourseCode, CourseSection, EnrollOutcome, EnrollmentContext, EnrollmentOps, PortalUrl, Result,
    SeatSnapshot, SectionId, StudentId, TurnId,
};

use crate::endpoints::{self, AddDropResponse, LessonRow, OpenTurnRow};

/// Client for the academic system's course-select operations.
///
/// Owns the [`CasSession`] it is bound to; all requests ride on that
/// session's cookies. Any operation may report an expired session, after
/// which the caller must go through [`EnrollmentOps::relogin`] before
/// issuing further calls, since the student/turn pair can change across
/// selection rounds.
pub struct EnrollmentClient {
    cas: CasSession,
    service: PortalUrl,
    context: Option<EnrollmentContext>,
    referer: Option<String>,
}

impl EnrollmentClient {
    /// Create a client for the service at `service`, bound to `cas`.
    pub fn new(cas: CasSession, service: PortalUrl) -> Self {
        Self {
            cas,
            service,
            context: None,
            referer: None,
        }
    }

    /// The resolved context, if the client is bound.
    pub fn context(&self) -> Option<EnrollmentContext> {
        self.context
    }

    /// Full login chain: portal login, service binding, context resolution.
    ///
    /// Returns `Ok(false)` when the portal rejected the credentials or the
    /// challenge answer — an expected outcome the caller retries.
    #[instrument(skip(self))]
    pub async fn login(&mut self) -> Result<bool> {
        if !self.cas.login().await? {
            return Ok(false);
        }

        let entry = self.service.join(endpoints::SSO_ENTRY);
        if self.cas.binder().bind(&entry).await?.is_none() {
            // A stale ticket can survive the portal's already-authenticated
            // answer; one fresh login gets a ticket the service accepts.
            debug!("service refused the ticket, retrying with a fresh login");
            if !self.cas.login().await? {
                return Ok(false);
            }
            if self.cas.binder().bind(&entry).await?.is_none() {
                return Err(AuthError::SessionExpired.into());
            }
        }

        let context = self.resolve().await?;
        info!(student = %context.student_id, turn = ?context.turn, "enrollment client bound");
        Ok(true)
    }

    /// Resolve the student/turn pair for the current selection round.
    ///
    /// Must be re-run after every re-authentication. No open round is a
    /// no-op state (`turn: None`), not an error.
    #[instrument(skip(self))]
    pub async fn resolve_context(&mut self) -> Result<EnrollmentContext> {
        self.resolve().await
    }

    async fn resolve(&mut self) -> Result<EnrollmentContext> {
        let student_id = self.fetch_student_id().await?;
        let turn = self.fetch_open_turn(student_id).await?;
        let context = EnrollmentContext { student_id, turn };
        self.context = Some(context);
        self.referer = turn.map(|turn| {
            self.service.join(&format!(
                "for-std/course-select/{student_id}/turn/{turn}/select"
            ))
        });
        Ok(context)
    }

    /// The entry page answers with a redirect whose last path segment is
    /// the student id. Landing back on the portal means the binding is
    /// stale.
    async fn fetch_student_id(&self) -> Result<StudentId> {
        let response = self
            .cas
            .http_bare()
            .get(self.service.join(endpoints::COURSE_SELECT))
            .send()
            .await?;

        if !response.status().is_redirection() {
            return Err(ProtocolError::new(
                "course-select entry",
                format!("expected a redirect, got HTTP {}", response.status()),
            )
            .into());
        }
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ProtocolError::new("course-select entry", "redirect without a Location header")
            })?;
        let target = self.absolute(location)?;
        if target.origin() == self.cas.portal().origin() {
            return Err(AuthError::SessionExpired.into());
        }

        let id = target
            .path()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse::<i64>().ok())
            .ok_or_else(|| {
                ProtocolError::new(
                    "course-select entry",
                    format!("no student id in redirect target '{location}'"),
                )
            })?;
        Ok(StudentId(id))
    }

    async fn fetch_open_turn(&self, student_id: StudentId) -> Result<Option<TurnId>> {
        let form = [
            ("studentId", student_id.0.to_string()),
            ("bizTypeId", endpoints::COURSE_SELECT_BIZ_TYPE.to_string()),
        ];
        let response = self
            .decorate(self.cas.http_bare().post(self.service.join(endpoints::OPEN_TURNS)))
            .form(&form)
            .send()
            .await?;
        if response.status().is_redirection() {
            return Err(AuthError::SessionExpired.into());
        }

        let turns: Vec<OpenTurnRow> = response.json().await?;
        if turns.is_empty() {
            debug!("no open selection round");
        }
        Ok(turns.first().map(|turn| TurnId(turn.id)))
    }

    /// Snapshot of every section currently open for adding.
    ///
    /// Availability windows open and close, so the caller refreshes this
    /// periodically and replaces its copy wholesale. With no open round
    /// this is an empty map, without a network call.
    #[instrument(skip(self))]
    pub async fn addable_sections(&mut self) -> Result<HashMap<CourseCode, CourseSection>> {
        let context = self.bound_context()?;
        let Some(turn) = context.turn else {
            return Ok(HashMap::new());
        };

        let form = [
            ("turnId", turn.0.to_string()),
            ("studentId", context.student_id.0.to_string()),
        ];
        let response = self
            .decorate(
                self.cas
                    .http_bare()
                    .post(self.service.join(endpoints::ADDABLE_LESSONS)),
            )
            .form(&form)
            .send()
            .await?;
        if response.status().is_redirection() {
            return Err(AuthError::SessionExpired.into());
        }

        let rows: Vec<LessonRow> = response.json().await?;
        let mut sections = HashMap::with_capacity(rows.len());
        for row in rows {
            let code = CourseCode::new(&row.code)?;
            sections.insert(
                code.clone(),
                CourseSection {
                    code,
                    id: SectionId(row.id),
                    name: row.course.name_zh,
                    seat_limit: row.limit_count,
                },
            );
        }
        debug!(count = sections.len(), "fetched addable sections");
        Ok(sections)
    }

    /// Live enrolled counts for the given sections.
    #[instrument(skip(self, ids), fields(sections = ids.len()))]
    pub async fn seat_counts(&mut self, ids: &[SectionId]) -> Result<SeatSnapshot> {
        let form: Vec<(&str, String)> = ids
            .iter()
            .map(|id| ("lessonIds[]", id.0.to_string()))
            .collect();
        let response = self
            .decorate(self.cas.http_bare().post(self.service.join(endpoints::STD_COUNT)))
            .form(&form)
            .send()
            .await?;
        if response.status().is_redirection() {
            return Err(AuthError::SessionExpired.into());
        }

        let counts: HashMap<String, u32> = response.json().await?;
        let mut snapshot = HashMap::with_capacity(counts.len());
        for (id, count) in counts {
            let id = id.parse::<i64>().map_err(|_| {
                ProtocolError::new("seat counts", format!("non-numeric section id '{id}'"))
            })?;
            snapshot.insert(SectionId(id), count);
        }
        Ok(SeatSnapshot::new(snapshot))
    }

    /// Submit the two-phase add request for one section.
    ///
    /// Phase one posts the add request and yields a request id; phase two
    /// posts the confirmation for that id. The split mirrors the backend's
    /// own design and is preserved deliberately: a failure in phase one
    /// means the request was never registered, while a refusal in phase
    /// two means it was registered and lost (seat claimed by someone
    /// else), which the refusal reason reports.
    #[instrument(skip(self))]
    pub async fn enroll(&mut self, id: SectionId) -> Result<EnrollOutcome> {
        let context = self.bound_context()?;
        let turn = context.turn.ok_or(EnrollError::NoOpenTurn)?;

        let form = [
            ("studentAssoc", context.student_id.0.to_string()),
            ("lessonAssoc", id.0.to_string()),
            ("courseSelectTurnAssoc", turn.0.to_string()),
            ("scheduleGroupAssoc", String::new()),
            ("virtualCost", "0".to_string()),
        ];
        let response = self
            .decorate(self.cas.http_bare().post(self.service.join(endpoints::ADD_REQUEST)))
            .form(&form)
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(%status, "add request rejected");
            return Err(EnrollError::RequestRejected {
                status: status.as_u16(),
            }
            .into());
        }
        let request_id = response.text().await?.trim().to_string();
        if request_id.is_empty() {
            return Err(ProtocolError::new("add request", "empty request id").into());
        }
        debug!(request_id, "add request accepted, confirming");

        let form = [
            ("studentId", context.student_id.0.to_string()),
            ("requestId", request_id.clone()),
        ];
        let response = self
            .decorate(
                self.cas
                    .http_bare()
                    .post(self.service.join(endpoints::ADD_DROP_RESPONSE)),
            )
            .form(&form)
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(%status, request_id, "confirmation rejected");
            return Err(EnrollError::ConfirmationRejected {
                status: status.as_u16(),
            }
            .into());
        }

        let confirmation: AddDropResponse = response.json().await?;
        if confirmation.success {
            info!(section = %id, "enrollment confirmed");
            Ok(EnrollOutcome::Enrolled)
        } else {
            let reason = confirmation
                .error_message
                .map(|message| message.text)
                .unwrap_or_else(|| "no reason given".to_string());
            info!(section = %id, reason, "enrollment refused");
            Ok(EnrollOutcome::Refused { reason })
        }
    }

    fn bound_context(&self) -> Result<EnrollmentContext> {
        self.context.ok_or_else(|| AuthError::NotAuthenticated.into())
    }

    /// Resolve a possibly relative redirect target against the service base.
    fn absolute(&self, location: &str) -> Result<Url> {
        self.service
            .as_url()
            .join(location)
            .map_err(|e| ProtocolError::new("redirect target", e.to_string()).into())
    }

    /// The backend expects XHR-shaped requests with a matching origin and,
    /// once a round is open, the course-select page as referer.
    fn decorate(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let origin = self.service.as_str().trim_end_matches('/').to_string();
        let request = request
            .header("X-Requested-With", "XMLHttpRequest")
            .header(ORIGIN, origin);
        match &self.referer {
            Some(referer) => request.header(REFERER, referer),
            None => request,
        }
    }
}

#[async_trait]
impl EnrollmentOps for EnrollmentClient {
    async fn relogin(&mut self) -> Result<bool> {
        self.login().await
    }

    async fn resolve_context(&mut self) -> Result<EnrollmentContext> {
        self.resolve().await
    }

    async fn addable_sections(&mut self) -> Result<HashMap<CourseCode, CourseSection>> {
        EnrollmentClient::addable_sections(self).await
    }

    async fn seat_counts(&mut self, ids: &[SectionId]) -> Result<SeatSnapshot> {
        EnrollmentClient::seat_counts(self, ids).await
    }

    async fn enroll(&mut self, id: SectionId) -> Result<EnrollOutcome> {
        EnrollmentClient::enroll(self, id).await
    }
}

impl fmt::Debug for EnrollmentClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrollmentClient")
            .field("service", &self.service)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
