//! The acquisition loop.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use seatwatch_core::{
    CourseCode, CourseSection, EnrollOutcome, EnrollmentOps, Error, Notifier, Result,
    SeatSnapshot, WatchList,
};

/// Tunables of the acquisition loop.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Pause between poll cycles; doubles as the rate limit.
    pub poll_interval: Duration,
    /// Cycles between wholesale refreshes of the section metadata.
    pub refresh_cadence: u32,
    /// Poll and notify, but never submit an add request.
    pub dry_run: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            refresh_cadence: 10,
            dry_run: false,
        }
    }
}

/// Polls seat counts for a watch list and submits the add request the
/// moment a seat opens.
///
/// One task, sequential cycles: each cycle fully completes (poll, decide,
/// act, notify) before the next sleep, so at most one add request per
/// session is ever in flight. A session expiry anywhere in a cycle
/// triggers one re-login + rebind + context-resolve chain and abandons
/// the rest of that cycle, so nothing acts on a stale binding. Shutdown
/// is honored at cycle boundaries only.
pub struct Scheduler {
    ops: Box<dyn EnrollmentOps>,
    notifier: Box<dyn Notifier>,
    watch: WatchList,
    config: SchedulerConfig,
    sections: HashMap<CourseCode, CourseSection>,
    refresh_tick: u32,
    bound: bool,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Scheduler {
    /// Create a scheduler over `ops`, watching `watch`.
    pub fn new(
        ops: Box<dyn EnrollmentOps>,
        notifier: Box<dyn Notifier>,
        watch: WatchList,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            ops,
            notifier,
            watch,
            config,
            sections: HashMap::new(),
            refresh_tick: 0,
            bound: false,
            shutdown: None,
        }
    }

    /// Honor `rx` at cycle boundaries: once it turns true the loop exits
    /// before starting another cycle.
    pub fn with_shutdown(mut self, rx: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(rx);
        self
    }

    /// Run until every watched code is acquired or shutdown is signalled.
    ///
    /// No cycle failure is fatal: errors are logged and the loop sleeps
    /// and retries, since a missed cycle can mean losing a seat for good.
    pub async fn run(mut self) {
        info!(watched = self.watch.len(), "starting acquisition loop");
        loop {
            if self.shutdown_requested() {
                info!("shutdown requested, stopping");
                return;
            }
            if let Err(error) = self.cycle().await {
                warn!(%error, "poll cycle failed, will retry");
            }
            if self.watch.is_empty() {
                info!("watch list drained, all sections acquired");
                return;
            }
            sleep(self.config.poll_interval).await;
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// One poll cycle.
    async fn cycle(&mut self) -> Result<()> {
        debug!(watched = self.watch.len(), "poll cycle");
        if !self.bound {
            return self.recover().await;
        }

        if self.refresh_tick == 0 {
            match self.ops.addable_sections().await {
                Ok(sections) => {
                    debug!(count = sections.len(), "section metadata refreshed");
                    self.sections = sections;
                }
                Err(error) if error.is_session_expired() => return self.expired().await,
                Err(error) => return Err(error),
            }
        }
        self.refresh_tick = (self.refresh_tick + 1) % self.config.refresh_cadence;

        let targets: Vec<CourseSection> = self
            .watch
            .iter()
            .filter_map(|code| self.sections.get(code).cloned())
            .collect();
        if targets.is_empty() {
            debug!("no watched section is currently addable");
            return Ok(());
        }

        let ids: Vec<_> = targets.iter().map(|section| section.id).collect();
        let counts = match self.ops.seat_counts(&ids).await {
            Ok(counts) => counts,
            Err(error) if error.is_session_expired() => return self.expired().await,
            Err(error) => return Err(error),
        };

        for section in &targets {
            self.consider(section, &counts).await?;
        }
        Ok(())
    }

    /// Decide on one watched section given the current snapshot.
    async fn consider(&mut self, section: &CourseSection, counts: &SeatSnapshot) -> Result<()> {
        let Some(count) = counts.count_for(section.id) else {
            debug!(code = %section.code, "no count in this snapshot");
            return Ok(());
        };
        if count >= section.seat_limit {
            debug!(code = %section.code, count, limit = section.seat_limit, "section full");
            return Ok(());
        }

        let headline = format!(
            "{} now available! {} / {}",
            section.headline(),
            count,
            section.seat_limit
        );
        info!(code = %section.code, count, limit = section.seat_limit, "seat open");

        if self.config.dry_run {
            self.notify("Seat open (dry run)", &headline).await;
            return Ok(());
        }

        match self.ops.enroll(section.id).await {
            Ok(EnrollOutcome::Enrolled) => {
                self.watch.resolve(&section.code);
                self.notify("Course select success!", &headline).await;
            }
            Ok(EnrollOutcome::Refused { reason }) => {
                // Seat lost to contention; keep watching
                self.notify("Course select failed.", &format!("{headline}\n{reason}"))
                    .await;
            }
            Err(error @ Error::Enroll(_)) => {
                self.notify("Course select failed.", &format!("{headline}\n{error}"))
                    .await;
            }
            Err(error) => return Err(error),
        }
        Ok(())
    }

    /// Re-authentication path taken on any session-expired outcome.
    async fn expired(&mut self) -> Result<()> {
        info!("session expired, re-authenticating");
        self.bound = false;
        self.recover().await
    }

    async fn recover(&mut self) -> Result<()> {
        if self.ops.relogin().await? {
            self.bound = true;
            // Ids and limits can change across rounds
            self.refresh_tick = 0;
            debug!("session established");
        } else {
            warn!("login rejected, retrying next cycle");
        }
        Ok(())
    }

    async fn notify(&self, title: &str, body: &str) {
        if let Err(error) = self.notifier.notify(title, body).await {
            warn!(%error, "notifier failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use seatwatch_core::error::{AuthError, EnrollError};
    use seatwatch_core::{EnrollmentContext, SectionId, StudentId, TurnId};

    #[derive(Clone, Default)]
    struct CallLog(Arc<Mutex<Vec<String>>>);

    impl CallLog {
        fn push(&self, name: &str) {
            self.0.lock().unwrap().push(name.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct ScriptedOps {
        log: CallLog,
        sections: HashMap<CourseCode, CourseSection>,
        counts: VecDeque<Result<SeatSnapshot>>,
        enrollments: VecDeque<Result<EnrollOutcome>>,
    }

    impl ScriptedOps {
        fn new(log: CallLog, sections: Vec<CourseSection>) -> Self {
            Self {
                log,
                sections: sections
                    .into_iter()
                    .map(|section| (section.code.clone(), section))
                    .collect(),
                counts: VecDeque::new(),
                enrollments: VecDeque::new(),
            }
        }

        fn expect_counts(mut self, result: Result<SeatSnapshot>) -> Self {
            self.counts.push_back(result);
            self
        }

        fn expect_enroll(mut self, result: Result<EnrollOutcome>) -> Self {
            self.enrollments.push_back(result);
            self
        }
    }

    #[async_trait]
    impl EnrollmentOps for ScriptedOps {
        async fn relogin(&mut self) -> Result<bool> {
            self.log.push("relogin");
            Ok(true)
        }

        async fn resolve_context(&mut self) -> Result<EnrollmentContext> {
            self.log.push("resolve_context");
            Ok(EnrollmentContext {
                student_id: StudentId(77),
                turn: Some(TurnId(5)),
            })
        }

        async fn addable_sections(&mut self) -> Result<HashMap<CourseCode, CourseSection>> {
            self.log.push("addable_sections");
            Ok(self.sections.clone())
        }

        async fn seat_counts(&mut self, _ids: &[SectionId]) -> Result<SeatSnapshot> {
            self.log.push("seat_counts");
            self.counts
                .pop_front()
                .unwrap_or_else(|| Ok(SeatSnapshot::default()))
        }

        async fn enroll(&mut self, _id: SectionId) -> Result<EnrollOutcome> {
            self.log.push("enroll");
            self.enrollments
                .pop_front()
                .expect("unexpected enroll call")
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier(Arc<Mutex<Vec<(String, String)>>>);

    impl RecordingNotifier {
        fn events(&self) -> Vec<(String, String)> {
            self.0.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, title: &str, body: &str) -> Result<()> {
            self.0
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn code(s: &str) -> CourseCode {
        CourseCode::new(s).unwrap()
    }

    fn section(code_str: &str, id: i64, name: &str, limit: u32) -> CourseSection {
        CourseSection {
            code: code(code_str),
            id: SectionId(id),
            name: name.to_string(),
            seat_limit: limit,
        }
    }

    fn snapshot(pairs: &[(i64, u32)]) -> SeatSnapshot {
        pairs
            .iter()
            .map(|&(id, count)| (SectionId(id), count))
            .collect()
    }

    fn scheduler(ops: ScriptedOps, notifier: RecordingNotifier, codes: &[&str]) -> Scheduler {
        let watch = WatchList::new(codes.iter().map(|c| code(c)));
        Scheduler::new(
            Box::new(ops),
            Box::new(notifier),
            watch,
            SchedulerConfig::default(),
        )
    }

    #[tokio::test]
    async fn full_section_is_left_watched() {
        let log = CallLog::default();
        let ops = ScriptedOps::new(log.clone(), vec![section("X.01", 1, "Demo Course", 30)])
            .expect_counts(Ok(snapshot(&[(1, 30)])));
        let notifier = RecordingNotifier::default();
        let mut sched = scheduler(ops, notifier.clone(), &["X.01"]);

        sched.cycle().await.unwrap(); // initial login
        sched.cycle().await.unwrap(); // poll: 30/30, no attempt

        assert_eq!(log.calls(), ["relogin", "addable_sections", "seat_counts"]);
        assert!(notifier.events().is_empty());
        assert!(sched.watch.contains(&code("X.01")));
    }

    #[tokio::test]
    async fn open_seat_triggers_single_enrollment_and_resolve() {
        let log = CallLog::default();
        let ops = ScriptedOps::new(log.clone(), vec![section("X.01", 1, "Demo Course", 30)])
            .expect_counts(Ok(snapshot(&[(1, 29)])))
            .expect_enroll(Ok(EnrollOutcome::Enrolled));
        let notifier = RecordingNotifier::default();
        let mut sched = scheduler(ops, notifier.clone(), &["X.01"]);

        sched.cycle().await.unwrap();
        sched.cycle().await.unwrap();

        assert!(sched.watch.is_empty());
        let events = notifier.events();
        assert_eq!(events.len(), 1);
        let (title, body) = &events[0];
        assert_eq!(title, "Course select success!");
        assert!(body.contains("Demo Course (X.01)"));
        assert!(body.contains("29 / 30"));
    }

    #[tokio::test]
    async fn refusal_keeps_watching_and_reports_reason_verbatim() {
        let log = CallLog::default();
        let ops = ScriptedOps::new(log.clone(), vec![section("X.01", 1, "Demo Course", 30)])
            .expect_counts(Ok(snapshot(&[(1, 29)])))
            .expect_enroll(Ok(EnrollOutcome::Refused {
                reason: "already full".to_string(),
            }));
        let notifier = RecordingNotifier::default();
        let mut sched = scheduler(ops, notifier.clone(), &["X.01"]);

        sched.cycle().await.unwrap();
        sched.cycle().await.unwrap();

        assert!(sched.watch.contains(&code("X.01")));
        let events = notifier.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "Course select failed.");
        assert!(events[0].1.contains("already full"));
    }

    #[tokio::test]
    async fn phase_rejection_notifies_and_keeps_watching() {
        let log = CallLog::default();
        let ops = ScriptedOps::new(log.clone(), vec![section("X.01", 1, "Demo Course", 30)])
            .expect_counts(Ok(snapshot(&[(1, 29)])))
            .expect_enroll(Err(EnrollError::RequestRejected { status: 500 }.into()));
        let notifier = RecordingNotifier::default();
        let mut sched = scheduler(ops, notifier.clone(), &["X.01"]);

        sched.cycle().await.unwrap();
        sched.cycle().await.unwrap();

        assert!(sched.watch.contains(&code("X.01")));
        let events = notifier.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "Course select failed.");
        assert!(events[0].1.contains("add request rejected"));
    }

    #[tokio::test]
    async fn expiry_triggers_one_relogin_before_any_further_fetch() {
        let log = CallLog::default();
        let ops = ScriptedOps::new(log.clone(), vec![section("X.01", 1, "Demo Course", 30)])
            .expect_counts(Err(AuthError::SessionExpired.into()))
            .expect_counts(Ok(snapshot(&[(1, 30)])));
        let notifier = RecordingNotifier::default();
        let mut sched = scheduler(ops, notifier.clone(), &["X.01"]);

        sched.cycle().await.unwrap(); // initial login
        sched.cycle().await.unwrap(); // fetch expires, recovery runs
        sched.cycle().await.unwrap(); // next cycle fetches again

        assert_eq!(
            log.calls(),
            [
                "relogin",
                "addable_sections",
                "seat_counts",
                "relogin",
                "addable_sections",
                "seat_counts",
            ]
        );
    }

    #[tokio::test]
    async fn metadata_refresh_follows_the_cadence() {
        let log = CallLog::default();
        let ops = ScriptedOps::new(log.clone(), vec![section("X.01", 1, "Demo Course", 30)]);
        let notifier = RecordingNotifier::default();
        let watch = WatchList::new([code("X.01")]);
        let mut sched = Scheduler::new(
            Box::new(ops),
            Box::new(notifier),
            watch,
            SchedulerConfig {
                refresh_cadence: 2,
                ..SchedulerConfig::default()
            },
        );

        sched.cycle().await.unwrap(); // login
        for _ in 0..4 {
            sched.cycle().await.unwrap();
        }

        let refreshes = log
            .calls()
            .iter()
            .filter(|call| *call == "addable_sections")
            .count();
        // Cadence 2 over four poll cycles: refresh on the first and third
        assert_eq!(refreshes, 2);
    }

    #[tokio::test]
    async fn dry_run_notifies_but_never_enrolls() {
        let log = CallLog::default();
        let ops = ScriptedOps::new(log.clone(), vec![section("X.01", 1, "Demo Course", 30)])
            .expect_counts(Ok(snapshot(&[(1, 29)])));
        let notifier = RecordingNotifier::default();
        let watch = WatchList::new([code("X.01")]);
        let mut sched = Scheduler::new(
            Box::new(ops),
            Box::new(notifier.clone()),
            watch,
            SchedulerConfig {
                dry_run: true,
                ..SchedulerConfig::default()
            },
        );

        sched.cycle().await.unwrap();
        sched.cycle().await.unwrap();

        assert!(!log.calls().contains(&"enroll".to_string()));
        assert!(sched.watch.contains(&code("X.01")));
        let events = notifier.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "Seat open (dry run)");
    }

    #[tokio::test(start_paused = true)]
    async fn run_terminates_when_watch_list_drains() {
        let log = CallLog::default();
        let ops = ScriptedOps::new(log.clone(), vec![section("X.01", 1, "Demo Course", 30)])
            .expect_counts(Ok(snapshot(&[(1, 29)])))
            .expect_enroll(Ok(EnrollOutcome::Enrolled));
        let notifier = RecordingNotifier::default();
        let sched = scheduler(ops, notifier.clone(), &["X.01"]);

        sched.run().await;

        assert_eq!(notifier.events().len(), 1);
        assert!(log.calls().contains(&"enroll".to_string()));
    }

    #[tokio::test]
    async fn shutdown_is_honored_at_cycle_boundaries() {
        let log = CallLog::default();
        let ops = ScriptedOps::new(log.clone(), vec![]);
        let notifier = RecordingNotifier::default();
        let (tx, rx) = watch::channel(true);
        let sched = scheduler(ops, notifier, &["X.01"]).with_shutdown(rx);

        sched.run().await;
        drop(tx);

        assert!(log.calls().is_empty());
    }
}
