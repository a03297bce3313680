mod error;
mod ports;
pub mod rules;

pub use error::ScheduleError;
pub use ports::{HolidayOracle, NewSession, OverlapOracle, SessionStore, TemplateLookup};

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::config::SchedulingPolicy;
use crate::model::*;
use crate::request::SessionRequest;
use crate::store::{Store, StoreError};

/// The scheduling engine: decides whether a session may be created and, if
/// so, commits it through the session store.
///
/// Decisions for one center run one at a time (per-center async mutex), so
/// the holiday/overlap reads and the final write form a single atomic step
/// for that center. Different centers never contend.
pub struct Engine {
    templates: Arc<dyn TemplateLookup>,
    holidays: Arc<dyn HolidayOracle>,
    overlaps: Arc<dyn OverlapOracle>,
    sessions: Arc<dyn SessionStore>,
    policy: SchedulingPolicy,
    center_locks: DashMap<CenterId, Arc<Mutex<()>>>,
}

impl Engine {
    pub fn new(
        templates: Arc<dyn TemplateLookup>,
        holidays: Arc<dyn HolidayOracle>,
        overlaps: Arc<dyn OverlapOracle>,
        sessions: Arc<dyn SessionStore>,
        policy: SchedulingPolicy,
    ) -> Self {
        Self {
            templates,
            holidays,
            overlaps,
            sessions,
            policy,
            center_locks: DashMap::new(),
        }
    }

    /// Wire every collaborator to the same store. Hours are judged in the
    /// store's zone so they agree with its holiday dates.
    pub fn with_store(store: Arc<Store>, mut policy: SchedulingPolicy) -> Self {
        if policy.zone != store.zone() {
            tracing::warn!(
                "policy zone {} differs from store zone {}, using the store's",
                policy.zone,
                store.zone()
            );
            policy.zone = store.zone();
        }
        Self::new(store.clone(), store.clone(), store.clone(), store, policy)
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    /// Schedule against a single clock reading taken now.
    pub async fn schedule_session(&self, req: SessionRequest) -> Result<ClassSession, ScheduleError> {
        self.schedule_session_at(req, now_ms()).await
    }

    /// Schedule with `now` as the one clock reading for the whole decision.
    pub async fn schedule_session_at(
        &self,
        req: SessionRequest,
        now: Ms,
    ) -> Result<ClassSession, ScheduleError> {
        let started = std::time::Instant::now();
        let result = self.decide_and_commit(req, now).await;
        metrics::histogram!(crate::observability::SCHEDULE_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(session) => {
                metrics::counter!(crate::observability::SESSIONS_SCHEDULED_TOTAL).increment(1);
                tracing::info!(
                    "session {} scheduled at center {} [{}, {})",
                    session.id,
                    session.center_id,
                    session.start(),
                    session.end()
                );
            }
            Err(e) => {
                metrics::counter!(crate::observability::SCHEDULE_REJECTIONS_TOTAL, "reason" => e.kind())
                    .increment(1);
                if e.is_transient() {
                    tracing::warn!("schedule for center {} failed: {e}", req.center_id);
                } else {
                    tracing::debug!("schedule for center {} rejected ({}): {e}", req.center_id, e.kind());
                }
            }
        }
        result
    }

    fn center_lock(&self, center_id: CenterId) -> Arc<Mutex<()>> {
        self.center_locks.entry(center_id).or_default().clone()
    }

    async fn decide_and_commit(
        &self,
        req: SessionRequest,
        now: Ms,
    ) -> Result<ClassSession, ScheduleError> {
        // Static rules need no I/O and no lock.
        let span = rules::validate_interval(req.start, req.end, now, &self.policy)?;

        // Templates are never removed, so ownership can be settled before
        // locking. Unknown centers never get a lock entry.
        if self
            .templates
            .find_template(req.template_id, req.center_id)
            .await?
            .is_none()
        {
            return Err(ScheduleError::TemplateNotFound {
                template_id: req.template_id,
                center_id: req.center_id,
            });
        }

        let lock = self.center_lock(req.center_id);
        let _serial = lock.lock().await;

        if self.holidays.is_holiday(req.center_id, span.start).await? {
            return Err(ScheduleError::HolidayConflict {
                center_id: req.center_id,
            });
        }

        let exclusion = span.padded(self.policy.buffer_ms);
        if self.overlaps.has_overlap(req.center_id, exclusion).await? {
            return Err(ScheduleError::SchedulingConflict {
                center_id: req.center_id,
                existing: None,
            });
        }

        self.sessions
            .create_session(NewSession {
                center_id: req.center_id,
                template_id: req.template_id,
                span,
                exclusion,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(id) => ScheduleError::SchedulingConflict {
                    center_id: req.center_id,
                    existing: Some(id),
                },
                other => ScheduleError::Store(other),
            })
    }
}
