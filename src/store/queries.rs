use crate::model::*;

use super::{Store, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CenterInfo {
    pub id: CenterId,
    pub name: String,
    pub session_count: usize,
    pub holiday_count: usize,
    pub template_count: usize,
}

impl Store {
    pub async fn list_centers(&self) -> Vec<CenterInfo> {
        let shared: Vec<_> = self.centers.iter().map(|e| e.value().clone()).collect();
        let mut out = Vec::with_capacity(shared.len());
        for cs in shared {
            let guard = cs.read().await;
            out.push(CenterInfo {
                id: guard.id,
                name: guard.name.clone(),
                session_count: guard.sessions.len(),
                holiday_count: guard.holidays.len(),
                template_count: guard.template_ids.len(),
            });
        }
        out.sort_by_key(|c| c.id);
        out
    }

    /// Template by id, only if owned by `center_id`.
    pub fn template_for_center(&self, template_id: TemplateId, center_id: CenterId) -> Option<Template> {
        self.templates
            .get(&template_id)
            .filter(|t| t.center_id == center_id)
            .map(|t| t.value().clone())
    }

    pub async fn list_templates(&self, center_id: CenterId) -> Result<Vec<Template>, StoreError> {
        let shared = self
            .get_center(&center_id)
            .ok_or(StoreError::CenterNotFound(center_id))?;
        let guard = shared.read().await;
        Ok(guard
            .template_ids
            .iter()
            .filter_map(|id| self.templates.get(id).map(|t| t.value().clone()))
            .collect())
    }

    pub async fn list_holidays(&self, center_id: CenterId) -> Result<Vec<CenterHoliday>, StoreError> {
        let shared = self
            .get_center(&center_id)
            .ok_or(StoreError::CenterNotFound(center_id))?;
        let mut holidays = shared.read().await.holidays.clone();
        holidays.sort_by_key(|h| (h.start_date, h.end_date));
        Ok(holidays)
    }

    /// All sessions at the center, by start.
    pub async fn list_sessions(&self, center_id: CenterId) -> Result<Vec<ClassSession>, StoreError> {
        let shared = self
            .get_center(&center_id)
            .ok_or(StoreError::CenterNotFound(center_id))?;
        let sessions = shared.read().await.sessions.clone();
        Ok(sessions)
    }

    /// Sessions starting at or after `now`, by start.
    pub async fn list_upcoming_sessions(
        &self,
        center_id: CenterId,
        now: Ms,
    ) -> Result<Vec<ClassSession>, StoreError> {
        let shared = self
            .get_center(&center_id)
            .ok_or(StoreError::CenterNotFound(center_id))?;
        let guard = shared.read().await;
        let from = guard.sessions.partition_point(|s| s.span.start < now);
        Ok(guard.sessions[from..].to_vec())
    }

    /// Blackout range covering the local date of `at`, if any. Unknown centers have none.
    pub async fn holiday_at(&self, center_id: CenterId, at: Ms) -> Option<CenterHoliday> {
        let date = to_local(at, self.zone)?.date_naive();
        let shared = self.get_center(&center_id)?;
        let guard = shared.read().await;
        guard.holiday_on(date).cloned()
    }

    /// First session at the center intersecting `span`. Unknown centers have none.
    pub async fn first_overlap(&self, center_id: CenterId, span: &Span) -> Option<ClassSession> {
        let shared = self.get_center(&center_id)?;
        let guard = shared.read().await;
        guard.overlapping(span).next().cloned()
    }
}
