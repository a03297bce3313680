use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{oneshot, RwLock};
use ulid::Ulid;

use crate::engine::NewSession;
use crate::limits::*;
use crate::model::*;

use super::{Store, StoreError, WalCommand};

fn check_len(value: &str, min: usize, max: usize, what: &'static str) -> Result<(), StoreError> {
    let n = value.chars().count();
    if n < min {
        return Err(StoreError::InvalidInput(what));
    }
    if n > max {
        return Err(StoreError::LimitExceeded(what));
    }
    Ok(())
}

impl Store {
    pub async fn create_center(&self, id: CenterId, name: String) -> Result<(), StoreError> {
        self.register_center(id, name, MAX_CENTERS).await
    }

    /// `create_center` with an explicit cap on the number of centers.
    pub(super) async fn register_center(
        &self,
        id: CenterId,
        name: String,
        max_centers: usize,
    ) -> Result<(), StoreError> {
        check_len(&name, 1, MAX_CENTER_NAME_LEN, "center name length")?;
        let _gate = self.registry_gate.lock().await;
        let _compaction = self.compaction_gate.read().await;
        if self.centers.contains_key(&id) {
            return Err(StoreError::CenterExists(id));
        }
        if self.centers.len() >= max_centers {
            return Err(StoreError::LimitExceeded("too many centers"));
        }

        let event = Event::CenterCreated { id, name: name.clone() };
        self.wal_append(&event).await?;
        self.centers
            .insert(id, Arc::new(RwLock::new(CenterState::new(id, name))));
        metrics::gauge!(crate::observability::CENTERS_ACTIVE).set(self.centers.len() as f64);
        tracing::info!("center {id} created");
        Ok(())
    }

    pub async fn create_template(
        &self,
        id: TemplateId,
        center_id: CenterId,
        name: String,
        description: Option<String>,
        capacity: u32,
    ) -> Result<Template, StoreError> {
        check_len(&name, MIN_TEMPLATE_NAME_LEN, MAX_TEMPLATE_NAME_LEN, "template name length")?;
        if let Some(d) = &description {
            check_len(
                d,
                MIN_TEMPLATE_DESCRIPTION_LEN,
                MAX_TEMPLATE_DESCRIPTION_LEN,
                "template description length",
            )?;
        }
        if !(MIN_TEMPLATE_CAPACITY..=MAX_TEMPLATE_CAPACITY).contains(&capacity) {
            return Err(StoreError::InvalidInput("template capacity must be 1..=50"));
        }

        let _gate = self.registry_gate.lock().await;
        let _compaction = self.compaction_gate.read().await;
        let shared = self
            .get_center(&center_id)
            .ok_or(StoreError::CenterNotFound(center_id))?;
        let mut guard = shared.write().await;
        if guard.template_ids.len() >= MAX_TEMPLATES_PER_CENTER {
            return Err(StoreError::LimitExceeded("too many templates on center"));
        }
        if self.templates.contains_key(&id) {
            return Err(StoreError::TemplateExists(id));
        }

        let event = Event::TemplateCreated {
            id,
            center_id,
            name: name.clone(),
            description: description.clone(),
            capacity,
        };
        self.persist_and_apply(&mut guard, &event).await?;
        tracing::info!("template {id} created on center {center_id}");
        Ok(Template {
            id,
            center_id,
            name,
            description,
            capacity,
        })
    }

    /// Record a blackout range. Overlapping ranges are fine; an exact
    /// duplicate of an existing range is refused.
    pub async fn add_holiday(
        &self,
        center_id: CenterId,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<CenterHoliday, StoreError> {
        check_len(&name, MIN_HOLIDAY_NAME_LEN, MAX_HOLIDAY_NAME_LEN, "holiday name length")?;
        if start_date > end_date {
            return Err(StoreError::InvalidInput("holiday start date after end date"));
        }

        let _compaction = self.compaction_gate.read().await;
        let shared = self
            .get_center(&center_id)
            .ok_or(StoreError::CenterNotFound(center_id))?;
        let mut guard = shared.write().await;
        if guard.holidays.len() >= MAX_HOLIDAYS_PER_CENTER {
            return Err(StoreError::LimitExceeded("too many holidays on center"));
        }
        if let Some(existing) = guard
            .holidays
            .iter()
            .find(|h| h.start_date == start_date && h.end_date == end_date)
        {
            return Err(StoreError::HolidayExists(existing.id));
        }

        let id = Ulid::new();
        let event = Event::HolidayAdded {
            id,
            center_id,
            name: name.clone(),
            start_date,
            end_date,
        };
        self.persist_and_apply(&mut guard, &event).await?;
        tracing::info!("holiday {id} ({start_date}..={end_date}) added to center {center_id}");
        Ok(CenterHoliday {
            id,
            center_id,
            name,
            start_date,
            end_date,
        })
    }

    /// Guarded insert: re-checks `exclusion` under the center's write lock so a
    /// racing writer that slipped past the engine's checks fails here instead.
    pub async fn insert_session(&self, new: NewSession) -> Result<ClassSession, StoreError> {
        let _compaction = self.compaction_gate.read().await;
        let shared = self
            .get_center(&new.center_id)
            .ok_or(StoreError::CenterNotFound(new.center_id))?;
        let mut guard = shared.write().await;
        if guard.sessions.len() >= MAX_SESSIONS_PER_CENTER {
            return Err(StoreError::LimitExceeded("too many sessions on center"));
        }
        if let Some(existing) = guard.overlapping(&new.exclusion).next() {
            return Err(StoreError::Conflict(existing.id));
        }

        let id = Ulid::new();
        let event = Event::SessionScheduled {
            id,
            center_id: new.center_id,
            template_id: new.template_id,
            span: new.span,
        };
        self.persist_and_apply(&mut guard, &event).await?;
        Ok(ClassSession {
            id,
            center_id: new.center_id,
            template_id: new.template_id,
            span: new.span,
        })
    }

    /// Rewrite the WAL with only the events needed to recreate the current state.
    pub async fn compact_wal(&self) -> Result<(), StoreError> {
        // No mutation may land between the snapshot and the swap.
        let _compaction = self.compaction_gate.write().await;
        let mut events = Vec::new();
        let mut center_ids: Vec<CenterId> = self.centers.iter().map(|e| *e.key()).collect();
        center_ids.sort_unstable();

        for id in center_ids {
            let Some(shared) = self.get_center(&id) else { continue };
            let guard = shared.read().await;
            events.push(Event::CenterCreated {
                id: guard.id,
                name: guard.name.clone(),
            });
            for tid in &guard.template_ids {
                if let Some(t) = self.templates.get(tid) {
                    events.push(Event::TemplateCreated {
                        id: t.id,
                        center_id: t.center_id,
                        name: t.name.clone(),
                        description: t.description.clone(),
                        capacity: t.capacity,
                    });
                }
            }
            events.extend(guard.holidays.iter().map(|h| Event::HolidayAdded {
                id: h.id,
                center_id: h.center_id,
                name: h.name.clone(),
                start_date: h.start_date,
                end_date: h.end_date,
            }));
            events.extend(guard.sessions.iter().map(|s| Event::SessionScheduled {
                id: s.id,
                center_id: s.center_id,
                template_id: s.template_id,
                span: s.span,
            }));
        }

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact { events, response: tx })
            .await
            .map_err(|_| StoreError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| StoreError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| StoreError::WalError(e.to_string()))
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
