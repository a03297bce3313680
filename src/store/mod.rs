mod error;
mod mutations;
mod oracles;
mod queries;

pub use error::StoreError;
pub use queries::CenterInfo;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chrono_tz::Tz;
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};

use crate::model::*;
use crate::wal::Wal;

pub type SharedCenterState = Arc<RwLock<CenterState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

type PendingAppend = (Event, oneshot::Sender<io::Result<()>>);

/// Background task that owns the WAL and batches appends for group commit:
/// take the first append, drain whatever else is already queued, then fsync
/// once for the whole batch and answer every sender with the shared result.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        let (event, response) = match cmd {
            WalCommand::Append { event, response } => (event, response),
            other => {
                handle_non_append(&mut wal, other);
                continue;
            }
        };
        let mut batch = vec![(event, response)];
        let mut deferred = None;
        loop {
            match rx.try_recv() {
                Ok(WalCommand::Append { event, response }) => batch.push((event, response)),
                Ok(other) => {
                    deferred = Some(other);
                    break;
                }
                Err(_) => break,
            }
        }

        metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
        let flush_start = std::time::Instant::now();
        let result = flush_batch(&mut wal, &batch);
        metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
            .record(flush_start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            tracing::error!("wal flush of {} events failed: {e}", batch.len());
        }
        for (_, tx) in batch {
            let _ = tx.send(match &result {
                Ok(()) => Ok(()),
                Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
            });
        }

        // Compaction must observe every append queued ahead of it.
        if let Some(cmd) = deferred {
            handle_non_append(&mut wal, cmd);
        }
    }
}

fn flush_batch(wal: &mut Wal, batch: &[PendingAppend]) -> io::Result<()> {
    let appended = batch
        .iter()
        .try_for_each(|(event, _)| wal.append_buffered(event));
    // Flush even after a failed append so half-buffered bytes don't bleed
    // into the next batch.
    let flushed = wal.flush_sync();
    appended.and(flushed)
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { .. } => unreachable!("appends are batched by the writer loop"),
    }
}

/// WAL-backed in-memory store of centers, templates, holidays and sessions.
///
/// Each center's state sits behind its own `RwLock`; writers to one center
/// never wait on another.
pub struct Store {
    pub(super) centers: DashMap<CenterId, SharedCenterState>,
    pub(super) templates: DashMap<TemplateId, Template>,
    pub(super) zone: Tz,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
    /// Serializes center and template creation so id checks and inserts are atomic.
    pub(super) registry_gate: Mutex<()>,
    /// Mutations hold it shared; compaction holds it exclusively. Always taken
    /// before any center lock.
    pub(super) compaction_gate: RwLock<()>,
}

/// Apply a non-create event to a center (caller holds the write lock).
fn apply_to_center(cs: &mut CenterState, event: &Event, templates: &DashMap<TemplateId, Template>) {
    match event {
        Event::TemplateCreated {
            id,
            center_id,
            name,
            description,
            capacity,
        } => {
            templates.insert(
                *id,
                Template {
                    id: *id,
                    center_id: *center_id,
                    name: name.clone(),
                    description: description.clone(),
                    capacity: *capacity,
                },
            );
            cs.template_ids.push(*id);
        }
        Event::HolidayAdded {
            id,
            center_id,
            name,
            start_date,
            end_date,
        } => cs.holidays.push(CenterHoliday {
            id: *id,
            center_id: *center_id,
            name: name.clone(),
            start_date: *start_date,
            end_date: *end_date,
        }),
        Event::SessionScheduled {
            id,
            center_id,
            template_id,
            span,
        } => cs.insert_session(ClassSession {
            id: *id,
            center_id: *center_id,
            template_id: *template_id,
            span: *span,
        }),
        // Handled at the DashMap level
        Event::CenterCreated { .. } => {}
    }
}

impl Store {
    /// Replay the WAL at `wal_path` and start its writer task.
    /// Must be called from within a tokio runtime.
    pub fn open(wal_path: PathBuf, zone: Tz) -> io::Result<Self> {
        let events = Wal::recover(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let store = Self {
            centers: DashMap::new(),
            templates: DashMap::new(),
            zone,
            wal_tx,
            registry_gate: Mutex::new(()),
            compaction_gate: RwLock::new(()),
        };

        // Sole owner of every Arc here, so try_write never contends. Blocking
        // lock calls would panic if this runs inside an async context.
        for event in &events {
            match event {
                Event::CenterCreated { id, name } => {
                    store
                        .centers
                        .entry(*id)
                        .or_insert_with(|| Arc::new(RwLock::new(CenterState::new(*id, name.clone()))));
                }
                other => {
                    let Some(shared) = store.get_center(&other.center_id()) else {
                        tracing::warn!("replay: event for unknown center {}", other.center_id());
                        continue;
                    };
                    match shared.try_write() {
                        Ok(mut guard) => apply_to_center(&mut guard, other, &store.templates),
                        Err(_) => {
                            return Err(io::Error::other("replay: center state unexpectedly locked"));
                        }
                    }
                }
            }
        }

        metrics::gauge!(crate::observability::CENTERS_ACTIVE).set(store.centers.len() as f64);
        tracing::info!(
            "store opened at {}: {} events, {} centers",
            wal_path.display(),
            events.len(),
            store.centers.len()
        );
        Ok(store)
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn get_center(&self, id: &CenterId) -> Option<SharedCenterState> {
        self.centers.get(id).map(|e| e.value().clone())
    }

    /// Write event to WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), StoreError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| StoreError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| StoreError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| StoreError::WalError(e.to_string()))
    }

    /// WAL-append then apply, with the center's write lock held by the caller.
    pub(super) async fn persist_and_apply(
        &self,
        cs: &mut CenterState,
        event: &Event,
    ) -> Result<(), StoreError> {
        self.wal_append(event).await?;
        apply_to_center(cs, event, &self.templates);
        Ok(())
    }
}
