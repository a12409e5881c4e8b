use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Months, NaiveDate, Utc};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{AttendanceRecord, AttendanceSession, DayAttendance};
use crate::store::RecordStore;

#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub session: AttendanceSession,
    pub records: Vec<AttendanceRecord>,
    pub total_present: usize,
    pub last_marked_at: Option<DateTime<Utc>>,
    /// The board keeps showing a closed session, flagged instead of hidden.
    pub inactive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardState {
    Loading,
    Loaded(BoardSnapshot),
    Error(String),
}

pub async fn load_board<S: RecordStore>(
    store: &S,
    public_id: &str,
) -> Result<BoardSnapshot, StoreError> {
    let public_id =
        Uuid::parse_str(public_id.trim()).map_err(|_| StoreError::NotFound("attendance session"))?;
    let session = store
        .find_session_by_public_id(public_id)
        .await?
        .ok_or(StoreError::NotFound("attendance session"))?;
    let records = store.list_attendance(session.id).await?;

    Ok(BoardSnapshot {
        inactive: !session.is_active,
        total_present: records.len(),
        last_marked_at: records.last().map(|record| record.marked_at),
        session,
        records,
    })
}

/// Reloads a board on a fixed interval until stopped or dropped.
pub struct BoardPoller {
    state: watch::Receiver<BoardState>,
    refresh: Arc<Notify>,
    task: JoinHandle<()>,
}

impl BoardPoller {
    pub fn spawn<S>(store: S, public_id: String, every: Duration) -> Self
    where
        S: RecordStore + 'static,
    {
        let (tx, rx) = watch::channel(BoardState::Loading);
        let refresh = Arc::new(Notify::new());
        let wake = refresh.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = wake.notified() => {
                        ticker.reset();
                    }
                }

                let next = match load_board(&store, &public_id).await {
                    Ok(snapshot) => {
                        debug!(public_id = %public_id, present = snapshot.total_present, "board refreshed");
                        BoardState::Loaded(snapshot)
                    }
                    Err(err) => {
                        warn!(public_id = %public_id, error = %err, "failed to load attendance board");
                        BoardState::Error(err.to_string())
                    }
                };

                if tx.send(next).is_err() {
                    break;
                }
            }
        });

        info!(every_secs = every.as_secs(), "attendance board polling started");
        Self {
            state: rx,
            refresh,
            task,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<BoardState> {
        self.state.clone()
    }

    /// Reload now instead of waiting for the next tick.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn stop(self) {
        // Drop aborts the task.
    }
}

impl Drop for BoardPoller {
    fn drop(&mut self) {
        self.task.abort();
        debug!("attendance board polling stopped");
    }
}

/// Present counts for every session dated within the month starting at `month_start`.
pub async fn month_attendance<S: RecordStore>(
    store: &S,
    month_start: NaiveDate,
) -> Result<Vec<DayAttendance>, StoreError> {
    let month_end = month_start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(month_start);

    let mut sessions = store.list_sessions_between(month_start, month_end).await?;
    sessions.sort_by(|a, b| a.session_date.cmp(&b.session_date));

    let mut days = Vec::with_capacity(sessions.len());
    for session in sessions {
        let records = store.list_attendance(session.id).await?;
        days.push(DayAttendance {
            date: session.session_date,
            session_id: session.id,
            session_name: session.session_name,
            present_count: records.len(),
        });
    }

    Ok(days)
}
