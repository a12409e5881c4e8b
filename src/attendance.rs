use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{AttendanceError, StoreError, ValidationError};
use crate::models::{AttendanceRecord, AttendanceSession};
use crate::store::{RecordStore, STATUS_PRESENT};
use crate::validate;

pub const SESSION_CODE_LEN: usize = 8;
const CODE_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// How a public page addresses a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    Code(String),
    PublicId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    NotFound,
    Inactive,
    Expired,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnavailableReason::NotFound => "attendance session not found",
            UnavailableReason::Inactive => "this attendance session is no longer active",
            UnavailableReason::Expired => "this attendance session has expired",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Unresolved,
    Open(AttendanceSession),
    /// Terminal. `marked_at` is only known when this client recorded the row.
    AlreadyMarked {
        session: AttendanceSession,
        marked_at: Option<DateTime<Utc>>,
    },
    /// Terminal.
    Unavailable(UnavailableReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Recorded(AttendanceRecord),
    AlreadyMarked,
}

/// Checks a fetched session against the clock. Expiry wins over the active flag.
pub fn classify_session(
    session: &AttendanceSession,
    now: DateTime<Utc>,
) -> Option<UnavailableReason> {
    if session.expires_at <= now {
        Some(UnavailableReason::Expired)
    } else if !session.is_active {
        Some(UnavailableReason::Inactive)
    } else {
        None
    }
}

/// One page load of the public attendance form.
pub struct AttendanceFlow<'a, S> {
    store: &'a S,
    state: FlowState,
}

impl<'a, S: RecordStore> AttendanceFlow<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            state: FlowState::Unresolved,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Fetches the session and moves to `Open` or `Unavailable`.
    ///
    /// A store failure leaves the flow `Unresolved` so the lookup can be retried.
    pub async fn resolve(
        &mut self,
        lookup: &SessionLookup,
        now: DateTime<Utc>,
    ) -> Result<&FlowState, StoreError> {
        let session = match lookup {
            SessionLookup::Code(code) => self.store.find_session_by_code(code.trim()).await?,
            SessionLookup::PublicId(raw) => match Uuid::parse_str(raw.trim()) {
                Ok(public_id) => self.store.find_session_by_public_id(public_id).await?,
                Err(_) => None,
            },
        };

        self.state = match session {
            None => FlowState::Unavailable(UnavailableReason::NotFound),
            Some(session) => match classify_session(&session, now) {
                Some(reason) => FlowState::Unavailable(reason),
                None => FlowState::Open(session),
            },
        };

        match &self.state {
            FlowState::Open(session) => {
                info!(session_id = %session.id, code = %session.session_code, "attendance session open")
            }
            FlowState::Unavailable(reason) => warn!(?lookup, %reason, "attendance session unavailable"),
            _ => {}
        }

        Ok(&self.state)
    }

    /// Records the student as present.
    ///
    /// A uniqueness conflict from the store is the expected answer to a repeat
    /// submission and yields [`SubmitOutcome::AlreadyMarked`].
    pub async fn submit(
        &mut self,
        student_name: &str,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, AttendanceError> {
        let session = match &self.state {
            FlowState::Open(session) => session.clone(),
            _ => return Err(AttendanceError::NotOpen),
        };
        let name = validate::student_name(student_name)?;

        match self
            .store
            .insert_attendance(session.id, &name, STATUS_PRESENT, now)
            .await
        {
            Ok(record) => {
                info!(session_id = %session.id, student = %name, "attendance marked");
                self.state = FlowState::AlreadyMarked {
                    session,
                    marked_at: Some(record.marked_at),
                };
                Ok(SubmitOutcome::Recorded(record))
            }
            Err(err) if err.is_conflict() => {
                warn!(session_id = %session.id, student = %name, "attendance already marked");
                self.state = FlowState::AlreadyMarked {
                    session,
                    marked_at: None,
                };
                Ok(SubmitOutcome::AlreadyMarked)
            }
            Err(err) => {
                error!(session_id = %session.id, error = %err, "failed to mark attendance");
                Err(err.into())
            }
        }
    }
}

/// Eight characters from `[0-9a-z]`. Uniqueness is left to chance.
pub fn generate_session_code() -> String {
    let mut bits = Uuid::new_v4().as_u128();
    let mut code = String::with_capacity(SESSION_CODE_LEN);
    for _ in 0..SESSION_CODE_LEN {
        code.push(CODE_ALPHABET[(bits % 36) as usize] as char);
        bits /= 36;
    }
    code
}

#[derive(Debug, Clone)]
pub struct OpenSessionParams {
    pub session_name: String,
    pub batch_name: Option<String>,
    pub session_date: NaiveDate,
    pub ttl: Duration,
}

pub async fn open_session<S: RecordStore>(
    store: &S,
    admin_id: Option<Uuid>,
    params: OpenSessionParams,
    now: DateTime<Utc>,
) -> Result<AttendanceSession, AttendanceError> {
    let out_of_range = ValidationError::TtlOutOfRange {
        minutes: params.ttl.num_minutes(),
    };
    if params.ttl <= Duration::zero() {
        return Err(out_of_range.into());
    }
    let expires_at = now.checked_add_signed(params.ttl).ok_or(out_of_range)?;

    let session = AttendanceSession {
        id: Uuid::new_v4(),
        session_name: params.session_name,
        session_code: generate_session_code(),
        batch_name: params.batch_name,
        session_date: params.session_date,
        is_active: true,
        expires_at,
        public_id: Uuid::new_v4(),
        admin_id,
        created_at: now,
    };

    let session = store.insert_session(&session).await?;
    info!(
        session_id = %session.id,
        code = %session.session_code,
        expires_at = %session.expires_at,
        "attendance session opened"
    );
    Ok(session)
}

pub async fn close_session<S: RecordStore>(store: &S, session_id: Uuid) -> Result<(), StoreError> {
    store.set_session_active(session_id, false).await?;
    info!(%session_id, "attendance session closed");
    Ok(())
}
