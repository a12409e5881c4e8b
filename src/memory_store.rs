//! In-process [`RecordStore`] used by the unit tests.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    ActivenessRecord, Admin, AttendanceRecord, AttendanceSession, Batch, InterviewRound,
    NewActivenessRecord, NewInterviewRound,
};
use crate::store::RecordStore;

#[derive(Default)]
struct Tables {
    admins: Vec<Admin>,
    batches: Vec<Batch>,
    rounds: Vec<InterviewRound>,
    activeness: Vec<ActivenessRecord>,
    sessions: Vec<AttendanceSession>,
    attendance: Vec<AttendanceRecord>,
    calls: usize,
    fail_next: bool,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Counts every trait call, so tests can prove a path never touched the store.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// The next call fails with a non-conflict database error.
    pub fn fail_next_call(&self) {
        self.lock().fail_next = true;
    }

    pub fn attendance_rows(&self) -> Vec<AttendanceRecord> {
        self.lock().attendance.clone()
    }

    pub fn put_session(&self, session: AttendanceSession) {
        self.lock().sessions.push(session);
    }

    fn begin(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        let mut tables = self.lock();
        tables.calls += 1;
        if tables.fail_next {
            tables.fail_next = false;
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(tables)
    }
}

impl RecordStore for MemoryStore {
    async fn find_admin(&self, id: Uuid) -> Result<Option<Admin>, StoreError> {
        let tables = self.begin()?;
        Ok(tables.admins.iter().find(|admin| admin.id == id).cloned())
    }

    async fn insert_admin(&self, email: &str, name: &str) -> Result<Admin, StoreError> {
        let mut tables = self.begin()?;
        if tables.admins.iter().any(|admin| admin.email == email) {
            return Err(StoreError::Conflict("admins_email_key".to_string()));
        }
        let admin = Admin {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        tables.admins.push(admin.clone());
        Ok(admin)
    }

    async fn insert_batch(&self, name: &str) -> Result<Batch, StoreError> {
        let mut tables = self.begin()?;
        if tables.batches.iter().any(|batch| batch.name == name) {
            return Err(StoreError::Conflict("batches_name_key".to_string()));
        }
        let batch = Batch {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        tables.batches.push(batch.clone());
        Ok(batch)
    }

    async fn list_batches(&self) -> Result<Vec<Batch>, StoreError> {
        let tables = self.begin()?;
        let mut batches = tables.batches.clone();
        batches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(batches)
    }

    async fn insert_interview_round(
        &self,
        admin_id: Option<Uuid>,
        round: &NewInterviewRound,
    ) -> Result<InterviewRound, StoreError> {
        let mut tables = self.begin()?;
        let row = InterviewRound {
            id: Uuid::new_v4(),
            student_name: round.student_name.clone(),
            round_number: round.round_number,
            score: round.score,
            feedback: round.feedback.clone(),
            admin_id,
            created_at: Utc::now(),
        };
        tables.rounds.push(row.clone());
        Ok(row)
    }

    async fn list_interview_rounds(&self) -> Result<Vec<InterviewRound>, StoreError> {
        let tables = self.begin()?;
        let mut rounds = tables.rounds.clone();
        rounds.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rounds)
    }

    async fn delete_interview_round(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.begin()?;
        let before = tables.rounds.len();
        tables.rounds.retain(|round| round.id != id);
        if tables.rounds.len() == before {
            return Err(StoreError::NotFound("interview round"));
        }
        Ok(())
    }

    async fn insert_activeness(
        &self,
        admin_id: Option<Uuid>,
        record: &NewActivenessRecord,
    ) -> Result<ActivenessRecord, StoreError> {
        let mut tables = self.begin()?;
        let row = ActivenessRecord {
            id: Uuid::new_v4(),
            student_name: record.student_name.clone(),
            activeness_score: record.activeness_score,
            duration_minutes: record.duration_minutes,
            zoom_session_id: record.zoom_session_id.clone(),
            admin_id,
            created_at: Utc::now(),
        };
        tables.activeness.push(row.clone());
        Ok(row)
    }

    async fn list_activeness(&self) -> Result<Vec<ActivenessRecord>, StoreError> {
        let tables = self.begin()?;
        let mut records = tables.activeness.clone();
        records.sort_by(|a, b| {
            b.activeness_score
                .total_cmp(&a.activeness_score)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(records)
    }

    async fn delete_activeness(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.begin()?;
        let before = tables.activeness.len();
        tables.activeness.retain(|record| record.id != id);
        if tables.activeness.len() == before {
            return Err(StoreError::NotFound("activeness record"));
        }
        Ok(())
    }

    async fn insert_session(
        &self,
        session: &AttendanceSession,
    ) -> Result<AttendanceSession, StoreError> {
        let mut tables = self.begin()?;
        if tables.sessions.iter().any(|s| s.public_id == session.public_id) {
            return Err(StoreError::Conflict(
                "attendance_sessions_public_id_key".to_string(),
            ));
        }
        tables.sessions.push(session.clone());
        Ok(session.clone())
    }

    async fn find_session_by_code(
        &self,
        code: &str,
    ) -> Result<Option<AttendanceSession>, StoreError> {
        let tables = self.begin()?;
        Ok(tables
            .sessions
            .iter()
            .filter(|session| session.session_code == code)
            .max_by_key(|session| session.created_at)
            .cloned())
    }

    async fn find_session_by_public_id(
        &self,
        public_id: Uuid,
    ) -> Result<Option<AttendanceSession>, StoreError> {
        let tables = self.begin()?;
        Ok(tables
            .sessions
            .iter()
            .find(|session| session.public_id == public_id)
            .cloned())
    }

    async fn set_session_active(&self, id: Uuid, is_active: bool) -> Result<(), StoreError> {
        let mut tables = self.begin()?;
        let session = tables
            .sessions
            .iter_mut()
            .find(|session| session.id == id)
            .ok_or(StoreError::NotFound("attendance session"))?;
        session.is_active = is_active;
        Ok(())
    }

    async fn list_sessions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceSession>, StoreError> {
        let tables = self.begin()?;
        Ok(tables
            .sessions
            .iter()
            .filter(|session| session.session_date >= start && session.session_date <= end)
            .cloned()
            .collect())
    }

    async fn insert_attendance(
        &self,
        session_id: Uuid,
        student_name: &str,
        status: &str,
        marked_at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, StoreError> {
        // Check and insert happen under one lock, like the table constraint.
        let mut tables = self.begin()?;
        if tables
            .attendance
            .iter()
            .any(|record| record.session_id == session_id && record.student_name == student_name)
        {
            return Err(StoreError::Conflict(
                "attendance_records_session_student_key".to_string(),
            ));
        }
        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            session_id,
            student_name: student_name.to_string(),
            status: status.to_string(),
            marked_at,
        };
        tables.attendance.push(record.clone());
        Ok(record)
    }

    async fn list_attendance(&self, session_id: Uuid) -> Result<Vec<AttendanceRecord>, StoreError> {
        let tables = self.begin()?;
        let mut records: Vec<AttendanceRecord> = tables
            .attendance
            .iter()
            .filter(|record| record.session_id == session_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.marked_at.cmp(&b.marked_at));
        Ok(records)
    }
}
