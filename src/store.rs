use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    ActivenessRecord, Admin, AttendanceRecord, AttendanceSession, Batch, InterviewRound,
    NewActivenessRecord, NewInterviewRound,
};

pub const STATUS_PRESENT: &str = "present";

/// The record store the core issues queries against.
///
/// Inserts that violate a unique constraint must surface as
/// [`StoreError::Conflict`]; the attendance flow relies on it to detect a
/// second submission for the same `(session_id, student_name)` pair.
pub trait RecordStore: Send + Sync {
    fn find_admin(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Admin>, StoreError>> + Send;

    fn insert_admin(
        &self,
        email: &str,
        name: &str,
    ) -> impl Future<Output = Result<Admin, StoreError>> + Send;

    fn insert_batch(&self, name: &str) -> impl Future<Output = Result<Batch, StoreError>> + Send;

    /// Newest first.
    fn list_batches(&self) -> impl Future<Output = Result<Vec<Batch>, StoreError>> + Send;

    fn insert_interview_round(
        &self,
        admin_id: Option<Uuid>,
        round: &NewInterviewRound,
    ) -> impl Future<Output = Result<InterviewRound, StoreError>> + Send;

    /// Newest first.
    fn list_interview_rounds(
        &self,
    ) -> impl Future<Output = Result<Vec<InterviewRound>, StoreError>> + Send;

    fn delete_interview_round(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn insert_activeness(
        &self,
        admin_id: Option<Uuid>,
        record: &NewActivenessRecord,
    ) -> impl Future<Output = Result<ActivenessRecord, StoreError>> + Send;

    /// Highest score first.
    fn list_activeness(
        &self,
    ) -> impl Future<Output = Result<Vec<ActivenessRecord>, StoreError>> + Send;

    fn delete_activeness(&self, id: Uuid) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn insert_session(
        &self,
        session: &AttendanceSession,
    ) -> impl Future<Output = Result<AttendanceSession, StoreError>> + Send;

    fn find_session_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<AttendanceSession>, StoreError>> + Send;

    fn find_session_by_public_id(
        &self,
        public_id: Uuid,
    ) -> impl Future<Output = Result<Option<AttendanceSession>, StoreError>> + Send;

    fn set_session_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Sessions whose `session_date` falls in `start..=end`.
    fn list_sessions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<AttendanceSession>, StoreError>> + Send;

    fn insert_attendance(
        &self,
        session_id: Uuid,
        student_name: &str,
        status: &str,
        marked_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<AttendanceRecord, StoreError>> + Send;

    /// Ordered by `marked_at`, earliest first.
    fn list_attendance(
        &self,
        session_id: Uuid,
    ) -> impl Future<Output = Result<Vec<AttendanceRecord>, StoreError>> + Send;
}
