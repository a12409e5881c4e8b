use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One scored interview event for one student.
#[derive(Debug, Clone, PartialEq)]
pub struct InterviewRound {
    pub id: Uuid,
    pub student_name: String,
    pub round_number: i32,
    pub score: f64,
    pub feedback: Option<String>,
    pub admin_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInterviewRound {
    pub student_name: String,
    pub round_number: i32,
    pub score: f64,
    pub feedback: Option<String>,
}

/// Per-student summary, rebuilt from the full round set on every load.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentMetrics {
    pub name: String,
    pub highest_score: f64,
    pub total_score: f64,
    pub average_score: f64,
    pub interviews_given: usize,
    pub last_interview_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchSummary {
    pub total_students: usize,
    pub total_interviews: usize,
    /// Mean over every round, not over per-student averages.
    pub average_score: f64,
    pub highest_individual_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivenessRecord {
    pub id: Uuid,
    pub student_name: String,
    pub activeness_score: f64,
    pub duration_minutes: Option<i32>,
    pub zoom_session_id: Option<String>,
    pub admin_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivenessRecord {
    pub student_name: String,
    pub activeness_score: f64,
    pub duration_minutes: Option<i32>,
    pub zoom_session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivenessSummary {
    pub record_count: usize,
    pub average_score: f64,
    pub total_minutes: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceSession {
    pub id: Uuid,
    pub session_name: String,
    pub session_code: String,
    pub batch_name: Option<String>,
    pub session_date: NaiveDate,
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
    pub public_id: Uuid,
    pub admin_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_name: String,
    pub status: String,
    pub marked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayAttendance {
    pub date: NaiveDate,
    pub session_id: Uuid,
    pub session_name: String,
    pub present_count: usize,
}
