use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    ActivenessRecord, Admin, AttendanceRecord, AttendanceSession, Batch, InterviewRound,
    NewActivenessRecord, NewInterviewRound,
};
use crate::store::{RecordStore, STATUS_PRESENT};
use crate::validate;

pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// [`RecordStore`] over the `scoreboard` Postgres schema.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SESSION_COLUMNS: &str = "id, session_name, session_code, batch_name, session_date, \
     is_active, expires_at, public_id, admin_id, created_at";

fn admin_from_row(row: &PgRow) -> Admin {
    Admin {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

fn round_from_row(row: &PgRow) -> InterviewRound {
    InterviewRound {
        id: row.get("id"),
        student_name: row.get("student_name"),
        round_number: row.get("round_number"),
        score: row.get("score"),
        feedback: row.get("feedback"),
        admin_id: row.get("admin_id"),
        created_at: row.get("created_at"),
    }
}

fn activeness_from_row(row: &PgRow) -> ActivenessRecord {
    ActivenessRecord {
        id: row.get("id"),
        student_name: row.get("student_name"),
        activeness_score: row.get("activeness_score"),
        duration_minutes: row.get("duration_minutes"),
        zoom_session_id: row.get("zoom_session_id"),
        admin_id: row.get("admin_id"),
        created_at: row.get("created_at"),
    }
}

fn session_from_row(row: &PgRow) -> AttendanceSession {
    AttendanceSession {
        id: row.get("id"),
        session_name: row.get("session_name"),
        session_code: row.get("session_code"),
        batch_name: row.get("batch_name"),
        session_date: row.get("session_date"),
        is_active: row.get("is_active"),
        expires_at: row.get("expires_at"),
        public_id: row.get("public_id"),
        admin_id: row.get("admin_id"),
        created_at: row.get("created_at"),
    }
}

fn attendance_from_row(row: &PgRow) -> AttendanceRecord {
    AttendanceRecord {
        id: row.get("id"),
        session_id: row.get("session_id"),
        student_name: row.get("student_name"),
        status: row.get("status"),
        marked_at: row.get("marked_at"),
    }
}

impl RecordStore for PgStore {
    async fn find_admin(&self, id: Uuid) -> Result<Option<Admin>, StoreError> {
        let row = sqlx::query(
            "SELECT id, email, name, created_at FROM scoreboard.admins WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(admin_from_row))
    }

    async fn insert_admin(&self, email: &str, name: &str) -> Result<Admin, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO scoreboard.admins (id, email, name)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(admin_from_row(&row))
    }

    async fn insert_batch(&self, name: &str) -> Result<Batch, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO scoreboard.batches (id, name)
            VALUES ($1, $2)
            RETURNING id, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(Batch {
            id: row.get("id"),
            name: row.get("name"),
            created_at: row.get("created_at"),
        })
    }

    async fn list_batches(&self) -> Result<Vec<Batch>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, created_at FROM scoreboard.batches ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|row| Batch {
                id: row.get("id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn insert_interview_round(
        &self,
        admin_id: Option<Uuid>,
        round: &NewInterviewRound,
    ) -> Result<InterviewRound, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO scoreboard.interview_rounds
            (id, student_name, round_number, score, feedback, admin_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, student_name, round_number, score, feedback, admin_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&round.student_name)
        .bind(round.round_number)
        .bind(round.score)
        .bind(&round.feedback)
        .bind(admin_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(round_from_row(&row))
    }

    async fn list_interview_rounds(&self) -> Result<Vec<InterviewRound>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, student_name, round_number, score, feedback, admin_id, created_at \
             FROM scoreboard.interview_rounds ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(round_from_row).collect())
    }

    async fn delete_interview_round(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM scoreboard.interview_rounds WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("interview round"));
        }
        Ok(())
    }

    async fn insert_activeness(
        &self,
        admin_id: Option<Uuid>,
        record: &NewActivenessRecord,
    ) -> Result<ActivenessRecord, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO scoreboard.activeness_records
            (id, student_name, activeness_score, duration_minutes, zoom_session_id, admin_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, student_name, activeness_score, duration_minutes,
                      zoom_session_id, admin_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.student_name)
        .bind(record.activeness_score)
        .bind(record.duration_minutes)
        .bind(&record.zoom_session_id)
        .bind(admin_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(activeness_from_row(&row))
    }

    async fn list_activeness(&self) -> Result<Vec<ActivenessRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, student_name, activeness_score, duration_minutes, zoom_session_id, \
             admin_id, created_at \
             FROM scoreboard.activeness_records ORDER BY activeness_score DESC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(activeness_from_row).collect())
    }

    async fn delete_activeness(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM scoreboard.activeness_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("activeness record"));
        }
        Ok(())
    }

    async fn insert_session(
        &self,
        session: &AttendanceSession,
    ) -> Result<AttendanceSession, StoreError> {
        let query = format!(
            "INSERT INTO scoreboard.attendance_sessions ({SESSION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {SESSION_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(session.id)
            .bind(&session.session_name)
            .bind(&session.session_code)
            .bind(&session.batch_name)
            .bind(session.session_date)
            .bind(session.is_active)
            .bind(session.expires_at)
            .bind(session.public_id)
            .bind(session.admin_id)
            .bind(session.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(session_from_row(&row))
    }

    async fn find_session_by_code(
        &self,
        code: &str,
    ) -> Result<Option<AttendanceSession>, StoreError> {
        // Codes are not unique; the newest session wins.
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM scoreboard.attendance_sessions \
             WHERE session_code = $1 ORDER BY created_at DESC LIMIT 1"
        );
        let row = sqlx::query(&query)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(session_from_row))
    }

    async fn find_session_by_public_id(
        &self,
        public_id: Uuid,
    ) -> Result<Option<AttendanceSession>, StoreError> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM scoreboard.attendance_sessions WHERE public_id = $1"
        );
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(session_from_row))
    }

    async fn set_session_active(&self, id: Uuid, is_active: bool) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE scoreboard.attendance_sessions SET is_active = $2 WHERE id = $1")
                .bind(id)
                .bind(is_active)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("attendance session"));
        }
        Ok(())
    }

    async fn list_sessions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceSession>, StoreError> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM scoreboard.attendance_sessions \
             WHERE session_date >= $1 AND session_date <= $2 ORDER BY session_date"
        );
        let rows = sqlx::query(&query)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(session_from_row).collect())
    }

    async fn insert_attendance(
        &self,
        session_id: Uuid,
        student_name: &str,
        status: &str,
        marked_at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO scoreboard.attendance_records
            (id, session_id, student_name, status, marked_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, session_id, student_name, status, marked_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .bind(student_name)
        .bind(status)
        .bind(marked_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(attendance_from_row(&row))
    }

    async fn list_attendance(&self, session_id: Uuid) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, session_id, student_name, status, marked_at \
             FROM scoreboard.attendance_records WHERE session_id = $1 ORDER BY marked_at ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(attendance_from_row).collect())
    }
}

pub async fn seed(store: &PgStore, admin_id: Option<Uuid>) -> anyhow::Result<()> {
    for batch in ["2025", "2026"] {
        match store.insert_batch(batch).await {
            Ok(_) | Err(StoreError::Conflict(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }

    let rounds = vec![
        ("Avery Lee", 1, 6.5, Some("Clear structure, rushed the close")),
        ("Avery Lee", 2, 8.0, Some("Much calmer delivery")),
        ("Jules Moreno", 1, 7.0, None),
        ("Kiara Patel", 1, 9.0, Some("Strong technical answers")),
        ("Kiara Patel", 2, 8.5, None),
        ("Kiara Patel", 3, 9.5, Some("Ready for final panel")),
    ];

    for (name, round_number, score, feedback) in rounds {
        store
            .insert_interview_round(
                admin_id,
                &NewInterviewRound {
                    student_name: name.to_string(),
                    round_number,
                    score,
                    feedback: feedback.map(str::to_string),
                },
            )
            .await?;
    }

    let activeness = vec![
        ("Avery Lee", 72.0, Some(55), Some("zoom-2026-02-02")),
        ("Jules Moreno", 48.0, Some(30), Some("zoom-2026-02-02")),
        ("Kiara Patel", 91.0, Some(60), None),
    ];

    for (name, score, minutes, zoom_session_id) in activeness {
        store
            .insert_activeness(
                admin_id,
                &NewActivenessRecord {
                    student_name: name.to_string(),
                    activeness_score: score,
                    duration_minutes: minutes,
                    zoom_session_id: zoom_session_id.map(str::to_string),
                },
            )
            .await?;
    }

    let now = Utc::now();
    let session = AttendanceSession {
        id: Uuid::new_v4(),
        session_name: "Seed standup".to_string(),
        session_code: "seed0001".to_string(),
        batch_name: Some("2026".to_string()),
        session_date: now.date_naive(),
        is_active: true,
        expires_at: now + Duration::hours(2),
        public_id: Uuid::new_v4(),
        admin_id,
        created_at: now,
    };
    let session = store.insert_session(&session).await?;

    for (name, minutes_ago) in [("Avery Lee", 12), ("Kiara Patel", 4)] {
        match store
            .insert_attendance(
                session.id,
                name,
                STATUS_PRESENT,
                now - Duration::minutes(minutes_ago),
            )
            .await
        {
            Ok(_) | Err(StoreError::Conflict(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }

    info!(public_id = %session.public_id, "seed attendance session created");
    Ok(())
}

/// Bulk-loads interview rounds. Every row passes the same checks as a single
/// entry; the first invalid row aborts the import.
pub async fn import_rounds_csv(
    store: &PgStore,
    admin_id: Option<Uuid>,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        student_name: String,
        round_number: i32,
        score: f64,
        feedback: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let round = validate::interview_round(NewInterviewRound {
            student_name: row.student_name,
            round_number: row.round_number,
            score: row.score,
            feedback: row.feedback,
        })
        .with_context(|| format!("invalid row {} in {}", line + 1, csv_path.display()))?;

        store.insert_interview_round(admin_id, &round).await?;
        inserted += 1;
    }

    Ok(inserted)
}
