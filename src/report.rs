use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::metrics;
use crate::models::{ActivenessRecord, InterviewRound};

pub fn build_report(
    generated_at: DateTime<Utc>,
    rounds: &[InterviewRound],
    activeness: &[ActivenessRecord],
    limit: usize,
) -> String {
    let summary = metrics::summarize_batch(rounds);
    let leaderboard = metrics::rank_leaderboard(metrics::aggregate_students(rounds));
    let ranked_activeness = metrics::rank_activeness(activeness.to_vec());
    let activeness_summary = metrics::summarize_activeness(activeness);

    let mut output = String::new();

    let _ = writeln!(output, "# Interview Leaderboard Report");
    let _ = writeln!(
        output,
        "Generated on {}",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Batch Summary");

    if summary.total_interviews == 0 {
        let _ = writeln!(output, "No interview rounds recorded yet.");
    } else {
        let _ = writeln!(output, "- Students: {}", summary.total_students);
        let _ = writeln!(output, "- Interviews: {}", summary.total_interviews);
        let _ = writeln!(output, "- Average score: {:.2}/10", summary.average_score);
        let _ = writeln!(
            output,
            "- Highest individual score: {:.1}/10",
            summary.highest_individual_score
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Leaderboard");

    if leaderboard.is_empty() {
        let _ = writeln!(output, "No students on the leaderboard yet.");
    } else {
        for (rank, student) in leaderboard.iter().take(limit).enumerate() {
            let _ = writeln!(
                output,
                "{}. {} best {:.1}, average {:.2} across {} rounds (last {})",
                rank + 1,
                student.name,
                student.highest_score,
                student.average_score,
                student.interviews_given,
                student.last_interview_date.date_naive()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Zoom Activeness");

    if ranked_activeness.is_empty() {
        let _ = writeln!(output, "No activeness scores recorded yet.");
    } else {
        let _ = writeln!(
            output,
            "{} records, average {:.1}%, {} minutes logged",
            activeness_summary.record_count,
            activeness_summary.average_score,
            activeness_summary.total_minutes
        );
        for record in ranked_activeness.iter().take(limit) {
            let _ = writeln!(
                output,
                "- {}: {:.0}%",
                record.student_name, record.activeness_score
            );
        }
    }

    let mut recent: Vec<&InterviewRound> = rounds
        .iter()
        .filter(|round| round.feedback.is_some())
        .collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Feedback");

    if recent.is_empty() {
        let _ = writeln!(output, "No feedback recorded yet.");
    } else {
        for round in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} (round {}, {:.1}) on {}: {}",
                round.student_name,
                round.round_number,
                round.score,
                round.created_at.date_naive(),
                round.feedback.as_deref().unwrap_or_default()
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap()
    }

    fn round(name: &str, score: f64, feedback: Option<&str>, days_ago: i64) -> InterviewRound {
        InterviewRound {
            id: Uuid::new_v4(),
            student_name: name.to_string(),
            round_number: 1,
            score,
            feedback: feedback.map(str::to_string),
            admin_id: None,
            created_at: generated_at() - Duration::days(days_ago),
        }
    }

    #[test]
    fn empty_report_has_placeholders() {
        let report = build_report(generated_at(), &[], &[], 10);
        assert!(report.contains("Generated on 2026-02-10 12:00 UTC"));
        assert!(report.contains("No interview rounds recorded yet."));
        assert!(report.contains("No activeness scores recorded yet."));
        assert!(report.contains("No feedback recorded yet."));
    }

    #[test]
    fn leaderboard_lists_best_student_first() {
        let rounds = vec![
            round("Avery Lee", 6.0, None, 3),
            round("Kiara Patel", 9.5, Some("Ready for final panel"), 1),
            round("Avery Lee", 8.0, Some("Calmer delivery"), 2),
        ];
        let report = build_report(generated_at(), &rounds, &[], 10);

        assert!(report.contains("- Students: 2"));
        assert!(report.contains("- Average score: 7.83/10"));
        let kiara = report.find("1. Kiara Patel").unwrap();
        let avery = report.find("2. Avery Lee").unwrap();
        assert!(kiara < avery);
        assert!(report.contains("- Kiara Patel (round 1, 9.5) on 2026-02-09: Ready for final panel"));
    }
}
