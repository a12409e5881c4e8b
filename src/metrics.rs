use std::collections::{HashMap, HashSet};

use crate::models::{
    ActivenessRecord, ActivenessSummary, BatchSummary, InterviewRound, StudentMetrics,
};

/// Groups rounds by the raw `student_name` string and summarizes each group.
///
/// Names are compared exactly, with no trimming or case folding. Output
/// follows the order in which each name first appears in `rounds`.
pub fn aggregate_students(rounds: &[InterviewRound]) -> Vec<StudentMetrics> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut metrics: Vec<StudentMetrics> = Vec::new();

    for round in rounds {
        match index.get(round.student_name.as_str()) {
            Some(&slot) => {
                let entry = &mut metrics[slot];
                entry.highest_score = entry.highest_score.max(round.score);
                entry.total_score += round.score;
                entry.interviews_given += 1;
                if round.created_at > entry.last_interview_date {
                    entry.last_interview_date = round.created_at;
                }
            }
            None => {
                index.insert(round.student_name.as_str(), metrics.len());
                metrics.push(StudentMetrics {
                    name: round.student_name.clone(),
                    highest_score: round.score,
                    total_score: round.score,
                    average_score: 0.0,
                    interviews_given: 1,
                    last_interview_date: round.created_at,
                });
            }
        }
    }

    // A group only exists once it has a round, so the count is never zero.
    for entry in metrics.iter_mut() {
        entry.average_score = entry.total_score / entry.interviews_given as f64;
    }

    metrics
}

/// Batch-wide statistics. `average_score` is the mean over every round,
/// which differs from the mean of per-student averages when students have
/// uneven round counts.
pub fn summarize_batch(rounds: &[InterviewRound]) -> BatchSummary {
    if rounds.is_empty() {
        return BatchSummary::default();
    }

    let students: HashSet<&str> = rounds.iter().map(|r| r.student_name.as_str()).collect();
    let total: f64 = rounds.iter().map(|r| r.score).sum();
    let highest = rounds
        .iter()
        .map(|r| r.score)
        .fold(f64::NEG_INFINITY, f64::max);

    BatchSummary {
        total_students: students.len(),
        total_interviews: rounds.len(),
        average_score: total / rounds.len() as f64,
        highest_individual_score: highest,
    }
}

/// Leaderboard order: highest score first. Equal scores keep their input order.
pub fn rank_leaderboard(mut metrics: Vec<StudentMetrics>) -> Vec<StudentMetrics> {
    metrics.sort_by(|a, b| b.highest_score.total_cmp(&a.highest_score));
    metrics
}

/// Highest score first; equal scores list the newest record first.
pub fn rank_activeness(mut records: Vec<ActivenessRecord>) -> Vec<ActivenessRecord> {
    records.sort_by(|a, b| {
        b.activeness_score
            .total_cmp(&a.activeness_score)
            .then(b.created_at.cmp(&a.created_at))
    });
    records
}

pub fn summarize_activeness(records: &[ActivenessRecord]) -> ActivenessSummary {
    if records.is_empty() {
        return ActivenessSummary::default();
    }

    let total: f64 = records.iter().map(|r| r.activeness_score).sum();
    ActivenessSummary {
        record_count: records.len(),
        average_score: total / records.len() as f64,
        total_minutes: records
            .iter()
            .filter_map(|r| r.duration_minutes)
            .map(i64::from)
            .sum(),
    }
}
