use chrono::Duration;

use crate::error::ValidationError;
use crate::models::{NewActivenessRecord, NewInterviewRound};

pub const INTERVIEW_SCORE_MAX: f64 = 10.0;
pub const ACTIVENESS_SCORE_MAX: f64 = 100.0;

/// Returns the trimmed name, or `NameRequired` when nothing is left.
pub fn student_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    Ok(trimmed.to_string())
}

fn score_in_range(field: &'static str, value: f64, max: f64) -> Result<f64, ValidationError> {
    if value.is_nan() || !(0.0..=max).contains(&value) {
        return Err(ValidationError::ScoreOutOfRange {
            field,
            value,
            min: 0.0,
            max,
        });
    }
    Ok(value)
}

pub fn interview_score(value: f64) -> Result<f64, ValidationError> {
    score_in_range("interview score", value, INTERVIEW_SCORE_MAX)
}

pub fn activeness_score(value: f64) -> Result<f64, ValidationError> {
    score_in_range("activeness score", value, ACTIVENESS_SCORE_MAX)
}

pub fn parse_score(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::NotNumeric { field })
}

/// How long an attendance session stays open. Rejects zero, negative and
/// unrepresentable lengths instead of letting date arithmetic overflow.
pub fn session_ttl(minutes: i64) -> Result<Duration, ValidationError> {
    if minutes <= 0 {
        return Err(ValidationError::TtlOutOfRange { minutes });
    }
    Duration::try_minutes(minutes).ok_or(ValidationError::TtlOutOfRange { minutes })
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

pub fn interview_round(round: NewInterviewRound) -> Result<NewInterviewRound, ValidationError> {
    Ok(NewInterviewRound {
        student_name: student_name(&round.student_name)?,
        round_number: round.round_number,
        score: interview_score(round.score)?,
        feedback: optional_text(round.feedback),
    })
}

pub fn activeness_record(
    record: NewActivenessRecord,
) -> Result<NewActivenessRecord, ValidationError> {
    Ok(NewActivenessRecord {
        student_name: student_name(&record.student_name)?,
        activeness_score: activeness_score(record.activeness_score)?,
        duration_minutes: record.duration_minutes,
        zoom_session_id: optional_text(record.zoom_session_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(student_name(""), Err(ValidationError::NameRequired));
        assert_eq!(student_name("   "), Err(ValidationError::NameRequired));
        assert_eq!(student_name("\t\n"), Err(ValidationError::NameRequired));
        assert_eq!(student_name("  Avery Lee ").unwrap(), "Avery Lee");
    }

    #[test]
    fn interview_score_bounds() {
        assert!(interview_score(10.5).is_err());
        assert!(interview_score(-0.1).is_err());
        assert!(interview_score(f64::NAN).is_err());
        assert_eq!(interview_score(0.0), Ok(0.0));
        assert_eq!(interview_score(10.0), Ok(10.0));
    }

    #[test]
    fn activeness_score_bounds() {
        assert!(activeness_score(-1.0).is_err());
        assert!(activeness_score(100.5).is_err());
        assert_eq!(activeness_score(0.0), Ok(0.0));
        assert_eq!(activeness_score(100.0), Ok(100.0));
    }

    #[test]
    fn parse_score_reports_non_numeric_input() {
        assert_eq!(parse_score("interview score", " 7.5 "), Ok(7.5));
        assert_eq!(
            parse_score("interview score", "seven"),
            Err(ValidationError::NotNumeric {
                field: "interview score"
            })
        );
    }

    #[test]
    fn session_ttl_rejects_non_positive_and_huge_values() {
        assert_eq!(session_ttl(60), Ok(Duration::minutes(60)));
        assert_eq!(
            session_ttl(0),
            Err(ValidationError::TtlOutOfRange { minutes: 0 })
        );
        assert!(session_ttl(-5).is_err());
        assert!(session_ttl(i64::MAX).is_err());
    }

    #[test]
    fn round_validation_trims_name_and_drops_empty_feedback() {
        let round = interview_round(NewInterviewRound {
            student_name: " Jules Moreno ".to_string(),
            round_number: 2,
            score: 8.0,
            feedback: Some("   ".to_string()),
        })
        .unwrap();

        assert_eq!(round.student_name, "Jules Moreno");
        assert_eq!(round.feedback, None);
    }

    #[test]
    fn round_validation_rejects_out_of_range_score() {
        let err = interview_round(NewInterviewRound {
            student_name: "Jules Moreno".to_string(),
            round_number: 1,
            score: 10.5,
            feedback: None,
        })
        .unwrap_err();

        assert!(matches!(err, ValidationError::ScoreOutOfRange { max, .. } if max == 10.0));
    }
}
