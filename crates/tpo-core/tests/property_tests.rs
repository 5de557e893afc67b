//! # Property-Based Tests
//!
//! Verification of the two derived-state computations:
//! - the eligibility predicate partitions every (student, rule) pair
//! - phase status resolution is total and first-match-wins

use chrono::{DateTime, Duration, Utc};
use proptest::collection::vec;
use proptest::option;
use proptest::prelude::*;
use tpo_core::{
    Eligibility, Gender, GradeHundredths, Phase, PhaseStatus, StudentProfile, eligible,
    meets_grade,
};

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_767_225_600, 0).expect("valid timestamp")
}

fn gender_strategy() -> impl Strategy<Value = Gender> {
    prop_oneof![
        Just(Gender::Female),
        Just(Gender::Male),
        Just(Gender::Other),
    ]
}

fn student_strategy() -> impl Strategy<Value = StudentProfile> {
    (
        option::of(gender_strategy()),
        vec(0u32..=1000, 0..12),
        any::<bool>(),
    )
        .prop_map(|(gender, marks, live_backlog)| StudentProfile {
            gender,
            sem_marks: marks.into_iter().map(GradeHundredths::new).collect(),
            live_backlog,
            ..StudentProfile::default()
        })
}

fn rule_strategy() -> impl Strategy<Value = Eligibility> {
    (
        0u32..=1000,
        option::of(any::<bool>()),
        option::of(gender_strategy()),
    )
        .prop_map(|(min, live_backlog, gender)| Eligibility {
            min_grade: GradeHundredths::new(min),
            live_backlog,
            gender,
        })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Eligible and not-eligible are mutually exclusive and exhaustive:
    /// the predicate is a boolean, so its negation is the full complement.
    /// Unrestricting a criterion never disqualifies a previously eligible
    /// student.
    #[test]
    fn relaxing_a_rule_never_disqualifies(
        student in student_strategy(),
        rule in rule_strategy(),
    ) {
        if eligible(&student, &rule) {
            let mut relaxed = rule;
            relaxed.gender = None;
            prop_assert!(eligible(&student, &relaxed));
            relaxed.live_backlog = None;
            prop_assert!(eligible(&student, &relaxed));
            relaxed.min_grade = GradeHundredths::new(0);
            prop_assert!(eligible(&student, &relaxed));
        }
    }

    /// The grade comparison agrees with exact rational arithmetic:
    /// avg >= min iff sum >= min * count.
    #[test]
    fn grade_comparison_matches_exact_average(
        marks in vec(0u32..=1000, 1..12),
        min in 0u32..=1000,
    ) {
        let grades: Vec<GradeHundredths> =
            marks.iter().copied().map(GradeHundredths::new).collect();
        let sum: u64 = marks.iter().map(|&m| u64::from(m)).sum();
        let expected = sum >= u64::from(min) * marks.len() as u64;
        prop_assert_eq!(meets_grade(&grades, GradeHundredths::new(min)), expected);
    }

    /// An unrestricted rule admits exactly the students meeting the grade
    /// threshold; nothing else enters the decision.
    #[test]
    fn unrestricted_rule_reduces_to_grade(
        student in student_strategy(),
        min in 0u32..=1000,
    ) {
        let rule = Eligibility {
            min_grade: GradeHundredths::new(min),
            live_backlog: None,
            gender: None,
        };
        prop_assert_eq!(
            eligible(&student, &rule),
            meets_grade(&student.sem_marks, rule.min_grade)
        );
    }

    /// Phase status resolution is total: every (completed, scheduled offset)
    /// combination maps to exactly one of the four states, with
    /// first-match-wins precedence.
    #[test]
    fn phase_status_is_total(
        completed in any::<bool>(),
        scheduled_offset_days in option::of(-365i64..365),
    ) {
        let now = epoch();
        let phase = Phase {
            title: "Phase".to_string(),
            description: String::new(),
            requested_date: None,
            suggested_date: None,
            scheduled_date: scheduled_offset_days.map(|d| now + Duration::days(d)),
            completed,
            results: Vec::new(),
        };

        let status = PhaseStatus::resolve(&phase, now);
        let expected = if completed {
            PhaseStatus::Completed
        } else {
            match scheduled_offset_days {
                Some(days) if days > 0 => PhaseStatus::Upcoming,
                None => PhaseStatus::Pending,
                Some(_) => PhaseStatus::Ongoing,
            }
        };
        prop_assert_eq!(status, expected);
    }
}
