//! # Eligibility Matcher
//!
//! The single shared predicate deciding whether a student may apply to a
//! placement. "Not eligible" is the logical negation of this predicate —
//! there is deliberately no second, dual expression to drift out of sync.
//!
//! The grade comparison is exact: instead of averaging first (and losing
//! precision to integer division), the comparison cross-multiplies:
//! `sum(marks) >= min_grade * term_count`.

use crate::types::{Eligibility, GradeHundredths, StudentProfile};

// =============================================================================
// PREDICATE
// =============================================================================

/// Whether the student satisfies the placement's eligibility criteria.
///
/// The rule is three independent conditions, all of which must hold:
/// - gender matches, or the rule does not restrict gender;
/// - average grade across recorded terms is at least the threshold;
/// - the live-backlog flag matches, or the rule does not restrict backlogs.
///
/// A student with no recorded gender satisfies only a gender-unrestricted
/// rule. A student with no recorded terms satisfies only a zero threshold.
#[must_use]
pub fn eligible(student: &StudentProfile, rule: &Eligibility) -> bool {
    let gender_ok = match rule.gender {
        None => true,
        Some(required) => student.gender == Some(required),
    };

    let backlog_ok = match rule.live_backlog {
        None => true,
        Some(required) => student.live_backlog == required,
    };

    gender_ok && meets_grade(&student.sem_marks, rule.min_grade) && backlog_ok
}

/// Exact comparison of the average of `marks` against `min_grade`.
///
/// `avg >= min` is evaluated as `sum >= min * count` in u64 arithmetic, so a
/// student whose true average equals the threshold on a fraction is never
/// excluded by floor division.
#[must_use]
pub fn meets_grade(marks: &[GradeHundredths], min_grade: GradeHundredths) -> bool {
    if marks.is_empty() {
        return min_grade.value() == 0;
    }
    let sum: u64 = marks.iter().map(|m| u64::from(m.value())).sum();
    sum >= u64::from(min_grade.value()) * marks.len() as u64
}

/// Average grade across recorded terms, rounded down to hundredths.
///
/// Display-only; eligibility uses [`meets_grade`] for the exact comparison.
#[must_use]
pub fn average_grade(marks: &[GradeHundredths]) -> GradeHundredths {
    if marks.is_empty() {
        return GradeHundredths::default();
    }
    let sum: u64 = marks.iter().map(|m| u64::from(m.value())).sum();
    GradeHundredths::new((sum / marks.len() as u64) as u32)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Gender;

    fn student(
        gender: Option<Gender>,
        marks: &[u32],
        live_backlog: bool,
    ) -> StudentProfile {
        StudentProfile {
            gender,
            sem_marks: marks.iter().copied().map(GradeHundredths::new).collect(),
            live_backlog,
            ..StudentProfile::default()
        }
    }

    fn rule(min: u32, live_backlog: Option<bool>, gender: Option<Gender>) -> Eligibility {
        Eligibility {
            min_grade: GradeHundredths::new(min),
            live_backlog,
            gender,
        }
    }

    #[test]
    fn unrestricted_rule_admits_anyone_above_threshold() {
        let s = student(None, &[700, 800], false);
        assert!(eligible(&s, &rule(750, None, None)));
        assert!(!eligible(&s, &rule(751, None, None)));
    }

    #[test]
    fn gender_restriction_requires_a_recorded_match() {
        let s = student(Some(Gender::Female), &[900], false);
        assert!(eligible(&s, &rule(0, None, Some(Gender::Female))));
        assert!(!eligible(&s, &rule(0, None, Some(Gender::Male))));

        // No recorded gender only matches an unrestricted rule.
        let unknown = student(None, &[900], false);
        assert!(!eligible(&unknown, &rule(0, None, Some(Gender::Female))));
        assert!(eligible(&unknown, &rule(0, None, None)));
    }

    #[test]
    fn backlog_restriction_matches_the_flag() {
        let clean = student(None, &[800], false);
        let backlogged = student(None, &[800], true);

        let no_backlogs = rule(0, Some(false), None);
        assert!(eligible(&clean, &no_backlogs));
        assert!(!eligible(&backlogged, &no_backlogs));

        let any = rule(0, None, None);
        assert!(eligible(&clean, &any));
        assert!(eligible(&backlogged, &any));
    }

    #[test]
    fn grade_comparison_is_exact_not_floored() {
        // Average of 7.00 and 7.01 is 7.005 — floor division would report
        // 700 and wrongly fail a 7.005-equivalent threshold comparison.
        // sum = 1401, min * count at 700 = 1400: passes. At 701: 1402 fails.
        let s = student(None, &[700, 701], false);
        assert!(eligible(&s, &rule(700, None, None)));
        assert!(!eligible(&s, &rule(701, None, None)));
    }

    #[test]
    fn empty_marks_meet_only_zero_threshold() {
        let s = student(None, &[], false);
        assert!(eligible(&s, &rule(0, None, None)));
        assert!(!eligible(&s, &rule(1, None, None)));
    }

    #[test]
    fn average_grade_floors_for_display() {
        let marks = [
            GradeHundredths::new(700),
            GradeHundredths::new(701),
        ];
        assert_eq!(average_grade(&marks), GradeHundredths::new(700));
        assert_eq!(average_grade(&[]), GradeHundredths::default());
    }
}
