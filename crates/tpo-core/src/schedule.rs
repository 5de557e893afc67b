//! # Phase Scheduling
//!
//! Derived lifecycle state for placement phases. Nothing here is stored: the
//! displayed status of a phase is computed from its optional date fields and
//! the caller-supplied current time.
//!
//! ## Lifecycle
//!
//! A phase moves through the schedule by gaining date fields:
//!
//! - no dates at all → freshly drafted, *pending*
//! - `requested_date` only → waiting on the office, *unapproved*
//! - `suggested_date`, not scheduled → waiting on the company, *pending approval*
//! - `scheduled_date` in the future → *upcoming*
//! - `scheduled_date` passed, flagged complete → *completed*
//! - `scheduled_date` passed, not flagged → *ongoing*

use crate::types::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// PHASE STATUS
// =============================================================================

/// Displayed status of a phase, derived from its dates and the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Completed,
    Upcoming,
    Pending,
    Ongoing,
}

impl PhaseStatus {
    /// Resolve the status of a phase at the given instant.
    ///
    /// First-match-wins precedence, total over all inputs:
    /// 1. the `completed` flag → [`PhaseStatus::Completed`]
    /// 2. `scheduled_date` strictly in the future → [`PhaseStatus::Upcoming`]
    /// 3. no `scheduled_date` → [`PhaseStatus::Pending`]
    /// 4. otherwise the scheduled date has passed → [`PhaseStatus::Ongoing`]
    #[must_use]
    pub fn resolve(phase: &Phase, now: DateTime<Utc>) -> Self {
        if phase.completed {
            return Self::Completed;
        }
        match phase.scheduled_date {
            Some(scheduled) if scheduled > now => Self::Upcoming,
            None => Self::Pending,
            Some(_) => Self::Ongoing,
        }
    }
}

// =============================================================================
// LIFECYCLE PREDICATES
// =============================================================================

impl Phase {
    /// The company has requested a date and the office has neither suggested
    /// an alternative nor scheduled the phase.
    #[must_use]
    pub fn is_unapproved(&self) -> bool {
        self.requested_date.is_some()
            && self.suggested_date.is_none()
            && self.scheduled_date.is_none()
    }

    /// The office has suggested a date and the phase is not yet scheduled.
    #[must_use]
    pub fn is_pending_approval(&self) -> bool {
        self.suggested_date.is_some() && self.scheduled_date.is_none()
    }

    /// The phase is scheduled strictly in the future.
    #[must_use]
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_date.is_some_and(|scheduled| scheduled > now)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn phase() -> Phase {
        Phase {
            title: "Written Test".to_string(),
            description: "Aptitude round".to_string(),
            requested_date: None,
            suggested_date: None,
            scheduled_date: None,
            completed: false,
            results: Vec::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        // Fixed instant; the resolver never reads the clock itself.
        DateTime::from_timestamp(1_767_225_600, 0).expect("valid timestamp")
    }

    #[test]
    fn no_dates_resolves_pending() {
        assert_eq!(PhaseStatus::resolve(&phase(), now()), PhaseStatus::Pending);
    }

    #[test]
    fn scheduled_tomorrow_resolves_upcoming() {
        let mut p = phase();
        p.scheduled_date = Some(now() + Duration::days(1));
        assert_eq!(PhaseStatus::resolve(&p, now()), PhaseStatus::Upcoming);
    }

    #[test]
    fn scheduled_yesterday_not_completed_resolves_ongoing() {
        let mut p = phase();
        p.scheduled_date = Some(now() - Duration::days(1));
        assert_eq!(PhaseStatus::resolve(&p, now()), PhaseStatus::Ongoing);
    }

    #[test]
    fn completed_flag_wins_over_everything() {
        let mut p = phase();
        p.completed = true;
        assert_eq!(PhaseStatus::resolve(&p, now()), PhaseStatus::Completed);

        // Even with a future scheduled date: completed is checked first.
        p.scheduled_date = Some(now() + Duration::days(7));
        assert_eq!(PhaseStatus::resolve(&p, now()), PhaseStatus::Completed);
    }

    #[test]
    fn scheduled_exactly_now_is_ongoing() {
        // "In the future" is strict; the boundary instant counts as started.
        let mut p = phase();
        p.scheduled_date = Some(now());
        assert_eq!(PhaseStatus::resolve(&p, now()), PhaseStatus::Ongoing);
    }

    #[test]
    fn lifecycle_predicates_follow_the_date_fields() {
        let mut p = phase();
        assert!(!p.is_unapproved());
        assert!(!p.is_pending_approval());
        assert!(!p.is_upcoming(now()));

        p.requested_date = Some(now() + Duration::days(3));
        assert!(p.is_unapproved());

        p.suggested_date = Some(now() + Duration::days(4));
        assert!(!p.is_unapproved());
        assert!(p.is_pending_approval());

        p.scheduled_date = Some(now() + Duration::days(4));
        assert!(!p.is_pending_approval());
        assert!(p.is_upcoming(now()));

        p.scheduled_date = Some(now() - Duration::days(1));
        assert!(!p.is_upcoming(now()));
    }
}
