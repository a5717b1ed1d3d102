use chrono::{DateTime, Utc};

use super::rejection::Rejection;

/// The settings that gate whether, when, and how often a form accepts submissions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormPolicy {
    pub is_active: bool,
    pub accept_responses: bool,
    pub submission_start: Option<DateTime<Utc>>,
    pub submission_deadline: Option<DateTime<Utc>>,
    pub max_submissions: Option<u32>,
    pub one_submission_per_email: bool,
    pub allow_edit: bool,
}

impl Default for FormPolicy {
    fn default() -> Self {
        Self {
            is_active: true,
            accept_responses: true,
            submission_start: None,
            submission_deadline: None,
            max_submissions: None,
            one_submission_per_email: false,
            allow_edit: false,
        }
    }
}

/// Existing submissions relevant to a new attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmissionCounts {
    /// All submissions to the form.
    pub total: u64,
    /// Submissions to the form by the caller.
    pub by_caller: u64,
}

impl FormPolicy {
    /// Active, accepting responses, and inside the `[start, deadline]` window.
    pub fn check_open(&self, now: DateTime<Utc>) -> Result<(), Rejection> {
        if !self.is_active {
            return Err(Rejection::FormInactive);
        }
        if !self.accept_responses {
            return Err(Rejection::ResponsesClosed);
        }
        if let Some(opens_at) = self.submission_start
            && now < opens_at
        {
            return Err(Rejection::NotYetOpen { opens_at });
        }
        if let Some(deadline) = self.submission_deadline
            && now > deadline
        {
            return Err(Rejection::DeadlinePassed { deadline });
        }
        Ok(())
    }

    /// Quota and one-per-user checks.
    pub fn check_capacity(&self, counts: SubmissionCounts) -> Result<(), Rejection> {
        if let Some(max) = self.max_submissions
            && counts.total >= u64::from(max)
        {
            return Err(Rejection::QuotaReached { max });
        }
        if self.one_submission_per_email && counts.by_caller > 0 {
            return Err(Rejection::AlreadySubmitted);
        }
        Ok(())
    }

    /// Every gate a brand-new submission must pass, in order.
    pub fn check_new_submission(
        &self,
        now: DateTime<Utc>,
        counts: SubmissionCounts,
    ) -> Result<(), Rejection> {
        self.check_open(now)?;
        self.check_capacity(counts)
    }

    /// Gates for editing an existing submission in place.
    pub fn check_edit(&self, now: DateTime<Utc>) -> Result<(), Rejection> {
        if !self.is_active {
            return Err(Rejection::FormInactive);
        }
        if !self.allow_edit {
            return Err(Rejection::EditNotAllowed);
        }
        self.check_open(now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn counts(total: u64, by_caller: u64) -> SubmissionCounts {
        SubmissionCounts { total, by_caller }
    }

    #[test]
    fn default_policy_is_open() {
        let policy = FormPolicy::default();
        assert_eq!(policy.check_new_submission(Utc::now(), counts(100, 3)), Ok(()));
    }

    #[test]
    fn inactive_form_wins_over_everything() {
        let policy = FormPolicy {
            is_active: false,
            accept_responses: false,
            submission_deadline: Some(Utc::now() - Duration::days(1)),
            ..Default::default()
        };
        assert_eq!(
            policy.check_new_submission(Utc::now(), counts(0, 0)),
            Err(Rejection::FormInactive)
        );
    }

    #[test]
    fn closed_responses_checked_before_window() {
        let policy = FormPolicy {
            accept_responses: false,
            submission_deadline: Some(Utc::now() - Duration::days(1)),
            ..Default::default()
        };
        assert_eq!(
            policy.check_open(Utc::now()),
            Err(Rejection::ResponsesClosed)
        );
    }

    #[test]
    fn deadline_passed_is_specific() {
        let deadline = Utc::now() - Duration::hours(1);
        let policy = FormPolicy {
            submission_deadline: Some(deadline),
            max_submissions: Some(0),
            ..Default::default()
        };
        assert_eq!(
            policy.check_new_submission(Utc::now(), counts(0, 0)),
            Err(Rejection::DeadlinePassed { deadline })
        );
    }

    #[test]
    fn not_yet_open() {
        let opens_at = Utc::now() + Duration::days(2);
        let policy = FormPolicy {
            submission_start: Some(opens_at),
            ..Default::default()
        };
        assert_eq!(
            policy.check_open(Utc::now()),
            Err(Rejection::NotYetOpen { opens_at })
        );
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = Utc::now();
        let policy = FormPolicy {
            submission_start: Some(now),
            submission_deadline: Some(now),
            ..Default::default()
        };
        assert_eq!(policy.check_open(now), Ok(()));
    }

    #[test]
    fn quota_rejects_the_n_plus_first() {
        let policy = FormPolicy {
            max_submissions: Some(3),
            ..Default::default()
        };
        assert_eq!(policy.check_capacity(counts(2, 0)), Ok(()));
        assert_eq!(
            policy.check_capacity(counts(3, 0)),
            Err(Rejection::QuotaReached { max: 3 })
        );
    }

    #[test]
    fn quota_checked_before_uniqueness() {
        let policy = FormPolicy {
            max_submissions: Some(1),
            one_submission_per_email: true,
            ..Default::default()
        };
        assert_eq!(
            policy.check_capacity(counts(1, 1)),
            Err(Rejection::QuotaReached { max: 1 })
        );
    }

    #[test]
    fn one_submission_per_user() {
        let policy = FormPolicy {
            one_submission_per_email: true,
            ..Default::default()
        };
        assert_eq!(policy.check_capacity(counts(5, 0)), Ok(()));
        assert_eq!(
            policy.check_capacity(counts(5, 1)),
            Err(Rejection::AlreadySubmitted)
        );
    }

    #[test]
    fn edits_require_allow_edit_and_open_window() {
        let mut policy = FormPolicy::default();
        assert_eq!(policy.check_edit(Utc::now()), Err(Rejection::EditNotAllowed));

        policy.allow_edit = true;
        assert_eq!(policy.check_edit(Utc::now()), Ok(()));

        let deadline = Utc::now() - Duration::minutes(5);
        policy.submission_deadline = Some(deadline);
        assert_eq!(
            policy.check_edit(Utc::now()),
            Err(Rejection::DeadlinePassed { deadline })
        );
    }

    #[test]
    fn edits_ignore_quota() {
        let policy = FormPolicy {
            allow_edit: true,
            max_submissions: Some(1),
            one_submission_per_email: true,
            ..Default::default()
        };
        assert_eq!(policy.check_edit(Utc::now()), Ok(()));
    }
}
