//! Notification job catalogue and schedule planning
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Invalid times skip only the affected job
//! - 1.0.0: Five jobs planned from user settings

use chrono::DateTime;
use chrono::Utc;
use chrono_tz::Tz;
use log::{error, info};
use std::fmt;

use super::schedule::{weekday_from_index, LocalTime, Trigger};
use crate::core::models::UserSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    MorningBriefing,
    MiddayReminder,
    EveningCheckin,
    WeeklyReview,
    DeadlineCheck,
}

impl JobKind {
    pub const ALL: [JobKind; 5] = [
        JobKind::MorningBriefing,
        JobKind::MiddayReminder,
        JobKind::EveningCheckin,
        JobKind::WeeklyReview,
        JobKind::DeadlineCheck,
    ];

    /// Stable identifier used in logs
    pub fn id(&self) -> &'static str {
        match self {
            JobKind::MorningBriefing => "morning_briefing",
            JobKind::MiddayReminder => "midday_reminder",
            JobKind::EveningCheckin => "evening_checkin",
            JobKind::WeeklyReview => "weekly_review",
            JobKind::DeadlineCheck => "deadline_check",
        }
    }

    fn is_enabled(&self, settings: &UserSettings) -> bool {
        match self {
            JobKind::MorningBriefing => settings.enable_morning_briefing,
            JobKind::MiddayReminder => settings.enable_midday_reminder,
            JobKind::EveningCheckin => settings.enable_evening_checkin,
            JobKind::WeeklyReview => settings.enable_weekly_review,
            JobKind::DeadlineCheck => settings.enable_deadline_reminders,
        }
    }

    fn trigger(&self, settings: &UserSettings) -> anyhow::Result<Trigger> {
        let trigger = match self {
            JobKind::MorningBriefing => {
                Trigger::Daily(LocalTime::parse(&settings.morning_briefing_time)?)
            }
            JobKind::MiddayReminder => {
                Trigger::Daily(LocalTime::parse(&settings.midday_reminder_time)?)
            }
            JobKind::EveningCheckin => {
                Trigger::Daily(LocalTime::parse(&settings.evening_checkin_time)?)
            }
            JobKind::WeeklyReview => Trigger::Weekly {
                weekday: weekday_from_index(settings.weekly_review_day)?,
                at: LocalTime::parse(&settings.weekly_review_time)?,
            },
            JobKind::DeadlineCheck => Trigger::Hourly { minute: 0 },
        };
        Ok(trigger)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledJob {
    pub kind: JobKind,
    pub trigger: Trigger,
}

/// Build the job schedule from the settings row (defaults when there is none).
///
/// Disabled jobs are left out. A job with an unparseable time is logged and
/// left out without affecting the others.
pub fn plan(settings: Option<&UserSettings>) -> Vec<ScheduledJob> {
    let defaults = UserSettings::default();
    let settings = settings.unwrap_or(&defaults);

    let mut jobs = Vec::new();
    for kind in JobKind::ALL {
        if !kind.is_enabled(settings) {
            info!("{kind} disabled in settings");
            continue;
        }
        match kind.trigger(settings) {
            Ok(trigger) => {
                info!("{kind} scheduled {trigger}");
                jobs.push(ScheduledJob { kind, trigger });
            }
            Err(e) => error!("Not scheduling {kind}: {e}"),
        }
    }
    jobs
}

/// Earliest firing instant after `after` and every job due at that instant
pub fn next_due(
    jobs: &[ScheduledJob],
    after: DateTime<Utc>,
    tz: Tz,
) -> Option<(DateTime<Utc>, Vec<JobKind>)> {
    let firings: Vec<(DateTime<Utc>, JobKind)> = jobs
        .iter()
        .filter_map(|job| job.trigger.next_after(after, tz).map(|at| (at, job.kind)))
        .collect();

    let earliest = firings.iter().map(|(at, _)| *at).min()?;
    let due = firings
        .into_iter()
        .filter(|(at, _)| *at == earliest)
        .map(|(_, kind)| kind)
        .collect();
    Some((earliest, due))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};
    use chrono_tz::Europe::Warsaw;

    fn kinds(jobs: &[ScheduledJob]) -> Vec<JobKind> {
        jobs.iter().map(|j| j.kind).collect()
    }

    #[test]
    fn test_plan_defaults_without_settings() {
        let jobs = plan(None);
        assert_eq!(kinds(&jobs), JobKind::ALL.to_vec());
        assert_eq!(
            jobs[3].trigger,
            Trigger::Weekly {
                weekday: Weekday::Sun,
                at: LocalTime::new(18, 0).unwrap()
            }
        );
        assert_eq!(jobs[4].trigger, Trigger::Hourly { minute: 0 });
    }

    #[test]
    fn test_plan_skips_disabled_jobs() {
        let settings = UserSettings {
            enable_midday_reminder: false,
            enable_deadline_reminders: false,
            ..UserSettings::default()
        };
        assert_eq!(
            kinds(&plan(Some(&settings))),
            vec![JobKind::MorningBriefing, JobKind::EveningCheckin, JobKind::WeeklyReview]
        );
    }

    #[test]
    fn test_plan_invalid_time_skips_only_that_job() {
        let settings = UserSettings {
            morning_briefing_time: "8am".to_string(),
            weekly_review_day: 9,
            ..UserSettings::default()
        };
        assert_eq!(
            kinds(&plan(Some(&settings))),
            vec![JobKind::MiddayReminder, JobKind::EveningCheckin, JobKind::DeadlineCheck]
        );
    }

    #[test]
    fn test_job_display_uses_id() {
        assert_eq!(JobKind::WeeklyReview.to_string(), "weekly_review");
        assert_eq!(JobKind::DeadlineCheck.to_string(), "deadline_check");
    }

    #[test]
    fn test_next_due_groups_simultaneous_jobs() {
        // Midday at 13:00 coincides with the hourly deadline check
        let jobs = plan(None);
        let after = Utc.with_ymd_and_hms(2026, 1, 12, 11, 30, 0).unwrap(); // 12:30 local, Monday
        let (at, due) = next_due(&jobs, after, Warsaw).unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 1, 12, 12, 0, 0).unwrap());
        assert_eq!(due, vec![JobKind::MiddayReminder, JobKind::DeadlineCheck]);
    }

    #[test]
    fn test_next_due_empty_plan() {
        assert!(next_due(&[], Utc::now(), Warsaw).is_none());
    }
}
