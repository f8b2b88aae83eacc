//! Notification dispatcher: plans the jobs, sleeps until the next firing and
//! runs each due job, isolating failures so one job never affects another.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{debug, error, info, warn};
use std::sync::Arc;

use super::jobs::{next_due, plan, JobKind, ScheduledJob};
use super::messages::{
    self, habit_completion_rate, DeadlineWindow, EveningStats, WeeklyStats,
};
use super::schedule::local_day_start;
use crate::core::models::{habit_streak, UserSettings};
use crate::core::Config;
use crate::database::Database;
use crate::features::telegram::Notifier;
use crate::features::weather::WeatherClient;

/// Days covered by the weekly review, today included
const REVIEW_DAYS: u32 = 7;
/// How far back streaks are counted
const STREAK_LOOKBACK_DAYS: i64 = 366;
const MORNING_TASK_LIMIT: usize = 3;

/// Per-run view of settings and "today" for the job being executed
struct JobContext {
    settings: UserSettings,
    chat_id: String,
    /// Settings city, or the configured default when no settings are saved
    city: String,
    now: DateTime<Utc>,
    today: NaiveDate,
}

pub struct NotificationDispatcher {
    database: Database,
    notifier: Arc<dyn Notifier>,
    weather: WeatherClient,
    timezone: Tz,
    default_city: String,
    fallback_chat_id: Option<String>,
}

impl NotificationDispatcher {
    pub fn new(
        database: Database,
        notifier: Arc<dyn Notifier>,
        weather: WeatherClient,
        config: &Config,
    ) -> Self {
        Self {
            database,
            notifier,
            weather,
            timezone: config.timezone,
            default_city: config.default_city.clone(),
            fallback_chat_id: config.telegram_chat_id.clone(),
        }
    }

    /// Build the job schedule from the stored settings
    pub async fn plan(&self) -> Result<Vec<ScheduledJob>> {
        let settings = self.database.get_user_settings().await?;
        if settings.is_none() {
            info!("No user settings saved - using default notification schedule");
        }
        Ok(plan(settings.as_ref()))
    }

    /// Run the scheduler until the task is dropped.
    ///
    /// The schedule is planned once at startup; restart the process to pick up
    /// changed notification times.
    pub async fn run(&self) {
        let jobs = match self.plan().await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!("Failed to read notification settings, using defaults: {e:#}");
                plan(None)
            }
        };
        if jobs.is_empty() {
            warn!("All notifications disabled - dispatcher idle");
            return;
        }

        info!(
            "⏰ Notification dispatcher started with {} job(s) in {}",
            jobs.len(),
            self.timezone
        );

        let mut after = Utc::now();
        loop {
            let Some((due_at, due_jobs)) = next_due(&jobs, after, self.timezone) else {
                warn!("No upcoming notification found - dispatcher stopping");
                return;
            };

            let wait = (due_at - Utc::now()).to_std().unwrap_or_default();
            debug!(
                "Next notification at {due_at} ({}), sleeping {}s",
                due_jobs
                    .iter()
                    .map(|job| job.id())
                    .collect::<Vec<_>>()
                    .join(", "),
                wait.as_secs()
            );
            tokio::time::sleep(wait).await;

            for job in due_jobs {
                self.fire(job, due_at).await;
            }

            // Triggers that passed while jobs were running are dropped, not replayed
            after = std::cmp::max(due_at, Utc::now());
        }
    }

    /// Run one job, logging the outcome. Never fails.
    pub async fn fire(&self, job: JobKind, now: DateTime<Utc>) {
        match self.run_job(job, now).await {
            Ok(0) => debug!("{job} finished without sending anything"),
            Ok(sent) => info!("📨 {job} sent {sent} message(s)"),
            Err(e) => error!("Scheduler job {job} failed: {e:#}"),
        }
    }

    /// Run one job as of `now` and return how many messages were sent
    pub async fn run_job(&self, job: JobKind, now: DateTime<Utc>) -> Result<usize> {
        let stored = self
            .database
            .get_user_settings()
            .await
            .context("Failed to load user settings")?;
        let city = stored
            .as_ref()
            .map(|s| s.weather_city.trim())
            .filter(|city| !city.is_empty())
            .unwrap_or(self.default_city.as_str())
            .to_string();
        let settings = stored.unwrap_or_default();

        if !settings.telegram_notifications_enabled {
            info!("Telegram notifications disabled in settings - skipping {job}");
            return Ok(0);
        }

        let chat_id = settings
            .telegram_chat_id
            .clone()
            .or_else(|| self.fallback_chat_id.clone())
            .ok_or_else(|| anyhow::anyhow!("No chat ID configured"))?;

        let ctx = JobContext {
            settings,
            chat_id,
            city,
            now,
            today: now.with_timezone(&self.timezone).date_naive(),
        };

        match job {
            JobKind::MorningBriefing => self.morning_briefing(&ctx).await,
            JobKind::MiddayReminder => self.midday_reminder(&ctx).await,
            JobKind::EveningCheckin => self.evening_checkin(&ctx).await,
            JobKind::WeeklyReview => self.weekly_review(&ctx).await,
            JobKind::DeadlineCheck => self.deadline_check(&ctx).await,
        }
    }

    async fn send(&self, ctx: &JobContext, text: &str) -> Result<()> {
        self.notifier
            .send_message(&ctx.chat_id, text)
            .await
            .with_context(|| format!("Failed to send to chat {}", ctx.chat_id))
    }

    fn day_start(&self, date: NaiveDate) -> DateTime<Utc> {
        local_day_start(date, self.timezone)
    }

    async fn morning_briefing(&self, ctx: &JobContext) -> Result<usize> {
        let weather = self.weather.current(&ctx.city).await;

        let mit_tasks = self
            .database
            .active_tasks(Some(true), MORNING_TASK_LIMIT)
            .await?;
        let other_tasks = self
            .database
            .active_tasks(Some(false), MORNING_TASK_LIMIT)
            .await?;

        let text = messages::morning_briefing(&weather, &mit_tasks, &other_tasks);
        self.send(ctx, &text).await?;
        Ok(1)
    }

    async fn midday_reminder(&self, ctx: &JobContext) -> Result<usize> {
        let completed = self
            .database
            .count_completed_since(self.day_start(ctx.today))
            .await?;
        self.send(ctx, &messages::midday_reminder(completed)).await?;
        Ok(1)
    }

    async fn evening_checkin(&self, ctx: &JobContext) -> Result<usize> {
        let completed_today = self
            .database
            .count_completed_since(self.day_start(ctx.today))
            .await?;
        let remaining = self.database.count_active_tasks().await?;
        let habits_total = self.database.active_habits().await?.len() as u64;
        let habits_done = self
            .database
            .count_habit_completions(ctx.today, ctx.today)
            .await?;
        let water_glasses = self
            .database
            .get_health_log(ctx.today)
            .await?
            .map(|log| log.water_glasses)
            .unwrap_or(0);

        let stats = EveningStats {
            completed_today,
            remaining,
            habits_done,
            habits_total,
            water_glasses,
            water_target: ctx.settings.target_water_glasses,
        };
        self.send(ctx, &messages::evening_checkin(&stats)).await?;
        Ok(1)
    }

    async fn weekly_review(&self, ctx: &JobContext) -> Result<usize> {
        let first_day = ctx.today - Duration::days(i64::from(REVIEW_DAYS) - 1);
        let completed = self
            .database
            .count_completed_since(self.day_start(first_day))
            .await?;

        let habits = self.database.active_habits().await?;
        let completions = self
            .database
            .count_habit_completions(first_day, ctx.today)
            .await?;

        let mut best_streak: Option<(String, u32)> = None;
        let streak_since = ctx.today - Duration::days(STREAK_LOOKBACK_DAYS);
        for habit in &habits {
            let days = self
                .database
                .habit_completed_days(habit.id, streak_since)
                .await?;
            let streak = habit_streak(&days, ctx.today);
            if streak > best_streak.as_ref().map_or(0, |(_, best)| *best) {
                best_streak = Some((habit.name.clone(), streak));
            }
        }

        let stats = WeeklyStats {
            completed,
            habit_rate: habit_completion_rate(completions, habits.len(), REVIEW_DAYS),
            best_streak,
        };
        self.send(ctx, &messages::weekly_review(&stats)).await?;
        Ok(1)
    }

    /// Reminds once per deadline: a task is in each hourly window exactly once
    async fn deadline_check(&self, ctx: &JobContext) -> Result<usize> {
        let windows = [
            (DeadlineWindow::Urgent, Duration::hours(1), Duration::hours(2)),
            (DeadlineWindow::Tomorrow, Duration::hours(23), Duration::hours(24)),
        ];

        let mut sent = 0;
        for (window, from, to) in windows {
            let tasks = self
                .database
                .tasks_due_between(ctx.now + from, ctx.now + to)
                .await?;
            for task in tasks {
                self.send(ctx, &messages::deadline_reminder(&task.title, window))
                    .await?;
                sent += 1;
            }
        }
        Ok(sent)
    }
}
