//! Domain records read by the notifier
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Priority rank for SQL ordering, habit streaks
//! - 1.0.0: Task, habit, health log and user settings records

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Storage format for UTC timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Storage format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Also accepts fractional seconds (`2026-01-14 12:30:00.000000`), as other
/// writers of the same tables store them
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let naive = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|e| anyhow::anyhow!("Invalid timestamp '{raw}': {e}"))?;
    Ok(naive.and_utc())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Backlog,
    Todo,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "backlog" => Some(TaskStatus::Backlog),
            "todo" => Some(TaskStatus::Todo),
            "in_progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            "urgent" => Some(TaskPriority::Urgent),
            _ => None,
        }
    }
}

/// SQL expression ranking `priority` so that `ORDER BY ... DESC` puts urgent first.
/// Sorting the raw text would order "urgent" > "medium" > "low" > "high".
pub const PRIORITY_RANK_SQL: &str =
    "CASE priority WHEN 'urgent' THEN 4 WHEN 'high' THEN 3 WHEN 'medium' THEN 2 WHEN 'low' THEN 1 ELSE 0 END";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub is_mit: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fields for inserting a task; everything but the title has a default
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub is_mit: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            is_mit: false,
            due_date: None,
            completed_at: None,
        }
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn mit(mut self) -> Self {
        self.is_mit = true;
        self
    }

    pub fn due(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn completed(mut self, at: DateTime<Utc>) -> Self {
        self.status = TaskStatus::Done;
        self.completed_at = Some(at);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
}

/// Count consecutive completed days ending at `today`.
///
/// A streak that ended yesterday still counts: today may simply not be
/// logged yet. `completed_days` need not be sorted or unique.
pub fn habit_streak(completed_days: &[NaiveDate], today: NaiveDate) -> u32 {
    let days: std::collections::HashSet<NaiveDate> = completed_days.iter().copied().collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor = match cursor.pred_opt() {
            Some(prev) => prev,
            None => break,
        };
    }
    streak
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthLog {
    pub log_date: NaiveDate,
    pub water_glasses: u32,
    pub sleep_hours: Option<f64>,
    pub mood: Option<u8>,
}

/// The single settings row of the app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub name: String,
    pub weather_city: String,
    pub telegram_chat_id: Option<String>,
    pub telegram_notifications_enabled: bool,
    pub morning_briefing_time: String,
    pub midday_reminder_time: String,
    pub evening_checkin_time: String,
    /// 0 = Monday .. 6 = Sunday
    pub weekly_review_day: u8,
    pub weekly_review_time: String,
    pub enable_morning_briefing: bool,
    pub enable_midday_reminder: bool,
    pub enable_evening_checkin: bool,
    pub enable_weekly_review: bool,
    pub enable_deadline_reminders: bool,
    pub target_water_glasses: u32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            name: "User".to_string(),
            weather_city: "Warsaw".to_string(),
            telegram_chat_id: None,
            telegram_notifications_enabled: true,
            morning_briefing_time: "08:00".to_string(),
            midday_reminder_time: "13:00".to_string(),
            evening_checkin_time: "21:30".to_string(),
            weekly_review_day: 6,
            weekly_review_time: "18:00".to_string(),
            enable_morning_briefing: true,
            enable_midday_reminder: true,
            enable_evening_checkin: true,
            enable_weekly_review: true,
            enable_deadline_reminders: true,
            target_water_glasses: 8,
        }
    }
}
