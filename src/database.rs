//! # SQLite storage
//!
//! Shared handle over the LifeHub database. The notifier reads tasks, habits,
//! health logs and the settings row; the chat commands perform the few writes
//! the bot supports (register chat, add/complete task, log water).
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Habit completion queries for weekly review and streaks
//! - 1.1.0: Priority-ranked task ordering
//! - 1.0.0: Schema bootstrap and task/settings queries

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use sqlite::{Connection, State, Statement, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::models::{
    format_date, format_timestamp, parse_timestamp, Habit, HealthLog, NewTask, Task,
    TaskPriority, TaskStatus, UserSettings, PRIORITY_RANK_SQL,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'todo',
    priority TEXT NOT NULL DEFAULT 'medium',
    due_date TEXT,
    completed_at TEXT,
    is_mit INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date);

CREATE TABLE IF NOT EXISTS habits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    current_streak INTEGER NOT NULL DEFAULT 0,
    longest_streak INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS habit_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    habit_id INTEGER NOT NULL,
    log_date TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    UNIQUE(habit_id, log_date)
);
CREATE INDEX IF NOT EXISTS idx_habit_logs_date ON habit_logs(log_date);

CREATE TABLE IF NOT EXISTS health_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    log_date TEXT NOT NULL UNIQUE,
    water_glasses INTEGER NOT NULL DEFAULT 0,
    sleep_hours REAL,
    mood INTEGER,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS user_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    name TEXT NOT NULL DEFAULT 'User',
    weather_city TEXT NOT NULL DEFAULT 'Warsaw',
    telegram_chat_id TEXT,
    telegram_notifications_enabled INTEGER NOT NULL DEFAULT 1,
    morning_briefing_time TEXT NOT NULL DEFAULT '08:00',
    midday_reminder_time TEXT NOT NULL DEFAULT '13:00',
    evening_checkin_time TEXT NOT NULL DEFAULT '21:30',
    weekly_review_day INTEGER NOT NULL DEFAULT 6,
    weekly_review_time TEXT NOT NULL DEFAULT '18:00',
    enable_morning_briefing INTEGER NOT NULL DEFAULT 1,
    enable_midday_reminder INTEGER NOT NULL DEFAULT 1,
    enable_evening_checkin INTEGER NOT NULL DEFAULT 1,
    enable_weekly_review INTEGER NOT NULL DEFAULT 1,
    enable_deadline_reminders INTEGER NOT NULL DEFAULT 1,
    target_water_glasses INTEGER NOT NULL DEFAULT 8
);
";

const TASK_COLUMNS: &str = "id, title, status, priority, is_mit, due_date, completed_at";

/// Cloneable handle; every query locks the connection only for its own duration
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path` and make sure the schema exists
    pub async fn new(path: &str) -> Result<Self> {
        let conn =
            sqlite::open(path).with_context(|| format!("Failed to open database at {path}"))?;
        conn.execute(SCHEMA)
            .context("Failed to initialise database schema")?;
        info!("Database ready at {path}");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Private in-memory database, used by tests
    pub async fn in_memory() -> Result<Self> {
        Self::new(":memory:").await
    }

    // ---- settings -------------------------------------------------------

    /// The settings row, or `None` when the user never saved any
    pub async fn get_user_settings(&self) -> Result<Option<UserSettings>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT * FROM user_settings WHERE id = 1")?;
        if let State::Row = stmt.next()? {
            Ok(Some(read_settings(&stmt)?))
        } else {
            Ok(None)
        }
    }

    /// Replace the settings row
    pub async fn save_user_settings(&self, settings: &UserSettings) -> Result<()> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "INSERT OR REPLACE INTO user_settings (
                id, name, weather_city, telegram_chat_id, telegram_notifications_enabled,
                morning_briefing_time, midday_reminder_time, evening_checkin_time,
                weekly_review_day, weekly_review_time,
                enable_morning_briefing, enable_midday_reminder, enable_evening_checkin,
                enable_weekly_review, enable_deadline_reminders, target_water_glasses
            ) VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        bind_all(
            &mut stmt,
            &[
                text(&settings.name),
                text(&settings.weather_city),
                opt_text(settings.telegram_chat_id.as_deref()),
                flag(settings.telegram_notifications_enabled),
                text(&settings.morning_briefing_time),
                text(&settings.midday_reminder_time),
                text(&settings.evening_checkin_time),
                Value::Integer(i64::from(settings.weekly_review_day)),
                text(&settings.weekly_review_time),
                flag(settings.enable_morning_briefing),
                flag(settings.enable_midday_reminder),
                flag(settings.enable_evening_checkin),
                flag(settings.enable_weekly_review),
                flag(settings.enable_deadline_reminders),
                Value::Integer(i64::from(settings.target_water_glasses)),
            ],
        )?;
        run(&mut stmt)
    }

    /// Register the chat that should receive notifications, creating the
    /// settings row with defaults if needed
    pub async fn set_telegram_chat_id(&self, chat_id: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("INSERT OR IGNORE INTO user_settings (id) VALUES (1)")?;
        let mut stmt = conn.prepare("UPDATE user_settings SET telegram_chat_id = ? WHERE id = 1")?;
        bind_all(&mut stmt, &[text(chat_id)])?;
        run(&mut stmt)?;
        info!("Registered Telegram chat {chat_id} for notifications");
        Ok(())
    }

    // ---- tasks ----------------------------------------------------------

    pub async fn add_task(&self, task: &NewTask) -> Result<i64> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "INSERT INTO tasks (title, status, priority, is_mit, due_date, completed_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )?;
        bind_all(
            &mut stmt,
            &[
                text(&task.title),
                text(task.status.as_str()),
                text(task.priority.as_str()),
                flag(task.is_mit),
                opt_text(task.due_date.map(format_timestamp).as_deref()),
                opt_text(task.completed_at.map(format_timestamp).as_deref()),
            ],
        )?;
        run(&mut stmt)?;
        let id = last_insert_id(&conn)?;
        debug!("Inserted task {id}");
        Ok(id)
    }

    pub async fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let conn = self.conn.lock().await;
        find_task(&conn, id)
    }

    /// Mark a task done; `None` when no task has this id
    pub async fn complete_task(&self, id: i64, at: DateTime<Utc>) -> Result<Option<Task>> {
        let conn = self.conn.lock().await;
        if find_task(&conn, id)?.is_none() {
            return Ok(None);
        }
        let mut stmt =
            conn.prepare("UPDATE tasks SET status = 'done', completed_at = ? WHERE id = ?")?;
        bind_all(&mut stmt, &[text(&format_timestamp(at)), Value::Integer(id)])?;
        run(&mut stmt)?;
        find_task(&conn, id)
    }

    /// Tasks marked done at or after `since`
    pub async fn count_completed_since(&self, since: DateTime<Utc>) -> Result<u64> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT COUNT(*) FROM tasks WHERE status = 'done' AND completed_at >= ?",
        )?;
        bind_all(&mut stmt, &[text(&format_timestamp(since))])?;
        read_count(&mut stmt)
    }

    pub async fn count_active_tasks(&self) -> Result<u64> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT COUNT(*) FROM tasks WHERE status IN ('todo', 'in_progress')")?;
        read_count(&mut stmt)
    }

    /// Active tasks, MITs first, then by priority (urgent first), then oldest first.
    /// `mit` restricts to MIT (`Some(true)`) or non-MIT (`Some(false)`) tasks.
    pub async fn active_tasks(&self, mit: Option<bool>, limit: usize) -> Result<Vec<Task>> {
        let conn = self.conn.lock().await;
        let mit_filter = match mit {
            Some(true) => " AND is_mit = 1",
            Some(false) => " AND is_mit = 0",
            None => "",
        };
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE status IN ('todo', 'in_progress'){mit_filter}
             ORDER BY is_mit DESC, {PRIORITY_RANK_SQL} DESC, id ASC
             LIMIT ?"
        );
        let mut stmt = conn.prepare(sql)?;
        bind_all(&mut stmt, &[Value::Integer(limit as i64)])?;
        read_tasks(&mut stmt)
    }

    /// Active tasks with `from < due_date <= to`, soonest first
    pub async fn tasks_due_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Task>> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE status IN ('todo', 'in_progress')
               AND due_date IS NOT NULL AND due_date > ? AND due_date <= ?
             ORDER BY due_date ASC, id ASC"
        );
        let mut stmt = conn.prepare(sql)?;
        bind_all(
            &mut stmt,
            &[text(&format_timestamp(from)), text(&format_timestamp(to))],
        )?;
        read_tasks(&mut stmt)
    }

    // ---- habits ---------------------------------------------------------

    pub async fn add_habit(&self, name: &str, is_active: bool) -> Result<i64> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("INSERT INTO habits (name, is_active) VALUES (?, ?)")?;
        bind_all(&mut stmt, &[text(name), flag(is_active)])?;
        run(&mut stmt)?;
        last_insert_id(&conn)
    }

    /// Record (or overwrite) the log for a habit on a day
    pub async fn log_habit(&self, habit_id: i64, date: NaiveDate, completed: bool) -> Result<()> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "INSERT OR REPLACE INTO habit_logs (habit_id, log_date, completed) VALUES (?, ?, ?)",
        )?;
        bind_all(
            &mut stmt,
            &[Value::Integer(habit_id), text(&format_date(date)), flag(completed)],
        )?;
        run(&mut stmt)
    }

    pub async fn active_habits(&self) -> Result<Vec<Habit>> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare("SELECT id, name, is_active FROM habits WHERE is_active = 1 ORDER BY id")?;
        let mut habits = Vec::new();
        while let State::Row = stmt.next()? {
            habits.push(Habit {
                id: stmt.read::<i64, _>("id")?,
                name: stmt.read::<String, _>("name")?,
                is_active: stmt.read::<i64, _>("is_active")? != 0,
            });
        }
        Ok(habits)
    }

    /// Completed logs of active habits with `from <= log_date <= to`
    pub async fn count_habit_completions(&self, from: NaiveDate, to: NaiveDate) -> Result<u64> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT COUNT(*) FROM habit_logs l
             JOIN habits h ON h.id = l.habit_id
             WHERE h.is_active = 1 AND l.completed = 1
               AND l.log_date >= ? AND l.log_date <= ?",
        )?;
        bind_all(&mut stmt, &[text(&format_date(from)), text(&format_date(to))])?;
        read_count(&mut stmt)
    }

    /// Days on or after `since` on which the habit was completed
    pub async fn habit_completed_days(
        &self,
        habit_id: i64,
        since: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT log_date FROM habit_logs
             WHERE habit_id = ? AND completed = 1 AND log_date >= ?
             ORDER BY log_date",
        )?;
        bind_all(&mut stmt, &[Value::Integer(habit_id), text(&format_date(since))])?;
        let mut days = Vec::new();
        while let State::Row = stmt.next()? {
            let raw = stmt.read::<String, _>("log_date")?;
            days.push(parse_date(&raw)?);
        }
        Ok(days)
    }

    // ---- health ---------------------------------------------------------

    pub async fn get_health_log(&self, date: NaiveDate) -> Result<Option<HealthLog>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT log_date, water_glasses, sleep_hours, mood FROM health_logs WHERE log_date = ?",
        )?;
        bind_all(&mut stmt, &[text(&format_date(date))])?;
        if let State::Row = stmt.next()? {
            let raw_date = stmt.read::<String, _>("log_date")?;
            Ok(Some(HealthLog {
                log_date: parse_date(&raw_date)?,
                water_glasses: stmt.read::<i64, _>("water_glasses")?.max(0) as u32,
                sleep_hours: stmt.read::<Option<f64>, _>("sleep_hours")?,
                mood: stmt
                    .read::<Option<i64>, _>("mood")?
                    .map(|m| m.clamp(0, u8::MAX as i64) as u8),
            }))
        } else {
            Ok(None)
        }
    }

    /// Add one glass of water to the day's log and return the new total
    pub async fn add_water_glass(&self, date: NaiveDate) -> Result<u32> {
        let day = format_date(date);
        let conn = self.conn.lock().await;

        let mut insert = conn.prepare(
            "INSERT OR IGNORE INTO health_logs (log_date, water_glasses) VALUES (?, 0)",
        )?;
        bind_all(&mut insert, &[text(&day)])?;
        run(&mut insert)?;

        let mut update = conn
            .prepare("UPDATE health_logs SET water_glasses = water_glasses + 1 WHERE log_date = ?")?;
        bind_all(&mut update, &[text(&day)])?;
        run(&mut update)?;

        let mut select =
            conn.prepare("SELECT water_glasses FROM health_logs WHERE log_date = ?")?;
        bind_all(&mut select, &[text(&day)])?;
        Ok(read_count(&mut select)? as u32)
    }
}

fn text(value: &str) -> Value {
    Value::String(value.to_string())
}

fn opt_text(value: Option<&str>) -> Value {
    value.map(text).unwrap_or(Value::Null)
}

fn flag(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

fn bind_all(stmt: &mut Statement<'_>, values: &[Value]) -> Result<()> {
    for (index, value) in values.iter().enumerate() {
        stmt.bind((index + 1, value.clone()))?;
    }
    Ok(())
}

/// Step a statement that returns no rows
fn run(stmt: &mut Statement<'_>) -> Result<()> {
    while let State::Row = stmt.next()? {}
    Ok(())
}

fn read_count(stmt: &mut Statement<'_>) -> Result<u64> {
    match stmt.next()? {
        State::Row => Ok(stmt.read::<i64, _>(0)?.max(0) as u64),
        State::Done => Ok(0),
    }
}

fn last_insert_id(conn: &Connection) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT last_insert_rowid()")?;
    match stmt.next()? {
        State::Row => Ok(stmt.read::<i64, _>(0)?),
        State::Done => Err(anyhow::anyhow!("last_insert_rowid returned no row")),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, crate::core::models::DATE_FORMAT)
        .map_err(|e| anyhow::anyhow!("Invalid date '{raw}': {e}"))
}

fn find_task(conn: &Connection, id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))?;
    bind_all(&mut stmt, &[Value::Integer(id)])?;
    Ok(read_tasks(&mut stmt)?.into_iter().next())
}

fn read_tasks(stmt: &mut Statement<'_>) -> Result<Vec<Task>> {
    let mut tasks = Vec::new();
    while let State::Row = stmt.next()? {
        let raw_status = stmt.read::<String, _>("status")?;
        let raw_priority = stmt.read::<String, _>("priority")?;
        tasks.push(Task {
            id: stmt.read::<i64, _>("id")?,
            title: stmt.read::<String, _>("title")?,
            status: TaskStatus::parse(&raw_status)
                .ok_or_else(|| anyhow::anyhow!("Unknown task status '{raw_status}'"))?,
            priority: TaskPriority::parse(&raw_priority).unwrap_or(TaskPriority::Medium),
            is_mit: stmt.read::<i64, _>("is_mit")? != 0,
            due_date: stmt
                .read::<Option<String>, _>("due_date")?
                .map(|raw| parse_timestamp(&raw))
                .transpose()?,
            completed_at: stmt
                .read::<Option<String>, _>("completed_at")?
                .map(|raw| parse_timestamp(&raw))
                .transpose()?,
        });
    }
    Ok(tasks)
}

fn read_settings(stmt: &Statement<'_>) -> Result<UserSettings> {
    let flag_at = |column: &str| -> Result<bool> { Ok(stmt.read::<i64, _>(column)? != 0) };
    Ok(UserSettings {
        name: stmt.read::<String, _>("name")?,
        weather_city: stmt.read::<String, _>("weather_city")?,
        telegram_chat_id: stmt
            .read::<Option<String>, _>("telegram_chat_id")?
            .filter(|id| !id.is_empty()),
        telegram_notifications_enabled: flag_at("telegram_notifications_enabled")?,
        morning_briefing_time: stmt.read::<String, _>("morning_briefing_time")?,
        midday_reminder_time: stmt.read::<String, _>("midday_reminder_time")?,
        evening_checkin_time: stmt.read::<String, _>("evening_checkin_time")?,
        // Out-of-range days are kept so the planner can report and skip them
        weekly_review_day: u8::try_from(stmt.read::<i64, _>("weekly_review_day")?)
            .unwrap_or(u8::MAX),
        weekly_review_time: stmt.read::<String, _>("weekly_review_time")?,
        enable_morning_briefing: flag_at("enable_morning_briefing")?,
        enable_midday_reminder: flag_at("enable_midday_reminder")?,
        enable_evening_checkin: flag_at("enable_evening_checkin")?,
        enable_weekly_review: flag_at("enable_weekly_review")?,
        enable_deadline_reminders: flag_at("enable_deadline_reminders")?,
        target_water_glasses: stmt.read::<i64, _>("target_water_glasses")?.max(0) as u32,
    })
}
