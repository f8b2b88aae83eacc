//! Chat commands sent to the bot (`/start`, `/today`, `/add`, ...)

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use log::debug;
use std::sync::Arc;

use super::client::Notifier;
use super::updates::Update;
use crate::core::models::{NewTask, Task, TaskStatus};
use crate::core::response::escape_html;
use crate::database::Database;
use crate::features::notifications::schedule::local_day_start;

const TODAY_LIMIT: usize = 10;
const TODAY_OTHER_LIMIT: usize = 7;
const WATER_BAR_SLOTS: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Today,
    Add(String),
    Done(String),
    Week,
    Water,
    Unknown(String),
}

impl BotCommand {
    /// Parse a message text; `None` for anything that isn't a command.
    /// A `@botname` suffix on the command is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }

        let (head, args) = match text.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim().to_string()),
            None => (text, String::new()),
        };
        let name = head.split('@').next().unwrap_or(head).to_lowercase();

        let command = match name.as_str() {
            "/start" => BotCommand::Start,
            "/help" => BotCommand::Help,
            "/today" => BotCommand::Today,
            "/add" => BotCommand::Add(args),
            "/done" => BotCommand::Done(args),
            "/week" => BotCommand::Week,
            "/water" => BotCommand::Water,
            _ => BotCommand::Unknown(name),
        };
        Some(command)
    }
}

#[derive(Clone)]
pub struct CommandHandler {
    database: Database,
    notifier: Arc<dyn Notifier>,
    timezone: Tz,
}

impl CommandHandler {
    pub fn new(database: Database, notifier: Arc<dyn Notifier>, timezone: Tz) -> Self {
        Self {
            database,
            notifier,
            timezone,
        }
    }

    pub async fn handle_update(&self, update: &Update) -> Result<()> {
        let Some(message) = &update.message else {
            return Ok(());
        };
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let Some(command) = BotCommand::parse(text) else {
            return Ok(());
        };

        let chat_id = message.chat.id.to_string();
        self.handle_command(&chat_id, command).await
    }

    pub async fn handle_command(&self, chat_id: &str, command: BotCommand) -> Result<()> {
        debug!("Command {command:?} from chat {chat_id}");
        let reply = self.respond(chat_id, command, Utc::now()).await?;
        self.notifier.send_message(chat_id, &reply).await?;
        Ok(())
    }

    /// Apply the command and build the reply text
    pub async fn respond(
        &self,
        chat_id: &str,
        command: BotCommand,
        now: DateTime<Utc>,
    ) -> Result<String> {
        match command {
            BotCommand::Start => self.start(chat_id).await,
            BotCommand::Help => Ok(help_text()),
            BotCommand::Today => self.today().await,
            BotCommand::Add(title) => self.add(&title).await,
            BotCommand::Done(raw_id) => self.done(&raw_id, now).await,
            BotCommand::Week => self.week(now).await,
            BotCommand::Water => self.water(now).await,
            BotCommand::Unknown(_) => {
                Ok("Невідома команда. Напиши /help для списку команд.".to_string())
            }
        }
    }

    async fn start(&self, chat_id: &str) -> Result<String> {
        self.database.set_telegram_chat_id(chat_id).await?;
        Ok("👋 <b>Вітаю у LifeHub!</b>\n\n\
            ✅ Твій Telegram зареєстровано для сповіщень.\n\n\
            Тепер ти будеш отримувати:\n\
            • Ранкові брифінги\n\
            • Нагадування про задачі\n\
            • Вечірні чек-іни\n\n\
            Напиши /help для списку команд."
            .to_string())
    }

    async fn today(&self) -> Result<String> {
        let tasks = self.database.active_tasks(None, TODAY_LIMIT).await?;
        if tasks.is_empty() {
            return Ok("✨ Немає активних задач! Час відпочити або додати нові.".to_string());
        }

        let (mit, other): (Vec<&Task>, Vec<&Task>) = tasks.iter().partition(|t| t.is_mit);
        let mut text = String::from("📋 <b>Задачі на сьогодні:</b>\n\n");

        if !mit.is_empty() {
            text.push_str("🎯 <b>MIT (Найважливіші):</b>\n");
            for task in mit {
                text.push_str(&task_line(task));
            }
            text.push('\n');
        }

        if !other.is_empty() {
            text.push_str("📝 <b>Інші задачі:</b>\n");
            for task in other.into_iter().take(TODAY_OTHER_LIMIT) {
                text.push_str(&task_line(task));
            }
        }
        Ok(text)
    }

    async fn add(&self, title: &str) -> Result<String> {
        let title = title.trim();
        if title.is_empty() {
            return Ok("❌ Вкажи текст задачі: /add Назва задачі".to_string());
        }
        let id = self.database.add_task(&NewTask::new(title)).await?;
        Ok(format!(
            "✅ Задачу додано!\n\n<b>{}</b>\nID: {id}",
            escape_html(title)
        ))
    }

    async fn done(&self, raw_id: &str, now: DateTime<Utc>) -> Result<String> {
        let raw_id = raw_id.trim();
        if raw_id.is_empty() {
            return Ok("❌ Вкажи ID задачі: /done 123".to_string());
        }
        let Ok(id) = raw_id.parse::<i64>() else {
            return Ok("❌ Невірний ID задачі".to_string());
        };

        match self.database.complete_task(id, now).await? {
            Some(task) => Ok(format!(
                "🎉 <b>Задачу виконано!</b>\n\n✅ {}",
                escape_html(&task.title)
            )),
            None => Ok("❌ Задачу не знайдено".to_string()),
        }
    }

    async fn week(&self, now: DateTime<Utc>) -> Result<String> {
        let today = now.with_timezone(&self.timezone).date_naive();
        let since = local_day_start(today - Duration::days(6), self.timezone);
        let completed = self.database.count_completed_since(since).await?;
        let pending = self.database.count_active_tasks().await?;
        Ok(format!(
            "📊 <b>Огляд тижня:</b>\n\n\
             ✅ Виконано задач: {completed}\n\
             ⏳ Залишилось: {pending}\n"
        ))
    }

    async fn water(&self, now: DateTime<Utc>) -> Result<String> {
        let today = now.with_timezone(&self.timezone).date_naive();
        let glasses = self.database.add_water_glass(today).await?;
        Ok(format!(
            "💧 <b>Воду додано!</b>\n\n{}\nСьогодні: {glasses} склянок",
            water_bar(glasses)
        ))
    }
}

fn help_text() -> String {
    "📚 <b>Команди LifeHub:</b>\n\n\
     /today - Задачі на сьогодні\n\
     /add &lt;текст&gt; - Додати задачу\n\
     /done &lt;id&gt; - Завершити задачу\n\
     /week - Огляд тижня\n\
     /water - Додати склянку води\n\
     /help - Ця довідка"
        .to_string()
}

fn task_line(task: &Task) -> String {
    let marker = if task.status == TaskStatus::InProgress {
        "⏳"
    } else {
        "⬜"
    };
    format!("{marker} [{}] {}\n", task.id, escape_html(&task.title))
}

fn water_bar(glasses: u32) -> String {
    let filled = glasses.min(WATER_BAR_SLOTS) as usize;
    let empty = WATER_BAR_SLOTS as usize - filled;
    format!("{}{}", "💧".repeat(filled), "⚪".repeat(empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::TaskPriority;
    use crate::features::telegram::updates::{Chat, IncomingMessage};
    use crate::features::telegram::SendError;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::Europe::Warsaw;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), SendError> {
            self.sent
                .lock()
                .await
                .push((chat_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    async fn setup() -> (CommandHandler, Database, Arc<RecordingNotifier>) {
        let db = Database::in_memory().await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let handler = CommandHandler::new(db.clone(), notifier.clone(), Warsaw);
        (handler, db, notifier)
    }

    /// 2026-01-14 12:00 Warsaw
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 14, 11, 0, 0).unwrap()
    }

    fn update(chat: i64, text: Option<&str>) -> Update {
        Update {
            update_id: 1,
            message: Some(IncomingMessage {
                message_id: 1,
                chat: Chat { id: chat },
                text: text.map(String::from),
            }),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(BotCommand::parse("/start"), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("  /HELP "), Some(BotCommand::Help));
        assert_eq!(BotCommand::parse("/today@lifehub_bot"), Some(BotCommand::Today));
        assert_eq!(
            BotCommand::parse("/add   Buy milk  "),
            Some(BotCommand::Add("Buy milk".to_string()))
        );
        assert_eq!(
            BotCommand::parse("/done@lifehub_bot 12"),
            Some(BotCommand::Done("12".to_string()))
        );
        assert_eq!(BotCommand::parse("/add"), Some(BotCommand::Add(String::new())));
        assert_eq!(
            BotCommand::parse("/nope"),
            Some(BotCommand::Unknown("/nope".to_string()))
        );
        assert_eq!(BotCommand::parse("hello"), None);
    }

    #[test]
    fn test_water_bar() {
        assert_eq!(water_bar(0), "⚪".repeat(8));
        assert_eq!(water_bar(3), format!("{}{}", "💧".repeat(3), "⚪".repeat(5)));
        assert_eq!(water_bar(11), "💧".repeat(8));
    }

    #[tokio::test]
    async fn test_start_registers_chat_and_replies() {
        let (handler, db, notifier) = setup().await;
        handler.handle_update(&update(4242, Some("/start"))).await.unwrap();

        let settings = db.get_user_settings().await.unwrap().unwrap();
        assert_eq!(settings.telegram_chat_id.as_deref(), Some("4242"));

        let sent = notifier.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "4242");
        assert!(sent[0].1.contains("Вітаю у LifeHub"));
    }

    #[tokio::test]
    async fn test_plain_text_and_empty_messages_are_ignored() {
        let (handler, _db, notifier) = setup().await;
        handler.handle_update(&update(1, Some("hi there"))).await.unwrap();
        handler.handle_update(&update(1, None)).await.unwrap();
        handler
            .handle_update(&Update {
                update_id: 2,
                message: None,
            })
            .await
            .unwrap();
        assert!(notifier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_hint() {
        let (handler, _db, notifier) = setup().await;
        handler.handle_update(&update(1, Some("/dance"))).await.unwrap();
        assert!(notifier.sent.lock().await[0].1.contains("Напиши /help"));
    }

    #[tokio::test]
    async fn test_today_sections_and_markers() {
        let (handler, db, _notifier) = setup().await;
        let reply = handler.respond("1", BotCommand::Today, now()).await.unwrap();
        assert!(reply.contains("Немає активних задач"));

        db.add_task(&NewTask::new("Focus <work>").mit().status(TaskStatus::InProgress))
            .await
            .unwrap();
        for i in 0..9 {
            db.add_task(&NewTask::new(format!("chore {i}"))).await.unwrap();
        }
        db.add_task(&NewTask::new("Pay rent").priority(TaskPriority::Urgent))
            .await
            .unwrap();

        let reply = handler.respond("1", BotCommand::Today, now()).await.unwrap();
        assert!(reply.contains("🎯 <b>MIT (Найважливіші):</b>\n⏳ [1] Focus &lt;work&gt;\n"));
        // Urgent first among the others, then at most 7 lines in total
        assert!(reply.contains("📝 <b>Інші задачі:</b>\n⬜ [11] Pay rent\n"));
        assert_eq!(reply.matches("⬜").count(), 7);
    }

    #[tokio::test]
    async fn test_add_and_done() {
        let (handler, db, _notifier) = setup().await;

        let reply = handler
            .respond("1", BotCommand::Add(String::new()), now())
            .await
            .unwrap();
        assert!(reply.contains("Вкажи текст задачі"));

        let reply = handler
            .respond("1", BotCommand::Add("Write report".to_string()), now())
            .await
            .unwrap();
        assert!(reply.contains("<b>Write report</b>\nID: 1"));

        let reply = handler
            .respond("1", BotCommand::Done("1".to_string()), now())
            .await
            .unwrap();
        assert!(reply.contains("✅ Write report"));
        let task = db.get_task(1).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.completed_at, Some(now()));
    }

    #[tokio::test]
    async fn test_done_error_replies() {
        let (handler, _db, _notifier) = setup().await;
        let reply = |arg: &str| handler.respond("1", BotCommand::Done(arg.to_string()), now());

        assert!(reply("").await.unwrap().contains("Вкажи ID задачі"));
        assert!(reply("abc").await.unwrap().contains("Невірний ID задачі"));
        assert!(reply("99").await.unwrap().contains("Задачу не знайдено"));
    }

    #[tokio::test]
    async fn test_week_counts_last_seven_days() {
        let (handler, db, _notifier) = setup().await;
        db.add_task(&NewTask::new("old").completed(Utc.with_ymd_and_hms(2026, 1, 7, 10, 0, 0).unwrap()))
            .await
            .unwrap();
        db.add_task(&NewTask::new("new").completed(Utc.with_ymd_and_hms(2026, 1, 12, 10, 0, 0).unwrap()))
            .await
            .unwrap();
        db.add_task(&NewTask::new("open")).await.unwrap();

        let reply = handler.respond("1", BotCommand::Week, now()).await.unwrap();
        assert!(reply.contains("✅ Виконано задач: 1"));
        assert!(reply.contains("⏳ Залишилось: 1"));
    }

    #[tokio::test]
    async fn test_water_increments_todays_log() {
        let (handler, db, _notifier) = setup().await;
        handler.respond("1", BotCommand::Water, now()).await.unwrap();
        let reply = handler.respond("1", BotCommand::Water, now()).await.unwrap();
        assert!(reply.contains("Сьогодні: 2 склянок"));
        assert!(reply.contains(&format!("{}{}", "💧".repeat(2), "⚪".repeat(6))));

        let day = NaiveDate::from_ymd_opt(2026, 1, 14).unwrap();
        assert_eq!(db.get_health_log(day).await.unwrap().unwrap().water_glasses, 2);
    }
}
