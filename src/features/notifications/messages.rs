//! Message texts for scheduled notifications (Telegram HTML)

use crate::core::models::Task;
use crate::core::response::escape_html;
use crate::features::weather::Weather;

pub fn morning_briefing(weather: &Weather, mit_tasks: &[Task], other_tasks: &[Task]) -> String {
    let mut text = String::from("☀️ <b>Доброго ранку!</b>\n\n");
    text.push_str(&format!(
        "🌤 {}: {}°C, {}\n\n",
        escape_html(&weather.city),
        weather.temperature,
        escape_html(&weather.description)
    ));

    if !mit_tasks.is_empty() {
        text.push_str("🎯 <b>Твої пріоритети:</b>\n");
        for (i, task) in mit_tasks.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", i + 1, escape_html(&task.title)));
        }
        text.push('\n');
    }

    if !other_tasks.is_empty() {
        text.push_str("📝 <b>Також на сьогодні:</b>\n");
        for task in other_tasks {
            text.push_str(&format!("• {}\n", escape_html(&task.title)));
        }
        text.push('\n');
    }

    text.push_str("💧 Не забудь випити склянку води!\n");
    text.push_str("💪 Вперед до продуктивного дня!");
    text
}

pub fn midday_reminder(completed_today: u64) -> String {
    if completed_today == 0 {
        "⏰ <b>Час для маленького кроку!</b>\n\n\
         Ще жодної задачі сьогодні. Почни з найпростішої на 10 хвилин.\n\n\
         💧 І не забудь про воду!"
            .to_string()
    } else {
        format!(
            "👍 <b>Молодець!</b>\n\n\
             Вже виконано задач: {completed_today}\n\
             Продовжуй у тому ж дусі!\n\n\
             💧 Час для склянки води."
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EveningStats {
    pub completed_today: u64,
    pub remaining: u64,
    pub habits_done: u64,
    pub habits_total: u64,
    pub water_glasses: u32,
    pub water_target: u32,
}

pub fn evening_checkin(stats: &EveningStats) -> String {
    let mut text = format!(
        "🌙 <b>Вечірній підсумок</b>\n\n\
         ✅ Виконано сьогодні: {}\n\
         ⏳ Залишилось: {}\n",
        stats.completed_today, stats.remaining
    );
    if stats.habits_total > 0 {
        text.push_str(&format!(
            "🎯 Звички: {}/{}\n",
            stats.habits_done, stats.habits_total
        ));
    }
    text.push_str(&format!(
        "💧 Вода: {}/{}\n\n",
        stats.water_glasses, stats.water_target
    ));

    if stats.completed_today > 0 {
        text.push_str("👏 Гарна робота сьогодні!\n\n");
    }

    text.push_str("Подумай:\n");
    text.push_str("• Що вдалось сьогодні?\n");
    text.push_str("• Який один крок зробити завтра?\n\n");
    text.push_str("😴 Час для відпочинку!");
    text
}

/// Percentage of possible habit check-ins that were completed, capped at 100
pub fn habit_completion_rate(completions: u64, active_habits: usize, days: u32) -> u32 {
    let possible = active_habits as u64 * u64::from(days);
    if possible == 0 {
        return 0;
    }
    let rate = (completions as f64 / possible as f64 * 100.0).round() as u32;
    rate.min(100)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyStats {
    pub completed: u64,
    pub habit_rate: u32,
    /// Habit with the longest running streak, if any streak is running
    pub best_streak: Option<(String, u32)>,
}

pub fn weekly_review(stats: &WeeklyStats) -> String {
    let mut text = format!(
        "📊 <b>Підсумок тижня</b>\n\n\
         ✅ Виконано задач: {}\n\
         🎯 Звички: {}%\n",
        stats.completed, stats.habit_rate
    );
    if let Some((name, days)) = &stats.best_streak {
        text.push_str(&format!(
            "🔥 Найкраща серія: {} ({} дн.)\n",
            escape_html(name),
            days
        ));
    }
    text.push('\n');

    if stats.habit_rate >= 70 {
        text.push_str("🎉 Чудовий тиждень! Так тримати!\n");
    } else if stats.habit_rate >= 50 {
        text.push_str("👍 Непогано! Є над чим працювати.\n");
    } else {
        text.push_str("💪 Наступний тиждень буде кращим!\n");
    }

    text.push_str("\n🎯 Плануй наступний тиждень зараз!");
    text
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineWindow {
    /// Due in roughly a day
    Tomorrow,
    /// Due within the next two hours
    Urgent,
}

pub fn deadline_reminder(title: &str, window: DeadlineWindow) -> String {
    let title = escape_html(title);
    match window {
        DeadlineWindow::Tomorrow => format!(
            "⏰ <b>Нагадування про дедлайн</b>\n\n\
             Задача: {title}\n\
             Дедлайн: завтра\n\n\
             Час діяти!"
        ),
        DeadlineWindow::Urgent => format!(
            "🚨 <b>ТЕРМІНОВО!</b>\n\n\
             Задача: {title}\n\
             Дедлайн: через 2 години!\n\n\
             Зроби це ЗАРАЗ!"
        ),
    }
}
