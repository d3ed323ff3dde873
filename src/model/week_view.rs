use serde::Serialize;

use crate::model::lesson::{HomeworkFile, Lesson};
use crate::week_calendar::{
    WeekDay, derive_week, lessons_for_day, week_date_range_label, week_start_for_number,
    weekday_position,
};

#[derive(Debug, Serialize)]
pub struct WeekView {
    pub week_number: i32,
    pub range_label: String,
    pub days: Vec<DayView>,
}

impl WeekView {
    /// Lays out the lessons of `week_number` over its seven days.
    ///
    /// `reference_start` anchors `current_week`; other week numbers are shifted by whole weeks.
    pub fn build(
        lessons: &[Lesson],
        week_number: i32,
        current_week: i32,
        reference_start: chrono::NaiveDate,
    ) -> Self {
        let start = week_start_for_number(week_number, current_week, reference_start);

        let days = derive_week(start)
            .into_iter()
            .map(|day| {
                let label = day.label();
                let lessons = lessons_for_day(lessons, &label)
                    .into_iter()
                    .cloned()
                    .collect();
                DayView { day, label, lessons }
            })
            .collect();

        Self {
            week_number,
            range_label: week_date_range_label(week_number, current_week, reference_start),
            days,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DayView {
    #[serde(flatten)]
    pub day: WeekDay,
    pub label: String,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Serialize)]
pub struct Notification {
    pub lesson_id: i32,
    pub day_name: String,
    pub lesson_number: i32,
    pub subject: String,
    pub homework: Option<String>,
    pub files: Vec<HomeworkFile>,
}

impl From<&Lesson> for Notification {
    fn from(lesson: &Lesson) -> Self {
        Self {
            lesson_id: lesson.id,
            day_name: lesson.day_name.clone(),
            lesson_number: lesson.lesson_number,
            subject: lesson.subject.clone(),
            homework: lesson.homework.clone(),
            files: lesson.homework_files.clone(),
        }
    }
}

/// Homework notices for a week, Monday first, then by lesson number.
pub fn homework_notifications(lessons: &[Lesson]) -> Vec<Notification> {
    let mut with_homework = lessons
        .iter()
        .filter(|lesson| lesson.has_homework())
        .collect::<Vec<&Lesson>>();

    with_homework.sort_by_key(|lesson| {
        (
            weekday_position(&lesson.day_name).unwrap_or(usize::MAX),
            lesson.lesson_number,
        )
    });

    with_homework.into_iter().map(Notification::from).collect()
}
