//! Week/day derivation for the timetable.
//!
//! Given a reference date, derives the seven labelled days that make up a displayed week,
//! and organises a flat list of lessons into those days. Everything here is a pure function
//! of its inputs; callers re-derive whenever the reference date or the lesson list changes.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::model::lesson::Lesson;

/// Weekday names indexed by day-of-week number, 0 = Sunday.
const WEEKDAY_NAMES: [&str; 7] = [
    "Воскресенье",
    "Понедельник",
    "Вторник",
    "Среда",
    "Четверг",
    "Пятница",
    "Суббота",
];

/// Month abbreviations indexed by 0-based calendar month.
const MONTH_ABBREVIATIONS: [&str; 12] = [
    "янв", "фев", "мар", "апр", "мая", "июн", "июл", "авг", "сен", "окт", "ноя", "дек",
];

/// Order in which weekdays are listed in exports (Monday first).
const DISPLAY_ORDER: [usize; 7] = [1, 2, 3, 4, 5, 6, 0];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekDay {
    pub name: &'static str,
    pub date: String,
    pub full_date: NaiveDate,
}

impl WeekDay {
    /// The key lessons use to attach themselves to this day, e.g. `Понедельник, 21 окт.`
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.date)
    }
}

/// Formats a date as `{day} {month}.`, e.g. `21 окт.`
pub fn format_day_month(date: NaiveDate) -> String {
    format!("{} {}.", date.day(), MONTH_ABBREVIATIONS[date.month0() as usize])
}

/// Moves `date` by `days`.
///
/// Past the edges of chrono's representable range the input date is returned unshifted, so
/// `derive_week` near `NaiveDate::MAX` yields repeated dates instead of seven consecutive ones.
fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    };
    // Only fails at the edges of chrono's representable range.
    shifted.unwrap_or(date)
}

pub fn derive_day(reference_start: NaiveDate, offset: u32) -> WeekDay {
    debug_assert!(offset <= 6, "day offset {offset} outside of a week");

    let full_date = shift_days(reference_start, offset as i64);
    let name = WEEKDAY_NAMES[full_date.weekday().num_days_from_sunday() as usize];

    WeekDay {
        name,
        date: format_day_month(full_date),
        full_date,
    }
}

/// The seven days starting at `reference_start`, in offset order.
///
/// The first entry is whatever weekday `reference_start` falls on; it is not realigned to Monday.
pub fn derive_week(reference_start: NaiveDate) -> [WeekDay; 7] {
    std::array::from_fn(|offset| derive_day(reference_start, offset as u32))
}

/// Lessons whose `day_name` is exactly `day_label`, ordered by lesson number.
///
/// The sort is stable, so lessons sharing a number keep their input order.
pub fn lessons_for_day<'a>(lessons: &'a [Lesson], day_label: &str) -> Vec<&'a Lesson> {
    let mut day_lessons = lessons
        .iter()
        .filter(|lesson| lesson.day_name == day_label)
        .collect::<Vec<&Lesson>>();

    day_lessons.sort_by_key(|lesson| lesson.lesson_number);
    day_lessons
}

/// First day of a numbered week, relative to the week currently anchored at `reference_start`.
pub fn week_start_for_number(week_number: i32, current_week: i32, reference_start: NaiveDate) -> NaiveDate {
    let week_delta = week_number as i64 - current_week as i64;
    shift_days(reference_start, week_delta * 7)
}

/// `"{start} - {end}"` for a numbered week, e.g. `28 окт. - 3 ноя.`
pub fn week_date_range_label(week_number: i32, current_week: i32, reference_start: NaiveDate) -> String {
    let start = week_start_for_number(week_number, current_week, reference_start);
    let end = shift_days(start, 6);

    format!("{} - {}", format_day_month(start), format_day_month(end))
}

/// The Monday on or before `date`.
pub fn week_start_for(date: NaiveDate) -> NaiveDate {
    shift_days(date, -(date.weekday().num_days_from_monday() as i64))
}

/// The date a day label such as `Понедельник, 21 окт.` names, taking the year that puts it
/// closest to `near`. `None` when the label carries no day and month.
pub fn parse_day_label(day_name: &str, near: NaiveDate) -> Option<NaiveDate> {
    let (_, day_month) = day_name.split_once(',')?;
    let mut parts = day_month.split_whitespace();
    let day = parts.next()?.parse::<u32>().ok()?;
    let month_abbrev = parts.next()?.trim_end_matches('.');
    let month0 = MONTH_ABBREVIATIONS
        .iter()
        .position(|abbrev| *abbrev == month_abbrev)?;

    (near.year() - 1..=near.year() + 1)
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month0 as u32 + 1, day))
        .min_by_key(|date| date.signed_duration_since(near).num_days().abs())
}

/// Moves a day label by whole weeks, e.g. `Понедельник, 21 окт.` one week on is
/// `Понедельник, 28 окт.` Labels without a parseable date are returned unchanged.
pub fn shift_day_label(day_name: &str, weeks: i32, near: NaiveDate) -> String {
    match parse_day_label(day_name, near) {
        Some(date) => derive_day(shift_days(date, weeks as i64 * 7), 0).label(),
        None => day_name.to_owned(),
    }
}

fn weekday_index(day_name: &str) -> Option<usize> {
    let prefix = day_name.split(',').next().unwrap_or_default().trim();
    WEEKDAY_NAMES.iter().position(|name| *name == prefix)
}

/// Position of the weekday named in a day label within a Monday-first week.
pub fn weekday_position(day_name: &str) -> Option<usize> {
    let index = weekday_index(day_name)?;
    DISPLAY_ORDER.iter().position(|&i| i == index)
}

/// Groups lessons by the weekday named in their day label, Monday first.
///
/// Each group is ordered by lesson number. Days without lessons are left out, as are lessons whose
/// label does not start with a known weekday.
pub fn group_by_weekday(lessons: &[Lesson]) -> Vec<(&'static str, Vec<&Lesson>)> {
    let mut buckets: [Vec<&Lesson>; 7] = Default::default();
    for lesson in lessons {
        if let Some(index) = weekday_index(&lesson.day_name) {
            buckets[index].push(lesson);
        }
    }

    DISPLAY_ORDER
        .iter()
        .filter_map(|&index| {
            let mut day_lessons = std::mem::take(&mut buckets[index]);
            if day_lessons.is_empty() {
                return None;
            }
            day_lessons.sort_by_key(|lesson| lesson.lesson_number);
            Some((WEEKDAY_NAMES[index], day_lessons))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lesson(id: i32, day_name: &str, lesson_number: i32) -> Lesson {
        Lesson {
            id,
            day_name: day_name.into(),
            lesson_number,
            subject: format!("subject {id}"),
            teacher: "Петрова М.С.".into(),
            time_start: "8:00".into(),
            time_end: "8:40".into(),
            homework: None,
            notes: None,
            homework_files: vec![],
            week_number: 1,
        }
    }

    #[test]
    fn monday_reference_day() {
        let day = derive_day(date(2024, 10, 21), 0);
        assert_eq!(day.name, "Понедельник");
        assert_eq!(day.date, "21 окт.");
        assert_eq!(day.label(), "Понедельник, 21 окт.");
    }

    #[test]
    fn week_is_seven_consecutive_days() {
        for start in [date(2024, 10, 21), date(2024, 12, 28), date(2024, 2, 26), date(2023, 1, 1)] {
            let week = derive_week(start);
            assert_eq!(week.len(), 7);
            for (i, day) in week.iter().enumerate() {
                assert_eq!(day.full_date, start + Days::new(i as u64));
            }
            for pair in week.windows(2) {
                assert_eq!(pair[1].full_date - pair[0].full_date, chrono::TimeDelta::days(1));
            }
        }
    }

    #[test]
    fn week_starts_on_reference_weekday() {
        // 2024-10-23 is a Wednesday
        let week = derive_week(date(2024, 10, 23));
        let names = week.iter().map(|d| d.name).collect::<Vec<_>>();
        assert_eq!(
            names,
            ["Среда", "Четверг", "Пятница", "Суббота", "Воскресенье", "Понедельник", "Вторник"]
        );
    }

    #[test]
    fn week_crosses_month_and_year() {
        let week = derive_week(date(2024, 12, 29));
        assert_eq!(week[0].date, "29 дек.");
        assert_eq!(week[3].date, "1 янв.");
        assert_eq!(week[3].full_date, date(2025, 1, 1));
        assert_eq!(week[3].name, "Среда");
    }

    #[test]
    fn leap_day_is_derived() {
        let week = derive_week(date(2024, 2, 26));
        assert_eq!(week[3].date, "29 фев.");
        assert_eq!(week[4].date, "1 мар.");
    }

    #[test]
    fn lessons_sorted_by_number() {
        let lessons = vec![
            lesson(1, "Понедельник, 21 окт.", 3),
            lesson(2, "Понедельник, 21 окт.", 1),
        ];
        let day = lessons_for_day(&lessons, "Понедельник, 21 окт.");
        let ids = day.iter().map(|l| l.id).collect::<Vec<_>>();
        assert_eq!(ids, [2, 1]);
    }

    #[test]
    fn equal_numbers_keep_input_order() {
        let lessons = vec![
            lesson(10, "Вторник, 22 окт.", 2),
            lesson(11, "Вторник, 22 окт.", 1),
            lesson(12, "Вторник, 22 окт.", 2),
            lesson(13, "Вторник, 22 окт.", 2),
        ];
        let ids = lessons_for_day(&lessons, "Вторник, 22 окт.")
            .iter()
            .map(|l| l.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, [11, 10, 12, 13]);
    }

    #[test]
    fn filtering_is_exact_and_idempotent() {
        let lessons = vec![
            lesson(1, "Среда, 23 окт.", 2),
            lesson(2, "Среда, 23 окт. ", 1),
            lesson(3, "среда, 23 окт.", 1),
            lesson(4, "Четверг, 24 окт.", 1),
            lesson(5, "Среда, 23 окт.", 1),
        ];
        let once = lessons_for_day(&lessons, "Среда, 23 окт.");
        assert_eq!(once.iter().map(|l| l.id).collect::<Vec<_>>(), [5, 1]);

        let owned = once.into_iter().cloned().collect::<Vec<Lesson>>();
        let twice = lessons_for_day(&owned, "Среда, 23 окт.");
        assert_eq!(twice.iter().map(|l| l.id).collect::<Vec<_>>(), [5, 1]);
        assert!(twice.windows(2).all(|w| w[0].lesson_number <= w[1].lesson_number));
    }

    #[test]
    fn no_lessons_no_matches() {
        assert!(lessons_for_day(&[], "Понедельник, 21 окт.").is_empty());
        let lessons = vec![lesson(1, "Пятница, 25 окт.", 1)];
        assert!(lessons_for_day(&lessons, "garbage").is_empty());
    }

    #[test]
    fn range_label_for_current_and_other_weeks() {
        let start = date(2024, 10, 21);
        assert_eq!(week_date_range_label(1, 1, start), "21 окт. - 27 окт.");
        assert_eq!(week_date_range_label(2, 1, start), "28 окт. - 3 ноя.");
        assert_eq!(week_date_range_label(1, 3, start), "7 окт. - 13 окт.");
    }

    #[test]
    fn monday_on_or_before() {
        assert_eq!(week_start_for(date(2024, 10, 21)), date(2024, 10, 21));
        assert_eq!(week_start_for(date(2024, 10, 27)), date(2024, 10, 21));
        assert_eq!(week_start_for(date(2025, 1, 1)), date(2024, 12, 30));
    }

    #[test]
    fn positions_are_monday_first() {
        assert_eq!(weekday_position("Понедельник, 21 окт."), Some(0));
        assert_eq!(weekday_position("Воскресенье, 27 окт."), Some(6));
        assert_eq!(weekday_position("Funday, 1 янв."), None);
    }

    #[test]
    fn grouping_follows_monday_first_order() {
        let lessons = vec![
            lesson(1, "Воскресенье, 27 окт.", 1),
            lesson(2, "Понедельник, 21 окт.", 2),
            lesson(3, "Понедельник, 21 окт.", 1),
            lesson(4, "Непонятно", 1),
            lesson(5, "Среда", 4),
        ];
        let groups = group_by_weekday(&lessons);
        let summary = groups
            .iter()
            .map(|(name, day)| (*name, day.iter().map(|l| l.id).collect::<Vec<_>>()))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            [
                ("Понедельник", vec![3, 2]),
                ("Среда", vec![5]),
                ("Воскресенье", vec![1]),
            ]
        );
    }

    #[test]
    fn day_labels_parse_near_reference() {
        let near = date(2024, 10, 23);
        assert_eq!(parse_day_label("Понедельник, 21 окт.", near), Some(date(2024, 10, 21)));
        assert_eq!(parse_day_label("Среда, 1 янв.", near), Some(date(2025, 1, 1)));
        assert_eq!(parse_day_label("Среда", near), None);
        assert_eq!(parse_day_label("Среда, 31 фев.", near), None);
        assert_eq!(parse_day_label("Среда, 3 брм.", near), None);
    }

    #[test]
    fn shifted_labels_match_target_week() {
        let near = date(2024, 10, 23);
        assert_eq!(
            shift_day_label("Понедельник, 21 окт.", 1, near),
            "Понедельник, 28 окт."
        );
        assert_eq!(
            shift_day_label("Четверг, 31 окт.", 1, near),
            "Четверг, 7 ноя."
        );
        assert_eq!(shift_day_label("Пятница, 1 ноя.", -2, near), "Пятница, 18 окт.");
        assert_eq!(shift_day_label("Непонятно", 3, near), "Непонятно");

        // Lessons copied a week ahead land on the days of the shifted week.
        let target = derive_week(week_start_for_number(2, 1, date(2024, 10, 21)));
        let moved = shift_day_label("Среда, 23 окт.", 1, near);
        assert_eq!(moved, target[2].label());
    }

    #[test]
    fn week_at_end_of_range_repeats_dates() {
        let week = derive_week(NaiveDate::MAX);
        assert_eq!(week[0].full_date, NaiveDate::MAX);
        assert_eq!(week[6].full_date, NaiveDate::MAX);
    }
}
