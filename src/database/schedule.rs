use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{Postgres, Row, Transaction, postgres::PgRow};

use crate::model::lesson::{HomeworkFile, Lesson, non_empty};
use crate::postgres_lock;
use crate::week_calendar::shift_day_label;

/// Editable fields of an existing lesson. Day, number and week stay where they were created.
pub struct LessonUpdate {
    pub id: i32,
    pub subject: String,
    pub time_start: String,
    pub time_end: String,
    pub teacher: String,
    pub homework: Option<String>,
    pub notes: Option<String>,
    /// Replaces the attachment list when present
    pub homework_files: Option<Vec<HomeworkFile>>,
}

fn lesson_from_row(row: &PgRow) -> Lesson {
    Lesson {
        id: row.get("id"),
        day_name: row.get("day_name"),
        lesson_number: row.get("lesson_number"),
        subject: row.get("subject"),
        time_start: row.get("time_start"),
        time_end: row.get("time_end"),
        teacher: row.get("teacher"),
        homework: non_empty(row.get("homework")),
        notes: non_empty(row.get("notes")),
        homework_files: vec![],
        week_number: row.get("week_number"),
    }
}

async fn insert_files(
    transaction: &mut Transaction<'_, Postgres>,
    lesson_id: i32,
    files: &[HomeworkFile],
) -> Result<(), String> {
    for file in files {
        if let Err(e) = sqlx::query(
            "INSERT INTO lesson_files (schedule_id, file_name, file_url) VALUES ($1, $2, $3);",
        )
        .bind(lesson_id)
        .bind(&file.file_name)
        .bind(&file.file_url)
        .execute(&mut **transaction)
        .await
        {
            return Err(format!("Could not attach {}: {e}", file.file_name));
        }
    }
    Ok(())
}

/// All lessons of a numbered week with their attachments, ordered by lesson number.
pub async fn list_week(week_number: i32) -> Result<Vec<Lesson>, String> {
    postgres_lock!(transaction, {
        let rows = match sqlx::query(
            "SELECT id, day_name, lesson_number, subject, time_start, time_end,
                    teacher, homework, notes, week_number
            FROM schedule
            WHERE week_number = $1
            ORDER BY lesson_number, id;",
        )
        .bind(week_number)
        .fetch_all(&mut *transaction)
        .await
        {
            Ok(r) => r,
            Err(e) => return Err(format!("{e}")),
        };

        let mut lessons = rows.iter().map(lesson_from_row).collect::<Vec<Lesson>>();
        let lesson_ids = lessons.iter().map(|l| l.id).collect::<Vec<i32>>();

        let file_rows = match sqlx::query(
            "SELECT id, schedule_id, file_name, file_url
            FROM lesson_files
            WHERE schedule_id = ANY($1)
            ORDER BY id;",
        )
        .bind(&lesson_ids)
        .fetch_all(&mut *transaction)
        .await
        {
            Ok(r) => r,
            Err(e) => return Err(format!("{e}")),
        };

        let mut files_by_lesson: HashMap<i32, Vec<HomeworkFile>> = HashMap::new();
        for row in file_rows {
            files_by_lesson
                .entry(row.get("schedule_id"))
                .or_default()
                .push(HomeworkFile {
                    id: row.get("id"),
                    file_name: row.get("file_name"),
                    file_url: row.get("file_url"),
                });
        }

        for lesson in lessons.iter_mut() {
            if let Some(files) = files_by_lesson.remove(&lesson.id) {
                lesson.homework_files = files;
            }
        }

        return Ok(lessons);
    });

    Err("Failed to acquire database lock".into())
}

/// Stores `lesson` (its `id` is ignored) with its attachments and returns the new id.
pub async fn create_lesson(lesson: Lesson) -> Result<i32, String> {
    postgres_lock!(transaction, {
        let lesson_id: i32 = match sqlx::query(
            "INSERT INTO schedule (day_name, lesson_number, subject, time_start, time_end,
                                   teacher, homework, notes, week_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id;",
        )
        .bind(&lesson.day_name)
        .bind(lesson.lesson_number)
        .bind(&lesson.subject)
        .bind(&lesson.time_start)
        .bind(&lesson.time_end)
        .bind(&lesson.teacher)
        .bind(&lesson.homework)
        .bind(&lesson.notes)
        .bind(lesson.week_number)
        .fetch_one(&mut *transaction)
        .await
        {
            Ok(r) => r.get("id"),
            Err(e) => return Err(format!("Could not insert lesson: {e}")),
        };

        insert_files(&mut transaction, lesson_id, &lesson.homework_files).await?;

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit database transaction: {e}"));
        }

        tracing::info!(
            "Lesson {lesson_id} created on {} (week {})",
            lesson.day_name,
            lesson.week_number
        );
        return Ok(lesson_id);
    });

    Err("Failed to acquire database lock".into())
}

/// Returns `false` when the lesson does not exist.
pub async fn update_lesson(update: LessonUpdate) -> Result<bool, String> {
    postgres_lock!(transaction, {
        let updated = match sqlx::query(
            "UPDATE schedule
            SET subject = $1, time_start = $2, time_end = $3, teacher = $4, homework = $5, notes = $6
            WHERE id = $7;",
        )
        .bind(&update.subject)
        .bind(&update.time_start)
        .bind(&update.time_end)
        .bind(&update.teacher)
        .bind(&update.homework)
        .bind(&update.notes)
        .bind(update.id)
        .execute(&mut *transaction)
        .await
        {
            Ok(r) => r.rows_affected(),
            Err(e) => return Err(format!("Could not update lesson: {e}")),
        };

        if updated == 0 {
            return Ok(false);
        }

        if let Some(files) = update.homework_files.as_deref() {
            if let Err(e) = sqlx::query("DELETE FROM lesson_files WHERE schedule_id = $1;")
                .bind(update.id)
                .execute(&mut *transaction)
                .await
            {
                return Err(format!("Could not clear attachments: {e}"));
            }
            insert_files(&mut transaction, update.id, files).await?;
        }

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit database transaction: {e}"));
        }

        tracing::info!("Lesson {} updated", update.id);
        return Ok(true);
    });

    Err("Failed to acquire database lock".into())
}

pub async fn delete_lesson(lesson_id: i32) -> Result<bool, String> {
    postgres_lock!(transaction, {
        let deleted = match sqlx::query("DELETE FROM schedule WHERE id = $1;")
            .bind(lesson_id)
            .execute(&mut *transaction)
            .await
        {
            Ok(r) => r.rows_affected(),
            Err(e) => return Err(format!("Could not delete lesson: {e}")),
        };

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit database transaction: {e}"));
        }

        return Ok(deleted > 0);
    });

    Err("Failed to acquire database lock".into())
}

/// Copies every lesson of `source_week` into `target_week`. Attachments are not copied.
///
/// Day labels are moved by the week difference so the copies fall on the target week's days;
/// `today` picks the year of labels that only name a day and month. Returns the number of lessons copied.
pub async fn duplicate_week(
    source_week: i32,
    target_week: i32,
    today: NaiveDate,
) -> Result<u64, String> {
    postgres_lock!(transaction, {
        let rows = match sqlx::query(
            "SELECT id, day_name, lesson_number, subject, time_start, time_end,
                    teacher, homework, notes, week_number
            FROM schedule
            WHERE week_number = $1
            ORDER BY id;",
        )
        .bind(source_week)
        .fetch_all(&mut *transaction)
        .await
        {
            Ok(r) => r,
            Err(e) => return Err(format!("Could not read week {source_week}: {e}")),
        };

        let weeks = target_week - source_week;
        let mut copied = 0;
        for lesson in rows.iter().map(lesson_from_row) {
            if let Err(e) = sqlx::query(
                "INSERT INTO schedule (day_name, lesson_number, subject, time_start, time_end,
                                       teacher, homework, notes, week_number)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9);",
            )
            .bind(shift_day_label(&lesson.day_name, weeks, today))
            .bind(lesson.lesson_number)
            .bind(&lesson.subject)
            .bind(&lesson.time_start)
            .bind(&lesson.time_end)
            .bind(&lesson.teacher)
            .bind(&lesson.homework)
            .bind(&lesson.notes)
            .bind(target_week)
            .execute(&mut *transaction)
            .await
            {
                return Err(format!("Could not duplicate week: {e}"));
            }
            copied += 1;
        }

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit database transaction: {e}"));
        }

        tracing::info!("Copied {copied} lessons from week {source_week} to week {target_week}");
        return Ok(copied);
    });

    Err("Failed to acquire database lock".into())
}

/// Attaches a file to a lesson. Returns the new file id, or `None` if the lesson does not exist.
pub async fn add_file(lesson_id: i32, file: HomeworkFile) -> Result<Option<i32>, String> {
    postgres_lock!(transaction, {
        let file_id: Option<i32> = match sqlx::query(
            "INSERT INTO lesson_files (schedule_id, file_name, file_url)
            SELECT id, $2, $3 FROM schedule WHERE id = $1
            RETURNING id;",
        )
        .bind(lesson_id)
        .bind(&file.file_name)
        .bind(&file.file_url)
        .fetch_optional(&mut *transaction)
        .await
        {
            Ok(r) => r.map(|row| row.get("id")),
            Err(e) => return Err(format!("Could not attach file: {e}")),
        };

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit database transaction: {e}"));
        }

        return Ok(file_id);
    });

    Err("Failed to acquire database lock".into())
}

pub async fn remove_file(file_id: i32) -> Result<bool, String> {
    postgres_lock!(transaction, {
        let deleted = match sqlx::query("DELETE FROM lesson_files WHERE id = $1;")
            .bind(file_id)
            .execute(&mut *transaction)
            .await
        {
            Ok(r) => r.rows_affected(),
            Err(e) => return Err(format!("Could not remove file: {e}")),
        };

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit database transaction: {e}"));
        }

        return Ok(deleted > 0);
    });

    Err("Failed to acquire database lock".into())
}
