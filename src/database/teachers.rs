use sqlx::Row;

use crate::model::teacher_info::TeacherInfo;
use crate::postgres_lock;

pub async fn list_teachers() -> Result<Vec<TeacherInfo>, String> {
    postgres_lock!(transaction, {
        let rows = match sqlx::query(
            "SELECT id, full_name, subject, phone, email, notes FROM teachers ORDER BY full_name;",
        )
        .fetch_all(&mut *transaction)
        .await
        {
            Ok(r) => r,
            Err(e) => return Err(format!("{e}")),
        };

        let teachers = rows
            .iter()
            .map(|row| TeacherInfo {
                id: row.get("id"),
                full_name: row.get("full_name"),
                subject: row.get("subject"),
                phone: row.get("phone"),
                email: row.get("email"),
                notes: row.get("notes"),
            })
            .collect::<Vec<TeacherInfo>>();

        return Ok(teachers);
    });

    Err("Failed to acquire database lock".into())
}

/// Inserts `teacher` (its `id` is ignored) and returns the new id.
pub async fn create_teacher(teacher: TeacherInfo) -> Result<i32, String> {
    postgres_lock!(transaction, {
        let id: i32 = match sqlx::query(
            "INSERT INTO teachers (full_name, subject, phone, email, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id;",
        )
        .bind(teacher.full_name)
        .bind(teacher.subject)
        .bind(teacher.phone)
        .bind(teacher.email)
        .bind(teacher.notes)
        .fetch_one(&mut *transaction)
        .await
        {
            Ok(r) => r.get("id"),
            Err(e) => return Err(format!("Could not insert into teachers: {e}")),
        };

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit database transaction: {e}"));
        }

        tracing::info!("Teacher {id} added");
        return Ok(id);
    });

    Err("Failed to acquire database lock".into())
}

pub async fn update_teacher(teacher: TeacherInfo) -> Result<bool, String> {
    postgres_lock!(transaction, {
        let updated = match sqlx::query(
            "UPDATE teachers
            SET full_name = $1, subject = $2, phone = $3, email = $4, notes = $5
            WHERE id = $6;",
        )
        .bind(teacher.full_name)
        .bind(teacher.subject)
        .bind(teacher.phone)
        .bind(teacher.email)
        .bind(teacher.notes)
        .bind(teacher.id)
        .execute(&mut *transaction)
        .await
        {
            Ok(r) => r.rows_affected(),
            Err(e) => return Err(format!("Could not update teacher: {e}")),
        };

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit database transaction: {e}"));
        }

        return Ok(updated > 0);
    });

    Err("Failed to acquire database lock".into())
}

pub async fn delete_teacher(id: i32) -> Result<bool, String> {
    postgres_lock!(transaction, {
        let deleted = match sqlx::query("DELETE FROM teachers WHERE id = $1;")
            .bind(id)
            .execute(&mut *transaction)
            .await
        {
            Ok(r) => r.rows_affected(),
            Err(e) => return Err(format!("Could not delete teacher: {e}")),
        };

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit database transaction: {e}"));
        }

        return Ok(deleted > 0);
    });

    Err("Failed to acquire database lock".into())
}
