use sqlx::Row;

use crate::database::user::{insert_user, set_password};
use crate::model::student_info::StudentInfo;
use crate::model::user_info::Role;
use crate::postgres_lock;

pub struct NewStudent {
    pub login: String,
    pub password: String,
    pub full_name: String,
    pub class_name: String,
    pub parent_contact: String,
    pub notes: String,
}

pub struct StudentUpdate {
    pub id: i32,
    /// Left unchanged when `None`
    pub password: Option<String>,
    pub full_name: String,
    pub class_name: String,
    pub parent_contact: String,
    pub notes: String,
}

pub async fn list_students() -> Result<Vec<StudentInfo>, String> {
    postgres_lock!(transaction, {
        let rows = match sqlx::query(
            "SELECT u.id, u.login, u.full_name, s.class_name, s.parent_contact, s.notes
            FROM users u
            LEFT JOIN students s ON u.id = s.user_id
            WHERE u.role = 'student'
            ORDER BY u.full_name;",
        )
        .fetch_all(&mut *transaction)
        .await
        {
            Ok(r) => r,
            Err(e) => return Err(format!("{e}")),
        };

        let students = rows
            .iter()
            .map(|row| StudentInfo {
                id: row.get("id"),
                login: row.get("login"),
                full_name: row.get("full_name"),
                class_name: row.get::<Option<String>, _>("class_name").unwrap_or_default(),
                parent_contact: row
                    .get::<Option<String>, _>("parent_contact")
                    .unwrap_or_default(),
                notes: row.get::<Option<String>, _>("notes").unwrap_or_default(),
            })
            .collect::<Vec<StudentInfo>>();

        return Ok(students);
    });

    Err("Failed to acquire database lock".into())
}

pub async fn create_student(student: NewStudent) -> Result<i32, String> {
    postgres_lock!(transaction, {
        let user_id = insert_user(
            &mut transaction,
            &student.login,
            &student.password,
            &student.full_name,
            Role::Student,
        )
        .await?;

        if let Err(e) = sqlx::query(
            "INSERT INTO students (user_id, class_name, parent_contact, notes) VALUES ($1, $2, $3, $4);",
        )
        .bind(user_id)
        .bind(student.class_name)
        .bind(student.parent_contact)
        .bind(student.notes)
        .execute(&mut *transaction)
        .await
        {
            return Err(format!("Could not insert into students: {e}"));
        }

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit database transaction: {e}"));
        }

        tracing::info!("Student {user_id} created");
        return Ok(user_id);
    });

    Err("Failed to acquire database lock".into())
}

/// Returns `false` when no student has the given id.
pub async fn update_student(student: StudentUpdate) -> Result<bool, String> {
    postgres_lock!(transaction, {
        let updated = match sqlx::query(
            "UPDATE users SET full_name = $1 WHERE id = $2 AND role = 'student';",
        )
        .bind(&student.full_name)
        .bind(student.id)
        .execute(&mut *transaction)
        .await
        {
            Ok(r) => r.rows_affected(),
            Err(e) => return Err(format!("Could not update users: {e}")),
        };

        if updated == 0 {
            return Ok(false);
        }

        if let Some(password) = student.password.as_deref() {
            set_password(&mut transaction, student.id, password).await?;
        }

        if let Err(e) = sqlx::query(
            "INSERT INTO students (user_id, class_name, parent_contact, notes)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET class_name = EXCLUDED.class_name,
                parent_contact = EXCLUDED.parent_contact,
                notes = EXCLUDED.notes;",
        )
        .bind(student.id)
        .bind(student.class_name)
        .bind(student.parent_contact)
        .bind(student.notes)
        .execute(&mut *transaction)
        .await
        {
            return Err(format!("Could not update students: {e}"));
        }

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit database transaction: {e}"));
        }

        tracing::info!("Student {} updated", student.id);
        return Ok(true);
    });

    Err("Failed to acquire database lock".into())
}

/// Removes the student and their account. Returns `false` when nothing was deleted.
pub async fn delete_student(id: i32) -> Result<bool, String> {
    postgres_lock!(transaction, {
        let deleted = match sqlx::query("DELETE FROM users WHERE id = $1 AND role = 'student';")
            .bind(id)
            .execute(&mut *transaction)
            .await
        {
            Ok(r) => r.rows_affected(),
            Err(e) => return Err(format!("Could not delete student: {e}")),
        };

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit database transaction: {e}"));
        }

        return Ok(deleted > 0);
    });

    Err("Failed to acquire database lock".into())
}
