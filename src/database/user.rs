use chrono::{TimeDelta, Utc};
use sha2::{Digest, Sha512};
use sqlx::{Postgres, Row, Transaction};

use crate::model::login_object::LoginObject;
use crate::model::user_info::{Role, UserInfo};
use crate::postgres_lock;

pub(crate) fn create_hash(login: impl Into<Vec<u8>>, pass: impl Into<Vec<u8>>) -> Vec<u8> {
    let login = login.into();
    let pass = pass.into();

    let login_len = login.len();
    let first_half_login = &login[0..login_len / 2];
    let last_half_login = &login[login_len / 2..];

    let salted = [first_half_login, &pass, last_half_login].concat();
    Sha512::digest(salted).to_vec()
}

/// Inserts a user and its password hash inside an already open transaction. Returns the new id.
pub(crate) async fn insert_user(
    transaction: &mut Transaction<'_, Postgres>,
    login: &str,
    password: &str,
    full_name: &str,
    role: Role,
) -> Result<i32, String> {
    let id: i32 = match sqlx::query(
        "INSERT INTO users (login, full_name, role) VALUES ($1, $2, $3) RETURNING id;",
    )
    .bind(login)
    .bind(full_name)
    .bind(role.as_str())
    .fetch_one(&mut **transaction)
    .await
    {
        Ok(row) => row.get("id"),
        Err(e) => return Err(format!("Could not insert into users: {e}")),
    };

    if let Err(e) = sqlx::query("INSERT INTO user_auth (user_id, hash) VALUES ($1, $2);")
        .bind(id)
        .bind(create_hash(login, password))
        .execute(&mut **transaction)
        .await
    {
        return Err(format!("Could not add to authentication table: {e}"));
    }

    Ok(id)
}

pub(crate) async fn set_password(
    transaction: &mut Transaction<'_, Postgres>,
    user_id: i32,
    password: &str,
) -> Result<(), String> {
    let login: String = match sqlx::query("SELECT login FROM users WHERE id = $1;")
        .bind(user_id)
        .fetch_one(&mut **transaction)
        .await
    {
        Ok(row) => row.get("login"),
        Err(e) => return Err(format!("User {user_id} not found: {e}")),
    };

    if let Err(e) = sqlx::query("UPDATE user_auth SET hash = $1 WHERE user_id = $2;")
        .bind(create_hash(login, password))
        .bind(user_id)
        .execute(&mut **transaction)
        .await
    {
        return Err(format!("Could not update password: {e}"));
    }
    Ok(())
}

/// Checks the credentials and opens a new session, replacing any earlier ones.
///
/// Returns `None` for an unknown login or wrong password.
pub async fn login_user(
    user: LoginObject,
    session_hours: i64,
) -> Result<Option<([u8; 16], UserInfo)>, String> {
    let hash = create_hash(user.login.clone(), user.password);

    postgres_lock!(transaction, {
        let row = match sqlx::query(
            "SELECT u.id, u.login, u.full_name, u.role
            FROM user_auth a
            JOIN users u ON u.id = a.user_id
            WHERE u.login = $1 AND a.hash = $2;",
        )
        .bind(&user.login)
        .bind(hash)
        .fetch_optional(&mut *transaction)
        .await
        {
            Ok(Some(row)) => row,
            Ok(None) => return Ok(None),
            Err(e) => return Err(format!("Could not query credentials: {e}")),
        };

        let role: String = row.get("role");
        let Some(role) = Role::parse(&role) else {
            return Err(format!("Unknown role in users table: {role}"));
        };
        let user_info = UserInfo {
            id: row.get("id"),
            login: row.get("login"),
            full_name: row.get("full_name"),
            role,
        };

        let mut session_id = [0u8; 16];
        rand::fill(&mut session_id);
        let session_hash = Sha512::digest(session_id).to_vec();

        let expiration = Utc::now() + TimeDelta::hours(session_hours);

        // Clear previous sessions
        if let Err(e) = sqlx::query("DELETE FROM user_session WHERE user_id = $1;")
            .bind(user_info.id)
            .execute(&mut *transaction)
            .await
        {
            return Err(format!("Could not clear prior sessions: {e}"));
        }

        if let Err(e) = sqlx::query(
            "INSERT INTO user_session (session_hash, user_id, expiration) VALUES ($1, $2, $3);",
        )
        .bind(session_hash)
        .bind(user_info.id)
        .bind(expiration)
        .execute(&mut *transaction)
        .await
        {
            return Err(format!("Could not create login session: {e}"));
        }

        if let Err(e) = transaction.commit().await {
            return Err(format!("Failed to commit database transaction: {e}"));
        }

        tracing::info!("Logged in user {}", user_info.id);
        return Ok(Some((session_id, user_info)));
    });

    Err("Failed to acquire database lock".into())
}

/// Creates the first administrator account when none exists yet.
pub async fn bootstrap_admin(login: &str, password: &str) -> Result<bool, String> {
    postgres_lock!(transaction, {
        let admin_count: i64 = match sqlx::query("SELECT COUNT(*) AS n FROM users WHERE role = 'admin';")
            .fetch_one(&mut *transaction)
            .await
        {
            Ok(row) => row.get("n"),
            Err(e) => return Err(format!("Could not count administrators: {e}")),
        };

        if admin_count > 0 {
            return Ok(false);
        }

        insert_user(&mut transaction, login, password, "Администратор", Role::Admin).await?;

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit database transaction: {e}"));
        }

        tracing::info!("Created administrator account {login}");
        return Ok(true);
    });

    Err("Failed to acquire database lock".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_depends_on_login_and_password() {
        let a = create_hash("ivanova", "secret");
        assert_eq!(a, create_hash("ivanova", "secret"));
        assert_ne!(a, create_hash("ivanova", "Secret"));
        assert_ne!(a, create_hash("petrova", "secret"));
        assert_eq!(a.len(), 64);
    }
}
