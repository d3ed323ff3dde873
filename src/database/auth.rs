use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::model::user_info::{Role, UserInfo};
use crate::postgres_lock;

mod session;

pub use session::{Session, session_hash};

/// The user behind a valid, unexpired session token.
pub async fn session_user(token: impl AsRef<[u8]>) -> Result<Option<UserInfo>, String> {
    let Some(session_hash) = session_hash(token) else {
        return Ok(None);
    };

    postgres_lock!(transaction, {
        let row = match sqlx::query(
            "SELECT u.id, u.login, u.full_name, u.role, s.expiration
            FROM user_session s
            JOIN users u ON u.id = s.user_id
            WHERE s.session_hash = $1;",
        )
        .bind(session_hash)
        .fetch_optional(&mut *transaction)
        .await
        {
            Ok(r) => r,
            Err(e) => {
                return Err(format!("An error occured querying the database: {e}"));
            }
        };

        let Some(row) = row else {
            return Ok(None);
        };

        let expiration: DateTime<Utc> = row.get("expiration");
        if Utc::now() > expiration {
            return Ok(None);
        }

        let role: String = row.get("role");
        let Some(role) = Role::parse(&role) else {
            return Err(format!("Unknown role in users table: {role}"));
        };

        return Ok(Some(UserInfo {
            id: row.get("id"),
            login: row.get("login"),
            full_name: row.get("full_name"),
            role,
        }));
    });

    Err("Failed to acquire database lock".into())
}
