//! Contains all endpoint-associated function. These are grouped depending on the security level required to access them
//!
//! Login and the read-only endpoints available to every signed-in user are here. Roster and
//! schedule changes, uploads and e-mail export require an administrator and live in the submodules.

use axum::{
    Extension, Json,
    body::Body,
    extract::Query,
    http::{Response, StatusCode, header::CONTENT_TYPE},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    config, database,
    database::auth::Session,
    model::{
        login_object::LoginObject,
        simple_response::SimpleResponse,
        user_info::UserInfo,
        week_view::{WeekView, homework_notifications},
    },
    week_calendar::week_start_for,
};

pub mod admin;
pub mod mail;
pub mod schedule;
pub mod upload;

/// Serializes `body` as the JSON response body.
pub fn json_response(status: StatusCode, body: &impl Serialize) -> Response<Body> {
    match serde_json::to_string(body) {
        Ok(json) => Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "application/json")
            .body(json.into())
            .unwrap_or_default(),
        Err(e) => {
            tracing::error!("Could not serialize response: {e}");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Server Error.".into())
                .unwrap_or_default()
        }
    }
}

pub fn message_response(status: StatusCode, message: impl Into<String>) -> Response<Body> {
    json_response(status, &SimpleResponse::Message(message.into()))
}

pub fn error_response(status: StatusCode, error: impl Into<String>) -> Response<Body> {
    json_response(status, &SimpleResponse::Error(error.into()))
}

pub fn internal_error(context: &str, e: String) -> Response<Body> {
    tracing::error!("{context}: {e}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error.")
}

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    pub week: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct WeekViewQuery {
    /// First day of `current_week`; defaults to this week's Monday
    pub start: Option<NaiveDate>,
    pub week: Option<i32>,
    pub current_week: Option<i32>,
}

/// Logs in a user provided their login and password
///
/// Returns a session token to be used for subsequent operations. By default, this token expires after an hour.
pub async fn login(Json(login_req): Json<LoginObject>) -> Response<Body> {
    if login_req.login.trim().is_empty() || login_req.password.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Login and password are required.");
    }

    match database::user::login_user(login_req, config::get().session_hours).await {
        Ok(Some((token, user))) => {
            let session = Session::new(token, user.role, user.full_name);
            json_response(StatusCode::OK, &session)
        }
        Ok(None) => error_response(
            StatusCode::UNAUTHORIZED,
            "Incorrect password or account does not exist.",
        ),
        Err(e) => internal_error("Login failed", e),
    }
}

/// Returns the signed-in user, letting the front-end decide what to show
pub async fn check_auth(Extension(user): Extension<UserInfo>) -> Response<Body> {
    json_response(StatusCode::OK, &user)
}

/// Lessons of one numbered week
pub async fn get_schedule(Query(query): Query<WeekQuery>) -> Response<Body> {
    let week_number = query.week.unwrap_or(1);
    match database::schedule::list_week(week_number).await {
        Ok(lessons) => json_response(StatusCode::OK, &lessons),
        Err(e) => internal_error("Could not load schedule", e),
    }
}

/// Seven labelled days of a week, each with its lessons in order
pub async fn get_week(Query(query): Query<WeekViewQuery>) -> Response<Body> {
    let reference_start = query
        .start
        .unwrap_or_else(|| week_start_for(Local::now().date_naive()));
    let current_week = query.current_week.unwrap_or(1);
    let week_number = query.week.unwrap_or(current_week);

    match database::schedule::list_week(week_number).await {
        Ok(lessons) => {
            let view = WeekView::build(&lessons, week_number, current_week, reference_start);
            json_response(StatusCode::OK, &view)
        }
        Err(e) => internal_error("Could not load schedule", e),
    }
}

/// Homework set for a week, shown as notifications
pub async fn get_notifications(Query(query): Query<WeekQuery>) -> Response<Body> {
    let week_number = query.week.unwrap_or(1);
    match database::schedule::list_week(week_number).await {
        Ok(lessons) => json_response(StatusCode::OK, &homework_notifications(&lessons)),
        Err(e) => internal_error("Could not load schedule", e),
    }
}

pub async fn list_students() -> Response<Body> {
    match database::students::list_students().await {
        Ok(students) => json_response(StatusCode::OK, &students),
        Err(e) => internal_error("Could not list students", e),
    }
}

pub async fn list_teachers() -> Response<Body> {
    match database::teachers::list_teachers().await {
        Ok(teachers) => json_response(StatusCode::OK, &teachers),
        Err(e) => internal_error("Could not list teachers", e),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn simple_responses_are_json() {
        let ok = message_response(StatusCode::CREATED, "Lesson created");
        assert_eq!(ok.status(), StatusCode::CREATED);
        assert_eq!(ok.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body_json(ok).await, serde_json::json!({ "message": "Lesson created" }));

        let err = error_response(StatusCode::NOT_FOUND, "Lesson not found.");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(err).await, serde_json::json!({ "error": "Lesson not found." }));
    }

    #[tokio::test]
    async fn empty_credentials_are_rejected_before_lookup() {
        let response = login(Json(LoginObject {
            login: " ".into(),
            password: "x".into(),
        }))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn check_auth_echoes_user() {
        let user = UserInfo {
            id: 4,
            login: "ivanov".into(),
            full_name: "Иванов Иван".into(),
            role: crate::model::user_info::Role::Student,
        };
        let response = check_auth(Extension(user)).await;
        let body = body_json(response).await;
        assert_eq!(body["role"], "student");
        assert_eq!(body["login"], "ivanov");
    }
}
