//! Lesson editing, week duplication and homework attachments.

use axum::{
    Json,
    body::Body,
    extract::Path,
    http::{Response, StatusCode},
};
use chrono::Local;
use serde_json::json;

use crate::{
    database::{self, schedule::LessonUpdate},
    endpoints::{error_response, internal_error, json_response, message_response},
    model::{
        lesson::{HomeworkFile, Lesson, non_empty},
        request::ClientRequest,
    },
};

fn lesson_from_request(client_req: ClientRequest) -> Result<Lesson, &'static str> {
    let ClientRequest {
        day_name: Some(day_name),
        lesson_number: Some(lesson_number),
        subject: Some(subject),
        time_start,
        time_end,
        teacher,
        homework,
        notes,
        homework_files,
        week_number,
        ..
    } = client_req
    else {
        return Err("Day, lesson number and subject are required.");
    };
    if day_name.trim().is_empty() || subject.trim().is_empty() {
        return Err("Day and subject must not be empty.");
    }
    if lesson_number <= 0 {
        return Err("Lesson number must be positive.");
    }

    Ok(Lesson {
        id: 0,
        day_name,
        lesson_number,
        subject,
        time_start: time_start.unwrap_or_default(),
        time_end: time_end.unwrap_or_default(),
        teacher: teacher.unwrap_or_default(),
        homework: non_empty(homework),
        notes: non_empty(notes),
        homework_files: homework_files.unwrap_or_default(),
        week_number: week_number.unwrap_or(1),
    })
}

fn update_from_request(client_req: ClientRequest) -> Result<LessonUpdate, &'static str> {
    let ClientRequest {
        id: Some(id),
        subject: Some(subject),
        time_start,
        time_end,
        teacher,
        homework,
        notes,
        homework_files,
        ..
    } = client_req
    else {
        return Err("Lesson id and subject are required.");
    };

    Ok(LessonUpdate {
        id,
        subject,
        time_start: time_start.unwrap_or_default(),
        time_end: time_end.unwrap_or_default(),
        teacher: teacher.unwrap_or_default(),
        homework: non_empty(homework),
        notes: non_empty(notes),
        homework_files,
    })
}

/// Creates a lesson, or copies a whole week when `action` is `duplicate_week`.
pub async fn create_lesson(Json(client_req): Json<ClientRequest>) -> Response<Body> {
    if client_req.is_duplicate_week() {
        let (Some(source_week), Some(target_week)) = (client_req.source_week, client_req.target_week)
        else {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Source and target weeks are required.",
            );
        };
        if source_week == target_week {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Source and target weeks must differ.",
            );
        }

        let today = Local::now().date_naive();
        return match database::schedule::duplicate_week(source_week, target_week, today).await {
            Ok(copied) => json_response(
                StatusCode::OK,
                &json!({ "message": "Week duplicated", "copied": copied }),
            ),
            Err(e) => internal_error("Could not duplicate week", e),
        };
    }

    let lesson = match lesson_from_request(client_req) {
        Ok(lesson) => lesson,
        Err(reason) => return error_response(StatusCode::BAD_REQUEST, reason),
    };

    match database::schedule::create_lesson(lesson).await {
        Ok(id) => json_response(StatusCode::CREATED, &json!({ "id": id })),
        Err(e) => internal_error("Could not create lesson", e),
    }
}

pub async fn update_lesson(Json(client_req): Json<ClientRequest>) -> Response<Body> {
    let update = match update_from_request(client_req) {
        Ok(update) => update,
        Err(reason) => return error_response(StatusCode::BAD_REQUEST, reason),
    };

    match database::schedule::update_lesson(update).await {
        Ok(true) => message_response(StatusCode::OK, "Lesson updated"),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Lesson not found."),
        Err(e) => internal_error("Could not update lesson", e),
    }
}

pub async fn delete_lesson(Path(id): Path<i32>) -> Response<Body> {
    match database::schedule::delete_lesson(id).await {
        Ok(true) => message_response(StatusCode::OK, "Lesson deleted"),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Lesson not found."),
        Err(e) => internal_error("Could not delete lesson", e),
    }
}

pub async fn attach_file(Path(id): Path<i32>, Json(file): Json<HomeworkFile>) -> Response<Body> {
    if file.file_url.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "File URL is required.");
    }

    match database::schedule::add_file(id, file).await {
        Ok(Some(file_id)) => json_response(StatusCode::CREATED, &json!({ "id": file_id })),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Lesson not found."),
        Err(e) => internal_error("Could not attach file", e),
    }
}

pub async fn remove_file(Path(file_id): Path<i32>) -> Response<Body> {
    match database::schedule::remove_file(file_id).await {
        Ok(true) => message_response(StatusCode::OK, "File removed"),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "File not found."),
        Err(e) => internal_error("Could not remove file", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> ClientRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn lesson_defaults_fill_in() {
        let lesson = lesson_from_request(request(
            r#"{
                "day_name": "Понедельник, 21 окт.",
                "lesson_number": 2,
                "subject": "Рус. язык",
                "homework": "  ",
                "files": "/files/a.pdf, /files/b.pdf"
            }"#,
        ))
        .unwrap();

        assert_eq!(lesson.week_number, 1);
        assert_eq!(lesson.homework, None);
        assert_eq!(lesson.homework_files.len(), 2);
        assert_eq!(lesson.homework_files[1].file_name, "b.pdf");
    }

    #[test]
    fn lesson_requires_day_number_and_subject() {
        assert!(lesson_from_request(request(r#"{ "subject": "РОВ" }"#)).is_err());
        assert!(
            lesson_from_request(request(
                r#"{ "day_name": "", "lesson_number": 1, "subject": "РОВ" }"#
            ))
            .is_err()
        );
    }

    #[test]
    fn lesson_number_must_be_positive() {
        for number in [0, -1] {
            let json = format!(
                r#"{{ "day_name": "Вторник, 22 окт.", "lesson_number": {number}, "subject": "РОВ" }}"#
            );
            assert!(lesson_from_request(request(&json)).is_err());
        }
    }

    #[tokio::test]
    async fn non_positive_lesson_number_is_a_bad_request() {
        let response = create_lesson(Json(request(
            r#"{ "day_name": "Вторник, 22 окт.", "lesson_number": 0, "subject": "РОВ" }"#,
        )))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn update_keeps_files_untouched_when_absent() {
        let update = update_from_request(request(r#"{ "id": 7, "subject": "Биология" }"#)).unwrap();
        assert_eq!(update.id, 7);
        assert!(update.homework_files.is_none());

        let update = update_from_request(request(
            r#"{ "id": 7, "subject": "Биология", "homework_files": [] }"#,
        ))
        .unwrap();
        assert_eq!(update.homework_files, Some(vec![]));
    }

    #[tokio::test]
    async fn duplicate_needs_distinct_weeks() {
        let response = create_lesson(Json(request(
            r#"{ "action": "duplicate_week", "source_week": 2 }"#,
        )))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = create_lesson(Json(request(
            r#"{ "action": "duplicate_week", "source_week": 2, "target_week": 2 }"#,
        )))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
