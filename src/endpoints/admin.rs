//! Roster management: students and teachers.

use axum::{
    Json,
    body::Body,
    extract::Path,
    http::{Response, StatusCode},
};
use serde_json::json;

use crate::{
    database::{
        self,
        students::{NewStudent, StudentUpdate},
    },
    endpoints::{error_response, internal_error, json_response, message_response},
    model::{request::ClientRequest, teacher_info::TeacherInfo},
};

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn create_student(Json(client_req): Json<ClientRequest>) -> Response<Body> {
    let ClientRequest {
        login: Some(login),
        password: Some(password),
        full_name: Some(full_name),
        class_name,
        parent_contact,
        notes,
        ..
    } = client_req
    else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Login, password and full name are required.",
        );
    };
    if login.trim().is_empty() || full_name.trim().is_empty() || password.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Login, password and full name must not be empty.",
        );
    }

    let student = NewStudent {
        login,
        password,
        full_name,
        class_name: class_name.unwrap_or_default(),
        parent_contact: parent_contact.unwrap_or_default(),
        notes: notes.unwrap_or_default(),
    };

    match database::students::create_student(student).await {
        Ok(id) => json_response(StatusCode::CREATED, &json!({ "id": id })),
        Err(e) => internal_error("Could not create student", e),
    }
}

pub async fn update_student(Json(client_req): Json<ClientRequest>) -> Response<Body> {
    let ClientRequest {
        id: Some(id),
        full_name: Some(full_name),
        password,
        class_name,
        parent_contact,
        notes,
        ..
    } = client_req
    else {
        return error_response(StatusCode::BAD_REQUEST, "Student id and full name are required.");
    };

    let update = StudentUpdate {
        id,
        password: password.filter(|p| !p.is_empty()),
        full_name,
        class_name: class_name.unwrap_or_default(),
        parent_contact: parent_contact.unwrap_or_default(),
        notes: notes.unwrap_or_default(),
    };

    match database::students::update_student(update).await {
        Ok(true) => message_response(StatusCode::OK, "Student updated"),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Student not found."),
        Err(e) => internal_error("Could not update student", e),
    }
}

pub async fn delete_student(Path(id): Path<i32>) -> Response<Body> {
    match database::students::delete_student(id).await {
        Ok(true) => message_response(StatusCode::OK, "Student deleted"),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Student not found."),
        Err(e) => internal_error("Could not delete student", e),
    }
}

/// Builds the stored teacher record. `None` when the name is missing.
fn teacher_from_request(client_req: ClientRequest) -> Option<TeacherInfo> {
    let ClientRequest {
        id,
        full_name,
        subject,
        phone,
        email,
        notes,
        ..
    } = client_req;

    Some(TeacherInfo {
        id: id.unwrap_or_default(),
        full_name: required(full_name)?,
        subject: subject.unwrap_or_default(),
        phone: phone.unwrap_or_default(),
        email: email.unwrap_or_default(),
        notes: notes.unwrap_or_default(),
    })
}

pub async fn create_teacher(Json(client_req): Json<ClientRequest>) -> Response<Body> {
    let Some(teacher) = teacher_from_request(client_req) else {
        return error_response(StatusCode::BAD_REQUEST, "Full name is required.");
    };

    match database::teachers::create_teacher(teacher).await {
        Ok(id) => json_response(StatusCode::CREATED, &json!({ "id": id })),
        Err(e) => internal_error("Could not create teacher", e),
    }
}

pub async fn update_teacher(Json(client_req): Json<ClientRequest>) -> Response<Body> {
    if client_req.id.is_none() {
        return error_response(StatusCode::BAD_REQUEST, "Teacher id is required.");
    }
    let Some(teacher) = teacher_from_request(client_req) else {
        return error_response(StatusCode::BAD_REQUEST, "Full name is required.");
    };

    match database::teachers::update_teacher(teacher).await {
        Ok(true) => message_response(StatusCode::OK, "Teacher updated"),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Teacher not found."),
        Err(e) => internal_error("Could not update teacher", e),
    }
}

pub async fn delete_teacher(Path(id): Path<i32>) -> Response<Body> {
    match database::teachers::delete_teacher(id).await {
        Ok(true) => message_response(StatusCode::OK, "Teacher deleted"),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Teacher not found."),
        Err(e) => internal_error("Could not delete teacher", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> ClientRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn teacher_needs_a_name() {
        assert!(teacher_from_request(request(r#"{ "subject": "Физика" }"#)).is_none());
        assert!(teacher_from_request(request(r#"{ "full_name": "  " }"#)).is_none());

        let teacher = teacher_from_request(request(
            r#"{ "id": 3, "full_name": "Петрова М.И.", "subject": "Физика" }"#,
        ))
        .unwrap();
        assert_eq!(teacher.id, 3);
        assert_eq!(teacher.subject, "Физика");
        assert_eq!(teacher.phone, "");
    }

    #[tokio::test]
    async fn incomplete_student_is_rejected() {
        let response = create_student(Json(request(r#"{ "login": "ivanov" }"#))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = create_student(Json(request(
            r#"{ "login": "ivanov", "password": "", "full_name": "Иванов И." }"#,
        )))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_without_id_is_rejected() {
        let response = update_student(Json(request(r#"{ "full_name": "Иванов И." }"#))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = update_teacher(Json(request(r#"{ "full_name": "Петрова М.И." }"#))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
