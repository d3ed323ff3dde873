use axum::{
    Json,
    body::Body,
    http::{Response, StatusCode},
};

use crate::{
    config::{self, MailConfig},
    database,
    endpoints::{error_response, internal_error, message_response},
    mail::{Mailer, render_schedule_html, subject_for_week},
    model::send_schedule_object::SendScheduleObject,
};

/// Mails a rendered week schedule. Lessons come from the request or, when absent, from the database.
pub async fn send_schedule(Json(send_req): Json<SendScheduleObject>) -> Response<Body> {
    dispatch(send_req, &config::get().mail).await
}

async fn dispatch(send_req: SendScheduleObject, mail_config: &MailConfig) -> Response<Body> {
    let SendScheduleObject {
        email,
        from_email,
        week,
        week_dates,
        schedule,
    } = send_req;

    if email.trim().is_empty() || from_email.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Recipient and sender addresses are required.",
        );
    }

    let lessons = match schedule {
        Some(lessons) => lessons,
        None => match database::schedule::list_week(week).await {
            Ok(lessons) => lessons,
            Err(e) => return internal_error("Could not load schedule", e),
        },
    };
    if lessons.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Schedule is empty.");
    }

    let Some(mailer) = Mailer::from_config(mail_config) else {
        tracing::error!("Schedule e-mail requested but no SendGrid API key is configured");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "E-mail service is not configured.",
        );
    };

    let html = render_schedule_html(week, week_dates.as_deref().unwrap_or_default(), &lessons);
    match mailer
        .send(email.trim(), from_email.trim(), &subject_for_week(week), &html)
        .await
    {
        Ok(()) => message_response(StatusCode::OK, "Schedule sent"),
        Err(e) => internal_error("Could not send schedule", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> SendScheduleObject {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn missing_recipient_is_rejected() {
        let response = dispatch(request(r#"{ "fromEmail": "school@example.org" }"#), &MailConfig::default()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_schedule_is_rejected() {
        let response = dispatch(
            request(r#"{ "email": "parent@example.org", "from_email": "school@example.org", "schedule": [] }"#),
            &MailConfig::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unconfigured_mail_is_a_server_error() {
        let response = dispatch(
            request(
                r#"{
                    "email": "parent@example.org",
                    "fromEmail": "school@example.org",
                    "week": 2,
                    "weekDates": "28 окт. - 3 ноя.",
                    "schedule": [
                        { "day_name": "Понедельник, 28 окт.", "lesson_number": 1, "subject": "РОВ" }
                    ]
                }"#,
            ),
            &MailConfig::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
