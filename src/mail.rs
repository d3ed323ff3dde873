//! E-mail export of a week's schedule.

use reqwest::Client;
use serde::Serialize;

use crate::config::MailConfig;
use crate::model::lesson::Lesson;
use crate::week_calendar::group_by_weekday;

const STYLE: &str = "body { font-family: Arial, sans-serif; background-color: #f4f4f4; padding: 20px; }
.container { max-width: 800px; margin: 0 auto; background: white; padding: 30px; border-radius: 10px; }
h1 { color: #2563eb; text-align: center; }
h2 { color: #1e40af; border-bottom: 2px solid #2563eb; padding-bottom: 5px; margin-top: 30px; }
.lesson { background: #f8fafc; padding: 15px; margin: 10px 0; border-left: 4px solid #2563eb; border-radius: 5px; }
.lesson-header { font-weight: bold; font-size: 1.1em; color: #1e40af; }
.lesson-time { color: #64748b; font-size: 0.9em; }
.homework { background: #fef3c7; padding: 10px; margin-top: 10px; border-radius: 5px; }";

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn subject_for_week(week_number: i32) -> String {
    format!("Расписание уроков - Неделя {week_number}")
}

/// Renders the lessons as an HTML document, one section per weekday, Monday first.
pub fn render_schedule_html(week_number: i32, week_dates: &str, lessons: &[Lesson]) -> String {
    let mut html = format!(
        "<html>\n<head>\n<style>\n{STYLE}\n</style>\n</head>\n<body>\n<div class=\"container\">\n\
         <h1>📚 Расписание уроков</h1>\n\
         <p style=\"text-align: center; color: #64748b;\">Неделя {week_number} ({})</p>\n",
        escape_html(week_dates)
    );

    for (day, day_lessons) in group_by_weekday(lessons) {
        html.push_str(&format!("<h2>{day}</h2>\n"));

        for lesson in day_lessons {
            html.push_str(&format!(
                "<div class=\"lesson\">\n\
                 <div class=\"lesson-header\">{}. {}</div>\n\
                 <div class=\"lesson-time\">🕐 {} - {}</div>\n\
                 <div style=\"margin-top: 5px;\">👨‍🏫 {}</div>\n",
                lesson.lesson_number,
                escape_html(&lesson.subject),
                escape_html(&lesson.time_start),
                escape_html(&lesson.time_end),
                escape_html(&lesson.teacher),
            ));

            if let Some(homework) = lesson.homework.as_deref() {
                html.push_str(&format!(
                    "<div class=\"homework\">\n<strong>📝 Домашнее задание:</strong><br>\n{}\n</div>\n",
                    escape_html(homework)
                ));
            }

            for file in &lesson.homework_files {
                html.push_str(&format!(
                    "<div>📎 <a href=\"{}\">{}</a></div>\n",
                    escape_html(&file.file_url),
                    escape_html(&file.file_name)
                ));
            }

            html.push_str("</div>\n");
        }
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct MailRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

/// Sends mail through the SendGrid v3 API.
#[derive(Clone)]
pub struct Mailer {
    client: Client,
    api_key: String,
    api_url: String,
}

impl Mailer {
    /// `None` when no API key is configured.
    pub fn from_config(config: &MailConfig) -> Option<Self> {
        let api_key = config.sendgrid_api_key.clone()?;
        Some(Self {
            client: Client::new(),
            api_key,
            api_url: config.api_url.clone(),
        })
    }

    pub async fn send(&self, to: &str, from: &str, subject: &str, html: &str) -> Result<(), String> {
        let request = MailRequest {
            personalizations: vec![Personalization {
                to: vec![Address { email: to }],
            }],
            from: Address { email: from },
            subject,
            content: vec![Content {
                content_type: "text/html",
                value: html,
            }],
        };

        let response = match self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return Err(format!("Could not reach mail provider: {e}")),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Mail provider rejected message ({status}): {body}"));
        }

        tracing::info!("Schedule mailed to {to}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lesson::HomeworkFile;

    fn lesson(day_name: &str, lesson_number: i32, subject: &str, homework: Option<&str>) -> Lesson {
        Lesson {
            id: lesson_number,
            day_name: day_name.into(),
            lesson_number,
            subject: subject.into(),
            time_start: "8:00".into(),
            time_end: "8:40".into(),
            teacher: "Иванова А.В.".into(),
            homework: homework.map(Into::into),
            notes: None,
            homework_files: vec![],
            week_number: 1,
        }
    }

    #[test]
    fn days_render_monday_first_and_sorted() {
        let lessons = vec![
            lesson("Вторник, 22 окт.", 1, "Биология", None),
            lesson("Понедельник, 21 окт.", 2, "Рус. язык", Some("Упражнение 162")),
            lesson("Понедельник, 21 окт.", 1, "РОВ", None),
        ];

        let html = render_schedule_html(1, "21 окт. - 27 окт.", &lessons);

        assert!(html.contains("Неделя 1 (21 окт. - 27 окт.)"));
        let monday = html.find("<h2>Понедельник</h2>").unwrap();
        let tuesday = html.find("<h2>Вторник</h2>").unwrap();
        assert!(monday < tuesday);

        let first = html.find("1. РОВ").unwrap();
        let second = html.find("2. Рус. язык").unwrap();
        assert!(monday < first && first < second && second < tuesday);

        assert_eq!(html.matches("class=\"homework\"").count(), 1);
        assert!(!html.contains("<h2>Среда</h2>"));
    }

    #[test]
    fn text_is_escaped() {
        let mut with_markup = lesson("Среда, 23 окт.", 1, "<script>alert(1)</script>", Some("a & b"));
        with_markup.homework_files.push(HomeworkFile {
            id: 1,
            file_name: "\"quoted\".pdf".into(),
            file_url: "/files/x.pdf".into(),
        });

        let html = render_schedule_html(2, "", &[with_markup]);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &amp; b"));
        assert!(html.contains("&quot;quoted&quot;.pdf"));
    }

    #[test]
    fn mailer_requires_api_key() {
        assert!(Mailer::from_config(&MailConfig::default()).is_none());

        let config = MailConfig {
            sendgrid_api_key: Some("SG.test".into()),
            ..MailConfig::default()
        };
        assert!(Mailer::from_config(&config).is_some());
    }

    #[test]
    fn subject_names_the_week() {
        assert_eq!(subject_for_week(3), "Расписание уроков - Неделя 3");
    }
}
