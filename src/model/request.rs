use serde::{Deserialize, Serialize};

use crate::model::lesson::{HomeworkFile, deserialize_optional_files};

/// Body shared by the roster and schedule endpoints. Each endpoint destructures the fields it needs.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientRequest {
    pub id: Option<i32>,

    // Students
    pub login: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub class_name: Option<String>,
    pub parent_contact: Option<String>,
    pub notes: Option<String>,

    // Teachers (full_name and notes shared with students)
    pub subject: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,

    // Lessons (subject and notes shared)
    pub action: Option<String>,
    pub day_name: Option<String>,
    pub lesson_number: Option<i32>,
    pub time_start: Option<String>,
    pub time_end: Option<String>,
    pub teacher: Option<String>,
    pub homework: Option<String>,
    #[serde(alias = "files", deserialize_with = "deserialize_optional_files")]
    pub homework_files: Option<Vec<HomeworkFile>>,
    pub week_number: Option<i32>,

    // Week duplication
    pub source_week: Option<i32>,
    pub target_week: Option<i32>,
}

impl ClientRequest {
    pub fn is_duplicate_week(&self) -> bool {
        self.action.as_deref() == Some("duplicate_week")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_none() {
        let req: ClientRequest = serde_json::from_str(r#"{ "full_name": "Иванов И." }"#).unwrap();
        assert_eq!(req.full_name.as_deref(), Some("Иванов И."));
        assert!(req.homework_files.is_none());
        assert!(!req.is_duplicate_week());
    }

    #[test]
    fn inline_files_are_adapted() {
        let req: ClientRequest = serde_json::from_str(
            r#"{ "action": "duplicate_week", "files": "/files/a.pdf,/files/b.pdf" }"#,
        )
        .unwrap();
        assert!(req.is_duplicate_week());
        let files = req.homework_files.unwrap();
        assert_eq!(files[1].file_name, "b.pdf");
    }
}
