use serde::{Deserialize, Serialize};

use crate::model::lesson::Lesson;

#[derive(Debug, Serialize, Deserialize)]
pub struct SendScheduleObject {
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "fromEmail")]
    pub from_email: String,
    #[serde(default = "first_week")]
    pub week: i32,
    #[serde(default, alias = "weekDates")]
    pub week_dates: Option<String>,
    /// Lessons to send; loaded from the database for `week` when absent
    #[serde(default)]
    pub schedule: Option<Vec<Lesson>>,
}

fn first_week() -> i32 {
    1
}
