use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherInfo {
    pub id: i32,
    pub full_name: String,
    pub subject: String,
    pub phone: String,
    pub email: String,
    pub notes: String,
}
