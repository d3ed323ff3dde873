use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentInfo {
    pub id: i32,
    pub login: String,
    pub full_name: String,
    pub class_name: String,
    pub parent_contact: String,
    pub notes: String,
}
