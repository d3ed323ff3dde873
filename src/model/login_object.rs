use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct LoginObject {
    pub login: String,
    pub password: String,
}
