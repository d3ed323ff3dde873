use base64::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::model::user_info::Role;

/// What the client receives after logging in. `session_token` goes into the Authorization header.
#[derive(Debug, Serialize, Deserialize)]
pub struct Session {
    pub session_token: String,
    pub role: Role,
    pub full_name: String,
}

impl Session {
    pub fn new(session_token: [u8; 16], role: Role, full_name: impl Into<String>) -> Self {
        Self {
            session_token: BASE64_STANDARD.encode(session_token),
            role,
            full_name: full_name.into(),
        }
    }
}

/// Hash under which a session is stored. `None` when the token is not valid base64.
pub fn session_hash(token: impl AsRef<[u8]>) -> Option<Vec<u8>> {
    let session_id = BASE64_STANDARD.decode(token).ok()?;
    Some(Sha512::digest(session_id).to_vec())
}
