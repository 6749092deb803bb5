use registration_sdk::CredentialHandle;
use serde::{Deserialize, Serialize};

/// Body of a successful `POST /register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub id_number: String,
    pub credential_url: String,
}

impl From<CredentialHandle> for RegisterResponse {
    fn from(handle: CredentialHandle) -> Self {
        Self {
            success: true,
            id_number: handle.identifier.to_string(),
            credential_url: handle.download_path,
        }
    }
}

/// Scanners send the identifier either as text or as a bare JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdNumber {
    Text(String),
    Number(u64),
}

impl IdNumber {
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Text(s) => s.trim().to_owned(),
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    pub id_number: IdNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceResponse {
    pub success: bool,
    pub message: String,
}

impl AttendanceResponse {
    #[must_use]
    pub fn recorded_for(name: &str) -> Self {
        Self {
            success: true,
            message: format!("Attendance recorded for {name}"),
        }
    }
}
