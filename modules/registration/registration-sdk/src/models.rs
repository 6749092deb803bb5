//! Public models for the `registration` module.
//!
//! Transport-agnostic; the REST layer maps these onto its own DTOs.

use std::fmt;

/// MIME type of every rendered credential.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Lookup key issued at registration.
///
/// Freshly issued identifiers are always six decimal digits without a leading
/// zero. Values read back from the store are kept verbatim so that lookups
/// compare exactly what the sheet holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Smallest identifier the generator issues.
    pub const MIN: u32 = 100_000;
    /// Largest identifier the generator issues.
    pub const MAX: u32 = 999_999;

    /// Wrap a stored or user-supplied value without validation.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the value has the issued shape (`^[1-9][0-9]{5}$`).
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        let bytes = self.0.as_bytes();
        bytes.len() == 6
            && bytes[0] != b'0'
            && bytes.iter().all(u8::is_ascii_digit)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One registrant as stored. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRecord {
    pub name: String,
    pub role: String,
    pub identifier: Identifier,
    /// Where the uploaded photo was stored; empty when the store has none.
    pub photo_ref: String,
}

/// An uploaded photo before it is stored.
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: Some(content_type.into()),
            bytes,
        }
    }
}

impl fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub name: String,
    pub role: String,
    pub photo: Option<PhotoUpload>,
}

/// Returned by a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialHandle {
    pub identifier: Identifier,
    /// Relative URL the ID card can be downloaded from.
    pub download_path: String,
}

impl CredentialHandle {
    #[must_use]
    pub fn for_identifier(identifier: Identifier) -> Self {
        let download_path = format!("/download-id/{identifier}");
        Self {
            identifier,
            download_path,
        }
    }
}

/// A rendered ID card document.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl CredentialArtifact {
    #[must_use]
    pub fn pdf(file_name: String, bytes: Vec<u8>, page_count: usize) -> Self {
        Self {
            file_name,
            content_type: PDF_CONTENT_TYPE,
            bytes,
            page_count,
        }
    }
}

impl fmt::Debug for CredentialArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialArtifact")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .field("page_count", &self.page_count)
            .finish()
    }
}

/// Outcome of an attendance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub present: bool,
    pub name: Option<String>,
}

impl VerificationResult {
    #[must_use]
    pub fn present(name: String) -> Self {
        Self {
            present: true,
            name: Some(name),
        }
    }

    #[must_use]
    pub fn absent() -> Self {
        Self {
            present: false,
            name: None,
        }
    }
}
