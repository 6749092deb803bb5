//! Row layout of the registrations sheet.
//!
//! Columns: `A` name, `B` role, `C` identifier, `D` photo reference.

use registration_sdk::{Identifier, RegistrationRecord};
use sheets_client::SheetsError;

use crate::domain::error::StoreError;

pub const NAME_COL: usize = 0;
pub const ROLE_COL: usize = 1;
pub const IDENTIFIER_COL: usize = 2;
pub const PHOTO_COL: usize = 3;

/// Cells needed before a row can carry an identifier.
pub const MIN_CELLS: usize = IDENTIFIER_COL + 1;

#[must_use]
pub fn to_row(record: &RegistrationRecord) -> Vec<String> {
    vec![
        record.name.clone(),
        record.role.clone(),
        record.identifier.to_string(),
        record.photo_ref.clone(),
    ]
}

/// `None` when the row is too short to hold an identifier.
#[must_use]
pub fn from_row(row: &[String]) -> Option<RegistrationRecord> {
    if row.len() < MIN_CELLS {
        return None;
    }
    Some(RegistrationRecord {
        name: row[NAME_COL].clone(),
        role: row[ROLE_COL].clone(),
        identifier: Identifier::new(row[IDENTIFIER_COL].clone()),
        photo_ref: row.get(PHOTO_COL).cloned().unwrap_or_default(),
    })
}

/// Whether a raw row's identifier cell equals `identifier`.
#[must_use]
pub fn row_has_identifier(row: &[String], identifier: &str) -> bool {
    row.get(IDENTIFIER_COL).is_some_and(|cell| cell == identifier)
}

/// A1 notation for `cells` on `sheet`, quoting the sheet name when needed.
#[must_use]
pub fn a1_range(sheet: &str, cells: &str) -> String {
    let plain = !sheet.is_empty() && sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        format!("{sheet}!{cells}")
    } else {
        format!("'{}'!{cells}", sheet.replace('\'', "''"))
    }
}

impl From<SheetsError> for StoreError {
    fn from(e: SheetsError) -> Self {
        match e {
            SheetsError::Rejected { message, .. } => Self::Rejected(message),
            other => Self::Unavailable(other.to_string()),
        }
    }
}
