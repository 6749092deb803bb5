//! Card geometry in PDF points.
//!
//! Positions are given from the top-left corner of the page, the way the card
//! is designed, and flipped into PDF's bottom-left space at draw time.

use registration_sdk::RegistrationRecord;

/// US Letter.
pub const PAGE_WIDTH: i64 = 612;
pub const PAGE_HEIGHT: i64 = 792;

/// Background template width; height follows the image's aspect ratio.
pub const TEMPLATE_WIDTH: i64 = 600;

pub const FONT_SIZE: i64 = 12;
pub const TEXT_LEFT: i64 = 150;
pub const NAME_TOP: i64 = 150;
pub const ROLE_TOP: i64 = 180;
pub const IDENTIFIER_TOP: i64 = 210;

pub const QR_LEFT: i64 = 150;
pub const QR_TOP: i64 = 250;
pub const QR_SIZE: i64 = 100;

/// Baseline y for a text line whose top edge sits at `top`.
#[must_use]
pub const fn baseline(top: i64) -> i64 {
    PAGE_HEIGHT - top - FONT_SIZE
}

/// Bottom y for a box of `height` whose top edge sits at `top`.
#[must_use]
pub const fn bottom(top: i64, height: i64) -> i64 {
    PAGE_HEIGHT - top - height
}

/// Rendered template height for an image of `width_px` x `height_px`.
#[must_use]
#[allow(clippy::integer_division)]
pub fn template_height(width_px: u32, height_px: u32) -> i64 {
    let (w, h) = (i64::from(width_px), i64::from(height_px));
    if w == 0 {
        return 0;
    }
    // round to nearest point
    (TEMPLATE_WIDTH * h + w / 2) / w
}

/// The three text lines of a card, top to bottom, with their top offsets.
#[must_use]
pub fn card_lines(record: &RegistrationRecord) -> [(i64, String); 3] {
    [
        (NAME_TOP, format!("Name: {}", record.name)),
        (ROLE_TOP, format!("Position: {}", record.role)),
        (IDENTIFIER_TOP, format!("ID: {}", record.identifier)),
    ]
}
