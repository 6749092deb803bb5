//! Scannable payload: the identifier as a QR code raster.

use qrcode::{Color, QrCode};

use crate::domain::error::RenderError;

/// Light modules kept around the symbol so scanners can find it.
pub const QUIET_ZONE: usize = 4;

const DARK: u8 = 0x00;
const LIGHT: u8 = 0xFF;

/// 8-bit greyscale square raster, one pixel per module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrRaster {
    pub side: usize,
    pub pixels: Vec<u8>,
}

/// Encode `identifier` as a QR code with a quiet zone.
///
/// # Errors
///
/// [`RenderError::EncodingFailed`] when the payload does not fit a QR symbol.
pub fn encode(identifier: &str) -> Result<QrRaster, RenderError> {
    let code = QrCode::new(identifier.as_bytes()).map_err(|e| RenderError::EncodingFailed {
        identifier: identifier.to_owned(),
        reason: e.to_string(),
    })?;

    let modules = code.width();
    let colors = code.to_colors();
    let side = modules + 2 * QUIET_ZONE;
    let mut pixels = vec![LIGHT; side * side];

    for (row, line) in colors.chunks(modules).enumerate() {
        let offset = (row + QUIET_ZONE) * side + QUIET_ZONE;
        for (col, color) in line.iter().enumerate() {
            if *color == Color::Dark {
                pixels[offset + col] = DARK;
            }
        }
    }

    Ok(QrRaster { side, pixels })
}
