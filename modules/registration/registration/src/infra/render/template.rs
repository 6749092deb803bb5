use std::io::{ErrorKind, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{Stream, dictionary};

use crate::domain::error::RenderError;

/// Card background decoded to RGB and deflated for embedding.
pub struct CardTemplate {
    pub width_px: u32,
    pub height_px: u32,
    deflated_rgb: Vec<u8>,
}

impl CardTemplate {
    /// Read and decode a PNG or JPEG template.
    ///
    /// # Errors
    ///
    /// `MissingTemplate` if the file does not exist, `InvalidTemplate` if it
    /// cannot be read or decoded.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RenderError::MissingTemplate {
                path: path.to_path_buf(),
            },
            _ => RenderError::InvalidTemplate {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;

        let rgb = image::load_from_memory(&bytes)
            .map_err(|e| RenderError::InvalidTemplate {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
            .to_rgb8();
        let (width_px, height_px) = rgb.dimensions();

        let deflated_rgb = deflate(rgb.as_raw())
            .map_err(|e| RenderError::Finalize(format!("cannot compress template: {e}")))?;

        Ok(Self {
            width_px,
            height_px,
            deflated_rgb,
        })
    }

    /// Image `XObject` stream for the template.
    #[must_use]
    pub fn to_xobject(&self) -> Stream {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(self.width_px),
                "Height" => i64::from(self.height_px),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            self.deflated_rgb.clone(),
        )
    }
}

fn deflate(raw: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw)?;
    encoder.finish()
}
