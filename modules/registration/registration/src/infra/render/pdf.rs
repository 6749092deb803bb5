use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use registration_sdk::{CredentialArtifact, RegistrationRecord};
use tracing::debug;

use super::layout::{
    self, PAGE_HEIGHT, PAGE_WIDTH, QR_LEFT, QR_SIZE, QR_TOP, TEMPLATE_WIDTH, TEXT_LEFT,
};
use super::qr::{self, QrRaster};
use super::template::CardTemplate;
use crate::domain::error::RenderError;
use crate::domain::ports::CredentialRenderer;

const FONT_RESOURCE: &str = "F1";
const TEMPLATE_RESOURCE: &str = "Template";
const PAYLOAD_RESOURCE: &str = "Payload";

pub const BULK_FILE_NAME: &str = "all_id_cards.pdf";

#[must_use]
pub fn card_file_name(identifier: &str) -> String {
    format!("{identifier}_id_card.pdf")
}

/// Renders ID cards onto a background template with lopdf.
///
/// Each page carries the template, three Helvetica text lines and the
/// identifier's QR code as an uncompressed greyscale image. In a bulk document
/// the template and font objects are shared by all pages.
#[derive(Debug, Clone)]
pub struct PdfCredentialRenderer {
    template_path: PathBuf,
}

impl PdfCredentialRenderer {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
        }
    }

    #[must_use]
    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    fn build(&self, records: &[RegistrationRecord]) -> Result<Vec<u8>, RenderError> {
        // encode every payload first so a bad one aborts before any layout work
        let rasters = records
            .iter()
            .map(|r| qr::encode(r.identifier.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(records.len());

        if !records.is_empty() {
            let template = CardTemplate::load(&self.template_path)?;
            let template_height = layout::template_height(template.width_px, template.height_px);
            let shared = SharedResources {
                font: doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                    "Encoding" => "WinAnsiEncoding",
                }),
                template: doc.add_object(template.to_xobject()),
                template_height,
            };

            for (record, raster) in records.iter().zip(&rasters) {
                let page_id = add_page(&mut doc, pages_id, &shared, record, raster)?;
                kids.push(page_id.into());
            }
        }

        let count = pdf_int(kids.len())?;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| RenderError::Finalize(e.to_string()))?;
        Ok(bytes)
    }
}

impl CredentialRenderer for PdfCredentialRenderer {
    fn render(&self, record: &RegistrationRecord) -> Result<CredentialArtifact, RenderError> {
        let bytes = self.build(std::slice::from_ref(record))?;
        debug!(identifier = %record.identifier, bytes = bytes.len(), "card rendered");
        Ok(CredentialArtifact::pdf(
            card_file_name(record.identifier.as_str()),
            bytes,
            1,
        ))
    }

    fn render_bulk(
        &self,
        records: &[RegistrationRecord],
    ) -> Result<CredentialArtifact, RenderError> {
        let bytes = self.build(records)?;
        debug!(pages = records.len(), bytes = bytes.len(), "card sheet rendered");
        Ok(CredentialArtifact::pdf(
            BULK_FILE_NAME.to_owned(),
            bytes,
            records.len(),
        ))
    }
}

struct SharedResources {
    font: ObjectId,
    template: ObjectId,
    template_height: i64,
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    shared: &SharedResources,
    record: &RegistrationRecord,
    raster: &QrRaster,
) -> Result<ObjectId, RenderError> {
    let payload_id = doc.add_object(qr_xobject(raster)?);
    let content = page_content(record, shared.template_height)
        .encode()
        .map_err(|e| RenderError::Finalize(format!("cannot encode page content: {e}")))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![Object::from(0), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { FONT_RESOURCE => shared.font },
            "XObject" => dictionary! {
                TEMPLATE_RESOURCE => shared.template,
                PAYLOAD_RESOURCE => payload_id,
            },
        },
    }))
}

fn page_content(record: &RegistrationRecord, template_height: i64) -> Content {
    let mut operations = Vec::with_capacity(24);

    operations.extend(draw_image(
        TEMPLATE_RESOURCE,
        0,
        0,
        TEMPLATE_WIDTH,
        template_height,
    ));

    for (top, line) in layout::card_lines(record) {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_RESOURCE.into(), layout::FONT_SIZE.into()]),
            Operation::new("Td", vec![TEXT_LEFT.into(), layout::baseline(top).into()]),
            Operation::new(
                "Tj",
                vec![Object::String(win_ansi(&line), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    operations.extend(draw_image(PAYLOAD_RESOURCE, QR_LEFT, QR_TOP, QR_SIZE, QR_SIZE));

    Content { operations }
}

/// `q w 0 0 h x y cm /name Do Q` with `left`/`top` in top-left space.
fn draw_image(name: &str, left: i64, top: i64, width: i64, height: i64) -> [Operation; 4] {
    [
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                width.into(),
                0.into(),
                0.into(),
                height.into(),
                left.into(),
                layout::bottom(top, height).into(),
            ],
        ),
        Operation::new("Do", vec![name.into()]),
        Operation::new("Q", vec![]),
    ]
}

fn qr_xobject(raster: &QrRaster) -> Result<Stream, RenderError> {
    let side = pdf_int(raster.side)?;
    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => side,
            "Height" => side,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Interpolate" => false,
        },
        raster.pixels.clone(),
    ))
}

fn pdf_int(n: usize) -> Result<i64, RenderError> {
    i64::try_from(n).map_err(|_| RenderError::Finalize(format!("{n} exceeds PDF integer range")))
}

/// Latin-1 subset of `WinAnsiEncoding`; anything else becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u8::try_from(u32::from(c)) {
            Ok(b) if !(0x80..0xA0).contains(&b) => b,
            _ => b'?',
        })
        .collect()
}
