#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::path::{Path, PathBuf};

use lopdf::content::Content;
use lopdf::{Document, ObjectId};
use registration::{RegistrationConfig, RegistrationModule};
use tempfile::TempDir;

pub const BOUNDARY: &str = "registrar-test-boundary";

/// Temp directories plus a module wired to them with the in-memory store.
pub struct TestEnv {
    pub dir: TempDir,
    pub module: RegistrationModule,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_cache(false)
    }

    pub fn with_cache(cache: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let template_path = write_template(dir.path());
        let cfg = RegistrationConfig {
            template_path,
            upload_dir: dir.path().join("uploads"),
            artifact_cache_dir: cache.then(|| dir.path().join("cards")),
            ..RegistrationConfig::default()
        };
        let module = RegistrationModule::from_config(&cfg).unwrap();
        Self { dir, module }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }
}

pub fn write_template(dir: &Path) -> PathBuf {
    let path = dir.join("template.png");
    image::RgbImage::from_pixel(600, 380, image::Rgb([230, 236, 250]))
        .save(&path)
        .unwrap();
    path
}

/// `multipart/form-data` body with text fields and an optional photo part.
pub fn multipart_body(fields: &[(&str, &str)], photo: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = photo {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Text shown by each page's `Tj` operators, page by page.
pub fn page_texts(pdf: &[u8]) -> Vec<Vec<String>> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|page_id| {
            let raw = doc.get_page_content(*page_id).unwrap();
            Content::decode(&raw)
                .unwrap()
                .operations
                .into_iter()
                .filter(|op| op.operator == "Tj")
                .map(|op| String::from_utf8_lossy(op.operands[0].as_str().unwrap()).into_owned())
                .collect()
        })
        .collect()
}

/// Decode the QR payload image of every page.
pub fn page_qr_payloads(pdf: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|page_id| decode_payload(&doc, *page_id))
        .collect()
}

fn decode_payload(doc: &Document, page_id: ObjectId) -> String {
    let payload_id = doc
        .get_dictionary(page_id)
        .unwrap()
        .get(b"Resources")
        .unwrap()
        .as_dict()
        .unwrap()
        .get(b"XObject")
        .unwrap()
        .as_dict()
        .unwrap()
        .get(b"Payload")
        .unwrap()
        .as_reference()
        .unwrap();
    let stream = doc.get_object(payload_id).unwrap().as_stream().unwrap();
    assert_eq!(
        stream.dict.get(b"ColorSpace").unwrap().as_name().unwrap(),
        b"DeviceGray"
    );
    let side = usize::try_from(stream.dict.get(b"Width").unwrap().as_i64().unwrap()).unwrap();
    let pixels = &stream.content;
    assert_eq!(pixels.len(), side * side);

    // one module per pixel is too coarse for the detector
    let scale = 8;
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        side * scale,
        side * scale,
        |x, y| pixels[(y / scale) * side + x / scale],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one QR code");
    let (_, content) = grids[0].decode().unwrap();
    content
}
