pub mod layout;
pub mod pdf;
pub mod qr;
pub mod template;

pub use pdf::PdfCredentialRenderer;
