//! Bitmap encoders: PNG, and the single-page PDF document built from it.

pub mod pdf;
pub mod png;

pub use pdf::{DocumentEncoder, PageSize, PdfEncoder};
pub use png::encode_png;
