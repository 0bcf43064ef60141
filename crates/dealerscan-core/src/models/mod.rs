//! Data models: OCR input, configuration, and resolution results.

pub mod config;
pub mod document;
pub mod result;

pub use config::ScanConfig;
pub use document::{OcrPage, Token};
pub use result::{Reason, Resolution};
