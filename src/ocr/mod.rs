pub mod client;
pub mod response;
pub mod umi;

use crate::error::OcrError;
use response::OcrResponse;

/// One raw string recognized in a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextCandidate {
    pub frame_index: u64,
    pub text: String,
}

/// A single recognition attempt against an OCR service.
pub trait OcrBackend: Send + Sync {
    fn name(&self) -> &str;
    fn recognize(&self, image: &[u8], language: Option<&str>) -> Result<OcrResponse, OcrError>;
}
