use thiserror::Error;

use crate::geometry::PageNumber;
use crate::highlight::HighlightId;

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("no highlight with id {0}")]
    UnknownHighlight(HighlightId),

    #[error("page {0} is not mounted")]
    PageNotMounted(PageNumber),

    #[error("highlight store I/O failed: {0}")]
    StoreIo(#[from] std::io::Error),

    #[error("failed to serialize highlights: {0}")]
    StoreSerde(#[from] serde_json::Error),

    #[error("failed to encode image: {0}")]
    ImageEncode(#[source] image::ImageError),
}

pub type Result<T> = std::result::Result<T, HighlightError>;
