pub mod area;
pub mod error;
pub mod geometry;
pub mod highlight;
pub mod highlighter;
pub mod host;
pub mod id;
pub mod panic_handler;
pub mod registry;
pub mod render;
pub mod screenshot;
pub mod scroll;
pub mod selection;
pub mod settings;
pub mod store;
pub mod tip;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{HighlightError, Result};
pub use highlight::{
    Comment, Content, GhostHighlight, Highlight, HighlightId, HighlightPatch, HighlightSet,
    ViewportHighlight,
};
pub use highlighter::Highlighter;
pub use host::{DocumentRenderer, HighlightHost, Key, PointerEvent, TextRange, TipAnchor};
pub use settings::Settings;
