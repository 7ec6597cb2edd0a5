//! Collaborator interfaces and the input events fed in by the host
//!
//! The document renderer owns pages, pixels and scrolling. The host UI owns
//! what highlights and tips look like. This crate only decides where and
//! when things are drawn.

use image::RgbaImage;

use crate::geometry::{PageNumber, Point, Rect, Rotation, ScaledPosition, Viewport};
use crate::highlight::{Content, Highlight};
use crate::render::HighlightRenderContext;
use crate::scroll::{ScrollRequests, ScrollTarget};
use crate::tip::TipController;

/// Snapshot of the document's text selection at a selection-change event
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextRange {
    /// Page the selection starts on, if it is inside a page at all
    pub page_number: Option<PageNumber>,
    /// Client rectangles of the selected text, absolute container pixels
    pub client_rects: Vec<Rect>,
    pub text: String,
    pub collapsed: bool,
}

impl TextRange {
    #[must_use]
    pub fn new(page_number: PageNumber, client_rects: Vec<Rect>, text: impl Into<String>) -> Self {
        Self {
            page_number: Some(page_number),
            client_rects,
            text: text.into(),
            collapsed: false,
        }
    }

    /// A caret with nothing selected
    #[must_use]
    pub fn collapsed() -> Self {
        Self {
            collapsed: true,
            ..Self::default()
        }
    }

    /// Non-collapsed with at least some content to highlight
    #[must_use]
    pub fn is_selection(&self) -> bool {
        !self.collapsed && !self.client_rects.is_empty()
    }
}

/// Pointer event in absolute container pixels
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    /// Page element under the pointer, if any
    pub target_page: Option<PageNumber>,
    /// Whether the pointer is over the tip container
    pub inside_tip: bool,
    pub alt_key: bool,
    pub shift_key: bool,
    pub ctrl_key: bool,
    pub meta_key: bool,
}

impl PointerEvent {
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn on_page(mut self, page: PageNumber) -> Self {
        self.target_page = Some(page);
        self
    }

    #[must_use]
    pub fn with_alt(mut self) -> Self {
        self.alt_key = true;
        self
    }

    #[must_use]
    pub fn in_tip(mut self) -> Self {
        self.inside_tip = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other(String),
}

/// Where the tip should be anchored, in absolute container pixels.
///
/// `left` is the horizontal centre of the anchored highlight; `top` and
/// `bottom` are its vertical extent so the host can flip the tip above or
/// below.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TipAnchor {
    pub page_number: PageNumber,
    pub left: f64,
    pub top: f64,
    pub bottom: f64,
}

impl TipAnchor {
    #[must_use]
    pub fn new(page_number: PageNumber, page_offset: Point, bounding_rect: &Rect) -> Self {
        let top = page_offset.y + bounding_rect.top;
        Self {
            page_number,
            left: page_offset.x + bounding_rect.left + bounding_rect.width / 2.0,
            top,
            bottom: top + bounding_rect.height,
        }
    }
}

/// The paging document renderer
pub trait DocumentRenderer {
    fn page_count(&self) -> PageNumber;

    /// Current geometry of a mounted page, `None` while it is not mounted
    fn page_viewport(&self, page_number: PageNumber) -> Option<Viewport>;

    /// Offset of the page element inside the scroll container
    fn page_offset(&self, page_number: PageNumber) -> Option<Point>;

    /// Rendered raster of a page, `None` until it has been painted
    fn page_canvas(&self, page_number: PageNumber) -> Option<&RgbaImage>;

    /// Apply a new zoom factor and rotation to every page
    fn set_view(&mut self, scale: f64, rotation: Rotation);

    fn scroll_page_into_view(&mut self, target: &ScrollTarget);
}

/// The UI embedding the highlighter
pub trait HighlightHost {
    /// Whatever the UI draws: a widget, a DOM node, a display-list entry...
    type Renderable;

    /// Build the visual for one highlight on a page
    fn highlight_transform(
        &mut self,
        ctx: HighlightRenderContext<'_, Self::Renderable>,
    ) -> Self::Renderable;

    /// Build the tip shown for a freshly settled selection
    fn on_selection_finished(
        &mut self,
        position: &ScaledPosition,
        content: &Content,
        tip: &TipController<Self::Renderable>,
    ) -> Option<Self::Renderable>;

    /// Replace everything drawn in a page's highlight layer
    fn render_page_layer(&mut self, page_number: PageNumber, layer: Vec<Self::Renderable>);

    fn show_tip(&mut self, anchor: TipAnchor, content: Option<Self::Renderable>);

    fn hide_tip(&mut self);

    /// Gesture predicate deciding whether a drag starts an area selection
    fn enable_area_selection(&self, _event: &PointerEvent) -> bool {
        false
    }

    /// Text selection is suppressed while an area drag runs
    fn set_text_selection_enabled(&mut self, _enabled: bool) {}

    /// First user scroll after a programmatic scroll
    fn on_scroll_change(&mut self) {}

    /// Pages are initialised; keep the handle to request navigation later
    fn on_document_ready(&mut self, _scroll: ScrollRequests) {}

    /// The collection changed from inside the highlighter (commit, edit,
    /// removal)
    fn on_highlights_changed(&mut self, _highlights: &[Highlight]) {}
}
