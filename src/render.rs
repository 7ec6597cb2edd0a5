//! Full render passes over every mounted page
//!
//! There is no diffing: whenever something that affects geometry changes,
//! every mounted page's highlight layer is rebuilt from scratch.

use image::RgbaImage;
use log::{debug, trace};

use crate::geometry::{
    PageNumber, Point, Rect, Rotation, ScaledPosition, ScaledRect, Viewport, ViewportPosition,
    to_scaled,
};
use crate::highlight::{
    GhostHighlight, Highlight, HighlightId, HighlightSet, PageHighlight, ViewportHighlight,
};
use crate::host::{DocumentRenderer, HighlightHost, TipAnchor};
use crate::registry::group_by_page;
use crate::screenshot::capture_area;
use crate::selection::TipState;
use crate::tip::{TipController, TipRenderer};

/// Converts viewport rectangles of one page back into scaled space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageConverter {
    viewport: Viewport,
}

impl PageConverter {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub fn to_scaled(&self, rect: &Rect) -> ScaledRect {
        to_scaled(rect, &self.viewport)
    }

    #[must_use]
    pub fn position_to_scaled(&self, position: &ViewportPosition) -> ScaledPosition {
        position.to_scaled(&self.viewport)
    }
}

/// Screenshot capability bound to one page's raster
#[derive(Clone, Copy, Debug)]
pub struct Screenshot<'a> {
    canvas: Option<&'a RgbaImage>,
}

impl<'a> Screenshot<'a> {
    #[must_use]
    pub fn new(canvas: Option<&'a RgbaImage>) -> Self {
        Self { canvas }
    }

    /// PNG data URL of `rect`, page-local pixels
    #[must_use]
    pub fn capture(&self, rect: &Rect) -> String {
        capture_area(self.canvas, rect)
    }
}

/// Everything the host gets to build one highlight's visual
pub struct HighlightRenderContext<'a, R> {
    pub highlight: ViewportHighlight,
    /// Position within the page group
    pub index: usize,
    pub tip: TipController<R>,
    pub to_scaled: PageConverter,
    pub screenshot: Screenshot<'a>,
    pub is_focused: bool,
}

/// Snapshot of what a render pass draws
pub struct RenderInput<'s, R> {
    pub highlights: &'s [Highlight],
    pub ghost: Option<&'s GhostHighlight>,
    pub focused: Option<&'s HighlightId>,
    pub tip_state: Option<&'s TipState<TipRenderer<R>>>,
    pub tip: &'s TipController<R>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub pages_rendered: usize,
    pub pages_skipped: usize,
    pub highlights: usize,
}

/// Remembers what the last pass was drawn from
#[derive(Clone, Debug, Default)]
pub struct RenderScheduler {
    last: Option<(HighlightSet, f64, Rotation)>,
}

impl RenderScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the collection reference, scale or rotation differ from
    /// the last pass
    #[must_use]
    pub fn needs_render(&self, highlights: &HighlightSet, scale: f64, rotation: Rotation) -> bool {
        match &self.last {
            None => true,
            Some((set, s, r)) => !set.same_as(highlights) || *s != scale || *r != rotation,
        }
    }

    pub fn mark_rendered(&mut self, highlights: &HighlightSet, scale: f64, rotation: Rotation) {
        self.last = Some((highlights.clone(), scale, rotation));
    }

    /// Forget the last pass so the next check always renders
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}

/// Rebuild the highlight layer of every mounted page, then place the tip
pub fn render_all<D, H>(
    renderer: &D,
    host: &mut H,
    input: &RenderInput<'_, H::Renderable>,
) -> RenderStats
where
    D: DocumentRenderer,
    H: HighlightHost,
{
    let mut groups = group_by_page(input.highlights, input.ghost);
    let mut stats = RenderStats::default();

    for page_number in 1..=renderer.page_count() {
        let Some(viewport) = renderer.page_viewport(page_number) else {
            debug!("Page {page_number} not mounted, skipping render");
            stats.pages_skipped += 1;
            continue;
        };
        let group = groups.remove(&page_number).unwrap_or_default();
        let converter = PageConverter::new(viewport);
        let screenshot = Screenshot::new(renderer.page_canvas(page_number));

        let layer: Vec<_> = group
            .iter()
            .enumerate()
            .map(|(index, highlight)| {
                let position = highlight.position().to_viewport(&viewport);
                let is_focused = input.focused.is_some() && highlight.id() == input.focused;
                host.highlight_transform(HighlightRenderContext {
                    highlight: highlight.with_viewport_position(position),
                    index,
                    tip: input.tip.clone(),
                    to_scaled: converter,
                    screenshot,
                    is_focused,
                })
            })
            .collect();

        stats.highlights += layer.len();
        stats.pages_rendered += 1;
        host.render_page_layer(page_number, layer);
    }

    for page_number in groups.keys() {
        trace!("Highlights on page {page_number} beyond the document, not drawn");
    }

    render_tip(renderer, host, input);
    stats
}

/// Show the open tip at its anchor, or hide it when it cannot be placed
pub fn render_tip<D, H>(renderer: &D, host: &mut H, input: &RenderInput<'_, H::Renderable>)
where
    D: DocumentRenderer,
    H: HighlightHost,
{
    let Some(state) = input.tip_state else {
        return;
    };

    match state {
        TipState::Selection => {
            let Some(ghost) = input.ghost else {
                host.hide_tip();
                return;
            };
            let Some((viewport, offset)) = page_geometry(renderer, ghost.position.page_number)
            else {
                return;
            };
            let position = ghost.position.to_viewport(&viewport);
            let content = host.on_selection_finished(&ghost.position, &ghost.content, input.tip);
            host.show_tip(
                TipAnchor::new(position.page_number, offset, &position.bounding_rect),
                content,
            );
        }
        TipState::Highlight { id, render } => {
            let Some(highlight) = input.highlights.iter().find(|h| &h.id == id) else {
                debug!("Tip target {id} no longer exists, hiding tip");
                host.hide_tip();
                return;
            };
            let Some((viewport, offset)) = page_geometry(renderer, highlight.page_number()) else {
                return;
            };
            let position = highlight.position.to_viewport(&viewport);
            let anchor = TipAnchor::new(position.page_number, offset, &position.bounding_rect);
            let vh = PageHighlight::Committed(highlight).with_viewport_position(position);
            host.show_tip(anchor, Some(render(&vh)));
        }
    }
}

fn page_geometry<D: DocumentRenderer>(
    renderer: &D,
    page_number: PageNumber,
) -> Option<(Viewport, Point)> {
    let viewport = renderer.page_viewport(page_number)?;
    let offset = renderer.page_offset(page_number)?;
    Some((viewport, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_tracks_reference_scale_and_rotation() {
        let set = HighlightSet::new(Vec::new());
        let mut scheduler = RenderScheduler::new();
        assert!(scheduler.needs_render(&set, 1.0, Rotation::None));

        scheduler.mark_rendered(&set, 1.0, Rotation::None);
        assert!(!scheduler.needs_render(&set.clone(), 1.0, Rotation::None));
        assert!(scheduler.needs_render(&set, 1.5, Rotation::None));
        assert!(scheduler.needs_render(&set, 1.0, Rotation::Clockwise));

        // Equal contents, new reference
        assert!(scheduler.needs_render(&HighlightSet::new(Vec::new()), 1.0, Rotation::None));

        scheduler.invalidate();
        assert!(scheduler.needs_render(&set, 1.0, Rotation::None));
    }

    #[test]
    fn converter_undoes_page_viewport() {
        let converter = PageConverter::new(Viewport::new(1200.0, 1600.0, 2.0, Rotation::None));
        let scaled = converter.to_scaled(&Rect::new(20.0, 40.0, 10.0, 10.0));
        assert_eq!(scaled, ScaledRect::new(10.0, 20.0, 5.0, 5.0));
    }

    #[test]
    fn screenshot_without_canvas_is_blank_region() {
        let url = Screenshot::new(None).capture(&Rect::new(5.0, 5.0, 8.0, 3.0));
        let image = crate::screenshot::decode_png(&url).unwrap();
        assert_eq!(image.dimensions(), (8, 3));
    }
}
