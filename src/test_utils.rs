pub mod test_helpers {
    use std::collections::BTreeMap;

    use image::RgbaImage;

    use crate::geometry::{PageNumber, Point, Rect, Rotation, ScaledPosition, ScaledRect, Viewport};
    use crate::highlight::{Content, Highlight, ViewportHighlight};
    use crate::host::{DocumentRenderer, HighlightHost, PointerEvent, TextRange, TipAnchor};
    use crate::render::HighlightRenderContext;
    use crate::scroll::{ScrollRequests, ScrollTarget};
    use crate::tip::TipController;

    /// Vertical gap between stacked pages, pixels
    pub const PAGE_GAP: f64 = 10.0;

    struct FakePage {
        width: f64,
        height: f64,
        mounted: bool,
        canvas: Option<RgbaImage>,
    }

    /// Vertically stacked pages of the same size, all mounted by default
    pub struct FakeRenderer {
        pages: Vec<FakePage>,
        scale: f64,
        rotation: Rotation,
        pub scrolls: Vec<ScrollTarget>,
        pub view_changes: Vec<(f64, Rotation)>,
    }

    impl FakeRenderer {
        /// `width` and `height` are unscaled page dimensions
        pub fn new(page_count: u32, width: f64, height: f64) -> Self {
            let pages = (0..page_count)
                .map(|_| FakePage {
                    width,
                    height,
                    mounted: true,
                    canvas: None,
                })
                .collect();
            Self {
                pages,
                scale: 1.0,
                rotation: Rotation::None,
                scrolls: Vec::new(),
                view_changes: Vec::new(),
            }
        }

        pub fn unmount(&mut self, page: PageNumber) {
            if let Some(p) = self.page_mut(page) {
                p.mounted = false;
            }
        }

        pub fn mount(&mut self, page: PageNumber) {
            if let Some(p) = self.page_mut(page) {
                p.mounted = true;
            }
        }

        pub fn set_canvas(&mut self, page: PageNumber, canvas: RgbaImage) {
            if let Some(p) = self.page_mut(page) {
                p.canvas = Some(canvas);
            }
        }

        fn page(&self, page: PageNumber) -> Option<&FakePage> {
            self.pages.get(page.checked_sub(1)? as usize)
        }

        fn page_mut(&mut self, page: PageNumber) -> Option<&mut FakePage> {
            self.pages.get_mut(page.checked_sub(1)? as usize)
        }

        fn pixel_size(&self, page: &FakePage) -> (f64, f64) {
            let (w, h) = (page.width * self.scale, page.height * self.scale);
            if self.rotation.swaps_axes() {
                (h, w)
            } else {
                (w, h)
            }
        }
    }

    impl DocumentRenderer for FakeRenderer {
        fn page_count(&self) -> PageNumber {
            self.pages.len() as PageNumber
        }

        fn page_viewport(&self, page_number: PageNumber) -> Option<Viewport> {
            let page = self.page(page_number).filter(|p| p.mounted)?;
            let (w, h) = self.pixel_size(page);
            Some(Viewport::new(w, h, self.scale, self.rotation))
        }

        fn page_offset(&self, page_number: PageNumber) -> Option<Point> {
            self.page(page_number).filter(|p| p.mounted)?;
            let above: f64 = self
                .pages
                .iter()
                .take(page_number as usize - 1)
                .map(|p| self.pixel_size(p).1 + PAGE_GAP)
                .sum();
            Some(Point::new(0.0, above))
        }

        fn page_canvas(&self, page_number: PageNumber) -> Option<&RgbaImage> {
            self.page(page_number)
                .filter(|p| p.mounted)?
                .canvas
                .as_ref()
        }

        fn set_view(&mut self, scale: f64, rotation: Rotation) {
            self.scale = scale;
            self.rotation = rotation;
            self.view_changes.push((scale, rotation));
        }

        fn scroll_page_into_view(&mut self, target: &ScrollTarget) {
            self.scrolls.push(*target);
        }
    }

    /// One highlight as handed to the host during a render pass
    #[derive(Clone, Debug)]
    pub struct RenderedHighlight {
        pub highlight: ViewportHighlight,
        pub index: usize,
        pub is_focused: bool,
        /// Bounding rect converted back through the page's converter
        pub scaled: ScaledRect,
    }

    /// Host that records every callback. Renderables are short strings.
    #[derive(Default)]
    pub struct RecordingHost {
        pending: Vec<RenderedHighlight>,
        pub layers: BTreeMap<PageNumber, Vec<RenderedHighlight>>,
        pub labels: BTreeMap<PageNumber, Vec<String>>,
        pub layer_calls: usize,
        pub tip: Option<(TipAnchor, Option<String>)>,
        pub hide_tip_calls: usize,
        pub selection_finished: Vec<(ScaledPosition, Content)>,
        pub last_tip_controller: Option<TipController<String>>,
        pub text_selection: Vec<bool>,
        pub scroll_changes: usize,
        pub scroll_handle: Option<ScrollRequests>,
        pub changes: Vec<Vec<Highlight>>,
        /// Area drags start when Alt is held
        pub area_on_alt: bool,
    }

    impl RecordingHost {
        pub fn new() -> Self {
            Self {
                area_on_alt: true,
                ..Self::default()
            }
        }

        /// Every highlight drawn in the last pass, across pages
        pub fn drawn(&self) -> Vec<&RenderedHighlight> {
            self.layers.values().flatten().collect()
        }
    }

    impl HighlightHost for RecordingHost {
        type Renderable = String;

        fn highlight_transform(&mut self, ctx: HighlightRenderContext<'_, String>) -> String {
            let rect = ctx.highlight.position.bounding_rect;
            let label = ctx
                .highlight
                .id
                .as_ref()
                .map_or_else(|| "ghost".to_string(), ToString::to_string);
            let scaled = ctx
                .to_scaled
                .position_to_scaled(&ctx.highlight.position)
                .bounding_rect;
            self.pending.push(RenderedHighlight {
                highlight: ctx.highlight,
                index: ctx.index,
                is_focused: ctx.is_focused,
                scaled,
            });
            format!("{label}@{:.0},{:.0}", rect.left, rect.top)
        }

        fn on_selection_finished(
            &mut self,
            position: &ScaledPosition,
            content: &Content,
            tip: &TipController<String>,
        ) -> Option<String> {
            self.selection_finished
                .push((position.clone(), content.clone()));
            self.last_tip_controller = Some(tip.clone());
            Some("comment-form".to_string())
        }

        fn render_page_layer(&mut self, page_number: PageNumber, layer: Vec<String>) {
            self.layer_calls += 1;
            self.labels.insert(page_number, layer);
            self.layers
                .insert(page_number, std::mem::take(&mut self.pending));
        }

        fn show_tip(&mut self, anchor: TipAnchor, content: Option<String>) {
            self.tip = Some((anchor, content));
        }

        fn hide_tip(&mut self) {
            self.hide_tip_calls += 1;
            self.tip = None;
        }

        fn enable_area_selection(&self, event: &PointerEvent) -> bool {
            self.area_on_alt && event.alt_key
        }

        fn set_text_selection_enabled(&mut self, enabled: bool) {
            self.text_selection.push(enabled);
        }

        fn on_scroll_change(&mut self) {
            self.scroll_changes += 1;
        }

        fn on_document_ready(&mut self, scroll: ScrollRequests) {
            self.scroll_handle = Some(scroll);
        }

        fn on_highlights_changed(&mut self, highlights: &[Highlight]) {
            self.changes.push(highlights.to_vec());
        }
    }

    /// Text range covering one line at page-local `(left, top)` of `page`,
    /// expressed in absolute container pixels for an unscaled
    /// [`FakeRenderer`] with pages of `page_height`
    pub fn line_selection(
        page: PageNumber,
        page_height: f64,
        left: f64,
        top: f64,
        text: &str,
    ) -> TextRange {
        let offset = f64::from(page - 1) * (page_height + PAGE_GAP);
        TextRange::new(
            page,
            vec![Rect::new(left, offset + top, 120.0, 14.0)],
            text,
        )
    }
}
