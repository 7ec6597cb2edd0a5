//! The highlighter: owns interaction state and drives the host
//!
//! Every public handler follows the same shape: drain queued tip requests,
//! translate the input into a [`Command`], apply it, then carry out the
//! resulting effects. Rendering is always a full pass over mounted pages.

use std::time::Instant;

use log::{debug, error, info, trace, warn};

use crate::area::{AreaSelectionController, area_ghost};
use crate::error::{HighlightError, Result};
use crate::geometry::{PageNumber, Rotation, ViewportPosition, page_local_rects};
use crate::highlight::{Comment, Content, GhostHighlight, HighlightId, HighlightPatch, HighlightSet};
use crate::host::{DocumentRenderer, HighlightHost, Key, PointerEvent, TextRange};
use crate::id::{IdGenerator, SequentialIds};
use crate::render::{RenderInput, RenderScheduler, render_all};
use crate::scroll::{ScrollController, ScrollRequests};
use crate::selection::{Command, Effect, Phase, SelectionMachine, TipState};
use crate::settings::Settings;
use crate::store::HighlightStore;
use crate::tip::{TipCommand, TipController, TipRenderer};

struct StoreBinding {
    store: Box<dyn HighlightStore>,
    key: String,
}

pub struct Highlighter<D, H: HighlightHost> {
    renderer: D,
    host: H,
    settings: Settings,
    highlights: HighlightSet,
    machine: SelectionMachine<TipRenderer<H::Renderable>>,
    tip: TipController<H::Renderable>,
    scheduler: RenderScheduler,
    scroll: ScrollController,
    scroll_requests: ScrollRequests,
    area: AreaSelectionController,
    store: Option<StoreBinding>,
    scale: f64,
    rotation: Rotation,
    draining: bool,
    closed: bool,
}

impl<D, H> Highlighter<D, H>
where
    D: DocumentRenderer,
    H: HighlightHost,
{
    pub fn new(renderer: D, host: H, settings: Settings) -> Self {
        let machine = SelectionMachine::new(
            settings.settle_delay(),
            Box::new(SequentialIds::default()),
        );
        let scroll = ScrollController::new(settings.scroll_margin_px, settings.focus_grace());
        let area = AreaSelectionController::new(settings.min_area_size_px);

        Self {
            renderer,
            host,
            settings,
            highlights: HighlightSet::default(),
            machine,
            tip: TipController::new(),
            scheduler: RenderScheduler::new(),
            scroll,
            scroll_requests: ScrollRequests::new(),
            area,
            store: None,
            scale: 1.0,
            rotation: Rotation::None,
            draining: false,
            closed: false,
        }
    }

    /// Load the collection saved under `key` and persist every change back.
    ///
    /// Sequential ids resume after the highest id found in the store.
    pub fn with_store(mut self, store: Box<dyn HighlightStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let loaded = store.load(&key);
        info!("Loaded {} highlights for {key}", loaded.len());
        self.machine.reserve_ids(loaded.iter().map(|h| &h.id));
        self.highlights = HighlightSet::new(loaded);
        self.store = Some(StoreBinding { store, key });
        self
    }

    /// Replace the id generator for committed highlights
    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.machine.set_id_generator(ids);
        self.machine
            .reserve_ids(self.highlights.as_slice().iter().map(|h| &h.id));
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn renderer(&self) -> &D {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut D {
        &mut self.renderer
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn highlights(&self) -> &HighlightSet {
        &self.highlights
    }

    pub fn ghost(&self) -> Option<&GhostHighlight> {
        self.machine.ghost()
    }

    pub fn tip_state(&self) -> Option<&TipState<TipRenderer<H::Renderable>>> {
        self.machine.tip()
    }

    pub fn focused(&self) -> Option<&HighlightId> {
        self.machine.focused()
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Handle for navigating by id, the same one given to the host when the
    /// document becomes ready
    pub fn scroll_requests(&self) -> ScrollRequests {
        self.scroll_requests.clone()
    }

    /// Tip controller shared with host callbacks
    pub fn tip_controller(&self) -> TipController<H::Renderable> {
        self.tip.clone()
    }

    /// Replace the collection wholesale. A new snapshot always re-renders,
    /// even if its contents are equal to the previous one.
    pub fn set_highlights(&mut self, highlights: impl Into<HighlightSet>) {
        if self.closed {
            return;
        }
        self.highlights = highlights.into();
        self.machine
            .reserve_ids(self.highlights.as_slice().iter().map(|h| &h.id));
        self.close_orphaned_tip();
        self.render_if_changed();
    }

    /// Apply a new zoom factor and rotation
    pub fn set_view(&mut self, scale: f64, rotation: Rotation) {
        if self.closed {
            return;
        }
        if scale == self.scale && rotation == self.rotation {
            return;
        }
        debug!("View changed to scale {scale}, rotation {}°", rotation.degrees());
        self.scale = scale;
        self.rotation = rotation;
        self.renderer.set_view(scale, rotation);
        self.render_if_changed();
    }

    /// Pages were initialised by the renderer
    pub fn on_pages_init(&mut self) {
        if self.closed {
            return;
        }
        self.host.on_document_ready(self.scroll_requests.clone());
        self.render();
    }

    /// A page finished laying out its text layer; newly mounted pages have
    /// no overlay yet
    pub fn on_text_layer_rendered(&mut self, page_number: PageNumber) {
        if self.closed {
            return;
        }
        trace!("Text layer ready on page {page_number}");
        self.render();
    }

    pub fn on_selection_change(&mut self, range: Option<TextRange>, now: Instant) {
        self.dispatch(Command::SelectionChanged(range), now);
    }

    pub fn on_pointer_down(&mut self, event: &PointerEvent, now: Instant) {
        if self.closed {
            return;
        }
        self.dispatch(
            Command::PointerDown {
                inside_tip: event.inside_tip,
            },
            now,
        );

        if event.inside_tip || !self.host.enable_area_selection(event) {
            return;
        }
        let Some(page) = event.target_page else {
            return;
        };
        let Some(offset) = self.renderer.page_offset(page) else {
            debug!("Area drag on unmounted page {page} ignored");
            return;
        };
        self.area.start(page, offset, event.position);
        self.dispatch(Command::AreaDragStarted, now);
    }

    pub fn on_pointer_move(&mut self, event: &PointerEvent) {
        if self.closed {
            return;
        }
        self.area.update(event.position);
    }

    pub fn on_pointer_up(&mut self, event: &PointerEvent, now: Instant) {
        if self.closed || !self.area.is_dragging() {
            return;
        }
        let finished = self.area.finish(event.position);
        let ghost = finished.and_then(|(page, rect)| {
            let viewport = self.renderer.page_viewport(page)?;
            Some(area_ghost(page, rect, &viewport, self.renderer.page_canvas(page)))
        });

        match ghost {
            Some(ghost) => self.dispatch(Command::AreaSelected(ghost), now),
            None => self.dispatch(Command::AreaDragAbandoned, now),
        }
    }

    pub fn on_key_down(&mut self, key: Key, now: Instant) {
        if key == Key::Escape && self.area.is_dragging() {
            self.area.cancel();
            self.dispatch(Command::AreaDragAbandoned, now);
        }
        self.dispatch(Command::KeyDown(key), now);
    }

    /// Generic scroll notification from the renderer
    pub fn on_scroll(&mut self, now: Instant) {
        if self.closed {
            return;
        }
        if self.scroll.on_scroll(now) {
            self.host.on_scroll_change();
            self.dispatch(Command::ClearFocus, now);
        }
    }

    /// Advance timers and resolve queued requests
    pub fn tick(&mut self, now: Instant) {
        if self.closed {
            return;
        }
        self.drain_tip(now);
        self.scroll.poll(now);

        let renderer = &self.renderer;
        let effects = self
            .machine
            .poll_settle(now, |range| resolve_text_range(renderer, range));
        self.run(effects, now);

        for id in self.scroll_requests.drain() {
            if let Err(e) = self.scroll_to(&id, now) {
                warn!("Dropping scroll request for {id}: {e}");
            }
        }
    }

    /// Scroll a highlight into view and focus it
    pub fn scroll_to(&mut self, id: &HighlightId, now: Instant) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let highlight = self
            .highlights
            .find(id)
            .ok_or_else(|| HighlightError::UnknownHighlight(id.clone()))?;
        let page = highlight.page_number();
        let viewport = self
            .renderer
            .page_viewport(page)
            .ok_or(HighlightError::PageNotMounted(page))?;

        let target = self.scroll.target(&highlight.position, &viewport);
        self.scroll.begin(now);
        self.renderer.scroll_page_into_view(&target);
        debug!("Scrolled to {id} on page {page}");

        self.dispatch(Command::Focus(id.clone()), now);
        Ok(())
    }

    /// Turn the pending ghost into a highlight
    pub fn commit(&mut self, comment: Comment, now: Instant) {
        self.dispatch(Command::Commit(comment), now);
    }

    /// Discard the pending ghost and tip
    pub fn cancel(&mut self, now: Instant) {
        self.dispatch(Command::Cancel, now);
    }

    /// Merge an edit into an existing highlight, keeping its id
    pub fn update_highlight(&mut self, id: &HighlightId, patch: &HighlightPatch) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let updated = self
            .highlights
            .with_patched(id, patch)
            .ok_or_else(|| HighlightError::UnknownHighlight(id.clone()))?;
        info!("Updated highlight {id}");
        self.replace_collection(updated);
        Ok(())
    }

    pub fn remove_highlight(&mut self, id: &HighlightId, now: Instant) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let remaining = self
            .highlights
            .without(id)
            .ok_or_else(|| HighlightError::UnknownHighlight(id.clone()))?;
        info!("Removed highlight {id}");
        if self.machine.focused() == Some(id) {
            // The collection render below covers it
            let _ = self.machine.apply(Command::ClearFocus, now);
        }
        self.replace_collection(remaining);
        Ok(())
    }

    /// Detach from the document: pending timers are discarded and every
    /// handler becomes a no-op
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.machine.shutdown();
        self.scroll.detach();
        self.area.cancel();
        let _ = self.tip.drain();
        let _ = self.scroll_requests.drain();
        self.closed = true;
        info!("Highlighter closed");
    }

    fn dispatch(&mut self, command: Command<TipRenderer<H::Renderable>>, now: Instant) {
        if self.closed {
            return;
        }
        self.drain_tip(now);
        let effects = self.machine.apply(command, now);
        self.run(effects, now);
    }

    fn run(&mut self, effects: Vec<Effect>, now: Instant) {
        let mut render = false;
        for effect in effects {
            match effect {
                Effect::Render => render = true,
                Effect::TextSelectionEnabled(enabled) => {
                    self.host.set_text_selection_enabled(enabled);
                }
                Effect::HideTip => self.host.hide_tip(),
                Effect::Committed(highlight) => {
                    let next = self.highlights.with_prepended(highlight);
                    self.highlights = next;
                    self.persist();
                    self.host.on_highlights_changed(self.highlights.as_slice());
                    render = true;
                }
            }
        }

        if render {
            self.render();
            if !self.draining {
                self.draining = true;
                self.drain_tip(now);
                self.draining = false;
            }
        }
    }

    /// Apply requests queued by host callbacks
    fn drain_tip(&mut self, now: Instant) {
        for request in self.tip.drain() {
            trace!("Tip request {request:?}");
            let command = match request {
                TipCommand::Open { id, render } => Command::OpenTip { id, render },
                TipCommand::Close => Command::CloseTip,
                TipCommand::Commit(comment) => Command::Commit(comment),
                TipCommand::Cancel => Command::Cancel,
                TipCommand::Reopen => Command::Reopen,
            };
            let effects = self.machine.apply(command, now);
            self.run(effects, now);
        }
    }

    fn replace_collection(&mut self, highlights: HighlightSet) {
        self.highlights = highlights;
        self.close_orphaned_tip();
        self.persist();
        self.host.on_highlights_changed(self.highlights.as_slice());
        self.render_if_changed();
    }

    /// A tip anchored to a highlight that left the collection goes with it
    fn close_orphaned_tip(&mut self) {
        let orphaned = self
            .machine
            .tip()
            .and_then(TipState::highlight_id)
            .is_some_and(|id| self.highlights.find(id).is_none());
        if !orphaned {
            return;
        }
        debug!("Tip target left the collection, closing tip");
        for effect in self.machine.close_tip() {
            if effect == Effect::HideTip {
                self.host.hide_tip();
            }
        }
    }

    fn persist(&self) {
        let Some(binding) = &self.store else {
            return;
        };
        if let Err(e) = binding.store.save(&binding.key, self.highlights.as_slice()) {
            error!("Failed to save highlights for {}: {e}", binding.key);
        }
    }

    fn render_if_changed(&mut self) {
        if self
            .scheduler
            .needs_render(&self.highlights, self.scale, self.rotation)
        {
            self.render();
        }
    }

    fn render(&mut self) {
        let input = RenderInput {
            highlights: self.highlights.as_slice(),
            ghost: self.machine.ghost(),
            focused: self.machine.focused(),
            tip_state: self.machine.tip(),
            tip: &self.tip,
        };
        let stats = render_all(&self.renderer, &mut self.host, &input);
        self.scheduler
            .mark_rendered(&self.highlights, self.scale, self.rotation);
        trace!(
            "Rendered {} highlights on {} pages ({} skipped)",
            stats.highlights, stats.pages_rendered, stats.pages_skipped
        );
    }
}

/// Turn a settled text range into a ghost on its page
fn resolve_text_range<D: DocumentRenderer>(
    renderer: &D,
    range: &TextRange,
) -> Option<GhostHighlight> {
    let page = range.page_number?;
    let viewport = renderer.page_viewport(page)?;
    let offset = renderer.page_offset(page)?;
    let rects = page_local_rects(
        &range.client_rects,
        offset,
        viewport.width_px,
        viewport.height_px,
    );
    let position = ViewportPosition::from_rects(page, rects)?;
    Some(GhostHighlight::new(
        position.to_scaled(&viewport),
        Content::text(range.text.clone()),
    ))
}
