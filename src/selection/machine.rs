//! Selection and highlight interaction state

use std::time::{Duration, Instant};

use log::{debug, info};

use super::debounce::Debounce;
use crate::highlight::{Comment, GhostHighlight, Highlight, HighlightId};
use crate::host::{Key, TextRange};
use crate::id::{IdGenerator, SequentialIds};

/// Quiet period after the last selection change before a selection settles
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// What the user is doing right now
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    /// A non-collapsed text selection exists and has not settled yet
    TextRangeActive,
    /// A pointer drag is drawing an area selection
    AreaSelecting,
}

/// The single open tip
pub enum TipState<T> {
    /// Anchored at the ghost highlight, content comes from the host's
    /// selection-finished callback
    Selection,
    /// Anchored at a committed highlight
    Highlight { id: HighlightId, render: T },
}

impl<T> TipState<T> {
    #[must_use]
    pub fn highlight_id(&self) -> Option<&HighlightId> {
        match self {
            Self::Selection => None,
            Self::Highlight { id, .. } => Some(id),
        }
    }
}

/// Inputs to the state machine
pub enum Command<T> {
    /// Selection-change event; `None` when there is no range at all
    SelectionChanged(Option<TextRange>),
    /// The gesture predicate approved a drag over a page
    AreaDragStarted,
    /// Drag finished and produced a ghost
    AreaSelected(GhostHighlight),
    /// Drag finished without a usable rectangle
    AreaDragAbandoned,
    OpenTip { id: HighlightId, render: T },
    CloseTip,
    Commit(Comment),
    Cancel,
    KeyDown(Key),
    PointerDown { inside_tip: bool },
    Focus(HighlightId),
    ClearFocus,
    /// Re-render the pending tip
    Reopen,
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Run a full render pass
    Render,
    /// Enable or suppress native text selection
    TextSelectionEnabled(bool),
    /// Remove the tip from screen
    HideTip,
    /// A ghost became a persisted highlight
    Committed(Highlight),
}

/// Owner of all mutable interaction state.
///
/// At most one ghost highlight and one tip exist at any time. A ghost always
/// comes with a [`TipState::Selection`] tip, and both are cleared together.
pub struct SelectionMachine<T> {
    phase: Phase,
    range: Option<TextRange>,
    settle: Debounce,
    ghost: Option<GhostHighlight>,
    tip: Option<TipState<T>>,
    focused: Option<HighlightId>,
    ids: Box<dyn IdGenerator>,
}

impl<T> Default for SelectionMachine<T> {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_DELAY, Box::new(SequentialIds::default()))
    }
}

impl<T> SelectionMachine<T> {
    #[must_use]
    pub fn new(settle_delay: Duration, ids: Box<dyn IdGenerator>) -> Self {
        Self {
            phase: Phase::Idle,
            range: None,
            settle: Debounce::new(settle_delay),
            ghost: None,
            tip: None,
            focused: None,
            ids,
        }
    }

    pub fn set_id_generator(&mut self, ids: Box<dyn IdGenerator>) {
        self.ids = ids;
    }

    /// Keep future commits clear of ids already in the collection
    pub fn reserve_ids<'a>(&mut self, ids: impl IntoIterator<Item = &'a HighlightId>) {
        for id in ids {
            self.ids.reserve(id);
        }
    }

    /// Close the open tip, taking a pending ghost with it
    #[must_use]
    pub fn close_tip(&mut self) -> Vec<Effect> {
        self.discard()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn ghost(&self) -> Option<&GhostHighlight> {
        self.ghost.as_ref()
    }

    #[must_use]
    pub fn tip(&self) -> Option<&TipState<T>> {
        self.tip.as_ref()
    }

    #[must_use]
    pub fn focused(&self) -> Option<&HighlightId> {
        self.focused.as_ref()
    }

    #[must_use]
    pub fn active_range(&self) -> Option<&TextRange> {
        self.range.as_ref()
    }

    /// Deadline of the pending settle timer, if any
    #[must_use]
    pub fn settle_deadline(&self) -> Option<Instant> {
        self.settle.deadline()
    }

    /// A text selection or ghost is in flight
    #[must_use]
    pub fn highlight_in_progress(&self) -> bool {
        self.phase == Phase::TextRangeActive || self.ghost.is_some()
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command<T>, now: Instant) -> Vec<Effect> {
        match cmd {
            Command::SelectionChanged(range) => self.selection_changed(range, now),

            Command::AreaDragStarted => {
                let mut effects = self.discard();
                self.settle.cancel();
                self.range = None;
                self.phase = Phase::AreaSelecting;
                effects.insert(0, Effect::TextSelectionEnabled(false));
                effects
            }

            Command::AreaSelected(ghost) => {
                let mut effects = self.end_area_drag();
                effects.extend(self.open_ghost(ghost));
                effects
            }

            Command::AreaDragAbandoned => self.end_area_drag(),

            Command::OpenTip { id, render } => {
                if self.highlight_in_progress() || self.phase == Phase::AreaSelecting {
                    debug!("Ignoring tip for {id}: selection in progress");
                    return vec![];
                }
                self.tip = Some(TipState::Highlight { id, render });
                vec![Effect::Render]
            }

            Command::CloseTip | Command::Cancel => self.discard(),

            Command::KeyDown(Key::Escape) => self.discard(),
            Command::KeyDown(Key::Other(_)) => vec![],

            Command::PointerDown { inside_tip } => {
                if inside_tip {
                    vec![]
                } else {
                    self.discard()
                }
            }

            Command::Commit(comment) => self.commit(comment),

            Command::Focus(id) => {
                self.focused = Some(id);
                vec![Effect::Render]
            }

            Command::ClearFocus => {
                if self.focused.take().is_some() {
                    vec![Effect::Render]
                } else {
                    vec![]
                }
            }

            Command::Reopen => {
                if self.tip.is_some() {
                    vec![Effect::Render]
                } else {
                    vec![]
                }
            }
        }
    }

    /// Fire the settle timer if it is due.
    ///
    /// The range is re-checked here rather than trusted from scheduling time:
    /// a selection that collapsed in the meantime produces nothing.
    /// `resolve` turns the settled range into a ghost; it returns `None`
    /// when the range has no geometry on a mounted page.
    pub fn poll_settle(
        &mut self,
        now: Instant,
        resolve: impl FnOnce(&TextRange) -> Option<GhostHighlight>,
    ) -> Vec<Effect> {
        if !self.settle.fire(now) {
            return vec![];
        }
        if self.phase != Phase::TextRangeActive {
            debug!("Settle timer fired with no active selection");
            return vec![];
        }
        let Some(range) = self.range.take().filter(TextRange::is_selection) else {
            self.phase = Phase::Idle;
            return vec![];
        };
        self.phase = Phase::Idle;

        match resolve(&range) {
            Some(ghost) => self.open_ghost(ghost),
            None => {
                debug!("Settled selection has no page geometry, skipping");
                vec![]
            }
        }
    }

    /// Drop timers and transient state when the host view goes away
    pub fn shutdown(&mut self) {
        self.settle.cancel();
        self.range = None;
        self.phase = Phase::Idle;
        self.ghost = None;
        self.tip = None;
        self.focused = None;
    }

    fn selection_changed(&mut self, range: Option<TextRange>, now: Instant) -> Vec<Effect> {
        let Some(range) = range else {
            return vec![];
        };

        if range.collapsed {
            if self.phase == Phase::TextRangeActive {
                self.phase = Phase::Idle;
                self.range = None;
            }
            return vec![];
        }

        if !range.is_selection() {
            return vec![];
        }

        if self.phase == Phase::AreaSelecting {
            return vec![];
        }

        let effects = self.discard();
        self.phase = Phase::TextRangeActive;
        self.range = Some(range);
        self.settle.schedule(now);
        effects
    }

    fn open_ghost(&mut self, ghost: GhostHighlight) -> Vec<Effect> {
        let mut effects = self.discard();
        // The discard already asked for a render
        effects.retain(|e| *e != Effect::Render);
        info!(
            "Selection settled on page {}",
            ghost.position.page_number
        );
        self.ghost = Some(ghost);
        self.tip = Some(TipState::Selection);
        effects.push(Effect::Render);
        effects
    }

    fn end_area_drag(&mut self) -> Vec<Effect> {
        if self.phase == Phase::AreaSelecting {
            self.phase = Phase::Idle;
            vec![Effect::TextSelectionEnabled(true)]
        } else {
            vec![]
        }
    }

    fn commit(&mut self, comment: Comment) -> Vec<Effect> {
        let Some(ghost) = self.ghost.take() else {
            debug!("Commit requested with no pending ghost");
            return vec![];
        };
        self.tip = None;
        let highlight = ghost.commit(self.ids.next_id(), comment);
        info!(
            "Committed highlight {} on page {}",
            highlight.id,
            highlight.page_number()
        );
        vec![Effect::HideTip, Effect::Committed(highlight), Effect::Render]
    }

    /// Clear ghost and tip together
    fn discard(&mut self) -> Vec<Effect> {
        let had_ghost = self.ghost.take().is_some();
        let had_tip = self.tip.take().is_some();
        if had_ghost {
            debug!("Discarded pending ghost highlight");
        }
        if had_ghost || had_tip {
            vec![Effect::HideTip, Effect::Render]
        } else {
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, ScaledPosition, ScaledRect};
    use crate::highlight::Content;

    type Machine = SelectionMachine<()>;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn range(text: &str) -> TextRange {
        TextRange::new(1, vec![Rect::new(10.0, 10.0, 50.0, 12.0)], text)
    }

    fn ghost_for(range: &TextRange) -> Option<GhostHighlight> {
        Some(GhostHighlight::new(
            ScaledPosition {
                page_number: range.page_number?,
                bounding_rect: ScaledRect::new(10.0, 10.0, 50.0, 12.0),
                rects: vec![ScaledRect::new(10.0, 10.0, 50.0, 12.0)],
                use_pdf_coordinates: false,
            },
            Content::text(range.text.clone()),
        ))
    }

    fn area_ghost() -> GhostHighlight {
        GhostHighlight::new(
            ScaledPosition {
                page_number: 2,
                bounding_rect: ScaledRect::new(0.0, 0.0, 30.0, 30.0),
                rects: Vec::new(),
                use_pdf_coordinates: false,
            },
            Content::image("data:image/png;base64,"),
        )
    }

    fn assert_exclusive(m: &Machine) {
        let selection_tip = matches!(m.tip(), Some(TipState::Selection));
        assert_eq!(m.ghost().is_some(), selection_tip);
    }

    #[test]
    fn debounce_fires_once_after_last_change() {
        let t0 = Instant::now();
        let mut m = Machine::default();
        let mut attempts = 0;

        for (t, text) in [(0, "a"), (100, "ab"), (200, "abc"), (600, "abcd")] {
            let _ = m.apply(Command::SelectionChanged(Some(range(text))), t0 + ms(t));
            assert_eq!(m.phase(), Phase::TextRangeActive);
            let _ = m.poll_settle(t0 + ms(t), |_| {
                attempts += 1;
                None
            });
        }

        let _ = m.poll_settle(t0 + ms(1099), |_| {
            attempts += 1;
            None
        });
        assert_eq!(attempts, 0);

        let mut settled_text = None;
        let effects = m.poll_settle(t0 + ms(1100), |r| {
            attempts += 1;
            settled_text = Some(r.text.clone());
            ghost_for(r)
        });
        assert_eq!(attempts, 1);
        assert_eq!(settled_text.as_deref(), Some("abcd"));
        assert_eq!(effects, vec![Effect::Render]);
        assert!(m.ghost().is_some());
        assert_exclusive(&m);

        let _ = m.poll_settle(t0 + ms(5000), |_| {
            attempts += 1;
            None
        });
        assert_eq!(attempts, 1);
    }

    #[test]
    fn collapse_before_deadline_produces_nothing() {
        let t0 = Instant::now();
        let mut m = Machine::default();
        let _ = m.apply(Command::SelectionChanged(Some(range("a"))), t0);
        let _ = m.apply(Command::SelectionChanged(Some(TextRange::collapsed())), t0 + ms(300));
        assert_eq!(m.phase(), Phase::Idle);

        let mut called = false;
        let effects = m.poll_settle(t0 + ms(800), |_| {
            called = true;
            None
        });
        assert!(!called);
        assert!(effects.is_empty());
        assert!(m.ghost().is_none());
    }

    #[test]
    fn empty_or_missing_range_is_ignored() {
        let t0 = Instant::now();
        let mut m = Machine::default();
        assert!(m.apply(Command::SelectionChanged(None), t0).is_empty());
        let empty = TextRange::new(1, Vec::new(), "");
        assert!(m.apply(Command::SelectionChanged(Some(empty)), t0).is_empty());
        assert_eq!(m.phase(), Phase::Idle);
        assert!(m.settle_deadline().is_none());
    }

    #[test]
    fn commit_turns_ghost_into_highlight() {
        let t0 = Instant::now();
        let mut m = Machine::default();
        let _ = m.apply(Command::SelectionChanged(Some(range("text"))), t0);
        let _ = m.poll_settle(t0 + ms(500), ghost_for);
        assert!(m.ghost().is_some());

        let effects = m.apply(Command::Commit(Comment::new("note", "x")), t0 + ms(900));
        let committed = effects
            .iter()
            .find_map(|e| match e {
                Effect::Committed(h) => Some(h.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(committed.id.as_str(), "hl-1");
        assert_eq!(committed.comment, Comment::new("note", "x"));
        assert_eq!(committed.content.text.as_deref(), Some("text"));
        assert!(effects.contains(&Effect::HideTip));
        assert!(m.ghost().is_none());
        assert!(m.tip().is_none());
    }

    #[test]
    fn commit_without_ghost_is_ignored() {
        let mut m = Machine::default();
        let effects = m.apply(Command::Commit(Comment::new("x", "y")), Instant::now());
        assert!(effects.is_empty());
    }

    #[test]
    fn escape_and_outside_click_cancel() {
        let t0 = Instant::now();
        let mut m = Machine::default();

        let _ = m.apply(Command::AreaDragStarted, t0);
        let _ = m.apply(Command::AreaSelected(area_ghost()), t0);
        assert_exclusive(&m);

        assert!(m.apply(Command::PointerDown { inside_tip: true }, t0).is_empty());
        assert!(m.ghost().is_some());

        let effects = m.apply(Command::KeyDown(Key::Escape), t0);
        assert_eq!(effects, vec![Effect::HideTip, Effect::Render]);
        assert!(m.ghost().is_none() && m.tip().is_none());

        let _ = m.apply(Command::AreaDragStarted, t0);
        let _ = m.apply(Command::AreaSelected(area_ghost()), t0);
        let _ = m.apply(Command::PointerDown { inside_tip: false }, t0);
        assert!(m.ghost().is_none() && m.tip().is_none());
    }

    #[test]
    fn new_selection_discards_pending_ghost() {
        let t0 = Instant::now();
        let mut m = Machine::default();
        let _ = m.apply(Command::AreaDragStarted, t0);
        let _ = m.apply(Command::AreaSelected(area_ghost()), t0);

        let effects = m.apply(Command::SelectionChanged(Some(range("b"))), t0 + ms(10));
        assert!(effects.contains(&Effect::HideTip));
        assert!(m.ghost().is_none());
        assert_eq!(m.phase(), Phase::TextRangeActive);
        assert_exclusive(&m);
    }

    #[test]
    fn area_drag_suppresses_text_selection() {
        let t0 = Instant::now();
        let mut m = Machine::default();
        let _ = m.apply(Command::SelectionChanged(Some(range("a"))), t0);

        let effects = m.apply(Command::AreaDragStarted, t0 + ms(50));
        assert_eq!(effects, vec![Effect::TextSelectionEnabled(false)]);
        assert_eq!(m.phase(), Phase::AreaSelecting);
        assert!(m.settle_deadline().is_none());

        // Selection events during the drag are suppressed
        assert!(m.apply(Command::SelectionChanged(Some(range("b"))), t0 + ms(60)).is_empty());

        let effects = m.apply(Command::AreaSelected(area_ghost()), t0 + ms(200));
        assert_eq!(
            effects,
            vec![Effect::TextSelectionEnabled(true), Effect::Render]
        );
        assert_eq!(m.phase(), Phase::Idle);
        assert!(m.ghost().unwrap().position.rects.is_empty());

        let _ = m.apply(Command::Cancel, t0);
        let _ = m.apply(Command::AreaDragStarted, t0);
        let effects = m.apply(Command::AreaDragAbandoned, t0);
        assert_eq!(effects, vec![Effect::TextSelectionEnabled(true)]);
        assert!(m.ghost().is_none());
    }

    #[test]
    fn tip_on_highlight_is_exclusive_and_guarded() {
        let t0 = Instant::now();
        let mut m = Machine::default();

        let effects = m.apply(
            Command::OpenTip {
                id: HighlightId::new("a"),
                render: (),
            },
            t0,
        );
        assert_eq!(effects, vec![Effect::Render]);

        let _ = m.apply(
            Command::OpenTip {
                id: HighlightId::new("b"),
                render: (),
            },
            t0,
        );
        assert_eq!(
            m.tip().and_then(TipState::highlight_id),
            Some(&HighlightId::new("b"))
        );

        // Not while a ghost is pending
        let _ = m.apply(Command::AreaDragStarted, t0);
        let _ = m.apply(Command::AreaSelected(area_ghost()), t0);
        let effects = m.apply(
            Command::OpenTip {
                id: HighlightId::new("c"),
                render: (),
            },
            t0,
        );
        assert!(effects.is_empty());
        assert!(matches!(m.tip(), Some(TipState::Selection)));
        assert_exclusive(&m);
    }

    #[test]
    fn focus_set_and_cleared() {
        let t0 = Instant::now();
        let mut m = Machine::default();
        let effects = m.apply(Command::Focus(HighlightId::new("a")), t0);
        assert_eq!(effects, vec![Effect::Render]);
        assert_eq!(m.focused(), Some(&HighlightId::new("a")));

        assert_eq!(m.apply(Command::ClearFocus, t0), vec![Effect::Render]);
        assert!(m.apply(Command::ClearFocus, t0).is_empty());
    }

    #[test]
    fn shutdown_discards_pending_timer() {
        let t0 = Instant::now();
        let mut m = Machine::default();
        let _ = m.apply(Command::SelectionChanged(Some(range("a"))), t0);
        m.shutdown();
        let mut called = false;
        let _ = m.poll_settle(t0 + ms(1000), |_| {
            called = true;
            None
        });
        assert!(!called);
    }
}
