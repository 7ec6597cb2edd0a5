//! Tip controller handed to host callbacks
//!
//! Callbacks run while the highlighter is in the middle of a render pass,
//! so the controller cannot mutate selection state directly. It queues
//! requests instead; the highlighter drains the queue once the render pass
//! returns, and again at the start of every event handler.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::highlight::{Comment, HighlightId, ViewportHighlight};

/// Builds a tip's content for the highlight it is anchored to. Called again
/// on every render so the tip follows zoom and rotation.
pub type TipRenderer<R> = Box<dyn Fn(&ViewportHighlight) -> R>;

pub enum TipCommand<R> {
    Open {
        id: HighlightId,
        render: TipRenderer<R>,
    },
    Close,
    Commit(Comment),
    Cancel,
    Reopen,
}

impl<R> fmt::Debug for TipCommand<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { id, .. } => f.debug_struct("Open").field("id", id).finish_non_exhaustive(),
            Self::Close => f.write_str("Close"),
            Self::Commit(comment) => f.debug_tuple("Commit").field(comment).finish(),
            Self::Cancel => f.write_str("Cancel"),
            Self::Reopen => f.write_str("Reopen"),
        }
    }
}

/// Cheap, clonable handle onto the single tip slot
pub struct TipController<R> {
    queue: Rc<RefCell<VecDeque<TipCommand<R>>>>,
}

impl<R> Clone for TipController<R> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
        }
    }
}

impl<R> Default for TipController<R> {
    fn default() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }
}

impl<R> fmt::Debug for TipController<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TipController")
            .field("pending", &self.queue.borrow().len())
            .finish()
    }
}

impl<R> TipController<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a tip on a committed highlight, replacing any open tip.
    /// Ignored while a selection or area drag is in progress.
    pub fn open(&self, id: HighlightId, render: impl Fn(&ViewportHighlight) -> R + 'static) {
        self.push(TipCommand::Open {
            id,
            render: Box::new(render),
        });
    }

    /// Hide the open tip; a pending ghost highlight goes with it
    pub fn close(&self) {
        self.push(TipCommand::Close);
    }

    /// Turn the pending ghost into a highlight carrying `comment`
    pub fn commit(&self, comment: Comment) {
        self.push(TipCommand::Commit(comment));
    }

    /// Drop the pending ghost and tip without creating anything
    pub fn cancel(&self) {
        self.push(TipCommand::Cancel);
    }

    /// Ask for the pending tip to be rendered again
    pub fn reopen(&self) {
        self.push(TipCommand::Reopen);
    }

    /// Take every queued request, oldest first
    pub fn drain(&self) -> Vec<TipCommand<R>> {
        self.queue.borrow_mut().drain(..).collect()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().is_empty()
    }

    fn push(&self, command: TipCommand<R>) {
        self.queue.borrow_mut().push_back(command);
    }
}
