//! Unique id generation for committed highlights

use log::warn;
use uuid::Uuid;

use crate::highlight::HighlightId;

/// Source of fresh highlight ids. Every call must return an id that was
/// never returned before by the same generator, and never one passed to
/// [`IdGenerator::reserve`].
pub trait IdGenerator {
    fn next_id(&mut self) -> HighlightId;

    /// Mark an id as taken by a highlight that came from elsewhere
    fn reserve(&mut self, _id: &HighlightId) {}
}

/// Monotonic counter ids such as `hl-1`, `hl-2`, ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    /// Continue numbering after ids already in use, so reloaded collections
    /// never collide with new ones.
    #[must_use]
    pub fn resuming_after<'a>(
        prefix: impl Into<String>,
        existing: impl IntoIterator<Item = &'a HighlightId>,
    ) -> Self {
        let mut ids = Self::new(prefix);
        for id in existing {
            ids.reserve(id);
        }
        ids
    }

    fn number_of(&self, id: &HighlightId) -> Option<u64> {
        id.as_str()
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('-')?
            .parse()
            .ok()
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("hl")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> HighlightId {
        match self.next.checked_add(1) {
            Some(after) => {
                let id = HighlightId::new(format!("{}-{}", self.prefix, self.next));
                self.next = after;
                id
            }
            None => {
                warn!("Id counter for {:?} exhausted, using a random id", self.prefix);
                HighlightId::new(format!("{}-{}", self.prefix, Uuid::new_v4()))
            }
        }
    }

    fn reserve(&mut self, id: &HighlightId) {
        let Some(n) = self.number_of(id) else {
            return;
        };
        if n < self.next {
            return;
        }
        match n.checked_add(1) {
            Some(after) => self.next = after,
            None => warn!("Ignoring id {id}: counter cannot move past it"),
        }
    }
}

/// Random v4 UUID ids, for collections shared between several writers
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> HighlightId {
        HighlightId::new(Uuid::new_v4().to_string())
    }
}
