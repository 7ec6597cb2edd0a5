//! Highlight records and the live collection snapshot

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geometry::{PageNumber, ScaledPosition, ScaledRect, ViewportPosition};

/// Stable, opaque highlight identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighlightId(String);

impl HighlightId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HighlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub emoji: String,
}

impl Comment {
    #[must_use]
    pub fn new(text: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emoji: emoji.into(),
        }
    }
}

/// What was highlighted: selected text, or a captured image for areas
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// PNG data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Content {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    #[must_use]
    pub fn image(data_url: impl Into<String>) -> Self {
        Self {
            text: None,
            image: Some(data_url.into()),
        }
    }
}

/// A committed, persisted highlight
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub id: HighlightId,
    pub position: ScaledPosition,
    #[serde(default)]
    pub content: Content,
    #[serde(default)]
    pub comment: Comment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
}

impl Highlight {
    #[must_use]
    pub fn page_number(&self) -> PageNumber {
        self.position.page_number
    }

    /// Merge an edit into this highlight. The id never changes.
    pub fn apply_patch(&mut self, patch: &HighlightPatch) {
        if let Some(rect) = patch.bounding_rect {
            self.position.bounding_rect = rect;
        }
        if let Some(rects) = &patch.rects {
            self.position.rects = rects.clone();
        }
        if let Some(text) = &patch.text {
            self.content.text = Some(text.clone());
        }
        if let Some(image) = &patch.image {
            self.content.image = Some(image.clone());
        }
        if let Some(comment) = &patch.comment {
            self.comment = comment.clone();
        }
    }
}

/// Partial update for an existing highlight, e.g. an area highlight that
/// was dragged or resized and re-captured.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightPatch {
    pub bounding_rect: Option<ScaledRect>,
    pub rects: Option<Vec<ScaledRect>>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub comment: Option<Comment>,
}

/// A highlight in progress: it has a position and content but no id and no
/// comment yet, and it is never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct GhostHighlight {
    pub position: ScaledPosition,
    pub content: Content,
}

impl GhostHighlight {
    #[must_use]
    pub fn new(position: ScaledPosition, content: Content) -> Self {
        Self { position, content }
    }

    /// Promote to a committed highlight
    #[must_use]
    pub fn commit(self, id: HighlightId, comment: Comment) -> Highlight {
        Highlight {
            id,
            position: self.position,
            content: self.content,
            comment,
            author_id: None,
        }
    }
}

/// Either kind of highlight, as grouped for a page render
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PageHighlight<'a> {
    Committed(&'a Highlight),
    Ghost(&'a GhostHighlight),
}

impl<'a> PageHighlight<'a> {
    #[must_use]
    pub fn position(&self) -> &'a ScaledPosition {
        match self {
            Self::Committed(h) => &h.position,
            Self::Ghost(g) => &g.position,
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<&'a HighlightId> {
        match self {
            Self::Committed(h) => Some(&h.id),
            Self::Ghost(_) => None,
        }
    }

    #[must_use]
    pub fn is_ghost(&self) -> bool {
        matches!(self, Self::Ghost(_))
    }

    /// Project into viewport space with the given position
    #[must_use]
    pub fn with_viewport_position(&self, position: ViewportPosition) -> ViewportHighlight {
        match self {
            Self::Committed(h) => ViewportHighlight {
                id: Some(h.id.clone()),
                position,
                content: h.content.clone(),
                comment: Some(h.comment.clone()),
                author_id: h.author_id.clone(),
            },
            Self::Ghost(g) => ViewportHighlight {
                id: None,
                position,
                content: g.content.clone(),
                comment: None,
                author_id: None,
            },
        }
    }
}

/// A highlight positioned in the current viewport, handed to the host
#[derive(Clone, Debug, PartialEq)]
pub struct ViewportHighlight {
    /// `None` for the ghost highlight
    pub id: Option<HighlightId>,
    pub position: ViewportPosition,
    pub content: Content,
    pub comment: Option<Comment>,
    pub author_id: Option<String>,
}

/// Immutable snapshot of the highlight collection.
///
/// Replacing the collection produces a new snapshot; render change
/// detection compares snapshots by identity, not by contents.
#[derive(Clone, Debug, Default)]
pub struct HighlightSet {
    items: Arc<[Highlight]>,
}

impl HighlightSet {
    #[must_use]
    pub fn new(items: Vec<Highlight>) -> Self {
        Self {
            items: items.into(),
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Highlight] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when both snapshots are the same reference
    #[must_use]
    pub fn same_as(&self, other: &HighlightSet) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }

    #[must_use]
    pub fn find(&self, id: &HighlightId) -> Option<&Highlight> {
        self.items.iter().find(|h| &h.id == id)
    }

    /// New snapshot with `highlight` in front (newest first)
    #[must_use]
    pub fn with_prepended(&self, highlight: Highlight) -> Self {
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.push(highlight);
        items.extend(self.items.iter().cloned());
        Self::new(items)
    }

    /// New snapshot with the matching highlight patched, `None` if absent
    #[must_use]
    pub fn with_patched(&self, id: &HighlightId, patch: &HighlightPatch) -> Option<Self> {
        let index = self.items.iter().position(|h| &h.id == id)?;
        let mut items = self.items.to_vec();
        items[index].apply_patch(patch);
        Some(Self::new(items))
    }

    /// New snapshot without the matching highlight, `None` if absent
    #[must_use]
    pub fn without(&self, id: &HighlightId) -> Option<Self> {
        let index = self.items.iter().position(|h| &h.id == id)?;
        let mut items = self.items.to_vec();
        items.remove(index);
        Some(Self::new(items))
    }
}

impl From<Vec<Highlight>> for HighlightSet {
    fn from(items: Vec<Highlight>) -> Self {
        Self::new(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlight(id: &str, page: PageNumber) -> Highlight {
        Highlight {
            id: HighlightId::new(id),
            position: ScaledPosition {
                page_number: page,
                bounding_rect: ScaledRect::new(1.0, 1.0, 10.0, 10.0),
                rects: vec![ScaledRect::new(1.0, 1.0, 10.0, 10.0)],
                use_pdf_coordinates: false,
            },
            content: Content::text("hello"),
            comment: Comment::new("note", "x"),
            author_id: None,
        }
    }

    #[test]
    fn prepend_puts_newest_first_and_changes_identity() {
        let set = HighlightSet::new(vec![highlight("a", 1)]);
        let next = set.with_prepended(highlight("b", 2));
        assert!(!next.same_as(&set));
        assert!(set.same_as(&set.clone()));
        let ids: Vec<_> = next.as_slice().iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn patch_moves_area_but_keeps_id() {
        let set = HighlightSet::new(vec![highlight("a", 1)]);
        let patch = HighlightPatch {
            bounding_rect: Some(ScaledRect::new(5.0, 5.0, 20.0, 20.0)),
            image: Some("data:image/png;base64,AAAA".into()),
            ..HighlightPatch::default()
        };
        let next = set.with_patched(&HighlightId::new("a"), &patch).unwrap();
        let h = next.find(&HighlightId::new("a")).unwrap();
        assert_eq!(h.position.bounding_rect.x2, 25.0);
        assert_eq!(h.content.text.as_deref(), Some("hello"));
        assert!(h.content.image.is_some());

        assert!(set.with_patched(&HighlightId::new("zzz"), &patch).is_none());
    }

    #[test]
    fn removal_of_unknown_id_is_none() {
        let set = HighlightSet::new(vec![highlight("a", 1)]);
        assert!(set.without(&HighlightId::new("b")).is_none());
        assert!(set.without(&HighlightId::new("a")).unwrap().is_empty());
    }

    #[test]
    fn ghost_commit_carries_position_and_content() {
        let h = highlight("x", 3);
        let ghost = GhostHighlight::new(h.position.clone(), h.content.clone());
        let committed = ghost.commit(HighlightId::new("hl-9"), Comment::new("note", "x"));
        assert_eq!(committed.id.as_str(), "hl-9");
        assert_eq!(committed.position, h.position);
        assert_eq!(committed.comment.text, "note");
    }

    #[test]
    fn serialized_form_uses_camel_case() {
        let json = serde_json::to_value(highlight("a", 1)).unwrap();
        assert_eq!(json["position"]["pageNumber"], 1);
        assert_eq!(json["position"]["usePdfCoordinates"], false);
        assert!(json.get("authorId").is_none());
    }
}
