//! Rectangle types for the two coordinate spaces
//!
//! `Rect` lives in viewport space (current on-screen pixels, page-local).
//! `ScaledRect` lives in scaled space, where the current zoom factor and
//! rotation have been removed so the value survives view changes.

use serde::{Deserialize, Serialize};

/// A point in pixel space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Left/top/width/height rectangle in viewport (pixel) space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a rectangle, clamping negative extents to zero
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Rectangle spanned by two arbitrary corners
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self::new(left, top, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Same rectangle moved by `-offset`
    #[must_use]
    pub fn relative_to(&self, offset: Point) -> Self {
        Self {
            left: self.left - offset.x,
            top: self.top - offset.y,
            ..*self
        }
    }

    /// Whether the two rectangles share any area
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.top < other.bottom()
            && other.top < self.bottom()
    }

    /// Smallest rectangle containing both
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }
}

/// Document-space rectangle normalised by the current scale and rotation.
///
/// `x2 == x1 + width` and `y2 == y1 + height` always hold for values built
/// through [`ScaledRect::new`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaledRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f64,
    pub height: f64,
}

impl ScaledRect {
    /// Build from the top-left corner and the extents
    #[must_use]
    pub fn new(x1: f64, y1: f64, width: f64, height: f64) -> Self {
        let width = width.max(0.0);
        let height = height.max(0.0);
        Self {
            x1,
            y1,
            x2: x1 + width,
            y2: y1 + height,
            width,
            height,
        }
    }

    /// Build from two opposite corners in any order
    #[must_use]
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs())
    }

    /// Approximate equality used by the round-trip checks
    #[must_use]
    pub fn approx_eq(&self, other: &ScaledRect, epsilon: f64) -> bool {
        [
            (self.x1, other.x1),
            (self.y1, other.y1),
            (self.x2, other.x2),
            (self.y2, other.y2),
            (self.width, other.width),
            (self.height, other.height),
        ]
        .iter()
        .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

/// Union of a set of rectangles, `None` when the set is empty
#[must_use]
pub fn bounding_rect(rects: &[Rect]) -> Option<Rect> {
    let (first, rest) = rects.split_first()?;
    Some(rest.iter().fold(*first, |acc, r| acc.union(r)))
}

/// Translate absolute client rectangles into page-local coordinates.
///
/// Rectangles that do not overlap the page (`page_width` x `page_height`
/// starting at the origin once translated) and empty rectangles are dropped.
#[must_use]
pub fn page_local_rects(
    client_rects: &[Rect],
    page_offset: Point,
    page_width: f64,
    page_height: f64,
) -> Vec<Rect> {
    let page = Rect::new(0.0, 0.0, page_width, page_height);
    client_rects
        .iter()
        .map(|r| r.relative_to(page_offset))
        .filter(|r| !r.is_empty() && r.intersects(&page))
        .collect()
}
