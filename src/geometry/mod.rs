//! Coordinate transforms between scaled (stored) and viewport (on-screen) space

mod position;
mod rect;
mod rotation;
mod transform;

pub use position::{PageNumber, ScaledPosition, ViewportPosition};
pub use rect::{Point, Rect, ScaledRect, bounding_rect, page_local_rects};
pub use rotation::{Rotation, Viewport};
pub use transform::{PageTransform, to_scaled, to_viewport};
