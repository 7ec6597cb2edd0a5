//! Conversion between scaled space and viewport space
//!
//! Two paths exist. The default one divides out the zoom factor and then
//! undoes the page rotation with one of four corner remappings. The PDF
//! coordinate path treats the stored rectangle as raw document points and
//! pushes both corners through the renderer's affine page transform, which
//! already encodes rotation and the y-axis flip.

use serde::{Deserialize, Serialize};

use super::rect::{Point, Rect, ScaledRect};
use super::rotation::{Rotation, Viewport};

/// Affine map `x' = a·x + c·y + e`, `y' = b·x + d·y + f`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl PageTransform {
    #[must_use]
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Standard document-to-pixel transform for a viewport.
    ///
    /// Document points have their origin at the bottom-left of the unrotated
    /// page with y growing upwards.
    #[must_use]
    pub fn from_viewport(viewport: &Viewport) -> Self {
        let s = viewport.scale;
        let (w, h) = (viewport.width_px, viewport.height_px);
        match viewport.rotation {
            Rotation::None => Self::new(s, 0.0, 0.0, -s, 0.0, h),
            Rotation::Clockwise => Self::new(0.0, s, s, 0.0, 0.0, 0.0),
            Rotation::CounterClockwise => Self::new(0.0, -s, -s, 0.0, w, h),
            Rotation::HalfTurn => Self::new(-s, 0.0, 0.0, s, w, 0.0),
        }
    }

    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Inverse map, `None` when the transform is degenerate
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        Some(Self::new(
            self.d / det,
            -self.b / det,
            -self.c / det,
            self.a / det,
            (self.c * self.f - self.d * self.e) / det,
            (self.b * self.e - self.a * self.f) / det,
        ))
    }
}

/// Scaled space to viewport space
#[must_use]
pub fn to_viewport(scaled: &ScaledRect, viewport: &Viewport, use_pdf_coordinates: bool) -> Rect {
    if use_pdf_coordinates {
        return pdf_to_viewport(scaled, &viewport.page_transform());
    }

    let s = viewport.scale;
    let (vw, vh) = (viewport.width_px, viewport.height_px);
    let w = (scaled.x2 - scaled.x1) * s;
    let h = (scaled.y2 - scaled.y1) * s;

    match viewport.rotation {
        Rotation::None => Rect::new(scaled.x1 * s, scaled.y1 * s, w, h),
        Rotation::Clockwise => Rect::new(vw - scaled.y2 * s, scaled.x1 * s, h, w),
        Rotation::CounterClockwise => Rect::new(scaled.y1 * s, vh - scaled.x2 * s, h, w),
        Rotation::HalfTurn => Rect::new(vw - scaled.x2 * s, vh - scaled.y2 * s, w, h),
    }
}

/// Viewport space to scaled space; inverse of [`to_viewport`] on the default path
#[must_use]
pub fn to_scaled(rect: &Rect, viewport: &Viewport) -> ScaledRect {
    let s = viewport.scale;
    let (vw, vh) = (viewport.width_px, viewport.height_px);
    let w = rect.width / s;
    let h = rect.height / s;

    match viewport.rotation {
        Rotation::None => ScaledRect::new(rect.left / s, rect.top / s, w, h),
        Rotation::Clockwise => {
            let y2 = (vw - rect.left) / s;
            ScaledRect::new(rect.top / s, y2 - w, h, w)
        }
        Rotation::CounterClockwise => {
            let x2 = (vh - rect.top) / s;
            ScaledRect::new(x2 - h, rect.left / s, h, w)
        }
        Rotation::HalfTurn => {
            let x2 = (vw - rect.left) / s;
            let y2 = (vh - rect.top) / s;
            ScaledRect::new(x2 - w, y2 - h, w, h)
        }
    }
}

fn pdf_to_viewport(pdf: &ScaledRect, transform: &PageTransform) -> Rect {
    let p1 = transform.apply(Point::new(pdf.x1, pdf.y1));
    let p2 = transform.apply(Point::new(pdf.x2, pdf.y2));
    Rect::from_corners(p1, p2)
}
