//! Highlight positions: a bounding box plus its constituent rectangles

use serde::{Deserialize, Serialize};

use super::rect::{Rect, ScaledRect, bounding_rect};
use super::rotation::Viewport;
use super::transform::{to_scaled, to_viewport};

/// 1-based page number as reported by the document renderer
pub type PageNumber = u32;

/// Storage form of a highlight's location
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledPosition {
    pub page_number: PageNumber,
    pub bounding_rect: ScaledRect,
    /// One entry per selected text line; empty for area highlights
    #[serde(default)]
    pub rects: Vec<ScaledRect>,
    #[serde(default)]
    pub use_pdf_coordinates: bool,
}

/// On-screen form of a highlight's location, page-local pixels
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportPosition {
    pub page_number: PageNumber,
    pub bounding_rect: Rect,
    #[serde(default)]
    pub rects: Vec<Rect>,
    #[serde(default)]
    pub use_pdf_coordinates: bool,
}

impl ViewportPosition {
    /// Position covering `rects`, `None` when there is nothing to cover
    #[must_use]
    pub fn from_rects(page_number: PageNumber, rects: Vec<Rect>) -> Option<Self> {
        let bounding_rect = bounding_rect(&rects)?;
        Some(Self {
            page_number,
            bounding_rect,
            rects,
            use_pdf_coordinates: false,
        })
    }

    /// Position made of a bounding box only (area selections)
    #[must_use]
    pub fn area(page_number: PageNumber, bounding_rect: Rect) -> Self {
        Self {
            page_number,
            bounding_rect,
            rects: Vec::new(),
            use_pdf_coordinates: false,
        }
    }
}

impl ScaledPosition {
    /// Project into the page's current viewport
    #[must_use]
    pub fn to_viewport(&self, viewport: &Viewport) -> ViewportPosition {
        let pdf = self.use_pdf_coordinates;
        ViewportPosition {
            page_number: self.page_number,
            bounding_rect: to_viewport(&self.bounding_rect, viewport, pdf),
            rects: self
                .rects
                .iter()
                .map(|r| to_viewport(r, viewport, pdf))
                .collect(),
            use_pdf_coordinates: pdf,
        }
    }
}

impl ViewportPosition {
    /// Remove the viewport's scale and rotation.
    ///
    /// The result is always in scaled space, even if this position was
    /// produced from PDF coordinates.
    #[must_use]
    pub fn to_scaled(&self, viewport: &Viewport) -> ScaledPosition {
        ScaledPosition {
            page_number: self.page_number,
            bounding_rect: to_scaled(&self.bounding_rect, viewport),
            rects: self.rects.iter().map(|r| to_scaled(r, viewport)).collect(),
            use_pdf_coordinates: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rotation;

    #[test]
    fn position_round_trips_through_viewport() {
        let vp = Viewport::new(1200.0, 900.0, 1.5, Rotation::CounterClockwise);
        let lines = vec![
            Rect::new(100.0, 200.0, 15.0, 300.0),
            Rect::new(120.0, 260.0, 15.0, 120.0),
        ];
        let vpos = ViewportPosition::from_rects(4, lines).unwrap();
        let scaled = vpos.to_scaled(&vp);
        assert_eq!(scaled.page_number, 4);
        assert_eq!(scaled.rects.len(), 2);

        let again = scaled.to_viewport(&vp);
        assert!((again.bounding_rect.left - vpos.bounding_rect.left).abs() < 1e-9);
        assert!((again.bounding_rect.height - vpos.bounding_rect.height).abs() < 1e-9);
        assert!((again.rects[1].top - vpos.rects[1].top).abs() < 1e-9);
    }

    #[test]
    fn empty_rect_list_has_no_position() {
        assert!(ViewportPosition::from_rects(1, Vec::new()).is_none());
    }

    #[test]
    fn missing_optional_fields_deserialize() {
        let json = r#"{
            "pageNumber": 2,
            "boundingRect": {"x1": 1, "y1": 2, "x2": 3, "y2": 4, "width": 2, "height": 2}
        }"#;
        let pos: ScaledPosition = serde_json::from_str(json).unwrap();
        assert!(pos.rects.is_empty());
        assert!(!pos.use_pdf_coordinates);
    }
}
