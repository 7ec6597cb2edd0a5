//! Page rotation and the per-page viewport description

use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One of the four supported page orientations.
///
/// `Clockwise` is +90°, `CounterClockwise` is -90°. A half turn covers both
/// +180° and -180°, which are the same orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    None,
    Clockwise,
    CounterClockwise,
    HalfTurn,
}

impl Rotation {
    /// Parse a rotation in degrees.
    ///
    /// The angle is reduced into (-180, 180] first, so 270 maps to -90 and
    /// -180 maps to a half turn. Returns `None` for anything that is not a
    /// right angle.
    #[must_use]
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        let mut normalized = degrees.rem_euclid(360);
        if normalized > 180 {
            normalized -= 360;
        }
        match normalized {
            0 => Some(Self::None),
            90 => Some(Self::Clockwise),
            -90 => Some(Self::CounterClockwise),
            180 => Some(Self::HalfTurn),
            _ => None,
        }
    }

    /// Like [`Rotation::from_degrees`], falling back to no rotation
    #[must_use]
    pub fn from_degrees_lossy(degrees: i32) -> Self {
        Self::from_degrees(degrees).unwrap_or_else(|| {
            warn!("Unsupported rotation {degrees}°, using identity transform");
            Self::None
        })
    }

    #[must_use]
    pub const fn degrees(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Clockwise => 90,
            Self::CounterClockwise => -90,
            Self::HalfTurn => 180,
        }
    }

    /// True for the quarter turns, where width and height trade places
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Clockwise | Self::CounterClockwise)
    }

    /// Rotate one more quarter turn clockwise
    #[must_use]
    pub const fn rotate_right(self) -> Self {
        match self {
            Self::None => Self::Clockwise,
            Self::Clockwise => Self::HalfTurn,
            Self::HalfTurn => Self::CounterClockwise,
            Self::CounterClockwise => Self::None,
        }
    }

    /// Rotate one more quarter turn counter-clockwise
    #[must_use]
    pub const fn rotate_left(self) -> Self {
        match self {
            Self::None => Self::CounterClockwise,
            Self::CounterClockwise => Self::HalfTurn,
            Self::HalfTurn => Self::Clockwise,
            Self::Clockwise => Self::None,
        }
    }
}

impl Serialize for Rotation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i32(self.degrees())
    }
}

impl<'de> Deserialize<'de> for Rotation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let degrees = i32::deserialize(deserializer)?;
        Ok(Self::from_degrees_lossy(degrees))
    }
}

/// Current pixel geometry of one mounted page.
///
/// `width_px` and `height_px` are the on-screen extents after scale and
/// rotation have been applied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width_px: f64,
    pub height_px: f64,
    pub scale: f64,
    pub rotation: Rotation,
    /// Page-to-pixel transform reported by the renderer, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<super::PageTransform>,
}

impl Viewport {
    #[must_use]
    pub fn new(width_px: f64, height_px: f64, scale: f64, rotation: Rotation) -> Self {
        Self {
            width_px,
            height_px,
            scale,
            rotation,
            transform: None,
        }
    }

    /// Attach the renderer's own page transform
    #[must_use]
    pub fn with_transform(mut self, transform: super::PageTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Transform used for PDF-coordinate positions
    #[must_use]
    pub fn page_transform(&self) -> super::PageTransform {
        self.transform
            .unwrap_or_else(|| super::PageTransform::from_viewport(self))
    }

    /// Unrotated, unscaled page size in document units
    #[must_use]
    pub fn page_size(&self) -> (f64, f64) {
        let (w, h) = if self.rotation.swaps_axes() {
            (self.height_px, self.width_px)
        } else {
            (self.width_px, self.height_px)
        };
        (w / self.scale, h / self.scale)
    }
}
