//! Raster capture of a page region for area highlights

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{ImageFormat, RgbaImage, imageops};
use log::{debug, error};

use crate::error::{HighlightError, Result};
use crate::geometry::Rect;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Capture `rect` (page-local pixels) from `canvas` as a PNG data URL.
///
/// Never fails: a missing canvas or a region outside it yields a blank
/// image of the requested size, and an encoder failure yields an empty
/// data URL.
#[must_use]
pub fn capture_area(canvas: Option<&RgbaImage>, rect: &Rect) -> String {
    let region = match canvas {
        Some(canvas) => crop(canvas, rect),
        None => {
            debug!("Page canvas not ready, capturing blank image");
            None
        }
    };
    let region = region.unwrap_or_else(|| blank(rect));

    match encode_png(&region) {
        Ok(url) => url,
        Err(e) => {
            error!("Failed to encode area screenshot: {e}");
            DATA_URL_PREFIX.to_string()
        }
    }
}

/// Encode an image as a PNG data URL
pub fn encode_png(image: &RgbaImage) -> Result<String> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(HighlightError::ImageEncode)?;
    Ok(format!("{DATA_URL_PREFIX}{}", BASE64.encode(bytes.into_inner())))
}

/// Decode a PNG data URL produced by [`encode_png`]
pub fn decode_png(data_url: &str) -> Option<RgbaImage> {
    let payload = data_url.strip_prefix(DATA_URL_PREFIX)?;
    let bytes = BASE64.decode(payload).ok()?;
    image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .ok()
        .map(|img| img.to_rgba8())
}

fn crop(canvas: &RgbaImage, rect: &Rect) -> Option<RgbaImage> {
    let left = rect.left.max(0.0).floor();
    let top = rect.top.max(0.0).floor();
    let right = rect.right().min(f64::from(canvas.width())).ceil();
    let bottom = rect.bottom().min(f64::from(canvas.height())).ceil();
    if right <= left || bottom <= top {
        debug!("Capture region lies outside the page canvas");
        return None;
    }

    let (x, y) = (left as u32, top as u32);
    let (w, h) = ((right - left) as u32, (bottom - top) as u32);
    Some(imageops::crop_imm(canvas, x, y, w, h).to_image())
}

fn blank(rect: &Rect) -> RgbaImage {
    let w = rect.width.ceil().max(1.0) as u32;
    let h = rect.height.ceil().max(1.0) as u32;
    RgbaImage::new(w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn canvas() -> RgbaImage {
        RgbaImage::from_fn(100, 80, |x, _| {
            if x < 50 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn captures_requested_region() {
        let canvas = canvas();
        let url = capture_area(Some(&canvas), &Rect::new(60.0, 10.0, 20.0, 15.0));
        assert!(url.starts_with("data:image/png;base64,"));

        let img = decode_png(&url).unwrap();
        assert_eq!(img.dimensions(), (20, 15));
        assert_eq!(img.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn region_is_clamped_to_canvas() {
        let canvas = canvas();
        let url = capture_area(Some(&canvas), &Rect::new(90.0, 70.0, 40.0, 40.0));
        let img = decode_png(&url).unwrap();
        assert_eq!(img.dimensions(), (10, 10));
    }

    #[test]
    fn missing_canvas_gives_blank_image() {
        let url = capture_area(None, &Rect::new(0.0, 0.0, 12.0, 7.0));
        let img = decode_png(&url).unwrap();
        assert_eq!(img.dimensions(), (12, 7));
        assert_eq!(img.get_pixel(3, 3), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn region_outside_canvas_gives_blank_image() {
        let canvas = canvas();
        let url = capture_area(Some(&canvas), &Rect::new(500.0, 500.0, 4.0, 4.0));
        assert_eq!(decode_png(&url).unwrap().dimensions(), (4, 4));
    }
}
