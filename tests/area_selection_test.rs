use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use pdf_highlighter::screenshot::decode_png;
use pdf_highlighter::selection::{Phase, TipState};
use pdf_highlighter::test_utils::test_helpers::{FakeRenderer, PAGE_GAP, RecordingHost};
use pdf_highlighter::{Comment, Highlighter, Key, PointerEvent, Settings};

type TestHighlighter = Highlighter<FakeRenderer, RecordingHost>;

const PAGE_HEIGHT: f64 = 800.0;

fn highlighter() -> TestHighlighter {
    let mut h = Highlighter::new(
        FakeRenderer::new(3, 600.0, PAGE_HEIGHT),
        RecordingHost::new(),
        Settings::default(),
    );
    h.on_pages_init();
    h
}

fn drag(h: &mut TestHighlighter, page: u32, from: (f64, f64), to: (f64, f64), now: Instant) {
    h.on_pointer_down(&PointerEvent::at(from.0, from.1).on_page(page).with_alt(), now);
    h.on_pointer_move(&PointerEvent::at(to.0, to.1).on_page(page).with_alt());
    h.on_pointer_up(&PointerEvent::at(to.0, to.1).on_page(page).with_alt(), now);
}

#[test]
fn test_alt_drag_produces_area_ghost() {
    let t0 = Instant::now();
    let mut h = highlighter();

    drag(&mut h, 1, (100.0, 100.0), (200.0, 160.0), t0);

    assert_eq!(h.host().text_selection, vec![false, true]);
    assert_eq!(h.phase(), Phase::Idle);
    let ghost = h.ghost().expect("area ghost");
    assert_eq!(ghost.position.page_number, 1);
    assert!(ghost.position.rects.is_empty());
    assert!(ghost.content.text.is_none());
    let rect = ghost.position.bounding_rect;
    assert_eq!(rect.x1, 100.0);
    assert_eq!(rect.y1, 100.0);
    assert_eq!(rect.width, 100.0);
    assert_eq!(rect.height, 60.0);

    // No canvas yet, so the capture is a blank image of the region
    let image = decode_png(ghost.content.image.as_deref().unwrap()).unwrap();
    assert_eq!(image.dimensions(), (100, 60));

    assert!(matches!(h.tip_state(), Some(TipState::Selection)));
    assert_eq!(h.host().selection_finished.len(), 1);
    assert_eq!(h.host().labels[&1], vec!["ghost@100,100".to_string()]);
}

#[test]
fn test_area_capture_reads_page_canvas() {
    let t0 = Instant::now();
    let mut h = highlighter();
    let red = Rgba([200, 10, 10, 255]);
    h.renderer_mut()
        .set_canvas(2, RgbaImage::from_pixel(600, 800, red));

    let top = PAGE_HEIGHT + PAGE_GAP;
    drag(&mut h, 2, (50.0, top + 20.0), (150.0, top + 70.0), t0);

    let ghost = h.ghost().expect("area ghost");
    assert_eq!(ghost.position.page_number, 2);
    assert_eq!(ghost.position.bounding_rect.y1, 20.0);
    let image = decode_png(ghost.content.image.as_deref().unwrap()).unwrap();
    assert_eq!(image.dimensions(), (100, 50));
    assert_eq!(*image.get_pixel(0, 0), red);
}

#[test]
fn test_area_ghost_commits_with_image() {
    let t0 = Instant::now();
    let mut h = highlighter();
    drag(&mut h, 1, (100.0, 100.0), (200.0, 160.0), t0);

    h.commit(Comment::new("figure", ""), t0 + Duration::from_millis(10));

    assert!(h.ghost().is_none());
    let committed = &h.highlights().as_slice()[0];
    assert!(committed.content.image.is_some());
    assert!(committed.position.rects.is_empty());
}

#[test]
fn test_tiny_drag_is_abandoned() {
    let t0 = Instant::now();
    let mut h = highlighter();

    drag(&mut h, 1, (10.0, 10.0), (10.5, 10.5), t0);

    assert!(h.ghost().is_none());
    assert_eq!(h.host().text_selection, vec![false, true]);
    assert_eq!(h.phase(), Phase::Idle);
}

#[test]
fn test_escape_during_drag_restores_text_selection() {
    let t0 = Instant::now();
    let mut h = highlighter();

    h.on_pointer_down(&PointerEvent::at(10.0, 10.0).on_page(1).with_alt(), t0);
    assert_eq!(h.phase(), Phase::AreaSelecting);
    h.on_key_down(Key::Escape, t0);

    assert_eq!(h.phase(), Phase::Idle);
    assert_eq!(h.host().text_selection, vec![false, true]);

    // Releasing afterwards does nothing
    h.on_pointer_up(&PointerEvent::at(100.0, 100.0).on_page(1), t0);
    assert!(h.ghost().is_none());
}

#[test]
fn test_drag_without_modifier_is_not_an_area_selection() {
    let t0 = Instant::now();
    let mut h = highlighter();

    h.on_pointer_down(&PointerEvent::at(10.0, 10.0).on_page(1), t0);
    h.on_pointer_up(&PointerEvent::at(100.0, 100.0).on_page(1), t0);

    assert!(h.host().text_selection.is_empty());
    assert!(h.ghost().is_none());
}

#[test]
fn test_drag_on_unmounted_page_is_ignored() {
    let t0 = Instant::now();
    let mut h = highlighter();
    h.renderer_mut().unmount(3);

    h.on_pointer_down(&PointerEvent::at(10.0, 10.0).on_page(3).with_alt(), t0);
    assert_eq!(h.phase(), Phase::Idle);
    assert!(h.host().text_selection.is_empty());
}
