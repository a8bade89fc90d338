//! Integration tests for the Skia painter against a real font
//!
//! Set `STANZA_TEST_FONT` to a TrueType/OpenType file, otherwise a few common
//! system locations are tried. Tests are skipped when no font is available.

use std::path::PathBuf;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use stanza_core::traits::{GlyphMetrics, GlyphPainter, Renderer};
use stanza_core::{
    wrap, Background, Color, FontSpec, LayoutParams, Registry, RenderPipeline, RenderRequest,
};
use stanza_fontdb::FontDatabase;
use stanza_render_skia::SkiaFace;

const CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn test_font_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("STANZA_TEST_FONT") {
        return Some(PathBuf::from(path));
    }
    CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_face(size: f32) -> Option<SkiaFace> {
    let Some(path) = test_font_path() else {
        eprintln!("no test font found, skipping");
        return None;
    };
    let mut db = FontDatabase::new();
    let face = db.load_face(&path, size).expect("test font should load");
    Some(SkiaFace::new(face))
}

fn paper(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
}

fn is_inked(p: &Rgba<u8>) -> bool {
    p.0[0] < 128
}

#[test]
fn test_renderer_name() {
    let Some(face) = load_face(34.0) else { return };
    assert_eq!(face.name(), "skia");
}

#[test]
fn test_metrics_are_sane() {
    let Some(face) = load_face(34.0) else { return };

    let short = face.measure("il").unwrap().width;
    let long = face.measure("WWWW").unwrap().width;
    assert!(short > 0.0);
    assert!(long > short * 2.0);
    assert!(face.line_height() > 30.0 && face.line_height() < 60.0);
    assert_eq!(face.measure("").unwrap().width, 0.0);
}

#[test]
fn test_draws_inside_the_line_box() {
    let Some(face) = load_face(34.0) else { return };
    let mut canvas = paper(400, 200);

    face.draw_line(&mut canvas, "Hello", (50.0, 40.0), Color::black())
        .unwrap();

    let width = face.measure("Hello").unwrap().width;
    let bottom = 40.0 + face.line_height();
    let mut inked = 0;
    for (x, y, p) in canvas.enumerate_pixels() {
        if is_inked(p) {
            inked += 1;
            assert!(x as f32 >= 48.0 && x as f32 <= 52.0 + width, "ink at x={x}");
            assert!(y as f32 >= 38.0 && y as f32 <= bottom + 2.0, "ink at y={y}");
        }
    }
    assert!(inked > 50, "only {inked} inked pixels");
}

#[test]
fn test_spaces_draw_nothing() {
    let Some(face) = load_face(34.0) else { return };
    let mut canvas = paper(100, 100);
    face.draw_line(&mut canvas, "   ", (10.0, 10.0), Color::black())
        .unwrap();
    assert!(canvas.pixels().all(|p| p == &Rgba([255, 255, 255, 255])));
}

#[test]
fn test_off_canvas_is_clipped() {
    let Some(face) = load_face(34.0) else { return };
    let mut canvas = paper(60, 30);
    face.draw_line(&mut canvas, "clipped text", (-20.0, 10.0), Color::black())
        .unwrap();
    face.draw_line(&mut canvas, "gone", (500.0, 500.0), Color::black())
        .unwrap();
}

#[test]
fn test_wrapped_lines_fit_the_budget() {
    let Some(face) = load_face(34.0) else { return };
    let result = wrap(
        "a very-very-very-long-unbreakable-token short",
        &face,
        100.0,
    )
    .unwrap();

    assert!(result.len() > 2);
    for line in result.lines() {
        let w = face.measure(line).unwrap().width;
        assert!(w <= 100.0 || line.chars().count() == 1, "{line:?} is {w}px");
    }
}

#[test]
fn test_full_pipeline_png() {
    let Some(face) = load_face(34.0) else { return };
    let registry = Registry::builder()
        .font(FontSpec::new("m1", 34.0, Arc::new(face)))
        .background(Background::new("default", paper(600, 300)))
        .build()
        .unwrap();
    let pipeline = RenderPipeline::new(Arc::new(registry), LayoutParams::default());

    let poem = "roses are red\nviolets are blue\nthis poem is long\nand so is the queue";
    let png = pipeline
        .render(&RenderRequest::new(poem, "m1", "default"))
        .unwrap();

    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.width(), 600);
    // four lines plus 200px of padding outgrow the 300px paper
    assert!(decoded.height() > 300);
    assert!(decoded.pixels().any(is_inked));
}
