//! Shared fixtures for composer integration tests.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use notewall_compose::ComposerConfig;
use notewall_core::{CanvasSpec, HOME_TEXT_REGION, LOCK_TEXT_REGION, Note};

/// Small canvases so tests stay fast.
#[allow(dead_code)]
pub fn small_config() -> ComposerConfig {
    ComposerConfig {
        lock: CanvasSpec::new(234, 506, LOCK_TEXT_REGION).expect("valid lock canvas"),
        home: CanvasSpec::new(234, 506, HOME_TEXT_REGION).expect("valid home canvas"),
        min_font_size: 6,
        max_font_size: 24,
        ..ComposerConfig::default()
    }
}

/// A few realistic notes.
#[allow(dead_code)]
pub fn fixture_notes() -> Vec<Note> {
    vec![
        Note::new("1", "Be strong and courageous.").with_reference("Joshua 1:9"),
        Note::new("2", "Call the landlord about the heater"),
        Note::new("3", "Drink water"),
    ]
}

/// PNG bytes of a uniformly colored image.
#[allow(dead_code)]
pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(rgba));
    let mut encoded = Cursor::new(Vec::new());
    image
        .write_to(&mut encoded, ImageFormat::Png)
        .expect("png should encode");
    encoded.into_inner()
}
