#![warn(missing_docs)]
//! # notewall-theme
//!
//! ## Purpose
//! Chooses a legible text color / companion theme from rendered pixels.
//!
//! ## Responsibilities
//! - Crop a resolution-independent sampling region of an image.
//! - Downsample it to a small fixed grid and average BT.601 luma.
//! - Map the brightness to [`ThemeVariant`] through the shared threshold.
//!
//! ## Data flow
//! Composited background -> [`ThemeSelector::select`] -> [`ThemeVariant`]
//! used both for text color and the companion UI variant.
//!
//! ## Error model
//! Unreadable pixel data never errors; it falls back to [`ThemeVariant::Dark`].

use image::imageops::{self, FilterType};
use image::RgbaImage;
use notewall_core::{LOCK_TEXT_REGION, TextRegion, ThemeVariant, theme_for_brightness};
use tracing::{debug, warn};

/// Edge length of the downsampled sampling grid.
pub const SAMPLE_GRID: u32 = 12;

/// Region sampled when the caller does not name one: where lock screen text sits.
pub const DEFAULT_SAMPLE_REGION: TextRegion = LOCK_TEXT_REGION;

/// Theme selection over a fixed fractional region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeSelector {
    region: TextRegion,
    grid: u32,
}

impl Default for ThemeSelector {
    fn default() -> Self {
        Self {
            region: DEFAULT_SAMPLE_REGION,
            grid: SAMPLE_GRID,
        }
    }
}

impl ThemeSelector {
    /// Selector sampling `region` of each image.
    pub fn for_region(region: TextRegion) -> Self {
        Self {
            region,
            grid: SAMPLE_GRID,
        }
    }

    /// Sampling region in use.
    pub fn region(&self) -> TextRegion {
        self.region
    }

    /// Average luma of the sampled region in `[0, 1]`.
    ///
    /// Returns `None` when the image or its crop holds no pixels.
    pub fn brightness(&self, image: &RgbaImage) -> Option<f64> {
        average_brightness(image, self.region, self.grid)
    }

    /// Theme for `image`; unreadable input yields [`ThemeVariant::Dark`].
    pub fn select(&self, image: &RgbaImage) -> ThemeVariant {
        match self.brightness(image) {
            Some(brightness) => {
                let theme = theme_for_brightness(brightness);
                debug!(brightness, ?theme, "selected theme");
                theme
            }
            None => {
                warn!(
                    width = image.width(),
                    height = image.height(),
                    "sampling region unreadable; defaulting to dark theme"
                );
                ThemeVariant::Dark
            }
        }
    }
}

/// BT.601 luma of one pixel, channels normalized to `[0, 1]`. Alpha is ignored.
pub fn luma(pixel: [u8; 4]) -> f64 {
    let [r, g, b, _] = pixel;
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) / 255.0
}

/// Crops `region`, downsamples it to `grid x grid` and averages luma.
pub fn average_brightness(image: &RgbaImage, region: TextRegion, grid: u32) -> Option<f64> {
    if image.width() == 0 || image.height() == 0 || grid == 0 {
        return None;
    }

    let rect = region.to_pixels(image.width(), image.height());
    let crop = imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image();
    if crop.width() == 0 || crop.height() == 0 {
        return None;
    }

    let sampled = imageops::resize(&crop, grid, grid, FilterType::Triangle);
    let count = (grid as usize) * (grid as usize);

    let total: f64 = sampled.pixels().map(|pixel| luma(pixel.0)).sum();
    Some(total / count as f64)
}

/// Theme of `image` over [`DEFAULT_SAMPLE_REGION`].
pub fn select_theme(image: &RgbaImage) -> ThemeVariant {
    ThemeSelector::default().select(image)
}

/// Theme of `image` over a caller-chosen region.
pub fn select_theme_in(image: &RgbaImage, region: TextRegion) -> ThemeVariant {
    ThemeSelector::for_region(region).select(image)
}

/// Decodes PNG/JPEG bytes and selects a theme; undecodable bytes yield Dark.
pub fn select_theme_from_encoded(bytes: &[u8]) -> ThemeVariant {
    match image::load_from_memory(bytes) {
        Ok(decoded) => select_theme(&decoded.to_rgba8()),
        Err(error) => {
            warn!(%error, "cannot decode image for theme selection; defaulting to dark theme");
            ThemeVariant::Dark
        }
    }
}
