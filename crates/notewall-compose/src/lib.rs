#![warn(missing_docs)]
//! # notewall-compose
//!
//! ## Purpose
//! Composes home and lock wallpapers from one note list and style.
//!
//! ## Responsibilities
//! - Draw the background (image scaled to fill, over the solid color).
//! - Pick the theme from the background under each variant's text region.
//! - Fit the notes to the text region and paint them in the theme's color.
//!
//! ## Data flow
//! Notes + [`StyleConfig`] -> [`WallpaperComposer::compose`] ->
//! [`ComposedWallpaper`] (one [`RenderedArtifact`] per variant) handed to the
//! artifact store by the caller.
//!
//! ## Ownership and lifetimes
//! Output artifacts own their pixel buffers; nothing borrows the input notes
//! past the call.
//!
//! ## Error model
//! Malformed backgrounds, empty note lists (when content is required) and
//! invalid canvases fail with [`ComposeError`]; no partial image is returned.
//!
//! ## Side effects
//! None. Composition never touches storage.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use notewall_core::{
    CanvasSpec, Color, CoreError, HOME_WIDGET_TEXT_REGION, Note, RenderedArtifact, StyleConfig,
    TextRegion, Variant,
};
use notewall_layout::{MonospaceMeasurer, NoteLayout, TextLayoutEngine, TextMeasurer};
use notewall_theme::ThemeSelector;
use thiserror::Error;
use tracing::{debug, info};
use unicode_width::UnicodeWidthChar;

/// Smallest font size the composer will lay notes out at.
pub const DEFAULT_MIN_FONT_SIZE: u32 = 20;
/// Largest font size the composer will lay notes out at.
pub const DEFAULT_MAX_FONT_SIZE: u32 = 50;

/// Horizontal placement of each wrapped line inside the text region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalAlign {
    /// Lines start at the left edge of the region.
    #[default]
    Left,
    /// Lines are centered in the region.
    Center,
}

/// Canvas and sizing configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposerConfig {
    /// Lock screen canvas.
    pub lock: CanvasSpec,
    /// Home screen canvas without companion widgets.
    pub home: CanvasSpec,
    /// Home text region used when the style enables companion widgets.
    pub home_widget_region: TextRegion,
    /// Font size floor.
    pub min_font_size: u32,
    /// Font size ceiling.
    pub max_font_size: u32,
    /// Reject empty note lists instead of rendering a bare background.
    pub require_content: bool,
    /// Line alignment.
    pub align: HorizontalAlign,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            lock: CanvasSpec::lock_default(),
            home: CanvasSpec::home_default(),
            home_widget_region: HOME_WIDGET_TEXT_REGION,
            min_font_size: DEFAULT_MIN_FONT_SIZE,
            max_font_size: DEFAULT_MAX_FONT_SIZE,
            require_content: true,
            align: HorizontalAlign::Left,
        }
    }
}

impl ComposerConfig {
    /// Canvas used for `variant` under `style`.
    pub fn canvas_for(&self, variant: Variant, style: &StyleConfig) -> CanvasSpec {
        match variant {
            Variant::Lock => self.lock,
            Variant::Home if style.has_companion_widgets => CanvasSpec {
                text_region: self.home_widget_region,
                ..self.home
            },
            Variant::Home => self.home,
        }
    }
}

/// Home and lock artifacts of one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedWallpaper {
    /// Home screen artifact.
    pub home: RenderedArtifact,
    /// Lock screen artifact.
    pub lock: RenderedArtifact,
}

impl ComposedWallpaper {
    /// Artifacts in persistence order.
    pub fn artifacts(&self) -> [&RenderedArtifact; 2] {
        [&self.home, &self.lock]
    }
}

/// Rasterizes one line of text; the seam to the host glyph renderer.
pub trait GlyphPainter: Send + Sync {
    /// Paints `line` with its top-left corner at (`x`, `top`).
    fn paint_line(
        &self,
        canvas: &mut RgbaImage,
        line: &str,
        x: f32,
        top: f32,
        font_size: u32,
        color: Color,
    );
}

/// Font-free painter: each visible character becomes a filled cell.
///
/// Cell geometry follows the [`MonospaceMeasurer`] advance so painted lines
/// occupy exactly the measured width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockGlyphPainter {
    /// Column advance as a fraction of font size.
    pub advance_ratio: f32,
}

impl Default for BlockGlyphPainter {
    fn default() -> Self {
        Self {
            advance_ratio: MonospaceMeasurer::default().advance_ratio,
        }
    }
}

impl GlyphPainter for BlockGlyphPainter {
    fn paint_line(
        &self,
        canvas: &mut RgbaImage,
        line: &str,
        x: f32,
        top: f32,
        font_size: u32,
        color: Color,
    ) {
        let size = font_size as f32;
        let advance = size * self.advance_ratio;
        let mut cursor = x;

        for ch in line.chars() {
            let columns = ch.width().unwrap_or(0) as f32;
            if columns == 0.0 {
                continue;
            }
            let cell = advance * columns;
            if !ch.is_whitespace() {
                fill_rect(
                    canvas,
                    cursor + cell * 0.1,
                    top + size * 0.2,
                    cell * 0.8,
                    size * 0.7,
                    color,
                );
            }
            cursor += cell;
        }
    }
}

fn fill_rect(canvas: &mut RgbaImage, x: f32, y: f32, width: f32, height: f32, color: Color) {
    let x0 = x.max(0.0).round() as u32;
    let y0 = y.max(0.0).round() as u32;
    let x1 = ((x + width).round().max(0.0) as u32).min(canvas.width());
    let y1 = ((y + height).round().max(0.0) as u32).min(canvas.height());
    let pixel = Rgba(color.to_pixel());

    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px, py, pixel);
        }
    }
}

/// Anything that can turn notes into both wallpaper variants.
pub trait Composer: Send + Sync {
    /// Renders home and lock artifacts.
    ///
    /// # Errors
    /// See [`ComposeError`].
    fn compose(&self, notes: &[Note], style: &StyleConfig)
    -> Result<ComposedWallpaper, ComposeError>;
}

/// Default composer: layout engine + theme selector + glyph painter.
#[derive(Debug, Clone)]
pub struct WallpaperComposer<M = MonospaceMeasurer, P = BlockGlyphPainter> {
    config: ComposerConfig,
    engine: TextLayoutEngine<M>,
    painter: P,
}

impl WallpaperComposer<MonospaceMeasurer, BlockGlyphPainter> {
    /// Composer with the built-in measurer and block painter.
    pub fn new(config: ComposerConfig) -> Self {
        Self::with_parts(config, MonospaceMeasurer::default(), BlockGlyphPainter::default())
    }
}

impl<M: TextMeasurer, P: GlyphPainter> WallpaperComposer<M, P> {
    /// Composer over a host measurer and painter.
    pub fn with_parts(config: ComposerConfig, measurer: M, painter: P) -> Self {
        Self {
            config,
            engine: TextLayoutEngine::new(measurer),
            painter,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    fn render_variant(
        &self,
        variant: Variant,
        texts: &[String],
        style: &StyleConfig,
        background: Option<&DynamicImage>,
    ) -> Result<RenderedArtifact, ComposeError> {
        let canvas = self.config.canvas_for(variant, style);
        canvas.validate()?;

        let mut image = render_background(background, style.background_color, &canvas);
        let theme = ThemeSelector::for_region(canvas.text_region).select(&image);

        let rect = canvas.text_rect();
        let layout = self.engine.layout(
            texts,
            rect.width,
            rect.height,
            self.config.min_font_size,
            self.config.max_font_size,
        );

        // Overflowing content starts at the region top instead of centering.
        let slack = (rect.height as f32 - layout.total_height).max(0.0);
        let top = rect.y as f32 + slack / 2.0;
        self.paint_layout(&mut image, &layout, rect.x as f32, rect.width as f32, top, theme.text_color());

        debug!(
            %variant,
            font_size = layout.font_size,
            overflows = layout.overflows,
            ?theme,
            "rendered variant"
        );

        Ok(RenderedArtifact::new(
            variant,
            canvas.width,
            canvas.height,
            image.into_raw(),
            theme,
            layout.font_size,
        )?)
    }

    fn paint_layout(
        &self,
        image: &mut RgbaImage,
        layout: &NoteLayout,
        left: f32,
        region_width: f32,
        top: f32,
        color: Color,
    ) {
        let size = layout.font_size as f32;
        let mut y = top;

        for block in &layout.blocks {
            let lines = block.lines.len().max(1) as f32;
            let gap = if lines > 1.0 {
                ((block.height - lines * size) / (lines - 1.0)).max(0.0)
            } else {
                0.0
            };

            let mut line_top = y;
            for line in &block.lines {
                let x = match self.config.align {
                    HorizontalAlign::Left => left,
                    HorizontalAlign::Center => {
                        let advance = self.engine.measurer().line_advance(line, layout.font_size);
                        left + ((region_width - advance) / 2.0).max(0.0)
                    }
                };
                self.painter
                    .paint_line(image, line, x, line_top, layout.font_size, color);
                line_top += size + gap;
            }

            y += block.height + layout.separator;
        }
    }
}

impl<M, P> Composer for WallpaperComposer<M, P>
where
    M: TextMeasurer + Send + Sync,
    P: GlyphPainter,
{
    fn compose(
        &self,
        notes: &[Note],
        style: &StyleConfig,
    ) -> Result<ComposedWallpaper, ComposeError> {
        if notes.is_empty() && self.config.require_content {
            return Err(ComposeError::EmptyNotes);
        }

        let background = match style.background_image.as_deref() {
            Some(bytes) => Some(
                image::load_from_memory(bytes)
                    .map_err(|error| ComposeError::MalformedBackground(error.to_string()))?,
            ),
            None => None,
        };

        let texts: Vec<String> = notes.iter().map(Note::display_text).collect();
        let home = self.render_variant(Variant::Home, &texts, style, background.as_ref())?;
        let lock = self.render_variant(Variant::Lock, &texts, style, background.as_ref())?;

        info!(
            notes = notes.len(),
            home_font_size = home.font_size,
            lock_font_size = lock.font_size,
            home_theme = ?home.theme,
            lock_theme = ?lock.theme,
            "composed wallpaper"
        );

        Ok(ComposedWallpaper { home, lock })
    }
}

/// Solid color canvas with the optional image scaled to fill and overlaid.
fn render_background(
    background: Option<&DynamicImage>,
    color: Color,
    canvas: &CanvasSpec,
) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(canvas.width, canvas.height, Rgba(color.to_pixel()));
    if let Some(background) = background {
        let filled = background
            .resize_to_fill(canvas.width, canvas.height, FilterType::Triangle)
            .to_rgba8();
        imageops::overlay(&mut image, &filled, 0, 0);
    }
    image
}

/// Error type for wallpaper composition.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Content is required and the note list is empty.
    #[error("note list is empty")]
    EmptyNotes,
    /// Background image bytes could not be decoded.
    #[error("malformed background image: {0}")]
    MalformedBackground(String),
    /// Canvas or artifact geometry is invalid.
    #[error("invalid canvas: {0}")]
    InvalidCanvas(#[from] CoreError),
}
