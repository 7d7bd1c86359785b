#![warn(missing_docs)]
//! # notewall-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `notewall` workspace.
//!
//! ## Responsibilities
//! - Represent user notes and the style configuration of one render request.
//! - Describe target canvases and the fractional text region inside them.
//! - Represent rendered artifacts (one per [`Variant`]) with validated pixel
//!   buffers.
//! - Own the brightness threshold shared by text color and companion theme.
//!
//! ## Data flow
//! Callers build [`Note`] lists and a [`StyleConfig`]; the composer turns them
//! into [`RenderedArtifact`] values which the store persists by [`Variant`].
//!
//! ## Ownership and lifetimes
//! Artifacts own their RGBA buffers (`Vec<u8>`) so they can move between the
//! composer, the store and the orchestrator task without borrow coupling.
//!
//! ## Error model
//! Shape and geometry validation failures return [`CoreError`].
//!
//! ## Privacy notes
//! Note text is user-authored; downstream crates log counts and sizes only.
//!
//! ## Example
//! ```rust
//! use notewall_core::{Note, ThemeVariant, theme_for_brightness};
//!
//! let note = Note::new("n-1", "Be strong and courageous.").with_reference("Joshua 1:9");
//! assert_eq!(note.display_text(), "Be strong and courageous. — Joshua 1:9");
//! assert_eq!(theme_for_brightness(0.55), ThemeVariant::Light);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Average luma at or above which the background counts as bright.
///
/// Shared by the text color decision and the companion theme decision; the two
/// must never use different values.
pub const BRIGHTNESS_THRESHOLD: f64 = 0.55;

/// Maps an average brightness in `[0, 1]` to a companion theme.
///
/// The boundary is closed on the light side: exactly
/// [`BRIGHTNESS_THRESHOLD`] selects [`ThemeVariant::Light`].
pub fn theme_for_brightness(brightness: f64) -> ThemeVariant {
    if brightness >= BRIGHTNESS_THRESHOLD {
        ThemeVariant::Light
    } else {
        ThemeVariant::Dark
    }
}

/// Opaque note identifier assigned by the note-editing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub String);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One user-authored note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Opaque identifier.
    pub id: NoteId,
    /// Note body.
    pub text: String,
    /// Optional attribution, e.g. a verse reference.
    #[serde(default)]
    pub reference: Option<String>,
    /// Whether the user ticked the note off.
    #[serde(default)]
    pub completed: bool,
}

impl Note {
    /// Creates an open note without a reference.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: NoteId(id.into()),
            text: text.into(),
            reference: None,
            completed: false,
        }
    }

    /// Attaches a reference line.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Text as it appears on the wallpaper.
    ///
    /// Blank references are dropped rather than rendered as a dangling dash.
    pub fn display_text(&self) -> String {
        match self.reference.as_deref().map(str::trim) {
            Some(reference) if !reference.is_empty() => {
                format!("{} — {reference}", self.text.trim_end())
            }
            _ => self.text.clone(),
        }
    }
}

/// Decodes a JSON array of notes as submitted by the host shell.
///
/// # Errors
/// Returns [`CoreError::Codec`] when the payload is not a valid note array.
pub fn notes_from_json(raw: &[u8]) -> Result<Vec<Note>, CoreError> {
    serde_json::from_slice(raw).map_err(CoreError::Codec)
}

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Creates an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Returns the color as an `[r, g, b, a]` pixel.
    pub const fn to_pixel(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Caller-provided style of one render request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Solid background used when no image is set.
    pub background_color: Color,
    /// Encoded background image (PNG or JPEG bytes).
    #[serde(default)]
    pub background_image: Option<Vec<u8>>,
    /// Whether the home screen carries companion widgets in its upper half.
    #[serde(default)]
    pub has_companion_widgets: bool,
}

impl StyleConfig {
    /// Solid-color style without widgets.
    pub fn solid(background_color: Color) -> Self {
        Self {
            background_color,
            background_image: None,
            has_companion_widgets: false,
        }
    }
}

/// Destination of one rendered artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Home screen wallpaper.
    Home,
    /// Lock screen wallpaper.
    Lock,
}

impl Variant {
    /// Both variants, in persistence order.
    pub const ALL: [Variant; 2] = [Variant::Home, Variant::Lock];

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Home => "home",
            Variant::Lock => "lock",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Companion UI theme chosen for legibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeVariant {
    /// Bright background: dark text, light companion UI.
    Light,
    /// Dark background: white text, dark companion UI.
    Dark,
}

impl ThemeVariant {
    /// Text color that stays legible on this theme's background.
    pub fn text_color(self) -> Color {
        match self {
            ThemeVariant::Light => Color::BLACK,
            ThemeVariant::Dark => Color::WHITE,
        }
    }
}

/// Rectangle expressed as fractions of the full canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    /// Left edge as a fraction of canvas width.
    pub x: f32,
    /// Top edge as a fraction of canvas height.
    pub y: f32,
    /// Width as a fraction of canvas width.
    pub width: f32,
    /// Height as a fraction of canvas height.
    pub height: f32,
}

impl TextRegion {
    /// Creates a validated fractional region.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidRegion`] when any edge leaves `[0, 1]` or
    /// the region is empty.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Result<Self, CoreError> {
        let region = Self {
            x,
            y,
            width,
            height,
        };
        region.validate()?;
        Ok(region)
    }

    /// Checks the region invariants.
    ///
    /// # Errors
    /// See [`TextRegion::new`].
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = [self.x, self.y, self.width, self.height];
        if fields.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(CoreError::InvalidRegion(
                "region fractions must be finite and non-negative".to_string(),
            ));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(CoreError::InvalidRegion("region is empty".to_string()));
        }
        if self.x + self.width > 1.0 + f32::EPSILON || self.y + self.height > 1.0 + f32::EPSILON {
            return Err(CoreError::InvalidRegion(
                "region extends past the canvas".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolves the region against concrete canvas dimensions.
    ///
    /// The result is clamped to the canvas and is at least one pixel wide and
    /// tall whenever the canvas itself is non-empty.
    pub fn to_pixels(&self, canvas_width: u32, canvas_height: u32) -> PixelRect {
        let x = ((self.x * canvas_width as f32).floor() as u32).min(canvas_width.saturating_sub(1));
        let y =
            ((self.y * canvas_height as f32).floor() as u32).min(canvas_height.saturating_sub(1));
        let width = ((self.width * canvas_width as f32).round() as u32)
            .clamp(1, canvas_width.saturating_sub(x).max(1));
        let height = ((self.height * canvas_height as f32).round() as u32)
            .clamp(1, canvas_height.saturating_sub(y).max(1));

        PixelRect {
            x,
            y,
            width,
            height,
        }
    }
}

/// Rectangle in absolute pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Target canvas for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSpec {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Region the notes are laid out in.
    pub text_region: TextRegion,
}

/// Default portrait canvas width.
pub const DEFAULT_CANVAS_WIDTH: u32 = 1170;
/// Default portrait canvas height.
pub const DEFAULT_CANVAS_HEIGHT: u32 = 2532;

/// Lock screen text region; keeps clear of the clock at the top.
pub const LOCK_TEXT_REGION: TextRegion = TextRegion {
    x: 0.08,
    y: 0.34,
    width: 0.84,
    height: 0.56,
};

/// Home screen text region when no companion widgets are shown.
pub const HOME_TEXT_REGION: TextRegion = TextRegion {
    x: 0.08,
    y: 0.12,
    width: 0.84,
    height: 0.50,
};

/// Home screen text region that leaves the upper half to companion widgets.
pub const HOME_WIDGET_TEXT_REGION: TextRegion = TextRegion {
    x: 0.08,
    y: 0.46,
    width: 0.84,
    height: 0.46,
};

impl CanvasSpec {
    /// Creates a validated canvas.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidCanvas`] for zero dimensions and
    /// [`CoreError::InvalidRegion`] for a malformed text region.
    pub fn new(width: u32, height: u32, text_region: TextRegion) -> Result<Self, CoreError> {
        let canvas = Self {
            width,
            height,
            text_region,
        };
        canvas.validate()?;
        Ok(canvas)
    }

    /// Checks the canvas invariants.
    ///
    /// # Errors
    /// See [`CanvasSpec::new`].
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::InvalidCanvas {
                width: self.width,
                height: self.height,
            });
        }
        required_rgba_len(self.width, self.height)?;
        self.text_region.validate()
    }

    /// Default lock screen canvas.
    pub fn lock_default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            text_region: LOCK_TEXT_REGION,
        }
    }

    /// Default home screen canvas.
    pub fn home_default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            text_region: HOME_TEXT_REGION,
        }
    }

    /// Text region in absolute pixels.
    pub fn text_rect(&self) -> PixelRect {
        self.text_region.to_pixels(self.width, self.height)
    }
}

/// One rendered wallpaper ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    /// Destination of this artifact.
    pub variant: Variant,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGBA bytes in row-major order (`width * height * 4`).
    pub rgba: Vec<u8>,
    /// Theme chosen for the text region.
    pub theme: ThemeVariant,
    /// Font size the notes were laid out at.
    pub font_size: u32,
}

impl RenderedArtifact {
    /// Constructs a validated artifact.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArtifactShape`] when the pixel buffer length
    /// is not exactly `width * height * 4`.
    pub fn new(
        variant: Variant,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
        theme: ThemeVariant,
        font_size: u32,
    ) -> Result<Self, CoreError> {
        let expected = required_rgba_len(width, height)?;
        if rgba.len() != expected {
            return Err(CoreError::InvalidArtifactShape {
                expected,
                actual: rgba.len(),
            });
        }

        Ok(Self {
            variant,
            width,
            height,
            rgba,
            theme,
            font_size,
        })
    }
}

/// Error type for core model validation and codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Pixel buffer length does not match declared geometry.
    #[error("invalid artifact shape: expected {expected} bytes, got {actual}")]
    InvalidArtifactShape {
        /// Expected RGBA byte count.
        expected: usize,
        /// Actual RGBA byte count.
        actual: usize,
    },
    /// Canvas has a zero or overflowing dimension.
    #[error("invalid canvas {width}x{height}")]
    InvalidCanvas {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// Fractional region is malformed.
    #[error("invalid text region: {0}")]
    InvalidRegion(String),
    /// JSON encoding/decoding error.
    #[error("note codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Byte length of an RGBA buffer for the given geometry.
///
/// # Errors
/// Returns [`CoreError::InvalidCanvas`] when the length overflows `usize`.
pub fn required_rgba_len(width: u32, height: u32) -> Result<usize, CoreError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or(CoreError::InvalidCanvas { width, height })
}
