#![warn(missing_docs)]
//! # notewall-layout
//!
//! ## Purpose
//! Finds the largest font size at which a list of notes fits a text box.
//!
//! ## Responsibilities
//! - Define the [`TextMeasurer`] seam to the host text system.
//! - Provide a deterministic [`MonospaceMeasurer`] for headless rendering.
//! - Binary-search the integer font size domain with the [`fits`] predicate.
//!
//! ## Data flow
//! Composer passes display strings and the text box size ->
//! [`TextLayoutEngine::layout`] -> [`NoteLayout`] with the chosen size and the
//! wrapped lines to paint.
//!
//! ## Ownership and lifetimes
//! Notes are borrowed for the duration of one call; wrapped lines are returned
//! as owned strings so painting does not borrow measurement state.
//!
//! ## Error model
//! No errors are raised. A measurer that cannot measure a candidate size
//! reports `None`, which the predicate treats as "does not fit".
//!
//! ## Example
//! ```rust
//! use notewall_layout::TextLayoutEngine;
//!
//! let engine = TextLayoutEngine::monospace();
//! let size = engine.fit(&["Be strong and courageous."], 1000, 1000, 20, 50);
//! assert_eq!(size, 50);
//! ```

use tracing::debug;
use unicode_width::UnicodeWidthStr;

/// Gap between wrapped lines of one note, as a fraction of font size.
pub const LINE_SPACING_RATIO: f32 = 0.15;

/// Gap between consecutive notes, as a fraction of font size.
pub const NOTE_SEPARATOR_RATIO: f32 = 0.45;

/// Horizontal advance of one display column, as a fraction of font size.
pub const DEFAULT_ADVANCE_RATIO: f32 = 0.55;

/// Wrapped text of one note at a given font size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Wrapped lines, top to bottom.
    pub lines: Vec<String>,
    /// Block height in pixels including inter-line spacing.
    pub height: f32,
}

/// Measures wrapped text blocks for the layout search.
///
/// # Contract
/// For a fixed text and width, the returned block height must be
/// non-decreasing in `font_size`, and `None` at one size implies `None` (or a
/// taller block) at every larger size. Binary search relies on this.
pub trait TextMeasurer {
    /// Wraps `text` into `max_width` pixels at `font_size`.
    ///
    /// Returns `None` when the text cannot be measured at this size.
    fn measure(&self, text: &str, font_size: u32, max_width: u32) -> Option<TextBlock>;

    /// Horizontal advance in pixels of `text` on one line.
    fn line_advance(&self, text: &str, font_size: u32) -> f32;
}

/// Fixed-advance measurer: every display column is `advance_ratio * size` wide.
///
/// Wide (East Asian) characters count as two columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasurer {
    /// Column advance as a fraction of font size.
    pub advance_ratio: f32,
    /// Inter-line gap as a fraction of font size.
    pub line_spacing_ratio: f32,
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self {
            advance_ratio: DEFAULT_ADVANCE_RATIO,
            line_spacing_ratio: LINE_SPACING_RATIO,
        }
    }
}

impl MonospaceMeasurer {
    fn columns(&self, font_size: u32, max_width: u32) -> Option<usize> {
        let advance = font_size as f32 * self.advance_ratio;
        if !advance.is_finite() || advance <= 0.0 {
            return None;
        }
        let columns = (max_width as f32 / advance).floor() as usize;
        (columns > 0).then_some(columns)
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure(&self, text: &str, font_size: u32, max_width: u32) -> Option<TextBlock> {
        let columns = self.columns(font_size, max_width)?;

        // First-fit keeps the line count monotone in width; optimal-fit does not.
        let options =
            textwrap::Options::new(columns).wrap_algorithm(textwrap::WrapAlgorithm::FirstFit);
        let lines: Vec<String> = textwrap::wrap(text, options)
            .into_iter()
            .map(|line| line.into_owned())
            .collect();

        let size = font_size as f32;
        let count = lines.len().max(1) as f32;
        let height = count * size + (count - 1.0) * self.line_spacing_ratio * size;

        Some(TextBlock { lines, height })
    }

    fn line_advance(&self, text: &str, font_size: u32) -> f32 {
        text.width() as f32 * font_size as f32 * self.advance_ratio
    }
}

/// Result of laying out a note list into a box.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteLayout {
    /// Chosen font size.
    pub font_size: u32,
    /// One wrapped block per note, in input order.
    pub blocks: Vec<TextBlock>,
    /// Gap between blocks in pixels.
    pub separator: f32,
    /// Total content height in pixels.
    pub total_height: f32,
    /// `true` when even the floor size does not fit.
    pub overflows: bool,
}

/// Sums block heights plus separators at `font_size`.
///
/// Returns `None` when any note cannot be measured.
pub fn content_height<M, S>(measurer: &M, notes: &[S], font_size: u32, width: u32) -> Option<f32>
where
    M: TextMeasurer + ?Sized,
    S: AsRef<str>,
{
    let mut total = 0.0_f32;
    for note in notes {
        total += measurer.measure(note.as_ref(), font_size, width)?.height;
    }
    let separators = notes.len().saturating_sub(1) as f32;
    Some(total + separators * NOTE_SEPARATOR_RATIO * font_size as f32)
}

/// Fit predicate: `true` iff all notes stack within `height` at `font_size`.
pub fn fits<M, S>(measurer: &M, notes: &[S], font_size: u32, width: u32, height: u32) -> bool
where
    M: TextMeasurer + ?Sized,
    S: AsRef<str>,
{
    content_height(measurer, notes, font_size, width)
        .is_some_and(|content| content <= height as f32)
}

/// Largest size in `[min_size, max_size]` for which [`fits`] holds.
///
/// - Empty `notes` returns `max_size`.
/// - When even `min_size` does not fit, returns `min_size` and lets content
///   overflow rather than dropping it.
/// - `min_size > max_size` collapses the domain to `min_size`.
pub fn fit_font_size<M, S>(
    measurer: &M,
    notes: &[S],
    width: u32,
    height: u32,
    min_size: u32,
    max_size: u32,
) -> u32
where
    M: TextMeasurer + ?Sized,
    S: AsRef<str>,
{
    let max_size = max_size.max(min_size);
    if notes.is_empty() {
        return max_size;
    }

    let mut low = min_size;
    let mut high = max_size;
    let mut best = min_size;

    while low <= high {
        let mid = low + (high - low) / 2;
        if fits(measurer, notes, mid, width, height) {
            best = mid;
            low = mid + 1;
        } else if mid == 0 {
            break;
        } else {
            high = mid - 1;
        }
    }

    best
}

/// Font fitting front-end bound to one measurer.
#[derive(Debug, Clone, Default)]
pub struct TextLayoutEngine<M = MonospaceMeasurer> {
    measurer: M,
}

impl TextLayoutEngine<MonospaceMeasurer> {
    /// Engine over the default [`MonospaceMeasurer`].
    pub fn monospace() -> Self {
        Self::new(MonospaceMeasurer::default())
    }
}

impl<M: TextMeasurer> TextLayoutEngine<M> {
    /// Creates an engine over a custom measurer.
    pub fn new(measurer: M) -> Self {
        Self { measurer }
    }

    /// Returns the underlying measurer.
    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    /// See [`fits`].
    pub fn fits<S: AsRef<str>>(&self, notes: &[S], font_size: u32, width: u32, height: u32) -> bool {
        fits(&self.measurer, notes, font_size, width, height)
    }

    /// See [`fit_font_size`].
    pub fn fit<S: AsRef<str>>(
        &self,
        notes: &[S],
        width: u32,
        height: u32,
        min_size: u32,
        max_size: u32,
    ) -> u32 {
        fit_font_size(&self.measurer, notes, width, height, min_size, max_size)
    }

    /// Fits the notes and returns the wrapped blocks at the chosen size.
    pub fn layout<S: AsRef<str>>(
        &self,
        notes: &[S],
        width: u32,
        height: u32,
        min_size: u32,
        max_size: u32,
    ) -> NoteLayout {
        let font_size = self.fit(notes, width, height, min_size, max_size);
        let overflows = !notes.is_empty() && !self.fits(notes, font_size, width, height);

        // Unmeasurable notes still get a block so painting sees every note.
        let blocks: Vec<TextBlock> = notes
            .iter()
            .map(|note| {
                self.measurer
                    .measure(note.as_ref(), font_size, width)
                    .unwrap_or_else(|| TextBlock {
                        lines: vec![note.as_ref().to_string()],
                        height: font_size as f32,
                    })
            })
            .collect();

        let separator = NOTE_SEPARATOR_RATIO * font_size as f32;
        let total_height = blocks.iter().map(|block| block.height).sum::<f32>()
            + blocks.len().saturating_sub(1) as f32 * separator;

        debug!(
            notes = notes.len(),
            font_size, overflows, total_height, "laid out notes"
        );

        NoteLayout {
            font_size,
            blocks,
            separator,
            total_height,
            overflows,
        }
    }
}
