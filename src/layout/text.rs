use crate::text_metrics;

use super::types::{FontSpec, NodeMetrics, Point, TextSize};

/// Glyph whose outline box defines the line height of a font.
pub const REFERENCE_GLYPH: char = 'A';

/// Cap height of Arial-like faces relative to the em size.
const FALLBACK_CAP_HEIGHT: f32 = 0.716;

/// Text measurement capability consumed by the layout.
///
/// `width` is the advance needed to draw `text` without clipping. `height`
/// depends on the font only (ascent plus descent of [`REFERENCE_GLYPH`]).
pub trait TextMeasure {
    fn measure_text(&self, text: &str, font: &FontSpec) -> TextSize;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn measure_text(&self, text: &str, font: &FontSpec) -> TextSize {
        (**self).measure_text(text, font)
    }
}

impl<T: TextMeasure + ?Sized> TextMeasure for Box<T> {
    fn measure_text(&self, text: &str, font: &FontSpec) -> TextSize {
        (**self).measure_text(text, font)
    }
}

/// Installed system fonts, falling back to the width table per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFontMeasure;

impl TextMeasure for SystemFontMeasure {
    fn measure_text(&self, text: &str, font: &FontSpec) -> TextSize {
        let width = text_metrics::measure_text_width(text, font.size, &font.family)
            .unwrap_or_else(|| fallback_text_width(text, font.size));
        let height = text_metrics::measure_glyph_height(REFERENCE_GLYPH, font.size, &font.family)
            .unwrap_or(font.size * FALLBACK_CAP_HEIGHT);
        TextSize { width, height }
    }
}

/// Deterministic per-character widths; no font files involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackMeasure;

impl TextMeasure for FallbackMeasure {
    fn measure_text(&self, text: &str, font: &FontSpec) -> TextSize {
        TextSize {
            width: fallback_text_width(text, font.size),
            height: font.size * FALLBACK_CAP_HEIGHT,
        }
    }
}

/// Picks the measurer the config asks for.
pub fn default_measure(fast_text_metrics: bool) -> Box<dyn TextMeasure> {
    if fast_text_metrics {
        Box::new(FallbackMeasure)
    } else {
        Box::new(SystemFontMeasure)
    }
}

/// Node box around `text`: width grows with the text, height is fixed.
pub fn compute_node_box(
    measure: &dyn TextMeasure,
    text: &str,
    font: &FontSpec,
    padding: f32,
    min_width: f32,
    min_height: f32,
) -> NodeMetrics {
    let text_size = if text.is_empty() {
        TextSize {
            width: 0.0,
            height: measure.measure_text("", font).height,
        }
    } else {
        measure.measure_text(text, font)
    };
    let padded_width = text_size.width + padding * 2.0;
    let padded_height = text_size.height + padding * 2.0;
    let width = min_width.max(padded_width);
    let height = min_height;
    NodeMetrics {
        width,
        height,
        text_offset: Point::new((width - padded_width) / 2.0, (height - padded_height) / 2.0),
        text: text_size,
    }
}

pub(crate) fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars()
        .filter(|ch| *ch != '\n')
        .map(char_width_factor)
        .sum::<f32>()
        * font_size
}

pub(super) fn char_width_factor(ch: char) -> f32 {
    // Em-relative advances of Arial at a 16px baseline.
    match ch {
        ' ' => 0.278,
        '.' | ',' | ':' | ';' | '!' | '|' | '\'' => 0.278,
        '(' | ')' | '[' | ']' | '{' | '}' | '-' => 0.333,
        'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' => 0.667,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' => 0.722,
        'F' | 'T' | 'Z' => 0.611,
        'G' | 'O' | 'Q' => 0.778,
        'I' => 0.278,
        'J' => 0.5,
        'L' => 0.556,
        'M' => 0.833,
        'W' => 0.944,
        'f' | 't' => 0.278,
        'i' | 'j' | 'l' => 0.222,
        'r' => 0.333,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => 0.5,
        'm' => 0.833,
        'w' => 0.722,
        'a'..='z' => 0.556,
        '0'..='9' => 0.556,
        '@' => 1.015,
        '#' | '$' | '%' | '&' => 0.667,
        c if c.is_ascii() => 0.584,
        // CJK and other wide scripts take a full em.
        _ => 1.0,
    }
}
