//! Text measurement providers.
//!
//! The fitter never looks at fonts itself; it asks a [`TextMeasure`] how large
//! a text renders at a candidate size. Every provider here wraps only at
//! whitespace, so a long word overflows its line instead of being split into
//! single-letter lines.

use peniko::FontData;
use skrifa::MetadataProvider;

/// Wrapping parameters for one measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrapConstraints {
    /// Lines wrap once they would exceed this width.
    pub max_width: f32,
    /// Line-height multiplier of the font size.
    pub line_height: f32,
}

/// Rendered size of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// Reports the rendered size of `text` at `font_size`.
pub trait TextMeasure {
    fn measure(&mut self, text: &str, font_size: f32, constraints: &WrapConstraints) -> TextExtent;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &mut T {
    fn measure(&mut self, text: &str, font_size: f32, constraints: &WrapConstraints) -> TextExtent {
        (**self).measure(text, font_size, constraints)
    }
}

// ---------------------------------------------------------------------------
// Greedy whitespace wrapping
// ---------------------------------------------------------------------------

/// Greedy word wrap. Returns `(widest line, line count)`.
///
/// Hard newlines always start a new line. A word wider than `max_width`
/// occupies a line of its own and makes that line overflow.
pub fn wrap_words<F>(text: &str, max_width: f32, space_width: f32, mut word_width: F) -> (f32, usize)
where
    F: FnMut(&str) -> f32,
{
    let mut widest: f32 = 0.0;
    let mut lines = 0;

    for paragraph in text.lines() {
        let mut line_width: f32 = 0.0;
        let mut line_has_word = false;
        lines += 1;

        for word in paragraph.split_whitespace() {
            let w = word_width(word);
            if !line_has_word {
                line_width = w;
                line_has_word = true;
            } else if line_width + space_width + w <= max_width {
                line_width += space_width + w;
            } else {
                widest = widest.max(line_width);
                lines += 1;
                line_width = w;
            }
        }
        widest = widest.max(line_width);
    }

    (widest, lines.max(1))
}

// ---------------------------------------------------------------------------
// HeuristicMeasurer
// ---------------------------------------------------------------------------

/// Font-free estimate: every character advances `advance_em` of the font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicMeasurer {
    pub advance_em: f32,
}

impl Default for HeuristicMeasurer {
    fn default() -> Self {
        Self { advance_em: 0.6 }
    }
}

impl TextMeasure for HeuristicMeasurer {
    fn measure(&mut self, text: &str, font_size: f32, c: &WrapConstraints) -> TextExtent {
        let advance = self.advance_em * font_size;
        let (width, lines) = wrap_words(text, c.max_width, advance, |word| {
            word.chars().count() as f32 * advance
        });
        TextExtent {
            width,
            height: lines as f32 * font_size * c.line_height,
        }
    }
}

// ---------------------------------------------------------------------------
// FontMetricsMeasurer
// ---------------------------------------------------------------------------

/// Measures with real advance widths read from a font via skrifa.
///
/// No shaping: each character maps to one glyph. Good enough for Latin text
/// and much cheaper than a full layout pass.
pub struct FontMetricsMeasurer {
    font: FontData,
}

impl FontMetricsMeasurer {
    /// Fails if the font data cannot be parsed.
    pub fn new(font: FontData) -> anyhow::Result<Self> {
        skrifa::FontRef::from_index(font.data.as_ref(), font.index)
            .map_err(|e| anyhow::anyhow!("unreadable font: {e}"))?;
        Ok(Self { font })
    }

    pub fn from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("failed to read font {}: {e}", path.display()))?;
        Self::new(FontData::new(data.into(), 0))
    }
}

impl TextMeasure for FontMetricsMeasurer {
    fn measure(&mut self, text: &str, font_size: f32, c: &WrapConstraints) -> TextExtent {
        let Ok(font_ref) = skrifa::FontRef::from_index(self.font.data.as_ref(), self.font.index)
        else {
            // Checked in `new`; unreachable in practice.
            return HeuristicMeasurer::default().measure(text, font_size, c);
        };

        let charmap = font_ref.charmap();
        let glyph_metrics = font_ref.glyph_metrics(
            skrifa::instance::Size::new(font_size),
            skrifa::instance::LocationRef::default(),
        );
        let advance = |ch: char| {
            let gid = charmap.map(ch).unwrap_or_default();
            glyph_metrics.advance_width(gid).unwrap_or(font_size * 0.5)
        };

        let space_width = advance(' ');
        let (width, lines) = wrap_words(text, c.max_width, space_width, |word| {
            word.chars().map(advance).sum()
        });
        TextExtent {
            width,
            height: lines as f32 * font_size * c.line_height,
        }
    }
}

// ---------------------------------------------------------------------------
// Font loading
// ---------------------------------------------------------------------------

/// Try to load a font from common system paths.
fn load_system_font(font_names: &[&str]) -> Option<FontData> {
    let macos_dirs = [
        "/System/Library/Fonts/",
        "/System/Library/Fonts/Supplemental/",
        "/Library/Fonts/",
    ];
    let linux_dirs = [
        "/usr/share/fonts/truetype/dejavu/",
        "/usr/share/fonts/truetype/",
        "/usr/share/fonts/opentype/",
    ];
    let extensions = ["ttf", "otf", "ttc"];

    for name in font_names {
        for dir in macos_dirs.iter().chain(linux_dirs.iter()) {
            for ext in &extensions {
                let path = format!("{dir}{name}.{ext}");
                if let Ok(data) = std::fs::read(&path) {
                    tracing::debug!(target: "fit", %path, "loaded system font");
                    return Some(FontData::new(data.into(), 0));
                }
            }
        }
    }
    None
}

/// Best available sans-serif for card text.
/// Font stack: Helvetica > Arial > DejaVu Sans > Liberation Sans
pub fn load_card_font() -> Option<FontData> {
    load_system_font(&[
        "Helvetica",
        "Arial",
        "DejaVuSans",
        "LiberationSans-Regular",
    ])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_width(word: &str) -> f32 {
        word.chars().count() as f32
    }

    #[test]
    fn wrap_keeps_words_whole() {
        // "aaaa bb" at width 5: "aaaa" then "bb".
        let (w, lines) = wrap_words("aaaa bb", 5.0, 1.0, unit_width);
        assert_eq!(lines, 2);
        assert_eq!(w, 4.0);
    }

    #[test]
    fn wrap_fills_line_when_room() {
        let (w, lines) = wrap_words("aa bb cc", 8.0, 1.0, unit_width);
        assert_eq!(lines, 1);
        assert_eq!(w, 8.0);
    }

    #[test]
    fn overlong_word_overflows_instead_of_breaking() {
        let (w, lines) = wrap_words("abcdefghij", 4.0, 1.0, unit_width);
        assert_eq!(lines, 1);
        assert_eq!(w, 10.0);
    }

    #[test]
    fn hard_newlines_start_lines() {
        let (_, lines) = wrap_words("a\nb\nc", 100.0, 1.0, unit_width);
        assert_eq!(lines, 3);
    }

    #[test]
    fn empty_text_is_one_empty_line() {
        assert_eq!(wrap_words("", 10.0, 1.0, unit_width), (0.0, 1));
    }

    #[test]
    fn heuristic_scales_linearly() {
        let mut m = HeuristicMeasurer::default();
        let c = WrapConstraints {
            max_width: 10_000.0,
            line_height: 1.0,
        };
        let a = m.measure("Advice1", 10.0, &c);
        let b = m.measure("Advice1", 20.0, &c);
        assert!((a.width - 42.0).abs() < 1e-4);
        assert!((b.width - 2.0 * a.width).abs() < 1e-4);
        assert!((b.height - 20.0).abs() < 1e-4);
    }

    #[test]
    fn heuristic_wraps_into_taller_block() {
        let mut m = HeuristicMeasurer::default();
        let c = WrapConstraints {
            max_width: 100.0,
            line_height: 1.05,
        };
        // 6px per char: "take one slow" is 78px, "breath now" wraps below.
        let e = m.measure("take one slow breath now", 10.0, &c);
        assert!(e.width <= 100.0);
        assert!((e.height - 2.0 * 10.0 * 1.05).abs() < 1e-4);
    }

    #[test]
    fn font_measurer_rejects_garbage() {
        let bogus = FontData::new(vec![0_u8; 16].into(), 0);
        assert!(FontMetricsMeasurer::new(bogus).is_err());
    }

    #[test]
    fn font_measurer_never_breaks_inside_a_word() {
        // Skipped on machines without any of the card fonts installed.
        let Some(font) = load_card_font() else {
            return;
        };
        let mut m = FontMetricsMeasurer::new(font).unwrap();
        let c = WrapConstraints {
            max_width: 50.0,
            line_height: 1.05,
        };
        let e = m.measure("Supercalifragilisticexpialidocious", 20.0, &c);
        assert!(e.width > c.max_width, "width {} should overflow", e.width);
        assert!((e.height - 20.0 * 1.05).abs() < 1e-3, "one line, got {}", e.height);
    }

    #[test]
    fn font_measurer_wraps_at_spaces() {
        let Some(font) = load_card_font() else {
            return;
        };
        let mut m = FontMetricsMeasurer::new(font).unwrap();
        let wide = WrapConstraints {
            max_width: 10_000.0,
            line_height: 1.0,
        };
        let word = m.measure("rest", 20.0, &wide).width;
        let narrow = WrapConstraints {
            max_width: word + 1.0,
            line_height: 1.0,
        };
        let e = m.measure("rest rest", 20.0, &narrow);
        assert!(e.width <= narrow.max_width);
        assert!((e.height - 40.0).abs() < 1e-3);
    }
}
