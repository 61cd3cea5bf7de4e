//! Shaped text via `parley` `PlainEditor`.
//!
//! `FittedText` owns one editor and is used both to measure candidate sizes
//! (through [`ParleyMeasurer`]) and to draw the settled result into a vello
//! scene. Parley's default line breaking only breaks at word boundaries
//! (`overflow-wrap: normal`), which is exactly the wrapping the fitter wants.
//!
//! The `FontContext` and `LayoutContext` are shared; they live in `ParleyCtx`.
//!
//! ## Brush type
//!
//! `parley`'s `Brush` trait requires `Clone + PartialEq + Default + Debug`.
//! `vello::peniko::Color` does not implement `Default`, so we wrap it in a
//! `ColorBrush` newtype that provides `Default` as opaque black.

use parley::{
    FontContext, LayoutContext,
    editing::PlainEditor,
    layout::{Alignment, PositionedLayoutItem},
    style::{LineHeight, StyleProperty},
};
use vello::{
    Glyph, Scene,
    kurbo::Affine,
    peniko::{Color, Fill},
};

use crate::measure::{TextExtent, TextMeasure, WrapConstraints};

// ---------------------------------------------------------------------------
// ColorBrush
// ---------------------------------------------------------------------------

/// A thin wrapper around `vello::peniko::Color` that satisfies `parley::Brush`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorBrush(pub Color);

impl Default for ColorBrush {
    fn default() -> Self {
        ColorBrush(Color::new([0.0_f32, 0.0, 0.0, 1.0]))
    }
}

// ---------------------------------------------------------------------------
// Shared parley contexts
// ---------------------------------------------------------------------------

/// Font and layout caches shared by every `FittedText`.
pub struct ParleyCtx {
    pub font_cx: FontContext,
    pub layout_cx: LayoutContext<ColorBrush>,
}

impl ParleyCtx {
    pub fn new() -> Self {
        Self {
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
        }
    }
}

impl Default for ParleyCtx {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// FittedText
// ---------------------------------------------------------------------------

/// A read-only text block whose size and wrap width change over time.
pub struct FittedText {
    editor: PlainEditor<ColorBrush>,
    text: String,
    font_size: f32,
    width: Option<f32>,
}

impl FittedText {
    pub fn new(text: &str, font_size: f32, ctx: &mut ParleyCtx) -> Self {
        let mut editor = PlainEditor::new(font_size);
        editor.set_alignment(Alignment::Start);
        let mut block = Self {
            editor,
            text: String::new(),
            font_size,
            width: None,
        };
        block.set_text(text, ctx);
        block
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text. No-op if unchanged.
    pub fn set_text(&mut self, text: &str, ctx: &mut ParleyCtx) {
        if self.text == text {
            return;
        }
        self.text = text.to_string();
        let mut driver = self.editor.driver(&mut ctx.font_cx, &mut ctx.layout_cx);
        driver.select_all();
        driver.insert_or_replace_selection(text);
        driver.move_to_text_start();
    }

    pub fn set_font_size(&mut self, font_size: f32) {
        if self.font_size == font_size {
            return;
        }
        self.font_size = font_size;
        self.editor
            .edit_styles()
            .insert(StyleProperty::FontSize(font_size));
    }

    pub fn set_line_height(&mut self, line_height: f32) {
        self.editor
            .edit_styles()
            .insert(StyleProperty::LineHeight(LineHeight::FontSizeRelative(line_height)));
    }

    /// Update the line-wrap width. `None` means a single unbounded line.
    pub fn set_width(&mut self, width: Option<f32>) {
        if self.width == width {
            return;
        }
        self.width = width;
        self.editor.set_width(width);
    }

    /// Lay out with the current settings and report the block size.
    pub fn extent(&mut self, ctx: &mut ParleyCtx) -> TextExtent {
        let layout = self.editor.layout(&mut ctx.font_cx, &mut ctx.layout_cx);
        TextExtent {
            width: layout.width(),
            height: layout.height(),
        }
    }

    /// Draw the glyph runs with the block's top-left corner at `origin`.
    pub fn render_into_scene(
        &mut self,
        scene: &mut Scene,
        origin: (f64, f64),
        color: Color,
        ctx: &mut ParleyCtx,
    ) {
        let transform = Affine::translate(origin);
        let layout = self.editor.layout(&mut ctx.font_cx, &mut ctx.layout_cx);

        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };

                let font_data = glyph_run.run().font();
                let font_size = glyph_run.run().font_size();

                let glyphs: Vec<Glyph> = glyph_run
                    .positioned_glyphs()
                    .map(|g| Glyph { id: g.id, x: g.x, y: g.y })
                    .collect();

                if glyphs.is_empty() {
                    continue;
                }

                scene
                    .draw_glyphs(font_data)
                    .font_size(font_size)
                    .transform(transform)
                    .brush(&color)
                    .draw(Fill::NonZero, glyphs.into_iter());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ParleyMeasurer
// ---------------------------------------------------------------------------

/// `TextMeasure` backed by full parley shaping.
///
/// Keeps one scratch block so repeated probes of the same text only re-run
/// line breaking, not text insertion.
pub struct ParleyMeasurer {
    ctx: ParleyCtx,
    scratch: Option<FittedText>,
}

impl ParleyMeasurer {
    pub fn new() -> Self {
        Self {
            ctx: ParleyCtx::new(),
            scratch: None,
        }
    }

    /// Contexts shared with rendering so fonts are only discovered once.
    pub fn ctx(&mut self) -> &mut ParleyCtx {
        &mut self.ctx
    }
}

impl Default for ParleyMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for ParleyMeasurer {
    fn measure(&mut self, text: &str, font_size: f32, c: &WrapConstraints) -> TextExtent {
        let ctx = &mut self.ctx;
        let block = self
            .scratch
            .get_or_insert_with(|| FittedText::new(text, font_size, ctx));
        block.set_text(text, ctx);
        block.set_font_size(font_size);
        block.set_line_height(c.line_height);
        block.set_width(Some(c.max_width));
        block.extent(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::load_card_font;

    #[test]
    fn shaped_measurer_never_breaks_inside_a_word() {
        // Needs system fonts for shaping.
        if load_card_font().is_none() {
            return;
        }
        let mut m = ParleyMeasurer::new();
        let c = WrapConstraints {
            max_width: 50.0,
            line_height: 1.05,
        };
        let long = m.measure("Supercalifragilisticexpialidocious", 20.0, &c);
        assert!(long.width > c.max_width, "width {} should overflow", long.width);

        let unbounded = WrapConstraints {
            max_width: 10_000.0,
            line_height: 1.05,
        };
        let single = m.measure("Supercalifragilisticexpialidocious", 20.0, &unbounded);
        assert!((long.height - single.height).abs() < 1e-3, "stayed on one line");
    }
}
