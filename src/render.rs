//! Scene painting for the board and the intro overlay.

use std::time::{Duration, Instant};

use vello::Scene;
use vello::kurbo::{Affine, Rect, RoundedRect};
use vello::peniko::{Color, Fill};

use crate::board::Board;
use crate::config::{IntroTokens, PaletteTokens, Rgb};
use crate::intro::{PhraseKind, interleaved_lines};
use crate::state_machine::card_sm::CardPhase;
use crate::text::{FittedText, ParleyCtx};

const CORNER_RADIUS: f64 = 10.0;
const INTRO_LINE_GAP: f64 = 0.35;

/// Keeps one shaped text block per card and per intro line between frames.
#[derive(Default)]
pub struct BoardPainter {
    card_text: Vec<FittedText>,
    intro_text: Vec<(PhraseKind, FittedText)>,
}

impl BoardPainter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the background and every card.
    pub fn paint_board(&mut self, scene: &mut Scene, board: &Board, viewport: (f64, f64), now: Instant, ctx: &mut ParleyCtx) {
        let config = board.config();
        let palette = &config.palette;
        let reveal = Duration::from_millis(config.scheduling.reveal_ms);

        let bg = Rect::new(0.0, 0.0, viewport.0, viewport.1);
        scene.fill(Fill::NonZero, Affine::IDENTITY, palette.background.color(), None, &bg);

        let cards = board.cards();
        if self.card_text.len() != cards.len() {
            self.card_text = cards
                .iter()
                .map(|c| FittedText::new(c.text(), c.font_size(), ctx))
                .collect();
        }

        for (card, block) in cards.iter().zip(self.card_text.iter_mut()) {
            let rect = card.rect();
            if rect.width() <= 0.0 || rect.height() <= 0.0 {
                continue;
            }

            let (fill, ink_alpha) = match card.phase() {
                CardPhase::Covered => (palette.card.color(), 1.0),
                CardPhase::Advice => (palette.advice.color(), 1.0),
                CardPhase::Revealing => {
                    let t = card.reveal_progress(now, reveal).unwrap_or(1.0);
                    (mix(palette.card, palette.advice, t), t)
                }
            };
            let shape = RoundedRect::from_rect(rect, CORNER_RADIUS);
            scene.fill(Fill::NonZero, Affine::IDENTITY, fill, None, &shape);

            let ink = match card.phase() {
                CardPhase::Covered => palette.card_ink,
                _ => palette.advice_ink,
            };
            let usable = board.fitter().usable_area(card.size());
            block.set_text(card.text(), ctx);
            block.set_font_size(card.font_size());
            block.set_line_height(config.fit.line_height);
            block.set_width(Some(usable.width.max(1.0)));
            let extent = block.extent(ctx);
            let origin = (
                rect.x0 + (rect.width() - extent.width as f64) / 2.0,
                rect.y0 + (rect.height() - extent.height as f64) / 2.0,
            );
            block.render_into_scene(scene, origin, ink.with_alpha(ink_alpha), ctx);
        }
    }

    /// Draw the intro phrases centered over the viewport at `alpha`.
    pub fn paint_intro(
        &mut self,
        scene: &mut Scene,
        viewport: (f64, f64),
        alpha: f32,
        tokens: &IntroTokens,
        palette: &PaletteTokens,
        ctx: &mut ParleyCtx,
    ) {
        if alpha <= 0.001 {
            return;
        }
        let (width, height) = viewport;
        let overlay = Rect::new(0.0, 0.0, width, height);
        scene.fill(Fill::NonZero, Affine::IDENTITY, palette.background.with_alpha(alpha * 0.92), None, &overlay);

        if self.intro_text.is_empty() {
            self.intro_text = interleaved_lines()
                .into_iter()
                .map(|(kind, line)| (kind, FittedText::new(line, tokens.font_size, ctx)))
                .collect();
        }

        let max_width = (width * 0.8) as f32;
        let gap = tokens.font_size as f64 * INTRO_LINE_GAP;
        let mut extents = Vec::with_capacity(self.intro_text.len());
        for (_, block) in &mut self.intro_text {
            block.set_font_size(tokens.font_size);
            block.set_width(Some(max_width));
            extents.push(block.extent(ctx));
        }
        let total: f64 = extents.iter().map(|e| e.height as f64 + gap).sum::<f64>() - gap;

        let mut y = ((height - total) / 2.0).max(0.0);
        for ((kind, block), extent) in self.intro_text.iter_mut().zip(extents) {
            let ink = match kind {
                PhraseKind::Work => palette.card,
                PhraseKind::Home => palette.advice,
            };
            let x = (width - extent.width as f64) / 2.0;
            block.render_into_scene(scene, (x, y), ink.with_alpha(alpha), ctx);
            y += extent.height as f64 + gap;
        }
    }
}

/// Linear blend of two palette colors.
fn mix(a: Rgb, b: Rgb, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    Rgb::new(
        a.r + (b.r - a.r) * t,
        a.g + (b.g - a.g) * t,
        a.b + (b.b - a.b) * t,
    )
    .color()
}
