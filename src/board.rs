//! The advice board.
//!
//! A uniform grid of cards. Clicking a covered card marks it visited for the
//! session, swaps its text for advice and plays a short reveal; afterwards
//! its text is kept fitted to the card through the refit scheduler. The host
//! calls [`Board::tick`] once per frame with a text measurer.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use vello::kurbo::{Point, Rect};

use crate::config::{BoardConfig, GridTokens};
use crate::fit::{BoxSize, FitError, FitResult, TextFitter};
use crate::measure::TextMeasure;
use crate::scheduler::{RefitReason, RefitScheduler};
use crate::session::{AdviceCatalog, BoxId, SessionFlags};
use crate::state_machine::card_sm::{CardEvent, CardMachine, CardPhase, CardStateMachine};
use crate::transition::{FontTween, plan_resize_transition, settle_fit};

use statig::prelude::*;

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

pub struct Card {
    id: BoxId,
    sm: CardStateMachine,
    rect: Rect,
    label: String,
    advice: String,
    font_size: f32,
    fitted: bool,
    tween: Option<FontTween>,
    scheduler: RefitScheduler,
    reveal_until: Option<Instant>,
    settle_at: Option<Instant>,
    last_fit: Option<FitResult>,
}

impl Card {
    fn new(id: BoxId, advice: String, min_font_size: f32, debounce: Duration) -> Self {
        Self {
            id,
            sm: CardMachine::new(id).state_machine(),
            rect: Rect::ZERO,
            label: id.0.to_string(),
            advice,
            font_size: min_font_size,
            fitted: false,
            tween: None,
            scheduler: RefitScheduler::new(debounce),
            reveal_until: None,
            settle_at: None,
            last_fit: None,
        }
    }

    pub fn id(&self) -> BoxId {
        self.id
    }

    pub fn phase(&self) -> CardPhase {
        CardMachine::phase(self.sm.state())
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn size(&self) -> BoxSize {
        BoxSize::new(self.rect.width() as f32, self.rect.height() as f32)
    }

    /// What the card currently shows.
    pub fn text(&self) -> &str {
        match self.phase() {
            CardPhase::Covered => &self.label,
            CardPhase::Revealing | CardPhase::Advice => &self.advice,
        }
    }

    /// Font size currently on screen.
    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn last_fit(&self) -> Option<&FitResult> {
        self.last_fit.as_ref()
    }

    /// Reveal running or a transition tween in flight.
    pub fn is_animating(&self) -> bool {
        self.scheduler.is_animating() || self.tween.is_some()
    }

    /// Fraction of the reveal that has elapsed, if revealing.
    pub fn reveal_progress(&self, now: Instant, reveal: Duration) -> Option<f32> {
        let until = self.reveal_until?;
        if reveal.is_zero() {
            return Some(1.0);
        }
        let remaining = until.saturating_duration_since(now).as_secs_f32();
        Some((1.0 - remaining / reveal.as_secs_f32()).clamp(0.0, 1.0))
    }

    fn has_work(&self) -> bool {
        self.is_animating()
            || self.scheduler.has_pending()
            || self.reveal_until.is_some()
            || self.settle_at.is_some()
    }

    fn snap(&mut self, fit: FitResult) {
        self.font_size = fit.applied_size;
        self.fitted = true;
        self.tween = None;
        self.last_fit = Some(fit);
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

pub struct Board {
    config: BoardConfig,
    fitter: TextFitter,
    catalog: AdviceCatalog,
    session: SessionFlags,
    cards: Vec<Card>,
    viewport: BoxSize,
}

impl Board {
    /// Build the board. Boxes already visited in `session` start as advice.
    ///
    /// Fails if the fit or transition settings are invalid.
    pub fn new(config: BoardConfig, session: SessionFlags, now: Instant) -> Result<Self, FitError> {
        let fitter = validated_fitter(&config)?;
        let catalog = AdviceCatalog::new(&config.advice);
        let mut board = Self {
            config,
            fitter,
            catalog,
            session,
            cards: Vec::new(),
            viewport: BoxSize::ZERO,
        };
        board.build_cards(now);
        Ok(board)
    }

    fn build_cards(&mut self, now: Instant) {
        let min = self.fitter.options().min_font_size;
        let debounce = Duration::from_millis(self.config.scheduling.resize_debounce_ms);
        let settle = Duration::from_millis(self.config.scheduling.settle_delay_ms);
        if self.config.grid.is_clamped() {
            let grid = &self.config.grid;
            warn!(target: "board", columns = grid.columns, rows = grid.rows, max = GridTokens::MAX_SIDE, "grid clamped");
        }

        self.cards = (1..=self.config.box_count())
            .map(|n| {
                let id = BoxId(n);
                let mut card = Card::new(id, self.catalog.advice_for(id), min, debounce);
                if self.session.is_visited(id) {
                    card.sm.handle(&CardEvent::Restore);
                    card.settle_at = Some(now + settle);
                }
                card.scheduler.request(RefitReason::Initial, now);
                card
            })
            .collect();

        let viewport = self.viewport;
        self.viewport = BoxSize::ZERO;
        self.layout(viewport, now);
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn fitter(&self) -> &TextFitter {
        &self.fitter
    }

    pub fn session(&self) -> &SessionFlags {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionFlags {
        &mut self.session
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: BoxId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// Swap in a new config. On error the old config stays in place.
    pub fn apply_config(&mut self, config: BoardConfig, now: Instant) -> Result<(), FitError> {
        let fitter = validated_fitter(&config)?;
        let rebuild = config.grid.columns != self.config.grid.columns
            || config.grid.rows != self.config.grid.rows
            || config.advice != self.config.advice;

        self.fitter = fitter;
        self.catalog = AdviceCatalog::new(&config.advice);
        self.config = config;

        if rebuild {
            info!(target: "board", boxes = self.config.box_count(), "rebuilding cards");
            self.build_cards(now);
            return Ok(());
        }

        let debounce = Duration::from_millis(self.config.scheduling.resize_debounce_ms);
        for card in &mut self.cards {
            card.scheduler.set_debounce(debounce);
            card.scheduler.request(RefitReason::Settled, now);
        }
        let viewport = self.viewport;
        self.viewport = BoxSize::ZERO;
        self.layout(viewport, now);
        Ok(())
    }

    /// Recompute card rectangles for a viewport and request refits for every
    /// card whose size changed.
    pub fn layout(&mut self, viewport: BoxSize, now: Instant) {
        if viewport == self.viewport {
            return;
        }
        let first_layout = self.viewport == BoxSize::ZERO;
        self.viewport = viewport;

        let grid = &self.config.grid;
        let (columns, rows) = grid.dimensions();
        let cols = columns as f64;
        let rows = rows as f64;
        let gap = grid.gap as f64;
        let margin = grid.margin as f64;
        let cell_w = ((viewport.width as f64 - 2.0 * margin - (cols - 1.0) * gap) / cols).max(0.0);
        let cell_h = ((viewport.height as f64 - 2.0 * margin - (rows - 1.0) * gap) / rows).max(0.0);
        let columns = columns as usize;

        for (i, card) in self.cards.iter_mut().enumerate() {
            let col = (i % columns) as f64;
            let row = (i / columns) as f64;
            let x = margin + col * (cell_w + gap);
            let y = margin + row * (cell_h + gap);
            let rect = Rect::new(x, y, x + cell_w, y + cell_h);
            if rect == card.rect {
                continue;
            }
            card.rect = rect;
            let reason = if first_layout || !card.fitted {
                RefitReason::Initial
            } else {
                RefitReason::Resize
            };
            card.scheduler.request(reason, now);
        }
        debug!(target: "board", ?viewport, cell_w, cell_h, "layout");
    }

    /// Card under a window-coordinate point.
    pub fn card_at(&self, x: f64, y: f64) -> Option<BoxId> {
        self.cards
            .iter()
            .find(|c| c.rect.contains(Point::new(x, y)))
            .map(|c| c.id)
    }

    /// Handle a click. Returns `true` if the card started revealing.
    ///
    /// Cards already visited this session are not interactive.
    pub fn click(&mut self, id: BoxId, now: Instant) -> bool {
        if self.session.is_visited(id) {
            return false;
        }
        let reveal = Duration::from_millis(self.config.scheduling.reveal_ms);
        let Some(card) = self.cards.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        if card.phase() != CardPhase::Covered {
            return false;
        }

        self.session.mark_visited(id);
        card.sm.handle(&CardEvent::Clicked);
        card.scheduler.set_animating(true);
        card.reveal_until = Some(now + reveal);
        // Deferred until the reveal completes.
        card.scheduler.request(RefitReason::Initial, now);
        info!(target: "board", %id, advice = %card.advice, "box clicked");
        true
    }

    /// Advance timers, tweens and pending refits. Returns `true` while any
    /// card still has work, i.e. the host should keep redrawing.
    pub fn tick<M: TextMeasure + ?Sized>(&mut self, now: Instant, measurer: &mut M) -> bool {
        let settle_delay = Duration::from_millis(self.config.scheduling.settle_delay_ms);
        let mut busy = false;
        for i in 0..self.cards.len() {
            self.tick_card(i, now, settle_delay, measurer);
            busy |= self.cards[i].has_work();
        }
        busy
    }

    fn tick_card<M: TextMeasure + ?Sized>(
        &mut self,
        index: usize,
        now: Instant,
        settle_delay: Duration,
        measurer: &mut M,
    ) {
        let fitter = &self.fitter;
        let tokens = &self.config.transition;
        let card = &mut self.cards[index];

        if card.reveal_until.is_some_and(|t| t <= now) {
            card.reveal_until = None;
            card.sm.handle(&CardEvent::RevealFinished);
            card.scheduler.animation_complete(now);
            card.settle_at = Some(now + settle_delay);
        }

        if card.settle_at.is_some_and(|t| t <= now) {
            card.settle_at = None;
            card.scheduler.request(RefitReason::Settled, now);
        }

        if let Some(tween) = card.tween {
            card.font_size = tween.value_at(now);
            if tween.is_finished(now) {
                card.tween = None;
                let size = card.size();
                match settle_fit(fitter, card.text(), size, card.font_size, tokens, measurer) {
                    Ok(fit) => card.snap(fit),
                    Err(e) => warn!(target: "board", id = %card.id, "settle fit skipped: {e}"),
                }
            }
        }

        let Some((_, reason)) = card.scheduler.poll(now) else {
            return;
        };
        let size = card.size();

        if reason == RefitReason::Resize && card.fitted && card.phase() == CardPhase::Advice {
            match plan_resize_transition(fitter, card.text(), size, Some(card.font_size), tokens, measurer) {
                Ok(plan) => {
                    let duration = Duration::from_millis(tokens.duration_ms);
                    card.tween = Some(FontTween::supersede(
                        card.tween.as_ref(),
                        plan.immediate,
                        plan.target,
                        now,
                        duration,
                    ));
                    card.last_fit = Some(plan.fit);
                    debug!(target: "board", id = %card.id, from = plan.immediate, to = plan.target, "transition started");
                    return;
                }
                Err(e) => warn!(target: "board", id = %card.id, "transition skipped: {e}"),
            }
        }

        let current = card.fitted.then_some(card.font_size);
        let fit = fitter.fit(card.text(), size, current, measurer);
        debug!(target: "board", id = %card.id, ?reason, size = fit.applied_size, outcome = ?fit.outcome, "refit");
        card.snap(fit);
    }
}

/// Validate fit options together with the transition iteration budgets.
fn validated_fitter(config: &BoardConfig) -> Result<TextFitter, FitError> {
    let fitter = TextFitter::new(config.fit_options())?;
    let min = fitter.options().min_font_size;
    fitter.with_limits(min, config.transition.max_iterations)?;
    fitter.with_limits(min, config.transition.settle_iterations)?;
    Ok(fitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::HeuristicMeasurer;

    fn board(now: Instant) -> Board {
        let mut b = Board::new(BoardConfig::default(), SessionFlags::start(), now).unwrap();
        b.layout(BoxSize::new(1000.0, 800.0), now);
        b
    }

    #[test]
    fn grid_is_uniform() {
        let t0 = Instant::now();
        let b = board(t0);
        assert_eq!(b.cards().len(), 16);
        // (1000 - 48 - 36) / 4 = 229 wide, (800 - 48 - 36) / 4 = 179 tall.
        let r = b.card(BoxId(1)).unwrap().rect();
        assert!((r.width() - 229.0).abs() < 1e-6);
        assert!((r.height() - 179.0).abs() < 1e-6);
        assert_eq!(b.card_at(30.0, 30.0), Some(BoxId(1)));
        assert_eq!(b.card_at(24.0 + 229.0 + 6.0, 30.0), None);
        assert_eq!(b.card_at(24.0 + 229.0 + 12.0 + 1.0, 30.0), Some(BoxId(2)));
    }

    #[test]
    fn first_tick_fits_every_card() {
        let t0 = Instant::now();
        let mut b = board(t0);
        let mut m = HeuristicMeasurer::default();
        b.tick(t0, &mut m);
        for card in b.cards() {
            assert!(card.last_fit().is_some(), "{} not fitted", card.id());
            assert!(card.font_size() >= 18.0);
        }
    }

    #[test]
    fn rebuild_on_grid_change() {
        let t0 = Instant::now();
        let mut b = board(t0);
        let mut config = BoardConfig::default();
        config.grid.columns = 2;
        config.grid.rows = 2;
        b.apply_config(config, t0).unwrap();
        assert_eq!(b.cards().len(), 4);
        assert!(b.card(BoxId(1)).unwrap().rect().width() > 0.0);
    }

    #[test]
    fn oversized_grid_reload_is_clamped() {
        let t0 = Instant::now();
        let mut b = board(t0);
        let mut config = BoardConfig::default();
        config.grid.columns = u32::MAX;
        config.grid.rows = u32::MAX;
        b.apply_config(config, t0).unwrap();
        let side = GridTokens::MAX_SIDE as usize;
        assert_eq!(b.cards().len(), side * side);
        assert!(b.cards().iter().all(|c| c.rect().x1 <= 1000.0));
    }

    #[test]
    fn invalid_config_is_rejected_and_old_kept() {
        let t0 = Instant::now();
        let mut b = board(t0);
        let mut config = BoardConfig::default();
        config.fit.min_font_size = -3.0;
        assert!(b.apply_config(config, t0).is_err());
        assert_eq!(b.fitter().options().min_font_size, 18.0);

        let mut config = BoardConfig::default();
        config.transition.settle_iterations = 0;
        assert_eq!(
            Board::new(config, SessionFlags::start(), t0).err(),
            Some(FitError::MaxIterations)
        );
    }
}
