//! Fit-after-resize transitions.
//!
//! When a card's box changes size, the text should glide to its new size
//! rather than snap. [`plan_resize_transition`] runs the fit against the new
//! box and reports where the text is now and where it should end up; a
//! [`FontTween`] animates between the two. When the tween lands, the caller
//! runs one short settle fit and snaps to its applied size.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::TransitionTokens;
use crate::fit::{BoxSize, FitError, FitResult, TextFitter};
use crate::measure::TextMeasure;

/// Two-phase result of a resize refit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeTransition {
    /// Size to show right now (the size currently on screen).
    pub immediate: f32,
    /// Size the text should end up at.
    pub target: f32,
    /// The underlying search against the new box.
    pub fit: FitResult,
}

/// Plan the transition of `text` into the resized box `bx`.
///
/// The search floor is raised to `displayed * floor_ratio` so the text does
/// not collapse mid-transition; the settle pass afterwards uses the normal
/// floor and corrects any overflow.
pub fn plan_resize_transition<M: TextMeasure + ?Sized>(
    fitter: &TextFitter,
    text: &str,
    bx: BoxSize,
    displayed: Option<f32>,
    tokens: &TransitionTokens,
    measurer: &mut M,
) -> Result<ResizeTransition, FitError> {
    let min = fitter.options().min_font_size;
    let immediate = displayed
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(min);

    let search = fitter.with_limits(immediate * tokens.floor_ratio, tokens.max_iterations)?;
    let fit = search.fit(text, bx, Some(immediate), measurer);
    let target = (fit.font_size * tokens.target_shrink).max(min);

    debug!(target: "fit", text, ?bx, immediate, target, "resize transition planned");
    Ok(ResizeTransition {
        immediate,
        target,
        fit,
    })
}

/// Fit run once a transition tween has landed.
pub fn settle_fit<M: TextMeasure + ?Sized>(
    fitter: &TextFitter,
    text: &str,
    bx: BoxSize,
    current: f32,
    tokens: &TransitionTokens,
    measurer: &mut M,
) -> Result<FitResult, FitError> {
    let settle = fitter.with_limits(fitter.options().min_font_size, tokens.settle_iterations)?;
    Ok(settle.fit(text, bx, Some(current), measurer))
}

// ---------------------------------------------------------------------------
// FontTween
// ---------------------------------------------------------------------------

/// Eases a font size from one value to another over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontTween {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
}

impl FontTween {
    pub fn new(from: f32, to: f32, start: Instant, duration: Duration) -> Self {
        Self {
            from,
            to,
            start,
            duration,
        }
    }

    /// Start a tween toward `to` that replaces `previous`, continuing from
    /// wherever `previous` currently is.
    pub fn supersede(previous: Option<&FontTween>, fallback_from: f32, to: f32, now: Instant, duration: Duration) -> Self {
        let from = previous.map_or(fallback_from, |t| t.value_at(now));
        Self::new(from, to, now, duration)
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    /// Progress in `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn value_at(&self, now: Instant) -> f32 {
        let t = ease_out_quad(self.progress(now));
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

/// Quadratic ease-out ("power2.out").
fn ease_out_quad(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}
