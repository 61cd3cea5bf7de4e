//! Auto-fit text sizing.
//!
//! `TextFitter` finds the largest font size at which a piece of text, wrapped
//! at whitespace, fits inside a box's usable area (box size minus padding).
//! Text metrics come from an injected [`TextMeasure`] so the search itself
//! never touches a rendering surface.
//!
//! The search bisects over a fixed lattice `min_font_size + k * tolerance`.
//! Because the lattice does not depend on the box, a larger box can never
//! produce a smaller result than a smaller box for the same text.

use tracing::{debug, trace};

use crate::measure::{TextMeasure, WrapConstraints};

/// Upper bound on the lattice index of the search bracket.
const MAX_LATTICE_STEPS: u32 = u32::MAX - 1;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Content size of a box, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct BoxSize {
    pub width: f32,
    pub height: f32,
}

impl BoxSize {
    pub const ZERO: BoxSize = BoxSize { width: 0.0, height: 0.0 };

    /// Negative and non-finite dimensions collapse to 0.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: sanitize(width),
            height: sanitize(height),
        }
    }
}

fn sanitize(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Tunables for a fit search.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    /// Floor for every returned size.
    pub min_font_size: f32,
    /// Subtracted once from each box dimension.
    pub padding: f32,
    /// Upper bound on bisection steps.
    pub max_iterations: u32,
    /// Line-height multiplier passed to the measurer.
    pub line_height: f32,
    /// Factor applied to the best fit to get `applied_size`.
    pub safety_shrink: f32,
    /// Lattice step; the search stops once the bracket is this narrow.
    pub tolerance: f32,
    /// Initial upper bound is `min(avail_w, avail_h) * headroom`.
    pub headroom: f32,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            min_font_size: 18.0,
            padding: 16.0,
            max_iterations: 50,
            line_height: 1.05,
            safety_shrink: 0.9,
            tolerance: 0.5,
            headroom: 1.9,
        }
    }
}

/// Invalid `FitOptions`. These are programming errors, reported at construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("min_font_size must be a finite number greater than 0, got {0}")]
    MinFontSize(f32),
    #[error("padding must be a finite number >= 0, got {0}")]
    Padding(f32),
    #[error("max_iterations must be at least 1")]
    MaxIterations,
    #[error("line_height must be a finite number greater than 0, got {0}")]
    LineHeight(f32),
    #[error("safety_shrink must be in (0, 1], got {0}")]
    SafetyShrink(f32),
    #[error("tolerance must be a finite number greater than 0, got {0}")]
    Tolerance(f32),
    #[error("headroom must be a finite number greater than 0, got {0}")]
    Headroom(f32),
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

impl FitOptions {
    pub fn validate(&self) -> Result<(), FitError> {
        if !positive(self.min_font_size) {
            return Err(FitError::MinFontSize(self.min_font_size));
        }
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(FitError::Padding(self.padding));
        }
        if self.max_iterations == 0 {
            return Err(FitError::MaxIterations);
        }
        if !positive(self.line_height) {
            return Err(FitError::LineHeight(self.line_height));
        }
        if !(positive(self.safety_shrink) && self.safety_shrink <= 1.0) {
            return Err(FitError::SafetyShrink(self.safety_shrink));
        }
        if !positive(self.tolerance) {
            return Err(FitError::Tolerance(self.tolerance));
        }
        if !positive(self.headroom) {
            return Err(FitError::Headroom(self.headroom));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Why a fit returned what it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitOutcome {
    /// The search found a fitting size.
    Fitted,
    /// Nothing to measure; any size fits.
    EmptyText,
    /// Padding consumed the whole box.
    NoUsableArea,
    /// Even the minimum size overflows (e.g. one very long word).
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct FitResult {
    /// Largest size that satisfied the fit predicate, or the floor.
    pub font_size: f32,
    /// `font_size * safety_shrink`, never below the floor.
    pub applied_size: f32,
    /// Whether `font_size` satisfies the fit predicate.
    pub fits: bool,
    /// Bisection steps taken (excludes the floor probe).
    pub iterations: u32,
    pub outcome: FitOutcome,
}

// ---------------------------------------------------------------------------
// TextFitter
// ---------------------------------------------------------------------------

/// Validated fit options plus the search itself. Holds no per-call state.
#[derive(Debug, Clone)]
pub struct TextFitter {
    options: FitOptions,
}

impl TextFitter {
    pub fn new(options: FitOptions) -> Result<Self, FitError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    /// Copy of this fitter with a different floor and iteration budget.
    ///
    /// A floor below the configured minimum is raised to it.
    pub fn with_limits(&self, min_font_size: f32, max_iterations: u32) -> Result<Self, FitError> {
        let options = FitOptions {
            min_font_size: min_font_size.max(self.options.min_font_size),
            max_iterations,
            ..self.options.clone()
        };
        Self::new(options)
    }

    /// Usable area of `bx` after padding.
    pub fn usable_area(&self, bx: BoxSize) -> BoxSize {
        BoxSize::new(
            bx.width - self.options.padding,
            bx.height - self.options.padding,
        )
    }

    /// Find the largest font size at which `text` fits inside `bx`.
    ///
    /// `current_size` is the size the text is displayed at right now; it widens
    /// the search range so text can grow back after being shrunk.
    pub fn fit<M: TextMeasure + ?Sized>(
        &self,
        text: &str,
        bx: BoxSize,
        current_size: Option<f32>,
        measurer: &mut M,
    ) -> FitResult {
        let opts = &self.options;
        let min = opts.min_font_size;
        let avail = self.usable_area(bx);

        if avail.width <= 0.0 || avail.height <= 0.0 {
            trace!(target: "fit", ?bx, "no usable area");
            return self.floor_result(false, 0, FitOutcome::NoUsableArea);
        }
        if text.trim().is_empty() {
            return self.floor_result(true, 0, FitOutcome::EmptyText);
        }

        let constraints = WrapConstraints {
            max_width: avail.width,
            line_height: opts.line_height,
        };
        let mut fits_at = |size: f32| {
            let extent = measurer.measure(text, size, &constraints);
            extent.width <= avail.width && extent.height <= avail.height
        };

        if !fits_at(min) {
            debug!(target: "fit", text, ?bx, min, "text overflows at minimum size");
            return self.floor_result(false, 0, FitOutcome::Overflow);
        }

        let current = current_size.filter(|s| s.is_finite()).unwrap_or(0.0);
        let high = current
            .max(avail.width.min(avail.height) * opts.headroom)
            .max(min);

        // Lattice indices: `lo` always fits, `hi` is treated as not fitting.
        let mut lo: u32 = 0;
        // Huge boxes, huge current sizes and tiny tolerances all land on the cap.
        let steps = ((f64::from(high) - f64::from(min)) / f64::from(opts.tolerance)).floor();
        let mut hi: u32 = (steps.clamp(0.0, f64::from(MAX_LATTICE_STEPS)) as u32).saturating_add(1);
        let mut iterations = 0;

        while hi - lo > 1 && iterations < opts.max_iterations {
            let mid = lo + (hi - lo) / 2;
            if fits_at(self.lattice(mid)) {
                lo = mid;
            } else {
                hi = mid;
            }
            iterations += 1;
        }

        let font_size = self.lattice(lo).max(min);
        trace!(target: "fit", text, ?bx, font_size, iterations, "fit complete");
        FitResult {
            font_size,
            applied_size: self.shrink(font_size),
            fits: true,
            iterations,
            outcome: FitOutcome::Fitted,
        }
    }

    fn lattice(&self, k: u32) -> f32 {
        self.options.min_font_size + k as f32 * self.options.tolerance
    }

    fn shrink(&self, size: f32) -> f32 {
        (size * self.options.safety_shrink).max(self.options.min_font_size)
    }

    fn floor_result(&self, fits: bool, iterations: u32, outcome: FitOutcome) -> FitResult {
        let min = self.options.min_font_size;
        FitResult {
            font_size: min,
            applied_size: min,
            fits,
            iterations,
            outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{HeuristicMeasurer, TextExtent};

    /// Counts calls so tests can assert the measurer was skipped.
    struct Counting {
        inner: HeuristicMeasurer,
        calls: usize,
    }

    impl TextMeasure for Counting {
        fn measure(&mut self, text: &str, font_size: f32, c: &WrapConstraints) -> TextExtent {
            self.calls += 1;
            self.inner.measure(text, font_size, c)
        }
    }

    fn counting() -> Counting {
        Counting {
            inner: HeuristicMeasurer::default(),
            calls: 0,
        }
    }

    fn fitter() -> TextFitter {
        TextFitter::new(FitOptions::default()).unwrap()
    }

    #[test]
    fn advice1_fits_largest_lattice_size() {
        // Heuristic: width = 0.6 * size * 7 chars, height = 1.05 * size.
        // Usable 284x134 -> width bound 284 / 4.2 = 67.6.
        let mut m = HeuristicMeasurer::default();
        let r = fitter().fit("Advice1", BoxSize::new(300.0, 150.0), None, &mut m);
        assert_eq!(r.outcome, FitOutcome::Fitted);
        assert!(r.fits);
        assert!((r.font_size - 67.5).abs() < 1e-3, "got {}", r.font_size);
        assert!((r.applied_size - 67.5 * 0.9).abs() < 1e-3);
    }

    #[test]
    fn zero_area_skips_measurement() {
        let mut m = counting();
        let r = fitter().fit("Advice1", BoxSize::ZERO, None, &mut m);
        assert_eq!(r.font_size, 18.0);
        assert_eq!(r.outcome, FitOutcome::NoUsableArea);
        assert!(!r.font_size.is_nan());
        assert_eq!(m.calls, 0);

        // Padding alone can eat the box.
        let r = fitter().fit("Advice1", BoxSize::new(16.0, 400.0), None, &mut m);
        assert_eq!(r.outcome, FitOutcome::NoUsableArea);
        assert_eq!(m.calls, 0);
    }

    #[test]
    fn empty_text_returns_floor() {
        let mut m = counting();
        for text in ["", "   \n\t"] {
            let r = fitter().fit(text, BoxSize::new(900.0, 900.0), None, &mut m);
            assert_eq!(r.font_size, 18.0);
            assert!(r.fits);
            assert_eq!(r.outcome, FitOutcome::EmptyText);
        }
        assert_eq!(m.calls, 0);
    }

    #[test]
    fn long_token_degrades_to_floor() {
        let mut m = HeuristicMeasurer::default();
        let word = "x".repeat(200);
        let r = fitter().fit(&word, BoxSize::new(300.0, 150.0), None, &mut m);
        assert_eq!(r.font_size, 18.0);
        assert_eq!(r.applied_size, 18.0);
        assert!(!r.fits);
        assert_eq!(r.outcome, FitOutcome::Overflow);
    }

    #[test]
    fn iterations_are_bounded() {
        let opts = FitOptions {
            max_iterations: 3,
            tolerance: 0.01,
            ..FitOptions::default()
        };
        let f = TextFitter::new(opts).unwrap();
        let mut m = HeuristicMeasurer::default();
        let r = f.fit("Advice1", BoxSize::new(3000.0, 3000.0), None, &mut m);
        assert_eq!(r.iterations, 3);
        assert!(r.font_size >= 18.0);
        assert!(r.fits);
    }

    #[test]
    fn current_size_extends_search_range() {
        // A tiny box with a huge current size still finds the true bound.
        let mut m = HeuristicMeasurer::default();
        let bx = BoxSize::new(60.0, 500.0);
        let a = fitter().fit("hi", bx, None, &mut m);
        let b = fitter().fit("hi", bx, Some(400.0), &mut m);
        assert!(b.font_size >= a.font_size);
    }

    #[test]
    fn applied_size_never_below_floor() {
        // 0.9 * 19 < 18 would undercut the floor.
        let mut m = HeuristicMeasurer::default();
        let r = fitter().fit("abcdefghij", BoxSize::new(16.0 + 115.0, 200.0), None, &mut m);
        assert!(r.font_size >= 18.0);
        assert!(r.applied_size >= 18.0);
    }

    #[test]
    fn invalid_options_fail_fast() {
        let bad = |o: FitOptions| TextFitter::new(o).unwrap_err();
        let d = FitOptions::default;

        assert_eq!(bad(FitOptions { min_font_size: -1.0, ..d() }), FitError::MinFontSize(-1.0));
        assert_eq!(bad(FitOptions { padding: -2.0, ..d() }), FitError::Padding(-2.0));
        assert_eq!(bad(FitOptions { max_iterations: 0, ..d() }), FitError::MaxIterations);
        assert_eq!(bad(FitOptions { line_height: 0.0, ..d() }), FitError::LineHeight(0.0));
        assert_eq!(bad(FitOptions { safety_shrink: 1.5, ..d() }), FitError::SafetyShrink(1.5));
        assert_eq!(bad(FitOptions { tolerance: 0.0, ..d() }), FitError::Tolerance(0.0));
        assert_eq!(bad(FitOptions { headroom: -1.0, ..d() }), FitError::Headroom(-1.0));

        let msg = bad(FitOptions { min_font_size: -1.0, ..d() }).to_string();
        assert!(msg.contains("min_font_size"));
    }

    #[test]
    fn with_limits_never_lowers_floor() {
        let f = fitter().with_limits(4.0, 10).unwrap();
        assert_eq!(f.options().min_font_size, 18.0);
        assert_eq!(f.options().max_iterations, 10);
    }

    #[test]
    fn box_size_sanitizes_input() {
        assert_eq!(BoxSize::new(-5.0, f32::NAN), BoxSize::ZERO);
        assert_eq!(BoxSize::new(f32::INFINITY, 3.0), BoxSize::new(0.0, 3.0));
    }
}
