//! One-time introduction overlay.
//!
//! Two sets of phrases, work pressure and home life, are interleaved into
//! lines that fade in, hold and fade out over the board. The overlay plays
//! once per session; a click skips it.

use crate::config::IntroTokens;

pub const WORK_PHRASES: &[&str] = &[
    "YOUR COLLEAGUES ARE MUCH BETTER",
    "IT'S REALLY TOO SLOW",
    "YOU NEED TO WORK FASTER",
    "CAN YOU COME IN THIS WEEKEND?",
    "WE ARE A FAMILY HERE",
    "YOU NEED TO FINISH IT ON TIME",
    "CONSISTENCY IS KEY",
];

pub const HOME_PHRASES: &[&str] = &[
    "DO YOU WANT TO GO OUT TONIGHT",
    "LET'S SEE GRANDMA SUNDAY",
    "THE MATCH IS NEXT WEEK",
    "WHERE ARE WE GOING ON HOLIDAY THIS YEAR",
    "LET'S EAT OUTSIDE",
    "YOU COMING FOR CHRISTMAS?",
    "DO YOU HAVE DAYS OFF?",
];

/// Which phrase set a line came from; rendered in different inks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseKind {
    Work,
    Home,
}

/// Work and home phrases, alternating, starting with work.
pub fn interleaved_lines() -> Vec<(PhraseKind, &'static str)> {
    let mut lines = Vec::with_capacity(WORK_PHRASES.len() + HOME_PHRASES.len());
    let mut work = WORK_PHRASES.iter();
    let mut home = HOME_PHRASES.iter();
    loop {
        let w = work.next();
        let h = home.next();
        if w.is_none() && h.is_none() {
            break;
        }
        if let Some(w) = w {
            lines.push((PhraseKind::Work, *w));
        }
        if let Some(h) = h {
            lines.push((PhraseKind::Home, *h));
        }
    }
    lines
}

/// Playback state of the intro.
#[derive(Debug, Clone)]
pub struct Intro {
    fade_in: f64,
    hold: f64,
    fade_out: f64,
    started_at: Option<f64>,
    skipped: bool,
}

impl Intro {
    pub fn new(tokens: &IntroTokens) -> Self {
        Self {
            fade_in: tokens.fade_in_s.max(0.0),
            hold: tokens.hold_s.max(0.0),
            fade_out: tokens.fade_out_s.max(0.0),
            started_at: None,
            skipped: false,
        }
    }

    pub fn total_duration(&self) -> f64 {
        self.fade_in + self.hold + self.fade_out
    }

    pub fn skip(&mut self) {
        self.skipped = true;
    }

    /// `elapsed` is seconds since the host started; the first call anchors
    /// the intro's own clock.
    pub fn is_finished(&mut self, elapsed: f64) -> bool {
        self.skipped || self.local_time(elapsed) >= self.total_duration()
    }

    /// Overlay opacity at `elapsed`.
    pub fn alpha(&mut self, elapsed: f64) -> f32 {
        if self.skipped {
            return 0.0;
        }
        let t = self.local_time(elapsed);
        if t >= self.total_duration() {
            return 0.0;
        }
        if t < self.fade_in {
            ease_in_out((t / self.fade_in) as f32)
        } else if t < self.fade_in + self.hold {
            1.0
        } else {
            let out = (t - self.fade_in - self.hold) / self.fade_out;
            1.0 - ease_in_out(out as f32)
        }
    }

    fn local_time(&mut self, elapsed: f64) -> f64 {
        let start = *self.started_at.get_or_insert(elapsed);
        (elapsed - start).max(0.0)
    }
}

/// Smooth ease-in-out cubic curve
fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
