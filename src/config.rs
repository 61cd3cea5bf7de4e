//! Board configuration.
//!
//! Every tunable (fit policy, transition, scheduling, grid, colors, intro)
//! lives in one `BoardConfig` that round-trips through TOML. Missing keys fall
//! back to compiled defaults, so a config file only needs the values it
//! changes.

use std::path::Path;

use anyhow::Context;
use vello::peniko::Color;

use crate::fit::FitOptions;

// ---------------------------------------------------------------------------
// BoardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct BoardConfig {
    pub fit: FitTokens,
    pub transition: TransitionTokens,
    pub scheduling: SchedulingTokens,
    pub grid: GridTokens,
    pub palette: PaletteTokens,
    pub intro: IntroTokens,
    /// Per-box advice overrides; boxes not listed use the built-in catalog.
    pub advice: Vec<AdviceEntry>,
}

// --- Sub-structs ---

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct FitTokens {
    pub min_font_size: f32,
    pub padding: f32,
    pub max_iterations: u32,
    pub line_height: f32,
    pub safety_shrink: f32,
    pub tolerance: f32,
    pub headroom: f32,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct TransitionTokens {
    pub floor_ratio: f32,
    pub target_shrink: f32,
    pub max_iterations: u32,
    pub settle_iterations: u32,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct SchedulingTokens {
    pub resize_debounce_ms: u64,
    pub settle_delay_ms: u64,
    pub reveal_ms: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct GridTokens {
    pub columns: u32,
    pub rows: u32,
    pub gap: f32,
    pub margin: f32,
}

impl GridTokens {
    /// Largest number of columns or rows a board will lay out.
    pub const MAX_SIDE: u32 = 32;

    /// `(columns, rows)` clamped to `1..=MAX_SIDE`.
    pub fn dimensions(&self) -> (u32, u32) {
        (
            self.columns.clamp(1, Self::MAX_SIDE),
            self.rows.clamp(1, Self::MAX_SIDE),
        )
    }

    pub fn is_clamped(&self) -> bool {
        self.dimensions() != (self.columns, self.rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn color(&self) -> Color {
        Color::new([self.r, self.g, self.b, 1.0])
    }

    pub fn with_alpha(&self, alpha: f32) -> Color {
        Color::new([self.r, self.g, self.b, alpha])
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct PaletteTokens {
    pub background: Rgb,
    pub card: Rgb,
    pub card_ink: Rgb,
    pub advice: Rgb,
    pub advice_ink: Rgb,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct IntroTokens {
    pub enabled: bool,
    pub fade_in_s: f64,
    pub hold_s: f64,
    pub fade_out_s: f64,
    pub font_size: f32,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AdviceEntry {
    #[serde(rename = "box")]
    pub id: u32,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            fit: FitTokens::default(),
            transition: TransitionTokens::default(),
            scheduling: SchedulingTokens::default(),
            grid: GridTokens::default(),
            palette: PaletteTokens::default(),
            intro: IntroTokens::default(),
            advice: Vec::new(),
        }
    }
}

impl Default for FitTokens {
    fn default() -> Self {
        let o = FitOptions::default();
        Self {
            min_font_size: o.min_font_size,
            padding: o.padding,
            max_iterations: o.max_iterations,
            line_height: o.line_height,
            safety_shrink: o.safety_shrink,
            tolerance: o.tolerance,
            headroom: o.headroom,
        }
    }
}

impl Default for TransitionTokens {
    fn default() -> Self {
        Self {
            floor_ratio: 0.9,
            target_shrink: 0.95,
            max_iterations: 60,
            settle_iterations: 10,
            duration_ms: 450,
        }
    }
}

impl Default for SchedulingTokens {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 80,
            settle_delay_ms: 80,
            reveal_ms: 550,
        }
    }
}

impl Default for GridTokens {
    fn default() -> Self {
        Self {
            columns: 4,
            rows: 4,
            gap: 12.0,
            margin: 24.0,
        }
    }
}

impl Default for PaletteTokens {
    fn default() -> Self {
        Self {
            background: Rgb::new(0.96, 0.94, 0.90),
            card: Rgb::new(0.62, 0.47, 0.36),
            card_ink: Rgb::new(1.0, 1.0, 1.0),
            advice: Rgb::new(0.20, 0.36, 0.78),
            advice_ink: Rgb::new(1.0, 1.0, 1.0),
        }
    }
}

impl Default for IntroTokens {
    fn default() -> Self {
        Self {
            enabled: true,
            fade_in_s: 1.2,
            hold_s: 3.0,
            fade_out_s: 1.2,
            font_size: 40.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Helper methods
// ---------------------------------------------------------------------------

impl BoardConfig {
    /// Fit options for regular (non-transition) fits. Not yet validated.
    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            min_font_size: self.fit.min_font_size,
            padding: self.fit.padding,
            max_iterations: self.fit.max_iterations,
            line_height: self.fit.line_height,
            safety_shrink: self.fit.safety_shrink,
            tolerance: self.fit.tolerance,
            headroom: self.fit.headroom,
        }
    }

    /// Number of boxes on the board; ids run from 1 to this value.
    pub fn box_count(&self) -> u32 {
        let (columns, rows) = self.grid.dimensions();
        columns * rows
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialize from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
