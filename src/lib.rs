//! advice-board: a grid of cards that turn into advice, with text kept
//! auto-fitted to each card as the layout changes.
//!
//! The fitting core ([`fit`]) is independent of any rendering surface; text
//! metrics come in through [`measure::TextMeasure`]. The rest of the crate is
//! the host around it: scheduling, card lifecycle, config, and a vello window.

pub mod app;
pub mod board;
pub mod config;
pub mod config_watcher;
pub mod fit;
pub mod intro;
pub mod logging;
pub mod measure;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod state_machine;
pub mod text;
pub mod transition;

pub use fit::{BoxSize, FitError, FitOptions, FitOutcome, FitResult, TextFitter};
pub use measure::{TextExtent, TextMeasure, WrapConstraints};
