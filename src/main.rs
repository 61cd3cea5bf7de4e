//! advice-board: click a card, get advice that fills it.
//!
//! Opens a GPU-rendered board (vello/winit) by default. The `fit` subcommand
//! runs the text fitter headless and prints the result.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use winit::event_loop::EventLoop;

use advice_board::app::App;
use advice_board::board::Board;
use advice_board::config::BoardConfig;
use advice_board::config_watcher::{self, ConfigWatcher};
use advice_board::fit::{BoxSize, FitResult, TextFitter};
use advice_board::logging;
use advice_board::measure::{FontMetricsMeasurer, HeuristicMeasurer, TextMeasure, load_card_font};
use advice_board::session::SessionFlags;
use advice_board::text::ParleyMeasurer;

/// Advice board with auto-fitting card text
#[derive(Parser, Debug)]
#[command(name = "advice-board", version, about = "Advice board with auto-fitting card text")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Start in windowed mode instead of fullscreen
    #[arg(short, long)]
    windowed: bool,

    /// Config file (default: ~/.config/advice-board/board.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not reload the config file when it changes
    #[arg(long)]
    no_watch: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit a text into a box and print the chosen font size
    Fit {
        /// Text to fit
        #[arg(short, long)]
        text: String,

        /// Box content width in pixels
        #[arg(long)]
        width: f32,

        /// Box content height in pixels
        #[arg(long)]
        height: f32,

        /// Size the text is currently displayed at
        #[arg(long)]
        current: Option<f32>,

        /// Font file for metrics (default: a system sans-serif)
        #[arg(long)]
        font: Option<PathBuf>,

        /// How text is measured
        #[arg(long, value_enum, default_value_t = MeasureKind::Font)]
        measure: MeasureKind,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default config file
    PrintConfig,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MeasureKind {
    /// Average advance estimate, no font needed
    Heuristic,
    /// Advance widths from a font file
    Font,
    /// Full shaping with system fonts
    Shaped,
}

#[derive(serde::Serialize)]
struct FitReport<'a> {
    text: &'a str,
    #[serde(rename = "box")]
    bx: BoxSize,
    #[serde(flatten)]
    result: FitResult,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.command.is_some() { "warn" } else { "info" };
    let _log_guard = logging::init(default_level);

    match args.command {
        Some(Command::PrintConfig) => {
            print!("{}", BoardConfig::default().to_toml());
            Ok(())
        }
        Some(Command::Fit {
            ref text,
            width,
            height,
            current,
            ref font,
            measure,
            json,
        }) => {
            let config = load_config(args.config.as_deref())?;
            let bx = BoxSize::new(width, height);
            let result = run_fit(&config, text, bx, current, font.as_deref(), measure)?;
            if json {
                let report = FitReport { text, bx, result };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "font size {:.1} (applied {:.1}), fits: {}, {} iterations, {:?}",
                    result.font_size, result.applied_size, result.fits, result.iterations, result.outcome
                );
            }
            Ok(())
        }
        None => run_board(&args),
    }
}

/// Explicit config paths must load; the default path falls back to defaults.
fn load_config(explicit: Option<&std::path::Path>) -> Result<BoardConfig> {
    if let Some(path) = explicit {
        return BoardConfig::load(path);
    }
    let path = config_watcher::default_config_path();
    if !path.exists() {
        return Ok(BoardConfig::default());
    }
    match BoardConfig::load(&path) {
        Ok(config) => Ok(config),
        Err(e) => {
            warn!(target: "config", "using defaults: {e:#}");
            Ok(BoardConfig::default())
        }
    }
}

fn run_fit(
    config: &BoardConfig,
    text: &str,
    bx: BoxSize,
    current: Option<f32>,
    font: Option<&std::path::Path>,
    measure: MeasureKind,
) -> Result<FitResult> {
    let fitter = TextFitter::new(config.fit_options()).context("invalid fit settings")?;

    let mut measurer: Box<dyn TextMeasure> = match (measure, font) {
        (MeasureKind::Heuristic, _) => Box::new(HeuristicMeasurer::default()),
        (MeasureKind::Shaped, _) => Box::new(ParleyMeasurer::new()),
        (MeasureKind::Font, Some(path)) => Box::new(FontMetricsMeasurer::from_path(path)?),
        (MeasureKind::Font, None) => match load_card_font() {
            Some(font) => Box::new(FontMetricsMeasurer::new(font)?),
            None => {
                warn!(target: "fit", "no system font found, falling back to heuristic metrics");
                Box::new(HeuristicMeasurer::default())
            }
        },
    };

    Ok(fitter.fit(text, bx, current, measurer.as_mut()))
}

fn run_board(args: &Args) -> Result<()> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(config_watcher::default_config_path);
    if args.config.is_none() {
        if let Err(e) = config_watcher::ensure_default_config(&path, &BoardConfig::default().to_toml()) {
            warn!(target: "config", path = %path.display(), "could not write default config: {e}");
        }
    }
    let config = load_config(args.config.as_deref())?;

    let board = Board::new(config, SessionFlags::start(), Instant::now())
        .context("invalid fit settings")?;

    let watcher = if args.no_watch {
        None
    } else {
        match ConfigWatcher::start(path) {
            Ok(w) => {
                info!(target: "config", path = %w.path().display(), "watching config");
                Some(w)
            }
            Err(e) => {
                warn!(target: "config", "config hot-reload disabled: {e}");
                None
            }
        }
    };

    info!(target: "app", version = env!("CARGO_PKG_VERSION"), boxes = board.cards().len(), "starting board");

    let mut app = App::new(board, watcher, args.windowed);
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
